use std::sync::Arc;

use axum::extract::FromRef;
use time::OffsetDateTime;
use tracing::{error, info};

use crate::auth::code::{self, LOGIN_CODE_TTL};
use crate::auth::dto::{
    is_six_digit_code, is_valid_email, AuthData, GoogleLoginRequest, LoginRequest,
    RegisterRequest, ResetPasswordRequest, SetNewPasswordRequest, UserDto,
};
use crate::auth::jwt::JwtKeys;
use crate::auth::password::{hash_secret, verify_secret};
use crate::auth::store::{NewUser, Role, UserStore};
use crate::error::AppError;
use crate::google::IdentityVerifier;
use crate::mail::Mailer;
use crate::state::AppState;

/// Reset links go stale after this window; enforced against the stored
/// expiry, not the token's own claims.
pub const RESET_TOKEN_TTL: time::Duration = time::Duration::minutes(15);

const MIN_PASSWORD_LEN: usize = 8;

/// Coordinates hashing, token minting, the user directory, the notifier and
/// the identity bridge. Each method is one short-lived operation over a
/// single user record; all state lives in the store.
pub struct AuthService {
    store: Arc<dyn UserStore>,
    mailer: Arc<dyn Mailer>,
    identity: Arc<dyn IdentityVerifier>,
    keys: JwtKeys,
}

impl FromRef<AppState> for AuthService {
    fn from_ref(state: &AppState) -> Self {
        Self {
            store: state.store.clone(),
            mailer: state.mailer.clone(),
            identity: state.identity.clone(),
            keys: JwtKeys::from_config(&state.config.jwt),
        }
    }
}

impl AuthService {
    pub fn new(
        store: Arc<dyn UserStore>,
        mailer: Arc<dyn Mailer>,
        identity: Arc<dyn IdentityVerifier>,
        keys: JwtKeys,
    ) -> Self {
        Self {
            store,
            mailer,
            identity,
            keys,
        }
    }

    fn check_email(email: &str) -> Result<(), AppError> {
        if !is_valid_email(email) {
            return Err(AppError::Validation("Invalid email".into()));
        }
        Ok(())
    }

    fn check_password(password: &str) -> Result<(), AppError> {
        if password.len() < MIN_PASSWORD_LEN {
            return Err(AppError::Validation("Password too short".into()));
        }
        Ok(())
    }

    pub async fn register(&self, req: RegisterRequest) -> Result<UserDto, AppError> {
        Self::check_email(&req.email)?;
        Self::check_password(&req.password)?;
        if req.name.trim().is_empty() {
            return Err(AppError::Validation("Name is required".into()));
        }

        let password_hash = hash_secret(&req.password)?;
        // Subject is a throwaway random id; the user does not exist yet and
        // consumption matches the stored value, not the claims.
        let verification_token = self.keys.sign_verification(&req.email)?;

        let user = self
            .store
            .create_user(NewUser {
                email: req.email.clone(),
                password_hash: Some(password_hash),
                role: Role::User,
                email_verified: false,
                google_id: None,
                verification_token: Some(verification_token.clone()),
                profile_name: Some(req.name),
                profile_avatar: None,
            })
            .await?;

        // Registration stands even when the notifier is down; the token stays
        // stored and a verification mail can be re-requested out of band.
        if let Err(e) = self
            .mailer
            .send_verification_email(&user.email, &verification_token)
            .await
        {
            error!(error = %e, email = %user.email, "verification email failed");
        }

        info!(user_id = %user.id, "user registered");
        Ok(user.into())
    }

    pub async fn verify_email(&self, token: &str) -> Result<(), AppError> {
        if token.is_empty() {
            return Err(AppError::Validation("Token is required".into()));
        }
        let user = self
            .store
            .consume_verification_token(token)
            .await?
            .ok_or(AppError::InvalidToken)?;
        info!(user_id = %user.id, "email verified");
        Ok(())
    }

    pub async fn login(&self, req: LoginRequest) -> Result<AuthData, AppError> {
        let user = self
            .store
            .find_by_email(&req.email)
            .await?
            .ok_or(AppError::UserNotFound)?;
        let hash = user
            .password_hash
            .as_deref()
            .ok_or(AppError::PasswordRequired)?;
        if !verify_secret(&req.password, hash)? {
            return Err(AppError::InvalidCredentials);
        }
        let token = self.keys.sign_session(user.id, &user.email, user.role)?;
        info!(user_id = %user.id, "login");
        Ok(AuthData {
            user: user.into(),
            token,
        })
    }

    pub async fn forgot_password(&self, email: &str) -> Result<(), AppError> {
        let user = self
            .store
            .find_by_email(email)
            .await?
            .ok_or(AppError::UserNotFound)?;
        let token = self.keys.sign_reset(user.id, &user.email, user.role)?;
        let expires_at = OffsetDateTime::now_utc() + RESET_TOKEN_TTL;
        self.store
            .store_reset_token(user.id, &token, expires_at)
            .await?;
        // The whole point of this request is the email; a delivery failure
        // must surface so the caller knows no link went out.
        self.mailer
            .send_password_reset_email(&user.email, &token)
            .await?;
        info!(user_id = %user.id, "reset link issued");
        Ok(())
    }

    pub async fn set_new_password(&self, req: SetNewPasswordRequest) -> Result<(), AppError> {
        if req.token.is_empty() {
            return Err(AppError::Validation("Token is required".into()));
        }
        Self::check_password(&req.new_password)?;
        let hash = hash_secret(&req.new_password)?;
        let user = self
            .store
            .consume_reset_token(&req.token, OffsetDateTime::now_utc(), &hash)
            .await?
            .ok_or(AppError::InvalidToken)?;
        info!(user_id = %user.id, "password reset via token");
        Ok(())
    }

    pub async fn reset_password(&self, req: ResetPasswordRequest) -> Result<(), AppError> {
        let user = self
            .store
            .find_by_email(&req.email)
            .await?
            .ok_or(AppError::UserNotFound)?;
        let hash = user
            .password_hash
            .as_deref()
            .ok_or(AppError::PasswordRequired)?;
        if !verify_secret(&req.current_password, hash)? {
            return Err(AppError::InvalidCredentials);
        }
        if req.new_password == req.current_password {
            return Err(AppError::SamePassword);
        }
        Self::check_password(&req.new_password)?;
        let new_hash = hash_secret(&req.new_password)?;
        self.store.update_password(user.id, &new_hash).await?;
        info!(user_id = %user.id, "password changed");
        Ok(())
    }

    pub async fn google_login(&self, req: GoogleLoginRequest) -> Result<AuthData, AppError> {
        if req.token.is_empty() {
            return Err(AppError::Validation("Token is required".into()));
        }
        let identity = self.identity.verify_id_token(&req.token).await?;
        let email = identity.email.ok_or(AppError::InvalidIdToken)?;

        let user = match self.store.find_by_email(&email).await? {
            None => {
                let user = self
                    .store
                    .create_user(NewUser {
                        email,
                        password_hash: None,
                        role: Role::User,
                        email_verified: true,
                        google_id: Some(identity.sub),
                        verification_token: None,
                        profile_name: identity.name,
                        profile_avatar: identity.picture,
                    })
                    .await?;
                info!(user_id = %user.id, "user created via google");
                user
            }
            Some(user) if user.google_id.is_none() => {
                // Merge the Google identity into an existing password
                // account; the password is neither required nor changed.
                let user = self.store.link_google(user.id, &identity.sub).await?;
                info!(user_id = %user.id, "google identity linked");
                user
            }
            Some(user) => user,
        };

        let token = self.keys.sign_session(user.id, &user.email, user.role)?;
        Ok(AuthData {
            user: user.into(),
            token,
        })
    }

    pub async fn send_login_code(&self, email: &str) -> Result<(), AppError> {
        let user = self
            .store
            .find_by_email(email)
            .await?
            .ok_or(AppError::UserNotFound)?;
        let (plain, hash) = code::generate()?;
        let expires_at = OffsetDateTime::now_utc() + LOGIN_CODE_TTL;
        self.store
            .store_login_code(user.id, &hash, expires_at)
            .await?;
        self.mailer
            .send_login_code_email(&user.email, &plain)
            .await?;
        info!(user_id = %user.id, "login code issued");
        Ok(())
    }

    pub async fn verify_login_code(&self, email: &str, input: &str) -> Result<AuthData, AppError> {
        if !is_six_digit_code(input) {
            return Err(AppError::Validation("Code must be exactly 6 digits".into()));
        }
        let user = self
            .store
            .find_by_email(email)
            .await?
            .ok_or(AppError::UserNotFound)?;
        let (stored_hash, expiry) = match (&user.email_login_code, user.email_login_code_expiry) {
            (Some(hash), Some(expiry)) => (hash.clone(), expiry),
            _ => return Err(AppError::InvalidCode),
        };
        if let Err(e) = code::validate(input.trim(), &stored_hash, expiry, OffsetDateTime::now_utc())
        {
            // An expired code is dead either way; drop it so the record does
            // not keep stale credential material.
            if matches!(e, AppError::CodeExpired) {
                self.store.clear_login_code(user.id).await?;
            }
            return Err(e);
        }
        // Conditional clear: if a concurrent request got here first the code
        // is gone and this one loses.
        if !self.store.consume_login_code(user.id, &stored_hash).await? {
            return Err(AppError::InvalidCode);
        }
        let user = self
            .store
            .find_by_id(user.id)
            .await?
            .ok_or(AppError::UserNotFound)?;
        let token = self.keys.sign_session(user.id, &user.email, user.role)?;
        info!(user_id = %user.id, "login via email code");
        Ok(AuthData {
            user: user.into(),
            token,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::TokenKind;
    use crate::auth::store::MemoryUserStore;
    use crate::config::JwtConfig;
    use crate::google::GoogleIdentity;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Captures outbound mail the way an inbox would, so tests can follow
    /// the emailed token/code through the rest of the flow.
    #[derive(Default)]
    struct RecordingMailer {
        verification_tokens: Mutex<Vec<(String, String)>>,
        reset_tokens: Mutex<Vec<(String, String)>>,
        login_codes: Mutex<Vec<(String, String)>>,
        fail_sends: std::sync::atomic::AtomicBool,
    }

    impl RecordingMailer {
        fn last_reset_token(&self) -> Option<String> {
            self.reset_tokens
                .lock()
                .unwrap()
                .last()
                .map(|(_, t)| t.clone())
        }

        fn last_login_code(&self) -> Option<String> {
            self.login_codes
                .lock()
                .unwrap()
                .last()
                .map(|(_, c)| c.clone())
        }

        fn fail_next_sends(&self) {
            self.fail_sends
                .store(true, std::sync::atomic::Ordering::SeqCst);
        }

        fn check(&self) -> Result<(), AppError> {
            if self.fail_sends.load(std::sync::atomic::Ordering::SeqCst) {
                return Err(AppError::Mail("smtp down".into()));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send_verification_email(&self, to: &str, token: &str) -> Result<(), AppError> {
            self.check()?;
            self.verification_tokens
                .lock()
                .unwrap()
                .push((to.into(), token.into()));
            Ok(())
        }

        async fn send_password_reset_email(&self, to: &str, token: &str) -> Result<(), AppError> {
            self.check()?;
            self.reset_tokens
                .lock()
                .unwrap()
                .push((to.into(), token.into()));
            Ok(())
        }

        async fn send_login_code_email(&self, to: &str, code: &str) -> Result<(), AppError> {
            self.check()?;
            self.login_codes
                .lock()
                .unwrap()
                .push((to.into(), code.into()));
            Ok(())
        }
    }

    /// Accepts exactly one token string and returns a fixed identity.
    struct StaticVerifier {
        expected_token: String,
        identity: GoogleIdentity,
    }

    #[async_trait]
    impl IdentityVerifier for StaticVerifier {
        async fn verify_id_token(&self, id_token: &str) -> Result<GoogleIdentity, AppError> {
            if id_token == self.expected_token {
                Ok(self.identity.clone())
            } else {
                Err(AppError::InvalidIdToken)
            }
        }
    }

    struct Harness {
        service: AuthService,
        store: Arc<MemoryUserStore>,
        mailer: Arc<RecordingMailer>,
        keys: JwtKeys,
    }

    fn harness() -> Harness {
        harness_with_google("google-id-token", "google-sub-1", "b@x.com")
    }

    fn harness_with_google(expected_token: &str, sub: &str, email: &str) -> Harness {
        let store = Arc::new(MemoryUserStore::new());
        let mailer = Arc::new(RecordingMailer::default());
        let keys = JwtKeys::from_config(&JwtConfig {
            secret: "test-secret".into(),
            ttl_seconds: 3600,
        });
        let verifier = Arc::new(StaticVerifier {
            expected_token: expected_token.into(),
            identity: GoogleIdentity {
                sub: sub.into(),
                email: Some(email.into()),
                name: Some("B".into()),
                picture: Some("https://example.com/b.png".into()),
            },
        });
        let service = AuthService::new(
            store.clone(),
            mailer.clone(),
            verifier,
            keys.clone(),
        );
        Harness {
            service,
            store,
            mailer,
            keys,
        }
    }

    fn register_req(email: &str, password: &str, name: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.into(),
            password: password.into(),
            name: name.into(),
        }
    }

    #[tokio::test]
    async fn register_hashes_password_and_stores_verification_token() {
        let h = harness();
        let dto = h
            .service
            .register(register_req("a@x.com", "secret-1", "A"))
            .await
            .unwrap();
        assert_eq!(dto.email, "a@x.com");
        assert!(!dto.email_verified);

        let stored = h.store.find_by_email("a@x.com").await.unwrap().unwrap();
        let hash = stored.password_hash.unwrap();
        assert_ne!(hash, "secret-1");
        assert!(verify_secret("secret-1", &hash).unwrap());

        // The emailed token is the stored one, and its subject is random.
        let sent = h.mailer.verification_tokens.lock().unwrap().clone();
        assert_eq!(sent.len(), 1);
        assert_eq!(Some(sent[0].1.as_str()), stored.verification_token.as_deref());
        let claims = h.keys.verify_kind(&sent[0].1, TokenKind::Verify).unwrap();
        assert_eq!(claims.email, "a@x.com");
        assert_ne!(claims.sub, stored.id);
    }

    #[tokio::test]
    async fn duplicate_registration_conflicts() {
        let h = harness();
        h.service
            .register(register_req("a@x.com", "secret-1", "A"))
            .await
            .unwrap();
        let err = h
            .service
            .register(register_req("a@x.com", "secret-2", "A2"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn register_survives_mail_outage() {
        let h = harness();
        h.mailer.fail_next_sends();
        let dto = h
            .service
            .register(register_req("a@x.com", "secret-1", "A"))
            .await
            .expect("registration succeeds without mail");
        let stored = h.store.find_by_email(&dto.email).await.unwrap().unwrap();
        assert!(stored.verification_token.is_some());
    }

    #[tokio::test]
    async fn verify_email_is_single_use() {
        let h = harness();
        h.service
            .register(register_req("a@x.com", "secret-1", "A"))
            .await
            .unwrap();
        let token = h.mailer.verification_tokens.lock().unwrap()[0].1.clone();

        h.service.verify_email(&token).await.unwrap();
        let user = h.store.find_by_email("a@x.com").await.unwrap().unwrap();
        assert!(user.email_verified);
        assert!(user.verification_token.is_none());

        // Replay of a consumed token is indistinguishable from a bad token.
        assert!(matches!(
            h.service.verify_email(&token).await.unwrap_err(),
            AppError::InvalidToken
        ));
        assert!(matches!(
            h.service.verify_email("").await.unwrap_err(),
            AppError::Validation(_)
        ));
    }

    #[tokio::test]
    async fn login_distinguishes_its_failure_modes() {
        let h = harness();
        h.service
            .register(register_req("a@x.com", "secret-1", "A"))
            .await
            .unwrap();

        assert!(matches!(
            h.service
                .login(LoginRequest {
                    email: "nobody@x.com".into(),
                    password: "whatever".into()
                })
                .await
                .unwrap_err(),
            AppError::UserNotFound
        ));
        assert!(matches!(
            h.service
                .login(LoginRequest {
                    email: "a@x.com".into(),
                    password: "wrong".into()
                })
                .await
                .unwrap_err(),
            AppError::InvalidCredentials
        ));

        let auth = h
            .service
            .login(LoginRequest {
                email: "a@x.com".into(),
                password: "secret-1".into(),
            })
            .await
            .unwrap();
        let claims = h.keys.verify_kind(&auth.token, TokenKind::Session).unwrap();
        assert_eq!(claims.email, "a@x.com");
        assert_eq!(claims.sub, auth.user.id);
    }

    #[tokio::test]
    async fn google_only_account_requires_google_login() {
        let h = harness();
        let auth = h
            .service
            .google_login(GoogleLoginRequest {
                token: "google-id-token".into(),
            })
            .await
            .unwrap();
        assert_eq!(auth.user.email, "b@x.com");

        // Password login against an account with no password is a distinct
        // failure, not bad credentials.
        assert!(matches!(
            h.service
                .login(LoginRequest {
                    email: "b@x.com".into(),
                    password: "anything".into()
                })
                .await
                .unwrap_err(),
            AppError::PasswordRequired
        ));
    }

    #[tokio::test]
    async fn forgot_then_set_new_password_rotates_credentials() {
        let h = harness();
        h.service
            .register(register_req("a@x.com", "secret-1", "A"))
            .await
            .unwrap();

        assert!(matches!(
            h.service.forgot_password("nobody@x.com").await.unwrap_err(),
            AppError::UserNotFound
        ));

        h.service.forgot_password("a@x.com").await.unwrap();
        let token = h.mailer.last_reset_token().unwrap();

        // A wrong token does nothing.
        assert!(matches!(
            h.service
                .set_new_password(SetNewPasswordRequest {
                    token: "not-the-token".into(),
                    new_password: "secret-2".into()
                })
                .await
                .unwrap_err(),
            AppError::InvalidToken
        ));

        h.service
            .set_new_password(SetNewPasswordRequest {
                token: token.clone(),
                new_password: "secret-2".into(),
            })
            .await
            .unwrap();

        // Old password dead, new one works.
        assert!(matches!(
            h.service
                .login(LoginRequest {
                    email: "a@x.com".into(),
                    password: "secret-1".into()
                })
                .await
                .unwrap_err(),
            AppError::InvalidCredentials
        ));
        h.service
            .login(LoginRequest {
                email: "a@x.com".into(),
                password: "secret-2".into(),
            })
            .await
            .unwrap();

        // The token was consumed with the reset.
        assert!(matches!(
            h.service
                .set_new_password(SetNewPasswordRequest {
                    token,
                    new_password: "secret-3".into()
                })
                .await
                .unwrap_err(),
            AppError::InvalidToken
        ));
    }

    #[tokio::test]
    async fn expired_reset_token_is_rejected() {
        let h = harness();
        h.service
            .register(register_req("a@x.com", "secret-1", "A"))
            .await
            .unwrap();
        let user = h.store.find_by_email("a@x.com").await.unwrap().unwrap();

        // Plant a token whose window has already closed.
        h.store
            .store_reset_token(
                user.id,
                "stale-token",
                OffsetDateTime::now_utc() - time::Duration::minutes(1),
            )
            .await
            .unwrap();
        assert!(matches!(
            h.service
                .set_new_password(SetNewPasswordRequest {
                    token: "stale-token".into(),
                    new_password: "secret-2".into()
                })
                .await
                .unwrap_err(),
            AppError::InvalidToken
        ));
    }

    #[tokio::test]
    async fn reset_password_rejects_reuse_of_current_password() {
        let h = harness();
        h.service
            .register(register_req("a@x.com", "secret-1", "A"))
            .await
            .unwrap();

        assert!(matches!(
            h.service
                .reset_password(ResetPasswordRequest {
                    email: "a@x.com".into(),
                    current_password: "wrong".into(),
                    new_password: "secret-2".into()
                })
                .await
                .unwrap_err(),
            AppError::InvalidCredentials
        ));

        // Correct current password but no actual change.
        assert!(matches!(
            h.service
                .reset_password(ResetPasswordRequest {
                    email: "a@x.com".into(),
                    current_password: "secret-1".into(),
                    new_password: "secret-1".into()
                })
                .await
                .unwrap_err(),
            AppError::SamePassword
        ));

        h.service
            .reset_password(ResetPasswordRequest {
                email: "a@x.com".into(),
                current_password: "secret-1".into(),
                new_password: "secret-2".into(),
            })
            .await
            .unwrap();
        h.service
            .login(LoginRequest {
                email: "a@x.com".into(),
                password: "secret-2".into(),
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn google_login_creates_once_then_reuses() {
        let h = harness();
        let first = h
            .service
            .google_login(GoogleLoginRequest {
                token: "google-id-token".into(),
            })
            .await
            .unwrap();
        assert!(first.user.email_verified);
        assert_eq!(first.user.google_id.as_deref(), Some("google-sub-1"));

        let stored_before = h.store.find_by_email("b@x.com").await.unwrap().unwrap();
        let second = h
            .service
            .google_login(GoogleLoginRequest {
                token: "google-id-token".into(),
            })
            .await
            .unwrap();
        let stored_after = h.store.find_by_email("b@x.com").await.unwrap().unwrap();

        assert_eq!(first.user.id, second.user.id);
        assert_eq!(stored_before.updated_at, stored_after.updated_at);
        assert!(matches!(
            h.service
                .google_login(GoogleLoginRequest {
                    token: "forged".into()
                })
                .await
                .unwrap_err(),
            AppError::InvalidIdToken
        ));
    }

    #[tokio::test]
    async fn google_login_links_existing_password_account() {
        let h = harness_with_google("google-id-token", "google-sub-9", "a@x.com");
        h.service
            .register(register_req("a@x.com", "secret-1", "A"))
            .await
            .unwrap();

        let auth = h
            .service
            .google_login(GoogleLoginRequest {
                token: "google-id-token".into(),
            })
            .await
            .unwrap();
        assert_eq!(auth.user.google_id.as_deref(), Some("google-sub-9"));
        assert!(auth.user.email_verified);

        // The password survived the merge.
        h.service
            .login(LoginRequest {
                email: "a@x.com".into(),
                password: "secret-1".into(),
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn email_login_code_full_flow() {
        let h = harness();
        h.service
            .register(register_req("a@x.com", "secret-1", "A"))
            .await
            .unwrap();

        h.service.send_login_code("a@x.com").await.unwrap();
        let code = h.mailer.last_login_code().unwrap();
        assert_eq!(code.len(), 6);

        // Stored value is a hash, not the plaintext code.
        let user = h.store.find_by_email("a@x.com").await.unwrap().unwrap();
        assert_ne!(user.email_login_code.as_deref(), Some(code.as_str()));

        assert!(matches!(
            h.service
                .verify_login_code("a@x.com", "000000")
                .await
                .unwrap_err(),
            AppError::InvalidCode
        ));
        // A failed attempt does not clear the stored code.
        let user = h.store.find_by_email("a@x.com").await.unwrap().unwrap();
        assert!(user.email_login_code.is_some());

        let auth = h.service.verify_login_code("a@x.com", &code).await.unwrap();
        assert!(auth.user.email_verified);
        let claims = h.keys.verify_kind(&auth.token, TokenKind::Session).unwrap();
        assert_eq!(claims.email, "a@x.com");

        let user = h.store.find_by_email("a@x.com").await.unwrap().unwrap();
        assert!(user.email_login_code.is_none());
        assert!(user.email_login_code_expiry.is_none());

        // Single use.
        assert!(matches!(
            h.service
                .verify_login_code("a@x.com", &code)
                .await
                .unwrap_err(),
            AppError::InvalidCode
        ));
    }

    #[tokio::test]
    async fn stale_login_code_expires() {
        let h = harness();
        h.service
            .register(register_req("a@x.com", "secret-1", "A"))
            .await
            .unwrap();
        let user = h.store.find_by_email("a@x.com").await.unwrap().unwrap();

        let hash = crate::auth::password::hash_secret("123456").unwrap();
        h.store
            .store_login_code(
                user.id,
                &hash,
                OffsetDateTime::now_utc() - time::Duration::minutes(1),
            )
            .await
            .unwrap();

        assert!(matches!(
            h.service
                .verify_login_code("a@x.com", "123456")
                .await
                .unwrap_err(),
            AppError::CodeExpired
        ));

        // Expiry cleared the pair without marking the email verified.
        let user = h.store.find_by_email("a@x.com").await.unwrap().unwrap();
        assert!(user.email_login_code.is_none());
        assert!(user.email_login_code_expiry.is_none());
        assert!(!user.email_verified);

        assert!(matches!(
            h.service
                .verify_login_code("a@x.com", "123456")
                .await
                .unwrap_err(),
            AppError::InvalidCode
        ));
        assert!(matches!(
            h.service
                .verify_login_code("a@x.com", "12345")
                .await
                .unwrap_err(),
            AppError::Validation(_)
        ));
    }
}
