use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use crate::auth::store::Role;
use crate::config::JwtConfig;

/// Purpose of a signed token. One signer mints all three credential kinds;
/// a token presented for the wrong purpose is rejected.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Session,
    Verify,
    Reset,
}

/// Signed payload carried by every token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub role: Role,
    pub iat: usize,
    pub exp: usize,
    pub kind: TokenKind,
}

/// Holds signing/verification keys plus the configured session TTL.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_seconds: i64,
}

impl JwtKeys {
    pub fn from_config(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            ttl_seconds: cfg.ttl_seconds,
        }
    }

    fn sign_with_kind(
        &self,
        sub: Uuid,
        email: &str,
        role: Role,
        kind: TokenKind,
    ) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let exp = now + Duration::seconds(self.ttl_seconds);
        let claims = Claims {
            sub,
            email: email.to_string(),
            role,
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
            kind,
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(%sub, kind = ?kind, "token signed");
        Ok(token)
    }

    /// Session token returned after login/registration/OAuth/code login.
    pub fn sign_session(&self, sub: Uuid, email: &str, role: Role) -> anyhow::Result<String> {
        self.sign_with_kind(sub, email, role, TokenKind::Session)
    }

    /// Email-verification token. The subject is a freshly generated random id,
    /// not the pending user's id; the token is matched against the stored
    /// value when consumed, so its exp claim is never re-checked.
    pub fn sign_verification(&self, email: &str) -> anyhow::Result<String> {
        self.sign_with_kind(Uuid::new_v4(), email, Role::User, TokenKind::Verify)
    }

    /// Password-reset token. The validity window is enforced by the stored
    /// `reset_token_expiry`, a database-side check.
    pub fn sign_reset(&self, sub: Uuid, email: &str, role: Role) -> anyhow::Result<String> {
        self.sign_with_kind(sub, email, role, TokenKind::Reset)
    }

    pub fn verify(&self, token: &str) -> anyhow::Result<Claims> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::default())?;
        Ok(data.claims)
    }

    pub fn verify_kind(&self, token: &str, kind: TokenKind) -> anyhow::Result<Claims> {
        let claims = self.verify(token)?;
        if claims.kind != kind {
            anyhow::bail!("wrong token purpose");
        }
        Ok(claims)
    }
}
