use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Mutex;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::{on_unique_violation, AppError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Moderator,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Moderator => "moderator",
            Role::Admin => "admin",
        }
    }
}

impl FromStr for Role {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "moderator" => Ok(Role::Moderator),
            "admin" => Ok(Role::Admin),
            _ => Err(()),
        }
    }
}

/// Identity record. Credential fields stay internal; the API projection is
/// built in `auth::dto`.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: Option<String>,
    pub role: Role,
    pub email_verified: bool,
    pub google_id: Option<String>,
    pub verification_token: Option<String>,
    pub reset_token: Option<String>,
    pub reset_token_expiry: Option<OffsetDateTime>,
    pub email_login_code: Option<String>,
    pub email_login_code_expiry: Option<OffsetDateTime>,
    pub is_active: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Input for user creation. Registration sets a password hash and a
/// verification token; first Google login sets `google_id` instead.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: Option<String>,
    pub role: Role,
    pub email_verified: bool,
    pub google_id: Option<String>,
    pub verification_token: Option<String>,
    pub profile_name: Option<String>,
    pub profile_avatar: Option<String>,
}

/// Narrow persistence handle for the credential-lifecycle flow. The
/// orchestrator depends only on this trait; `PgUserStore` runs against
/// Postgres and `MemoryUserStore` substitutes in tests.
///
/// The consume_* operations are single conditional updates ("clear only if
/// still equal"), so two concurrent submissions of the same token or code
/// cannot both succeed.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Create the user together with its empty profile. Duplicate email (or
    /// google id) surfaces as `Conflict`.
    async fn create_user(&self, new: NewUser) -> Result<User, AppError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;

    /// Mark the email verified and clear the token, keyed on the exact stored
    /// token. Returns the updated user, or `None` when no user holds this
    /// token (including a token already consumed).
    async fn consume_verification_token(&self, token: &str) -> Result<Option<User>, AppError>;

    async fn store_reset_token(
        &self,
        user_id: Uuid,
        token: &str,
        expires_at: OffsetDateTime,
    ) -> Result<(), AppError>;

    /// Set the new password hash and clear the reset pair, iff the stored
    /// token matches exactly and its expiry is still in the future.
    async fn consume_reset_token(
        &self,
        token: &str,
        now: OffsetDateTime,
        new_password_hash: &str,
    ) -> Result<Option<User>, AppError>;

    async fn update_password(&self, user_id: Uuid, password_hash: &str) -> Result<(), AppError>;

    async fn store_login_code(
        &self,
        user_id: Uuid,
        code_hash: &str,
        expires_at: OffsetDateTime,
    ) -> Result<(), AppError>;

    /// Clear the login-code pair and mark the email verified, iff the stored
    /// hash is still the one that was validated. Returns false when another
    /// request consumed it first.
    async fn consume_login_code(&self, user_id: Uuid, code_hash: &str) -> Result<bool, AppError>;

    /// Drop a dead (expired) login code without touching the verified flag.
    async fn clear_login_code(&self, user_id: Uuid) -> Result<(), AppError>;

    /// Attach a Google identity to an existing account and mark the email
    /// verified. The password, if any, is untouched.
    async fn link_google(&self, user_id: Uuid, google_id: &str) -> Result<User, AppError>;
}

// --- Postgres implementation ---

#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    password_hash: Option<String>,
    role: String,
    email_verified: bool,
    google_id: Option<String>,
    verification_token: Option<String>,
    reset_token: Option<String>,
    reset_token_expiry: Option<OffsetDateTime>,
    email_login_code: Option<String>,
    email_login_code_expiry: Option<OffsetDateTime>,
    is_active: bool,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<UserRow> for User {
    fn from(r: UserRow) -> Self {
        Self {
            id: r.id,
            email: r.email,
            password_hash: r.password_hash,
            // The column carries a CHECK constraint; an unknown value can only
            // come from out-of-band writes and degrades to the lowest role.
            role: r.role.parse().unwrap_or(Role::User),
            email_verified: r.email_verified,
            google_id: r.google_id,
            verification_token: r.verification_token,
            reset_token: r.reset_token,
            reset_token_expiry: r.reset_token_expiry,
            email_login_code: r.email_login_code,
            email_login_code_expiry: r.email_login_code_expiry,
            is_active: r.is_active,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

const USER_COLUMNS: &str = "id, email, password_hash, role, email_verified, google_id, \
     verification_token, reset_token, reset_token_expiry, \
     email_login_code, email_login_code_expiry, is_active, created_at, updated_at";

pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create_user(&self, new: NewUser) -> Result<User, AppError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            INSERT INTO users (email, password_hash, role, email_verified, google_id, verification_token)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&new.email)
        .bind(&new.password_hash)
        .bind(new.role.as_str())
        .bind(new.email_verified)
        .bind(&new.google_id)
        .bind(&new.verification_token)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| on_unique_violation(e, "An account with this email already exists"))?;

        sqlx::query(
            r#"
            INSERT INTO profiles (user_id, name, avatar)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(row.id)
        .bind(&new.profile_name)
        .bind(&new.profile_avatar)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(row.into())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn consume_verification_token(&self, token: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            UPDATE users
            SET email_verified = TRUE, verification_token = NULL, updated_at = now()
            WHERE verification_token = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn store_reset_token(
        &self,
        user_id: Uuid,
        token: &str,
        expires_at: OffsetDateTime,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE users
            SET reset_token = $2, reset_token_expiry = $3, updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .bind(token)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn consume_reset_token(
        &self,
        token: &str,
        now: OffsetDateTime,
        new_password_hash: &str,
    ) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            UPDATE users
            SET password_hash = $3, reset_token = NULL, reset_token_expiry = NULL, updated_at = now()
            WHERE reset_token = $1 AND reset_token_expiry > $2
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(token)
        .bind(now)
        .bind(new_password_hash)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn update_password(&self, user_id: Uuid, password_hash: &str) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE users SET password_hash = $2, updated_at = now() WHERE id = $1
            "#,
        )
        .bind(user_id)
        .bind(password_hash)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn store_login_code(
        &self,
        user_id: Uuid,
        code_hash: &str,
        expires_at: OffsetDateTime,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE users
            SET email_login_code = $2, email_login_code_expiry = $3, updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .bind(code_hash)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn consume_login_code(&self, user_id: Uuid, code_hash: &str) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET email_login_code = NULL, email_login_code_expiry = NULL,
                email_verified = TRUE, updated_at = now()
            WHERE id = $1 AND email_login_code = $2
            "#,
        )
        .bind(user_id)
        .bind(code_hash)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn clear_login_code(&self, user_id: Uuid) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE users
            SET email_login_code = NULL, email_login_code_expiry = NULL, updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn link_google(&self, user_id: Uuid, google_id: &str) -> Result<User, AppError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            UPDATE users
            SET google_id = $2, email_verified = TRUE, updated_at = now()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(google_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| on_unique_violation(e, "This Google account is already linked"))?;
        row.map(Into::into).ok_or(AppError::UserNotFound)
    }
}

// --- In-memory implementation ---

/// Mutex-guarded map mirroring `PgUserStore` semantics, including the
/// conditional consume operations. Substituted for the database in tests and
/// usable for local runs without Postgres.
#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<HashMap<Uuid, User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_users<R>(&self, f: impl FnOnce(&mut HashMap<Uuid, User>) -> R) -> R {
        let mut users = self.users.lock().expect("user map poisoned");
        f(&mut users)
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create_user(&self, new: NewUser) -> Result<User, AppError> {
        self.with_users(|users| {
            if users.values().any(|u| u.email == new.email) {
                return Err(AppError::Conflict(
                    "An account with this email already exists".into(),
                ));
            }
            if let Some(gid) = &new.google_id {
                if users.values().any(|u| u.google_id.as_deref() == Some(gid)) {
                    return Err(AppError::Conflict(
                        "This Google account is already linked".into(),
                    ));
                }
            }
            let now = OffsetDateTime::now_utc();
            let user = User {
                id: Uuid::new_v4(),
                email: new.email,
                password_hash: new.password_hash,
                role: new.role,
                email_verified: new.email_verified,
                google_id: new.google_id,
                verification_token: new.verification_token,
                reset_token: None,
                reset_token_expiry: None,
                email_login_code: None,
                email_login_code_expiry: None,
                is_active: true,
                created_at: now,
                updated_at: now,
            };
            users.insert(user.id, user.clone());
            Ok(user)
        })
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        self.with_users(|users| Ok(users.values().find(|u| u.email == email).cloned()))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        self.with_users(|users| Ok(users.get(&id).cloned()))
    }

    async fn consume_verification_token(&self, token: &str) -> Result<Option<User>, AppError> {
        self.with_users(|users| {
            let user = users
                .values_mut()
                .find(|u| u.verification_token.as_deref() == Some(token));
            Ok(user.map(|u| {
                u.email_verified = true;
                u.verification_token = None;
                u.updated_at = OffsetDateTime::now_utc();
                u.clone()
            }))
        })
    }

    async fn store_reset_token(
        &self,
        user_id: Uuid,
        token: &str,
        expires_at: OffsetDateTime,
    ) -> Result<(), AppError> {
        self.with_users(|users| {
            if let Some(u) = users.get_mut(&user_id) {
                u.reset_token = Some(token.to_string());
                u.reset_token_expiry = Some(expires_at);
                u.updated_at = OffsetDateTime::now_utc();
            }
            Ok(())
        })
    }

    async fn consume_reset_token(
        &self,
        token: &str,
        now: OffsetDateTime,
        new_password_hash: &str,
    ) -> Result<Option<User>, AppError> {
        self.with_users(|users| {
            let user = users.values_mut().find(|u| {
                u.reset_token.as_deref() == Some(token)
                    && u.reset_token_expiry.map(|e| e > now).unwrap_or(false)
            });
            Ok(user.map(|u| {
                u.password_hash = Some(new_password_hash.to_string());
                u.reset_token = None;
                u.reset_token_expiry = None;
                u.updated_at = OffsetDateTime::now_utc();
                u.clone()
            }))
        })
    }

    async fn update_password(&self, user_id: Uuid, password_hash: &str) -> Result<(), AppError> {
        self.with_users(|users| {
            if let Some(u) = users.get_mut(&user_id) {
                u.password_hash = Some(password_hash.to_string());
                u.updated_at = OffsetDateTime::now_utc();
            }
            Ok(())
        })
    }

    async fn store_login_code(
        &self,
        user_id: Uuid,
        code_hash: &str,
        expires_at: OffsetDateTime,
    ) -> Result<(), AppError> {
        self.with_users(|users| {
            if let Some(u) = users.get_mut(&user_id) {
                u.email_login_code = Some(code_hash.to_string());
                u.email_login_code_expiry = Some(expires_at);
                u.updated_at = OffsetDateTime::now_utc();
            }
            Ok(())
        })
    }

    async fn consume_login_code(&self, user_id: Uuid, code_hash: &str) -> Result<bool, AppError> {
        self.with_users(|users| {
            let Some(u) = users.get_mut(&user_id) else {
                return Ok(false);
            };
            if u.email_login_code.as_deref() != Some(code_hash) {
                return Ok(false);
            }
            u.email_login_code = None;
            u.email_login_code_expiry = None;
            u.email_verified = true;
            u.updated_at = OffsetDateTime::now_utc();
            Ok(true)
        })
    }

    async fn clear_login_code(&self, user_id: Uuid) -> Result<(), AppError> {
        self.with_users(|users| {
            if let Some(u) = users.get_mut(&user_id) {
                u.email_login_code = None;
                u.email_login_code_expiry = None;
                u.updated_at = OffsetDateTime::now_utc();
            }
            Ok(())
        })
    }

    async fn link_google(&self, user_id: Uuid, google_id: &str) -> Result<User, AppError> {
        self.with_users(|users| {
            if users.values().any(|u| {
                u.google_id.as_deref() == Some(google_id) && u.id != user_id
            }) {
                return Err(AppError::Conflict(
                    "This Google account is already linked".into(),
                ));
            }
            let u = users.get_mut(&user_id).ok_or(AppError::UserNotFound)?;
            u.google_id = Some(google_id.to_string());
            u.email_verified = true;
            u.updated_at = OffsetDateTime::now_utc();
            Ok(u.clone())
        })
    }
}
