use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::store::{Role, User};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// A login code is exactly six digits, as submitted.
pub(crate) fn is_six_digit_code(code: &str) -> bool {
    lazy_static! {
        static ref CODE_RE: Regex = Regex::new(r"^\d{6}$").unwrap();
    }
    CODE_RE.is_match(code.trim())
}

/// Request body for registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

/// Request body for password login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyEmailQuery {
    #[serde(default)]
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

/// Request body for completing a password reset via emailed token.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetNewPasswordRequest {
    #[serde(default)]
    pub token: String,
    pub new_password: String,
}

/// Authenticated password change.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub email: String,
    pub current_password: String,
    pub new_password: String,
}

/// Body for Google sign-in: the ID token obtained client-side.
#[derive(Debug, Deserialize)]
pub struct GoogleLoginRequest {
    #[serde(default)]
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct EmailLoginRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct EmailLoginVerifyRequest {
    pub email: String,
    /// Clients send the code either as a JSON string or a bare number.
    #[serde(deserialize_with = "string_or_number")]
    pub code: String,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Value {
        Number(u64),
        Text(String),
    }
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.to_string(),
        Value::Text(s) => s,
    })
}

/// Public projection of a user. Password hash and every token/code field are
/// excluded.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
    pub email_verified: bool,
    pub google_id: Option<String>,
    pub is_active: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl From<&User> for UserDto {
    fn from(u: &User) -> Self {
        Self {
            id: u.id,
            email: u.email.clone(),
            role: u.role,
            email_verified: u.email_verified,
            google_id: u.google_id.clone(),
            is_active: u.is_active,
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}

impl From<User> for UserDto {
    fn from(u: User) -> Self {
        (&u).into()
    }
}

/// Returned by login, Google login, and code login.
#[derive(Debug, Serialize)]
pub struct AuthData {
    pub user: UserDto,
    pub token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_regex_accepts_and_rejects() {
        assert!(is_valid_email("a@x.com"));
        assert!(is_valid_email("first.last@sub.domain.org"));
        assert!(!is_valid_email("ax.com"));
        assert!(!is_valid_email("a@x"));
        assert!(!is_valid_email("a b@x.com"));
    }

    #[test]
    fn login_code_accepts_string_or_number() {
        let from_string: EmailLoginVerifyRequest =
            serde_json::from_str(r#"{"email":"a@x.com","code":"123456"}"#).unwrap();
        assert_eq!(from_string.code, "123456");
        let from_number: EmailLoginVerifyRequest =
            serde_json::from_str(r#"{"email":"a@x.com","code":123456}"#).unwrap();
        assert_eq!(from_number.code, "123456");
    }

    #[test]
    fn six_digit_code_check() {
        assert!(is_six_digit_code("123456"));
        assert!(is_six_digit_code(" 123456 "));
        assert!(!is_six_digit_code("12345"));
        assert!(!is_six_digit_code("1234567"));
        assert!(!is_six_digit_code("12a456"));
    }

    #[test]
    fn user_projection_excludes_secrets() {
        let now = OffsetDateTime::now_utc();
        let user = User {
            id: Uuid::new_v4(),
            email: "a@x.com".into(),
            password_hash: Some("$argon2id$secret".into()),
            role: Role::User,
            email_verified: false,
            google_id: None,
            verification_token: Some("tok".into()),
            reset_token: Some("reset".into()),
            reset_token_expiry: Some(now),
            email_login_code: Some("code-hash".into()),
            email_login_code_expiry: Some(now),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_string(&UserDto::from(&user)).unwrap();
        assert!(json.contains("a@x.com"));
        assert!(json.contains("\"emailVerified\":false"));
        assert!(!json.contains("argon2"));
        assert!(!json.contains("password"));
        assert!(!json.contains("tok"));
        assert!(!json.contains("reset"));
        assert!(!json.contains("code-hash"));
    }
}
