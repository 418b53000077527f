use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::error;

use crate::response::ApiResponse;

/// Single error type shared by every operation. Domain failures are raised
/// close to the point of detection and translated exactly once, here, into a
/// transport status plus the standard envelope.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("User not found")]
    UserNotFound,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account has no password, try Google login")]
    PasswordRequired,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Invalid Google token")]
    InvalidIdToken,

    #[error("Invalid login code")]
    InvalidCode,

    #[error("Login code has expired")]
    CodeExpired,

    #[error("New password must be different from the current password")]
    SamePassword,

    #[error("{0}")]
    Conflict(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,

    #[error("database error")]
    Database(#[from] sqlx::Error),

    #[error("mail delivery failed: {0}")]
    Mail(String),

    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::UserNotFound | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::PasswordRequired => StatusCode::BAD_REQUEST,
            Self::InvalidToken => StatusCode::BAD_REQUEST,
            Self::InvalidIdToken => StatusCode::UNAUTHORIZED,
            Self::InvalidCode | Self::CodeExpired => StatusCode::UNAUTHORIZED,
            Self::SamePassword => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Database(_) | Self::Mail(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        // Internal detail stays in the logs, never in the response body.
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(error = %self, "request failed");
            "An internal error occurred. Please try again later.".to_string()
        } else {
            self.to_string()
        };
        (status, Json(ApiResponse::error(message))).into_response()
    }
}

/// Remap the driver's unique-violation code to a `Conflict` with a
/// domain-level message; everything else stays a database error.
pub fn on_unique_violation(err: sqlx::Error, conflict_message: &str) -> AppError {
    if let sqlx::Error::Database(ref db) = err {
        if db.is_unique_violation() {
            return AppError::Conflict(conflict_message.to_string());
        }
    }
    AppError::Database(err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_the_taxonomy() {
        assert_eq!(
            AppError::Validation("bad".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::UserNotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::InvalidCredentials.status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(AppError::PasswordRequired.status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::InvalidToken.status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::InvalidIdToken.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::CodeExpired.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::SamePassword.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::Conflict("dup".into()).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(AppError::Forbidden.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn internal_errors_hide_detail() {
        let resp = AppError::Internal(anyhow::anyhow!("secret pool state")).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn password_required_is_not_invalid_credentials() {
        // A Google-only account must get a distinct, recoverable signal.
        assert_ne!(
            AppError::PasswordRequired.to_string(),
            AppError::InvalidCredentials.to_string()
        );
    }
}
