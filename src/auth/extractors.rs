use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::auth::jwt::{JwtKeys, TokenKind};
use crate::auth::store::Role;
use crate::error::AppError;
use crate::state::AppState;

/// Extracts and validates the bearer session token, yielding the caller's
/// id and role. Tokens minted for verification or reset are rejected here.
#[derive(Debug)]
pub struct AuthUser {
    pub id: Uuid,
    pub role: Role,
}

impl AuthUser {
    /// Role guard: admins pass every check.
    pub fn require_role(&self, role: Role) -> Result<(), AppError> {
        let allowed = match role {
            Role::User => true,
            Role::Moderator => matches!(self.role, Role::Moderator | Role::Admin),
            Role::Admin => matches!(self.role, Role::Admin),
        };
        if allowed {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or(AppError::Unauthorized)?;

        let token = auth
            .strip_prefix("Bearer ")
            .or_else(|| auth.strip_prefix("bearer "))
            .ok_or(AppError::Unauthorized)?;

        let keys = JwtKeys::from_config(&state.config.jwt);
        let claims = keys
            .verify_kind(token, TokenKind::Session)
            .map_err(|_| AppError::Unauthorized)?;

        Ok(AuthUser {
            id: claims.sub,
            role: claims.role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_guard_orders_roles() {
        let user = AuthUser {
            id: Uuid::new_v4(),
            role: Role::User,
        };
        assert!(user.require_role(Role::User).is_ok());
        assert!(user.require_role(Role::Moderator).is_err());
        assert!(user.require_role(Role::Admin).is_err());

        let moderator = AuthUser {
            id: Uuid::new_v4(),
            role: Role::Moderator,
        };
        assert!(moderator.require_role(Role::User).is_ok());
        assert!(moderator.require_role(Role::Moderator).is_ok());
        assert!(moderator.require_role(Role::Admin).is_err());

        let admin = AuthUser {
            id: Uuid::new_v4(),
            role: Role::Admin,
        };
        assert!(admin.require_role(Role::Moderator).is_ok());
        assert!(admin.require_role(Role::Admin).is_ok());
    }
}
