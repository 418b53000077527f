use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::store::Role;
use crate::users::repo::{Profile, UserSummaryRow};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileDto {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: Option<String>,
    pub bio: Option<String>,
    pub avatar: Option<String>,
    pub website: Option<String>,
    pub location: Option<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl From<Profile> for ProfileDto {
    fn from(p: Profile) -> Self {
        Self {
            id: p.id,
            user_id: p.user_id,
            name: p.name,
            bio: p.bio,
            avatar: p.avatar,
            website: p.website,
            location: p.location,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

/// User listing/detail projection with the linked profile.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserWithProfileDto {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
    pub email_verified: bool,
    pub google_id: Option<String>,
    pub is_active: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub profile: Option<ProfileDto>,
}

impl From<(UserSummaryRow, Option<Profile>)> for UserWithProfileDto {
    fn from((u, profile): (UserSummaryRow, Option<Profile>)) -> Self {
        Self {
            id: u.id,
            email: u.email,
            role: u.role.parse().unwrap_or(Role::User),
            email_verified: u.email_verified,
            google_id: u.google_id,
            is_active: u.is_active,
            created_at: u.created_at,
            updated_at: u.updated_at,
            profile: profile.map(Into::into),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub bio: Option<String>,
    pub avatar: Option<String>,
    pub website: Option<String>,
    pub location: Option<String>,
}
