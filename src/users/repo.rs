use sqlx::{FromRow, PgPool};
use std::collections::HashMap;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::AppError;

/// 1:1 display extension of a user. Created at registration; only mutated
/// through the profile-update operation.
#[derive(Debug, Clone, FromRow)]
pub struct Profile {
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

#[derive(Debug, FromRow)]
pub struct UserSummaryRow {
    pub id: Uuid,
    pub email: String,
    pub role: String,
    pub email_verified: bool,
    pub google_id: Option<String>,
    pub is_active: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

const SUMMARY_COLUMNS: &str =
    "id, email, role, email_verified, google_id, is_active, created_at, updated_at";

pub async fn list_users(db: &PgPool) -> Result<Vec<(UserSummaryRow, Option<Profile>)>, AppError> {
    let users = sqlx::query_as::<_, UserSummaryRow>(&format!(
        "SELECT {SUMMARY_COLUMNS} FROM users ORDER BY created_at DESC"
    ))
    .fetch_all(db)
    .await?;

    let ids: Vec<Uuid> = users.iter().map(|u| u.id).collect();
    let profiles = sqlx::query_as::<_, Profile>(
        r#"
        SELECT id, user_id, name, bio, avatar, website, location, created_at, updated_at
        FROM profiles
        WHERE user_id = ANY($1)
        "#,
    )
    .bind(&ids)
    .fetch_all(db)
    .await?;

    let mut by_user: HashMap<Uuid, Profile> =
        profiles.into_iter().map(|p| (p.user_id, p)).collect();
    Ok(users
        .into_iter()
        .map(|u| {
            let profile = by_user.remove(&u.id);
            (u, profile)
        })
        .collect())
}

pub async fn get_user(
    db: &PgPool,
    id: Uuid,
) -> Result<Option<(UserSummaryRow, Option<Profile>)>, AppError> {
    let user = sqlx::query_as::<_, UserSummaryRow>(&format!(
        "SELECT {SUMMARY_COLUMNS} FROM users WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(db)
    .await?;

    let Some(user) = user else {
        return Ok(None);
    };
    let profile = get_profile(db, id).await?;
    Ok(Some((user, profile)))
}

pub async fn get_profile(db: &PgPool, user_id: Uuid) -> Result<Option<Profile>, AppError> {
    let profile = sqlx::query_as::<_, Profile>(
        r#"
        SELECT id, user_id, name, bio, avatar, website, location, created_at, updated_at
        FROM profiles
        WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(db)
    .await?;
    Ok(profile)
}

/// Partial update: absent fields keep their stored values.
pub async fn update_profile(
    db: &PgPool,
    user_id: Uuid,
    name: Option<&str>,
    bio: Option<&str>,
    avatar: Option<&str>,
    website: Option<&str>,
    location: Option<&str>,
) -> Result<Option<Profile>, AppError> {
    let profile = sqlx::query_as::<_, Profile>(
        r#"
        UPDATE profiles
        SET name = COALESCE($2, name),
            bio = COALESCE($3, bio),
            avatar = COALESCE($4, avatar),
            website = COALESCE($5, website),
            location = COALESCE($6, location),
            updated_at = now()
        WHERE user_id = $1
        RETURNING id, user_id, name, bio, avatar, website, location, created_at, updated_at
        "#,
    )
    .bind(user_id)
    .bind(name)
    .bind(bio)
    .bind(avatar)
    .bind(website)
    .bind(location)
    .fetch_optional(db)
    .await?;
    Ok(profile)
}

/// Soft delete: the record stays, `is_active` flips off.
pub async fn deactivate_user(db: &PgPool, id: Uuid) -> Result<Option<UserSummaryRow>, AppError> {
    let user = sqlx::query_as::<_, UserSummaryRow>(&format!(
        r#"
        UPDATE users SET is_active = FALSE, updated_at = now()
        WHERE id = $1
        RETURNING {SUMMARY_COLUMNS}
        "#
    ))
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(user)
}
