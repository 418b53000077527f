use axum::{
    extract::{Path, State},
    routing::{delete, get, patch},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::auth::extractors::AuthUser;
use crate::auth::store::Role;
use crate::error::AppError;
use crate::response::ApiResponse;
use crate::state::AppState;
use crate::users::dto::{ProfileDto, UpdateProfileRequest, UserWithProfileDto};
use crate::users::repo;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/user", get(list_users))
        .route("/user/me", get(me))
        .route("/user/profile", patch(update_profile))
        .route("/user/:id", get(get_user))
        .route("/user/:id", delete(remove_user))
}

/// Admin-only listing of all users with profiles.
#[instrument(skip(state, auth))]
async fn list_users(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<Vec<UserWithProfileDto>>>, AppError> {
    auth.require_role(Role::Admin)?;
    let users = repo::list_users(&state.db)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(Json(ApiResponse::ok(users, "Users retrieved successfully")))
}

#[instrument(skip(state, auth))]
async fn me(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<UserWithProfileDto>>, AppError> {
    let user = repo::get_user(&state.db, auth.id)
        .await?
        .ok_or(AppError::UserNotFound)?;
    Ok(Json(ApiResponse::ok(
        user.into(),
        "User profile retrieved successfully",
    )))
}

#[instrument(skip(state, auth, payload))]
async fn update_profile(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<ApiResponse<ProfileDto>>, AppError> {
    let profile = repo::update_profile(
        &state.db,
        auth.id,
        payload.name.as_deref(),
        payload.bio.as_deref(),
        payload.avatar.as_deref(),
        payload.website.as_deref(),
        payload.location.as_deref(),
    )
    .await?
    .ok_or(AppError::NotFound("Profile"))?;
    info!(user_id = %auth.id, "profile updated");
    Ok(Json(ApiResponse::ok(
        profile.into(),
        "Profile updated successfully",
    )))
}

#[instrument(skip(state, auth))]
async fn get_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<UserWithProfileDto>>, AppError> {
    auth.require_role(Role::Admin)?;
    let user = repo::get_user(&state.db, id)
        .await?
        .ok_or(AppError::UserNotFound)?;
    Ok(Json(ApiResponse::ok(
        user.into(),
        "User retrieved successfully",
    )))
}

/// Soft delete: flips `is_active` off, never removes the row.
#[instrument(skip(state, auth))]
async fn remove_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<UserWithProfileDto>>, AppError> {
    auth.require_role(Role::Admin)?;
    let user = repo::deactivate_user(&state.db, id)
        .await?
        .ok_or(AppError::UserNotFound)?;
    info!(user_id = %id, "user deactivated");
    Ok(Json(ApiResponse::ok(
        (user, None).into(),
        "User removed successfully",
    )))
}
