use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, patch, post},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::auth::extractors::AuthUser;
use crate::auth::store::Role;
use crate::error::AppError;
use crate::response::ApiResponse;
use crate::state::AppState;
use crate::tags::dto::{
    slugify, CreateTagRequest, TagDto, TagListQuery, TagSearchQuery, UpdateTagRequest,
};
use crate::tags::repo;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/tag", post(create_tag))
        .route("/tag", get(list_tags))
        .route("/tag/search/autocomplete", get(search_tags))
        .route("/tag/:id", get(get_tag))
        .route("/tag/:id", patch(update_tag))
        .route("/tag/:id", delete(remove_tag))
}

#[instrument(skip(state, auth, payload))]
async fn create_tag(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateTagRequest>,
) -> Result<(StatusCode, Json<ApiResponse<TagDto>>), AppError> {
    auth.require_role(Role::Moderator)?;
    if payload.name.trim().is_empty() {
        return Err(AppError::Validation("Name is required".into()));
    }
    let slug = payload
        .slug
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| slugify(&payload.name));
    let tag = repo::create_tag(&state.db, payload.name.trim(), &slug).await?;
    info!(tag_id = %tag.id, "tag created");
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(tag.into(), "Tag created successfully")),
    ))
}

#[instrument(skip(state))]
async fn list_tags(
    State(state): State<AppState>,
    Query(query): Query<TagListQuery>,
) -> Result<Json<ApiResponse<Vec<TagDto>>>, AppError> {
    let page = query.page.max(1);
    let limit = query.limit.clamp(1, 100);
    let ascending = query.order.as_deref() == Some("asc");
    let tags = repo::list_tags(
        &state.db,
        query.search.as_deref(),
        ascending,
        limit,
        (page - 1) * limit,
    )
    .await?
    .into_iter()
    .map(Into::into)
    .collect();
    Ok(Json(ApiResponse::ok(tags, "Tags retrieved successfully")))
}

#[instrument(skip(state))]
async fn search_tags(
    State(state): State<AppState>,
    Query(query): Query<TagSearchQuery>,
) -> Result<Json<ApiResponse<Vec<TagDto>>>, AppError> {
    let tags = repo::search_tags(&state.db, &query.search_term)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(Json(ApiResponse::ok(tags, "Tags retrieved successfully")))
}

#[instrument(skip(state))]
async fn get_tag(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<TagDto>>, AppError> {
    let tag = repo::get_tag(&state.db, id)
        .await?
        .ok_or(AppError::NotFound("Tag"))?;
    Ok(Json(ApiResponse::ok(
        tag.into(),
        "Tag retrieved successfully",
    )))
}

#[instrument(skip(state, auth, payload))]
async fn update_tag(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateTagRequest>,
) -> Result<Json<ApiResponse<TagDto>>, AppError> {
    auth.require_role(Role::Moderator)?;
    let tag = repo::update_tag(
        &state.db,
        id,
        payload.name.as_deref(),
        payload.slug.as_deref(),
    )
    .await?
    .ok_or(AppError::NotFound("Tag"))?;
    info!(tag_id = %id, "tag updated");
    Ok(Json(ApiResponse::ok(tag.into(), "Tag updated successfully")))
}

#[instrument(skip(state, auth))]
async fn remove_tag(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    auth.require_role(Role::Moderator)?;
    if !repo::delete_tag(&state.db, id).await? {
        return Err(AppError::NotFound("Tag"));
    }
    info!(tag_id = %id, "tag deleted");
    Ok(Json(ApiResponse::message("Tag deleted successfully")))
}
