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
use crate::blogs::dto::{BlogDto, BlogListQuery, CreateBlogRequest, UpdateBlogRequest};
use crate::blogs::repo::{self, BlogFilter};
use crate::error::AppError;
use crate::response::ApiResponse;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/blog", post(create_blog))
        .route("/blog", get(list_blogs))
        .route("/blog/:id", get(get_blog))
        .route("/blog/:id", patch(update_blog))
        .route("/blog/:id/publish", patch(toggle_publish))
        .route("/blog/:id", delete(remove_blog))
}

/// Authors may edit their own blogs; moderators and admins may act on any.
async fn require_author_or(
    state: &AppState,
    auth: &AuthUser,
    blog_id: Uuid,
    role: Role,
) -> Result<(), AppError> {
    let (blog, _) = repo::get_blog(&state.db, blog_id)
        .await?
        .ok_or(AppError::NotFound("Blog"))?;
    if blog.author_id == auth.id {
        return Ok(());
    }
    auth.require_role(role)
}

#[instrument(skip(state, auth, payload))]
async fn create_blog(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateBlogRequest>,
) -> Result<(StatusCode, Json<ApiResponse<BlogDto>>), AppError> {
    if payload.title.trim().is_empty() || payload.slug.trim().is_empty() {
        return Err(AppError::Validation("Title and slug are required".into()));
    }
    let blog = repo::create_blog(
        &state.db,
        auth.id,
        &payload.title,
        &payload.content,
        &payload.slug,
        payload.published,
        &payload.tag_ids,
    )
    .await?;
    info!(blog_id = %blog.id, author_id = %auth.id, "blog created");
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(blog.into(), "Blog created successfully")),
    ))
}

#[instrument(skip(state))]
async fn list_blogs(
    State(state): State<AppState>,
    Query(query): Query<BlogListQuery>,
) -> Result<Json<ApiResponse<Vec<BlogDto>>>, AppError> {
    let page = query.page.max(1);
    let limit = query.limit.clamp(1, 100);
    let filter = BlogFilter {
        search: query.search,
        tag: query.tag,
        published: query.published,
        author_id: query.author_id,
        limit,
        offset: (page - 1) * limit,
    };
    let blogs = repo::list_blogs(&state.db, &filter)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(Json(ApiResponse::ok(blogs, "Blogs retrieved successfully")))
}

#[instrument(skip(state))]
async fn get_blog(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<BlogDto>>, AppError> {
    let blog = repo::get_blog(&state.db, id)
        .await?
        .ok_or(AppError::NotFound("Blog"))?;
    Ok(Json(ApiResponse::ok(
        blog.into(),
        "Blog retrieved successfully",
    )))
}

#[instrument(skip(state, auth, payload))]
async fn update_blog(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateBlogRequest>,
) -> Result<Json<ApiResponse<BlogDto>>, AppError> {
    require_author_or(&state, &auth, id, Role::Moderator).await?;
    let blog = repo::update_blog(
        &state.db,
        id,
        payload.title.as_deref(),
        payload.content.as_deref(),
        payload.slug.as_deref(),
        payload.tag_ids.as_deref(),
    )
    .await?
    .ok_or(AppError::NotFound("Blog"))?;
    let tags = repo::tags_for(&state.db, id).await?;
    info!(blog_id = %id, "blog updated");
    Ok(Json(ApiResponse::ok(
        (blog, tags).into(),
        "Blog updated successfully",
    )))
}

#[instrument(skip(state, auth))]
async fn toggle_publish(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<BlogDto>>, AppError> {
    require_author_or(&state, &auth, id, Role::Moderator).await?;
    let blog = repo::toggle_publish(&state.db, id)
        .await?
        .ok_or(AppError::NotFound("Blog"))?;
    info!(blog_id = %id, published = blog.published, "publish toggled");
    Ok(Json(ApiResponse::ok(
        blog.into(),
        "Blog publish status toggled",
    )))
}

#[instrument(skip(state, auth))]
async fn remove_blog(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    require_author_or(&state, &auth, id, Role::Moderator).await?;
    if !repo::delete_blog(&state.db, id).await? {
        return Err(AppError::NotFound("Blog"));
    }
    info!(blog_id = %id, "blog deleted");
    Ok(Json(ApiResponse::message("Blog deleted successfully")))
}
