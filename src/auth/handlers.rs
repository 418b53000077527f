use axum::{
    extract::{FromRef, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use crate::auth::dto::{
    AuthData, EmailLoginRequest, EmailLoginVerifyRequest, ForgotPasswordRequest,
    GoogleLoginRequest, LoginRequest, RegisterRequest, ResetPasswordRequest,
    SetNewPasswordRequest, UserDto, VerifyEmailQuery,
};
use crate::auth::extractors::AuthUser;
use crate::auth::services::AuthService;
use crate::error::AppError;
use crate::response::ApiResponse;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/verify", get(verify_email))
        .route("/auth/login", post(login))
        .route("/auth/forgot-password", post(forgot_password))
        .route("/auth/new-password", post(set_new_password))
        .route("/auth/reset-password", post(reset_password))
        .route("/auth/google", post(google_login))
        .route("/auth/email-login/request", post(send_login_code))
        .route("/auth/email-login/verify", post(verify_login_code))
}

#[instrument(skip(state, payload))]
async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserDto>>), AppError> {
    let user = AuthService::from_ref(&state).register(payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(user, "User registered")),
    ))
}

#[instrument(skip(state, query))]
async fn verify_email(
    State(state): State<AppState>,
    Query(query): Query<VerifyEmailQuery>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    AuthService::from_ref(&state).verify_email(&query.token).await?;
    Ok(Json(ApiResponse::message("Email verified successfully")))
}

#[instrument(skip(state, payload))]
async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ApiResponse<AuthData>>, AppError> {
    let data = AuthService::from_ref(&state).login(payload).await?;
    Ok(Json(ApiResponse::ok(data, "Login successful")))
}

#[instrument(skip(state, payload))]
async fn forgot_password(
    State(state): State<AppState>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    AuthService::from_ref(&state)
        .forgot_password(&payload.email)
        .await?;
    Ok(Json(ApiResponse::message(
        "Reset link was sent to the email.",
    )))
}

#[instrument(skip(state, payload))]
async fn set_new_password(
    State(state): State<AppState>,
    Json(payload): Json<SetNewPasswordRequest>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    AuthService::from_ref(&state).set_new_password(payload).await?;
    Ok(Json(ApiResponse::message("Password updated successfully")))
}

/// Authenticated password change; the bearer token gates access, the current
/// password is still re-verified inside the flow.
#[instrument(skip(state, _auth, payload))]
async fn reset_password(
    State(state): State<AppState>,
    _auth: AuthUser,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    AuthService::from_ref(&state).reset_password(payload).await?;
    Ok(Json(ApiResponse::message("Password updated successfully")))
}

#[instrument(skip(state, payload))]
async fn google_login(
    State(state): State<AppState>,
    Json(payload): Json<GoogleLoginRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AuthData>>), AppError> {
    let data = AuthService::from_ref(&state).google_login(payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(data, "Login successful")),
    ))
}

#[instrument(skip(state, payload))]
async fn send_login_code(
    State(state): State<AppState>,
    Json(payload): Json<EmailLoginRequest>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    AuthService::from_ref(&state)
        .send_login_code(&payload.email)
        .await?;
    Ok(Json(ApiResponse::message("Login code sent to the email.")))
}

#[instrument(skip(state, payload))]
async fn verify_login_code(
    State(state): State<AppState>,
    Json(payload): Json<EmailLoginVerifyRequest>,
) -> Result<Json<ApiResponse<AuthData>>, AppError> {
    let data = AuthService::from_ref(&state)
        .verify_login_code(&payload.email, &payload.code)
        .await?;
    Ok(Json(ApiResponse::ok(data, "Login successful")))
}
