use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use super::{
    dto::{
        ForgotPasswordRequest, LoginRequest, LoginResponse, MessageResponse, ProfileResponse,
        RegisterRequest, RegisterResponse, ResetPasswordRequest, UpdateProfileRequest,
        UpdateProfileResponse, VerifyEmailResponse,
    },
    extractors::AuthUser,
    services,
};
use crate::{
    error::AppResult,
    extract::{ApiJson, ApiPath},
    state::AppState,
};

/// Routes reachable without a session token.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/verify-email/:token", get(verify_email))
        .route("/forgot-password", post(forgot_password))
        .route("/reset-password/:token", post(reset_password))
}

pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/profile", get(get_profile).put(update_profile))
        .route("/resend-verification", post(resend_verification))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> AppResult<(StatusCode, Json<RegisterResponse>)> {
    let resp = services::register(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    Ok(Json(services::login(&state, payload).await?))
}

#[instrument(skip(state, token))]
pub async fn verify_email(
    State(state): State<AppState>,
    ApiPath(token): ApiPath<String>,
) -> AppResult<Json<VerifyEmailResponse>> {
    Ok(Json(services::verify_email(&state, &token).await?))
}

#[instrument(skip(state, payload))]
pub async fn forgot_password(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<ForgotPasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    Ok(Json(services::forgot_password(&state, payload).await?))
}

#[instrument(skip(state, token, payload))]
pub async fn reset_password(
    State(state): State<AppState>,
    ApiPath(token): ApiPath<String>,
    ApiJson(payload): ApiJson<ResetPasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    Ok(Json(services::reset_password(&state, &token, payload).await?))
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn get_profile(AuthUser(user): AuthUser) -> Json<ProfileResponse> {
    Json(services::profile(&user))
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiJson(payload): ApiJson<UpdateProfileRequest>,
) -> AppResult<Json<UpdateProfileResponse>> {
    Ok(Json(services::update_profile(&state, user, payload).await?))
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn resend_verification(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> AppResult<Json<MessageResponse>> {
    Ok(Json(services::resend_verification(&state, user).await?))
}
