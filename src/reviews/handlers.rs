use axum::{
    extract::State,
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::{
    dto::{CreateReviewRequest, ReviewView},
    services,
};
use crate::{
    auth::{dto::MessageResponse, AuthUser},
    error::AppResult,
    extract::{ApiJson, ApiPath},
    state::AppState,
};

pub fn review_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_my_reviews).post(create_review))
        .route("/:id", delete(delete_review))
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn create_review(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiJson(payload): ApiJson<CreateReviewRequest>,
) -> AppResult<(StatusCode, Json<ReviewView>)> {
    let review = services::create(&state, user.id, payload).await?;
    Ok((StatusCode::CREATED, Json(review)))
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn list_my_reviews(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> AppResult<Json<Vec<ReviewView>>> {
    Ok(Json(services::list_mine(&state, user.id).await?))
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn delete_review(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    services::delete(&state, user.id, id).await?;
    Ok(Json(MessageResponse::new("Review removed")))
}
