use axum::{
    extract::State,
    routing::{delete, get, post},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::{
    dto::{FollowRequest, FollowResponse, FollowingEntry, SearchQuery, UserSearchResult},
    services,
};
use crate::{
    auth::{dto::MessageResponse, AuthUser},
    error::{AppError, AppResult},
    extract::{ApiJson, ApiPath, ApiQuery},
    reviews::dto::ReviewView,
    state::AppState,
};

pub fn social_routes() -> Router<AppState> {
    Router::new()
        .route("/search", get(search_users))
        .route("/follow", post(follow_user))
        .route("/follow/:user_id", delete(unfollow_user))
        .route("/following", get(list_following))
        .route("/following/reviews", get(following_reviews))
        .route("/reviews/:user_id", get(user_reviews))
}

fn path_user_id(raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::BadRequest("Invalid user ID".into()))
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn search_users(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiQuery(q): ApiQuery<SearchQuery>,
) -> AppResult<Json<Vec<UserSearchResult>>> {
    Ok(Json(
        services::search_users(&state, user.id, q.username.as_deref()).await?,
    ))
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn follow_user(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiJson(payload): ApiJson<FollowRequest>,
) -> AppResult<Json<FollowResponse>> {
    Ok(Json(
        services::follow(&state, user.id, payload.user_id.as_ref()).await?,
    ))
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn unfollow_user(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiPath(target): ApiPath<String>,
) -> AppResult<Json<MessageResponse>> {
    let target = path_user_id(&target)?;
    services::unfollow(&state, user.id, target).await?;
    Ok(Json(MessageResponse::new("Successfully unfollowed user")))
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn list_following(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> AppResult<Json<Vec<FollowingEntry>>> {
    Ok(Json(services::list_following(&state, user.id).await?))
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn following_reviews(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> AppResult<Json<Vec<ReviewView>>> {
    Ok(Json(services::following_feed(&state, user.id).await?))
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn user_reviews(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiPath(target): ApiPath<String>,
) -> AppResult<Json<Vec<ReviewView>>> {
    let target = path_user_id(&target)?;
    Ok(Json(services::reviews_of_user(&state, user.id, target).await?))
}
