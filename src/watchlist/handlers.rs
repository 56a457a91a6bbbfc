use axum::{
    extract::State,
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use tracing::instrument;

use super::{
    dto::{AddWatchlistRequest, RemoveQuery, WatchlistEntry},
    services,
};
use crate::{
    auth::AuthUser,
    error::AppResult,
    extract::{ApiJson, ApiPath, ApiQuery},
    state::AppState,
};

pub fn watchlist_routes() -> Router<AppState> {
    Router::new()
        .route("/watchlist", get(list_watchlist).post(add_to_watchlist))
        .route("/watchlist/:media_id", delete(remove_from_watchlist))
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn list_watchlist(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> AppResult<Json<Vec<WatchlistEntry>>> {
    Ok(Json(services::list(&state, user.id).await?))
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn add_to_watchlist(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiJson(payload): ApiJson<AddWatchlistRequest>,
) -> AppResult<(StatusCode, Json<WatchlistEntry>)> {
    let entry = services::add(&state, user.id, payload).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn remove_from_watchlist(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiPath(media_id): ApiPath<i64>,
    ApiQuery(q): ApiQuery<RemoveQuery>,
) -> AppResult<Json<Vec<WatchlistEntry>>> {
    Ok(Json(
        services::remove(&state, user.id, media_id, q.media_type.as_deref()).await?,
    ))
}
