use axum::{
    extract::State,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::instrument;

use super::TimeWindow;
use crate::{
    db::MediaType,
    error::{AppError, AppResult},
    extract::{ApiPath, ApiQuery},
    state::AppState,
};

pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/popular", get(popular_movies))
        .route("/trending/:window", get(trending_movies))
        .route("/search", get(search))
        .route("/tv/popular", get(popular_tv))
        .route("/tv/trending/:window", get(trending_tv))
        .route("/tv/:id", get(tv_details))
        .route("/tv/:id/reviews", get(tv_reviews))
        .route("/:id", get(movie_details))
        .route("/:id/reviews", get(movie_reviews))
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_page")]
    pub page: u32,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub query: String,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(rename = "type")]
    pub media_type: Option<String>,
}

fn default_page() -> u32 {
    1
}

fn parse_window(window: &str) -> AppResult<TimeWindow> {
    TimeWindow::parse(window)
        .ok_or_else(|| AppError::BadRequest("Time window must be 'day' or 'week'".into()))
}

#[instrument(skip(state))]
pub async fn popular_movies(
    State(state): State<AppState>,
    ApiQuery(q): ApiQuery<PageQuery>,
) -> AppResult<Json<Value>> {
    Ok(Json(state.catalog.popular(MediaType::Movie, q.page).await?))
}

#[instrument(skip(state))]
pub async fn popular_tv(
    State(state): State<AppState>,
    ApiQuery(q): ApiQuery<PageQuery>,
) -> AppResult<Json<Value>> {
    Ok(Json(state.catalog.popular(MediaType::Tv, q.page).await?))
}

#[instrument(skip(state))]
pub async fn trending_movies(
    State(state): State<AppState>,
    ApiPath(window): ApiPath<String>,
) -> AppResult<Json<Value>> {
    let window = parse_window(&window)?;
    Ok(Json(state.catalog.trending(MediaType::Movie, window).await?))
}

#[instrument(skip(state))]
pub async fn trending_tv(
    State(state): State<AppState>,
    ApiPath(window): ApiPath<String>,
) -> AppResult<Json<Value>> {
    let window = parse_window(&window)?;
    Ok(Json(state.catalog.trending(MediaType::Tv, window).await?))
}

#[instrument(skip(state))]
pub async fn search(
    State(state): State<AppState>,
    ApiQuery(q): ApiQuery<SearchQuery>,
) -> AppResult<Json<Value>> {
    let query = q.query.trim();
    if query.is_empty() {
        return Err(AppError::BadRequest("Search query is required".into()));
    }
    let media_type = match q.media_type.as_deref() {
        None | Some("") | Some("multi") => None,
        Some(raw) => Some(
            raw.parse::<MediaType>()
                .map_err(|_| AppError::BadRequest("Type must be 'movie' or 'tv'".into()))?,
        ),
    };
    Ok(Json(state.catalog.search(query, q.page, media_type).await?))
}

#[instrument(skip(state))]
pub async fn movie_details(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<Json<Value>> {
    Ok(Json(state.catalog.details(MediaType::Movie, id).await?))
}

#[instrument(skip(state))]
pub async fn tv_details(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<Json<Value>> {
    Ok(Json(state.catalog.details(MediaType::Tv, id).await?))
}

#[instrument(skip(state))]
pub async fn movie_reviews(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiQuery(q): ApiQuery<PageQuery>,
) -> AppResult<Json<Value>> {
    Ok(Json(state.catalog.reviews(MediaType::Movie, id, q.page).await?))
}

#[instrument(skip(state))]
pub async fn tv_reviews(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiQuery(q): ApiQuery<PageQuery>,
) -> AppResult<Json<Value>> {
    Ok(Json(state.catalog.reviews(MediaType::Tv, id, q.page).await?))
}
