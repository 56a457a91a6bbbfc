//! Third-party media catalog (TMDB) access.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::{db::MediaType, state::AppState};
use axum::Router;

pub mod handlers;
mod tmdb;

pub use tmdb::TmdbClient;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("media not found")]
    NotFound,

    #[error("catalog request failed: {0}")]
    Upstream(String),
}

pub type CatalogResult<T> = Result<T, CatalogError>;

/// Trending window accepted by the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeWindow {
    Day,
    Week,
}

impl TimeWindow {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "day" => Some(TimeWindow::Day),
            "week" => Some(TimeWindow::Week),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TimeWindow::Day => "day",
            TimeWindow::Week => "week",
        }
    }
}

/// Title metadata captured into review snapshots.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MediaSummary {
    pub title: String,
    pub poster_path: Option<String>,
}

#[async_trait]
pub trait CatalogClient: Send + Sync {
    async fn media_summary(&self, media_type: MediaType, id: i64) -> CatalogResult<MediaSummary>;

    // Pass-through calls; payloads are returned as the catalog sends them.
    async fn popular(&self, media_type: MediaType, page: u32) -> CatalogResult<Value>;
    async fn trending(&self, media_type: MediaType, window: TimeWindow) -> CatalogResult<Value>;
    async fn details(&self, media_type: MediaType, id: i64) -> CatalogResult<Value>;
    async fn search(
        &self,
        query: &str,
        page: u32,
        media_type: Option<MediaType>,
    ) -> CatalogResult<Value>;
    async fn reviews(&self, media_type: MediaType, id: i64, page: u32) -> CatalogResult<Value>;
}

pub fn router() -> Router<AppState> {
    handlers::catalog_routes()
}
