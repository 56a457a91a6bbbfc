use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::{debug, error};

use super::{CatalogClient, CatalogError, CatalogResult, MediaSummary, TimeWindow};
use crate::{config::CatalogConfig, db::MediaType};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// TMDB v3 REST client.
#[derive(Clone)]
pub struct TmdbClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl TmdbClient {
    pub fn new(config: &CatalogConfig) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    async fn get(&self, path: &str, params: &[(&str, String)]) -> CatalogResult<Value> {
        let url = format!("{}/{}", self.base_url, path);
        debug!(%url, "tmdb request");

        let resp = self
            .client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str())])
            .query(params)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, path, "tmdb request failed");
                CatalogError::Upstream(e.to_string())
            })?;

        match resp.status() {
            StatusCode::NOT_FOUND => Err(CatalogError::NotFound),
            s if !s.is_success() => {
                error!(status = %s, path, "tmdb returned error status");
                Err(CatalogError::Upstream(format!("tmdb status {s}")))
            }
            _ => resp
                .json::<Value>()
                .await
                .map_err(|e| CatalogError::Upstream(e.to_string())),
        }
    }
}

/// Movies carry `title`, TV shows carry `name`.
fn summary_from_details(media_type: MediaType, details: &Value) -> CatalogResult<MediaSummary> {
    let key = match media_type {
        MediaType::Movie => "title",
        MediaType::Tv => "name",
    };
    let title = details
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| CatalogError::Upstream(format!("details without `{key}`")))?;
    let poster_path = details
        .get("poster_path")
        .and_then(Value::as_str)
        .map(str::to_string);
    Ok(MediaSummary {
        title: title.to_string(),
        poster_path,
    })
}

#[async_trait]
impl CatalogClient for TmdbClient {
    async fn media_summary(&self, media_type: MediaType, id: i64) -> CatalogResult<MediaSummary> {
        let details = self.get(&format!("{media_type}/{id}"), &[]).await?;
        summary_from_details(media_type, &details)
    }

    async fn popular(&self, media_type: MediaType, page: u32) -> CatalogResult<Value> {
        match media_type {
            // All-time popular: well-rated titles with a large vote count.
            MediaType::Movie => {
                self.get(
                    "discover/movie",
                    &[
                        ("page", page.to_string()),
                        ("sort_by", "vote_average.desc,popularity.desc".into()),
                        ("vote_count.gte", "10000".into()),
                        ("include_adult", "false".into()),
                        ("include_video", "false".into()),
                    ],
                )
                .await
            }
            MediaType::Tv => self.get("tv/popular", &[("page", page.to_string())]).await,
        }
    }

    async fn trending(&self, media_type: MediaType, window: TimeWindow) -> CatalogResult<Value> {
        self.get(&format!("trending/{media_type}/{}", window.as_str()), &[])
            .await
    }

    async fn details(&self, media_type: MediaType, id: i64) -> CatalogResult<Value> {
        self.get(
            &format!("{media_type}/{id}"),
            &[(
                "append_to_response",
                "videos,credits,recommendations,reviews".into(),
            )],
        )
        .await
    }

    async fn search(
        &self,
        query: &str,
        page: u32,
        media_type: Option<MediaType>,
    ) -> CatalogResult<Value> {
        let path = match media_type {
            Some(mt) => format!("search/{mt}"),
            None => "search/multi".to_string(),
        };
        self.get(
            &path,
            &[("query", query.to_string()), ("page", page.to_string())],
        )
        .await
    }

    async fn reviews(&self, media_type: MediaType, id: i64, page: u32) -> CatalogResult<Value> {
        self.get(
            &format!("{media_type}/{id}/reviews"),
            &[("page", page.to_string())],
        )
        .await
    }
}
