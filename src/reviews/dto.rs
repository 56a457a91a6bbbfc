use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::db::{MediaType, Review};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReviewRequest {
    pub media_id: Option<Value>,
    pub media_type: Option<String>,
    pub rating: Option<Value>,
    pub content: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewView {
    pub id: Uuid,
    pub user_id: Uuid,
    pub media_id: i64,
    pub media_type: MediaType,
    pub media_title: String,
    pub media_poster: Option<String>,
    pub rating: i16,
    pub content: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// Follow-snapshot name of the author; only set on cross-user listings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl ReviewView {
    pub fn with_username(review: Review, username: &str) -> Self {
        Self {
            username: Some(username.to_string()),
            ..Self::from(review)
        }
    }
}

impl From<Review> for ReviewView {
    fn from(r: Review) -> Self {
        Self {
            id: r.id,
            user_id: r.user_id,
            media_id: r.media_id,
            media_type: r.media_type,
            media_title: r.media_title,
            media_poster: r.media_poster,
            rating: r.rating,
            content: r.content,
            created_at: r.created_at,
            username: None,
        }
    }
}
