use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::db::{MediaType, WatchlistItem};

/// Raw body; `mediaType` and `mediaId` are checked by the service so that a
/// bad value is a `BadRequest` rather than a deserialization rejection.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddWatchlistRequest {
    pub media_type: Option<String>,
    pub media_id: Option<Value>,
    pub title: Option<String>,
    pub poster_path: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveQuery {
    pub media_type: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchlistEntry {
    pub id: Uuid,
    pub media_type: MediaType,
    pub media_id: i64,
    pub title: String,
    pub poster_path: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub added_at: OffsetDateTime,
}

impl From<WatchlistItem> for WatchlistEntry {
    fn from(i: WatchlistItem) -> Self {
        Self {
            id: i.id,
            media_type: i.media_type,
            media_id: i.media_id,
            title: i.title,
            poster_path: i.poster_path,
            added_at: i.added_at,
        }
    }
}
