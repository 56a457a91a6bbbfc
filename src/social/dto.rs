use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::db::Follow;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowRequest {
    pub user_id: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub username: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowingEntry {
    pub user_id: Uuid,
    pub username: String,
    #[serde(with = "time::serde::rfc3339")]
    pub followed_at: OffsetDateTime,
}

impl From<Follow> for FollowingEntry {
    fn from(f: Follow) -> Self {
        Self {
            user_id: f.followee_id,
            username: f.username,
            followed_at: f.followed_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FollowResponse {
    pub message: String,
    pub following: FollowingEntry,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSearchResult {
    pub id: Uuid,
    pub username: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub is_following: bool,
}
