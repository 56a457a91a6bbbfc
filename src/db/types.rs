use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

/// Catalog media kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Movie,
    Tv,
}

#[derive(Debug, Error)]
#[error("unknown media type `{0}`")]
pub struct UnknownMediaType(pub String);

impl MediaType {
    pub fn as_str(self) -> &'static str {
        match self {
            MediaType::Movie => "movie",
            MediaType::Tv => "tv",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaType {
    type Err = UnknownMediaType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "movie" => Ok(MediaType::Movie),
            "tv" => Ok(MediaType::Tv),
            other => Err(UnknownMediaType(other.to_string())),
        }
    }
}

impl TryFrom<String> for MediaType {
    type Error = UnknownMediaType;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// User record.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,                // lowercase
    pub password_hash: String,        // Argon2 PHC string
    pub is_email_verified: bool,
    pub pending_email: Option<String>,
    pub email_verification_token: Option<String>,
    pub email_verification_expires: Option<OffsetDateTime>,
    pub password_reset_token: Option<String>,
    pub password_reset_expires: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
    pub last_login: Option<OffsetDateTime>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub email_verification_token: Option<String>,
    pub email_verification_expires: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, FromRow)]
pub struct WatchlistItem {
    pub id: Uuid,
    #[allow(dead_code)]
    pub user_id: Uuid,
    #[sqlx(try_from = "String")]
    pub media_type: MediaType,
    pub media_id: i64,
    pub title: String,
    pub poster_path: Option<String>,
    pub added_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewWatchlistItem {
    pub media_type: MediaType,
    pub media_id: i64,
    pub title: String,
    pub poster_path: Option<String>,
    pub added_at: OffsetDateTime,
}

/// One outgoing follow edge. `username` is captured when the follow is made
/// and is not updated if the followee renames.
#[derive(Debug, Clone, FromRow)]
pub struct Follow {
    #[allow(dead_code)]
    pub follower_id: Uuid,
    pub followee_id: Uuid,
    pub username: String,
    pub followed_at: OffsetDateTime,
}

/// `media_title` and `media_poster` are catalog snapshots taken at creation.
#[derive(Debug, Clone, FromRow)]
pub struct Review {
    pub id: Uuid,
    pub user_id: Uuid,
    pub media_id: i64,
    #[sqlx(try_from = "String")]
    pub media_type: MediaType,
    pub media_title: String,
    pub media_poster: Option<String>,
    pub rating: i16,
    pub content: String,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewReview {
    pub user_id: Uuid,
    pub media_id: i64,
    pub media_type: MediaType,
    pub media_title: String,
    pub media_poster: Option<String>,
    pub rating: i16,
    pub content: String,
    pub created_at: OffsetDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_type_parses_only_known_kinds() {
        assert_eq!("movie".parse::<MediaType>().unwrap(), MediaType::Movie);
        assert_eq!(MediaType::try_from("tv".to_string()).unwrap(), MediaType::Tv);
        assert!("Movie".parse::<MediaType>().is_err());
        assert!("anime".parse::<MediaType>().is_err());
    }

    #[test]
    fn media_type_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&MediaType::Tv).unwrap(), "\"tv\"");
        let parsed: MediaType = serde_json::from_str("\"movie\"").unwrap();
        assert_eq!(parsed, MediaType::Movie);
    }
}
