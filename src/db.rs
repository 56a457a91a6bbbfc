//! Credential and social state storage.
//!
//! Services only talk to [`Store`]. Uniqueness rules (username, email,
//! watchlist pair, follow pair, review triple) are enforced by the store
//! itself and surface as [`StoreError::Duplicate`], so concurrent requests
//! cannot slip past an application-level pre-check.

use async_trait::async_trait;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

#[cfg(test)]
pub mod memory;
pub mod postgres;
pub mod types;

pub use types::{
    Follow, MediaType, NewReview, NewUser, NewWatchlistItem, Review, User, WatchlistItem,
};

/// Which uniqueness rule a write collided with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueField {
    Username,
    Email,
    WatchlistEntry,
    Follow,
    Review,
}

impl UniqueField {
    pub fn conflict_message(self) -> &'static str {
        match self {
            UniqueField::Username => "Username is already taken",
            UniqueField::Email => "Email is already registered",
            UniqueField::WatchlistEntry => "Item already in watchlist",
            UniqueField::Follow => "You are already following this user",
            UniqueField::Review => "You have already reviewed this title",
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("duplicate {0:?}")]
    Duplicate(UniqueField),

    #[error("record not found")]
    NotFound,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait Store: Send + Sync {
    // ---- users ----
    async fn insert_user(&self, new: NewUser) -> StoreResult<User>;
    /// Overwrites every mutable column of an existing user (last writer wins).
    async fn save_user(&self, user: &User) -> StoreResult<()>;
    async fn user_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;
    async fn user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    async fn user_by_username(&self, username: &str) -> StoreResult<Option<User>>;
    /// Only matches tokens whose expiry is after `now`.
    async fn user_by_verification_token(
        &self,
        token: &str,
        now: OffsetDateTime,
    ) -> StoreResult<Option<User>>;
    /// Only matches tokens whose expiry is after `now`.
    async fn user_by_reset_token(
        &self,
        token: &str,
        now: OffsetDateTime,
    ) -> StoreResult<Option<User>>;
    /// Case-insensitive substring match on username, `exclude` left out.
    async fn search_users(&self, fragment: &str, exclude: Uuid, limit: i64)
        -> StoreResult<Vec<User>>;

    // ---- watchlist ----
    /// Newest entries first.
    async fn watchlist(&self, user_id: Uuid) -> StoreResult<Vec<WatchlistItem>>;
    async fn insert_watchlist_item(
        &self,
        user_id: Uuid,
        item: NewWatchlistItem,
    ) -> StoreResult<WatchlistItem>;
    /// Returns how many entries were removed. `None` matches either media type.
    async fn delete_watchlist_items(
        &self,
        user_id: Uuid,
        media_id: i64,
        media_type: Option<MediaType>,
    ) -> StoreResult<u64>;

    // ---- follows ----
    async fn insert_follow(
        &self,
        follower_id: Uuid,
        followee_id: Uuid,
        username: &str,
    ) -> StoreResult<Follow>;
    async fn delete_follow(&self, follower_id: Uuid, followee_id: Uuid) -> StoreResult<bool>;
    /// Insertion order.
    async fn following(&self, follower_id: Uuid) -> StoreResult<Vec<Follow>>;
    async fn follow_entry(
        &self,
        follower_id: Uuid,
        followee_id: Uuid,
    ) -> StoreResult<Option<Follow>>;

    // ---- reviews ----
    async fn insert_review(&self, new: NewReview) -> StoreResult<Review>;
    async fn review_by_id(&self, id: Uuid) -> StoreResult<Option<Review>>;
    async fn review_for_media(
        &self,
        user_id: Uuid,
        media_id: i64,
        media_type: MediaType,
    ) -> StoreResult<Option<Review>>;
    /// Newest first.
    async fn reviews_by_user(&self, user_id: Uuid) -> StoreResult<Vec<Review>>;
    /// Newest first across all given authors, capped at `limit`.
    async fn reviews_by_users(&self, user_ids: &[Uuid], limit: i64) -> StoreResult<Vec<Review>>;
    async fn delete_review(&self, id: Uuid) -> StoreResult<bool>;
}
