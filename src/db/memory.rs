//! In-memory [`Store`] used by unit tests. Enforces the same uniqueness
//! constraints as the Postgres schema.

use std::sync::Mutex;

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use super::{
    Follow, MediaType, NewReview, NewUser, NewWatchlistItem, Review, Store, StoreError,
    StoreResult, UniqueField, User, WatchlistItem,
};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    watchlist: Vec<WatchlistItem>,
    follows: Vec<Follow>,
    reviews: Vec<Review>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Later insertions win ties.
fn newest_first<T>(items: &mut [T], at: impl Fn(&T) -> OffsetDateTime) {
    items.reverse();
    items.sort_by(|a, b| at(b).cmp(&at(a)));
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_user(&self, new: NewUser) -> StoreResult<User> {
        let mut t = self.tables.lock().unwrap();
        if t.users.iter().any(|u| u.username == new.username) {
            return Err(StoreError::Duplicate(UniqueField::Username));
        }
        if t.users.iter().any(|u| u.email == new.email) {
            return Err(StoreError::Duplicate(UniqueField::Email));
        }
        let user = User {
            id: Uuid::new_v4(),
            username: new.username,
            email: new.email,
            password_hash: new.password_hash,
            is_email_verified: false,
            pending_email: None,
            email_verification_token: new.email_verification_token,
            email_verification_expires: new.email_verification_expires,
            password_reset_token: None,
            password_reset_expires: None,
            created_at: new.created_at,
            last_login: None,
        };
        t.users.push(user.clone());
        Ok(user)
    }

    async fn save_user(&self, user: &User) -> StoreResult<()> {
        let mut t = self.tables.lock().unwrap();
        if t.users.iter().any(|u| u.id != user.id && u.username == user.username) {
            return Err(StoreError::Duplicate(UniqueField::Username));
        }
        if t.users.iter().any(|u| u.id != user.id && u.email == user.email) {
            return Err(StoreError::Duplicate(UniqueField::Email));
        }
        let slot = t
            .users
            .iter_mut()
            .find(|u| u.id == user.id)
            .ok_or(StoreError::NotFound)?;
        *slot = user.clone();
        Ok(())
    }

    async fn user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let t = self.tables.lock().unwrap();
        Ok(t.users.iter().find(|u| u.id == id).cloned())
    }

    async fn user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let t = self.tables.lock().unwrap();
        Ok(t.users.iter().find(|u| u.email == email).cloned())
    }

    async fn user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let t = self.tables.lock().unwrap();
        Ok(t.users.iter().find(|u| u.username == username).cloned())
    }

    async fn user_by_verification_token(
        &self,
        token: &str,
        now: OffsetDateTime,
    ) -> StoreResult<Option<User>> {
        let t = self.tables.lock().unwrap();
        Ok(t
            .users
            .iter()
            .find(|u| {
                u.email_verification_token.as_deref() == Some(token)
                    && u.email_verification_expires.is_some_and(|exp| exp > now)
            })
            .cloned())
    }

    async fn user_by_reset_token(
        &self,
        token: &str,
        now: OffsetDateTime,
    ) -> StoreResult<Option<User>> {
        let t = self.tables.lock().unwrap();
        Ok(t
            .users
            .iter()
            .find(|u| {
                u.password_reset_token.as_deref() == Some(token)
                    && u.password_reset_expires.is_some_and(|exp| exp > now)
            })
            .cloned())
    }

    async fn search_users(
        &self,
        fragment: &str,
        exclude: Uuid,
        limit: i64,
    ) -> StoreResult<Vec<User>> {
        let t = self.tables.lock().unwrap();
        let needle = fragment.to_lowercase();
        let mut found: Vec<User> = t
            .users
            .iter()
            .filter(|u| u.id != exclude && u.username.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.username.cmp(&b.username));
        found.truncate(limit.max(0) as usize);
        Ok(found)
    }

    async fn watchlist(&self, user_id: Uuid) -> StoreResult<Vec<WatchlistItem>> {
        let t = self.tables.lock().unwrap();
        let mut items: Vec<WatchlistItem> = t
            .watchlist
            .iter()
            .filter(|i| i.user_id == user_id)
            .cloned()
            .collect();
        newest_first(&mut items, |i| i.added_at);
        Ok(items)
    }

    async fn insert_watchlist_item(
        &self,
        user_id: Uuid,
        item: NewWatchlistItem,
    ) -> StoreResult<WatchlistItem> {
        let mut t = self.tables.lock().unwrap();
        if t.watchlist.iter().any(|i| {
            i.user_id == user_id && i.media_type == item.media_type && i.media_id == item.media_id
        }) {
            return Err(StoreError::Duplicate(UniqueField::WatchlistEntry));
        }
        let stored = WatchlistItem {
            id: Uuid::new_v4(),
            user_id,
            media_type: item.media_type,
            media_id: item.media_id,
            title: item.title,
            poster_path: item.poster_path,
            added_at: item.added_at,
        };
        t.watchlist.push(stored.clone());
        Ok(stored)
    }

    async fn delete_watchlist_items(
        &self,
        user_id: Uuid,
        media_id: i64,
        media_type: Option<MediaType>,
    ) -> StoreResult<u64> {
        let mut t = self.tables.lock().unwrap();
        let before = t.watchlist.len();
        t.watchlist.retain(|i| {
            !(i.user_id == user_id
                && i.media_id == media_id
                && media_type.map_or(true, |mt| mt == i.media_type))
        });
        Ok((before - t.watchlist.len()) as u64)
    }

    async fn insert_follow(
        &self,
        follower_id: Uuid,
        followee_id: Uuid,
        username: &str,
    ) -> StoreResult<Follow> {
        let mut t = self.tables.lock().unwrap();
        if t
            .follows
            .iter()
            .any(|f| f.follower_id == follower_id && f.followee_id == followee_id)
        {
            return Err(StoreError::Duplicate(UniqueField::Follow));
        }
        let follow = Follow {
            follower_id,
            followee_id,
            username: username.to_string(),
            followed_at: OffsetDateTime::now_utc(),
        };
        t.follows.push(follow.clone());
        Ok(follow)
    }

    async fn delete_follow(&self, follower_id: Uuid, followee_id: Uuid) -> StoreResult<bool> {
        let mut t = self.tables.lock().unwrap();
        let before = t.follows.len();
        t.follows
            .retain(|f| !(f.follower_id == follower_id && f.followee_id == followee_id));
        Ok(t.follows.len() < before)
    }

    async fn following(&self, follower_id: Uuid) -> StoreResult<Vec<Follow>> {
        let t = self.tables.lock().unwrap();
        Ok(t
            .follows
            .iter()
            .filter(|f| f.follower_id == follower_id)
            .cloned()
            .collect())
    }

    async fn follow_entry(
        &self,
        follower_id: Uuid,
        followee_id: Uuid,
    ) -> StoreResult<Option<Follow>> {
        let t = self.tables.lock().unwrap();
        Ok(t
            .follows
            .iter()
            .find(|f| f.follower_id == follower_id && f.followee_id == followee_id)
            .cloned())
    }

    async fn insert_review(&self, new: NewReview) -> StoreResult<Review> {
        let mut t = self.tables.lock().unwrap();
        if t.reviews.iter().any(|r| {
            r.user_id == new.user_id && r.media_id == new.media_id && r.media_type == new.media_type
        }) {
            return Err(StoreError::Duplicate(UniqueField::Review));
        }
        let review = Review {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            media_id: new.media_id,
            media_type: new.media_type,
            media_title: new.media_title,
            media_poster: new.media_poster,
            rating: new.rating,
            content: new.content,
            created_at: new.created_at,
        };
        t.reviews.push(review.clone());
        Ok(review)
    }

    async fn review_by_id(&self, id: Uuid) -> StoreResult<Option<Review>> {
        let t = self.tables.lock().unwrap();
        Ok(t.reviews.iter().find(|r| r.id == id).cloned())
    }

    async fn review_for_media(
        &self,
        user_id: Uuid,
        media_id: i64,
        media_type: MediaType,
    ) -> StoreResult<Option<Review>> {
        let t = self.tables.lock().unwrap();
        Ok(t
            .reviews
            .iter()
            .find(|r| r.user_id == user_id && r.media_id == media_id && r.media_type == media_type)
            .cloned())
    }

    async fn reviews_by_user(&self, user_id: Uuid) -> StoreResult<Vec<Review>> {
        let t = self.tables.lock().unwrap();
        let mut found: Vec<Review> =
            t.reviews.iter().filter(|r| r.user_id == user_id).cloned().collect();
        newest_first(&mut found, |r| r.created_at);
        Ok(found)
    }

    async fn reviews_by_users(&self, user_ids: &[Uuid], limit: i64) -> StoreResult<Vec<Review>> {
        let t = self.tables.lock().unwrap();
        let mut found: Vec<Review> = t
            .reviews
            .iter()
            .filter(|r| user_ids.contains(&r.user_id))
            .cloned()
            .collect();
        newest_first(&mut found, |r| r.created_at);
        found.truncate(limit.max(0) as usize);
        Ok(found)
    }

    async fn delete_review(&self, id: Uuid) -> StoreResult<bool> {
        let mut t = self.tables.lock().unwrap();
        let before = t.reviews.len();
        t.reviews.retain(|r| r.id != id);
        Ok(t.reviews.len() < before)
    }
}
