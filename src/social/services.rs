//! Follow graph and follow-gated review visibility.
//!
//! Each follow edge keeps the followee's username as it was when the follow
//! was made. Listings read that snapshot, so a later rename shows up only for
//! new followers.

use std::collections::{HashMap, HashSet};

use serde_json::Value;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::dto::{FollowResponse, FollowingEntry, UserSearchResult};
use crate::{
    db::{UniqueField, User},
    error::{AppError, AppResult},
    reviews::dto::ReviewView,
    state::AppState,
};

pub const SEARCH_LIMIT: i64 = 20;
pub const FEED_LIMIT: i64 = 50;

fn parse_user_id(raw: Option<&Value>) -> AppResult<Uuid> {
    match raw {
        None | Some(Value::Null) => Err(AppError::BadRequest("User ID is required".into())),
        Some(Value::String(s)) if s.trim().is_empty() => {
            Err(AppError::BadRequest("User ID is required".into()))
        }
        Some(Value::String(s)) => Uuid::parse_str(s.trim())
            .map_err(|_| AppError::BadRequest("Invalid user ID".into())),
        Some(_) => Err(AppError::BadRequest("Invalid user ID".into())),
    }
}

async fn existing_user(state: &AppState, id: Uuid) -> AppResult<User> {
    state
        .store
        .user_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))
}

#[instrument(skip(state, target))]
pub async fn follow(
    state: &AppState,
    self_id: Uuid,
    target: Option<&Value>,
) -> AppResult<FollowResponse> {
    let target_id = parse_user_id(target)?;
    let target = existing_user(state, target_id).await?;

    if target.id == self_id {
        return Err(AppError::BadRequest("You cannot follow yourself".into()));
    }
    if state.store.follow_entry(self_id, target.id).await?.is_some() {
        warn!(%target_id, "already following");
        return Err(AppError::Conflict(UniqueField::Follow.conflict_message().into()));
    }

    let edge = state
        .store
        .insert_follow(self_id, target.id, &target.username)
        .await?;

    info!(%target_id, "followed user");
    Ok(FollowResponse {
        message: "Successfully followed user".into(),
        following: FollowingEntry::from(edge),
    })
}

#[instrument(skip(state))]
pub async fn unfollow(state: &AppState, self_id: Uuid, target_id: Uuid) -> AppResult<()> {
    existing_user(state, target_id).await?;
    if !state.store.delete_follow(self_id, target_id).await? {
        return Err(AppError::BadRequest("You are not following this user".into()));
    }
    info!(%target_id, "unfollowed user");
    Ok(())
}

/// In the order the follows were made.
#[instrument(skip(state))]
pub async fn list_following(state: &AppState, self_id: Uuid) -> AppResult<Vec<FollowingEntry>> {
    let edges = state.store.following(self_id).await?;
    Ok(edges.into_iter().map(FollowingEntry::from).collect())
}

#[instrument(skip(state))]
pub async fn search_users(
    state: &AppState,
    self_id: Uuid,
    fragment: Option<&str>,
) -> AppResult<Vec<UserSearchResult>> {
    let fragment = fragment
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .ok_or_else(|| AppError::BadRequest("Username search term is required".into()))?;

    let users = state
        .store
        .search_users(fragment, self_id, SEARCH_LIMIT)
        .await?;
    let followed: HashSet<Uuid> = state
        .store
        .following(self_id)
        .await?
        .into_iter()
        .map(|f| f.followee_id)
        .collect();

    Ok(users
        .into_iter()
        .map(|u| UserSearchResult {
            is_following: followed.contains(&u.id),
            id: u.id,
            username: u.username,
            created_at: u.created_at,
        })
        .collect())
}

/// Reviews of `target_id`, visible only while the caller follows them.
#[instrument(skip(state))]
pub async fn reviews_of_user(
    state: &AppState,
    self_id: Uuid,
    target_id: Uuid,
) -> AppResult<Vec<ReviewView>> {
    existing_user(state, target_id).await?;

    let Some(edge) = state.store.follow_entry(self_id, target_id).await? else {
        warn!(%target_id, "reviews requested without following");
        return Err(AppError::Forbidden(
            "You must follow this user to see their reviews".into(),
        ));
    };

    let reviews = state.store.reviews_by_user(target_id).await?;
    Ok(reviews
        .into_iter()
        .map(|r| ReviewView::with_username(r, &edge.username))
        .collect())
}

/// Newest reviews across everyone the caller follows.
#[instrument(skip(state))]
pub async fn following_feed(state: &AppState, self_id: Uuid) -> AppResult<Vec<ReviewView>> {
    let edges = state.store.following(self_id).await?;
    if edges.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<Uuid> = edges.iter().map(|f| f.followee_id).collect();
    let names: HashMap<Uuid, String> = edges
        .into_iter()
        .map(|f| (f.followee_id, f.username))
        .collect();

    let reviews = state.store.reviews_by_users(&ids, FEED_LIMIT).await?;
    Ok(reviews
        .into_iter()
        .map(|r| {
            let name = names.get(&r.user_id).map(String::as_str).unwrap_or_default();
            ReviewView::with_username(r, name)
        })
        .collect())
}
