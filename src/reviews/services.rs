use serde_json::Value;
use time::OffsetDateTime;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::dto::{CreateReviewRequest, ReviewView};
use crate::{
    db::{NewReview, UniqueField},
    error::{AppError, AppResult},
    state::AppState,
    watchlist::services::{parse_media_id, parse_media_type},
};

fn parse_rating(raw: Option<&Value>) -> AppResult<i16> {
    let raw = raw.ok_or_else(|| AppError::BadRequest("rating is required".into()))?;
    raw.as_i64()
        .filter(|r| (1..=10).contains(r))
        .map(|r| r as i16)
        .ok_or_else(|| AppError::BadRequest("rating must be an integer from 1 to 10".into()))
}

/// Looks the title up in the catalog and stores its name and poster with the
/// review.
#[instrument(skip(state, req))]
pub async fn create(
    state: &AppState,
    user_id: Uuid,
    req: CreateReviewRequest,
) -> AppResult<ReviewView> {
    let media_id = parse_media_id(req.media_id.as_ref())?;
    let media_type = parse_media_type(req.media_type.as_deref())?;
    let rating = parse_rating(req.rating.as_ref())?;
    let content = req
        .content
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::BadRequest("content is required".into()))?
        .to_string();

    let summary = state.catalog.media_summary(media_type, media_id).await?;

    if state
        .store
        .review_for_media(user_id, media_id, media_type)
        .await?
        .is_some()
    {
        warn!(media_id, %media_type, "duplicate review");
        return Err(AppError::Conflict(UniqueField::Review.conflict_message().into()));
    }

    let review = state
        .store
        .insert_review(NewReview {
            user_id,
            media_id,
            media_type,
            media_title: summary.title,
            media_poster: summary.poster_path,
            rating,
            content,
            created_at: OffsetDateTime::now_utc(),
        })
        .await?;

    info!(review_id = %review.id, media_id, %media_type, "review created");
    Ok(ReviewView::from(review))
}

#[instrument(skip(state))]
pub async fn list_mine(state: &AppState, user_id: Uuid) -> AppResult<Vec<ReviewView>> {
    let reviews = state.store.reviews_by_user(user_id).await?;
    Ok(reviews.into_iter().map(ReviewView::from).collect())
}

#[instrument(skip(state))]
pub async fn delete(state: &AppState, user_id: Uuid, review_id: Uuid) -> AppResult<()> {
    let review = state
        .store
        .review_by_id(review_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Review not found".into()))?;

    if review.user_id != user_id {
        warn!(%review_id, owner = %review.user_id, "delete of someone else's review");
        return Err(AppError::Forbidden("Not authorized to delete this review".into()));
    }

    if !state.store.delete_review(review_id).await? {
        return Err(AppError::NotFound("Review not found".into()));
    }
    info!(%review_id, "review deleted");
    Ok(())
}
