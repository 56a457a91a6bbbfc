use serde_json::Value;
use time::OffsetDateTime;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::dto::{AddWatchlistRequest, WatchlistEntry};
use crate::{
    db::{MediaType, NewWatchlistItem},
    error::{AppError, AppResult},
    state::AppState,
};

pub(crate) fn parse_media_type(raw: Option<&str>) -> AppResult<MediaType> {
    raw.ok_or_else(|| AppError::BadRequest("mediaType is required".into()))?
        .parse::<MediaType>()
        .map_err(|_| AppError::BadRequest("mediaType must be 'movie' or 'tv'".into()))
}

/// Accepts a positive integer given either as a JSON number or a numeric
/// string.
pub(crate) fn parse_media_id(raw: Option<&Value>) -> AppResult<i64> {
    let id = match raw {
        None | Some(Value::Null) => {
            return Err(AppError::BadRequest("mediaId is required".into()))
        }
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
        Some(_) => None,
    };
    id.filter(|id| *id > 0)
        .ok_or_else(|| AppError::BadRequest("mediaId must be a positive integer".into()))
}

#[instrument(skip(state))]
pub async fn list(state: &AppState, user_id: Uuid) -> AppResult<Vec<WatchlistEntry>> {
    let items = state.store.watchlist(user_id).await?;
    Ok(items.into_iter().map(WatchlistEntry::from).collect())
}

#[instrument(skip(state, req))]
pub async fn add(
    state: &AppState,
    user_id: Uuid,
    req: AddWatchlistRequest,
) -> AppResult<WatchlistEntry> {
    let media_type = parse_media_type(req.media_type.as_deref())?;
    let media_id = parse_media_id(req.media_id.as_ref())?;
    let title = req
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::BadRequest("title is required".into()))?
        .to_string();
    let poster_path = req.poster_path.filter(|p| !p.trim().is_empty());

    let item = state
        .store
        .insert_watchlist_item(
            user_id,
            NewWatchlistItem {
                media_type,
                media_id,
                title,
                poster_path,
                added_at: OffsetDateTime::now_utc(),
            },
        )
        .await
        .map_err(|e| {
            warn!(error = %e, %media_type, media_id, "watchlist insert rejected");
            AppError::from(e)
        })?;

    info!(%media_type, media_id, "added to watchlist");
    Ok(WatchlistEntry::from(item))
}

/// Without a `media_type`, every entry with that id goes.
#[instrument(skip(state))]
pub async fn remove(
    state: &AppState,
    user_id: Uuid,
    media_id: i64,
    media_type: Option<&str>,
) -> AppResult<Vec<WatchlistEntry>> {
    let media_type = match media_type.filter(|t| !t.is_empty()) {
        Some(raw) => Some(parse_media_type(Some(raw))?),
        None => None,
    };

    let removed = state
        .store
        .delete_watchlist_items(user_id, media_id, media_type)
        .await?;
    if removed == 0 {
        return Err(AppError::NotFound("Item not found in watchlist".into()));
    }

    info!(media_id, removed, "removed from watchlist");
    list(state, user_id).await
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn req(media_type: &str, media_id: Value, title: &str) -> AddWatchlistRequest {
        AddWatchlistRequest {
            media_type: Some(media_type.into()),
            media_id: Some(media_id),
            title: Some(title.into()),
            poster_path: None,
        }
    }

    #[test]
    fn media_id_parsing() {
        assert_eq!(parse_media_id(Some(&json!(550))).unwrap(), 550);
        assert_eq!(parse_media_id(Some(&json!("603"))).unwrap(), 603);
        assert!(parse_media_id(Some(&json!(0))).is_err());
        assert!(parse_media_id(Some(&json!(-4))).is_err());
        assert!(parse_media_id(Some(&json!(1.5))).is_err());
        assert!(parse_media_id(None).is_err());
    }

    #[tokio::test]
    async fn second_add_of_same_pair_conflicts() {
        let state = AppState::fake();
        let user = Uuid::new_v4();
        add(&state, user, req("movie", json!(550), "Fight Club"))
            .await
            .unwrap();
        let err = add(&state, user, req("movie", json!(550), "Fight Club"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(list(&state, user).await.unwrap().len(), 1);

        // Same id under the other media type is a different entry.
        add(&state, user, req("tv", json!(550), "Some Show"))
            .await
            .unwrap();
        assert_eq!(list(&state, user).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn add_validates_input() {
        let state = AppState::fake();
        let user = Uuid::new_v4();
        for bad in [
            req("anime", json!(1), "x"),
            req("movie", json!(0), "x"),
            req("movie", json!(1), "   "),
        ] {
            assert!(matches!(
                add(&state, user, bad).await,
                Err(AppError::BadRequest(_))
            ));
        }
    }

    #[tokio::test]
    async fn list_is_newest_first() {
        let state = AppState::fake();
        let user = Uuid::new_v4();
        add(&state, user, req("movie", json!(1), "First")).await.unwrap();
        add(&state, user, req("movie", json!(2), "Second")).await.unwrap();
        let titles: Vec<String> = list(&state, user)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.title)
            .collect();
        assert_eq!(titles, vec!["Second", "First"]);
    }

    #[tokio::test]
    async fn remove_by_pair_or_by_id() {
        let state = AppState::fake();
        let user = Uuid::new_v4();
        add(&state, user, req("movie", json!(7), "M")).await.unwrap();
        add(&state, user, req("tv", json!(7), "T")).await.unwrap();
        add(&state, user, req("movie", json!(8), "Other")).await.unwrap();

        let left = remove(&state, user, 7, Some("tv")).await.unwrap();
        assert_eq!(left.len(), 2);

        add(&state, user, req("tv", json!(7), "T")).await.unwrap();
        let left = remove(&state, user, 7, None).await.unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].media_id, 8);

        assert!(matches!(
            remove(&state, user, 7, None).await,
            Err(AppError::NotFound(_))
        ));
    }
}
