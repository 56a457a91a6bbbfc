use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::{debug, warn};

use super::jwt::JwtKeys;
use crate::{db::User, error::AppError, state::AppState};

/// The authenticated caller, loaded fresh from the store on every request.
pub struct AuthUser(pub User);

/// Pulls the single token out of `Bearer <token>`.
fn bearer_token(header: &str) -> Option<&str> {
    let mut parts = header.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(token), None) => Some(token),
        _ => None,
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".into()))?;

        let token = header
            .to_str()
            .ok()
            .and_then(bearer_token)
            .ok_or_else(|| {
                warn!("malformed authorization header");
                AppError::Unauthorized("Malformed Authorization header".into())
            })?;

        let keys = JwtKeys::from_ref(state);
        let claims = keys.verify(token).map_err(|e| {
            warn!(reason = %e, "session token rejected");
            AppError::from(e)
        })?;

        let user = state
            .store
            .user_by_id(claims.id)
            .await?
            .ok_or_else(|| {
                warn!(user_id = %claims.id, "token for unknown user");
                AppError::Unauthorized("User not found".into())
            })?;

        debug!(user_id = %user.id, "request authenticated");
        Ok(AuthUser(user))
    }
}

#[cfg(test)]
mod tests {
    use axum::http::Request;
    use time::Duration;
    use uuid::Uuid;

    use super::*;

    async fn run(state: &AppState, header: Option<&str>) -> Result<AuthUser, AppError> {
        let mut builder = Request::builder().uri("/");
        if let Some(h) = header {
            builder = builder.header(AUTHORIZATION, h);
        }
        let (mut parts, _) = builder.body(()).unwrap().into_parts();
        AuthUser::from_request_parts(&mut parts, state).await
    }

    fn message(err: AppError) -> String {
        match err {
            AppError::Unauthorized(m) => m,
            other => panic!("expected Unauthorized, got {other:?}"),
        }
    }

    #[test]
    fn bearer_parsing() {
        assert_eq!(bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(bearer_token("Bearer"), None);
        assert_eq!(bearer_token("Bearer a b"), None);
        assert_eq!(bearer_token("Basic abc"), None);
    }

    #[tokio::test]
    async fn rejects_missing_and_malformed_headers() {
        let state = AppState::fake();
        let missing = message(run(&state, None).await.err().unwrap());
        assert!(missing.contains("Missing"));
        let malformed = message(run(&state, Some("Token abc")).await.err().unwrap());
        assert!(malformed.contains("Malformed Authorization"));
    }

    #[tokio::test]
    async fn distinguishes_token_failures() {
        let state = AppState::fake();
        let keys = JwtKeys::from_ref(&state);

        let expired = keys
            .sign_with_ttl(Uuid::new_v4(), Duration::seconds(-10))
            .unwrap();
        let msg = message(
            run(&state, Some(&format!("Bearer {expired}")))
                .await
                .err()
                .unwrap(),
        );
        assert!(msg.contains("expired"));

        let msg = message(run(&state, Some("Bearer garbage")).await.err().unwrap());
        assert!(msg.contains("Malformed token"));
    }

    #[tokio::test]
    async fn rejects_token_for_unknown_user() {
        let state = AppState::fake();
        let token = JwtKeys::from_ref(&state).sign(Uuid::new_v4()).unwrap();
        let msg = message(
            run(&state, Some(&format!("Bearer {token}")))
                .await
                .err()
                .unwrap(),
        );
        assert_eq!(msg, "User not found");
    }
}
