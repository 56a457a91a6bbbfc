use std::net::SocketAddr;

use axum::{
    extract::State,
    http::{HeaderValue, Method},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

use crate::{auth, catalog, reviews, social, state::AppState, watchlist};

pub fn build_app(state: AppState) -> Router {
    let cors = cors_layer(&state);

    Router::new()
        .route("/", get(|| async { "CineConnect API is running" }))
        .route("/status", get(status))
        .nest(
            "/api/users",
            Router::new()
                .merge(auth::router())
                .merge(watchlist::router())
                .merge(social::router()),
        )
        .nest("/api/reviews", reviews::router())
        .nest("/api/movies", catalog::router())
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!("http_request", %method, uri = %uri, status = tracing::field::Empty)
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        if status.is_server_error() {
                            tracing::error!(%status, ?latency, "response");
                        } else {
                            tracing::info!(%status, ?latency, "response");
                        }
                    },
                ),
        )
}

/// Any origin in development; only the web client in production.
fn cors_layer(state: &AppState) -> CorsLayer {
    if !state.config.is_production() {
        return CorsLayer::permissive();
    }
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);
    match state.config.client_url.parse::<HeaderValue>() {
        Ok(origin) => base.allow_origin(origin),
        Err(e) => {
            warn!(error = %e, client_url = %state.config.client_url, "unusable CLIENT_URL for CORS");
            base
        }
    }
}

async fn status(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "environment": state.config.environment,
    }))
}

pub async fn serve(app: Router) -> anyhow::Result<()> {
    let addr: SocketAddr = format!(
        "{}:{}",
        std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
        std::env::var("APP_PORT").unwrap_or_else(|_| "8080".into())
    )
    .parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use tower::ServiceExt;

    use super::*;
    use crate::state::testing::TestApp;

    async fn call(
        app: &Router,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        call_raw(app, method, uri, token, body.map(|b| b.to_string())).await
    }

    async fn call_raw(
        app: &Router,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<String>,
    ) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(t) = token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {t}"));
        }
        let req = match body {
            Some(b) => req
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(b))
                .unwrap(),
            None => req.body(Body::empty()).unwrap(),
        };
        let resp = app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    async fn register(app: &Router, name: &str) -> (String, String) {
        let (status, body) = call(
            app,
            "POST",
            "/api/users/register",
            None,
            Some(json!({
                "username": name,
                "email": format!("{name}@x.com"),
                "password": "secret1"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        (
            body["id"].as_str().unwrap().to_string(),
            body["token"].as_str().unwrap().to_string(),
        )
    }

    #[tokio::test]
    async fn health_routes() {
        let app = build_app(AppState::fake());
        let (status, body) = call(&app, "GET", "/status", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["environment"], "test");
    }

    #[tokio::test]
    async fn protected_routes_require_a_session() {
        let app = build_app(AppState::fake());
        for uri in [
            "/api/users/profile",
            "/api/users/watchlist",
            "/api/users/following",
            "/api/reviews",
        ] {
            let (status, body) = call(&app, "GET", uri, None, None).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
            assert_eq!(body["error"], "unauthorized");
        }
        let (status, _) = call(&app, "GET", "/api/users/profile", Some("junk"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn malformed_input_gets_error_body() {
        let app = build_app(AppState::fake());
        let (_, token) = register(&app, "erin").await;
        let cases = [
            ("POST", "/api/users/login", Some(r#"{"email":"#)),
            ("POST", "/api/users/register", Some(r#"{"username":5}"#)),
            ("PUT", "/api/users/profile", Some("not json")),
            ("DELETE", "/api/reviews/not-a-uuid", None),
            ("DELETE", "/api/users/watchlist/abc", None),
            ("GET", "/api/movies/popular?page=first", None),
        ];
        for (method, uri, body) in cases {
            let (status, json) =
                call_raw(&app, method, uri, Some(&token), body.map(String::from)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{method} {uri}");
            assert_eq!(json["error"], "bad_request", "{method} {uri}");
            assert!(
                !json["message"].as_str().unwrap_or_default().is_empty(),
                "{method} {uri}"
            );
        }
    }

    #[tokio::test]
    async fn register_verify_scenario() {
        let test = TestApp::new();
        let app = build_app(test.state.clone());

        let (status, body) = call(
            &app,
            "POST",
            "/api/users/register",
            None,
            Some(json!({"username": "alice", "email": "alice@x.com", "password": "secret1"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["isEmailVerified"], false);
        let token = body["token"].as_str().unwrap().to_string();

        let html = test.mailer.last().unwrap().html;
        let start = html.find("/verify-email/").unwrap() + "/verify-email/".len();
        let verify_token = &html[start..start + 64];

        let uri = format!("/api/users/verify-email/{verify_token}");
        let (status, body) = call(&app, "GET", &uri, None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);

        let (_, profile) = call(&app, "GET", "/api/users/profile", Some(&token), None).await;
        assert_eq!(profile["isEmailVerified"], true);

        let (status, body) = call(&app, "GET", &uri, None, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid_or_expired_token");

        let (status, _) = call(
            &app,
            "POST",
            "/api/users/register",
            None,
            Some(json!({"username": "alice2", "email": "alice@x.com", "password": "secret1"})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn email_change_scenario() {
        let app = build_app(AppState::fake());
        let (_, token) = register(&app, "carol").await;

        let (status, body) = call(
            &app,
            "PUT",
            "/api/users/profile",
            Some(&token),
            Some(json!({"email": "carol.new@x.com"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["email"], "carol@x.com");
        assert_eq!(body["pendingEmail"], "carol.new@x.com");
    }

    #[tokio::test]
    async fn follow_and_review_scenario() {
        let app = build_app(AppState::fake());
        let (_, me) = register(&app, "viewer").await;
        let (critic_id, critic) = register(&app, "critic").await;

        let review = json!({"mediaId": 550, "mediaType": "movie", "rating": 9, "content": "Great"});
        let (status, created) =
            call(&app, "POST", "/api/reviews", Some(&critic), Some(review.clone())).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["mediaTitle"], "Fight Club");
        let (status, _) = call(&app, "POST", "/api/reviews", Some(&critic), Some(review)).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let reviews_uri = format!("/api/users/reviews/{critic_id}");
        let (status, _) = call(&app, "GET", &reviews_uri, Some(&me), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = call(
            &app,
            "POST",
            "/api/users/follow",
            Some(&me),
            Some(json!({"userId": critic_id})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["following"]["username"], "critic");

        let (status, body) = call(&app, "GET", &reviews_uri, Some(&me), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["username"], "critic");

        let (status, _) = call(
            &app,
            "DELETE",
            &format!("/api/users/follow/{critic_id}"),
            Some(&me),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = call(&app, "GET", &reviews_uri, Some(&me), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn watchlist_over_http() {
        let app = build_app(AppState::fake());
        let (_, token) = register(&app, "dave").await;
        let item = json!({"mediaType": "tv", "mediaId": 1399, "title": "Game of Thrones"});

        let (status, created) =
            call(&app, "POST", "/api/users/watchlist", Some(&token), Some(item.clone())).await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(created["id"].is_string());
        assert_eq!(created["mediaType"], "tv");
        let (status, _) =
            call(&app, "POST", "/api/users/watchlist", Some(&token), Some(item)).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, body) = call(
            &app,
            "DELETE",
            "/api/users/watchlist/1399?mediaType=tv",
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn catalog_routes_are_public() {
        let app = build_app(AppState::fake());
        let (status, body) = call(&app, "GET", "/api/movies/trending/week", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["window"], "week");

        let (status, body) = call(&app, "GET", "/api/movies/tv/trending/year", None, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "bad_request");

        let (status, body) = call(&app, "GET", "/api/movies/550", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["title"], "Fight Club");
    }
}
