//! Router assembly: HTTP endpoints, WebSocket upgrade, static files, CORS, and HTTP tracing.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::state::AppState;

pub mod http;
pub mod ws;

/// Build the application router with:
/// - WebSocket at `/ws`
/// - JSON API under `/api/v1/...`
/// - Static SPA from `./static` with index fallback
/// - CORS (allow any origin/method/headers)
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>) -> Router {
    let static_service = ServeDir::new("./static")
        .append_index_html_on_directories(true)
        .not_found_service(ServeFile::new("./static/index.html"));

    Router::new()
        // WebSocket
        .route("/ws", get(ws::ws_upgrade))
        // HTTP API
        .route("/api/v1/health", get(http::http_health))
        .route("/api/v1/decks", get(http::http_get_decks))
        .route("/api/v1/card", get(http::http_get_card))
        .route("/api/v1/grade", post(http::http_post_grade))
        .route("/api/v1/keywords", post(http::http_post_keywords))
        .route("/api/v1/write", post(http::http_post_write))
        .route("/api/v1/explain", post(http::http_post_explain))
        .route(
            "/api/v1/progress",
            get(http::http_get_progress).delete(http::http_delete_progress),
        )
        // State + CORS + HTTP tracing
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Frontend fallback
        .fallback_service(static_service)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{Method, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::config::StudyConfig;
    use crate::progress::InMemoryProgressStore;

    fn app() -> Router {
        let state = AppState::from_config(StudyConfig::default(), Arc::new(InMemoryProgressStore::new(2)), None);
        build_router(Arc::new(state))
    }

    async fn call(app: Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let req = Request::builder().method(method).uri(uri);
        let req = match body {
            Some(b) => req
                .header("content-type", "application/json")
                .body(Body::from(b.to_string())),
            None => req.body(Body::empty()),
        }
        .expect("request");
        let res = app.oneshot(req).await.expect("response");
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.expect("body");
        let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).expect("json") };
        (status, value)
    }

    #[tokio::test]
    async fn health_is_ok() {
        let (status, body) = call(app(), Method::GET, "/api/v1/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "ok": true }));
    }

    #[tokio::test]
    async fn grade_endpoint_uses_camel_case() {
        let (status, body) = call(
            app(),
            Method::POST,
            "/api/v1/grade",
            Some(json!({ "userInput": "Paris!", "correctAnswer": "Paris" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "isCorrect": true, "similarity": 1.0, "feedback": "Perfect!" }));

        let (status, body) = call(
            app(),
            Method::POST,
            "/api/v1/grade",
            Some(json!({ "userInput": "x", "correctAnswer": "y", "options": { "minSimilarity": 2.0 } })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap_or_default().contains("minSimilarity"));
    }

    #[tokio::test]
    async fn keywords_endpoint() {
        let (status, body) = call(
            app(),
            Method::POST,
            "/api/v1/keywords",
            Some(json!({
                "userInput": "the mitochondria is the powerhouse",
                "correctAnswer": "mitochondria powerhouse cell",
                "minWordMatch": 0.5
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "matched": true }));
    }

    #[tokio::test]
    async fn write_flow_records_progress() {
        let app = app();
        let (status, card) = call(app.clone(), Method::GET, "/api/v1/card?deck=geography&learner=ana", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(card.get("definition").is_none());
        let card_id = card["id"].as_str().expect("id").to_string();

        let (status, out) = call(
            app.clone(),
            Method::POST,
            "/api/v1/write",
            Some(json!({ "cardId": card_id, "answer": "definitely wrong", "learner": "ana" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(out["isCorrect"], false);
        assert_eq!(out["mastery"]["attempts"], 1);
        assert!(out["feedback"].as_str().unwrap_or_default().contains(out["expected"].as_str().unwrap_or("?")));

        let (_, progress) = call(app.clone(), Method::GET, "/api/v1/progress?learner=ana", None).await;
        assert_eq!(progress.as_array().map(Vec::len), Some(1));

        let (_, reset) = call(app.clone(), Method::DELETE, "/api/v1/progress?learner=ana", None).await;
        assert_eq!(reset, json!({ "removed": 1 }));
    }

    #[tokio::test]
    async fn unknown_deck_and_card_are_404() {
        let (status, _) = call(app(), Method::GET, "/api/v1/card?deck=astrology", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = call(
            app(),
            Method::POST,
            "/api/v1/explain",
            Some(json!({ "cardId": "missing", "answer": "x" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap_or_default().contains("missing"));
    }

    #[tokio::test]
    async fn decks_are_listed() {
        let (status, body) = call(app(), Method::GET, "/api/v1/decks", None).await;
        assert_eq!(status, StatusCode::OK);
        let names: Vec<&str> = body
            .as_array()
            .expect("array")
            .iter()
            .filter_map(|d| d["deck"].as_str())
            .collect();
        assert_eq!(names, vec!["biology", "chemistry", "geography"]);
    }
}
