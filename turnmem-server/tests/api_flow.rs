//! Crate-level integration tests driving the full router (handlers + Store +
//! Queue Engine) through `tower::ServiceExt::oneshot`, as opposed to the
//! per-middleware/per-handler unit tests beside their modules.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::body::Body;
use axum::body::to_bytes;
use axum::extract::ConnectInfo;
use axum::http::Request;
use axum::http::StatusCode;
use serde_json::Value;
use serde_json::json;
use tower::ServiceExt;
use turnmem_auth::Config;
use turnmem_queue::NoopNotifier;
use turnmem_queue::QueueEngine;
use turnmem_server::AppState;
use turnmem_server::RateLimiter;
use turnmem_sse::SseBroker;
use turnmem_store::Store;

const TOKEN: &str = "integration-test-token";

fn state() -> AppState {
    let store = Arc::new(Store::open_in_memory(b"integration-hmac-key".to_vec()).unwrap());
    let sse = SseBroker::new(store.clone());
    let queue = QueueEngine::new(store.clone(), Arc::new(NoopNotifier));
    let config = Config {
        port: 8765,
        bind_host: "127.0.0.1".to_string(),
        data_dir: std::env::temp_dir(),
        model: "claude-compress-small".to_string(),
        token_budget: 1800,
        max_observations: 40,
        max_sessions: 5,
        stuck_threshold_secs: 300,
        max_retries: 3,
    };

    AppState {
        store,
        queue,
        sse,
        config: Arc::new(config),
        auth_token: Arc::new(TOKEN.to_string()),
        rate_limiter: RateLimiter::spawn(),
        started_at: Instant::now(),
    }
}

fn local_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 45000))
}

fn app() -> Router {
    turnmem_server::build_app(state())
}

fn authed(method: &str, uri: &str, body: Body) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", format!("Bearer {TOKEN}"))
        .header("content-type", "application/json")
        .extension(ConnectInfo(local_addr()))
        .body(body)
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_check_has_no_auth_and_reports_queue_counts() {
    let response = app()
        .oneshot(
            Request::builder()
                .uri("/health")
                .extension(ConnectInfo(local_addr()))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["queue"]["pending"], 0);
}

#[tokio::test]
async fn session_init_then_observation_then_context_round_trips() {
    let router = app();

    let init = router
        .clone()
        .oneshot(authed(
            "POST",
            "/api/sessions/init",
            Body::from(
                json!({
                    "session_id": "integration-session-1",
                    "project": "demo",
                    "userPrompt": "fix the off-by-one bug",
                })
                .to_string(),
            ),
        ))
        .await
        .unwrap();
    assert_eq!(init.status(), StatusCode::OK);
    let init_body = json_body(init).await;
    assert_eq!(init_body["success"], true);

    let observe = router
        .clone()
        .oneshot(authed(
            "POST",
            "/api/observations",
            Body::from(
                json!({
                    "session_id": "integration-session-1",
                    "tool_name": "Edit",
                    "tool_input": {"file": "main.rs"},
                    "tool_result": "applied the fix",
                    "project": "demo",
                })
                .to_string(),
            ),
        ))
        .await
        .unwrap();
    assert_eq!(observe.status(), StatusCode::ACCEPTED);
    let observe_body = json_body(observe).await;
    assert_eq!(observe_body["queued"], true);

    let context = router
        .clone()
        .oneshot(authed("GET", "/api/context?project=demo", Body::empty()))
        .await
        .unwrap();
    assert_eq!(context.status(), StatusCode::OK);
    assert_eq!(
        context.headers().get("content-type").unwrap(),
        "text/markdown"
    );
}

#[tokio::test]
async fn missing_bearer_token_is_rejected_with_401_envelope() {
    let response = app()
        .oneshot(
            Request::builder()
                .uri("/api/stats")
                .extension(ConnectInfo(local_addr()))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(response).await;
    assert!(body["error"].as_str().unwrap().len() > 0);
}

#[tokio::test]
async fn post_without_json_content_type_is_rejected_with_415() {
    let request = Request::builder()
        .method("POST")
        .uri("/api/sessions/init")
        .header("authorization", format!("Bearer {TOKEN}"))
        .extension(ConnectInfo(local_addr()))
        .body(Body::from("not json"))
        .unwrap();
    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

#[tokio::test]
async fn session_id_out_of_range_is_rejected_with_validation_error() {
    let response = app()
        .oneshot(authed(
            "POST",
            "/api/sessions/init",
            Body::from(
                json!({
                    "session_id": "short",
                    "project": "demo",
                    "userPrompt": "hi",
                })
                .to_string(),
            ),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn session_id_with_illegal_characters_is_rejected_with_validation_error() {
    let response = app()
        .oneshot(authed(
            "POST",
            "/api/sessions/init",
            Body::from(
                json!({
                    "session_id": "not a valid id!",
                    "project": "demo",
                    "userPrompt": "hi",
                })
                .to_string(),
            ),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_session_summarize_returns_404_envelope() {
    let response = app()
        .oneshot(authed(
            "POST",
            "/api/sessions/summarize",
            Body::from(json!({"session_id": "does-not-exist"}).to_string()),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn oversized_body_is_rejected_with_413() {
    let huge_input = "a".repeat(200 * 1024);
    let response = app()
        .oneshot(authed(
            "POST",
            "/api/observations",
            Body::from(
                json!({
                    "session_id": "integration-session-2",
                    "tool_name": "Edit",
                    "tool_input": {},
                    "tool_result": huge_input,
                    "project": "demo",
                })
                .to_string(),
            ),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}
