use super::*;
use axum::Router;
use axum::body::Body;
use axum::http::Request;
use axum::routing::get;
use tower::ServiceExt;

async fn ok() -> &'static str {
    "ok"
}

fn app() -> Router {
    Router::new().route("/health", get(ok)).layer(layer(8765))
}

#[tokio::test]
async fn allowed_origin_is_echoed_back() {
    let response = app()
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("Origin", "http://127.0.0.1:8765")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("http://127.0.0.1:8765")
    );
}

#[tokio::test]
async fn disallowed_origin_gets_no_cors_header() {
    let response = app()
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("Origin", "http://evil.example")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert!(response.headers().get("access-control-allow-origin").is_none());
}
