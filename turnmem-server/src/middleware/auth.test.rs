use super::*;
use crate::test_support::test_state;
use axum::Router;
use axum::http::StatusCode;
use axum::middleware;
use axum::routing::get;
use tower::ServiceExt;

async fn ok() -> &'static str {
    "ok"
}

fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(ok))
        .route("/api/stats", get(ok))
        .layer(middleware::from_fn_with_state(state.clone(), guard))
        .with_state(state)
}

#[tokio::test]
async fn health_is_reachable_without_a_token() {
    let state = test_state();
    let response = app(state)
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn other_routes_reject_a_missing_token() {
    let state = test_state();
    let response = app(state)
        .oneshot(Request::builder().uri("/api/stats").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn other_routes_reject_a_wrong_token() {
    let state = test_state();
    let response = app(state)
        .oneshot(
            Request::builder()
                .uri("/api/stats")
                .header("authorization", "Bearer not-the-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn other_routes_accept_the_configured_token() {
    let state = test_state();
    let token = state.auth_token.to_string();
    let response = app(state)
        .oneshot(
            Request::builder()
                .uri("/api/stats")
                .header("authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
