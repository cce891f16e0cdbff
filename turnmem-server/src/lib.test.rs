use super::*;
use crate::test_support::test_state;
use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::Request;
use axum::http::StatusCode;
use std::net::SocketAddr;
use tower::ServiceExt;

fn local_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 54321))
}

#[tokio::test]
async fn health_requires_no_token_and_returns_ok() {
    let state = test_state();
    let app = build_app(state);

    let response = app
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
}

#[tokio::test]
async fn protected_route_without_a_token_is_rejected() {
    let state = test_state();
    let app = build_app(state);

    let response = app
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
}

#[tokio::test]
async fn protected_route_with_a_valid_token_succeeds() {
    let state = test_state();
    let token = state.auth_token.to_string();
    let app = build_app(state);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/stats")
                .header("authorization", format!("Bearer {token}"))
                .extension(ConnectInfo(local_addr()))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn unknown_route_returns_the_404_envelope() {
    let state = test_state();
    let token = state.auth_token.to_string();
    let app = build_app(state);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/nope")
                .header("authorization", format!("Bearer {token}"))
                .extension(ConnectInfo(local_addr()))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
