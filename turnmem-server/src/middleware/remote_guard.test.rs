use super::*;
use crate::test_support::test_state;
use axum::http::StatusCode;
use axum::middleware;
use axum::routing::get;
use std::sync::Arc;
use tower::ServiceExt;

async fn ok() -> &'static str {
    "ok"
}

#[tokio::test]
async fn localhost_remote_passes_when_bound_to_loopback() {
    let mut state = test_state();
    Arc::get_mut(&mut state.config).unwrap().bind_host = "127.0.0.1".to_string();

    let service = get(ok)
        .layer(middleware::from_fn_with_state(state.clone(), guard))
        .with_state(state);

    let response = service
        .oneshot(
            Request::builder()
                .uri("/")
                .extension(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 9999))))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn non_localhost_remote_is_rejected_when_bound_to_loopback() {
    let mut state = test_state();
    Arc::get_mut(&mut state.config).unwrap().bind_host = "127.0.0.1".to_string();

    let service = get(ok)
        .layer(middleware::from_fn_with_state(state.clone(), guard))
        .with_state(state);

    let response = service
        .oneshot(
            Request::builder()
                .uri("/")
                .extension(ConnectInfo(SocketAddr::from(([10, 0, 0, 5], 9999))))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn non_localhost_remote_passes_when_bound_to_all_interfaces() {
    let mut state = test_state();
    Arc::get_mut(&mut state.config).unwrap().bind_host = "0.0.0.0".to_string();

    let service = get(ok)
        .layer(middleware::from_fn_with_state(state.clone(), guard))
        .with_state(state);

    let response = service
        .oneshot(
            Request::builder()
                .uri("/")
                .extension(ConnectInfo(SocketAddr::from(([10, 0, 0, 5], 9999))))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
