use super::*;
use crate::test_support::test_state;
use axum::Router;
use axum::http::StatusCode;
use axum::middleware;
use axum::routing::get;
use std::net::SocketAddr;
use tower::ServiceExt;

async fn ok() -> &'static str {
    "ok"
}

fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(ok))
        .layer(middleware::from_fn_with_state(state.clone(), guard))
        .with_state(state)
}

fn request(addr: SocketAddr) -> Request<Body> {
    Request::builder()
        .uri("/")
        .extension(ConnectInfo(addr))
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn requests_within_capacity_pass() {
    let state = test_state();
    let addr = SocketAddr::from(([127, 0, 0, 1], 11111));
    let service = app(state);
    let response = service.oneshot(request(addr)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn exhausting_the_bucket_is_rejected() {
    let state = test_state();
    let addr = SocketAddr::from(([127, 0, 0, 1], 22222));
    state.rate_limiter.allow(addr.ip()); // warm the bucket so the loop below can exhaust it deterministically
    for _ in 0..100 {
        state.rate_limiter.allow(addr.ip());
    }

    let service = app(state);
    let response = service.oneshot(request(addr)).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}
