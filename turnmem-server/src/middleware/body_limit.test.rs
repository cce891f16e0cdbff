use super::*;
use axum::Router;
use axum::http::StatusCode;
use axum::middleware::from_fn;
use axum::routing::post;
use tower::ServiceExt;

async fn ok() -> &'static str {
    "ok"
}

fn app() -> Router {
    Router::new().route("/echo", post(ok)).layer(from_fn(guard))
}

#[tokio::test]
async fn body_within_limit_passes() {
    let response = app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/echo")
                .body(Body::from(vec![b'a'; MAX_BODY_BYTES - 1]))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn declared_content_length_over_limit_is_rejected() {
    let response = app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/echo")
                .header("content-length", (MAX_BODY_BYTES + 1).to_string())
                .body(Body::from(vec![b'a'; MAX_BODY_BYTES + 1]))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn actual_body_over_limit_without_content_length_header_is_rejected() {
    // No `content-length` header set explicitly: the guard must still catch
    // this by counting bytes as it reads the body, not just by trusting a header.
    let response = app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/echo")
                .body(Body::from(vec![b'a'; MAX_BODY_BYTES + 1]))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}
