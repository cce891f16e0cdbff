use super::*;

#[test]
fn kind_maps_onto_the_spec_status_table() {
    assert_eq!(ServerError::Unauthorized.kind().http_status(), 401);
    assert_eq!(
        ServerError::Forbidden { message: "nope".into() }.kind().http_status(),
        403
    );
    assert_eq!(ServerError::NotFound.kind().http_status(), 404);
    assert_eq!(ServerError::TooLarge { limit: 100 }.kind().http_status(), 413);
    assert_eq!(ServerError::UnsupportedMediaType.kind().http_status(), 415);
    assert_eq!(ServerError::RateLimited.kind().http_status(), 429);
    assert_eq!(
        ServerError::Validation { message: "bad".into() }.kind().http_status(),
        400
    );
}

#[test]
fn store_errors_inherit_their_own_classification() {
    let err: ServerError = turnmem_store::StoreErr::NotFound { id: 1 }.into();
    assert_eq!(err.kind().http_status(), 404);
}

#[tokio::test]
async fn into_response_wraps_the_message_in_an_error_envelope() {
    use axum::body::to_bytes;
    use axum::response::IntoResponse;

    let response = ServerError::NotFound.into_response();
    assert_eq!(response.status().as_u16(), 404);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error"], "not found");
}
