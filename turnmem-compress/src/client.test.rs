use super::*;
use wiremock::Mock;
use wiremock::MockServer;
use wiremock::ResponseTemplate;
use wiremock::matchers::header;
use wiremock::matchers::method;
use wiremock::matchers::path;

#[tokio::test]
async fn posts_to_v1_complete_with_bearer_auth_and_parses_text_part() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/complete"))
        .and(header("Authorization", "Bearer secret-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "content": [{"type": "text", "text": "<memory><title>t</title></memory>"}]
        })))
        .mount(&server)
        .await;

    let client = HttpLlmClient::new(server.uri(), "secret-key", "turnmem-test-model");
    let result = client.complete("<c-mem-compress/>", 1024).await.unwrap();
    assert!(result.contains("<memory>"));
}

#[tokio::test]
async fn non_success_status_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/complete"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = HttpLlmClient::new(server.uri(), "secret-key", "turnmem-test-model");
    let result = client.complete("<c-mem-compress/>", 1024).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn response_with_no_text_part_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/complete"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"content": []})))
        .mount(&server)
        .await;

    let client = HttpLlmClient::new(server.uri(), "secret-key", "turnmem-test-model");
    let result = client.complete("<c-mem-compress/>", 1024).await;
    assert!(matches!(result, Err(CompressError::EmptyContent)));
}
