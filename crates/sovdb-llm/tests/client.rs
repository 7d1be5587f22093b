//! Integration tests for `CompletionClient` using wiremock HTTP mocks.

use sovdb_llm::{CompletionClient, LlmError};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(base_url: &str) -> CompletionClient {
    CompletionClient::with_base_url("test-key", "narrative-v1", 30, 2, 0, base_url)
        .expect("client construction should not fail")
}

#[tokio::test]
async fn complete_returns_the_completion_text() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(serde_json::json!({
            "model": "narrative-v1"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "text": "Your brand leads with 42% of mentions."
        })))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let text = client
        .complete("summarize this", 256)
        .await
        .expect("should return text");
    assert_eq!(text, "Your brand leads with 42% of mentions.");
}

#[tokio::test]
async fn api_error_status_and_message_are_surfaced() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/completions"))
        .respond_with(ResponseTemplate::new(422).set_body_json(serde_json::json!({
            "error": { "message": "prompt too long" }
        })))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let result = client.complete("x", 16).await;
    match result {
        Err(LlmError::Api { status, message }) => {
            assert_eq!(status, 422);
            assert_eq!(message, "prompt too long");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn server_errors_are_retried_until_success() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/completions"))
        .respond_with(ResponseTemplate::new(503).set_body_json(serde_json::json!({
            "error": { "message": "overloaded" }
        })))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "text": "recovered"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let text = client
        .complete("x", 16)
        .await
        .expect("should recover after retries");
    assert_eq!(text, "recovered");
}

#[tokio::test]
async fn malformed_response_is_a_deserialize_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let result = client.complete("x", 16).await;
    assert!(
        matches!(result, Err(LlmError::Deserialize { .. })),
        "malformed body must not retry: {result:?}"
    );
}

#[tokio::test]
async fn analyze_website_parses_fenced_json() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "text": "```json\n{\"description\": \"An analytics platform.\", \"keywords\": [\"analytics\", \"brand monitoring\"]}\n```"
        })))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let analysis = client
        .analyze_website("Acme", "https://acme.example.com")
        .await
        .expect("should parse analysis");
    assert_eq!(analysis.description, "An analytics platform.");
    assert_eq!(analysis.keywords, vec!["analytics", "brand monitoring"]);
}

#[tokio::test]
async fn generate_prompts_parses_and_caps_the_list() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "text": "1. best analytics tools for startups\n2. how to measure AI share of voice\n3. which brand trackers support dashboards\n4. extra prompt beyond the cap"
        })))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let prompts = client
        .generate_prompts("Acme", "brand analytics", 3)
        .await
        .expect("should parse prompts");
    assert_eq!(prompts.len(), 3);
    assert_eq!(prompts[0], "best analytics tools for startups");
}

#[tokio::test]
async fn improve_prompts_returns_the_rewritten_list() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "text": "1. what analytics platform fits a ten-person marketing team\n2. how do agencies compare brand monitoring vendors"
        })))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let improved = client
        .improve_prompts(
            "Acme",
            &["best tools".to_string(), "compare vendors".to_string()],
        )
        .await
        .expect("should parse improved prompts");
    assert_eq!(improved.len(), 2);
}
