use wiremock::matchers::{body_partial_json, header, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::*;

#[test]
fn test_generator_id() {
    let generator = GroqGenerator::new("gsk-test".to_string());
    assert_eq!(generator.id(), "groq");
}

#[tokio::test]
async fn test_generate_success_with_usage() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("Authorization", "Bearer gsk-test"))
        .and(body_partial_json(serde_json::json!({
            "model": "llama-3.3-70b-versatile",
            "temperature": 0.2
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": "```gherkin\nFeature: x\n```"}}],
            "usage": {"prompt_tokens": 9, "completion_tokens": 4}
        })))
        .mount(&server)
        .await;

    let generator = GroqGenerator::with_url("gsk-test".to_string(), server.uri());
    let generation = generator
        .generate("make a feature file", "llama-3.3-70b-versatile")
        .await
        .unwrap();

    assert_eq!(generation.text, "```gherkin\nFeature: x\n```");
    assert_eq!(generation.usage.input_tokens, 9);
    assert_eq!(generation.usage.output_tokens, 4);
}

#[tokio::test]
async fn test_joins_multiple_fenced_blocks() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": [{"message": {
                "role": "assistant",
                "content": "First:\n```gherkin\nFeature: a\n```\nThen:\n```java\nclass B {}\n```"
            }}]
        })))
        .mount(&server)
        .await;

    let generator = GroqGenerator::with_url("gsk-test".to_string(), server.uri());
    let generation = generator.generate("p", "m").await.unwrap();
    assert_eq!(
        generation.text,
        "```gherkin\nFeature: a\n```\n\n```java\nclass B {}\n```"
    );
}

#[tokio::test]
async fn test_upstream_error_carries_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
        .mount(&server)
        .await;

    let generator = GroqGenerator::with_url("bad".to_string(), server.uri());
    let err = generator.generate("p", "m").await.unwrap_err();
    match err {
        GenerateError::Upstream { status, body } => {
            assert_eq!(status, 401);
            assert_eq!(body, "invalid api key");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_network_failure_is_transport_error() {
    let generator = GroqGenerator::with_url(
        "gsk-test".to_string(),
        "http://127.0.0.1:1/unreachable".to_string(),
    );
    let err = generator.generate("p", "m").await.unwrap_err();
    assert!(matches!(err, GenerateError::Transport(_)));
}

#[tokio::test]
async fn test_unreadable_body_is_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let generator = GroqGenerator::with_url("gsk-test".to_string(), server.uri());
    let err = generator.generate("p", "m").await.unwrap_err();
    assert!(matches!(err, GenerateError::Transport(_)));
}
