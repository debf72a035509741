//! HTTP-level backend tests against a mock server.

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use quill::backend::{BackendConfig, BackendPlugin, Generate as _, generate_with_retry};
use quill::backend::ollama::OllamaPlugin;
use quill::backend::openai::OpenAiPlugin;
use quill::error::BackendError;

fn openai_config(endpoint: &str) -> BackendConfig {
    let mut config = BackendConfig::new();
    config.insert("api_key".to_string(), "sk-test".to_string());
    config.insert("endpoint".to_string(), endpoint.to_string());
    config.insert("model".to_string(), "gpt-4o".to_string());
    config
}

fn ollama_config(host: &str) -> BackendConfig {
    let mut config = BackendConfig::new();
    config.insert("host".to_string(), host.to_string());
    config.insert("model".to_string(), "qwen2.5-coder:3b".to_string());
    config
}

#[tokio::test]
async fn openai_returns_completion_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("Authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({"model": "gpt-4o"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": "feat: add login"}}]
        })))
        .mount(&server)
        .await;

    let generator = OpenAiPlugin.construct(&openai_config(&server.uri())).unwrap();
    let out = generator.generate("prompt", 128).await.unwrap();
    assert_eq!(out, "feat: add login");
}

#[tokio::test]
async fn openai_empty_choices_is_success_with_empty_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&server)
        .await;

    let generator = OpenAiPlugin.construct(&openai_config(&server.uri())).unwrap();
    let out = generator.generate("prompt", 128).await.unwrap();
    assert_eq!(out, "");
}

#[tokio::test]
async fn openai_non_success_status_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string("unauthorized"))
        .mount(&server)
        .await;

    let generator = OpenAiPlugin.construct(&openai_config(&server.uri())).unwrap();
    let err = generator.generate("prompt", 128).await.unwrap_err();
    match err {
        BackendError::Status { backend, status } => {
            assert_eq!(backend, "openai");
            assert_eq!(status.as_u16(), 401);
        }
        other => panic!("expected Status error, got {other:?}"),
    }
}

#[tokio::test]
async fn retry_wrapper_retries_server_errors() {
    let server = MockServer::start().await;
    // Two 503s, then success.
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": "fix: recovered"}}]
        })))
        .mount(&server)
        .await;

    let generator = OpenAiPlugin.construct(&openai_config(&server.uri())).unwrap();
    let out = generate_with_retry(generator.as_ref(), "prompt", 128)
        .await
        .unwrap();
    assert_eq!(out, "fix: recovered");
}

#[tokio::test]
async fn ollama_returns_response_field() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": "docs: describe flags",
            "done": true
        })))
        .mount(&server)
        .await;

    let generator = OllamaPlugin.construct(&ollama_config(&server.uri())).unwrap();
    let out = generator.generate("prompt", 128).await.unwrap();
    assert_eq!(out, "docs: describe flags");
}

#[tokio::test]
async fn ollama_rejected_request_is_status_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(404).set_body_string("model not found"))
        .mount(&server)
        .await;

    let generator = OllamaPlugin.construct(&ollama_config(&server.uri())).unwrap();
    let err = generator.generate("prompt", 128).await.unwrap_err();
    assert!(matches!(err, BackendError::Status { backend: "ollama", .. }));
}

#[tokio::test]
async fn ollama_unreachable_runtime_is_distinguished() {
    // Nothing listens on this port; the connect error must map to
    // Unreachable, not a generic request failure.
    let generator = OllamaPlugin
        .construct(&ollama_config("http://127.0.0.1:1"))
        .unwrap();
    let err = generator.generate("prompt", 128).await.unwrap_err();
    assert!(matches!(err, BackendError::Unreachable { backend: "ollama", .. }));
}
