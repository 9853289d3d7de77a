//! Gemini client and provider factory tests
//!
//! The Generative Language API is mocked with wiremock.

use axon::llm::{GeminiClient, LLMClient, LLMClientFactory, Provider};
use axon::types::AppError;
use futures::StreamExt;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MODEL: &str = "gemini-1.5-flash";

fn client(server: &MockServer) -> GeminiClient {
    GeminiClient::new("test-key".to_string(), server.uri(), MODEL.to_string())
}

fn generate_path() -> String {
    format!("/models/{}:generateContent", MODEL)
}

#[test]
fn test_provider_creation() {
    let provider = Provider::Gemini {
        api_key: "key".to_string(),
        base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
        model: MODEL.to_string(),
    };
    assert_eq!(provider.name(), "Gemini");
    assert_eq!(provider.create_client().model_name(), MODEL);

    let factory = LLMClientFactory::new(provider);
    assert!(factory.is_configured());
    let client = factory.create().expect("configured factory yields a client");
    assert_eq!(client.model_name(), MODEL);
}

#[tokio::test]
async fn test_generate_with_system() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(generate_path()))
        .and(header("x-goog-api-key", "test-key"))
        .and(body_partial_json(json!({
            "systemInstruction": { "parts": [{ "text": "Be brief." }] },
            "contents": [{ "role": "user", "parts": [{ "text": "Hello" }] }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": { "parts": [{ "text": "Hi " }, { "text": "there." }] }
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let text = client(&server)
        .generate_with_system("Be brief.", "Hello")
        .await
        .unwrap();
    assert_eq!(text, "Hi there.");
}

#[tokio::test]
async fn test_generation_config_is_sent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(generate_path()))
        .and(body_partial_json(json!({
            "generationConfig": { "maxOutputTokens": 64 }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{ "content": { "parts": [{ "text": "ok" }] } }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let text = client(&server)
        .with_generation_config(0.2, 64)
        .generate("ping")
        .await
        .unwrap();
    assert_eq!(text, "ok");
}

#[tokio::test]
async fn test_api_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(generate_path()))
        .respond_with(ResponseTemplate::new(403).set_body_string("API key not valid"))
        .mount(&server)
        .await;

    let err = client(&server).generate("Hello").await.unwrap_err();
    assert!(matches!(err, AppError::LLM(_)));
    assert_eq!(err.message(), "Gemini API error 403: API key not valid");
}

#[tokio::test]
async fn test_blocked_prompt_has_no_content() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(generate_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "promptFeedback": { "blockReason": "SAFETY" }
        })))
        .mount(&server)
        .await;

    let err = client(&server).generate("Hello").await.unwrap_err();
    assert_eq!(err.message(), "Gemini returned no content: SAFETY");
}

#[tokio::test]
async fn test_stream_with_system() {
    let server = MockServer::start().await;
    let sse = concat!(
        "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"Hello\"}]}}]}\n\n",
        "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\", world\"}]}}]}\n\n",
        "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"\"}]}}]}\n\n",
    );
    Mock::given(method("POST"))
        .and(path(format!("/models/{}:streamGenerateContent", MODEL)))
        .and(query_param("alt", "sse"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(sse, "text/event-stream"))
        .mount(&server)
        .await;

    let stream = client(&server)
        .stream_with_system("system", "prompt")
        .await
        .unwrap();
    let chunks: Vec<String> = stream.map(|c| c.unwrap()).collect().await;

    assert_eq!(chunks, vec!["Hello".to_string(), ", world".to_string()]);
}
