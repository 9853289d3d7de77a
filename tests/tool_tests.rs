//! Built-in tools against mocked upstream APIs

use axon::cache::ToolCache;
use axon::llm::GeminiClient;
use axon::tools::media::{GeminiVisionTool, Veo3VideoTool};
use axon::tools::search::WebSearchTool;
use axon::tools::{Tool, ToolExecution, ToolOrchestrator, ToolQuota, ToolRegistry};
use axon::types::AppError;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{bearer_token, body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn serp_body() -> Value {
    json!({
        "organic_results": [
            { "title": "Axum", "link": "https://docs.rs/axum", "snippet": "Web framework" },
            { "title": "Tokio", "link": "https://tokio.rs", "snippet": "Async runtime" }
        ]
    })
}

fn search_tool(server: &MockServer, cache: Arc<ToolCache>) -> WebSearchTool {
    WebSearchTool::new(
        reqwest::Client::new(),
        server.uri(),
        Some("serp-key".to_string()),
        cache,
    )
}

// ============= Web search =============

#[tokio::test]
async fn test_web_search_live_then_cached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search.json"))
        .and(query_param("q", "rust web"))
        .and(query_param("api_key", "serp-key"))
        .and(query_param("engine", "google"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serp_body()))
        .expect(1)
        .mount(&server)
        .await;

    let cache = Arc::new(ToolCache::with_ttl(Duration::from_secs(60)));
    let tool = search_tool(&server, Arc::clone(&cache));

    let first = tool.execute(json!({ "query": "rust web" })).await.unwrap();
    assert_eq!(first["source"], "live");
    assert_eq!(first["results"].as_array().unwrap().len(), 2);
    assert_eq!(first["results"][0]["link"], "https://docs.rs/axum");

    let second = tool.execute(json!({ "query": "rust web" })).await.unwrap();
    assert_eq!(second["source"], "cache");
    assert_eq!(second["results"], first["results"]);
    assert_eq!(cache.len(), 1);
}

#[tokio::test]
async fn test_web_search_passes_num_results() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search.json"))
        .and(query_param("num", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serp_body()))
        .expect(1)
        .mount(&server)
        .await;

    let tool = search_tool(&server, Arc::new(ToolCache::default()));
    let result = tool
        .execute(json!({ "query": "tokio", "numResults": 3 }))
        .await
        .unwrap();
    assert_eq!(result["source"], "live");
}

#[tokio::test]
async fn test_web_search_result_count_is_part_of_cache_entry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search.json"))
        .and(query_param("num", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serp_body()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/search.json"))
        .and(query_param("num", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "organic_results": [
                { "title": "Axum", "link": "https://docs.rs/axum", "snippet": "Web framework" }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let cache = Arc::new(ToolCache::default());
    let tool = search_tool(&server, Arc::clone(&cache));

    let two = tool
        .execute(json!({ "query": "axum", "numResults": 2 }))
        .await
        .unwrap();
    assert_eq!(two["results"].as_array().unwrap().len(), 2);

    let one = tool
        .execute(json!({ "query": "axum", "numResults": 1 }))
        .await
        .unwrap();
    assert_eq!(one["source"], "live");
    assert_eq!(one["results"].as_array().unwrap().len(), 1);

    let two_again = tool
        .execute(json!({ "query": "axum", "numResults": 2 }))
        .await
        .unwrap();
    assert_eq!(two_again["source"], "cache");
    assert_eq!(two_again["results"].as_array().unwrap().len(), 2);
    assert!(cache.get("web_search#2:axum").is_some());
    assert!(cache.get("web_search:axum").is_none());
}

#[tokio::test]
async fn test_web_search_upstream_error_is_not_cached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search.json"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "error": "Invalid API key." })),
        )
        .expect(2)
        .mount(&server)
        .await;

    let cache = Arc::new(ToolCache::default());
    let tool = search_tool(&server, Arc::clone(&cache));

    for _ in 0..2 {
        let err = tool.execute(json!({ "query": "anything" })).await.unwrap_err();
        assert!(matches!(err, AppError::Upstream(_)));
        assert_eq!(err.message(), "SerpAPI error: Invalid API key.");
    }
    assert!(cache.is_empty());
}

// ============= Quota =============

#[tokio::test]
async fn test_quota_blocks_after_limit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serp_body()))
        .mount(&server)
        .await;

    let quota = Arc::new(ToolQuota::new(Some(1)));
    let mut registry = ToolRegistry::new().with_quota(Arc::clone(&quota));
    registry.register(Arc::new(search_tool(&server, Arc::new(ToolCache::default()))));

    registry
        .execute("web_search", json!({ "query": "one" }))
        .await
        .unwrap();
    assert_eq!(quota.usage("web_search"), 1);

    let err = registry
        .execute("web_search", json!({ "query": "two" }))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::QuotaExceeded(_)));
    assert_eq!(err.message(), "Daily quota (1) exceeded for web_search.");
}

#[tokio::test]
async fn test_quota_ignores_failed_calls() {
    let quota = Arc::new(ToolQuota::new(Some(1)));
    let mut registry = ToolRegistry::new().with_quota(Arc::clone(&quota));
    registry.register(Arc::new(WebSearchTool::new(
        reqwest::Client::new(),
        "http://127.0.0.1:1".to_string(),
        None,
        Arc::new(ToolCache::default()),
    )));

    for _ in 0..3 {
        let err = registry
            .execute("web_search", json!({ "query": "q" }))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Configuration(_)));
    }
    assert_eq!(quota.usage("web_search"), 0);
}

// ============= Orchestrator =============

#[tokio::test]
async fn test_orchestrator_records_step_failures() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serp_body()))
        .mount(&server)
        .await;

    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(search_tool(&server, Arc::new(ToolCache::default()))));
    registry.register(Arc::new(Veo3VideoTool::new(
        reqwest::Client::new(),
        server.uri(),
        None,
    )));
    let orchestrator = ToolOrchestrator::new(Arc::new(registry));

    let results = orchestrator
        .execute_tool_sequence(&[
            ToolExecution::new("web_search", json!({ "query": "axon" })),
            ToolExecution::new("veo3_video", json!({ "prompt": "a sunrise" })),
        ])
        .await
        .unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["results"].as_array().unwrap().len(), 2);
    assert_eq!(results[1]["error"], "Failed to execute tool 'veo3_video'");
}

// ============= Veo 3 video =============

#[tokio::test]
async fn test_video_generation() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/generation"))
        .and(bearer_token("runway-key"))
        .and(body_partial_json(json!({ "model": "veo-3", "duration": 6 })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "video_url": "https://cdn.example.com/v.mp4" })),
        )
        .mount(&server)
        .await;

    let tool = Veo3VideoTool::new(
        reqwest::Client::new(),
        server.uri(),
        Some("runway-key".to_string()),
    );
    let result = tool
        .execute(json!({ "prompt": "a sunrise", "duration": 6 }))
        .await
        .unwrap();
    assert_eq!(result["videoUrl"], "https://cdn.example.com/v.mp4");
}

#[tokio::test]
async fn test_video_generation_upstream_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/generation"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({ "message": "Prompt rejected" })),
        )
        .mount(&server)
        .await;

    let tool = Veo3VideoTool::new(reqwest::Client::new(), server.uri(), Some("k".to_string()));
    let err = tool.execute(json!({ "prompt": "x" })).await.unwrap_err();
    assert!(matches!(err, AppError::Upstream(_)));
    assert_eq!(err.message(), "Prompt rejected");
}

// ============= Gemini vision =============

#[tokio::test]
async fn test_image_generation_collects_inline_images() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/gemini-2.0-flash-exp:generateContent"))
        .and(header("x-goog-api-key", "gem-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": {
                    "parts": [
                        { "text": "Here is your image." },
                        { "inlineData": { "mimeType": "image/png", "data": "aGVsbG8=" } }
                    ]
                }
            }]
        })))
        .mount(&server)
        .await;

    let client = GeminiClient::new(
        "gem-key".to_string(),
        server.uri(),
        "gemini-2.0-flash-exp".to_string(),
    );
    let tool = GeminiVisionTool::new(Some(client));

    let result = tool
        .execute(json!({ "prompt": "a cat", "style": "artistic" }))
        .await
        .unwrap();
    assert_eq!(result["images"][0]["data"], "aGVsbG8=");
    assert_eq!(result["images"][0]["mimeType"], "image/png");
    assert_eq!(result["text"], "Here is your image.");
}

#[tokio::test]
async fn test_image_generation_rejects_unknown_style() {
    let tool = GeminiVisionTool::new(None);
    let err = tool
        .execute(json!({ "prompt": "a cat", "style": "cubist" }))
        .await
        .unwrap_err();
    assert_eq!(err.message(), "Unsupported image style: cubist");
}
