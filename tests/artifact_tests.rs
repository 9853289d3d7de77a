//! Artifact stores: the Supabase store against a mocked PostgREST endpoint,
//! and provider selection from configuration.

use axon::artifacts::{
    ArtifactStore, ArtifactStoreProvider, SaveArtifact, SupabaseArtifactStore,
};
use axon::types::AppError;
use axon::utils::toml_config::{ArtifactBackend, AxonConfig};
use serde_json::json;
use wiremock::matchers::{bearer_token, body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn store(server: &MockServer) -> SupabaseArtifactStore {
    SupabaseArtifactStore::new(
        reqwest::Client::new(),
        server.uri(),
        "service-key".to_string(),
        "artifacts".to_string(),
    )
}

#[tokio::test]
async fn test_supabase_save_returns_row_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/artifacts"))
        .and(header("apikey", "service-key"))
        .and(bearer_token("service-key"))
        .and(header("Prefer", "return=representation"))
        .and(body_partial_json(json!({
            "run_id": "run_1_abc",
            "agent_type": "content",
            "output": "Hello",
            "provider": "unknown"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([{ "id": 42 }])))
        .expect(1)
        .mount(&server)
        .await;

    let saved = store(&server)
        .save(SaveArtifact::new("run_1_abc", "content", "Hello"))
        .await
        .unwrap();
    assert_eq!(saved.id.as_deref(), Some("42"));
    assert!(saved.file.is_none());
}

#[tokio::test]
async fn test_supabase_save_validates_before_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let err = store(&server)
        .save(SaveArtifact {
            run_id: Some("run_1".to_string()),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidInput(_)));
}

#[tokio::test]
async fn test_supabase_save_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/artifacts"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid JWT"))
        .mount(&server)
        .await;

    let err = store(&server)
        .save(SaveArtifact::new("run_1", "code", "fn main() {}"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Storage(_)));
    assert_eq!(err.message(), "Supabase insert failed (401): invalid JWT");
}

#[tokio::test]
async fn test_supabase_list_newest_first() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/artifacts"))
        .and(query_param("select", "*"))
        .and(query_param("order", "saved_at.desc"))
        .and(query_param("limit", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "id": 2,
                "run_id": "run_2",
                "agent_type": "design",
                "output": "second",
                "provider": "stub",
                "metadata": {},
                "saved_at": "2026-01-02T00:00:00.000Z"
            },
            {
                "id": 1,
                "run_id": "run_1",
                "agent_type": "content",
                "output": "first",
                "saved_at": "2026-01-01T00:00:00.000Z"
            }
        ])))
        .mount(&server)
        .await;

    let items = store(&server).list(2).await.unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].run_id, "run_2");
    assert_eq!(items[0].agent_type, "design");
    assert_eq!(items[1].provider, "");
    assert!(items[1].metadata.is_empty());
}

#[test]
fn test_provider_from_config_file_backend() {
    let config = AxonConfig::default();
    match ArtifactStoreProvider::from_config(&config).unwrap() {
        ArtifactStoreProvider::File { dir } => assert_eq!(dir, config.artifacts.dir),
        other => panic!("expected file provider, got {:?}", other),
    }
}

#[test]
fn test_provider_from_config_supabase_without_url() {
    let mut config = AxonConfig::default();
    config.artifacts.backend = ArtifactBackend::Supabase;
    config.artifacts.supabase.url_env = "AXON_TEST_UNSET_SUPABASE_URL".to_string();

    let err = ArtifactStoreProvider::from_config(&config).unwrap_err();
    assert!(matches!(err, AppError::Configuration(_)));
    assert_eq!(
        err.message(),
        "AXON_TEST_UNSET_SUPABASE_URL is not configured on the server."
    );
}
