//! Artifact persistence
//!
//! Saved agent outputs, stored either as JSON files on disk (the default)
//! or as rows in a Supabase table via PostgREST.
//!
//! ```rust,ignore
//! use axon::artifacts::ArtifactStoreProvider;
//!
//! let provider = ArtifactStoreProvider::File { dir: "data/artifacts".into() };
//! let store = provider.create_store(reqwest::Client::new());
//! let saved = store.save(SaveArtifact::new(run_id, "content", output)).await?;
//! ```

pub mod file;
pub mod supabase;

use crate::types::{now_rfc3339, AppError, Result};
use crate::utils::toml_config::{ArtifactBackend, AxonConfig};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;
use std::sync::Arc;
use utoipa::ToSchema;

pub use file::FileArtifactStore;
pub use supabase::SupabaseArtifactStore;

/// A persisted agent output
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactRecord {
    pub run_id: String,
    pub agent_type: String,
    pub output: String,
    pub provider: String,
    #[schema(value_type = Object)]
    pub metadata: Map<String, Value>,
    pub saved_at: String,
    /// Relative file path; only set by the file store
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

/// Body of a save request, before validation
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaveArtifact {
    #[serde(default)]
    pub run_id: Option<String>,
    #[serde(default)]
    pub agent_type: Option<String>,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub output: Option<Value>,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<Map<String, Value>>,
}

impl SaveArtifact {
    pub fn new(
        run_id: impl Into<String>,
        agent_type: impl Into<String>,
        output: impl Into<String>,
    ) -> Self {
        Self {
            run_id: Some(run_id.into()),
            agent_type: Some(agent_type.into()),
            output: Some(Value::String(output.into())),
            ..Default::default()
        }
    }

    /// Check required fields and fill defaults.
    ///
    /// `runId` and `agentType` must be non-empty and `output` must be a
    /// string (an empty string is allowed).
    pub fn into_record(self) -> Result<ArtifactRecord> {
        let missing = || AppError::InvalidInput("Missing required fields".to_string());

        let run_id = self.run_id.filter(|s| !s.is_empty()).ok_or_else(missing)?;
        let agent_type = self.agent_type.filter(|s| !s.is_empty()).ok_or_else(missing)?;
        let output = match self.output {
            Some(Value::String(output)) => output,
            _ => return Err(missing()),
        };

        Ok(ArtifactRecord {
            run_id,
            agent_type,
            output,
            provider: self
                .provider
                .filter(|p| !p.is_empty())
                .unwrap_or_else(|| "unknown".to_string()),
            metadata: self.metadata.unwrap_or_default(),
            saved_at: now_rfc3339(),
            file: None,
        })
    }
}

/// Where a saved artifact ended up
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct SavedArtifact {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

/// Artifact persistence backend
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Validate and persist an artifact
    async fn save(&self, artifact: SaveArtifact) -> Result<SavedArtifact>;

    /// Most recent artifacts first
    async fn list(&self, limit: usize) -> Result<Vec<ArtifactRecord>>;

    fn backend_name(&self) -> &'static str;
}

/// Artifact store configuration
#[derive(Debug, Clone)]
pub enum ArtifactStoreProvider {
    File {
        dir: PathBuf,
    },
    Supabase {
        url: String,
        key: String,
        table: String,
    },
}

impl ArtifactStoreProvider {
    /// Resolve the configured backend.
    ///
    /// Supabase needs its URL env var set; the service key may be empty
    /// for tables without row-level security.
    pub fn from_config(config: &AxonConfig) -> Result<Self> {
        match config.artifacts.backend {
            ArtifactBackend::File => Ok(ArtifactStoreProvider::File {
                dir: config.artifacts.dir.clone(),
            }),
            ArtifactBackend::Supabase => {
                let url = config.supabase_url().ok_or_else(|| {
                    AppError::Configuration(format!(
                        "{} is not configured on the server.",
                        config.artifacts.supabase.url_env
                    ))
                })?;
                Ok(ArtifactStoreProvider::Supabase {
                    url,
                    key: config.supabase_key().unwrap_or_default(),
                    table: config.artifacts.supabase.table.clone(),
                })
            }
        }
    }

    pub fn create_store(&self, http: reqwest::Client) -> Arc<dyn ArtifactStore> {
        match self {
            ArtifactStoreProvider::File { dir } => Arc::new(FileArtifactStore::new(dir.clone())),
            ArtifactStoreProvider::Supabase { url, key, table } => Arc::new(
                SupabaseArtifactStore::new(http, url.clone(), key.clone(), table.clone()),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[test]
    fn test_into_record_defaults() {
        let record = SaveArtifact::new("run_1", "content", "hello")
            .into_record()
            .unwrap();

        assert_eq!(record.provider, "unknown");
        assert!(record.metadata.is_empty());
        assert!(record.file.is_none());
        assert!(!record.saved_at.is_empty());
    }

    #[test]
    fn test_empty_output_is_allowed() {
        assert!(SaveArtifact::new("run_1", "code", "").into_record().is_ok());
    }

    #[rstest]
    #[case(json!({ "agentType": "content", "output": "x" }))]
    #[case(json!({ "runId": "", "agentType": "content", "output": "x" }))]
    #[case(json!({ "runId": "r", "output": "x" }))]
    #[case(json!({ "runId": "r", "agentType": "content" }))]
    #[case(json!({ "runId": "r", "agentType": "content", "output": 42 }))]
    fn test_missing_required_fields(#[case] body: Value) {
        let request: SaveArtifact = serde_json::from_value(body).unwrap();
        let err = request.into_record().unwrap_err();
        assert_eq!(err.message(), "Missing required fields");
    }

    #[test]
    fn test_record_wire_format() {
        let record = SaveArtifact {
            provider: Some("gemini".into()),
            ..SaveArtifact::new("run_9", "research", "findings")
        }
        .into_record()
        .unwrap();

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["runId"], "run_9");
        assert_eq!(value["agentType"], "research");
        assert_eq!(value["provider"], "gemini");
        assert!(value.get("savedAt").is_some());
        assert!(value.get("file").is_none());
    }

    #[test]
    fn test_provider_from_config() {
        let config = AxonConfig::default();
        match ArtifactStoreProvider::from_config(&config).unwrap() {
            ArtifactStoreProvider::File { dir } => assert_eq!(dir, PathBuf::from("data/artifacts")),
            other => panic!("expected file store, got {:?}", other),
        }

        let mut config = AxonConfig::default();
        config.artifacts.backend = ArtifactBackend::Supabase;
        config.artifacts.supabase.url_env = "AXON_TEST_UNSET_SUPABASE".into();
        assert!(ArtifactStoreProvider::from_config(&config).is_err());
    }
}
