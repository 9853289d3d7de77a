use crate::artifacts::{ArtifactRecord, ArtifactStore, SaveArtifact, SavedArtifact};
use crate::types::{AppError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Stores artifacts as rows of a Supabase table through its PostgREST API
pub struct SupabaseArtifactStore {
    http: reqwest::Client,
    url: String,
    key: String,
    table: String,
}

/// Row shape of the artifacts table
#[derive(Debug, Serialize, Deserialize)]
struct ArtifactRow {
    run_id: String,
    agent_type: String,
    output: String,
    #[serde(default)]
    provider: String,
    #[serde(default)]
    metadata: Map<String, Value>,
    saved_at: String,
}

impl From<ArtifactRecord> for ArtifactRow {
    fn from(r: ArtifactRecord) -> Self {
        Self {
            run_id: r.run_id,
            agent_type: r.agent_type,
            output: r.output,
            provider: r.provider,
            metadata: r.metadata,
            saved_at: r.saved_at,
        }
    }
}

impl From<ArtifactRow> for ArtifactRecord {
    fn from(r: ArtifactRow) -> Self {
        Self {
            run_id: r.run_id,
            agent_type: r.agent_type,
            output: r.output,
            provider: r.provider,
            metadata: r.metadata,
            saved_at: r.saved_at,
            file: None,
        }
    }
}

impl SupabaseArtifactStore {
    pub fn new(http: reqwest::Client, url: String, key: String, table: String) -> Self {
        Self {
            http,
            url: url.trim_end_matches('/').to_string(),
            key,
            table,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/rest/v1/{}", self.url, self.table)
    }

    fn request(&self, method: reqwest::Method) -> reqwest::RequestBuilder {
        self.http
            .request(method, self.endpoint())
            .header("apikey", &self.key)
            .bearer_auth(&self.key)
    }

    async fn check(response: reqwest::Response, action: &str) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(AppError::Storage(format!(
            "Supabase {} failed ({}): {}",
            action,
            status.as_u16(),
            body
        )))
    }
}

#[async_trait]
impl ArtifactStore for SupabaseArtifactStore {
    async fn save(&self, artifact: SaveArtifact) -> Result<SavedArtifact> {
        let row = ArtifactRow::from(artifact.into_record()?);

        let response = self
            .request(reqwest::Method::POST)
            .header("Prefer", "return=representation")
            .json(&row)
            .send()
            .await?;
        let rows: Vec<Value> = Self::check(response, "insert").await?.json().await?;

        let id = rows.first().and_then(|r| r.get("id")).map(|id| match id {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        });
        Ok(SavedArtifact { file: None, id })
    }

    async fn list(&self, limit: usize) -> Result<Vec<ArtifactRecord>> {
        let response = self
            .request(reqwest::Method::GET)
            .query(&[
                ("select", "*".to_string()),
                ("order", "saved_at.desc".to_string()),
                ("limit", limit.to_string()),
            ])
            .send()
            .await?;
        let rows: Vec<ArtifactRow> = Self::check(response, "select").await?.json().await?;

        Ok(rows.into_iter().map(ArtifactRecord::from).collect())
    }

    fn backend_name(&self) -> &'static str {
        "supabase"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_trims_slash() {
        let store = SupabaseArtifactStore::new(
            reqwest::Client::new(),
            "https://abc.supabase.co/".into(),
            "k".into(),
            "artifacts".into(),
        );
        assert_eq!(store.endpoint(), "https://abc.supabase.co/rest/v1/artifacts");
    }

    #[test]
    fn test_row_uses_snake_case_columns() {
        let record = SaveArtifact::new("run_1", "data", "rows").into_record().unwrap();
        let value = serde_json::to_value(ArtifactRow::from(record)).unwrap();
        assert_eq!(value["run_id"], "run_1");
        assert_eq!(value["agent_type"], "data");
        assert!(value.get("saved_at").is_some());
        assert!(value.get("id").is_none());
    }
}
