use crate::artifacts::{ArtifactRecord, ArtifactStore, SaveArtifact, SavedArtifact};
use crate::types::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Stores each artifact as a pretty-printed JSON file named
/// `{millis}_{agentType}_{runId}.json`, so name order is save order.
pub struct FileArtifactStore {
    dir: PathBuf,
}

impl FileArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path reported to clients, e.g. `data/artifacts/<name>`
    fn label(&self, name: &str) -> String {
        format!(
            "{}/{}",
            self.dir.to_string_lossy().trim_end_matches('/'),
            name
        )
    }
}

/// Keep file names inside the store directory
fn sanitize(part: &str) -> String {
    part.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect()
}

#[async_trait]
impl ArtifactStore for FileArtifactStore {
    async fn save(&self, artifact: SaveArtifact) -> Result<SavedArtifact> {
        let record = artifact.into_record()?;

        tokio::fs::create_dir_all(&self.dir).await?;

        let name = format!(
            "{}_{}_{}.json",
            Utc::now().timestamp_millis(),
            sanitize(&record.agent_type),
            sanitize(&record.run_id)
        );
        let contents = serde_json::to_string_pretty(&record)?;
        tokio::fs::write(self.dir.join(&name), contents).await?;

        debug!(file = %name, "Artifact saved");
        Ok(SavedArtifact {
            file: Some(self.label(&name)),
            id: None,
        })
    }

    async fn list(&self, limit: usize) -> Result<Vec<ArtifactRecord>> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let mut names = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.ends_with(".json") {
                names.push(name);
            }
        }
        names.sort_unstable_by(|a, b| b.cmp(a));

        let mut items = Vec::new();
        for name in names.into_iter().take(limit) {
            let contents = tokio::fs::read_to_string(self.dir.join(&name)).await?;
            match serde_json::from_str::<ArtifactRecord>(&contents) {
                Ok(mut record) => {
                    record.file = Some(self.label(&name));
                    items.push(record);
                }
                Err(e) => warn!(file = %name, error = %e, "Skipping unreadable artifact"),
            }
        }

        Ok(items)
    }

    fn backend_name(&self) -> &'static str {
        "file"
    }
}
