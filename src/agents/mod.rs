//! Agents
//!
//! An agent turns an [`AgentInput`] into generated text. Each built-in agent
//! uses Gemini when a key is configured and otherwise produces a stub draft,
//! so the dashboard stays usable without credentials.
//!
//! - [`registry`] - Static `AgentType -> agent` table with limits and retries
//! - [`bridge`] - Request dispatch and run history
//! - [`content`], [`code`], [`research`], [`specialist`] - The agents

pub mod bridge;
pub mod code;
pub mod content;
pub mod registry;
pub mod research;
pub mod specialist;

use crate::llm::{LLMClient, TextStream};
use crate::tools::ToolOrchestrator;
use crate::types::{AgentArtifact, AgentInput, AgentType, Result};
use crate::utils::toml_config::AgentOverride;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use utoipa::ToSchema;

pub use bridge::{AgentBridge, RunGuard, RunLog};
pub use registry::{AgentEntry, AgentRegistry, AgentRegistryBuilder, DependencyCheck};

// ============= Agent Configuration =============

/// Static description and limits of one agent
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AgentConfig {
    #[serde(rename = "type")]
    pub agent_type: AgentType,
    pub name: String,
    pub description: String,
    pub version: String,
    pub enabled: bool,
    pub max_concurrent_runs: usize,
    pub timeout_ms: u64,
    pub retry_attempts: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<AgentType>,
}

impl AgentConfig {
    /// Built-in defaults for each agent type
    pub fn builtin(agent_type: AgentType) -> Self {
        let (name, description, max_concurrent_runs, timeout_ms, retry_attempts, dependencies) =
            match agent_type {
                AgentType::Content => (
                    "Content Agent",
                    "Generates high-quality content using AI (Gemini)",
                    5,
                    30_000,
                    2,
                    vec![],
                ),
                AgentType::Code => (
                    "Code Agent",
                    "Generates and analyzes code",
                    3,
                    60_000,
                    1,
                    vec![AgentType::Content],
                ),
                AgentType::Research => (
                    "Research Agent",
                    "Researches a topic from live web sources and summarizes findings",
                    2,
                    120_000,
                    1,
                    vec![],
                ),
                AgentType::Design => (
                    "Design Agent",
                    "Creates UI/UX design concepts and specifications",
                    3,
                    45_000,
                    2,
                    vec![],
                ),
                AgentType::Data => (
                    "Data Agent",
                    "Analyzes and processes data to produce insights",
                    4,
                    90_000,
                    1,
                    vec![AgentType::Research],
                ),
            };

        Self {
            agent_type,
            name: name.to_string(),
            description: description.to_string(),
            version: "1.0.0".to_string(),
            enabled: true,
            max_concurrent_runs,
            timeout_ms,
            retry_attempts,
            dependencies,
        }
    }

    /// Apply `[agents.<type>]` overrides from `axon.toml`
    pub fn with_override(mut self, o: &AgentOverride) -> Self {
        if let Some(enabled) = o.enabled {
            self.enabled = enabled;
        }
        if let Some(timeout_ms) = o.timeout_ms {
            self.timeout_ms = timeout_ms;
        }
        if let Some(retry_attempts) = o.retry_attempts {
            self.retry_attempts = retry_attempts;
        }
        if let Some(max) = o.max_concurrent_runs {
            self.max_concurrent_runs = max.max(1);
        }
        if let Some(deps) = &o.dependencies {
            self.dependencies = deps.iter().filter_map(|d| d.parse().ok()).collect();
        }
        if let Some(description) = &o.description {
            self.description = description.clone();
        }
        self
    }
}

// ============= Agent Output =============

/// What an agent produced, before the registry stamps timing onto it
#[derive(Debug, Clone, Default)]
pub struct AgentOutput {
    pub output: String,
    pub provider: String,
    pub artifacts: Vec<AgentArtifact>,
    pub metadata: Option<Map<String, Value>>,
}

impl AgentOutput {
    pub fn new(output: impl Into<String>, provider: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            provider: provider.into(),
            ..Default::default()
        }
    }

    pub fn with_metadata(mut self, key: &str, value: Value) -> Self {
        self.metadata
            .get_or_insert_with(Map::new)
            .insert(key.to_string(), value);
        self
    }

    pub fn with_artifact(mut self, artifact: AgentArtifact) -> Self {
        self.artifacts.push(artifact);
        self
    }
}

/// A streamed run: the provider label plus text deltas
pub struct AgentStream {
    pub provider: String,
    pub chunks: TextStream,
}

impl AgentStream {
    /// A stream yielding one complete chunk
    pub fn single(output: AgentOutput) -> Self {
        Self {
            provider: output.provider,
            chunks: Box::new(futures::stream::iter(vec![Ok(output.output)])),
        }
    }
}

// ============= Agent Trait =============

/// Base trait for all agents
#[async_trait]
pub trait Agent: Send + Sync {
    /// Built-in configuration (before overrides)
    fn config(&self) -> &AgentConfig;

    fn agent_type(&self) -> AgentType {
        self.config().agent_type
    }

    /// Produce output for `input`
    async fn run(&self, input: &AgentInput) -> Result<AgentOutput>;

    /// Stream output for `input`. Agents without a streaming backend
    /// yield their whole output as one chunk.
    async fn stream(&self, input: &AgentInput) -> Result<AgentStream> {
        Ok(AgentStream::single(self.run(input).await?))
    }

    async fn health_check(&self) -> bool {
        true
    }

    /// Error code reported when `run` fails after all retries
    fn error_code(&self) -> &'static str {
        "EXECUTION_ERROR"
    }
}

// ============= Shared Dependencies =============

/// Collaborators the built-in agents are constructed with
#[derive(Clone)]
pub struct AgentDeps {
    /// `None` puts Gemini-backed agents in stub mode
    pub llm: Option<Arc<dyn LLMClient>>,
    pub orchestrator: Arc<ToolOrchestrator>,
    pub http: reqwest::Client,
    /// Upstream content function (FUNCTIONS_BASE_URL)
    pub functions_url: Option<String>,
}

/// Serialized input embedded in stub drafts
pub(crate) fn input_json(input: &AgentInput) -> String {
    serde_json::to_string(input).unwrap_or_else(|_| "{}".to_string())
}
