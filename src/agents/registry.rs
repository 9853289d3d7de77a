//! Agent Registry
//!
//! A static table mapping each [`AgentType`] to its configuration and
//! implementation. Running an agent through the registry enforces the
//! configured concurrency limit, timeout and retry count, and always yields
//! an [`AgentResult`]; failures are reported in the result, never as `Err`.
//!
//! ## Configuration Precedence
//!
//! Each lookup starts from the agent's built-in configuration and applies
//! the current `[agents.<type>]` overrides from `axon.toml`, so hot-reloaded
//! changes to `enabled`, timeouts, retries and dependencies apply to the
//! next run. Concurrency limits are fixed when the registry is built.

use crate::agents::code::CodeAgent;
use crate::agents::content::ContentAgent;
use crate::agents::research::ResearchAgent;
use crate::agents::specialist::SpecialistAgent;
use crate::agents::{Agent, AgentConfig, AgentDeps, AgentStream};
use crate::types::{AgentInput, AgentResult, AgentType, AppError, Result};
use crate::utils::toml_config::AxonConfigManager;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{info, warn};
use utoipa::ToSchema;

/// One registry row
#[derive(Clone)]
pub struct AgentEntry {
    pub config: AgentConfig,
    pub agent: Arc<dyn Agent>,
    permits: Arc<Semaphore>,
}

/// Result of checking an agent's dependencies
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct DependencyCheck {
    pub available: bool,
    pub missing: Vec<AgentType>,
}

/// Registry for agent configurations and instances
pub struct AgentRegistry {
    entries: HashMap<AgentType, AgentEntry>,
    config_manager: Option<Arc<AxonConfigManager>>,
}

impl AgentRegistry {
    pub fn builder() -> AgentRegistryBuilder {
        AgentRegistryBuilder::new()
    }

    fn effective_config(&self, base: &AgentConfig) -> AgentConfig {
        match &self.config_manager {
            Some(manager) => {
                let config = manager.config();
                match config.get_agent(base.agent_type.as_str()) {
                    Some(o) => base.clone().with_override(o),
                    None => base.clone(),
                }
            }
            None => base.clone(),
        }
    }

    /// Enabled agents in display order (content, code, research, design, data)
    pub fn available_agents(&self) -> Vec<AgentConfig> {
        AgentType::ALL
            .iter()
            .filter_map(|t| self.get_config(*t))
            .filter(|c| c.enabled)
            .collect()
    }

    /// Effective configuration for `agent_type`
    pub fn get_config(&self, agent_type: AgentType) -> Option<AgentConfig> {
        self.entries
            .get(&agent_type)
            .map(|e| self.effective_config(&e.config))
    }

    /// Registry entry with its effective configuration
    pub fn get_entry(&self, agent_type: AgentType) -> Option<AgentEntry> {
        self.entries.get(&agent_type).map(|e| AgentEntry {
            config: self.effective_config(&e.config),
            agent: Arc::clone(&e.agent),
            permits: Arc::clone(&e.permits),
        })
    }

    pub async fn is_healthy(&self, agent_type: AgentType) -> bool {
        match self.entries.get(&agent_type) {
            Some(entry) => entry.agent.health_check().await,
            None => false,
        }
    }

    /// Enabled agents whose health check passes
    pub async fn healthy_agents(&self) -> Vec<AgentConfig> {
        let mut healthy = Vec::new();
        for config in self.available_agents() {
            if self.is_healthy(config.agent_type).await {
                healthy.push(config);
            }
        }
        healthy
    }

    pub fn dependencies(&self, agent_type: AgentType) -> Vec<AgentType> {
        self.get_config(agent_type)
            .map(|c| c.dependencies)
            .unwrap_or_default()
    }

    /// Dependencies that are not currently healthy
    pub async fn check_dependencies(&self, agent_type: AgentType) -> DependencyCheck {
        let mut missing = Vec::new();
        for dep in self.dependencies(agent_type) {
            if !self.is_healthy(dep).await {
                missing.push(dep);
            }
        }
        DependencyCheck {
            available: missing.is_empty(),
            missing,
        }
    }

    pub async fn run_agent(&self, agent_type: AgentType, input: &AgentInput) -> AgentResult {
        self.run_agent_with_timeout(agent_type, input, None).await
    }

    /// Run an agent, optionally overriding its configured timeout.
    ///
    /// Error codes: `AGENT_NOT_FOUND`, `AGENT_DISABLED`, `AGENT_BUSY`,
    /// `TIMEOUT`, and the agent's own execution code (`EXECUTION_ERROR`
    /// unless the agent reports a more specific one).
    pub async fn run_agent_with_timeout(
        &self,
        agent_type: AgentType,
        input: &AgentInput,
        timeout_ms: Option<u64>,
    ) -> AgentResult {
        let started = Instant::now();
        let elapsed = |started: Instant| started.elapsed().as_millis() as u64;

        let (entry, _permit) = match self.admit(agent_type) {
            Ok(admitted) => admitted,
            Err(rejected) => return rejected,
        };

        let timeout = Duration::from_millis(timeout_ms.unwrap_or(entry.config.timeout_ms));
        let attempts = entry.config.retry_attempts.saturating_add(1);
        let mut last_error = AppError::Internal("Agent did not run".to_string());

        for attempt in 1..=attempts {
            match tokio::time::timeout(timeout, entry.agent.run(input)).await {
                Ok(Ok(output)) => {
                    info!(
                        agent = %agent_type,
                        attempt,
                        provider = %output.provider,
                        elapsed_ms = elapsed(started),
                        "Agent run completed"
                    );
                    let mut result = AgentResult::success(
                        agent_type,
                        output.output,
                        output.provider,
                        elapsed(started),
                    );
                    if let AgentResult::Success(success) = &mut result {
                        success.artifacts = output.artifacts;
                        success.metadata = output.metadata;
                    }
                    return result;
                }
                Ok(Err(e)) => {
                    warn!(agent = %agent_type, attempt, error = %e, "Agent run failed");
                    let retryable = !matches!(
                        e,
                        AppError::InvalidInput(_) | AppError::Configuration(_)
                    );
                    last_error = e;
                    if !retryable {
                        break;
                    }
                }
                Err(_) => {
                    warn!(agent = %agent_type, attempt, timeout_ms = timeout.as_millis() as u64, "Agent run timed out");
                    return AgentResult::failure(
                        agent_type,
                        format!(
                            "Agent type '{}' timed out after {}ms",
                            agent_type,
                            timeout.as_millis()
                        ),
                        Some("TIMEOUT"),
                        elapsed(started),
                    );
                }
            }
        }

        AgentResult::failure(
            agent_type,
            last_error.message(),
            Some(entry.agent.error_code()),
            elapsed(started),
        )
    }

    /// Stream an agent's output. The concurrency permit is held until the
    /// stream is dropped.
    pub async fn stream_agent(
        &self,
        agent_type: AgentType,
        input: &AgentInput,
    ) -> std::result::Result<AgentStream, AgentResult> {
        let started = Instant::now();
        let (entry, permit) = self.admit(agent_type)?;
        let timeout = Duration::from_millis(entry.config.timeout_ms);

        let stream = match tokio::time::timeout(timeout, entry.agent.stream(input)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                return Err(AgentResult::failure(
                    agent_type,
                    e.message(),
                    Some(entry.agent.error_code()),
                    started.elapsed().as_millis() as u64,
                ))
            }
            Err(_) => {
                return Err(AgentResult::failure(
                    agent_type,
                    format!("Agent type '{}' timed out after {}ms", agent_type, timeout.as_millis()),
                    Some("TIMEOUT"),
                    started.elapsed().as_millis() as u64,
                ))
            }
        };

        let mut inner = stream.chunks;
        let chunks = async_stream::stream! {
            let _permit = permit;
            while let Some(chunk) = inner.next().await {
                yield chunk;
            }
        };

        Ok(AgentStream {
            provider: stream.provider,
            chunks: Box::new(Box::pin(chunks)),
        })
    }

    /// Look up, check enabled and take a concurrency permit
    #[allow(clippy::result_large_err)]
    fn admit(
        &self,
        agent_type: AgentType,
    ) -> std::result::Result<(AgentEntry, OwnedSemaphorePermit), AgentResult> {
        let Some(entry) = self.get_entry(agent_type) else {
            return Err(AgentResult::failure(
                agent_type,
                format!("Agent type '{}' not found", agent_type),
                Some("AGENT_NOT_FOUND"),
                0,
            ));
        };

        if !entry.config.enabled {
            return Err(AgentResult::failure(
                agent_type,
                format!("Agent type '{}' is disabled", agent_type),
                Some("AGENT_DISABLED"),
                0,
            ));
        }

        match Arc::clone(&entry.permits).try_acquire_owned() {
            Ok(permit) => Ok((entry, permit)),
            Err(_) => Err(AgentResult::failure(
                agent_type,
                format!(
                    "Agent type '{}' is at its concurrency limit ({})",
                    agent_type, entry.config.max_concurrent_runs
                ),
                Some("AGENT_BUSY"),
                0,
            )),
        }
    }

    pub fn agent_types(&self) -> Vec<AgentType> {
        AgentType::ALL
            .into_iter()
            .filter(|t| self.entries.contains_key(t))
            .collect()
    }
}

/// Builder for creating AgentRegistry with fluent API
pub struct AgentRegistryBuilder {
    agents: Vec<Arc<dyn Agent>>,
    config_manager: Option<Arc<AxonConfigManager>>,
}

impl AgentRegistryBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self {
            agents: Vec::new(),
            config_manager: None,
        }
    }

    /// Register the five built-in agents
    pub fn with_builtin_agents(self, deps: &AgentDeps) -> Self {
        self.with_agent(Arc::new(ContentAgent::new(deps.clone())))
            .with_agent(Arc::new(CodeAgent::new(deps)))
            .with_agent(Arc::new(ResearchAgent::new(deps.clone())))
            .with_agent(Arc::new(SpecialistAgent::design(deps)))
            .with_agent(Arc::new(SpecialistAgent::data(deps)))
    }

    /// Add (or replace) an agent
    pub fn with_agent(mut self, agent: Arc<dyn Agent>) -> Self {
        self.agents
            .retain(|a| a.agent_type() != agent.agent_type());
        self.agents.push(agent);
        self
    }

    /// Apply `[agents.*]` overrides from the live configuration
    pub fn with_config_manager(mut self, manager: Arc<AxonConfigManager>) -> Self {
        self.config_manager = Some(manager);
        self
    }

    /// Build the AgentRegistry
    pub fn build(self) -> Result<AgentRegistry> {
        if self.agents.is_empty() {
            return Err(AppError::Configuration(
                "AgentRegistry requires at least one agent".into(),
            ));
        }

        let mut registry = AgentRegistry {
            entries: HashMap::new(),
            config_manager: self.config_manager,
        };

        for agent in self.agents {
            let base = agent.config().clone();
            let limit = registry.effective_config(&base).max_concurrent_runs.max(1);
            registry.entries.insert(
                base.agent_type,
                AgentEntry {
                    config: base,
                    agent,
                    permits: Arc::new(Semaphore::new(limit)),
                },
            );
        }

        Ok(registry)
    }
}

impl Default for AgentRegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}
