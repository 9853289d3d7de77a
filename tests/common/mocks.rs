//! Mock implementations shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use axon::agents::AgentDeps;
use axon::llm::{LLMClient, TextStream};
use axon::tools::{ToolOrchestrator, ToolRegistry};
use axon::types::{AppError, Result};
use axon::utils::toml_config::AxonConfig;
use futures::stream;
use std::sync::Arc;

/// Mock LLM client with a canned response.
///
/// `stream_with_system` yields the response split on whitespace so tests
/// can observe more than one chunk.
#[derive(Clone)]
pub struct MockLLMClient {
    response: String,
    should_fail: bool,
}

impl MockLLMClient {
    pub fn new(response: &str) -> Self {
        Self {
            response: response.to_string(),
            should_fail: false,
        }
    }

    /// A client whose every call fails with an LLM error.
    pub fn failing() -> Self {
        Self {
            response: String::new(),
            should_fail: true,
        }
    }

    fn reply(&self) -> Result<String> {
        if self.should_fail {
            return Err(AppError::LLM("Mock LLM failure".to_string()));
        }
        Ok(self.response.clone())
    }
}

#[async_trait]
impl LLMClient for MockLLMClient {
    async fn generate(&self, _prompt: &str) -> Result<String> {
        self.reply()
    }

    async fn generate_with_system(&self, _system: &str, _prompt: &str) -> Result<String> {
        self.reply()
    }

    async fn stream_with_system(&self, _system: &str, _prompt: &str) -> Result<TextStream> {
        let text = self.reply()?;
        let chunks: Vec<Result<String>> = text
            .split_inclusive(' ')
            .map(|word| Ok(word.to_string()))
            .collect();
        Ok(Box::new(stream::iter(chunks)))
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }
}

/// A config whose provider keys point at variables no test environment sets,
/// so every agent runs in stub mode and every tool reports a missing key.
pub fn offline_config() -> AxonConfig {
    let mut config = AxonConfig::default();
    config.providers.gemini.api_key_env = "AXON_TEST_UNSET_GEMINI_KEY".to_string();
    config.providers.serpapi.api_key_env = "AXON_TEST_UNSET_SERPAPI_KEY".to_string();
    config.providers.runway.api_key_env = "AXON_TEST_UNSET_RUNWAY_KEY".to_string();
    config.providers.functions.url_env = "AXON_TEST_UNSET_FUNCTIONS_URL".to_string();
    config.tools.daily_quota_env = "AXON_TEST_UNSET_QUOTA".to_string();
    config.backend.base_url_env = "AXON_TEST_UNSET_BACKEND_URL".to_string();
    config
}

/// Agent dependencies backed by the given LLM and an empty tool registry.
pub fn agent_deps(llm: Option<Arc<dyn LLMClient>>) -> AgentDeps {
    AgentDeps {
        llm,
        orchestrator: Arc::new(ToolOrchestrator::new(Arc::new(ToolRegistry::new()))),
        http: reqwest::Client::new(),
        functions_url: None,
    }
}
