use crate::cache::ToolCache;
use crate::llm::{GeminiClient, LLMClient};
use crate::tools::quota::{QuotaReservation, ToolQuota};
use crate::types::{AppError, Result, ToolDefinition};
use crate::utils::toml_config::AxonConfig;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn parameters_schema(&self) -> Value;
    async fn execute(&self, args: Value) -> Result<Value>;
}

pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
    quota: Option<Arc<ToolQuota>>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
            quota: None,
        }
    }

    /// Create a registry with the built-in tools wired from configuration
    /// (web search, video, image and short-text generation).
    pub fn from_config(
        config: &AxonConfig,
        cache: Arc<ToolCache>,
        llm: Option<Arc<dyn LLMClient>>,
    ) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.tools.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        let mut registry = Self::new();

        let serp = &config.providers.serpapi;
        registry.register(Arc::new(
            crate::tools::search::WebSearchTool::new(
                http.clone(),
                serp.base_url.clone(),
                config.serpapi_api_key(),
                cache,
            )
            .with_engine(serp.engine.clone())
            .with_key_env(serp.api_key_env.clone())
            .with_ttl(config.cache_ttl()),
        ));

        let runway = &config.providers.runway;
        registry.register(Arc::new(
            crate::tools::media::Veo3VideoTool::new(
                http,
                runway.base_url.clone(),
                config.runway_api_key(),
            )
            .with_key_env(runway.api_key_env.clone()),
        ));

        let gemini = &config.providers.gemini;
        let vision_client = config.gemini_api_key().map(|key| {
            GeminiClient::new(key, gemini.base_url.clone(), gemini.image_model.clone())
        });
        registry.register(Arc::new(crate::tools::media::GeminiVisionTool::new(
            vision_client,
        )));

        registry.register(Arc::new(crate::tools::text::NanoBananaTool::new(llm)));

        registry
    }

    /// Enforce a daily per-tool quota on `execute`
    pub fn with_quota(mut self, quota: Arc<ToolQuota>) -> Self {
        self.quota = Some(quota);
        self
    }

    pub fn quota(&self) -> Option<&Arc<ToolQuota>> {
        self.quota.as_ref()
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    /// Tool definitions sorted by name
    pub fn get_tool_definitions(&self) -> Vec<ToolDefinition> {
        let mut definitions: Vec<ToolDefinition> = self
            .tools
            .values()
            .map(|tool| ToolDefinition {
                name: tool.name().to_string(),
                description: tool.description().to_string(),
                parameters: tool.parameters_schema(),
            })
            .collect();
        definitions.sort_by(|a, b| a.name.cmp(&b.name));
        definitions
    }

    /// Run a tool by name. A quota slot is reserved before the call and
    /// handed back if the call fails or is cancelled, so only successful
    /// calls count.
    pub async fn execute(&self, name: &str, args: Value) -> Result<Value> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| AppError::NotFound(format!("Tool '{}' not found.", name)))?;

        let Some(quota) = &self.quota else {
            return tool.execute(args).await;
        };

        let mut slot = QuotaSlot {
            quota,
            tool: name,
            reservation: Some(quota.try_acquire(name)?),
        };
        let result = tool.execute(args).await;
        if result.is_ok() {
            slot.reservation = None;
        }
        result
    }

    /// Get a list of all registered tool names
    pub fn tool_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }

    /// Check if a tool is registered
    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }
}

/// Returns an uncommitted reservation on drop
struct QuotaSlot<'a> {
    quota: &'a ToolQuota,
    tool: &'a str,
    reservation: Option<QuotaReservation>,
}

impl Drop for QuotaSlot<'_> {
    fn drop(&mut self) {
        if let Some(reservation) = self.reservation.take() {
            self.quota.release(self.tool, reservation);
        }
    }
}
