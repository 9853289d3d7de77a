//! LLM client abstraction and provider selection
//!
//! Agents and tools depend on [`LLMClient`] only. The concrete client is
//! chosen once at startup by [`LLMClientFactory`]; when no provider key is
//! configured the factory yields `None` and callers fall back to stub output.

use crate::types::Result;
use crate::utils::toml_config::AxonConfig;
use async_trait::async_trait;
use std::sync::Arc;

/// Boxed stream of text deltas
pub type TextStream = Box<dyn futures::Stream<Item = Result<String>> + Send + Unpin>;

/// Generic LLM client trait for provider abstraction
#[async_trait]
pub trait LLMClient: Send + Sync {
    /// Generate a completion from a prompt
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Generate with system prompt
    async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String>;

    /// Stream a completion with a system prompt
    async fn stream_with_system(&self, system: &str, prompt: &str) -> Result<TextStream>;

    /// Get the model name/identifier
    fn model_name(&self) -> &str;
}

/// Provider enum for runtime selection
#[derive(Debug, Clone)]
pub enum Provider {
    /// Google Gemini via the Generative Language REST API
    ///
    /// # Example
    /// ```rust,ignore
    /// let provider = Provider::Gemini {
    ///     api_key: "AIza...".to_string(),
    ///     base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
    ///     model: "gemini-1.5-flash".to_string(),
    /// };
    /// ```
    Gemini {
        api_key: String,
        base_url: String,
        model: String,
    },
}

impl Provider {
    /// Create a client instance for this provider
    pub fn create_client(&self) -> Box<dyn LLMClient> {
        match self {
            Provider::Gemini {
                api_key,
                base_url,
                model,
            } => Box::new(super::gemini::GeminiClient::new(
                api_key.clone(),
                base_url.clone(),
                model.clone(),
            )),
        }
    }

    /// Get a human-readable name for this provider
    pub fn name(&self) -> &'static str {
        match self {
            Provider::Gemini { .. } => "Gemini",
        }
    }
}

/// Builds the shared LLM client from configuration
#[derive(Debug, Clone, Default)]
pub struct LLMClientFactory {
    provider: Option<Provider>,
    temperature: Option<f32>,
    max_output_tokens: Option<u32>,
}

impl LLMClientFactory {
    pub fn new(provider: Provider) -> Self {
        Self {
            provider: Some(provider),
            temperature: None,
            max_output_tokens: None,
        }
    }

    /// Resolve the Gemini key from the environment; no key means stub mode
    pub fn from_config(config: &AxonConfig) -> Self {
        let gemini = &config.providers.gemini;
        Self {
            provider: config.gemini_api_key().map(|api_key| Provider::Gemini {
                api_key,
                base_url: gemini.base_url.clone(),
                model: gemini.model.clone(),
            }),
            temperature: Some(gemini.temperature),
            max_output_tokens: Some(gemini.max_output_tokens),
        }
    }

    pub fn provider(&self) -> Option<&Provider> {
        self.provider.as_ref()
    }

    pub fn is_configured(&self) -> bool {
        self.provider.is_some()
    }

    /// The configured client, or `None` in stub mode
    pub fn create(&self) -> Option<Arc<dyn LLMClient>> {
        let provider = self.provider.as_ref()?;
        let client: Arc<dyn LLMClient> = match provider {
            Provider::Gemini {
                api_key,
                base_url,
                model,
            } => {
                let mut client =
                    super::gemini::GeminiClient::new(api_key.clone(), base_url.clone(), model.clone());
                if let (Some(t), Some(m)) = (self.temperature, self.max_output_tokens) {
                    client = client.with_generation_config(t, m);
                }
                Arc::new(client)
            }
        };
        Some(client)
    }
}
