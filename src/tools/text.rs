//! Short text generation through the shared LLM client.

use crate::llm::LLMClient;
use crate::tools::registry::Tool;
use crate::types::{AppError, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;

const DEFAULT_MAX_LENGTH: usize = 500;

pub struct NanoBananaTool {
    llm: Option<Arc<dyn LLMClient>>,
}

impl NanoBananaTool {
    pub fn new(llm: Option<Arc<dyn LLMClient>>) -> Self {
        Self { llm }
    }
}

/// Cut `text` to at most `max` characters
fn truncate_chars(text: &str, max: usize) -> (String, bool) {
    match text.char_indices().nth(max) {
        Some((idx, _)) => (text[..idx].to_string(), true),
        None => (text.to_string(), false),
    }
}

#[async_trait]
impl Tool for NanoBananaTool {
    fn name(&self) -> &str {
        "nano_banana_llm"
    }

    fn description(&self) -> &str {
        "Generate text content using lightweight LLM"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "prompt": { "type": "string" },
                "maxLength": {
                    "type": "integer",
                    "description": "Maximum characters returned",
                    "default": DEFAULT_MAX_LENGTH
                }
            },
            "required": ["prompt"]
        })
    }

    async fn execute(&self, args: Value) -> Result<Value> {
        let started = Instant::now();
        let prompt = args
            .get("prompt")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .ok_or_else(|| AppError::InvalidInput("Prompt is required.".to_string()))?;
        let max_length = args
            .get("maxLength")
            .and_then(Value::as_u64)
            .map(|n| n as usize)
            .unwrap_or(DEFAULT_MAX_LENGTH);

        let llm = self.llm.as_ref().ok_or_else(|| {
            AppError::Configuration("Gemini API key not configured on server".to_string())
        })?;

        let generated = llm
            .generate_with_system(
                &format!(
                    "Answer concisely in at most {} characters. Plain text only.",
                    max_length
                ),
                prompt,
            )
            .await?;
        let (text, truncated) = truncate_chars(generated.trim(), max_length);

        Ok(json!({
            "text": text,
            "truncated": truncated,
            "model": llm.model_name(),
            "executionTime": started.elapsed().as_millis() as u64,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("hello", 10), ("hello".to_string(), false));
        assert_eq!(truncate_chars("hello", 3), ("hel".to_string(), true));
        // multi-byte characters are counted as one
        assert_eq!(truncate_chars("héllo", 2), ("hé".to_string(), true));
    }

    #[tokio::test]
    async fn test_requires_llm() {
        let tool = NanoBananaTool::new(None);
        let err = tool.execute(json!({ "prompt": "hi" })).await.unwrap_err();
        assert!(matches!(err, AppError::Configuration(_)));
    }
}
