//! Sequential tool orchestration
//!
//! Runs a fixed list of tool calls one after another. There is no
//! parallelism: each step starts only after the previous one finished. A
//! failing step is recorded as an error object and does not stop the rest.

use crate::tools::registry::ToolRegistry;
use crate::types::{AppError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, info};
use utoipa::ToSchema;

/// One step of a tool sequence
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ToolExecution {
    pub tool_name: String,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub parameters: Value,
}

impl ToolExecution {
    pub fn new(tool_name: impl Into<String>, parameters: Value) -> Self {
        Self {
            tool_name: tool_name.into(),
            parameters,
        }
    }
}

/// Which optional media steps the content sequence includes
#[derive(Debug, Clone, Default)]
pub struct ContentSequenceOptions {
    pub include_image: bool,
    pub include_video: bool,
    pub image_style: Option<String>,
}

pub struct ToolOrchestrator {
    registry: Arc<ToolRegistry>,
}

impl ToolOrchestrator {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    /// Execute `sequence` strictly in order.
    ///
    /// An unknown tool aborts with `NotFound` before that step runs; results
    /// of earlier steps are discarded. A step whose tool fails contributes
    /// `{"error": "Failed to execute tool '<name>'"}`.
    pub async fn execute_tool_sequence(&self, sequence: &[ToolExecution]) -> Result<Vec<Value>> {
        let mut results = Vec::with_capacity(sequence.len());

        for (step, execution) in sequence.iter().enumerate() {
            let name = execution.tool_name.as_str();
            if !self.registry.has_tool(name) {
                return Err(AppError::NotFound(format!("Tool '{}' not found.", name)));
            }

            info!(step, tool = %name, "Executing tool");
            match self.registry.execute(name, execution.parameters.clone()).await {
                Ok(result) => results.push(result),
                Err(e) => {
                    error!(step, tool = %name, error = %e, "Error executing tool");
                    results.push(json!({ "error": format!("Failed to execute tool '{}'", name) }));
                }
            }
        }

        Ok(results)
    }

    /// The content agent's fixed sequence: search first, then optional media
    pub fn content_sequence(prompt: &str, options: &ContentSequenceOptions) -> Vec<ToolExecution> {
        let mut sequence = vec![ToolExecution::new("web_search", json!({ "query": prompt }))];

        if options.include_image {
            let mut params = json!({ "prompt": prompt });
            if let Some(style) = &options.image_style {
                params["style"] = json!(style);
            }
            sequence.push(ToolExecution::new("gemini_vision", params));
        }

        if options.include_video {
            sequence.push(ToolExecution::new(
                "veo3_video",
                json!({ "prompt": prompt, "duration": 10 }),
            ));
        }

        sequence
    }
}

/// Render tool results as one text block for use as LLM context
pub fn concatenate(results: &[Value]) -> String {
    results
        .iter()
        .enumerate()
        .map(|(i, result)| format!("[{}] {}", i + 1, render_result(result)))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn render_result(result: &Value) -> String {
    if let Some(err) = result.get("error").and_then(Value::as_str) {
        return format!("Error: {}", err);
    }

    if let Some(items) = result.get("results").and_then(Value::as_array) {
        let lines: Vec<String> = items
            .iter()
            .map(|item| {
                let get = |k: &str| item.get(k).and_then(Value::as_str).unwrap_or_default();
                format!("- {} ({}): {}", get("title"), get("link"), get("snippet"))
            })
            .collect();
        return if lines.is_empty() {
            "Search results: none".to_string()
        } else {
            format!("Search results:\n{}", lines.join("\n"))
        };
    }

    if let Some(images) = result.get("images").and_then(Value::as_array) {
        return format!("Generated {} image(s)", images.len());
    }

    if let Some(url) = result.get("videoUrl").and_then(Value::as_str) {
        return format!("Generated video: {}", url);
    }

    if let Some(text) = result.get("text").and_then(Value::as_str) {
        return text.to_string();
    }

    result.to_string()
}
