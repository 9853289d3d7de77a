//! Content agent
//!
//! Backend precedence: the upstream content function when configured, then
//! Gemini (optionally grounded by the tool orchestrator), then a stub draft.

use crate::agents::{Agent, AgentConfig, AgentDeps, AgentOutput, AgentStream};
use crate::tools::{concatenate, ContentSequenceOptions, ToolOrchestrator};
use crate::types::{AgentArtifact, AgentInput, AgentType, AppError, ArtifactKind, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, warn};

pub struct ContentAgent {
    config: AgentConfig,
    deps: AgentDeps,
}

/// Normalized content request
struct ContentRequest<'a> {
    prompt: &'a str,
    tone: &'a str,
    length: &'a str,
    use_tools: bool,
    options: ContentSequenceOptions,
}

impl<'a> ContentRequest<'a> {
    fn parse(input: &'a AgentInput) -> Result<Self> {
        let prompt = input.prompt();
        if prompt.is_empty() {
            return Err(AppError::InvalidInput("Prompt is required".to_string()));
        }
        Ok(Self {
            prompt,
            tone: input.str_field("tone").unwrap_or("neutral"),
            length: input.str_field("length").unwrap_or("medium"),
            use_tools: input.bool_field("useTools"),
            options: ContentSequenceOptions {
                include_image: input.bool_field("includeImage"),
                include_video: input.bool_field("includeVideo"),
                image_style: input.str_field("imageStyle").map(str::to_string),
            },
        })
    }

    fn system_prompt(&self) -> String {
        let words = match self.length {
            "short" => "about 150 words",
            "long" => "about 800 words",
            _ => "about 400 words",
        };
        format!(
            "You are Axon's content agent. Write polished, well-structured content in a {} tone, \
             {} long. Open with a short intro, cover the key points, and close with a call to action.",
            self.tone, words
        )
    }

    fn stub(&self) -> String {
        format!(
            "AXON Content Draft (stub)\n\nPrompt: {}\nTone: {}\nLength: {}\n\n- Intro paragraph...\n- 3 key points...\n- CTA...",
            self.prompt, self.tone, self.length
        )
    }
}

impl ContentAgent {
    pub fn new(deps: AgentDeps) -> Self {
        Self {
            config: AgentConfig::builtin(AgentType::Content),
            deps,
        }
    }

    async fn run_upstream(&self, url: &str, input: &AgentInput) -> Result<AgentOutput> {
        let response = self.deps.http.post(url).json(input).send().await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream(format!(
                "Upstream error {}: {}",
                status.as_u16(),
                text
            )));
        }

        let data: Value = response.json().await.unwrap_or_else(|_| json!({}));
        let non_empty = |key: &str| {
            data.get(key)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        let output = non_empty("output")
            .or_else(|| non_empty("content"))
            .unwrap_or_else(|| data.to_string());

        Ok(AgentOutput::new(output, "upstream"))
    }

    /// Run the tool sequence and fold its results into the prompt.
    /// Returns the grounded prompt and any media artifacts produced.
    async fn ground(&self, request: &ContentRequest<'_>) -> Result<(String, Vec<AgentArtifact>, Vec<String>)> {
        let sequence = ToolOrchestrator::content_sequence(request.prompt, &request.options);
        let tools: Vec<String> = sequence.iter().map(|s| s.tool_name.clone()).collect();
        let results = self.deps.orchestrator.execute_tool_sequence(&sequence).await?;

        let artifacts = media_artifacts(&results);
        let prompt = format!(
            "{}\n\nUse the following research context where relevant:\n{}",
            request.prompt,
            concatenate(&results)
        );
        debug!(tools = ?tools, artifacts = artifacts.len(), "Content grounded with tools");
        Ok((prompt, artifacts, tools))
    }
}

/// Images and videos returned by the media tools, as run artifacts
fn media_artifacts(results: &[Value]) -> Vec<AgentArtifact> {
    let mut artifacts = Vec::new();

    for result in results {
        for (i, image) in result
            .get("images")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .enumerate()
        {
            let data = image.get("data").and_then(Value::as_str).unwrap_or_default();
            artifacts.push(AgentArtifact {
                id: uuid::Uuid::new_v4().to_string(),
                kind: ArtifactKind::Image,
                name: format!("image-{}", i + 1),
                content: data.to_string(),
                mime_type: image.get("mimeType").and_then(Value::as_str).map(str::to_string),
                size: Some(data.len() as u64),
                metadata: None,
            });
        }

        if let Some(url) = result.get("videoUrl").and_then(Value::as_str) {
            artifacts.push(AgentArtifact {
                id: uuid::Uuid::new_v4().to_string(),
                kind: ArtifactKind::File,
                name: "video".to_string(),
                content: url.to_string(),
                mime_type: Some("video/mp4".to_string()),
                size: None,
                metadata: None,
            });
        }
    }

    artifacts
}

#[async_trait]
impl Agent for ContentAgent {
    fn config(&self) -> &AgentConfig {
        &self.config
    }

    async fn run(&self, input: &AgentInput) -> Result<AgentOutput> {
        let request = ContentRequest::parse(input)?;

        if let Some(url) = &self.deps.functions_url {
            return self.run_upstream(url, input).await;
        }

        let Some(llm) = &self.deps.llm else {
            return Ok(AgentOutput::new(request.stub(), "stub"));
        };

        let (prompt, artifacts, tools) = if request.use_tools {
            self.ground(&request).await?
        } else {
            (request.prompt.to_string(), Vec::new(), Vec::new())
        };

        let text = llm.generate_with_system(&request.system_prompt(), &prompt).await?;

        let mut output = AgentOutput::new(text, "gemini")
            .with_metadata("tone", json!(request.tone))
            .with_metadata("length", json!(request.length));
        if !tools.is_empty() {
            output = output.with_metadata("toolsUsed", json!(tools));
        }
        output.artifacts = artifacts;
        Ok(output)
    }

    async fn stream(&self, input: &AgentInput) -> Result<AgentStream> {
        let request = ContentRequest::parse(input)?;

        match (&self.deps.functions_url, &self.deps.llm) {
            (None, Some(llm)) => {
                let prompt = if request.use_tools {
                    self.ground(&request).await?.0
                } else {
                    request.prompt.to_string()
                };
                Ok(AgentStream {
                    provider: "gemini".to_string(),
                    chunks: llm.stream_with_system(&request.system_prompt(), &prompt).await?,
                })
            }
            _ => Ok(AgentStream::single(self.run(input).await?)),
        }
    }

    async fn health_check(&self) -> bool {
        let Some(url) = &self.deps.functions_url else {
            // Stub and Gemini modes are always healthy
            return true;
        };

        match self.deps.http.head(url).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                warn!(error = %e, "Content upstream health check failed");
                false
            }
        }
    }

    fn error_code(&self) -> &'static str {
        "CONTENT_AGENT_ERROR"
    }
}
