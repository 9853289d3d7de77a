//! Research agent: gathers web sources through the `web_search` tool and has
//! Gemini summarize them.

use crate::agents::{input_json, Agent, AgentConfig, AgentDeps, AgentOutput, AgentStream};
use crate::tools::{concatenate, ToolExecution};
use crate::types::{AgentInput, AgentType, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::warn;

const SYSTEM_PROMPT: &str = "You are a meticulous research analyst. Summarize the topic \
    using the provided sources. Structure the answer as: Overview, Key Findings (bulleted), \
    Open Questions. Cite sources by their bracketed number. If the sources are thin, say so.";

pub struct ResearchAgent {
    config: AgentConfig,
    deps: AgentDeps,
}

impl ResearchAgent {
    pub fn new(deps: AgentDeps) -> Self {
        Self {
            config: AgentConfig::builtin(AgentType::Research),
            deps,
        }
    }

    fn stub(input: &AgentInput) -> String {
        format!(
            "Research Agent Output (stub)\n\nInput: {}\n\nResearch findings and analysis...",
            input_json(input)
        )
    }

    fn topic(input: &AgentInput) -> String {
        match input.prompt() {
            "" => input_json(input),
            prompt => prompt.to_string(),
        }
    }

    /// Search results for `topic`, or `None` when search is unavailable
    async fn sources(&self, topic: &str) -> Option<(String, usize)> {
        let sequence = [ToolExecution::new("web_search", json!({ "query": topic }))];
        match self.deps.orchestrator.execute_tool_sequence(&sequence).await {
            Ok(results) if results.iter().all(|r| r.get("error").is_none()) => {
                let count = results
                    .first()
                    .and_then(|r| r.get("results"))
                    .and_then(Value::as_array)
                    .map_or(0, Vec::len);
                Some((concatenate(&results), count))
            }
            Ok(_) => {
                warn!("Web search failed; researching without sources");
                None
            }
            Err(e) => {
                warn!(error = %e, "Web search unavailable; researching without sources");
                None
            }
        }
    }

    async fn research_prompt(&self, input: &AgentInput) -> (String, usize) {
        let topic = Self::topic(input);
        match self.sources(&topic).await {
            Some((context, count)) => (format!("Topic: {}\n\nSources:\n{}", topic, context), count),
            None => (format!("Topic: {}\n\nNo live sources were available.", topic), 0),
        }
    }
}

#[async_trait]
impl Agent for ResearchAgent {
    fn config(&self) -> &AgentConfig {
        &self.config
    }

    async fn run(&self, input: &AgentInput) -> Result<AgentOutput> {
        let Some(llm) = &self.deps.llm else {
            return Ok(AgentOutput::new(Self::stub(input), "stub"));
        };

        let (prompt, source_count) = self.research_prompt(input).await;
        let summary = llm.generate_with_system(SYSTEM_PROMPT, &prompt).await?;

        Ok(AgentOutput::new(summary, "gemini").with_metadata("sources", json!(source_count)))
    }

    async fn stream(&self, input: &AgentInput) -> Result<AgentStream> {
        let Some(llm) = &self.deps.llm else {
            return Ok(AgentStream::single(AgentOutput::new(Self::stub(input), "stub")));
        };

        let (prompt, _) = self.research_prompt(input).await;
        Ok(AgentStream {
            provider: "gemini".to_string(),
            chunks: llm.stream_with_system(SYSTEM_PROMPT, &prompt).await?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{ToolOrchestrator, ToolRegistry};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_stub_embeds_input() {
        let agent = ResearchAgent::new(AgentDeps {
            llm: None,
            orchestrator: Arc::new(ToolOrchestrator::new(Arc::new(ToolRegistry::new()))),
            http: reqwest::Client::new(),
            functions_url: None,
        });

        let output = agent
            .run(&AgentInput::from_prompt("quantum batteries"))
            .await
            .unwrap();
        assert_eq!(output.provider, "stub");
        assert!(output.output.starts_with("Research Agent Output (stub)"));
        assert!(output.output.contains("quantum batteries"));
    }

    #[test]
    fn test_topic_falls_back_to_input_json() {
        let input = AgentInput::default().with_field("dataset", json!("sales.csv"));
        assert!(ResearchAgent::topic(&input).contains("sales.csv"));
        assert_eq!(ResearchAgent::topic(&AgentInput::from_prompt(" x ")), "x");
    }
}
