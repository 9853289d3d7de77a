//! Design and data agents. Both are a role prompt over Gemini with a stub
//! fallback, so they share one implementation.

use crate::agents::{input_json, Agent, AgentConfig, AgentDeps, AgentOutput, AgentStream};
use crate::llm::LLMClient;
use crate::types::{AgentInput, AgentType, Result};
use async_trait::async_trait;
use std::sync::Arc;

pub struct SpecialistAgent {
    config: AgentConfig,
    llm: Option<Arc<dyn LLMClient>>,
    role: &'static str,
    stub_title: &'static str,
    stub_tail: &'static str,
}

impl SpecialistAgent {
    pub fn design(deps: &AgentDeps) -> Self {
        Self {
            config: AgentConfig::builtin(AgentType::Design),
            llm: deps.llm.clone(),
            role: "You are a senior UI/UX designer. Turn the request into a concrete design \
                   proposal: layout, components, color and typography choices, interaction \
                   notes, and accessibility considerations. Use headed sections.",
            stub_title: "Design Agent Output (stub)",
            stub_tail: "UI/UX designs and mockups...",
        }
    }

    pub fn data(deps: &AgentDeps) -> Self {
        Self {
            config: AgentConfig::builtin(AgentType::Data),
            llm: deps.llm.clone(),
            role: "You are a data analyst. Analyze the provided data or question, state your \
                   assumptions, describe the method, and report insights with concrete numbers \
                   where possible. End with recommended next steps.",
            stub_title: "Data Agent Output (stub)",
            stub_tail: "Data analysis and insights...",
        }
    }

    fn stub(&self, input: &AgentInput) -> String {
        format!(
            "{}\n\nInput: {}\n\n{}",
            self.stub_title,
            input_json(input),
            self.stub_tail
        )
    }

    /// The prompt, or the whole input when no prompt was given
    fn request(input: &AgentInput) -> String {
        match input.prompt() {
            "" => input_json(input),
            prompt => prompt.to_string(),
        }
    }
}

#[async_trait]
impl Agent for SpecialistAgent {
    fn config(&self) -> &AgentConfig {
        &self.config
    }

    async fn run(&self, input: &AgentInput) -> Result<AgentOutput> {
        match &self.llm {
            Some(llm) => {
                let text = llm
                    .generate_with_system(self.role, &Self::request(input))
                    .await?;
                Ok(AgentOutput::new(text, "gemini"))
            }
            None => Ok(AgentOutput::new(self.stub(input), "stub")),
        }
    }

    async fn stream(&self, input: &AgentInput) -> Result<AgentStream> {
        match &self.llm {
            Some(llm) => Ok(AgentStream {
                provider: "gemini".to_string(),
                chunks: llm.stream_with_system(self.role, &Self::request(input)).await?,
            }),
            None => Ok(AgentStream::single(AgentOutput::new(self.stub(input), "stub"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{ToolOrchestrator, ToolRegistry};
    use serde_json::json;

    fn deps() -> AgentDeps {
        AgentDeps {
            llm: None,
            orchestrator: Arc::new(ToolOrchestrator::new(Arc::new(ToolRegistry::new()))),
            http: reqwest::Client::new(),
            functions_url: None,
        }
    }

    #[tokio::test]
    async fn test_design_stub() {
        let agent = SpecialistAgent::design(&deps());
        let input = AgentInput::from_prompt("landing page");

        let output = agent.run(&input).await.unwrap();
        assert_eq!(agent.agent_type(), AgentType::Design);
        assert_eq!(output.provider, "stub");
        assert_eq!(
            output.output,
            format!(
                "Design Agent Output (stub)\n\nInput: {}\n\nUI/UX designs and mockups...",
                r#"{"prompt":"landing page"}"#
            )
        );
    }

    #[tokio::test]
    async fn test_data_stub() {
        let agent = SpecialistAgent::data(&deps());
        let input = AgentInput::default().with_field("rows", json!(3));

        let output = agent.run(&input).await.unwrap();
        assert_eq!(agent.agent_type(), AgentType::Data);
        assert!(output.output.starts_with("Data Agent Output (stub)"));
        assert!(output.output.contains(r#""rows":3"#));
    }
}
