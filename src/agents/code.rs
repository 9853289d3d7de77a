use crate::agents::{Agent, AgentConfig, AgentDeps, AgentOutput, AgentStream};
use crate::llm::LLMClient;
use crate::types::{AgentArtifact, AgentInput, AgentType, AppError, ArtifactKind, Result};
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;

pub const CODE_PROVIDER: &str = "gemini-code-generator";

/// Code generation agent. Requires Gemini; there is no stub mode.
pub struct CodeAgent {
    config: AgentConfig,
    llm: Option<Arc<dyn LLMClient>>,
}

struct CodeRequest<'a> {
    prompt: &'a str,
    language: &'a str,
    framework: &'a str,
    complexity: &'a str,
}

impl<'a> CodeRequest<'a> {
    fn parse(input: &'a AgentInput) -> Result<Self> {
        let prompt = input.prompt();
        if prompt.is_empty() {
            return Err(AppError::InvalidInput("Prompt is required".to_string()));
        }
        Ok(Self {
            prompt,
            language: input.str_field("language").unwrap_or("TypeScript/JavaScript"),
            framework: input.str_field("framework").unwrap_or("React/Next.js"),
            complexity: input.str_field("complexity").unwrap_or("intermediate"),
        })
    }

    fn system_prompt(&self) -> String {
        format!(
            "You are an expert software developer and code generator. Generate clean, \
             production-ready code based on the user's requirements.\n\n\
             Guidelines:\n\
             - Write clean, well-commented code\n\
             - Follow best practices and conventions for the specified language/framework\n\
             - Include error handling where appropriate\n\
             - Make code modular and reusable\n\
             - Provide complete, runnable code examples\n\
             - Include necessary imports/dependencies\n\
             - Add helpful comments explaining complex logic\n\n\
             Language: {}\nFramework: {}\nComplexity: {}",
            self.language, self.framework, self.complexity
        )
    }

    fn user_prompt(&self) -> String {
        format!("User Request: {}", self.prompt)
    }
}

impl CodeAgent {
    pub fn new(deps: &AgentDeps) -> Self {
        Self {
            config: AgentConfig::builtin(AgentType::Code),
            llm: deps.llm.clone(),
        }
    }

    fn llm(&self) -> Result<&Arc<dyn LLMClient>> {
        self.llm.as_ref().ok_or_else(|| {
            AppError::Configuration("Gemini API key not configured on server".to_string())
        })
    }
}

#[async_trait]
impl Agent for CodeAgent {
    fn config(&self) -> &AgentConfig {
        &self.config
    }

    async fn run(&self, input: &AgentInput) -> Result<AgentOutput> {
        let request = CodeRequest::parse(input)?;
        let llm = self.llm()?;

        let code = llm
            .generate_with_system(&request.system_prompt(), &request.user_prompt())
            .await?;

        let artifact = AgentArtifact {
            id: uuid::Uuid::new_v4().to_string(),
            kind: ArtifactKind::Code,
            name: "generated-code".to_string(),
            size: Some(code.len() as u64),
            content: code.clone(),
            mime_type: Some("text/plain".to_string()),
            metadata: None,
        };

        Ok(AgentOutput::new(code, CODE_PROVIDER)
            .with_metadata("language", json!(request.language))
            .with_metadata("framework", json!(request.framework))
            .with_metadata("complexity", json!(request.complexity))
            .with_artifact(artifact))
    }

    async fn stream(&self, input: &AgentInput) -> Result<AgentStream> {
        let request = CodeRequest::parse(input)?;
        let chunks = self
            .llm()?
            .stream_with_system(&request.system_prompt(), &request.user_prompt())
            .await?;
        Ok(AgentStream {
            provider: CODE_PROVIDER.to_string(),
            chunks,
        })
    }
}
