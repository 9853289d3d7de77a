//! Built-in Tools for Agent Capabilities
//!
//! External capabilities the content agent (and the dashboard directly) can
//! invoke: web search, video generation, image generation and short text.
//!
//! # Module Structure
//!
//! - [`registry`](crate::tools::registry) - Tool trait, registration and execution
//! - [`search`](crate::tools::search) - SerpAPI web search, cached
//! - [`media`](crate::tools::media) - Veo 3 video and Gemini image generation
//! - [`text`](crate::tools::text) - Short LLM text generation
//! - [`quota`](crate::tools::quota) - Daily per-tool quota
//! - [`orchestrator`](crate::tools::orchestrator) - Sequential multi-tool runs
//!
//! # Example
//!
//! ```ignore
//! let registry = Arc::new(ToolRegistry::from_config(&config, cache, llm));
//! let orchestrator = ToolOrchestrator::new(registry);
//! let sequence = ToolOrchestrator::content_sequence("rust async", &Default::default());
//! let results = orchestrator.execute_tool_sequence(&sequence).await?;
//! let context = concatenate(&results);
//! ```

/// Veo 3 video and Gemini image generation.
pub mod media;
/// Sequential tool orchestration.
pub mod orchestrator;
/// Daily per-tool usage quota.
pub mod quota;
/// Tool registry for managing available tools.
pub mod registry;
/// Web search tool using SerpAPI.
pub mod search;
/// Short text generation tool.
pub mod text;

pub use orchestrator::{concatenate, ContentSequenceOptions, ToolExecution, ToolOrchestrator};
pub use quota::ToolQuota;
pub use registry::{Tool, ToolRegistry};
