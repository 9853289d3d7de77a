//! LLM Provider Clients and Abstractions
//!
//! - [`LLMClient`] - The core trait every provider implements
//! - [`Provider`] - Runtime provider selection
//! - [`LLMClientFactory`] - Builds the shared client from `axon.toml`
//!
//! # Example
//!
//! ```ignore
//! use axon::llm::LLMClientFactory;
//!
//! let factory = LLMClientFactory::from_config(&config);
//! if let Some(client) = factory.create() {
//!     let text = client.generate("What is 2+2?").await?;
//! }
//! ```

/// Core LLM client trait and provider selection.
pub mod client;
/// Google Gemini REST client.
pub mod gemini;

pub use client::{LLMClient, LLMClientFactory, Provider, TextStream};
pub use gemini::GeminiClient;
