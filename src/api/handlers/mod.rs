//! API request handlers.
//!
//! This module contains all HTTP request handlers organized by functionality.

/// Agent listing, execution, streaming and run history.
pub mod agents;
/// Artifact save and list handlers.
pub mod artifacts;
/// Python backend passthrough.
pub mod bridge;
/// Ping and health handlers.
pub mod health;
/// Tool execution handlers.
pub mod tools;
