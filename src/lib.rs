//! # Axon - Agent dashboard server
//!
//! The HTTP backend behind the Axon dashboard. It runs five AI agents
//! (content, code, research, design and data), a small set of external
//! tools with a shared TTL cache, artifact persistence, and a passthrough
//! to the companion Python service.
//!
//! ## Quick Start (Library Usage)
//!
//! ```rust,ignore
//! use axon::{AppState, AxonConfigManager};
//! use std::sync::Arc;
//!
//! let manager = Arc::new(AxonConfigManager::new("axon.toml")?);
//! let state = AppState::from_config(manager)?;
//! let app = axon::create_app(state);
//!
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await?;
//! axum::serve(listener, app).await?;
//! ```
//!
//! ## Modules
//!
//! - [`agents`] - Agent trait, built-in agents, registry and bridge
//! - [`api`] - REST handlers and routes (mounted under `/api`)
//! - [`artifacts`] - File and Supabase artifact stores
//! - [`backend`] - Client for the Python backend
//! - [`cache`] - TTL cache for tool results
//! - [`llm`] - Gemini client
//! - [`tools`] - Tool trait, built-in tools, quota and orchestrator
//! - [`types`] - Wire types and error handling
//!
//! ## Configuration
//!
//! Infrastructure settings live in `axon.toml`; secrets stay in the
//! environment and are referenced by variable name. Missing API keys are
//! not fatal: agents fall back to stub output and tools report that they
//! are not configured.

/// AI agents, the agent registry and the request bridge.
pub mod agents;
/// HTTP API handlers and routes.
pub mod api;
/// Artifact persistence.
pub mod artifacts;
/// Python backend bridge client.
pub mod backend;
/// TTL cache for tool results.
pub mod cache;
/// Command-line interface.
pub mod cli;
/// LLM provider clients and abstractions.
pub mod llm;
/// Built-in tools, quota and the tool orchestrator.
pub mod tools;
/// Core types (requests, responses, errors).
pub mod types;
/// Configuration utilities (TOML).
pub mod utils;

// Re-export commonly used types
pub use agents::{AgentBridge, AgentRegistry, AgentRegistryBuilder, RunLog};
pub use artifacts::ArtifactStore;
pub use backend::BackendClient;
pub use cache::ToolCache;
pub use llm::{LLMClient, LLMClientFactory, Provider};
pub use tools::{ToolOrchestrator, ToolQuota, ToolRegistry};
pub use types::{AppError, Result};
pub use utils::toml_config::{AxonConfig, AxonConfigManager};

use crate::agents::AgentDeps;
use crate::artifacts::ArtifactStoreProvider;
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};
use tracing::{info, warn};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// TOML-based configuration with hot-reload support
    pub config_manager: Arc<AxonConfigManager>,
    /// Agent registry (limits, retries, health)
    pub agent_registry: Arc<AgentRegistry>,
    /// Dispatch and run history
    pub bridge: Arc<AgentBridge>,
    /// Built-in tools
    pub tool_registry: Arc<ToolRegistry>,
    /// Sequential tool runner
    pub orchestrator: Arc<ToolOrchestrator>,
    /// Shared tool result cache
    pub cache: Arc<ToolCache>,
    /// Artifact persistence backend
    pub artifacts: Arc<dyn ArtifactStore>,
    /// Python backend client
    pub backend: BackendClient,
}

impl AppState {
    /// Wire every component from the current configuration
    pub fn from_config(config_manager: Arc<AxonConfigManager>) -> Result<Self> {
        let config = config_manager.config();
        let http = reqwest::Client::new();

        let llm_factory = LLMClientFactory::from_config(&config);
        let llm = llm_factory.create();
        match &llm {
            Some(client) => info!(model = %client.model_name(), "Gemini configured"),
            None => warn!(
                "{} not set; agents run in stub mode",
                config.providers.gemini.api_key_env
            ),
        }

        let cache = Arc::new(ToolCache::new(&config.cache));
        let quota = Arc::new(ToolQuota::from_config(&config));
        let tool_registry = Arc::new(
            ToolRegistry::from_config(&config, Arc::clone(&cache), llm.clone()).with_quota(quota),
        );
        let orchestrator = Arc::new(ToolOrchestrator::new(Arc::clone(&tool_registry)));

        let deps = AgentDeps {
            llm,
            orchestrator: Arc::clone(&orchestrator),
            http: http.clone(),
            functions_url: config.functions_url(),
        };
        let agent_registry = Arc::new(
            AgentRegistry::builder()
                .with_builtin_agents(&deps)
                .with_config_manager(Arc::clone(&config_manager))
                .build()?,
        );

        let artifacts = ArtifactStoreProvider::from_config(&config)?.create_store(http.clone());
        info!(backend = artifacts.backend_name(), "Artifact store ready");

        let runs = Arc::new(RunLog::new(config.runs.history_limit));
        let bridge = Arc::new(AgentBridge::new(Arc::clone(&agent_registry), runs));

        Ok(Self {
            backend: BackendClient::from_config(http, &config),
            config_manager,
            agent_registry,
            bridge,
            tool_registry,
            orchestrator,
            cache,
            artifacts,
        })
    }

    /// Replace the agent registry (and the bridge built on it)
    pub fn with_agent_registry(mut self, registry: AgentRegistry) -> Self {
        let registry = Arc::new(registry);
        let runs = Arc::clone(self.bridge.runs());
        self.bridge = Arc::new(AgentBridge::new(Arc::clone(&registry), runs));
        self.agent_registry = registry;
        self
    }

    /// Replace the tool registry (and the orchestrator built on it)
    pub fn with_tool_registry(mut self, registry: ToolRegistry) -> Self {
        let registry = Arc::new(registry);
        self.orchestrator = Arc::new(ToolOrchestrator::new(Arc::clone(&registry)));
        self.tool_registry = registry;
        self
    }

    pub fn with_artifact_store(mut self, store: Arc<dyn ArtifactStore>) -> Self {
        self.artifacts = store;
        self
    }

    pub fn with_backend(mut self, backend: BackendClient) -> Self {
        self.backend = backend;
        self
    }
}

/// Build the full application: `/api` routes plus CORS, tracing and the
/// request body limit.
pub fn create_app(state: AppState) -> Router {
    let server = state.config_manager.config().server.clone();

    let cors = if server.cors_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = server
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    }
    .max_age(Duration::from_secs(3600));

    Router::new()
        .nest("/api", api::routes::create_router())
        .layer(RequestBodyLimitLayer::new(server.body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use tower::ServiceExt;

    fn app(configure: impl FnOnce(&mut AxonConfig)) -> Router {
        let mut config = AxonConfig::default();
        config.providers.gemini.api_key_env = "AXON_TEST_UNSET_GEMINI_KEY".to_string();
        configure(&mut config);
        let manager = Arc::new(AxonConfigManager::from_config(config));
        create_app(AppState::from_config(manager).unwrap())
    }

    fn preflight(origin: &str) -> Request<Body> {
        Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/ping")
            .header(header::ORIGIN, origin)
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_cors_allows_any_origin_by_default() {
        let response = app(|_| {}).oneshot(preflight("http://localhost:5173")).await.unwrap();
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "*"
        );
    }

    #[tokio::test]
    async fn test_cors_restricted_to_configured_origins() {
        let configure = |c: &mut AxonConfig| {
            c.server.cors_origins = vec!["https://dash.example.com".to_string()];
        };

        let allowed = app(configure)
            .oneshot(preflight("https://dash.example.com"))
            .await
            .unwrap();
        assert_eq!(
            allowed.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "https://dash.example.com"
        );

        let denied = app(configure)
            .oneshot(preflight("https://evil.example.com"))
            .await
            .unwrap();
        assert!(denied
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none());
    }

    #[tokio::test]
    async fn test_body_limit() {
        let body = format!(r#"{{"agentType":"design","input":{{"prompt":"{}"}}}}"#, "x".repeat(256));
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/agents/run")
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::CONTENT_LENGTH, body.len())
            .body(Body::from(body))
            .unwrap();

        let response = app(|c| c.server.body_limit = 64).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_stream_dropped_by_client_completes_run() {
        let mut config = AxonConfig::default();
        config.providers.gemini.api_key_env = "AXON_TEST_UNSET_GEMINI_KEY".to_string();
        let state = AppState::from_config(Arc::new(AxonConfigManager::from_config(config))).unwrap();
        let runs = state.bridge.runs().clone();

        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/agents/design/stream")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"prompt":"landing page"}"#))
            .unwrap();
        let response = create_app(state).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(runs.recent(1)[0].status, crate::types::AgentStatus::Running);

        // Hang up before reading any event
        drop(response);

        let run = &runs.recent(1)[0];
        assert_eq!(run.status, crate::types::AgentStatus::Error);
        assert!(run.completed_at.is_some());
        assert_eq!(
            run.result.as_ref().and_then(|r| r.error_code()),
            Some("CANCELLED")
        );
    }
}
