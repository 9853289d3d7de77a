//! HTTP API Handlers and Routes
//!
//! The REST layer of the Axon server, built on Axum. Every route is mounted
//! under `/api`.
//!
//! # API Endpoints
//!
//! ## Health
//! - `GET /api/ping` - Liveness probe
//! - `GET /api/health` - Agent health and cache statistics
//!
//! ## Agents (`/api/agents`)
//! - `GET /api/agents` - List enabled agents with health
//! - `POST /api/agents/run` - Run an agent through the bridge
//! - `GET /api/agents/runs` - Recent run history
//! - `GET /api/agents/runs/{id}` - One run
//! - `POST /api/agents/{agentId}/execute` - Direct per-agent call
//! - `POST /api/agents/{agentId}/stream` - Server-sent events stream
//! - `POST /api/agents/content`, `POST /api/agents/code` - Dedicated routes
//!
//! ## Tools (`/api/tools`)
//! - `GET /api/tools` - Tool definitions
//! - `POST /api/tools/web-search` - Cached SerpAPI search
//! - `POST /api/tools/veo3-video` - Video generation
//! - `POST /api/tools/orchestrate` - Run a tool sequence
//!
//! ## Artifacts (`/api/artifacts`)
//! - `POST /api/artifacts/save`
//! - `GET /api/artifacts/list`
//!
//! ## Python backend
//! - `GET|POST /api/bridge/{*path}` - Passthrough
//!
//! # OpenAPI Documentation
//!
//! The generated document is served at `/api/openapi.json`.

/// Request and response handlers for all API endpoints.
pub mod handlers;
/// Route definitions.
pub mod routes;

use utoipa::OpenApi;

/// OpenAPI document for the `/api` surface
#[derive(OpenApi)]
#[openapi(
    info(title = "Axon API", description = "Agent dashboard backend"),
    paths(
        handlers::health::ping,
        handlers::health::health,
        handlers::agents::list_agents,
        handlers::agents::run_agent,
        handlers::agents::list_runs,
        handlers::agents::get_run,
        handlers::agents::execute_agent,
        handlers::agents::stream_agent,
        handlers::agents::run_content,
        handlers::agents::run_code,
        handlers::tools::list_tools,
        handlers::tools::web_search,
        handlers::tools::veo3_video,
        handlers::tools::orchestrate,
        handlers::artifacts::save_artifact,
        handlers::artifacts::list_artifacts,
    ),
    components(schemas(
        crate::types::AgentType,
        crate::types::AgentStatus,
        crate::types::AgentPriority,
        crate::types::AgentInput,
        crate::types::AgentArtifact,
        crate::types::ArtifactKind,
        crate::types::AgentResult,
        crate::types::SuccessAgentResult,
        crate::types::ErrorAgentResult,
        crate::types::AgentRequest,
        crate::types::AgentRequestOptions,
        crate::types::AgentResponse,
        crate::types::AgentRun,
        crate::types::ToolDefinition,
        crate::agents::AgentConfig,
        crate::agents::DependencyCheck,
        crate::cache::CacheStats,
        crate::tools::ToolExecution,
        crate::artifacts::ArtifactRecord,
        crate::artifacts::SaveArtifact,
        crate::artifacts::SavedArtifact,
        handlers::health::HealthResponse,
        handlers::health::AgentHealthSummary,
        handlers::agents::AgentInfo,
        handlers::agents::AgentListResponse,
        handlers::tools::WebSearchRequest,
        handlers::tools::VideoRequest,
        handlers::tools::OrchestrateRequest,
        handlers::tools::OrchestrateResponse,
    )),
    tags(
        (name = "health", description = "Liveness and health"),
        (name = "agents", description = "Agent execution"),
        (name = "tools", description = "External tools"),
        (name = "artifacts", description = "Saved outputs"),
    )
)]
pub struct ApiDoc;
