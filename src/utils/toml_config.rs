//! TOML-based configuration for Axon
//!
//! This module provides declarative configuration for the server, upstream
//! providers, agent overrides, tools, the search cache, artifact storage and
//! the Python backend bridge via a TOML file (`axon.toml`).
//!
//! Secrets never live in the file itself. Each provider names the
//! environment variable holding its key, resolved at startup.
//!
//! # Hot Reloading
//!
//! Configuration changes are automatically detected and applied at runtime.
//! Use `AxonConfigManager` for thread-safe access to the current configuration.

use arc_swap::ArcSwap;
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Root configuration structure loaded from axon.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AxonConfig {
    #[serde(default)]
    pub server: ServerConfig,

    /// Upstream API providers (Gemini, SerpAPI, Runway, content functions)
    #[serde(default)]
    pub providers: ProvidersConfig,

    /// Per-agent overrides keyed by agent type (`content`, `code`, ...)
    #[serde(default)]
    pub agents: HashMap<String, AgentOverride>,

    #[serde(default)]
    pub tools: ToolsConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub artifacts: ArtifactsConfig,

    /// Python backend bridge
    #[serde(default)]
    pub backend: BackendConfig,

    #[serde(default)]
    pub runs: RunsConfig,
}

// ============= Server Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Allowed CORS origins. Empty means any origin.
    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// Maximum accepted request body in bytes
    #[serde(default = "default_body_limit")]
    pub body_limit: usize,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_body_limit() -> usize {
    2 * 1024 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            cors_origins: Vec::new(),
            body_limit: default_body_limit(),
        }
    }
}

// ============= Provider Configuration =============

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub gemini: GeminiConfig,
    #[serde(default)]
    pub serpapi: SerpApiConfig,
    #[serde(default)]
    pub runway: RunwayConfig,
    #[serde(default)]
    pub functions: FunctionsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// Environment variable containing the API key
    #[serde(default = "default_gemini_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_gemini_base")]
    pub base_url: String,

    #[serde(default = "default_gemini_model")]
    pub model: String,

    /// Model used by the image generation tool
    #[serde(default = "default_gemini_image_model")]
    pub image_model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
}

fn default_gemini_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}

fn default_gemini_base() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_gemini_model() -> String {
    "gemini-1.5-flash".to_string()
}

fn default_gemini_image_model() -> String {
    "gemini-2.0-flash-preview-image-generation".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_output_tokens() -> u32 {
    2048
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_gemini_key_env(),
            base_url: default_gemini_base(),
            model: default_gemini_model(),
            image_model: default_gemini_image_model(),
            temperature: default_temperature(),
            max_output_tokens: default_max_output_tokens(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerpApiConfig {
    #[serde(default = "default_serpapi_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_serpapi_base")]
    pub base_url: String,

    #[serde(default = "default_serpapi_engine")]
    pub engine: String,
}

fn default_serpapi_key_env() -> String {
    "SERPAPI_API_KEY".to_string()
}

fn default_serpapi_base() -> String {
    "https://serpapi.com".to_string()
}

fn default_serpapi_engine() -> String {
    "google".to_string()
}

impl Default for SerpApiConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_serpapi_key_env(),
            base_url: default_serpapi_base(),
            engine: default_serpapi_engine(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunwayConfig {
    #[serde(default = "default_runway_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_runway_base")]
    pub base_url: String,
}

fn default_runway_key_env() -> String {
    "RUNWAY_API_KEY".to_string()
}

fn default_runway_base() -> String {
    "https://api.runwayml.com/v1".to_string()
}

impl Default for RunwayConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_runway_key_env(),
            base_url: default_runway_base(),
        }
    }
}

/// Upstream content function the content agent forwards to when set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionsConfig {
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default = "default_functions_url_env")]
    pub url_env: String,
}

fn default_functions_url_env() -> String {
    "FUNCTIONS_BASE_URL".to_string()
}

impl Default for FunctionsConfig {
    fn default() -> Self {
        Self {
            url: None,
            url_env: default_functions_url_env(),
        }
    }
}

// ============= Agent Configuration =============

/// Overrides applied on top of an agent's built-in configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentOverride {
    pub enabled: Option<bool>,
    pub timeout_ms: Option<u64>,
    pub retry_attempts: Option<u32>,
    pub max_concurrent_runs: Option<usize>,
    pub dependencies: Option<Vec<String>>,
    pub description: Option<String>,
}

// ============= Tool Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Daily per-tool call limit. None disables the quota.
    #[serde(default)]
    pub daily_quota: Option<u32>,

    /// Environment variable overriding `daily_quota`
    #[serde(default = "default_quota_env")]
    pub daily_quota_env: String,

    #[serde(default = "default_tool_timeout")]
    pub timeout_secs: u64,
}

fn default_quota_env() -> String {
    "TOOL_DAILY_QUOTA".to_string()
}

fn default_tool_timeout() -> u64 {
    30
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            daily_quota: None,
            daily_quota_env: default_quota_env(),
            timeout_secs: default_tool_timeout(),
        }
    }
}

// ============= Cache Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_ttl_secs")]
    pub default_ttl_secs: u64,

    /// Optional entry cap. None leaves the cache unbounded.
    #[serde(default)]
    pub max_entries: Option<usize>,
}

fn default_true() -> bool {
    true
}

fn default_ttl_secs() -> u64 {
    3600
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            default_ttl_secs: default_ttl_secs(),
            max_entries: None,
        }
    }
}

// ============= Artifact Configuration =============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactBackend {
    #[default]
    File,
    Supabase,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactsConfig {
    #[serde(default)]
    pub backend: ArtifactBackend,

    #[serde(default = "default_artifacts_dir")]
    pub dir: PathBuf,

    #[serde(default = "default_list_limit")]
    pub list_limit: usize,

    #[serde(default)]
    pub supabase: SupabaseConfig,
}

fn default_artifacts_dir() -> PathBuf {
    PathBuf::from("data/artifacts")
}

fn default_list_limit() -> usize {
    50
}

impl Default for ArtifactsConfig {
    fn default() -> Self {
        Self {
            backend: ArtifactBackend::File,
            dir: default_artifacts_dir(),
            list_limit: default_list_limit(),
            supabase: SupabaseConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupabaseConfig {
    #[serde(default = "default_supabase_url_env")]
    pub url_env: String,

    #[serde(default = "default_supabase_key_env")]
    pub key_env: String,

    #[serde(default = "default_supabase_table")]
    pub table: String,
}

fn default_supabase_url_env() -> String {
    "SUPABASE_URL".to_string()
}

fn default_supabase_key_env() -> String {
    "SUPABASE_SERVICE_ROLE_KEY".to_string()
}

fn default_supabase_table() -> String {
    "artifacts".to_string()
}

impl Default for SupabaseConfig {
    fn default() -> Self {
        Self {
            url_env: default_supabase_url_env(),
            key_env: default_supabase_key_env(),
            table: default_supabase_table(),
        }
    }
}

// ============= Backend Bridge Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_backend_url")]
    pub base_url: String,

    /// Environment variable overriding `base_url`
    #[serde(default = "default_backend_url_env")]
    pub base_url_env: String,

    #[serde(default = "default_backend_timeout")]
    pub timeout_ms: u64,
}

fn default_backend_url() -> String {
    "http://127.0.0.1:5000".to_string()
}

fn default_backend_url_env() -> String {
    "PY_BACKEND_URL".to_string()
}

fn default_backend_timeout() -> u64 {
    30_000
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_backend_url(),
            base_url_env: default_backend_url_env(),
            timeout_ms: default_backend_timeout(),
        }
    }
}

// ============= Run History Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunsConfig {
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

fn default_history_limit() -> usize {
    200
}

impl Default for RunsConfig {
    fn default() -> Self {
        Self {
            history_limit: default_history_limit(),
        }
    }
}

// ============= Configuration Loading & Validation =============

/// Configuration warnings that don't prevent operation but may indicate issues
#[derive(Debug, Clone)]
pub struct ConfigWarning {
    pub kind: ConfigWarningKind,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigWarningKind {
    MissingApiKey,
    UnknownAgent,
    ArtifactBackend,
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Errors that can occur during configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Agent '{0}' referenced as a dependency of '{1}' does not exist")]
    MissingAgent(String, String),

    #[error("Circular reference detected: {0}")]
    CircularReference(String),

    #[error("Watch error: {0}")]
    WatchError(#[from] notify::Error),
}

const KNOWN_AGENTS: [&str; 5] = ["content", "code", "research", "design", "data"];
const MAX_RETRY_ATTEMPTS: u32 = 10;
/// One year
const MAX_CACHE_TTL_SECS: u64 = 365 * 24 * 60 * 60;

impl AxonConfig {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse and validate configuration from a TOML string
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: AxonConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration for internal consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache.default_ttl_secs == 0 {
            return Err(ConfigError::ValidationError(
                "cache.default_ttl_secs must be greater than zero".to_string(),
            ));
        }
        if self.cache.default_ttl_secs > MAX_CACHE_TTL_SECS {
            return Err(ConfigError::ValidationError(format!(
                "cache.default_ttl_secs must be at most {}",
                MAX_CACHE_TTL_SECS
            )));
        }

        if self.runs.history_limit == 0 {
            return Err(ConfigError::ValidationError(
                "runs.history_limit must be greater than zero".to_string(),
            ));
        }

        for (name, agent) in &self.agents {
            if agent.retry_attempts.is_some_and(|n| n > MAX_RETRY_ATTEMPTS) {
                return Err(ConfigError::ValidationError(format!(
                    "agents.{}.retry_attempts must be at most {}",
                    name, MAX_RETRY_ATTEMPTS
                )));
            }
            if agent.max_concurrent_runs == Some(0) {
                return Err(ConfigError::ValidationError(format!(
                    "agents.{}.max_concurrent_runs must be greater than zero",
                    name
                )));
            }
            for dep in agent.dependencies.iter().flatten() {
                if !KNOWN_AGENTS.contains(&dep.as_str()) {
                    return Err(ConfigError::MissingAgent(dep.clone(), name.clone()));
                }
            }
        }

        if self.artifacts.backend == ArtifactBackend::Supabase
            && (self.artifacts.supabase.url_env.trim().is_empty()
                || self.artifacts.supabase.table.trim().is_empty())
        {
            return Err(ConfigError::ValidationError(
                "artifacts.supabase requires url_env and table when backend = \"supabase\""
                    .to_string(),
            ));
        }

        self.detect_circular_dependencies()?;

        Ok(())
    }

    /// Detect dependency cycles between agents after overrides are applied
    fn detect_circular_dependencies(&self) -> Result<(), ConfigError> {
        fn visit<'a>(
            node: &'a str,
            deps: &HashMap<&'a str, Vec<&'a str>>,
            stack: &mut Vec<&'a str>,
            done: &mut HashSet<&'a str>,
        ) -> Result<(), ConfigError> {
            if done.contains(node) {
                return Ok(());
            }
            if let Some(pos) = stack.iter().position(|n| *n == node) {
                let mut cycle: Vec<&str> = stack[pos..].to_vec();
                cycle.push(node);
                return Err(ConfigError::CircularReference(cycle.join(" -> ")));
            }
            stack.push(node);
            for dep in deps.get(node).into_iter().flatten() {
                visit(*dep, deps, stack, done)?;
            }
            stack.pop();
            done.insert(node);
            Ok(())
        }

        let deps: HashMap<&str, Vec<&str>> = KNOWN_AGENTS
            .iter()
            .map(|name| {
                let list = match self.agents.get(*name).and_then(|a| a.dependencies.as_ref()) {
                    Some(custom) => custom.iter().map(String::as_str).collect(),
                    None => builtin_dependencies(name).to_vec(),
                };
                (*name, list)
            })
            .collect();

        let mut done = HashSet::new();
        for name in KNOWN_AGENTS {
            visit(name, &deps, &mut Vec::new(), &mut done)?;
        }
        Ok(())
    }

    /// Validate configuration with warnings for missing secrets and unknown agents
    pub fn validate_with_warnings(&self) -> Result<Vec<ConfigWarning>, ConfigError> {
        self.validate()?;

        let mut warnings = Vec::new();

        for (label, env) in [
            ("Gemini", &self.providers.gemini.api_key_env),
            ("SerpAPI", &self.providers.serpapi.api_key_env),
            ("Runway", &self.providers.runway.api_key_env),
        ] {
            if self.resolve_env(env).is_none() {
                warnings.push(ConfigWarning {
                    kind: ConfigWarningKind::MissingApiKey,
                    message: format!(
                        "{} API key env var '{}' is not set; dependent features run in stub or error mode",
                        label, env
                    ),
                });
            }
        }

        if self.artifacts.backend == ArtifactBackend::Supabase && self.supabase_url().is_none() {
            warnings.push(ConfigWarning {
                kind: ConfigWarningKind::ArtifactBackend,
                message: format!(
                    "Supabase artifact backend selected but '{}' is not set; the server will refuse to start",
                    self.artifacts.supabase.url_env
                ),
            });
        }

        for name in self.agents.keys() {
            if !KNOWN_AGENTS.contains(&name.as_str()) {
                warnings.push(ConfigWarning {
                    kind: ConfigWarningKind::UnknownAgent,
                    message: format!("Override for unknown agent '{}' is ignored", name),
                });
            }
        }

        Ok(warnings)
    }

    /// Get a resolved, non-empty value from an env var reference
    pub fn resolve_env(&self, env_name: &str) -> Option<String> {
        std::env::var(env_name).ok().filter(|v| !v.trim().is_empty())
    }

    pub fn gemini_api_key(&self) -> Option<String> {
        self.resolve_env(&self.providers.gemini.api_key_env)
    }

    pub fn serpapi_api_key(&self) -> Option<String> {
        self.resolve_env(&self.providers.serpapi.api_key_env)
    }

    pub fn runway_api_key(&self) -> Option<String> {
        self.resolve_env(&self.providers.runway.api_key_env)
    }

    pub fn supabase_url(&self) -> Option<String> {
        self.resolve_env(&self.artifacts.supabase.url_env)
    }

    pub fn supabase_key(&self) -> Option<String> {
        self.resolve_env(&self.artifacts.supabase.key_env)
    }

    /// Content function URL: explicit value first, then the env var
    pub fn functions_url(&self) -> Option<String> {
        self.providers
            .functions
            .url
            .clone()
            .filter(|u| !u.trim().is_empty())
            .or_else(|| self.resolve_env(&self.providers.functions.url_env))
    }

    /// Backend bridge URL: env var first, then the configured value
    pub fn backend_url(&self) -> String {
        self.resolve_env(&self.backend.base_url_env)
            .unwrap_or_else(|| self.backend.base_url.clone())
    }

    /// Effective daily tool quota: env var first, then the configured value
    pub fn daily_quota(&self) -> Option<u32> {
        match self.resolve_env(&self.tools.daily_quota_env) {
            Some(raw) => match raw.trim().parse() {
                Ok(limit) => Some(limit),
                Err(_) => {
                    warn!(
                        "Ignoring non-numeric {}='{}'",
                        self.tools.daily_quota_env, raw
                    );
                    self.tools.daily_quota
                }
            },
            None => self.tools.daily_quota,
        }
    }

    /// Get agent override by type name
    pub fn get_agent(&self, name: &str) -> Option<&AgentOverride> {
        self.agents.get(name)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.default_ttl_secs)
    }
}

/// Dependencies each built-in agent declares before overrides.
pub fn builtin_dependencies(agent: &str) -> &'static [&'static str] {
    match agent {
        "code" => &["content"],
        "data" => &["research"],
        _ => &[],
    }
}

// ============= Hot Reloading Configuration Manager =============

/// Thread-safe configuration manager with hot reloading support
pub struct AxonConfigManager {
    config: Arc<ArcSwap<AxonConfig>>,
    config_path: PathBuf,
    watcher: RwLock<Option<RecommendedWatcher>>,
    reload_tx: Option<mpsc::UnboundedSender<()>>,
}

impl AxonConfigManager {
    /// Create a new configuration manager and load the initial config
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        // Absolute path for reliable file watching
        let path = path.as_ref();
        let path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()
                .map_err(ConfigError::ReadError)?
                .join(path)
        };

        let config = AxonConfig::load(&path)?;

        Ok(Self {
            config: Arc::new(ArcSwap::from_pointee(config)),
            config_path: path,
            watcher: RwLock::new(None),
            reload_tx: None,
        })
    }

    /// Create a config manager directly from a config (useful for testing)
    /// This won't have file watching capabilities.
    pub fn from_config(config: AxonConfig) -> Self {
        Self {
            config: Arc::new(ArcSwap::from_pointee(config)),
            config_path: PathBuf::from("test-config.toml"),
            watcher: RwLock::new(None),
            reload_tx: None,
        }
    }

    /// Get the current configuration (lockless read)
    pub fn config(&self) -> Arc<AxonConfig> {
        self.config.load_full()
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Replace the live configuration
    pub fn store(&self, config: AxonConfig) {
        self.config.store(Arc::new(config));
    }

    /// Manually reload the configuration from disk
    pub fn reload(&self) -> Result<(), ConfigError> {
        info!("Reloading configuration from {:?}", self.config_path);

        let new_config = AxonConfig::load(&self.config_path)?;
        self.config.store(Arc::new(new_config));

        info!("Configuration reloaded successfully");
        Ok(())
    }

    /// Start watching for configuration file changes
    pub fn start_watching(&mut self) -> Result<(), ConfigError> {
        let (tx, mut rx) = mpsc::unbounded_channel::<()>();
        self.reload_tx = Some(tx.clone());

        let config_path = self.config_path.clone();
        let config_arc = Arc::clone(&self.config);
        let watched_file = self.config_path.file_name().map(|n| n.to_owned());

        let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
            match res {
                Ok(event) => {
                    let touches_config = event
                        .paths
                        .iter()
                        .any(|p| p.file_name().map(|n| n.to_owned()) == watched_file);
                    if touches_config && (event.kind.is_modify() || event.kind.is_create()) {
                        let _ = tx.send(());
                    }
                }
                Err(e) => {
                    error!("Config watcher error: {:?}", e);
                }
            }
        })?;

        // Editors often replace the file, so watch the parent directory
        if let Some(parent) = self.config_path.parent() {
            watcher.watch(parent, RecursiveMode::NonRecursive)?;
        }

        *self.watcher.write() = Some(watcher);

        tokio::spawn(async move {
            let mut last_reload = std::time::Instant::now();
            let debounce_duration = Duration::from_millis(500);

            while rx.recv().await.is_some() {
                if last_reload.elapsed() < debounce_duration {
                    continue;
                }

                // Let the writer finish
                tokio::time::sleep(Duration::from_millis(100)).await;

                match AxonConfig::load(&config_path) {
                    Ok(new_config) => {
                        config_arc.store(Arc::new(new_config));
                        info!("Configuration hot-reloaded successfully");
                        last_reload = std::time::Instant::now();
                    }
                    Err(e) => {
                        warn!(
                            "Failed to hot-reload config: {}. Keeping previous config.",
                            e
                        );
                    }
                }
            }
        });

        info!("Configuration hot-reload watcher started");
        Ok(())
    }

    /// Stop watching for configuration changes
    pub fn stop_watching(&self) {
        *self.watcher.write() = None;
        info!("Configuration hot-reload watcher stopped");
    }
}

impl Clone for AxonConfigManager {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            config_path: self.config_path.clone(),
            watcher: RwLock::new(None), // Watcher is not cloned
            reload_tx: self.reload_tx.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_config() -> String {
        r#"
[server]
host = "0.0.0.0"
port = 8080
log_level = "debug"
cors_origins = ["http://localhost:3001"]

[providers.gemini]
model = "gemini-1.5-pro"

[providers.serpapi]
engine = "bing"

[agents.code]
enabled = false
timeout_ms = 5000

[agents.research]
retry_attempts = 3

[tools]
daily_quota = 25

[cache]
default_ttl_secs = 120
max_entries = 500

[artifacts]
backend = "supabase"
list_limit = 20

[artifacts.supabase]
table = "agent_artifacts"

[backend]
base_url = "http://localhost:5055"
timeout_ms = 1000
"#
        .to_string()
    }

    #[test]
    fn test_parse_config() {
        let config = AxonConfig::parse(&create_test_config()).unwrap();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.cors_origins.len(), 1);
        assert_eq!(config.providers.gemini.model, "gemini-1.5-pro");
        assert_eq!(config.providers.serpapi.engine, "bing");
        assert_eq!(config.get_agent("code").unwrap().enabled, Some(false));
        assert_eq!(config.get_agent("code").unwrap().timeout_ms, Some(5000));
        assert_eq!(config.tools.daily_quota, Some(25));
        assert_eq!(config.cache_ttl(), Duration::from_secs(120));
        assert_eq!(config.cache.max_entries, Some(500));
        assert_eq!(config.artifacts.backend, ArtifactBackend::Supabase);
        assert_eq!(config.artifacts.supabase.table, "agent_artifacts");
        assert_eq!(config.backend.timeout_ms, 1000);
    }

    #[test]
    fn test_defaults() {
        let config = AxonConfig::parse("").unwrap();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.providers.gemini.api_key_env, "GEMINI_API_KEY");
        assert_eq!(config.providers.gemini.model, "gemini-1.5-flash");
        assert_eq!(config.providers.serpapi.engine, "google");
        assert!(config.cache.enabled);
        assert_eq!(config.cache.default_ttl_secs, 3600);
        assert!(config.cache.max_entries.is_none());
        assert_eq!(config.artifacts.backend, ArtifactBackend::File);
        assert_eq!(config.artifacts.dir, PathBuf::from("data/artifacts"));
        assert_eq!(config.artifacts.list_limit, 50);
        assert_eq!(config.backend.base_url, "http://127.0.0.1:5000");
        assert_eq!(config.runs.history_limit, 200);
    }

    #[test]
    fn test_validation_zero_ttl() {
        let result = AxonConfig::parse("[cache]\ndefault_ttl_secs = 0\n");
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validation_bounds_ttl_and_retries() {
        let result = AxonConfig::parse("[cache]\ndefault_ttl_secs = 9223372036854775807\n");
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));

        let result = AxonConfig::parse("[agents.code]\nretry_attempts = 4294967295\n");
        match result {
            Err(ConfigError::ValidationError(msg)) => assert!(msg.contains("retry_attempts")),
            other => panic!("expected validation error, got {:?}", other),
        }

        assert!(AxonConfig::parse("[agents.code]\nretry_attempts = 10\n").is_ok());
    }

    #[test]
    fn test_validation_supabase_without_url_env() {
        let result = AxonConfig::parse(
            "[artifacts]\nbackend = \"supabase\"\n\n[artifacts.supabase]\nurl_env = \"\"\n",
        );
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_supabase_url_unset_warns() {
        let mut config = AxonConfig::default();
        config.artifacts.backend = ArtifactBackend::Supabase;
        config.artifacts.supabase.url_env = "AXON_TEST_UNSET_SUPABASE_URL".to_string();

        let warnings = config.validate_with_warnings().unwrap();
        assert!(warnings
            .iter()
            .any(|w| w.kind == ConfigWarningKind::ArtifactBackend));
    }

    #[test]
    fn test_validation_unknown_dependency() {
        let result = AxonConfig::parse("[agents.code]\ndependencies = [\"quantum\"]\n");
        match result {
            Err(ConfigError::MissingAgent(dep, agent)) => {
                assert_eq!(dep, "quantum");
                assert_eq!(agent, "code");
            }
            other => panic!("expected MissingAgent, got {:?}", other),
        }
    }

    #[test]
    fn test_circular_dependency_detection() {
        // content -> code, and code -> content by default
        let result = AxonConfig::parse("[agents.content]\ndependencies = [\"code\"]\n");
        match result {
            Err(ConfigError::CircularReference(chain)) => {
                assert!(chain.contains("content"));
                assert!(chain.contains("code"));
            }
            other => panic!("expected CircularReference, got {:?}", other),
        }
    }

    #[test]
    fn test_builtin_dependencies_are_acyclic() {
        assert!(AxonConfig::default().validate().is_ok());
        assert_eq!(builtin_dependencies("code"), &["content"]);
        assert_eq!(builtin_dependencies("data"), &["research"]);
        assert!(builtin_dependencies("design").is_empty());
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let result = AxonConfig::parse("[agents.design]\nmax_concurrent_runs = 0\n");
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_unknown_agent_warning() {
        let mut config = AxonConfig::default();
        config
            .agents
            .insert("quantum".to_string(), AgentOverride::default());
        // Point key env vars somewhere unset so only the agent warning is asserted on
        config.providers.gemini.api_key_env = "AXON_TEST_UNSET_GEMINI".to_string();

        let warnings = config.validate_with_warnings().unwrap();
        assert!(warnings
            .iter()
            .any(|w| w.kind == ConfigWarningKind::UnknownAgent && w.message.contains("quantum")));
        assert!(warnings
            .iter()
            .any(|w| w.kind == ConfigWarningKind::MissingApiKey
                && w.message.contains("AXON_TEST_UNSET_GEMINI")));
    }

    #[test]
    fn test_functions_url_prefers_explicit_value() {
        let mut config = AxonConfig::default();
        config.providers.functions.url = Some("http://functions.local/content".to_string());
        assert_eq!(
            config.functions_url().as_deref(),
            Some("http://functions.local/content")
        );

        config.providers.functions.url = Some("   ".to_string());
        config.providers.functions.url_env = "AXON_TEST_UNSET_FUNCTIONS".to_string();
        assert!(config.functions_url().is_none());
    }

    #[test]
    fn test_config_manager_from_config() {
        let manager = AxonConfigManager::from_config(AxonConfig::default());
        assert_eq!(manager.config().server.port, 3000);

        let mut updated = AxonConfig::default();
        updated.server.port = 4000;
        manager.store(updated);
        assert_eq!(manager.config().server.port, 4000);

        let cloned = manager.clone();
        assert_eq!(cloned.config().server.port, 4000);
    }

    #[test]
    fn test_load_missing_file() {
        let result = AxonConfig::load("/definitely/not/here/axon.toml");
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_manager_reload_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("axon.toml");
        fs::write(&path, "[server]\nport = 3100\n").unwrap();

        let manager = AxonConfigManager::new(&path).unwrap();
        assert_eq!(manager.config().server.port, 3100);

        fs::write(&path, "[server]\nport = 3200\n").unwrap();
        manager.reload().unwrap();
        assert_eq!(manager.config().server.port, 3200);
    }
}
