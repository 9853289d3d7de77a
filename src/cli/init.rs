//! Init command implementation
//!
//! Scaffolds a starter `axon.toml`, `.env.example` and data directory.

use super::output::Output;
use std::fs;
use std::path::{Path, PathBuf};

/// Result of the init operation
#[derive(Debug)]
pub enum InitResult {
    /// Initialization completed successfully
    Success,
    /// Project already exists (axon.toml found)
    AlreadyExists,
    /// An error occurred during initialization
    Error(String),
}

/// Configuration for the init command
pub struct InitConfig {
    /// Directory to initialize
    pub path: PathBuf,
    /// Overwrite existing files
    pub force: bool,
    /// Host address for the server
    pub host: String,
    /// Port for the server
    pub port: u16,
}

/// Run the init command
pub fn run(config: InitConfig, output: &Output) -> InitResult {
    output.banner();
    output.header("Initializing Axon");

    let base_path = &config.path;

    let config_path = base_path.join("axon.toml");
    if config_path.exists() && !config.force {
        output.warning("axon.toml already exists!");
        output.hint("Use --force to overwrite existing files");
        return InitResult::AlreadyExists;
    }

    output.subheader("Creating directories");
    for dir in ["data", "data/artifacts"] {
        let dir_path = base_path.join(dir);
        if dir_path.exists() {
            output.skipped(dir, "already exists");
            continue;
        }
        if let Err(e) = fs::create_dir_all(&dir_path) {
            output.error(&format!("Failed to create {}: {}", dir, e));
            return InitResult::Error(e.to_string());
        }
        output.created("directory", dir);
    }

    output.subheader("Creating configuration files");

    if let Err(e) = write_file(&config_path, &generate_axon_toml(&config), config.force) {
        output.error(&format!("Failed to create axon.toml: {}", e));
        return InitResult::Error(e.to_string());
    }
    output.created("config", "axon.toml");

    let env_example_path = base_path.join(".env.example");
    if let Err(e) = write_file(&env_example_path, ENV_EXAMPLE, config.force) {
        output.error(&format!("Failed to create .env.example: {}", e));
        return InitResult::Error(e.to_string());
    }
    output.created("env", ".env.example");

    let gitignore_path = base_path.join(".gitignore");
    if !gitignore_path.exists() {
        match write_file(&gitignore_path, GITIGNORE, false) {
            Ok(()) => output.created("file", ".gitignore"),
            Err(e) => output.warning(&format!("Failed to create .gitignore: {}", e)),
        }
    }

    output.complete("Axon initialized.");

    output.header("Next Steps");
    output.newline();
    output.info("1. Add your API keys (all optional; agents run in stub mode without Gemini):");
    output.command("cp .env.example .env");
    output.newline();
    output.info("2. Start the server:");
    output.command("axon-server");

    output.hint(&format!(
        "API available at http://{}:{}/api (OpenAPI at /api/openapi.json)",
        config.host, config.port
    ));

    InitResult::Success
}

fn write_file(path: &Path, content: &str, force: bool) -> std::io::Result<()> {
    if path.exists() && !force {
        return Ok(()); // Skip existing files unless force is true
    }
    fs::write(path, content)
}

fn generate_axon_toml(config: &InitConfig) -> String {
    format!(
        r#"# Axon configuration
# Secrets are read from the environment variables named below, never from this file.

[server]
host = "{host}"
port = {port}
log_level = "info"
# Empty list allows any origin
cors_origins = []

[providers.gemini]
api_key_env = "GEMINI_API_KEY"
model = "gemini-1.5-flash"
image_model = "gemini-2.0-flash-exp"
temperature = 0.7
max_output_tokens = 2048

[providers.serpapi]
api_key_env = "SERPAPI_API_KEY"
engine = "google"

[providers.runway]
api_key_env = "RUNWAY_API_KEY"

[providers.functions]
# Upstream content function; takes precedence over Gemini for the content agent
url_env = "FUNCTIONS_BASE_URL"

# Per-agent overrides, e.g.
# [agents.research]
# timeout_ms = 180000
# retry_attempts = 2

[tools]
# daily_quota = 100
timeout_secs = 30

[cache]
enabled = true
default_ttl_secs = 3600

[artifacts]
backend = "file"
dir = "data/artifacts"
list_limit = 50

[backend]
base_url = "http://127.0.0.1:5000"
base_url_env = "PY_BACKEND_URL"
timeout_ms = 30000

[runs]
history_limit = 200
"#,
        host = config.host,
        port = config.port,
    )
}

const ENV_EXAMPLE: &str = r#"# Axon Environment Variables
# Copy this file to .env and fill in the values you need.

# Gemini (content, code, research, design and data agents)
GEMINI_API_KEY=

# SerpAPI (web_search tool)
SERPAPI_API_KEY=

# Runway (veo3_video tool)
RUNWAY_API_KEY=

# Optional: upstream content function
# FUNCTIONS_BASE_URL=https://example.com/functions/content

# Optional: Python backend
# PY_BACKEND_URL=http://127.0.0.1:5000

# Optional: daily per-tool quota
# TOOL_DAILY_QUOTA=100

# Optional: Supabase artifact backend
# SUPABASE_URL=https://your-project.supabase.co
# SUPABASE_SERVICE_ROLE_KEY=

# Optional: Logging level
RUST_LOG=info,axon=debug
"#;

const GITIGNORE: &str = r#"# Axon data
/data/

# Environment
.env
.env.local

# Rust
/target/
"#;
