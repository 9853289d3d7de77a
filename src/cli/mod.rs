//! CLI module for Axon
//!
//! Provides command-line interface parsing and handling for the axon-server binary.
//! Uses clap for argument parsing and owo-colors for colored terminal output.

pub mod init;
pub mod output;

use crate::agents::AgentConfig;
use crate::types::AgentType;
use crate::utils::toml_config::{AxonConfig, ConfigError};
use clap::{Parser, Subcommand, ValueEnum};
use output::Output;
use std::path::PathBuf;

/// Axon - agent dashboard server
///
/// Runs the content, code, research, design and data agents behind the
/// dashboard's REST API.
#[derive(Parser, Debug)]
#[command(
    name = "axon-server",
    version,
    about = "Axon - agent dashboard server",
    long_about = "Backend for the Axon dashboard: AI agents, cached web tools, artifact\n\
                  storage and a passthrough to the Python service.\n\n\
                  Run without arguments to start the server, or use 'init' to scaffold a config.",
    after_help = "EXAMPLES:\n    \
                  axon-server init              # Write a starter axon.toml\n    \
                  axon-server                   # Start the server\n    \
                  axon-server --config my.toml  # Use a custom config file\n    \
                  axon-server agent list        # Show agents and their limits"
)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "axon.toml", global = true)]
    pub config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    pub log_format: LogFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a starter axon.toml, .env.example and data directory
    Init {
        /// Directory to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Overwrite existing files without prompting
        #[arg(short, long)]
        force: bool,

        /// Host address for the server
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port for the server
        #[arg(long, default_value = "3000")]
        port: u16,
    },

    /// Show configuration information
    Config {
        /// Validate the configuration file and report warnings
        #[arg(long)]
        validate: bool,
    },

    /// Manage agents
    #[command(subcommand)]
    Agent(AgentCommands),
}

/// Agent management subcommands
#[derive(Subcommand, Debug)]
pub enum AgentCommands {
    /// List all agents with their effective limits
    List,
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn output(&self) -> Output {
        if self.no_color {
            Output::no_color()
        } else {
            Output::new()
        }
    }
}

fn configured(value: Option<String>) -> &'static str {
    if value.is_some() { "set" } else { "not set" }
}

/// Print a configuration summary; with `validate`, also print warnings
pub fn show_config(config: &AxonConfig, validate: bool, output: &Output) -> Result<(), ConfigError> {
    output.header("Configuration");

    output.subheader("Server");
    output.kv("address", &format!("{}:{}", config.server.host, config.server.port));
    output.kv("log_level", &config.server.log_level);
    let cors = if config.server.cors_origins.is_empty() {
        "any origin".to_string()
    } else {
        config.server.cors_origins.join(", ")
    };
    output.kv("cors", &cors);

    output.subheader("Providers");
    output.kv("gemini model", &config.providers.gemini.model);
    output.kv(
        &config.providers.gemini.api_key_env,
        configured(config.gemini_api_key()),
    );
    output.kv(
        &config.providers.serpapi.api_key_env,
        configured(config.serpapi_api_key()),
    );
    output.kv(
        &config.providers.runway.api_key_env,
        configured(config.runway_api_key()),
    );
    output.kv("content upstream", configured(config.functions_url()));

    output.subheader("Tools & cache");
    let quota = config
        .daily_quota()
        .map_or_else(|| "unlimited".to_string(), |q| format!("{} per tool per day", q));
    output.kv("daily quota", &quota);
    output.kv("cache", if config.cache.enabled { "enabled" } else { "disabled" });
    output.kv("cache ttl", &format!("{}s", config.cache.default_ttl_secs));

    output.subheader("Storage");
    output.kv("artifacts", &format!("{:?}", config.artifacts.backend).to_lowercase());
    output.kv("artifact dir", &config.artifacts.dir.display().to_string());
    output.kv("python backend", &config.backend_url());

    if validate {
        output.subheader("Validation");
        let warnings = config.validate_with_warnings()?;
        if warnings.is_empty() {
            output.success("Configuration is valid");
        } else {
            output.success("Configuration is valid, with warnings:");
            for warning in &warnings {
                output.warning(&warning.message);
            }
        }
    }

    Ok(())
}

/// Effective agent configurations, in display order
pub fn effective_agents(config: &AxonConfig) -> Vec<AgentConfig> {
    AgentType::ALL
        .into_iter()
        .map(|t| {
            let base = AgentConfig::builtin(t);
            match config.get_agent(t.as_str()) {
                Some(o) => base.with_override(o),
                None => base,
            }
        })
        .collect()
}

/// Print the agent table
pub fn list_agents(config: &AxonConfig, output: &Output) {
    output.header("Agents");
    output.newline();
    output.table_header(&["Agent", "Enabled", "Timeout", "Retries", "Concurrency", "Depends on"]);

    for agent in effective_agents(config) {
        let deps: Vec<&str> = agent.dependencies.iter().map(AgentType::as_str).collect();
        output.table_row(&[
            agent.agent_type.as_str(),
            if agent.enabled { "yes" } else { "no" },
            &format!("{}ms", agent.timeout_ms),
            &agent.retry_attempts.to_string(),
            &agent.max_concurrent_runs.to_string(),
            &deps.join(","),
        ]);
    }

    if config.gemini_api_key().is_none() {
        output.hint(&format!(
            "{} is not set: agents return stub output (code agent is unavailable)",
            config.providers.gemini.api_key_env
        ));
    }
}
