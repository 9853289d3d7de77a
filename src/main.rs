//! Axon - HTTP Server Entry Point

use anyhow::Context;
use axon::{
    AppState, AxonConfig, AxonConfigManager,
    cli::{AgentCommands, Cli, Commands, LogFormat, init, list_agents, show_config},
    create_app,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing(cli: &Cli, default_level: &str) {
    let default_filter = if cli.verbose {
        "axon=debug,tower_http=debug".to_string()
    } else {
        format!("axon={0},tower_http={0}", default_level)
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let registry = tracing_subscriber::registry().with(filter);
    match cli.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<AxonConfig> {
    AxonConfig::load(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))
}

async fn serve(cli: &Cli) -> anyhow::Result<()> {
    let config_exists = cli.config.exists();
    let mut manager = if config_exists {
        AxonConfigManager::new(&cli.config)
            .with_context(|| format!("Failed to load {}", cli.config.display()))?
    } else {
        AxonConfigManager::from_config(AxonConfig::default())
    };
    let config = manager.config();

    init_tracing(cli, &config.server.log_level);

    if !config_exists {
        warn!(
            "{} not found, using built-in defaults (run 'axon-server init' to create one)",
            cli.config.display()
        );
    }
    for warning in config.validate_with_warnings()? {
        warn!("{}", warning);
    }

    if config_exists {
        if let Err(e) = manager.start_watching() {
            warn!("Config hot reload disabled: {}", e);
        }
    }
    let manager = Arc::new(manager);

    let state = AppState::from_config(Arc::clone(&manager))?;
    let app = create_app(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("Axon server listening on http://{}", addr);
    info!("API:     http://{}/api", addr);
    info!("OpenAPI: http://{}/api/openapi.json", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await
        .context("Server error")?;

    manager.stop_watching();
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse_args();
    let output = cli.output();

    match &cli.command {
        None => serve(&cli).await,
        Some(Commands::Init {
            path,
            force,
            host,
            port,
        }) => {
            let result = init::run(
                init::InitConfig {
                    path: path.clone(),
                    force: *force,
                    host: host.clone(),
                    port: *port,
                },
                &output,
            );
            match result {
                init::InitResult::Error(e) => anyhow::bail!(e),
                _ => Ok(()),
            }
        }
        Some(Commands::Config { validate }) => {
            let config = load_config(&cli)?;
            show_config(&config, *validate, &output)?;
            Ok(())
        }
        Some(Commands::Agent(AgentCommands::List)) => {
            let config = load_config(&cli)?;
            list_agents(&config, &output);
            Ok(())
        }
    }
}
