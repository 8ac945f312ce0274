//! web-sdk: link a wallet provider to the SDK and hold the session.
//!
//! # Architecture Overview
//!
//! ```text
//!   wallet node (JSON-RPC)          rollup provider (HTTP)
//!          │                               │
//!          ▼                               ▼
//!   ┌──────────────┐               ┌───────────────┐
//!   │ RpcProvider  │               │ StatusFetcher │
//!   └──────┬───────┘               └───────┬───────┘
//!          │  account / network            │ expected chain id
//!          ▼                               ▼
//!   ┌──────────────────────────────────────────────┐
//!   │                  WebSdk                      │
//!   │  init → network wait → sdk → account link    │──▶ status + sdk events
//!   └──────────────────────┬───────────────────────┘
//!                          ▼
//!                   ┌─────────────┐
//!                   │  SdkFacade  │
//!                   └─────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::sync::mpsc;

use web_sdk::config::loader::{load_config, ConfigError};
use web_sdk::config::validation::validate_config;
use web_sdk::observability::{logging, metrics};
use web_sdk::provider::RpcProvider;
use web_sdk::sdk::MemorySdkFactory;
use web_sdk::status::HttpStatusFetcher;
use web_sdk::{AppConfig, AppEvent, InitState, WebSdk};

#[derive(Parser)]
#[command(name = "web-sdk")]
#[command(about = "Link a wallet provider to the SDK and keep the session consistent", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Rollup provider base URL (overrides config)
    #[arg(long)]
    server_url: Option<String>,

    /// Wallet node JSON-RPC URL (overrides config)
    #[arg(long)]
    rpc_url: Option<String>,

    /// Wipe local SDK data before starting
    #[arg(long)]
    clear_db: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };
    if let Some(url) = cli.server_url {
        config.server.url = url;
    }
    if let Some(url) = cli.rpc_url {
        config.provider.rpc_url = url;
    }
    config.server.clear_db |= cli.clear_db;
    validate_config(&config).map_err(ConfigError::Validation)?;

    logging::init_logging(&config.observability)?;
    tracing::info!("web-sdk v0.1.0 starting");

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let provider = Arc::new(RpcProvider::new(&config.provider)?);
    let fetcher = Arc::new(HttpStatusFetcher::new(&config.remote)?);
    let factory = Arc::new(MemorySdkFactory::new(fetcher.clone()));
    let app = WebSdk::new(provider, factory, fetcher, &config.network);

    let mut session_events = app.subscribe();
    tokio::spawn(log_events(app.subscribe()));

    tracing::info!(
        server_url = %config.server.url,
        rpc_url = %config.provider.rpc_url,
        clear_db = config.server.clear_db,
        "Configuration loaded"
    );

    if let Err(e) = app.init(&config.server.url, config.server.clear_db).await {
        tracing::error!(error = %e, reason = e.failure_reason().as_str(), "Could not initialize");
        return Err(e.into());
    }

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
        _ = session_ended(&mut session_events) => {
            tracing::warn!("Session ended by provider");
        }
    }

    app.destroy().await;
    tracing::info!("Shutdown complete");
    Ok(())
}

/// Resolve once a status update returns the coordinator to `Uninitialized`.
async fn session_ended(events: &mut mpsc::UnboundedReceiver<AppEvent>) {
    while let Some(event) = events.recv().await {
        if let Some(status) = event.status() {
            if status.state == InitState::Uninitialized {
                return;
            }
        }
    }
}

async fn log_events(mut events: mpsc::UnboundedReceiver<AppEvent>) {
    while let Some(event) = events.recv().await {
        match &event {
            AppEvent::StatusUpdated(status) => tracing::info!(
                state = status.state.as_str(),
                action = ?status.action,
                account = ?status.account,
                network = ?status.network,
                message = ?status.message,
                "Status updated"
            ),
            AppEvent::Sdk(sdk_event) => tracing::debug!(event = event.name(), detail = ?sdk_event, "SDK event"),
        }
    }
}
