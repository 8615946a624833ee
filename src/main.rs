//! Hierarchical REST resource server binary.
//!
//! Loads configuration, compiles the route table and access schema, and
//! serves the resource tree over an in-memory store. Hooks and a link
//! resolver are registered by embedding the library; the stock binary
//! runs with an empty registry.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use arbor::config::{load_config, ServerConfig};
use arbor::hooks::HookRegistry;
use arbor::http::HttpServer;
use arbor::storage::MemoryStore;

#[derive(Debug, Parser)]
#[command(name = "arbor", about = "Hierarchical REST resource server")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServerConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    tracing_subscriber::EnvFilter::new(&config.observability.log_filter)
                }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("arbor v0.1.0 starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        max_connections = config.listener.max_connections,
        request_timeout_secs = config.timeouts.request_secs,
        routes = config.routes.len(),
        "configuration loaded"
    );

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let local_addr = listener.local_addr()?;
    tracing::info!(address = %local_addr, "listening for connections");

    let server = HttpServer::new(
        config,
        HookRegistry::new(),
        Arc::new(MemoryStore::new()),
        None,
    )?;
    server.run(listener).await?;

    tracing::info!("shutdown complete");
    Ok(())
}
