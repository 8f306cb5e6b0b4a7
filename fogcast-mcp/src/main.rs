//! Binary entry point for the Fogcast MCP server.
//!
//! This crate focuses on:
//! - Parsing CLI arguments and merging them with config and environment
//! - Logging to stderr (stdout carries the MCP protocol)
//! - Wiring the transport, upstream client and server together

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use fogcast_core::{Config, FogcastClient, HttpClient};
use fogcast_mcp::FogcastServer;

/// Fogcast MCP server - weather and fog forecasts for Konstanz.
#[derive(Debug, Parser)]
#[command(name = "fogcast-mcp", version, about = "Fogcast MCP server")]
struct Args {
    /// Base URL of the upstream Fogcast API (overrides config and env).
    #[arg(long)]
    base_url: Option<String>,

    /// Per-request timeout in seconds.
    #[arg(long)]
    timeout: Option<u64>,

    /// Log filter, e.g. "info" or "fogcast_core=debug".
    #[arg(long)]
    log: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = Config::load().context("Failed to load configuration")?;
    if let Some(base_url) = args.base_url {
        config.base_url = base_url;
    }
    if let Some(timeout) = args.timeout {
        config.timeout_secs = timeout;
    }
    if let Some(log) = args.log {
        config.log_filter = log;
    }
    config.validate()?;

    // stdout is reserved for the protocol.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.log_filter))
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Starting {} v{}", config.server_name, fogcast_mcp::SERVER_VERSION);
    tracing::info!("Fogcast API URL: {}", config.base_url);

    let transport = HttpClient::new(&config.base_url, config.timeout())
        .context("Failed to build upstream HTTP client")?;
    let client = Arc::new(FogcastClient::new(Arc::new(transport)));
    let server = FogcastServer::new(&config, client);

    server.run_stdio().await
}
