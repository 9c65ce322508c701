//! Telemetry gateway binary.
//!
//! Loads configuration, binds the listener, and serves the proxy until
//! ctrl-c.

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use telemetry_gateway::config::{load_config, GatewayConfig};
use telemetry_gateway::observability::{logging, metrics};
use telemetry_gateway::HttpServer;

#[derive(Debug, Parser)]
#[command(name = "telemetry-gateway", about = "Reverse proxy for the telemetry dashboard")]
struct Args {
    /// Path to the TOML configuration file. Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_tracing("telemetry_gateway=debug,tower_http=debug");

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };

    tracing::info!(
        bind_address = %config.listener.bind_address,
        services = config.services.len(),
        upstream_timeout_secs = config.timeouts.upstream_secs,
        "Configuration loaded"
    );

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let local_addr = listener.local_addr()?;

    tracing::info!(
        address = %local_addr,
        "Listening for connections"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let server = HttpServer::new(config);
    server.run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
