//! Build-service API front-tier router.
//!
//! Binds the listener, wires the forwarding pipeline, and runs until an
//! OS shutdown signal.

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use api_router::config::loader::load_config;
use api_router::{ApiServer, RouterConfig};

#[derive(Parser, Debug)]
#[command(name = "api-router", about = "Front-tier request router for the build-service API")]
struct Args {
    /// Path to the TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => RouterConfig::default(),
    };

    api_router::observability::logging::init(&config.observability.log_level);

    tracing::info!(
        bind_address = %config.listener.bind_address,
        backend = %format!("{}:{}", config.backend.host, config.backend.port),
        offload = ?config.offload,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => api_router::observability::metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    ApiServer::new(config).run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
