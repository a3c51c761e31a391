//! Decision brief gateway.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌───────────────────────────────────────────────────────┐
//!                      │                    BRIEF GATEWAY                       │
//!                      │                                                        │
//!   Client Request     │  ┌─────────┐   ┌───────────┐   ┌────────────┐          │
//!   ───────────────────┼─▶│  http   │──▶│ admission │──▶│ rate limit │          │
//!                      │  │ server  │   │   gate    │   │  (store)   │          │
//!                      │  └─────────┘   └───────────┘   └─────┬──────┘          │
//!                      │                                      ▼                 │
//!                      │                               ┌────────────┐           │
//!                      │                               │  handlers  │──────────┼──▶ Model API
//!                      │                               └─────┬──────┘           │
//!                      │                                     ▼                  │
//!   Client Response    │                               ┌────────────┐           │
//!   ◀──────────────────┼───────────────────────────────│   brief    │           │
//!                      │                               │   parser   │           │
//!                      │                               └────────────┘           │
//!                      └───────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use brief_gateway::config::{load_config, load_from_env, GatewayConfig};
use brief_gateway::lifecycle::{build_server, signals, Shutdown};
use brief_gateway::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "brief-gateway")]
#[command(about = "Decision brief gateway", long_about = None)]
struct Args {
    /// TOML config file. Environment variables override secrets either way.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config: GatewayConfig = match &args.config {
        Some(path) => load_config(path)?,
        None => load_from_env()?,
    };
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }

    logging::init_logging(&config.observability.log_level);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "brief-gateway starting");

    tracing::info!(
        bind_address = %config.listener.bind_address,
        app_url = %config.admission.app_url,
        backend = ?config.rate_limit.backend,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server = build_server(config, &shutdown).await?;
    let server_shutdown = shutdown.subscribe();
    signals::spawn_signal_handler(shutdown);

    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
