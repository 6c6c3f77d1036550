//! Round-robin HTTP load balancer.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request      ┌──────────────────────────────────────────┐
//!     ────────────────────┼─▶ http server ──▶ forwarding engine ─────┼──▶ Backend
//!                         │                      │        ▲          │
//!                         │                      ▼        │          │
//!                         │               round robin ◀── registry   │
//!                         │                                 ▲        │
//!     Client Response     │                                 │        │
//!     ◀───────────────────┼── relay ◀── metrics        health prober ┼──▶ Backend
//!                         └──────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use balancer_proxy::config::Cli;
use balancer_proxy::lifecycle::{signals, Shutdown};
use balancer_proxy::observability::logging;
use balancer_proxy::{ForwardingEngine, HttpServer};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Cli::parse().into_config()?;
    logging::init(&config.observability);

    tracing::info!("balancer-proxy v{} starting", env!("CARGO_PKG_VERSION"));

    if let Err(errors) = config.validate() {
        for err in errors.errors() {
            tracing::error!(code = %err.code(), error = %err, "Invalid configuration");
        }
        return Err(errors.into());
    }

    tracing::info!(
        port = config.listener.port,
        backends = config.backends.len(),
        health_check_path = %config.health_check.path,
        health_check_interval_secs = config.health_check.interval_secs,
        backend_timeout_secs = config.timeouts.backend_secs,
        "Configuration loaded"
    );

    let engine = Arc::new(ForwardingEngine::from_config(&config)?);

    let listener = TcpListener::bind(config.listener.bind_address()).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(shutdown.clone());

    let server = HttpServer::new(engine);
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
