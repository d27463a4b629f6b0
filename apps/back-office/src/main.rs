//! # Tally Back Office
//!
//! HTTP surface for the sales reports.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Back Office Server                                │
//! │                                                                         │
//! │  Browser/CLI ───► axum (HTTP_PORT) ───► ReportService ───► Platform    │
//! │                        │                     │                          │
//! │                        ▼                     ▼                          │
//! │                   routes.rs             tally-core                      │
//! │                 (param binding)      (pure pipeline)                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod routes;

use std::env;
use std::net::SocketAddr;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use tally_client::{ReportService, RetailClient, RetailConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing; RUST_LOG overrides the default level
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .init();

    info!("Starting Tally back office...");

    // Load configuration
    let config = RetailConfig::load()?;
    info!(
        api_base = %config.api_base,
        timezone = %config.timezone,
        page_size = config.page_size,
        "Configuration loaded"
    );

    // Build the report service
    let client = RetailClient::new(&config)?;
    let service = Arc::new(ReportService::new(client, &config));

    // Build server address
    let port: u16 = env::var("HTTP_PORT")
        .unwrap_or_else(|_| "8080".to_string())
        .parse()?;
    let addr: SocketAddr = format!("0.0.0.0:{}", port).parse()?;
    info!(%addr, "Starting HTTP server");

    // Start server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, routes::router(service))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Back office stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(?e, "Failed to listen for shutdown signal");
        return;
    }
    info!("Shutdown signal received");
}
