//! DogSpa HTTP server.
//!
//! This binary:
//! - Loads configuration from the environment (and `.env`)
//! - Seeds the catalog from `DOGSPA_CATALOG_PATH` or the demo catalog
//! - Serves Prometheus metrics on `METRICS_HOST:METRICS_PORT`
//! - Serves the API on `HOST:PORT` until Ctrl+C
//!
//! # Usage
//!
//! ```bash
//! RUST_LOG=info,dogspa=debug cargo run --bin server
//! ```

use anyhow::Context;
use dogspa::metrics::register_business_metrics;
use dogspa::server::{AppState, build_router};
use dogspa::{Config, SpaEngine};
use dogspa_runtime::metrics::MetricsServer;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,dogspa=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting DogSpa server");

    let config = Config::from_env().context("Failed to load configuration")?;
    let hours = &config.engine.business_hours;
    tracing::info!(
        host = %config.server.host,
        port = config.server.port,
        timezone = %hours.tz(),
        opens = %hours.opens(),
        closes = %hours.closes(),
        lock_timeout_ms = u64::try_from(config.engine.lock_timeout.as_millis()).unwrap_or(u64::MAX),
        "Configuration loaded"
    );

    // Metrics
    let metrics_addr: SocketAddr = format!(
        "{}:{}",
        config.server.metrics_host, config.server.metrics_port
    )
    .parse()
    .context("Invalid metrics address")?;
    let mut metrics_server = MetricsServer::new(metrics_addr);
    metrics_server
        .start()
        .context("Failed to start metrics server")?;
    register_business_metrics();

    // Engine
    let engine = SpaEngine::from_config(&config.engine).context("Failed to load catalog")?;
    let app = build_router(AppState::new(Arc::new(engine)));

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!(%addr, "DogSpa server listening");

    let shutdown_timeout = Duration::from_secs(config.server.shutdown_timeout);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown_timeout))
        .await
        .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Resolve on Ctrl+C, then arm a watchdog that exits the process if
/// in-flight requests have not drained within `timeout`.
async fn shutdown_signal(timeout: Duration) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!(?timeout, "Shutting down gracefully...");

    tokio::spawn(async move {
        tokio::time::sleep(timeout).await;
        tracing::warn!("Graceful shutdown timed out; exiting");
        std::process::exit(1);
    });
}
