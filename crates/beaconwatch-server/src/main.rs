//! # beaconwatch-server
//!
//! HTTP server for the beaconwatch beacon discovery system.
//!
//! This binary provides:
//! - REST API for scan control and beacon sightings
//! - OpenAPI documentation via Swagger UI
//! - Structured logging to file and stdout
//!
//! ## Environment
//!
//! - `BEACONWATCH_CONFIG`: configuration file path (default
//!   `/etc/beaconwatch/config.toml` on Linux)
//! - `BEACONWATCH_ENV`: set to `production` for file + journald logging
//! - `BEACONWATCH_LOG_LEVEL` / `RUST_LOG`: log filter (default `info`)

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use beaconwatch_core::config::Config;
use tokio::net::TcpListener;
use tracing::{info, warn};

use beaconwatch_server::{api, logging, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let is_production =
        std::env::var("BEACONWATCH_ENV").is_ok_and(|value| value == "production");
    logging::init(is_production)?;

    info!("Starting beaconwatch-server");

    let config_path = std::env::var_os("BEACONWATCH_CONFIG")
        .map_or_else(Config::default_path, PathBuf::from);
    let config = Config::load_or_default(&config_path)
        .with_context(|| format!("failed to load configuration from {}", config_path.display()))?;

    let bind: SocketAddr = config
        .server
        .bind
        .parse()
        .context("invalid server.bind address")?;

    let state = AppState::new(config)
        .await
        .context("failed to initialize application state")?;

    if state.config.scanner.autostart {
        let grace = state.config.scanner.grace_period();
        match state.scanner.lock().await.start(grace).await {
            Ok(()) => info!(grace_period_ms = grace.as_millis() as u64, "scan autostarted"),
            Err(e) => warn!(error = %e, "scan autostart failed; start it via the API"),
        }
    }

    let app = api::create_router(Arc::clone(&state));
    let listener = TcpListener::bind(bind).await?;

    info!("Listening on {}", bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutting down, stopping scan session");
    state.scanner.lock().await.stop().await;

    Ok(())
}

/// Resolves on SIGINT or SIGTERM.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigint = signal(SignalKind::interrupt()).expect("SIGINT handler");
        let mut sigterm = signal(SignalKind::terminate()).expect("SIGTERM handler");

        tokio::select! {
            _ = sigint.recv() => info!("Received SIGINT, initiating shutdown"),
            _ = sigterm.recv() => info!("Received SIGTERM, initiating shutdown"),
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await.expect("Ctrl+C handler");
        info!("Received Ctrl+C, initiating shutdown");
    }
}
