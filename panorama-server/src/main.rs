//! Panorama Server - upload/manifest handler for the VR panorama gallery
//!
//! - GET  /       - List photo IDs (manifest or store scan)
//! - POST /       - Upload or delete a photo (authenticated)
//! - GET  /image  - Rate-limited image proxy
//! - GET  /health - Health check

use std::net::SocketAddr;

use anyhow::{Context, Result};
use panorama_server::{create_router_with_state, AppState, Config};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("panorama_server=info,panorama_core=info,tower_http=info")
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    config.validate().map_err(anyhow::Error::msg)?;
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        auth_mode = ?config.auth_mode,
        storage = ?config.storage,
        "Starting panorama-server"
    );

    let state = AppState::from_config(&config)
        .await
        .context("failed to open object store")?;
    let app = create_router_with_state(state);

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {}", addr))?;
    tracing::info!("Listening on http://{}", addr);

    // ConnectInfo feeds per-IP rate limiting on the image proxy
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
