// --- File: crates/services/classbook_backend/src/main.rs ---
use classbook_backend::{app, service_factory::booking_state};
use classbook_common::logging;
use classbook_config::load_config;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;
    // Keeps the file writer flushing until shutdown.
    let _log_guard = logging::init_from_config(&config.logging);

    let state = logging::log_result(
        booking_state(&config),
        "Booking services ready",
        "Failed to set up booking services",
    )?;
    let state = Arc::new(state);
    let app = app(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Starting server at http://{}", addr);
    info!("API endpoints available at http://{}/api", addr);

    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}
