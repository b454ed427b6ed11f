//! Dual View Capture - Main Entry Point

use anyhow::Context;
use api::{init_logging, init_metrics, run_server, AppConfig, AppState};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::args().nth(1).unwrap_or_else(|| "capture".to_string());
    let config = AppConfig::load(&config_path)
        .with_context(|| format!("loading configuration from {config_path}"))?;

    init_logging(&config.logging)?;
    let metrics = init_metrics()?;

    info!("=== Dual View Capture v{} ===", env!("CARGO_PKG_VERSION"));

    // One store handle for both screens
    let store = storage::open_store(&config.store)
        .await
        .context("opening document store")?;

    let camera = camera_capture::open_camera(&config.camera).context("opening camera")?;
    info!("Camera backend: {:?}", config.camera.backend);
    let state = AppState::build(&config, camera.as_ref(), store)
        .await
        .with_metrics(metrics);

    run_server(&config, Arc::new(state)).await
}
