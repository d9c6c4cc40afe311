//! Application setup and initialization
//!
//! All startup wiring lives here so `main` stays a thin entry point and tests can
//! build the same router against their own state.

pub mod routes;
pub mod server;
pub mod storage;
pub mod validation;

use crate::state::AppState;
use anyhow::{Context, Result};
use pastebom_core::Config;
use pastebom_services::Generator;
use std::sync::Arc;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    // Telemetry first so validation warnings are visible
    crate::telemetry::init_telemetry(&config.log_level)
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    // Fail fast on misconfiguration
    validation::validate_config(&config).context("Configuration validation failed")?;

    tracing::info!(
        environment = %config.environment,
        "Configuration loaded and validated successfully"
    );

    let store = storage::setup_storage(&config).await?;

    let generator =
        Generator::from_config(&config, store).context("Failed to load viewer template assets")?;
    tracing::info!(
        supported = %generator.supported_extensions().join(","),
        "Board parsers registered"
    );

    let state = Arc::new(AppState::new(config.clone(), generator));

    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}
