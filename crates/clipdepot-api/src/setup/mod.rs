//! Application setup and initialization
//!
//! Startup wiring kept out of main.rs so integration tests can build the same router.

pub mod database;
pub mod routes;
pub mod server;
pub mod services;

use crate::state::AppState;
use anyhow::Result;
use clipdepot_core::Config;
use std::sync::Arc;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    tracing::info!(
        environment = %config.environment,
        storage_backend = %config.storage_backend,
        "Configuration loaded and validated successfully"
    );

    // Error bodies hide details in production; decided once from config.
    crate::error::init_error_rendering(config.is_production());

    // Setup metadata store
    let metadata = database::setup_metadata_store(&config).await?;

    // Initialize storage and the upload service
    let state = services::initialize_services(config, metadata).await?;

    // Setup routes
    let router = routes::setup_routes(state.clone());

    Ok((state, router))
}
