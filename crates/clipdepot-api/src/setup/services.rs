//! Service initialization

use crate::auth::JwtAuthenticator;
use crate::services::upload::MediaUploadService;
use crate::state::AppState;
use anyhow::{Context, Result};
use clipdepot_core::{Config, MetadataStore};
use clipdepot_storage::create_storage;
use std::sync::Arc;

/// Build the storage backend, the authenticator and the upload service around a metadata store.
pub async fn initialize_services(
    config: Config,
    metadata: Arc<dyn MetadataStore>,
) -> Result<Arc<AppState>> {
    let config = Arc::new(config);

    let storage = create_storage(&config)
        .await
        .context("Failed to initialize storage backend")?;
    tracing::info!(backend = %storage.backend_type(), "Storage backend initialized");

    tokio::fs::create_dir_all(&config.staging_dir)
        .await
        .with_context(|| format!("Failed to create staging dir {}", config.staging_dir.display()))?;

    let authenticator = Arc::new(JwtAuthenticator::new(&config.jwt_secret));
    let upload_service = MediaUploadService::new(
        config.clone(),
        authenticator,
        metadata.clone(),
        storage.clone(),
    );

    Ok(Arc::new(AppState {
        config,
        storage,
        metadata,
        upload_service,
    }))
}
