//! Application state shared by all handlers.

use crate::services::upload::MediaUploadService;
use clipdepot_core::{Config, MetadataStore};
use clipdepot_storage::Storage;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub storage: Arc<dyn Storage>,
    pub metadata: Arc<dyn MetadataStore>,
    pub upload_service: MediaUploadService,
}
