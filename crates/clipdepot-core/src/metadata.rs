//! Media record persistence boundary.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::MediaRecord;

/// Store of owner-scoped media records, keyed by record ID.
///
/// `get` returns `Ok(None)` for a missing record; an `Err` means the store itself failed.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    async fn get(&self, id: Uuid) -> Result<Option<MediaRecord>, AppError>;

    /// Persist the record's mutable fields and return the stored version.
    async fn update(&self, record: &MediaRecord) -> Result<MediaRecord, AppError>;
}

/// Process-lifetime metadata store for development and tests.
#[derive(Clone, Default)]
pub struct InMemoryMetadataStore {
    records: Arc<RwLock<HashMap<Uuid, MediaRecord>>>,
}

impl InMemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a record, replacing any existing one with the same ID.
    pub async fn insert(&self, record: MediaRecord) {
        self.records.write().await.insert(record.id, record);
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl MetadataStore for InMemoryMetadataStore {
    async fn get(&self, id: Uuid) -> Result<Option<MediaRecord>, AppError> {
        Ok(self.records.read().await.get(&id).cloned())
    }

    async fn update(&self, record: &MediaRecord) -> Result<MediaRecord, AppError> {
        let mut records = self.records.write().await;
        let stored = records.get_mut(&record.id).ok_or_else(|| {
            AppError::Persistence(format!("Media record {} no longer exists", record.id))
        })?;

        stored.title = record.title.clone();
        stored.description = record.description.clone();
        stored.thumbnail_url = record.thumbnail_url.clone();
        stored.video_url = record.video_url.clone();
        stored.updated_at = Utc::now();

        Ok(stored.clone())
    }
}
