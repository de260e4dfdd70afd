//! In-process storage keyed by media record and upload kind.
//!
//! Holds at most one blob per record and kind for the lifetime of the process; a later upload
//! of the same kind to the same record replaces the earlier one. Served back by the API under
//! `/api/thumbnails/{record_id}` and `/api/videos/{record_id}`.

use crate::traits::{PutObject, Storage, StorageError, StorageResult, StoredBlob};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use clipdepot_core::MediaKind;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Clone)]
pub struct MemoryStorage {
    blobs: Arc<RwLock<HashMap<(Uuid, MediaKind), StoredBlob>>>,
    base_url: String,
}

impl MemoryStorage {
    pub fn new(public_base_url: &str) -> Self {
        Self {
            blobs: Arc::new(RwLock::new(HashMap::new())),
            base_url: format!("{}/api", public_base_url.trim_end_matches('/')),
        }
    }

    /// Locator accepted by `get` and `delete`: `{kind}/{record_id}`.
    pub fn locator(record_id: Uuid, kind: MediaKind) -> String {
        format!("{}/{}", kind, record_id)
    }

    /// Path segment the API serves a kind under.
    pub fn collection(kind: MediaKind) -> &'static str {
        match kind {
            MediaKind::Thumbnail => "thumbnails",
            MediaKind::Video => "videos",
        }
    }

    fn parse_locator(locator: &str) -> StorageResult<(Uuid, MediaKind)> {
        let invalid = || StorageError::InvalidKey(format!("Not a memory locator: {}", locator));
        let (kind, record_id) = locator.split_once('/').ok_or_else(invalid)?;
        let kind: MediaKind = kind.parse().map_err(|_| invalid())?;
        let record_id = Uuid::parse_str(record_id).map_err(|_| invalid())?;
        Ok((record_id, kind))
    }

    pub async fn len(&self) -> usize {
        self.blobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.blobs.read().await.is_empty()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn put(
        &self,
        object: &PutObject<'_>,
        content: &mut (dyn AsyncRead + Send + Unpin),
    ) -> StorageResult<String> {
        // Read fully before taking the lock; readers never observe a partial blob.
        let capacity = usize::try_from(object.content_length).unwrap_or(0);
        let mut data = Vec::with_capacity(capacity);
        content.read_to_end(&mut data).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to read upload content: {}", e))
        })?;

        if data.len() as u64 != object.content_length {
            return Err(StorageError::UploadFailed(format!(
                "Short read for record {}: expected {} bytes, got {}",
                object.record_id,
                object.content_length,
                data.len()
            )));
        }

        let size = data.len();
        let blob = StoredBlob {
            data: Bytes::from(data),
            content_type: object.media_type.to_string(),
        };
        self.blobs
            .write()
            .await
            .insert((object.record_id, object.kind), blob);

        tracing::info!(
            record_id = %object.record_id,
            kind = %object.kind,
            key = %object.key,
            size_bytes = size,
            "Memory storage upload successful"
        );

        Ok(format!(
            "{}/{}/{}",
            self.base_url,
            Self::collection(object.kind),
            object.record_id
        ))
    }

    async fn get(&self, locator: &str) -> StorageResult<StoredBlob> {
        let entry = Self::parse_locator(locator)?;
        self.blobs
            .read()
            .await
            .get(&entry)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(locator.to_string()))
    }

    async fn delete(&self, locator: &str) -> StorageResult<()> {
        let entry = Self::parse_locator(locator)?;
        self.blobs.write().await.remove(&entry);
        Ok(())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Memory
    }
}
