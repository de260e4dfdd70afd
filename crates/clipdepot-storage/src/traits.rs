//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must implement.

use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use clipdepot_core::{MediaKind, MediaType, StorageKey};
use thiserror::Error;
use tokio::io::AsyncRead;
use uuid::Uuid;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Description of an object about to be written.
#[derive(Debug, Clone, Copy)]
pub struct PutObject<'a> {
    pub key: &'a StorageKey,
    /// Media record the object belongs to. Only the memory backend addresses by it.
    pub record_id: Uuid,
    pub kind: MediaKind,
    pub media_type: &'a MediaType,
    /// Exact number of bytes the content reader yields.
    pub content_length: u64,
}

impl PutObject<'_> {
    pub fn object_name(&self) -> String {
        self.key.object_name()
    }
}

/// A stored object read back in full.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlob {
    pub data: Bytes,
    pub content_type: String,
}

/// Storage abstraction trait
///
/// The only component allowed to write permanent media. `put` consumes `content` until EOF
/// and returns the retrieval URL; a failed `put` must not leave a partially written object
/// visible under the final name.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn put(
        &self,
        object: &PutObject<'_>,
        content: &mut (dyn AsyncRead + Send + Unpin),
    ) -> StorageResult<String>;

    /// Read an object back. `locator` is the object name, or `{kind}/{record_id}` for the
    /// memory backend.
    async fn get(&self, locator: &str) -> StorageResult<StoredBlob>;

    /// Delete an object. Deleting a missing object is not an error.
    async fn delete(&self, locator: &str) -> StorageResult<()>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
