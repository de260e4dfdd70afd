//! Clipdepot Storage Library
//!
//! This crate provides the storage abstraction used by the upload pipeline and its three
//! implementations (local filesystem, in-process memory map, S3-compatible object store),
//! plus the staging manager that buffers inbound uploads before they reach a backend.
//!
//! # Object names
//!
//! Every stored object is named `<key>.<ext>` where `<key>` comes from
//! [`clipdepot_core::StorageKey`]. Names must not contain `..` or a leading `/`.
//! The memory backend is the exception: it holds one blob per media record and is addressed
//! by record ID.

pub mod factory;
#[cfg(feature = "storage-local")]
pub mod local;
pub mod memory;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod staging;
pub mod traits;

use clipdepot_core::AppError;

// Re-export commonly used types
pub use clipdepot_core::StorageBackend;
pub use factory::create_storage;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
pub use memory::MemoryStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use staging::{StagedAsset, StagingError, StagingManager};
pub use traits::{PutObject, Storage, StorageError, StorageResult, StoredBlob};

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(name) => AppError::NotFound(format!("Object not found: {}", name)),
            other => AppError::Storage(other.to_string()),
        }
    }
}

impl From<StagingError> for AppError {
    fn from(err: StagingError) -> Self {
        match err {
            StagingError::TooLarge { max_bytes } => AppError::PayloadTooLarge(format!(
                "Upload exceeds the maximum size of {} bytes",
                max_bytes
            )),
            StagingError::Empty => AppError::MalformedInput("Empty upload".to_string()),
            StagingError::Io(e) => AppError::Io(e.to_string()),
        }
    }
}
