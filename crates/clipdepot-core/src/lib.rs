//! Clipdepot Core Library
//!
//! This crate provides the domain models, error taxonomy, configuration and the pure
//! building blocks of the upload pipeline (content-type classification and storage key
//! generation) shared by every clipdepot crate. It also defines the collaborator traits
//! the pipeline consumes: [`Authenticator`] and [`MetadataStore`].

pub mod auth;
pub mod classifier;
pub mod config;
pub mod error;
pub mod keys;
pub mod metadata;
pub mod models;
pub mod storage_types;

// Re-export commonly used types
pub use auth::Authenticator;
pub use classifier::{classify, MediaType};
pub use config::Config;
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use keys::StorageKey;
pub use metadata::{InMemoryMetadataStore, MetadataStore};
pub use models::{MediaKind, MediaRecord};
pub use storage_types::{StagingMode, StorageBackend};
