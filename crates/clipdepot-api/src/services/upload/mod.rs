//! Upload orchestration: authorize, validate, stage, store, link.

pub mod service;
pub mod types;

pub use service::MediaUploadService;
pub use types::{UploadOutcome, UploadRequest, UploadState};
