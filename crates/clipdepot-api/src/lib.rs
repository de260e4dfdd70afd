//! Clipdepot API Library
//!
//! HTTP surface of the media upload pipeline: handlers, the upload orchestrator and
//! application setup.

pub mod auth;
pub mod constants;
pub mod error;
mod handlers;
pub mod services;
pub mod setup;
pub mod state;
pub mod telemetry;

// Re-exports
pub use error::{ErrorResponse, HttpAppError};
pub use services::upload::{MediaUploadService, UploadOutcome, UploadRequest, UploadState};
