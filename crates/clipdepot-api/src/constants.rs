//! API constants

/// API base path prefix
pub const API_PREFIX: &str = "/api";

/// Allowance on top of a kind's size ceiling for multipart framing and other form fields.
pub const MULTIPART_OVERHEAD_BYTES: u64 = 1024 * 1024;
