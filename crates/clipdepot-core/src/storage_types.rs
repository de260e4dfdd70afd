use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Storage backend types
///
/// Selected once at startup from configuration; every upload kind goes through the same
/// backend for a given deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Files under a local root directory, served back under `/assets`.
    Local,
    /// Process-lifetime map, intended for development and tests.
    Memory,
    /// S3 or any S3-compatible object store.
    S3,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "local" => Ok(StorageBackend::Local),
            "memory" => Ok(StorageBackend::Memory),
            "s3" => Ok(StorageBackend::S3),
            _ => Err(anyhow::anyhow!("Invalid storage backend: {}", s)),
        }
    }
}

impl Display for StorageBackend {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            StorageBackend::Local => write!(f, "local"),
            StorageBackend::Memory => write!(f, "memory"),
            StorageBackend::S3 => write!(f, "s3"),
        }
    }
}

/// Where an inbound upload is buffered before it reaches the storage backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StagingMode {
    /// Bounded in-memory buffer; suitable for thumbnails.
    Memory,
    /// Named temporary file in the staging directory; suitable for video.
    File,
}

impl FromStr for StagingMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "memory" => Ok(StagingMode::Memory),
            "file" | "tempfile" => Ok(StagingMode::File),
            _ => Err(anyhow::anyhow!("Invalid staging mode: {}", s)),
        }
    }
}

impl Display for StagingMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            StagingMode::Memory => write!(f, "memory"),
            StagingMode::File => write!(f, "file"),
        }
    }
}
