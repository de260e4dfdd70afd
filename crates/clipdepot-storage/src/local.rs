use crate::traits::{PutObject, Storage, StorageError, StorageResult, StoredBlob};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use clipdepot_core::classifier::media_type_for_extension;
use std::path::PathBuf;
use tokio::fs;
use tokio::io::{AsyncRead, AsyncWriteExt};

/// Prefix of in-flight upload files inside the storage root.
const PARTIAL_PREFIX: &str = ".partial-";

/// Local filesystem storage implementation
///
/// Objects live directly under `base_path` and are served back by the API under `/assets`.
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for file storage (e.g., "./assets")
    /// * `public_base_url` - Public base URL of the service (e.g., "http://localhost:8091");
    ///   object URLs are `{public_base_url}/assets/{name}`
    pub async fn new(base_path: impl Into<PathBuf>, public_base_url: &str) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage {
            base_path,
            base_url: format!("{}/assets", public_base_url.trim_end_matches('/')),
        })
    }

    pub fn base_path(&self) -> &std::path::Path {
        &self.base_path
    }

    /// Convert an object name to a filesystem path with traversal validation.
    fn key_to_path(&self, object_name: &str) -> StorageResult<PathBuf> {
        if object_name.is_empty()
            || object_name.contains("..")
            || object_name.starts_with('/')
            || object_name.contains('\\')
        {
            return Err(StorageError::InvalidKey(
                "Storage key contains invalid characters".to_string(),
            ));
        }

        let path = self.base_path.join(object_name);
        if path.parent() != Some(self.base_path.as_path()) {
            return Err(StorageError::InvalidKey(
                "Storage key resolves outside storage directory".to_string(),
            ));
        }

        Ok(path)
    }

    fn generate_url(&self, object_name: &str) -> String {
        format!("{}/{}", self.base_url, object_name)
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn put(
        &self,
        object: &PutObject<'_>,
        content: &mut (dyn AsyncRead + Send + Unpin),
    ) -> StorageResult<String> {
        let object_name = object.object_name();
        let path = self.key_to_path(&object_name)?;
        let start = std::time::Instant::now();

        fs::create_dir_all(&self.base_path).await?;

        // Write next to the final path so the rename below stays on one filesystem.
        let partial = tempfile::Builder::new()
            .prefix(PARTIAL_PREFIX)
            .tempfile_in(&self.base_path)
            .map_err(|e| {
                StorageError::UploadFailed(format!(
                    "Failed to create file in {}: {}",
                    self.base_path.display(),
                    e
                ))
            })?;
        let (std_file, partial_path) = partial.into_parts();
        let mut file = fs::File::from_std(std_file);

        let written = tokio::io::copy(content, &mut file).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to write file {}: {}", path.display(), e))
        })?;
        file.sync_all().await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to sync file {}: {}", path.display(), e))
        })?;
        file.shutdown().await?;
        drop(file);

        if written != object.content_length {
            return Err(StorageError::UploadFailed(format!(
                "Short write for {}: expected {} bytes, wrote {}",
                object_name, object.content_length, written
            )));
        }

        partial_path.persist(&path).map_err(|e| {
            StorageError::UploadFailed(format!("Failed to move file into {}: {}", path.display(), e))
        })?;

        let url = self.generate_url(&object_name);

        tracing::info!(
            path = %path.display(),
            key = %object_name,
            record_id = %object.record_id,
            size_bytes = written,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage upload successful"
        );

        Ok(url)
    }

    async fn get(&self, locator: &str) -> StorageResult<StoredBlob> {
        let path = self.key_to_path(locator)?;
        let start = std::time::Instant::now();

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Err(StorageError::NotFound(locator.to_string()));
        }

        let data = fs::read(&path).await.map_err(|e| {
            StorageError::DownloadFailed(format!("Failed to read file {}: {}", path.display(), e))
        })?;

        tracing::info!(
            path = %path.display(),
            key = %locator,
            size_bytes = data.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage download successful"
        );

        Ok(StoredBlob {
            data: Bytes::from(data),
            content_type: media_type_for_extension(locator).to_string(),
        })
    }

    async fn delete(&self, locator: &str) -> StorageResult<()> {
        let path = self.key_to_path(locator)?;

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(());
        }

        fs::remove_file(&path).await.map_err(|e| {
            StorageError::DeleteFailed(format!("Failed to delete file {}: {}", path.display(), e))
        })?;

        tracing::info!(path = %path.display(), key = %locator, "Local storage delete successful");

        Ok(())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}
