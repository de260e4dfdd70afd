use crate::traits::{PutObject, Storage, StorageError, StorageResult, StoredBlob};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use clipdepot_core::classifier::media_type_for_extension;
use object_store::aws::AmazonS3Builder;
use object_store::path::Path;
use object_store::Error as ObjectStoreError;
use object_store::{
    Attribute, AttributeValue, Attributes, ObjectStore, ObjectStoreExt, PutMultipartOptions,
    PutOptions, PutPayload, Result as ObjectResult, WriteMultipart,
};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Payloads up to this size are sent in a single PUT; larger ones use multipart upload.
pub const SINGLE_PUT_MAX_BYTES: u64 = 5 * 1024 * 1024;
/// Part size for multipart uploads; S3 requires at least 5 MiB for all but the last part.
const MULTIPART_CHUNK_BYTES: usize = 8 * 1024 * 1024;
const MULTIPART_MAX_CONCURRENCY: usize = 4;
const READ_BUFFER_BYTES: usize = 64 * 1024;

/// S3 storage implementation
#[derive(Clone)]
pub struct S3Storage {
    store: Arc<dyn ObjectStore>,
    bucket: String,
    region: String,
    endpoint_url: Option<String>, // Custom endpoint for S3-compatible providers
}

impl S3Storage {
    /// Create a new S3Storage instance
    ///
    /// # Arguments
    /// * `bucket` - S3 bucket name
    /// * `region` - AWS region (or region identifier for S3-compatible providers)
    /// * `endpoint_url` - Optional custom endpoint URL for S3-compatible providers
    ///   (e.g., "http://localhost:9000" for MinIO)
    pub fn new(bucket: String, region: String, endpoint_url: Option<String>) -> StorageResult<Self> {
        // Credentials come from the standard AWS environment variables.
        let mut builder = AmazonS3Builder::from_env()
            .with_region(region.clone())
            .with_bucket_name(bucket.clone());

        if let Some(ref endpoint) = endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http);
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        Ok(Self::with_store(Arc::new(store), bucket, region, endpoint_url))
    }

    /// Wrap an existing object store, e.g. `object_store::memory::InMemory` in tests.
    pub fn with_store(
        store: Arc<dyn ObjectStore>,
        bucket: String,
        region: String,
        endpoint_url: Option<String>,
    ) -> Self {
        S3Storage {
            store,
            bucket,
            region,
            endpoint_url,
        }
    }

    /// Generate public URL for S3 object
    ///
    /// For AWS S3, uses the standard format: https://{bucket}.s3.{region}.amazonaws.com/{key}
    /// For S3-compatible providers, uses path style: {endpoint}/{bucket}/{key}
    fn generate_url(&self, key: &str) -> String {
        if let Some(ref endpoint) = self.endpoint_url {
            let base_url = endpoint.trim_end_matches('/');
            format!("{}/{}/{}", base_url, self.bucket, key)
        } else {
            format!(
                "https://{}.s3.{}.amazonaws.com/{}",
                self.bucket, self.region, key
            )
        }
    }

    async fn put_single(
        &self,
        location: &Path,
        content_type: &str,
        content: &mut (dyn AsyncRead + Send + Unpin),
        content_length: u64,
    ) -> StorageResult<u64> {
        let capacity = usize::try_from(content_length).unwrap_or(0);
        let mut buffer = Vec::with_capacity(capacity);
        content.read_to_end(&mut buffer).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to read from stream: {}", e))
        })?;
        let size = buffer.len() as u64;

        let opts = PutOptions {
            attributes: content_type_attributes(content_type),
            ..Default::default()
        };

        let result: ObjectResult<_> = self
            .store
            .put_opts(location, PutPayload::from(Bytes::from(buffer)), opts)
            .await;
        result.map_err(|e| StorageError::UploadFailed(e.to_string()))?;

        Ok(size)
    }

    async fn put_chunked(
        &self,
        location: &Path,
        content_type: &str,
        content: &mut (dyn AsyncRead + Send + Unpin),
    ) -> StorageResult<u64> {
        let opts = PutMultipartOptions {
            attributes: content_type_attributes(content_type),
            ..Default::default()
        };
        let upload = self
            .store
            .put_multipart_opts(location, opts)
            .await
            .map_err(|e| StorageError::UploadFailed(e.to_string()))?;
        let mut writer = WriteMultipart::new_with_chunk_size(upload, MULTIPART_CHUNK_BYTES);

        let mut buffer = vec![0u8; READ_BUFFER_BYTES];
        let mut size = 0u64;
        loop {
            let bytes_read = match content.read(&mut buffer).await {
                Ok(n) => n,
                Err(e) => {
                    if let Err(abort_err) = writer.abort().await {
                        tracing::warn!(error = %abort_err, key = %location, "S3 multipart abort failed");
                    }
                    return Err(StorageError::UploadFailed(format!(
                        "Failed to read from stream: {}",
                        e
                    )));
                }
            };
            if bytes_read == 0 {
                break;
            }

            if let Err(e) = writer.wait_for_capacity(MULTIPART_MAX_CONCURRENCY).await {
                if let Err(abort_err) = writer.abort().await {
                    tracing::warn!(error = %abort_err, key = %location, "S3 multipart abort failed");
                }
                return Err(StorageError::UploadFailed(e.to_string()));
            }
            writer.write(&buffer[..bytes_read]);
            size += bytes_read as u64;
        }

        // `finish` aborts the multipart upload itself when a part fails.
        writer
            .finish()
            .await
            .map_err(|e| StorageError::UploadFailed(e.to_string()))?;

        Ok(size)
    }
}

fn content_type_attributes(content_type: &str) -> Attributes {
    let mut attributes = Attributes::new();
    attributes.insert(
        Attribute::ContentType,
        AttributeValue::from(content_type.to_string()),
    );
    attributes
}

#[async_trait]
impl Storage for S3Storage {
    async fn put(
        &self,
        object: &PutObject<'_>,
        content: &mut (dyn AsyncRead + Send + Unpin),
    ) -> StorageResult<String> {
        let key = object.object_name();
        let location = Path::from(key.clone());
        let start = std::time::Instant::now();

        let result = if object.content_length <= SINGLE_PUT_MAX_BYTES {
            self.put_single(&location, object.media_type.as_str(), content, object.content_length)
                .await
        } else {
            self.put_chunked(&location, object.media_type.as_str(), content)
                .await
        };

        let size = result.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %self.bucket,
                key = %key,
                record_id = %object.record_id,
                size_bytes = object.content_length,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "S3 upload failed"
            );
            e
        })?;

        if size != object.content_length {
            // Object already landed; remove it so the short copy is never linked.
            if let Err(e) = self.store.delete(&location).await {
                tracing::warn!(error = %e, key = %key, "Failed to remove short S3 object");
            }
            return Err(StorageError::UploadFailed(format!(
                "Short write for {}: expected {} bytes, wrote {}",
                key, object.content_length, size
            )));
        }

        let url = self.generate_url(&key);

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            record_id = %object.record_id,
            size_bytes = size,
            multipart = size > SINGLE_PUT_MAX_BYTES,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 upload successful"
        );

        Ok(url)
    }

    async fn get(&self, locator: &str) -> StorageResult<StoredBlob> {
        let start = std::time::Instant::now();
        let location = Path::from(locator.to_string());

        let result: ObjectResult<_> = self.store.get(&location).await;
        let result = result.map_err(|e| match e {
            ObjectStoreError::NotFound { .. } => StorageError::NotFound(locator.to_string()),
            other => {
                tracing::error!(
                    error = %other,
                    bucket = %self.bucket,
                    key = %locator,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 download failed"
                );
                StorageError::DownloadFailed(other.to_string())
            }
        })?;

        let content_type = result
            .attributes
            .get(&Attribute::ContentType)
            .map(|value| value.to_string())
            .unwrap_or_else(|| media_type_for_extension(locator).to_string());
        let data = result
            .bytes()
            .await
            .map_err(|e| StorageError::DownloadFailed(e.to_string()))?;

        tracing::info!(
            bucket = %self.bucket,
            key = %locator,
            size_bytes = data.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 download successful"
        );

        Ok(StoredBlob { data, content_type })
    }

    async fn delete(&self, locator: &str) -> StorageResult<()> {
        let location = Path::from(locator.to_string());

        let result: ObjectResult<_> = self.store.delete(&location).await;
        match result {
            Ok(()) | Err(ObjectStoreError::NotFound { .. }) => Ok(()),
            Err(e) => {
                tracing::error!(error = %e, bucket = %self.bucket, key = %locator, "S3 delete failed");
                Err(StorageError::DeleteFailed(e.to_string()))
            }
        }
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}
