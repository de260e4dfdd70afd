//! Media upload orchestrator
//!
//! Runs one upload through `authorizing → validating → staging → storing → linking → done`.
//! Every failure is terminal and is logged together with the state it happened in. The
//! request body is not touched until the caller is known to own the target record.

use std::sync::Arc;
use std::time::Instant;

use clipdepot_core::{
    classify, AppError, Authenticator, Config, ErrorMetadata, LogLevel, MediaKind, MediaRecord,
    MetadataStore, StorageKey,
};
use clipdepot_storage::{PutObject, StagingManager, Storage};
use tokio::io::AsyncRead;
use uuid::Uuid;

use super::types::{UploadOutcome, UploadRequest, UploadState};

/// Upload orchestrator shared by all upload handlers.
#[derive(Clone)]
pub struct MediaUploadService {
    config: Arc<Config>,
    authenticator: Arc<dyn Authenticator>,
    metadata: Arc<dyn MetadataStore>,
    storage: Arc<dyn Storage>,
    staging: StagingManager,
}

impl MediaUploadService {
    pub fn new(
        config: Arc<Config>,
        authenticator: Arc<dyn Authenticator>,
        metadata: Arc<dyn MetadataStore>,
        storage: Arc<dyn Storage>,
    ) -> Self {
        let staging = StagingManager::new(config.staging_dir.clone());
        Self {
            config,
            authenticator,
            metadata,
            storage,
            staging,
        }
    }

    /// Run the complete upload workflow and return the updated media record.
    pub async fn upload<R>(&self, request: UploadRequest<'_, R>) -> Result<UploadOutcome, AppError>
    where
        R: AsyncRead + Send + Unpin,
    {
        let record_id = request.record_id;
        let kind = request.kind;
        let start = Instant::now();
        let mut state = UploadState::Authorizing;

        let result = self.run(request, &mut state).await;

        match &result {
            Ok(outcome) => {
                tracing::info!(
                    record_id = %record_id,
                    kind = %kind,
                    key = %outcome.object_name,
                    size_bytes = outcome.size_bytes,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Media upload completed"
                );
            }
            Err(error) => log_failure(record_id, kind, state, error),
        }

        result
    }

    async fn run<R>(
        &self,
        request: UploadRequest<'_, R>,
        state: &mut UploadState,
    ) -> Result<UploadOutcome, AppError>
    where
        R: AsyncRead + Send + Unpin,
    {
        let UploadRequest {
            bearer_token,
            record_id,
            kind,
            declared_content_type,
            declared_length,
            mut body,
        } = request;

        transition(state, UploadState::Authorizing, record_id);
        let record = self.authorize(bearer_token, record_id).await?;

        transition(state, UploadState::Validating, record_id);
        let media_type = classify(declared_content_type, kind)?;

        transition(state, UploadState::Staging, record_id);
        let mut staged = self
            .staging
            .stage(
                &mut body,
                media_type,
                self.config.max_bytes_for(kind),
                self.config.staging_mode_for(kind),
                declared_length,
            )
            .await?;

        transition(state, UploadState::Storing, record_id);
        let media_type = staged.media_type().clone();
        let size_bytes = staged.len();
        let key = StorageKey::generate(&media_type);
        let object = PutObject {
            key: &key,
            record_id,
            kind,
            media_type: &media_type,
            content_length: size_bytes,
        };
        let timeout = self.config.storage_timeout();
        let put = tokio::time::timeout(timeout, self.storage.put(&object, &mut staged)).await;
        if let Err(e) = staged.release() {
            tracing::warn!(
                record_id = %record_id,
                error = %e,
                "Failed to remove staged upload"
            );
        }

        let url = match put {
            Ok(Ok(url)) => url,
            Ok(Err(e)) => return Err(AppError::Storage(e.to_string())),
            Err(_) => {
                return Err(AppError::Storage(format!(
                    "Storing {} timed out after {}s",
                    key,
                    timeout.as_secs()
                )))
            }
        };

        transition(state, UploadState::Linking, record_id);
        let record = self.link(record, kind, &key, url.clone()).await?;

        transition(state, UploadState::Done, record_id);
        Ok(UploadOutcome {
            record,
            url,
            object_name: key.object_name(),
            size_bytes,
        })
    }

    /// Authenticate, fetch, then check ownership; in that order.
    async fn authorize(
        &self,
        bearer_token: Option<&str>,
        record_id: Uuid,
    ) -> Result<MediaRecord, AppError> {
        let caller = self.authenticator.authenticate(bearer_token)?;

        let record = self
            .metadata
            .get(record_id)
            .await
            .map_err(|e| match e {
                AppError::Persistence(_) => e,
                other => AppError::Persistence(other.to_string()),
            })?
            .ok_or_else(|| AppError::NotFound(format!("Media record {} not found", record_id)))?;

        if record.user_id != caller {
            return Err(AppError::Forbidden(
                "Caller does not own this media record".to_string(),
            ));
        }

        Ok(record)
    }

    async fn link(
        &self,
        mut record: MediaRecord,
        kind: MediaKind,
        key: &StorageKey,
        url: String,
    ) -> Result<MediaRecord, AppError> {
        let record_id = record.id;
        record.set_url(kind, url);

        self.metadata.update(&record).await.map_err(|e| {
            // The object stays in storage; nothing references it.
            tracing::warn!(
                record_id = %record_id,
                key = %key,
                backend = %self.storage.backend_type(),
                error = %e,
                "Stored object orphaned after media record update failed"
            );
            match e {
                AppError::Persistence(_) => e,
                other => AppError::Persistence(other.to_string()),
            }
        })
    }
}

fn transition(state: &mut UploadState, next: UploadState, record_id: Uuid) {
    tracing::debug!(record_id = %record_id, from = %state, to = %next, "Upload state transition");
    *state = next;
}

fn log_failure(record_id: Uuid, kind: MediaKind, state: UploadState, error: &AppError) {
    let failed = UploadState::Failed;
    match error.log_level() {
        LogLevel::Debug => tracing::debug!(
            record_id = %record_id, kind = %kind, state = %state, to = %failed,
            error = %error, "Media upload failed"
        ),
        LogLevel::Warn => tracing::warn!(
            record_id = %record_id, kind = %kind, state = %state, to = %failed,
            error = %error, "Media upload failed"
        ),
        LogLevel::Error => tracing::error!(
            record_id = %record_id, kind = %kind, state = %state, to = %failed,
            error = %error, "Media upload failed"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use clipdepot_core::InMemoryMetadataStore;
    use clipdepot_storage::MemoryStorage;
    use std::io::Cursor;
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use tokio::io::ReadBuf;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    /// Accepts tokens of the form `user:<uuid>`.
    struct StaticAuthenticator;

    impl Authenticator for StaticAuthenticator {
        fn authenticate(&self, bearer_token: Option<&str>) -> Result<Uuid, AppError> {
            bearer_token
                .and_then(|t| t.strip_prefix("user:"))
                .and_then(|id| Uuid::parse_str(id).ok())
                .ok_or_else(|| AppError::Unauthorized("bad token".to_string()))
        }
    }

    /// Metadata store whose reads or writes fail.
    struct BrokenMetadataStore {
        inner: InMemoryMetadataStore,
        fail_get: bool,
    }

    #[async_trait]
    impl MetadataStore for BrokenMetadataStore {
        async fn get(&self, id: Uuid) -> Result<Option<MediaRecord>, AppError> {
            if self.fail_get {
                return Err(AppError::Persistence("connection refused".to_string()));
            }
            self.inner.get(id).await
        }

        async fn update(&self, _record: &MediaRecord) -> Result<MediaRecord, AppError> {
            Err(AppError::Persistence("connection reset".to_string()))
        }
    }

    /// Body that fails the test if it is ever read.
    struct UntouchableBody;

    impl AsyncRead for UntouchableBody {
        fn poll_read(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &mut ReadBuf<'_>,
        ) -> Poll<std::io::Result<()>> {
            panic!("body must not be read");
        }
    }

    struct Fixture {
        service: MediaUploadService,
        metadata: InMemoryMetadataStore,
        storage: MemoryStorage,
        record: MediaRecord,
        _staging_dir: tempfile::TempDir,
    }

    async fn fixture() -> Fixture {
        let staging_dir = tempfile::tempdir().unwrap();
        let mut config = Config::new(SECRET);
        config.staging_dir = staging_dir.path().to_path_buf();
        config.thumbnail_max_bytes = 4096;

        let metadata = InMemoryMetadataStore::new();
        let record = MediaRecord::new(Uuid::new_v4(), "boots");
        metadata.insert(record.clone()).await;
        let storage = MemoryStorage::new(&config.public_base_url);

        let service = MediaUploadService::new(
            Arc::new(config),
            Arc::new(StaticAuthenticator),
            Arc::new(metadata.clone()),
            Arc::new(storage.clone()),
        );

        Fixture {
            service,
            metadata,
            storage,
            record,
            _staging_dir: staging_dir,
        }
    }

    fn thumbnail_request<'a, R>(
        token: &'a str,
        record_id: Uuid,
        content_type: &'a str,
        body: R,
    ) -> UploadRequest<'a, R> {
        UploadRequest {
            bearer_token: Some(token),
            record_id,
            kind: MediaKind::Thumbnail,
            declared_content_type: content_type,
            declared_length: None,
            body,
        }
    }

    #[tokio::test]
    async fn test_owner_upload_links_url() {
        let f = fixture().await;
        let token = format!("user:{}", f.record.user_id);
        let payload = vec![0x89u8; 2048];

        let outcome = f
            .service
            .upload(thumbnail_request(&token, f.record.id, "image/png", Cursor::new(payload.clone())))
            .await
            .unwrap();

        assert_eq!(outcome.size_bytes, 2048);
        assert!(outcome.object_name.ends_with(".png"));
        assert_eq!(outcome.record.thumbnail_url.as_deref(), Some(outcome.url.as_str()));
        assert_eq!(outcome.record.user_id, f.record.user_id);

        let blob = f
            .storage
            .get(&MemoryStorage::locator(f.record.id, MediaKind::Thumbnail))
            .await
            .unwrap();
        assert_eq!(blob.data.as_ref(), payload.as_slice());
    }

    #[tokio::test]
    async fn test_non_owner_is_forbidden_before_body_is_read() {
        let f = fixture().await;
        let token = format!("user:{}", Uuid::new_v4());

        let err = f
            .service
            .upload(thumbnail_request(&token, f.record.id, "image/png", UntouchableBody))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Forbidden(_)));
        assert!(f.storage.is_empty().await);
        let record = f.metadata.get(f.record.id).await.unwrap().unwrap();
        assert_eq!(record.thumbnail_url, None);
    }

    #[tokio::test]
    async fn test_bad_token_is_unauthorized() {
        let f = fixture().await;
        let err = f
            .service
            .upload(thumbnail_request("nobody", f.record.id, "image/png", UntouchableBody))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_missing_record_is_not_found() {
        let f = fixture().await;
        let token = format!("user:{}", f.record.user_id);
        let err = f
            .service
            .upload(thumbnail_request(&token, Uuid::new_v4(), "image/png", UntouchableBody))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_disallowed_type_leaves_record_unchanged() {
        let f = fixture().await;
        let token = format!("user:{}", f.record.user_id);

        let err = f
            .service
            .upload(thumbnail_request(&token, f.record.id, "image/gif", UntouchableBody))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::UnsupportedMediaType(_)));
        assert!(f.storage.is_empty().await);
        let record = f.metadata.get(f.record.id).await.unwrap().unwrap();
        assert_eq!(record, f.record);
    }

    #[tokio::test]
    async fn test_oversized_payload_is_rejected() {
        let f = fixture().await;
        let token = format!("user:{}", f.record.user_id);

        let err = f
            .service
            .upload(thumbnail_request(&token, f.record.id, "image/jpeg", Cursor::new(vec![0u8; 4097])))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::PayloadTooLarge(_)));
        assert!(f.storage.is_empty().await);
    }

    #[tokio::test]
    async fn test_declared_oversized_payload_is_rejected_before_reading() {
        let f = fixture().await;
        let token = format!("user:{}", f.record.user_id);
        let mut request = thumbnail_request(&token, f.record.id, "image/png", UntouchableBody);
        request.declared_length = Some(4097);

        let err = f.service.upload(request).await.unwrap_err();

        assert!(matches!(err, AppError::PayloadTooLarge(_)));
        assert!(f.storage.is_empty().await);
    }

    #[tokio::test]
    async fn test_fetch_failure_is_persistence_error() {
        let staging_dir = tempfile::tempdir().unwrap();
        let mut config = Config::new(SECRET);
        config.staging_dir = staging_dir.path().to_path_buf();
        let service = MediaUploadService::new(
            Arc::new(config),
            Arc::new(StaticAuthenticator),
            Arc::new(BrokenMetadataStore {
                inner: InMemoryMetadataStore::new(),
                fail_get: true,
            }),
            Arc::new(MemoryStorage::new("http://localhost:8091")),
        );

        let token = format!("user:{}", Uuid::new_v4());
        let err = service
            .upload(thumbnail_request(&token, Uuid::new_v4(), "image/png", UntouchableBody))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Persistence(_)));
    }

    #[tokio::test]
    async fn test_link_failure_is_persistence_error_after_store() {
        let staging_dir = tempfile::tempdir().unwrap();
        let mut config = Config::new(SECRET);
        config.staging_dir = staging_dir.path().to_path_buf();

        let inner = InMemoryMetadataStore::new();
        let record = MediaRecord::new(Uuid::new_v4(), "boots");
        inner.insert(record.clone()).await;
        let storage = MemoryStorage::new("http://localhost:8091");
        let service = MediaUploadService::new(
            Arc::new(config),
            Arc::new(StaticAuthenticator),
            Arc::new(BrokenMetadataStore {
                inner,
                fail_get: false,
            }),
            Arc::new(storage.clone()),
        );

        let token = format!("user:{}", record.user_id);
        let err = service
            .upload(thumbnail_request(&token, record.id, "image/png", Cursor::new(vec![1u8; 64])))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Persistence(_)));
        // The object was stored before linking failed and is left in place.
        assert_eq!(storage.len().await, 1);
    }
}
