//! Test helpers: build AppState and router for integration tests.
//!
//! Run from workspace root: `cargo test -p clipdepot-api`. Media records live in an
//! in-process store; no database is needed.

#![allow(dead_code)]

use axum_test::TestServer;
use clipdepot_api::auth::issue_token;
use clipdepot_api::setup::{routes, services};
use clipdepot_core::{Config, InMemoryMetadataStore, MediaRecord, StorageBackend};
use std::path::Path;
use tempfile::TempDir;
use uuid::Uuid;

pub const TEST_JWT_SECRET: &str = "test-secret-that-is-at-least-32-characters";

/// Test application: server, metadata store and owned temp dirs.
pub struct TestApp {
    pub server: TestServer,
    pub metadata: InMemoryMetadataStore,
    pub staging_dir: TempDir,
    pub assets_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    /// Insert a fresh media record owned by `user_id`.
    pub async fn create_record(&self, user_id: Uuid) -> MediaRecord {
        let record = MediaRecord::new(user_id, "Test clip");
        self.metadata.insert(record.clone()).await;
        record
    }

    pub async fn record(&self, id: Uuid) -> MediaRecord {
        use clipdepot_core::MetadataStore;
        self.metadata
            .get(id)
            .await
            .expect("metadata read failed")
            .expect("record missing")
    }

    pub fn staging_is_empty(&self) -> bool {
        dir_is_empty(self.staging_dir.path())
    }
}

pub fn bearer(user_id: Uuid) -> String {
    let token = issue_token(user_id, TEST_JWT_SECRET, chrono::Duration::minutes(5))
        .expect("Failed to issue token");
    format!("Bearer {}", token)
}

fn dir_is_empty(path: &Path) -> bool {
    std::fs::read_dir(path)
        .map(|mut entries| entries.next().is_none())
        .unwrap_or(true)
}

/// Setup a test app on the given backend with small size ceilings.
pub async fn setup_test_app(backend: StorageBackend) -> TestApp {
    setup_test_app_with(backend, |_| {}).await
}

pub async fn setup_test_app_with(
    backend: StorageBackend,
    customize: impl FnOnce(&mut Config),
) -> TestApp {
    let staging_dir = tempfile::tempdir().expect("Failed to create staging dir");
    let assets_dir = tempfile::tempdir().expect("Failed to create assets dir");

    let mut config = Config::new(TEST_JWT_SECRET);
    config.storage_backend = backend;
    config.assets_root = assets_dir.path().to_path_buf();
    config.staging_dir = staging_dir.path().to_path_buf();
    config.thumbnail_max_bytes = 64 * 1024;
    config.video_max_bytes = 256 * 1024;
    customize(&mut config);

    let metadata = InMemoryMetadataStore::new();
    let state = services::initialize_services(config, std::sync::Arc::new(metadata.clone()))
        .await
        .expect("Failed to initialize services");
    let app = routes::setup_routes(state);
    let server = TestServer::new(app.into_make_service()).expect("Failed to create test server");

    TestApp {
        server,
        metadata,
        staging_dir,
        assets_dir,
    }
}

/// Deterministic payload of `len` bytes starting with the PNG signature.
pub fn png_payload(len: usize) -> Vec<u8> {
    let mut data = vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
    data.extend((0..len.saturating_sub(8)).map(|i| (i % 251) as u8));
    data.truncate(len);
    data
}

/// Deterministic payload of `len` bytes shaped like an MP4 `ftyp` box.
pub fn mp4_payload(len: usize) -> Vec<u8> {
    let mut data = vec![0x00, 0x00, 0x00, 0x18, b'f', b't', b'y', b'p', b'i', b's', b'o', b'm'];
    data.extend((0..len.saturating_sub(12)).map(|i| (i % 239) as u8));
    data.truncate(len);
    data
}
