//! Upload API integration tests.
//!
//! Run with: `cargo test -p clipdepot-api --test upload_test`

mod helpers;

use axum::http::StatusCode;
use axum_test::multipart::{MultipartForm, Part};
use bytes::Bytes;
use clipdepot_core::{MediaRecord, StorageBackend};
use helpers::{bearer, mp4_payload, png_payload, setup_test_app, setup_test_app_with};
use uuid::Uuid;

fn form(field: &str, data: Vec<u8>, file_name: &str, mime_type: &str) -> MultipartForm {
    let part = Part::bytes(Bytes::from(data))
        .file_name(file_name.to_string())
        .mime_type(mime_type.to_string());
    MultipartForm::new().add_part(field.to_string(), part)
}

const BOUNDARY: &str = "clipdepot-test-boundary";

/// A single-part form encoded up front, so the request can carry its `Content-Length`.
fn encoded_form(field: &str, data: &[u8], file_name: &str, mime_type: &str) -> Bytes {
    let mut body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: {mime_type}\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    Bytes::from(body)
}

#[tokio::test]
async fn test_owner_uploads_thumbnail_and_reads_it_back() {
    let app = setup_test_app(StorageBackend::Memory).await;
    let owner = Uuid::new_v4();
    let record = app.create_record(owner).await;
    let payload = png_payload(2048);

    let response = app
        .client()
        .put(&format!("/api/media/{}/thumbnail", record.id))
        .add_header("Authorization", bearer(owner))
        .multipart(form("thumbnail", payload.clone(), "thumb.png", "image/png"))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let updated: MediaRecord = response.json();
    let expected_url = format!("http://localhost:8091/api/thumbnails/{}", record.id);
    assert_eq!(updated.thumbnail_url.as_deref(), Some(expected_url.as_str()));
    assert_eq!(updated.user_id, owner);
    assert_eq!(updated.title, record.title);
    assert_eq!(app.record(record.id).await.thumbnail_url, updated.thumbnail_url);

    let fetched = app
        .client()
        .get(&format!("/api/thumbnails/{}", record.id))
        .await;
    assert_eq!(fetched.status_code(), StatusCode::OK);
    assert_eq!(fetched.header("content-type"), "image/png");
    assert_eq!(fetched.as_bytes().as_ref(), payload.as_slice());
}

#[tokio::test]
async fn test_memory_video_upload_keeps_thumbnail() {
    let app = setup_test_app(StorageBackend::Memory).await;
    let owner = Uuid::new_v4();
    let record = app.create_record(owner).await;
    let thumbnail = png_payload(2048);
    let video = mp4_payload(8 * 1024);

    let response = app
        .client()
        .put(&format!("/api/media/{}/thumbnail", record.id))
        .add_header("Authorization", bearer(owner))
        .multipart(form("thumbnail", thumbnail.clone(), "thumb.png", "image/png"))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let response = app
        .client()
        .post(&format!("/api/media/{}/video", record.id))
        .add_header("Authorization", bearer(owner))
        .multipart(form("video", video.clone(), "clip.mp4", "video/mp4"))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let updated: MediaRecord = response.json();
    let expected_video_url = format!("http://localhost:8091/api/videos/{}", record.id);
    assert_eq!(updated.video_url.as_deref(), Some(expected_video_url.as_str()));
    assert_ne!(updated.thumbnail_url, updated.video_url);

    let fetched = app
        .client()
        .get(&format!("/api/thumbnails/{}", record.id))
        .await;
    assert_eq!(fetched.status_code(), StatusCode::OK);
    assert_eq!(fetched.header("content-type"), "image/png");
    assert_eq!(fetched.as_bytes().as_ref(), thumbnail.as_slice());

    let fetched = app.client().get(&format!("/api/videos/{}", record.id)).await;
    assert_eq!(fetched.status_code(), StatusCode::OK);
    assert_eq!(fetched.header("content-type"), "video/mp4");
    assert_eq!(fetched.as_bytes().as_ref(), video.as_slice());
}

#[tokio::test]
async fn test_non_owner_is_forbidden_and_record_unchanged() {
    let app = setup_test_app(StorageBackend::Memory).await;
    let record = app.create_record(Uuid::new_v4()).await;

    let response = app
        .client()
        .put(&format!("/api/media/{}/thumbnail", record.id))
        .add_header("Authorization", bearer(Uuid::new_v4()))
        .multipart(form("thumbnail", png_payload(2048), "thumb.png", "image/png"))
        .await;

    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "FORBIDDEN");
    assert_eq!(app.record(record.id).await, record);

    let fetched = app
        .client()
        .get(&format!("/api/thumbnails/{}", record.id))
        .await;
    assert_eq!(fetched.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let app = setup_test_app(StorageBackend::Memory).await;
    let record = app.create_record(Uuid::new_v4()).await;

    let response = app
        .client()
        .put(&format!("/api/media/{}/thumbnail", record.id))
        .multipart(form("thumbnail", png_payload(512), "thumb.png", "image/png"))
        .await;

    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_gif_thumbnail_is_not_acceptable() {
    let app = setup_test_app(StorageBackend::Memory).await;
    let owner = Uuid::new_v4();
    let record = app.create_record(owner).await;

    let response = app
        .client()
        .put(&format!("/api/media/{}/thumbnail", record.id))
        .add_header("Authorization", bearer(owner))
        .multipart(form("thumbnail", b"GIF89a".to_vec(), "thumb.gif", "image/gif"))
        .await;

    assert_eq!(response.status_code(), StatusCode::NOT_ACCEPTABLE);
    assert_eq!(app.record(record.id).await, record);
}

#[tokio::test]
async fn test_webm_video_is_not_acceptable() {
    let app = setup_test_app(StorageBackend::Local).await;
    let owner = Uuid::new_v4();
    let record = app.create_record(owner).await;

    let response = app
        .client()
        .post(&format!("/api/media/{}/video", record.id))
        .add_header("Authorization", bearer(owner))
        .multipart(form("video", vec![0x1A, 0x45, 0xDF, 0xA3], "clip.webm", "video/webm"))
        .await;

    assert_eq!(response.status_code(), StatusCode::NOT_ACCEPTABLE);
    assert_eq!(app.record(record.id).await.video_url, None);
}

#[tokio::test]
async fn test_oversized_video_is_rejected_without_leftovers() {
    let app = setup_test_app_with(StorageBackend::Local, |config| {
        config.video_max_bytes = 1024;
    })
    .await;
    let owner = Uuid::new_v4();
    let record = app.create_record(owner).await;

    let response = app
        .client()
        .post(&format!("/api/media/{}/video", record.id))
        .add_header("Authorization", bearer(owner))
        .multipart(form("video", mp4_payload(4096), "clip.mp4", "video/mp4"))
        .await;

    assert_eq!(response.status_code(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(app.record(record.id).await.video_url, None);
    assert!(app.staging_is_empty());
    assert!(std::fs::read_dir(app.assets_dir.path()).unwrap().next().is_none());
}

#[tokio::test]
async fn test_video_with_oversized_content_length_is_rejected() {
    let app = setup_test_app_with(StorageBackend::Local, |config| {
        config.video_max_bytes = 1024;
    })
    .await;
    let owner = Uuid::new_v4();
    let record = app.create_record(owner).await;
    let body = encoded_form("video", &mp4_payload(2 * 1024 * 1024), "clip.mp4", "video/mp4");

    let response = app
        .client()
        .post(&format!("/api/media/{}/video", record.id))
        .add_header("Authorization", bearer(owner))
        .add_header("Content-Length", body.len())
        .content_type(&format!("multipart/form-data; boundary={}", BOUNDARY))
        .bytes(body)
        .await;

    assert_eq!(response.status_code(), StatusCode::PAYLOAD_TOO_LARGE);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "PAYLOAD_TOO_LARGE");
    assert_eq!(app.record(record.id).await.video_url, None);
    assert!(app.staging_is_empty());
    assert!(std::fs::read_dir(app.assets_dir.path()).unwrap().next().is_none());
}

#[tokio::test]
async fn test_local_video_upload_is_served_from_assets() {
    let app = setup_test_app(StorageBackend::Local).await;
    let owner = Uuid::new_v4();
    let record = app.create_record(owner).await;
    let payload = mp4_payload(100 * 1024);

    let response = app
        .client()
        .post(&format!("/api/media/{}/video", record.id))
        .add_header("Authorization", bearer(owner))
        .multipart(form("video", payload.clone(), "clip.mp4", "video/mp4"))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let updated: MediaRecord = response.json();
    let url = updated.video_url.expect("video_url set");
    let path = url
        .strip_prefix("http://localhost:8091")
        .expect("URL built from the public base URL");
    assert!(path.starts_with("/assets/"));
    assert!(path.ends_with(".mp4"));
    assert_eq!(updated.thumbnail_url, None);
    assert!(app.staging_is_empty());

    let fetched = app.client().get(path).await;
    assert_eq!(fetched.status_code(), StatusCode::OK);
    assert_eq!(fetched.as_bytes().as_ref(), payload.as_slice());
}

#[tokio::test]
async fn test_invalid_record_id_is_bad_request() {
    let app = setup_test_app(StorageBackend::Memory).await;

    let response = app
        .client()
        .put("/api/media/not-a-uuid/thumbnail")
        .add_header("Authorization", bearer(Uuid::new_v4()))
        .multipart(form("thumbnail", png_payload(64), "thumb.png", "image/png"))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_record_is_not_found() {
    let app = setup_test_app(StorageBackend::Memory).await;

    let response = app
        .client()
        .put(&format!("/api/media/{}/thumbnail", Uuid::new_v4()))
        .add_header("Authorization", bearer(Uuid::new_v4()))
        .multipart(form("thumbnail", png_payload(64), "thumb.png", "image/png"))
        .await;

    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_missing_form_field_is_bad_request() {
    let app = setup_test_app(StorageBackend::Memory).await;
    let owner = Uuid::new_v4();
    let record = app.create_record(owner).await;

    let response = app
        .client()
        .put(&format!("/api/media/{}/thumbnail", record.id))
        .add_header("Authorization", bearer(owner))
        .multipart(form("file", png_payload(64), "thumb.png", "image/png"))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("thumbnail"));
}

#[tokio::test]
async fn test_health_reports_backend() {
    let app = setup_test_app(StorageBackend::Memory).await;

    let response = app.client().get("/health").await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "alive");
    assert_eq!(body["storage"], "memory");
}
