//! Upload handlers for thumbnails and videos.
//!
//! Both routes share one flow: parse the record ID, find the kind's form field, and hand
//! its byte stream to [`MediaUploadService`](crate::services::upload::MediaUploadService).
//! The field is streamed; nothing is buffered here.
//!
//! A multipart part's own length is never declared, but the request `Content-Length` bounds
//! it from below: everything besides the part fits in [`MULTIPART_OVERHEAD_BYTES`]. That bound
//! lets staging refuse an oversized upload before reading a byte of it.

use std::io;
use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartRejection, Multipart, Path, State},
    http::{header::CONTENT_LENGTH, HeaderMap},
    Json,
};
use clipdepot_core::{AppError, MediaKind, MediaRecord};
use futures::TryStreamExt;
use tokio_util::io::StreamReader;
use uuid::Uuid;

use crate::auth::BearerToken;
use crate::constants::MULTIPART_OVERHEAD_BYTES;
use crate::error::{multipart_error, HttpAppError};
use crate::services::upload::UploadRequest;
use crate::state::AppState;

/// Replace the thumbnail of a media record.
///
/// Accepts `image/jpeg` and `image/png` in the `thumbnail` form field.
#[tracing::instrument(skip(state, token, multipart), fields(operation = "upload_thumbnail"))]
pub async fn upload_thumbnail(
    State(state): State<Arc<AppState>>,
    Path(record_id): Path<String>,
    token: BearerToken,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<MediaRecord>, HttpAppError> {
    let min_part_length = minimum_part_length(&headers);
    handle_upload(&state, &record_id, token, min_part_length, multipart, MediaKind::Thumbnail)
        .await
}

/// Attach a video to a media record.
///
/// Accepts `video/mp4` in the `video` form field.
#[tracing::instrument(skip(state, token, multipart), fields(operation = "upload_video"))]
pub async fn upload_video(
    State(state): State<Arc<AppState>>,
    Path(record_id): Path<String>,
    token: BearerToken,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<MediaRecord>, HttpAppError> {
    let min_part_length = minimum_part_length(&headers);
    handle_upload(&state, &record_id, token, min_part_length, multipart, MediaKind::Video).await
}

async fn handle_upload(
    state: &AppState,
    raw_record_id: &str,
    BearerToken(token): BearerToken,
    min_part_length: Option<u64>,
    multipart: Result<Multipart, MultipartRejection>,
    kind: MediaKind,
) -> Result<Json<MediaRecord>, HttpAppError> {
    let record_id = Uuid::parse_str(raw_record_id).map_err(AppError::from)?;
    let mut multipart = multipart?;
    let field_name = kind.form_field();

    // Only the first part named after the kind is used.
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(field_name) {
            continue;
        }

        let content_type = field.content_type().unwrap_or_default().to_string();
        let body = StreamReader::new(Box::pin(field.map_err(io::Error::other)));

        let outcome = state
            .upload_service
            .upload(UploadRequest {
                bearer_token: token.as_deref(),
                record_id,
                kind,
                declared_content_type: &content_type,
                declared_length: min_part_length,
                body,
            })
            .await?;

        return Ok(Json(outcome.record));
    }

    Err(AppError::MalformedInput(format!("Missing form field '{}'", field_name)).into())
}

/// Smallest possible size of the upload part given the request `Content-Length`, if sent.
fn minimum_part_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map(|length| length.saturating_sub(MULTIPART_OVERHEAD_BYTES))
}
