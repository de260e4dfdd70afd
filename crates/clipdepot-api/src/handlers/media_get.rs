use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::header::CONTENT_TYPE,
    response::IntoResponse,
};
use clipdepot_core::{AppError, MediaKind, StorageBackend};
use clipdepot_storage::MemoryStorage;
use uuid::Uuid;

use crate::error::HttpAppError;
use crate::state::AppState;

/// Serve a thumbnail held by the in-process backend.
#[tracing::instrument(skip(state), fields(operation = "get_thumbnail"))]
pub async fn get_thumbnail(
    State(state): State<Arc<AppState>>,
    Path(record_id): Path<String>,
) -> Result<impl IntoResponse, HttpAppError> {
    serve_stored(&state, &record_id, MediaKind::Thumbnail).await
}

/// Serve a video held by the in-process backend.
#[tracing::instrument(skip(state), fields(operation = "get_video"))]
pub async fn get_video(
    State(state): State<Arc<AppState>>,
    Path(record_id): Path<String>,
) -> Result<impl IntoResponse, HttpAppError> {
    serve_stored(&state, &record_id, MediaKind::Video).await
}

// Other backends serve their objects directly, so these routes only answer for `memory`.
async fn serve_stored(
    state: &AppState,
    record_id: &str,
    kind: MediaKind,
) -> Result<impl IntoResponse, HttpAppError> {
    let record_id = Uuid::parse_str(record_id).map_err(AppError::from)?;

    if state.storage.backend_type() != StorageBackend::Memory {
        return Err(AppError::NotFound(format!("{} not found", kind)).into());
    }

    let blob = state
        .storage
        .get(&MemoryStorage::locator(record_id, kind))
        .await?;

    Ok(([(CONTENT_TYPE, blob.content_type)], blob.data))
}
