//! Route configuration and setup

use crate::constants::{API_PREFIX, MULTIPART_OVERHEAD_BYTES};
use crate::handlers;
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};
use clipdepot_core::{MediaKind, StorageBackend};
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Setup all application routes
pub fn setup_routes(state: Arc<AppState>) -> Router<()> {
    let config = &state.config;
    let thumbnail_limit = body_limit(config.max_bytes_for(MediaKind::Thumbnail));
    let video_limit = body_limit(config.max_bytes_for(MediaKind::Video));

    let api_routes = Router::new()
        .route(
            "/media/{record_id}/thumbnail",
            put(handlers::media_upload::upload_thumbnail)
                .layer(DefaultBodyLimit::max(thumbnail_limit)),
        )
        .route(
            "/media/{record_id}/video",
            post(handlers::media_upload::upload_video).layer(DefaultBodyLimit::max(video_limit)),
        )
        .route("/thumbnails/{record_id}", get(handlers::media_get::get_thumbnail))
        .route("/videos/{record_id}", get(handlers::media_get::get_video));

    let mut router = Router::new()
        .route("/health", get(handlers::health::health_check))
        .nest(API_PREFIX, api_routes);

    if config.storage_backend == StorageBackend::Local {
        tracing::info!(root = %config.assets_root.display(), "Serving local assets under /assets");
        router = router.nest_service("/assets", ServeDir::new(&config.assets_root));
    }

    router.layer(TraceLayer::new_for_http()).with_state(state)
}

/// Body limit for an upload route: the kind's ceiling plus multipart framing.
fn body_limit(max_bytes: u64) -> usize {
    usize::try_from(max_bytes.saturating_add(MULTIPART_OVERHEAD_BYTES)).unwrap_or(usize::MAX)
}
