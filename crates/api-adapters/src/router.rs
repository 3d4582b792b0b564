use std::path::Path;

use axum::extract::DefaultBodyLimit;
use axum::http::HeaderName;
use axum::routing::{get, post};
use axum::Router;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::services::ServeDir;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::handlers;
use crate::state::AppState;

/// Phone photos arrive as multipart and again as base64 JSON.
pub const MAX_BODY_BYTES: usize = 32 * 1024 * 1024;

/// Builds the catalogue router. Stored photos under `media_root` are served
/// at `media_prefix`.
pub fn build_router(state: AppState, media_root: &Path, media_prefix: &str) -> Router {
    let request_id_header = HeaderName::from_static("x-request-id");

    Router::new()
        .route("/", get(handlers::list_boulders))
        .route("/health", get(handlers::health))
        .route("/boulders/new", get(handlers::new_boulder))
        .route("/boulders/{id}/edit", get(handlers::edit_boulder))
        .route("/boulders/form/{token}", post(handlers::submit_form))
        .route("/boulders/form/{token}/cancel", post(handlers::cancel_form))
        .route("/api/boulders", post(handlers::upload_image))
        .nest_service(media_prefix, ServeDir::new(media_root))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        .with_state(state)
}
