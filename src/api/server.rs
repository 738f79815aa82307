//! HTTP router setup
//!
//! Builds the Axum router over a shared application context. Binding
//! and serving happen in `main.rs` so the router stays testable with
//! `tower::ServiceExt::oneshot`.

use axum::{
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::cache::AttachmentCache;
use crate::events::EventBus;
use crate::playback::Orchestrator;

use super::handlers;
use super::sse;

/// Shared application context passed to all handlers
///
/// Cloning is cheap; every field is an `Arc`.
#[derive(Clone)]
pub struct AppContext {
    pub orchestrator: Arc<Orchestrator>,
    pub events: Arc<EventBus>,
    /// Attachment cache, when one is configured
    pub cache: Option<Arc<dyn AttachmentCache>>,
}

/// Create the API router
pub fn router(ctx: AppContext) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health))
        // Playback
        .route("/status", get(handlers::player_status))
        .route("/current", get(handlers::currently_playing))
        .route("/summary", get(handlers::summary))
        .route("/channel", get(handlers::default_channel))
        .route("/stop", post(handlers::stop))
        // Queue management
        .route("/queue", get(handlers::get_queue))
        .route("/queue", post(handlers::enqueue))
        .route("/queue", delete(handlers::clear_queue))
        .route("/queue/next", post(handlers::skip))
        .route("/queue/:index", delete(handlers::remove_queued))
        .route("/history", get(handlers::history))
        // Attachment cache gate
        .route(
            "/cache/attachments/:source_type/:source_id",
            get(handlers::cache_lookup),
        )
        .route("/cache/attachments", post(handlers::cache_insert))
        // SSE event stream
        .route("/events", get(sse::event_stream))
        .with_state(ctx)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
