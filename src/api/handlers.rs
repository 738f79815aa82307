//! HTTP request handlers
//!
//! REST endpoints for queue and playback control, plus the two-call
//! attachment cache gate.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info};

use crate::api::server::AppContext;
use crate::cache::{CacheEntry, NewCacheEntry};
use crate::error::Error;
use crate::model::{CurrentlyPlaying, PlayerStatus, TrackDescriptor};
use crate::playback::QueueSummary;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    status: String,
}

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    limit: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct EnqueueResponse {
    status: String,
    /// 1-based position among pending tracks
    position: u64,
    /// True when this request started playback immediately
    started: bool,
}

#[derive(Debug, Serialize)]
pub struct QueueResponse {
    total: u64,
    queue: Vec<TrackDescriptor>,
}

#[derive(Debug, Serialize)]
pub struct SkipResponse {
    status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    track: Option<TrackDescriptor>,
}

#[derive(Debug, Serialize)]
pub struct PlayerStatusResponse {
    /// Engine-reported status; null when the engine is unreachable and
    /// its mirror has expired (not the same as stopped)
    status: Option<PlayerStatus>,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    history: Vec<TrackDescriptor>,
}

#[derive(Debug, Serialize)]
pub struct ChannelResponse {
    channel: Option<String>,
}

/// Map an orchestration error to an HTTP status code
fn error_status(e: &Error) -> StatusCode {
    match e {
        Error::Engine(_) => StatusCode::BAD_GATEWAY,
        Error::Codec(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_body(e: &Error) -> Json<StatusResponse> {
    Json(StatusResponse {
        status: format!("error: {}", e),
    })
}

// ============================================================================
// Health Endpoint
// ============================================================================

/// GET /health - Health check endpoint
pub async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "module": "juke",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

// ============================================================================
// Playback Endpoints
// ============================================================================

/// GET /status - Engine player status (mirror first, direct poll fallback)
pub async fn player_status(
    State(ctx): State<AppContext>,
) -> Result<Json<PlayerStatusResponse>, (StatusCode, Json<StatusResponse>)> {
    match ctx.orchestrator.player_status().await {
        Ok(status) => Ok(Json(PlayerStatusResponse { status })),
        Err(e) => {
            error!("Failed to read player status: {}", e);
            Err((error_status(&e), error_body(&e)))
        }
    }
}

/// GET /current - Currently playing record, or null
pub async fn currently_playing(
    State(ctx): State<AppContext>,
) -> Result<Json<Option<CurrentlyPlaying>>, (StatusCode, Json<StatusResponse>)> {
    match ctx.orchestrator.currently_playing().await {
        Ok(current) => Ok(Json(current)),
        Err(e) => {
            error!("Failed to read current playback: {}", e);
            Err((error_status(&e), error_body(&e)))
        }
    }
}

/// GET /summary - Condensed playback-plus-queue view
pub async fn summary(
    State(ctx): State<AppContext>,
) -> Result<Json<QueueSummary>, (StatusCode, Json<StatusResponse>)> {
    match ctx.orchestrator.summary().await {
        Ok(summary) => Ok(Json(summary)),
        Err(e) => {
            error!("Failed to build summary: {}", e);
            Err((error_status(&e), error_body(&e)))
        }
    }
}

/// GET /channel - Delivery channel of the most recent request
pub async fn default_channel(
    State(ctx): State<AppContext>,
) -> Result<Json<ChannelResponse>, (StatusCode, Json<StatusResponse>)> {
    match ctx.orchestrator.default_channel().await {
        Ok(channel) => Ok(Json(ChannelResponse { channel })),
        Err(e) => {
            error!("Failed to read default channel: {}", e);
            Err((error_status(&e), error_body(&e)))
        }
    }
}

/// POST /stop - Ask the engine to stop playback
pub async fn stop(
    State(ctx): State<AppContext>,
) -> Result<Json<StatusResponse>, (StatusCode, Json<StatusResponse>)> {
    info!("Stop request");

    match ctx.orchestrator.stop().await {
        Ok(()) => Ok(Json(StatusResponse {
            status: "ok".to_string(),
        })),
        Err(e) => {
            error!("Stop command failed: {}", e);
            Err((error_status(&e), error_body(&e)))
        }
    }
}

// ============================================================================
// Queue Endpoints
// ============================================================================

/// POST /queue - Enqueue a track
pub async fn enqueue(
    State(ctx): State<AppContext>,
    Json(track): Json<TrackDescriptor>,
) -> Result<Json<EnqueueResponse>, (StatusCode, Json<StatusResponse>)> {
    info!("Enqueue request for \"{}\" ({})", track.title, track.platform);

    match ctx.orchestrator.enqueue(track).await {
        Ok(enqueued) => Ok(Json(EnqueueResponse {
            status: "ok".to_string(),
            position: enqueued.position,
            started: enqueued.started,
        })),
        Err(e) => {
            error!("Enqueue failed: {}", e);
            Err((error_status(&e), error_body(&e)))
        }
    }
}

/// GET /queue - Pending tracks in play order
pub async fn get_queue(
    State(ctx): State<AppContext>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<QueueResponse>, (StatusCode, Json<StatusResponse>)> {
    let total = match ctx.orchestrator.queue_len().await {
        Ok(total) => total,
        Err(e) => {
            error!("Failed to read queue length: {}", e);
            return Err((error_status(&e), error_body(&e)));
        }
    };

    match ctx.orchestrator.queue_page(query.limit).await {
        Ok(queue) => Ok(Json(QueueResponse { total, queue })),
        Err(e) => {
            error!("Failed to read queue: {}", e);
            Err((error_status(&e), error_body(&e)))
        }
    }
}

/// POST /queue/next - Skip to the next pending track
///
/// An empty queue is reported as such; whatever is playing keeps playing.
pub async fn skip(
    State(ctx): State<AppContext>,
) -> Result<Json<SkipResponse>, (StatusCode, Json<StatusResponse>)> {
    info!("Skip request");

    match ctx.orchestrator.skip().await {
        Ok(Some(track)) => Ok(Json(SkipResponse {
            status: "started".to_string(),
            track: Some(track),
        })),
        Ok(None) => Ok(Json(SkipResponse {
            status: "empty".to_string(),
            track: None,
        })),
        Err(e) => {
            error!("Skip failed: {}", e);
            Err((error_status(&e), error_body(&e)))
        }
    }
}

/// DELETE /queue - Clear all pending tracks
pub async fn clear_queue(
    State(ctx): State<AppContext>,
) -> Result<StatusCode, (StatusCode, Json<StatusResponse>)> {
    info!("Clear queue request");

    match ctx.orchestrator.clear_queue().await {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(e) => {
            error!("Failed to clear queue: {}", e);
            Err((error_status(&e), error_body(&e)))
        }
    }
}

/// DELETE /queue/:index - Remove the pending track at a 0-based index
pub async fn remove_queued(
    State(ctx): State<AppContext>,
    Path(index): Path<u64>,
) -> Result<StatusCode, (StatusCode, Json<StatusResponse>)> {
    info!("Remove queue entry request: index {}", index);

    match ctx.orchestrator.remove_queued(index).await {
        Ok(true) => Ok(StatusCode::NO_CONTENT),
        Ok(false) => Err((
            StatusCode::NOT_FOUND,
            Json(StatusResponse {
                status: format!("error: no queue entry at index {}", index),
            }),
        )),
        Err(e) => {
            error!("Failed to remove queue entry: {}", e);
            Err((error_status(&e), error_body(&e)))
        }
    }
}

/// GET /history - Recently started tracks, newest first
pub async fn history(
    State(ctx): State<AppContext>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<HistoryResponse>, (StatusCode, Json<StatusResponse>)> {
    match ctx.orchestrator.history(query.limit.unwrap_or(10)).await {
        Ok(history) => Ok(Json(HistoryResponse { history })),
        Err(e) => {
            error!("Failed to read play history: {}", e);
            Err((error_status(&e), error_body(&e)))
        }
    }
}

// ============================================================================
// Attachment Cache Endpoints
// ============================================================================

/// GET /cache/attachments/:source_type/:source_id - Cache lookup
///
/// A hit bumps the entry's use counter; a miss is 404 and the caller is
/// expected to upload and then POST the result back.
pub async fn cache_lookup(
    State(ctx): State<AppContext>,
    Path((source_type, source_id)): Path<(String, String)>,
) -> Result<Json<CacheEntry>, (StatusCode, Json<StatusResponse>)> {
    let Some(cache) = &ctx.cache else {
        return Err((
            StatusCode::NOT_FOUND,
            Json(StatusResponse {
                status: "miss".to_string(),
            }),
        ));
    };

    match cache.lookup(&source_type, &source_id).await {
        Ok(Some(entry)) => Ok(Json(entry)),
        Ok(None) => Err((
            StatusCode::NOT_FOUND,
            Json(StatusResponse {
                status: "miss".to_string(),
            }),
        )),
        Err(e) => {
            error!(
                "Cache lookup failed for {}:{}: {}",
                source_type, source_id, e
            );
            Err((error_status(&e), error_body(&e)))
        }
    }
}

/// POST /cache/attachments - Store an uploaded attachment payload
///
/// First write wins; re-posting an existing key leaves the stored entry
/// untouched.
pub async fn cache_insert(
    State(ctx): State<AppContext>,
    Json(entry): Json<NewCacheEntry>,
) -> Result<StatusCode, (StatusCode, Json<StatusResponse>)> {
    let Some(cache) = &ctx.cache else {
        return Err((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(StatusResponse {
                status: "error: attachment cache disabled".to_string(),
            }),
        ));
    };

    info!(
        "Cache insert for {}:{}",
        entry.source_type, entry.source_id
    );

    match cache.insert(&entry).await {
        Ok(()) => Ok(StatusCode::CREATED),
        Err(e) => {
            error!(
                "Cache insert failed for {}:{}: {}",
                entry.source_type, entry.source_id, e
            );
            Err((error_status(&e), error_body(&e)))
        }
    }
}
