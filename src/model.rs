//! Shared data model for queue coordination
//!
//! These types are the wire contract between the orchestrator and the
//! playback engine: every record written to the coordination store is one
//! of these serialized as JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

/// Identity token minted for a single play attempt
///
/// Each handoff to the engine gets a fresh token. Two plays of the same
/// track are distinct attempts, so completion detection compares tokens,
/// never track identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayToken(Uuid);

impl PlayToken {
    /// Mint a new unique token
    pub fn mint() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for PlayToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A queued track, resolved to a playable stream URL
///
/// Producers resolve platform metadata before enqueueing; the orchestrator
/// treats the descriptor as opaque apart from `url` and the platform pair
/// used for attachment caching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackDescriptor {
    /// Source platform identifier (e.g. "netease", "qq", "bilibili")
    pub platform: String,
    /// Platform-native track id
    pub source_id: String,
    /// Display title
    pub title: String,
    /// Display artist line
    #[serde(default)]
    pub artist: String,
    /// Album name, when the platform provides one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
    /// Resolved stream URL handed to the engine verbatim
    pub url: String,
    /// Display text for the track length, as the platform formatted it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    /// Cover art URL from the platform
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
    /// Pre-uploaded attachment payload, reused verbatim by consumers
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub attachments: Value,
    /// Channel the request came from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    /// Who asked for the track
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requested_by: Option<String>,
}

/// Record describing the track currently handed to the engine
///
/// Exactly one of these exists while playback is live. Written by the
/// orchestrator at handoff, deleted by the engine on completion (or
/// force-cleared by the advance monitor when the engine only reported
/// completion through its status record).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentlyPlaying {
    /// The track that was dequeued
    pub track: TrackDescriptor,
    /// Token minted for this play attempt
    pub token: PlayToken,
    /// When the orchestrator handed the track to the engine
    pub started_at: DateTime<Utc>,
}

/// Engine-reported playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackState {
    Playing,
    Paused,
    Stopped,
}

/// Status record mirrored by the engine into the coordination store
///
/// The engine is the only writer. The record carries a short TTL so a
/// crashed engine reads as "no information" rather than a stale truth.
/// Field names follow the engine's own JSON casing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStatus {
    /// Whether the engine believes it is producing audio
    pub playing: bool,
    /// Stream the engine currently has open, if any
    #[serde(default)]
    pub current_file: Option<String>,
    /// Coarse engine state
    pub playback_state: PlaybackState,
    /// Token of the play attempt the engine is servicing; null once done
    #[serde(default)]
    pub active_token: Option<PlayToken>,
    /// When the engine last refreshed this record
    pub updated_at: DateTime<Utc>,
}
