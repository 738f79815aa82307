//! Event types for the juke orchestrator
//!
//! Provides event definitions and the EventBus used to fan playback
//! changes out to SSE clients and background tasks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::model::{CurrentlyPlaying, PlayToken, TrackDescriptor};

/// Orchestrator event types
///
/// Events are broadcast via EventBus and can be serialized for SSE
/// transmission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum JukeEvent {
    /// Track appended to the pending queue
    ///
    /// Triggers:
    /// - SSE: Animate new queue entry
    TrackEnqueued {
        /// The queued track
        track: TrackDescriptor,
        /// 1-based position among pending tracks at enqueue time
        position: u64,
        /// When the track was enqueued
        timestamp: DateTime<Utc>,
    },

    /// Track handed to the engine and accepted
    ///
    /// Triggers:
    /// - SSE: Update now-playing display
    TrackStarted {
        /// The playing record, including the minted token
        current: CurrentlyPlaying,
        /// When the handoff completed
        timestamp: DateTime<Utc>,
    },

    /// A play attempt was observed complete and its record cleared
    ///
    /// Triggers:
    /// - SSE: Clear now-playing display (a TrackStarted may follow
    ///   immediately when the queue is non-empty)
    PlaybackCompleted {
        /// Token of the attempt that finished
        token: PlayToken,
        /// When completion was observed
        timestamp: DateTime<Utc>,
    },

    /// Stop command accepted by the engine
    ///
    /// Triggers:
    /// - SSE: Show stopped state (completion still converges through
    ///   the advance monitor)
    PlaybackStopped {
        /// When the engine acknowledged the stop
        timestamp: DateTime<Utc>,
    },

    /// Pending queue was cleared
    ///
    /// NOTE: Does not touch the live play attempt
    ///
    /// Triggers:
    /// - SSE: Empty the queue display
    QueueCleared {
        /// When the queue was cleared
        timestamp: DateTime<Utc>,
    },
}

impl JukeEvent {
    /// Get event type as string for filtering
    pub fn event_type(&self) -> &'static str {
        match self {
            JukeEvent::TrackEnqueued { .. } => "TrackEnqueued",
            JukeEvent::TrackStarted { .. } => "TrackStarted",
            JukeEvent::PlaybackCompleted { .. } => "PlaybackCompleted",
            JukeEvent::PlaybackStopped { .. } => "PlaybackStopped",
            JukeEvent::QueueCleared { .. } => "QueueCleared",
        }
    }
}

/// Central event distribution bus
///
/// Uses tokio::broadcast internally, providing:
/// - Non-blocking publish (slow subscribers don't block producers)
/// - Multiple concurrent subscribers
/// - Automatic cleanup when subscribers drop
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<JukeEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with the specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<JukeEvent> {
        self.tx.subscribe()
    }

    /// Emit an event, ignoring if no subscribers are listening
    ///
    /// Playback state changes are fully recoverable from the store, so
    /// nothing in the orchestrator depends on event delivery.
    pub fn emit_lossy(&self, event: JukeEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
