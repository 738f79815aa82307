//! Playback orchestration over the coordination store
//!
//! Ties the queue, the currently-playing record, the status mirror and
//! the engine client together. All mutations of playback state funnel
//! through here: user commands from the HTTP API and ticks from the
//! advance monitor call the same operations.
//!
//! Concurrency model: in-process callers are serialized by an advance
//! lock; across processes the store's atomic `pop_front` guarantees a
//! track is handed to the engine at most once. Everything else tolerates
//! eventual consistency.

use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::{CurrentPlayback, PlayHistory, PlayerStatusMirror, TrackQueue};
use crate::cache::AttachmentCache;
use crate::engine::AudioEngine;
use crate::error::Result;
use crate::events::{EventBus, JukeEvent};
use crate::model::{CurrentlyPlaying, PlayerStatus, TrackDescriptor};
use crate::store::{keys, CoordinationStore};

/// How long a fresh handoff may go unreported by the engine before a
/// status token mismatch counts as completion
const ENGINE_REPORT_GRACE_MS: i64 = 5_000;

/// How long the most recent request channel is remembered
const DEFAULT_CHANNEL_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Result of an enqueue request
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Enqueued {
    /// 1-based position among pending tracks at enqueue time
    pub position: u64,
    /// Whether this request started playback immediately
    pub started: bool,
}

/// Observable outcome of one advance tick
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// Nothing playing, nothing pending
    Idle,
    /// The live play attempt is still going
    Playing,
    /// A completion (or idle queue head) led to a new handoff
    Started(CurrentlyPlaying),
    /// Completion observed and cleared, but the queue was empty
    Drained,
    /// A record is live but neither mirror nor engine offered status;
    /// state left untouched
    Unavailable,
}

/// Condensed view of playback and queue state
#[derive(Debug, Clone, Serialize)]
pub struct QueueSummary {
    /// Live play attempt, if any
    pub current: Option<CurrentlyPlaying>,
    /// Number of pending tracks
    pub queue_length: u64,
    /// Head of the pending queue
    pub next: Option<TrackDescriptor>,
}

/// Coordinates queue, currently-playing record, status mirror and engine
pub struct Orchestrator {
    store: Arc<dyn CoordinationStore>,
    queue: TrackQueue,
    history: PlayHistory,
    current: CurrentPlayback,
    mirror: PlayerStatusMirror,
    engine: Arc<dyn AudioEngine>,
    events: Arc<EventBus>,
    cache: Option<Arc<dyn AttachmentCache>>,
    advance_lock: Mutex<()>,
}

impl Orchestrator {
    pub fn new(
        store: Arc<dyn CoordinationStore>,
        engine: Arc<dyn AudioEngine>,
        events: Arc<EventBus>,
        cache: Option<Arc<dyn AttachmentCache>>,
    ) -> Self {
        Self {
            queue: TrackQueue::new(store.clone()),
            history: PlayHistory::new(store.clone()),
            current: CurrentPlayback::new(store.clone()),
            mirror: PlayerStatusMirror::new(store.clone()),
            store,
            engine,
            events,
            cache,
            advance_lock: Mutex::new(()),
        }
    }

    /// Append a track to the queue, starting it immediately when idle.
    ///
    /// When the engine rejects that immediate start the error propagates
    /// to the caller and the track stays at the queue head for the next
    /// advance.
    pub async fn enqueue(&self, mut track: TrackDescriptor) -> Result<Enqueued> {
        self.fill_attachments(&mut track).await;
        self.remember_channel(&track).await;

        let position = self.queue.push(&track).await?;
        info!("Enqueued \"{}\" at position {}", track.title, position);
        self.events.emit_lossy(JukeEvent::TrackEnqueued {
            track: track.clone(),
            position,
            timestamp: Utc::now(),
        });

        let mut started = false;
        if self.current.read().await?.is_none() {
            if let TickOutcome::Started(current) = self.poll_advance().await? {
                started = current.track == track;
            }
        }

        Ok(Enqueued { position, started })
    }

    /// Run one advance tick.
    ///
    /// The completion rule is token equality: the live record's token is
    /// compared against the engine's reported active token. The engine
    /// saying "playing" about some other token does not keep a superseded
    /// attempt alive.
    pub async fn poll_advance(&self) -> Result<TickOutcome> {
        let _guard = self.advance_lock.lock().await;
        self.poll_advance_locked().await
    }

    async fn poll_advance_locked(&self) -> Result<TickOutcome> {
        let Some(live) = self.current.read().await? else {
            // Idle: hand over the queue head if one is pending.
            return match self.advance_once().await? {
                Some(current) => Ok(TickOutcome::Started(current)),
                None => Ok(TickOutcome::Idle),
            };
        };

        let status = match self.mirror.read().await? {
            Some(status) => Some(status),
            None => match self.engine.status().await {
                Ok(status) => Some(status),
                Err(e) => {
                    debug!("Mirror empty and engine status poll failed: {}", e);
                    None
                }
            },
        };

        let Some(status) = status else {
            // No evidence either way; hold state until the engine reports.
            return Ok(TickOutcome::Unavailable);
        };

        if status.active_token == Some(live.token) {
            return Ok(TickOutcome::Playing);
        }

        // Token mismatch. A handoff the engine has not reported yet looks
        // the same for a moment, so a fresh record is not judged by it.
        let age = Utc::now().signed_duration_since(live.started_at);
        if age.num_milliseconds() < ENGINE_REPORT_GRACE_MS {
            return Ok(TickOutcome::Playing);
        }

        self.current.clear_if(live.token).await?;
        info!("Play attempt [{}] complete", live.token);
        self.events.emit_lossy(JukeEvent::PlaybackCompleted {
            token: live.token,
            timestamp: Utc::now(),
        });

        match self.advance_once().await? {
            Some(current) => Ok(TickOutcome::Started(current)),
            None => Ok(TickOutcome::Drained),
        }
    }

    /// Dequeue the head and hand it to the engine; lock must be held.
    async fn advance_once(&self) -> Result<Option<CurrentlyPlaying>> {
        let Some(track) = self.queue.pop_head().await? else {
            return Ok(None);
        };

        let record = self.current.begin(track).await?;
        if let Err(e) = self.engine.play(&record.track, record.token).await {
            // Unwind the speculative handoff so the next advance sees the
            // same head again.
            if let Err(rollback) = self.current.clear_if(record.token).await {
                warn!("Rollback of currently-playing record failed: {}", rollback);
            }
            if let Err(rollback) = self.queue.push_front(&record.track).await {
                warn!(
                    "Could not restore \"{}\" to the queue head: {}",
                    record.track.title, rollback
                );
            }
            return Err(e);
        }

        info!("Playing \"{}\" [{}]", record.track.title, record.token);
        if let Err(e) = self.history.push(&record.track).await {
            warn!("Failed to record play history: {}", e);
        }
        self.events.emit_lossy(JukeEvent::TrackStarted {
            current: record.clone(),
            timestamp: Utc::now(),
        });

        Ok(Some(record))
    }

    /// Skip to the next pending track, superseding the live attempt.
    ///
    /// With an empty queue this is a no-op: whatever is playing keeps
    /// playing.
    pub async fn skip(&self) -> Result<Option<TrackDescriptor>> {
        let _guard = self.advance_lock.lock().await;
        match self.advance_once().await? {
            Some(current) => Ok(Some(current.track)),
            None => {
                debug!("Skip requested with an empty queue; playback left as-is");
                Ok(None)
            }
        }
    }

    /// Ask the engine to stop.
    ///
    /// Only the engine is commanded here; it clears the coordination
    /// records itself and the monitor converges on whatever it left.
    pub async fn stop(&self) -> Result<()> {
        self.engine.stop().await?;
        info!("Stop accepted by engine");
        self.events.emit_lossy(JukeEvent::PlaybackStopped {
            timestamp: Utc::now(),
        });
        Ok(())
    }

    /// Live play attempt, if any.
    pub async fn currently_playing(&self) -> Result<Option<CurrentlyPlaying>> {
        self.current.read().await
    }

    /// Engine status: mirror first, then a direct poll.
    ///
    /// `None` means the engine is unreachable and its mirror has expired;
    /// callers must not treat that as "stopped".
    pub async fn player_status(&self) -> Result<Option<PlayerStatus>> {
        if let Some(status) = self.mirror.read().await? {
            return Ok(Some(status));
        }
        match self.engine.status().await {
            Ok(status) => Ok(Some(status)),
            Err(e) => {
                debug!("Engine status poll failed: {}", e);
                Ok(None)
            }
        }
    }

    /// Pending tracks in play order, optionally limited.
    pub async fn queue_page(&self, limit: Option<u64>) -> Result<Vec<TrackDescriptor>> {
        match limit {
            Some(limit) => self.queue.page(limit).await,
            None => self.queue.snapshot().await,
        }
    }

    /// Number of pending tracks.
    pub async fn queue_len(&self) -> Result<u64> {
        self.queue.len().await
    }

    /// Remove the pending track at `index` (0-based).
    pub async fn remove_queued(&self, index: u64) -> Result<bool> {
        let removed = self.queue.remove_at(index).await?;
        if removed {
            info!("Removed queue entry at index {}", index);
        }
        Ok(removed)
    }

    /// Drop all pending tracks; the live attempt is untouched.
    pub async fn clear_queue(&self) -> Result<()> {
        self.queue.clear().await?;
        info!("Queue cleared");
        self.events.emit_lossy(JukeEvent::QueueCleared {
            timestamp: Utc::now(),
        });
        Ok(())
    }

    /// Recently played tracks, newest first.
    pub async fn history(&self, limit: u64) -> Result<Vec<TrackDescriptor>> {
        self.history.recent(limit).await
    }

    /// Condensed playback-plus-queue view.
    pub async fn summary(&self) -> Result<QueueSummary> {
        Ok(QueueSummary {
            current: self.current.read().await?,
            queue_length: self.queue.len().await?,
            next: self.queue.peek_head().await?,
        })
    }

    /// Channel of the most recent request, if one was seen recently.
    pub async fn default_channel(&self) -> Result<Option<String>> {
        self.store.get(keys::DEFAULT_CHANNEL).await
    }

    async fn remember_channel(&self, track: &TrackDescriptor) {
        let Some(channel) = &track.channel else { return };
        if let Err(e) = self
            .store
            .set(keys::DEFAULT_CHANNEL, channel, Some(DEFAULT_CHANNEL_TTL))
            .await
        {
            warn!("Failed to remember request channel: {}", e);
        }
    }

    /// Fill missing attachments from the cache; never blocks an enqueue.
    async fn fill_attachments(&self, track: &mut TrackDescriptor) {
        let Some(cache) = &self.cache else { return };
        if !track.attachments.is_null() {
            return;
        }
        match cache.lookup(&track.platform, &track.source_id).await {
            Ok(Some(entry)) => {
                debug!(
                    "Attachment cache hit for {}:{}",
                    track.platform, track.source_id
                );
                track.attachments = entry.attachment;
            }
            Ok(None) => {}
            Err(e) => warn!("Attachment cache lookup failed: {}", e),
        }
    }
}
