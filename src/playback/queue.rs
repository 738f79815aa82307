//! Pending track queue and play history
//!
//! Both are store-backed lists of JSON-encoded [`TrackDescriptor`]s. The
//! queue is strictly FIFO; the single place a track leaves it on the way
//! to the engine is [`TrackQueue::pop_head`], whose atomicity comes from
//! the store's `pop_front`.

use std::sync::Arc;
use tracing::warn;

use crate::error::Result;
use crate::model::TrackDescriptor;
use crate::store::{keys, CoordinationStore};

/// Most recent plays kept in history
const HISTORY_CAP: i64 = 50;

/// FIFO queue of tracks waiting for playback
pub struct TrackQueue {
    store: Arc<dyn CoordinationStore>,
}

impl TrackQueue {
    pub fn new(store: Arc<dyn CoordinationStore>) -> Self {
        Self { store }
    }

    /// Append a track, returning its 1-based position among pending tracks.
    pub async fn push(&self, track: &TrackDescriptor) -> Result<u64> {
        let json = serde_json::to_string(track)?;
        self.store.push_back(keys::QUEUE, &json).await
    }

    /// Put a track back at the head, ahead of everything pending.
    ///
    /// Used to undo a speculative dequeue after the engine rejected the
    /// handoff; the next advance sees the same head again.
    pub async fn push_front(&self, track: &TrackDescriptor) -> Result<u64> {
        let json = serde_json::to_string(track)?;
        self.store.push_front(keys::QUEUE, &json).await
    }

    /// Atomically remove and return the head of the queue.
    ///
    /// Entries that fail to decode are dropped with a warning and the
    /// next entry is tried, so one bad record cannot wedge the queue.
    pub async fn pop_head(&self) -> Result<Option<TrackDescriptor>> {
        while let Some(json) = self.store.pop_front(keys::QUEUE).await? {
            match serde_json::from_str(&json) {
                Ok(track) => return Ok(Some(track)),
                Err(e) => warn!("Dropping malformed queue entry: {}", e),
            }
        }
        Ok(None)
    }

    /// Read the head without consuming it.
    pub async fn peek_head(&self) -> Result<Option<TrackDescriptor>> {
        let head = self.store.list_range(keys::QUEUE, 0, 0).await?;
        match head.first() {
            Some(json) => match serde_json::from_str(json) {
                Ok(track) => Ok(Some(track)),
                Err(e) => {
                    warn!("Malformed queue head: {}", e);
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }

    /// Read up to `limit` pending tracks in play order.
    pub async fn page(&self, limit: u64) -> Result<Vec<TrackDescriptor>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let entries = self
            .store
            .list_range(keys::QUEUE, 0, page_stop(limit))
            .await?;
        Ok(decode_entries(&entries))
    }

    /// Read the whole pending queue in play order.
    pub async fn snapshot(&self) -> Result<Vec<TrackDescriptor>> {
        let entries = self.store.list_range(keys::QUEUE, 0, -1).await?;
        Ok(decode_entries(&entries))
    }

    /// Number of pending tracks.
    pub async fn len(&self) -> Result<u64> {
        self.store.list_len(keys::QUEUE).await
    }

    pub async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }

    /// Remove the pending track at `index` (0-based from the head).
    pub async fn remove_at(&self, index: u64) -> Result<bool> {
        self.store.list_remove_at(keys::QUEUE, index).await
    }

    /// Drop every pending track. The live play attempt is untouched.
    pub async fn clear(&self) -> Result<()> {
        self.store.delete(keys::QUEUE).await?;
        Ok(())
    }
}

/// Recently played tracks, newest first, capped at [`HISTORY_CAP`]
pub struct PlayHistory {
    store: Arc<dyn CoordinationStore>,
}

impl PlayHistory {
    pub fn new(store: Arc<dyn CoordinationStore>) -> Self {
        Self { store }
    }

    /// Record a track at the head of the history, trimming the tail.
    pub async fn push(&self, track: &TrackDescriptor) -> Result<()> {
        let json = serde_json::to_string(track)?;
        self.store.push_front(keys::HISTORY, &json).await?;
        self.store
            .list_trim(keys::HISTORY, 0, HISTORY_CAP - 1)
            .await
    }

    /// Read up to `limit` recent plays, newest first.
    pub async fn recent(&self, limit: u64) -> Result<Vec<TrackDescriptor>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let entries = self
            .store
            .list_range(keys::HISTORY, 0, page_stop(limit))
            .await?;
        Ok(decode_entries(&entries))
    }
}

/// Inclusive range stop for a page of `limit` entries.
///
/// Limits past `i64` saturate; a plain cast would wrap negative, which
/// the store's range reads as an index from the tail.
fn page_stop(limit: u64) -> i64 {
    i64::try_from(limit).map_or(i64::MAX, |l| l - 1)
}

fn decode_entries(entries: &[String]) -> Vec<TrackDescriptor> {
    entries
        .iter()
        .filter_map(|json| match serde_json::from_str(json) {
            Ok(track) => Some(track),
            Err(e) => {
                warn!("Skipping malformed list entry: {}", e);
                None
            }
        })
        .collect()
}
