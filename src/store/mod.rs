//! Coordination store abstraction
//!
//! The orchestrator and the playback engine share no memory; every piece
//! of coordination state (pending queue, currently-playing record, status
//! mirror, history) lives in a small persistent key-value store that both
//! processes can reach. The store is the single source of truth: either
//! process can restart and resume from what it finds here.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::Result;

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Store keys shared between the orchestrator and the engine
pub mod keys {
    /// Pending track queue (list, FIFO)
    pub const QUEUE: &str = "juke:queue";
    /// Currently-playing record (JSON value)
    pub const CURRENT: &str = "juke:current";
    /// Engine-owned status mirror (JSON value, short TTL)
    pub const PLAYER_STATUS: &str = "juke:player_status";
    /// Play history, most recent first (list)
    pub const HISTORY: &str = "juke:history";
    /// Channel of the most recent request (value, 24h TTL)
    pub const DEFAULT_CHANNEL: &str = "juke:default_channel";
}

/// Key-value operations both processes coordinate through
///
/// Values and list elements are opaque strings; callers serialize their
/// own records. Value keys and list keys live in one namespace and must
/// not be mixed.
#[async_trait]
pub trait CoordinationStore: Send + Sync {
    /// Read a value. Expired entries read as absent.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value, optionally with a time-to-live.
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()>;

    /// Delete a value or an entire list. Returns whether anything was removed.
    async fn delete(&self, key: &str) -> Result<bool>;

    /// Append to the tail of a list, returning the new length.
    ///
    /// The returned length doubles as the 1-based position of the pushed
    /// element.
    async fn push_back(&self, key: &str, value: &str) -> Result<u64>;

    /// Prepend to the head of a list, returning the new length.
    async fn push_front(&self, key: &str, value: &str) -> Result<u64>;

    /// Atomically remove and return the head of a list.
    ///
    /// This is the only mutual exclusion the queue relies on: two
    /// concurrent callers never receive the same element.
    async fn pop_front(&self, key: &str) -> Result<Option<String>>;

    /// Read elements `start..=stop`, 0-based; negative indices count from
    /// the tail (`-1` is the last element).
    async fn list_range(&self, key: &str, start: i64, stop: i64) -> Result<Vec<String>>;

    /// Number of elements in a list. Missing lists have length 0.
    async fn list_len(&self, key: &str) -> Result<u64>;

    /// Drop every element outside `start..=stop`.
    async fn list_trim(&self, key: &str, start: i64, stop: i64) -> Result<()>;

    /// Remove the element at `index` (0-based from the head).
    async fn list_remove_at(&self, key: &str, index: u64) -> Result<bool>;
}

/// Resolve an inclusive, possibly-negative range against a list length.
///
/// Returns `None` when the range selects nothing.
pub(crate) fn resolve_range(start: i64, stop: i64, len: usize) -> Option<(usize, usize)> {
    if len == 0 {
        return None;
    }
    let len = len as i64;
    let start = if start < 0 { (len + start).max(0) } else { start };
    let stop = if stop < 0 { len + stop } else { stop.min(len - 1) };
    if stop < 0 || start > stop || start >= len {
        return None;
    }
    Some((start as usize, stop as usize))
}
