//! Currently-playing record coordination
//!
//! The record marks a live play attempt: written here at handoff, deleted
//! by the engine when the stream ends. Completion checks compare the
//! stored token against the token a caller is asking about; the record
//! being absent, or holding a different token, both mean "that attempt is
//! over".

use chrono::Utc;
use std::sync::Arc;
use tracing::warn;

use crate::error::Result;
use crate::model::{CurrentlyPlaying, PlayToken, TrackDescriptor};
use crate::store::{keys, CoordinationStore};

/// Handle on the shared currently-playing record
pub struct CurrentPlayback {
    store: Arc<dyn CoordinationStore>,
}

impl CurrentPlayback {
    pub fn new(store: Arc<dyn CoordinationStore>) -> Self {
        Self { store }
    }

    /// Mint a token for `track` and publish the record.
    ///
    /// Overwrites whatever record was present; the superseded token
    /// thereby reads as complete everywhere.
    pub async fn begin(&self, track: TrackDescriptor) -> Result<CurrentlyPlaying> {
        let record = CurrentlyPlaying {
            track,
            token: PlayToken::mint(),
            started_at: Utc::now(),
        };
        let json = serde_json::to_string(&record)?;
        self.store.set(keys::CURRENT, &json, None).await?;
        Ok(record)
    }

    /// Read the live record, if any.
    ///
    /// A record that no longer decodes is dropped with a warning: it can
    /// never match any token, so keeping it would only wedge completion
    /// checks.
    pub async fn read(&self) -> Result<Option<CurrentlyPlaying>> {
        match self.store.get(keys::CURRENT).await? {
            Some(json) => match serde_json::from_str(&json) {
                Ok(record) => Ok(Some(record)),
                Err(e) => {
                    warn!("Dropping undecodable currently-playing record: {}", e);
                    self.store.delete(keys::CURRENT).await?;
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }

    /// Whether the play attempt identified by `token` is over.
    pub async fn is_complete(&self, token: PlayToken) -> Result<bool> {
        Ok(self
            .read()
            .await?
            .map_or(true, |record| record.token != token))
    }

    /// Remove the record unconditionally. Returns whether one existed.
    pub async fn clear(&self) -> Result<bool> {
        self.store.delete(keys::CURRENT).await
    }

    /// Remove the record only while it still carries `token`.
    ///
    /// Protects a rollback or force-clear from deleting a record that a
    /// newer play attempt has already replaced.
    pub async fn clear_if(&self, token: PlayToken) -> Result<bool> {
        match self.read().await? {
            Some(record) if record.token == token => self.clear().await,
            _ => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn track() -> TrackDescriptor {
        TrackDescriptor {
            platform: "netease".to_string(),
            source_id: "1".to_string(),
            title: "t".to_string(),
            artist: "a".to_string(),
            album: None,
            url: "http://stream.example.com/t.mp3".to_string(),
            duration: None,
            cover_url: None,
            attachments: serde_json::Value::Null,
            channel: None,
            requested_by: None,
        }
    }

    fn setup() -> (Arc<MemoryStore>, CurrentPlayback) {
        let store = Arc::new(MemoryStore::new());
        let current = CurrentPlayback::new(store.clone());
        (store, current)
    }

    #[tokio::test]
    async fn begin_publishes_a_readable_record() {
        let (_, current) = setup();
        let record = current.begin(track()).await.unwrap();

        let read = current.read().await.unwrap().unwrap();
        assert_eq!(read.token, record.token);
        assert_eq!(read.track.title, "t");
    }

    #[tokio::test]
    async fn absent_record_reads_complete_for_any_token() {
        let (_, current) = setup();
        assert!(current.is_complete(PlayToken::mint()).await.unwrap());
    }

    #[tokio::test]
    async fn live_token_is_not_complete_until_cleared() {
        let (_, current) = setup();
        let record = current.begin(track()).await.unwrap();

        assert!(!current.is_complete(record.token).await.unwrap());
        assert!(current.is_complete(PlayToken::mint()).await.unwrap());

        assert!(current.clear().await.unwrap());
        assert!(current.is_complete(record.token).await.unwrap());
    }

    #[tokio::test]
    async fn begin_supersedes_the_previous_token() {
        let (_, current) = setup();
        let first = current.begin(track()).await.unwrap();
        let second = current.begin(track()).await.unwrap();

        assert!(current.is_complete(first.token).await.unwrap());
        assert!(!current.is_complete(second.token).await.unwrap());
    }

    #[tokio::test]
    async fn clear_if_requires_a_matching_token() {
        let (_, current) = setup();
        let record = current.begin(track()).await.unwrap();

        assert!(!current.clear_if(PlayToken::mint()).await.unwrap());
        assert!(current.read().await.unwrap().is_some());

        assert!(current.clear_if(record.token).await.unwrap());
        assert!(current.read().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn undecodable_record_self_heals_to_absent() {
        let (store, current) = setup();
        store.set(keys::CURRENT, "{broken", None).await.unwrap();

        assert_eq!(current.read().await.unwrap(), None);
        // The bad record is gone, not just skipped.
        assert_eq!(store.get(keys::CURRENT).await.unwrap(), None);
    }
}
