//! Engine-owned player status mirror
//!
//! The engine refreshes this record as it plays; the short TTL turns a
//! crashed or wedged engine into "no information" instead of a stale
//! truth. The orchestrator only ever reads it. The write half exists for
//! engines embedded in the same process (and for test doubles standing
//! in for the engine).

use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use crate::error::Result;
use crate::model::PlayerStatus;
use crate::store::{keys, CoordinationStore};

/// How long a status write stays readable without a refresh
pub const STATUS_TTL: Duration = Duration::from_secs(10);

/// Handle on the shared status record
pub struct PlayerStatusMirror {
    store: Arc<dyn CoordinationStore>,
}

impl PlayerStatusMirror {
    pub fn new(store: Arc<dyn CoordinationStore>) -> Self {
        Self { store }
    }

    /// Read the engine's last status, if fresh enough to trust.
    ///
    /// Undecodable records read as absent; the key belongs to the engine,
    /// so they are left to be overwritten or to expire.
    pub async fn read(&self) -> Result<Option<PlayerStatus>> {
        match self.store.get(keys::PLAYER_STATUS).await? {
            Some(json) => match serde_json::from_str(&json) {
                Ok(status) => Ok(Some(status)),
                Err(e) => {
                    warn!("Ignoring undecodable player status: {}", e);
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }

    /// Publish a status record with the standard TTL (engine side).
    pub async fn write(&self, status: &PlayerStatus) -> Result<()> {
        let json = serde_json::to_string(status)?;
        self.store
            .set(keys::PLAYER_STATUS, &json, Some(STATUS_TTL))
            .await
    }
}
