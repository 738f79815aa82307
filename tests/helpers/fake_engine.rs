//! Engine double for advance-protocol tests
//!
//! The real engine is a separate process that accepts play/stop over
//! HTTP and then edits the shared coordination records: it mirrors its
//! status under a short TTL and deletes the currently-playing record
//! when a stream ends. This double performs the same record edits
//! in-process so tests can walk the protocol without sockets.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use juke::engine::AudioEngine;
use juke::error::{Error, Result};
use juke::model::{PlayToken, PlaybackState, PlayerStatus, TrackDescriptor};
use juke::playback::{CurrentPlayback, PlayerStatusMirror};
use juke::store::CoordinationStore;

pub struct FakeEngine {
    mirror: PlayerStatusMirror,
    current: CurrentPlayback,
    last_status: Mutex<Option<PlayerStatus>>,
    plays: Mutex<Vec<(String, PlayToken)>>,
    unreachable: AtomicBool,
}

impl FakeEngine {
    pub fn new(store: Arc<dyn CoordinationStore>) -> Self {
        Self {
            mirror: PlayerStatusMirror::new(store.clone()),
            current: CurrentPlayback::new(store),
            last_status: Mutex::new(None),
            plays: Mutex::new(Vec::new()),
            unreachable: AtomicBool::new(false),
        }
    }

    /// Make every command and status poll fail, as if the process died.
    pub fn set_unreachable(&self, dead: bool) {
        self.unreachable.store(dead, Ordering::SeqCst);
    }

    pub fn play_count(&self) -> usize {
        self.plays.lock().unwrap().len()
    }

    pub fn played_titles(&self) -> Vec<String> {
        self.plays
            .lock()
            .unwrap()
            .iter()
            .map(|(title, _)| title.clone())
            .collect()
    }

    pub fn last_token(&self) -> Option<PlayToken> {
        self.plays.lock().unwrap().last().map(|(_, token)| *token)
    }

    /// Natural end of the current stream: delete the play record, then
    /// report no active token.
    pub async fn complete(&self) {
        self.current.clear().await.unwrap();
        self.write_mirror(false, PlaybackState::Stopped, None, None)
            .await;
    }

    /// The engine reported the finish but died before deleting the play
    /// record. The advance monitor has to clean up after it.
    pub async fn report_finished(&self) {
        self.write_mirror(false, PlaybackState::Stopped, None, None)
            .await;
    }

    async fn write_mirror(
        &self,
        playing: bool,
        playback_state: PlaybackState,
        current_file: Option<String>,
        active_token: Option<PlayToken>,
    ) {
        let status = PlayerStatus {
            playing,
            current_file,
            playback_state,
            active_token,
            updated_at: Utc::now(),
        };
        *self.last_status.lock().unwrap() = Some(status.clone());
        self.mirror.write(&status).await.unwrap();
    }
}

#[async_trait]
impl AudioEngine for FakeEngine {
    async fn play(&self, track: &TrackDescriptor, token: PlayToken) -> Result<()> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(Error::Engine("connection refused".to_string()));
        }
        self.plays
            .lock()
            .unwrap()
            .push((track.title.clone(), token));
        self.write_mirror(
            true,
            PlaybackState::Playing,
            Some(track.url.clone()),
            Some(token),
        )
        .await;
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(Error::Engine("connection refused".to_string()));
        }
        // Stop ends the current attempt the same way a natural end does.
        self.complete().await;
        Ok(())
    }

    async fn status(&self) -> Result<PlayerStatus> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(Error::Engine("connection refused".to_string()));
        }
        self.last_status
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| Error::Engine("no status yet".to_string()))
    }
}
