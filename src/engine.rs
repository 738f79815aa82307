//! Audio engine command interface
//!
//! The engine is a separate process owning the audio device. It accepts
//! three commands over HTTP and confirms each before the orchestrator
//! commits any coordination state. A rejected or unreachable engine maps
//! to [`Error::Engine`] so callers can roll back.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::model::{PlayToken, PlayerStatus, TrackDescriptor};

/// Default per-request timeout for engine commands
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Commands the orchestrator can issue to the playback engine
#[async_trait]
pub trait AudioEngine: Send + Sync {
    /// Start playing `track`, tagging the attempt with `token`.
    ///
    /// The engine stops whatever it was playing first; there is only one
    /// stream. Returns once the engine has accepted the handoff.
    async fn play(&self, track: &TrackDescriptor, token: PlayToken) -> Result<()>;

    /// Stop playback and release the stream.
    async fn stop(&self) -> Result<()>;

    /// Poll the engine's live status.
    ///
    /// Used when the status mirror has expired; the mirror remains the
    /// cheap path.
    async fn status(&self) -> Result<PlayerStatus>;
}

/// HTTP client for an engine process listening on `base_url`
pub struct HttpAudioEngine {
    client: Client,
    base_url: String,
}

impl HttpAudioEngine {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Engine(e.to_string()))?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { client, base_url })
    }
}

#[async_trait]
impl AudioEngine for HttpAudioEngine {
    async fn play(&self, track: &TrackDescriptor, token: PlayToken) -> Result<()> {
        let mut params = vec![
            ("url", track.url.clone()),
            ("token", token.to_string()),
        ];
        // QQ streams need platform-specific fetch headers engine-side.
        if track.platform == "qq" {
            params.push(("model", track.platform.clone()));
        }

        let response = self
            .client
            .get(format!("{}/play", self.base_url))
            .query(&params)
            .send()
            .await
            .map_err(|e| Error::Engine(format!("play request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::Engine(format!(
                "play returned {}",
                response.status()
            )));
        }
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        let response = self
            .client
            .get(format!("{}/stop", self.base_url))
            .send()
            .await
            .map_err(|e| Error::Engine(format!("stop request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::Engine(format!(
                "stop returned {}",
                response.status()
            )));
        }
        Ok(())
    }

    async fn status(&self) -> Result<PlayerStatus> {
        let response = self
            .client
            .get(format!("{}/status", self.base_url))
            .send()
            .await
            .map_err(|e| Error::Engine(format!("status request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::Engine(format!(
                "status returned {}",
                response.status()
            )));
        }

        response
            .json::<PlayerStatus>()
            .await
            .map_err(|e| Error::Engine(format!("status body: {}", e)))
    }
}
