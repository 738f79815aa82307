//! Wired-up orchestrator fixture

use axum::Router;
use sqlx::sqlite::SqlitePoolOptions;
use std::sync::Arc;

use juke::api::{router, AppContext};
use juke::cache::{AttachmentCache, SqliteAttachmentCache};
use juke::events::EventBus;
use juke::model::{CurrentlyPlaying, TrackDescriptor};
use juke::playback::Orchestrator;
use juke::store::{keys, CoordinationStore, MemoryStore};

use super::FakeEngine;

/// Orchestrator over an in-memory store, with the engine double sharing
/// the same store
pub struct TestRig {
    pub store: Arc<MemoryStore>,
    pub engine: Arc<FakeEngine>,
    pub events: Arc<EventBus>,
    pub orchestrator: Arc<Orchestrator>,
}

impl TestRig {
    pub fn start() -> Self {
        let store = Arc::new(MemoryStore::new());
        let engine = Arc::new(FakeEngine::new(store.clone()));
        let events = Arc::new(EventBus::new(64));
        let orchestrator = Arc::new(Orchestrator::new(
            store.clone(),
            engine.clone(),
            events.clone(),
            None,
        ));
        Self {
            store,
            engine,
            events,
            orchestrator,
        }
    }

    /// API router over this rig, with an in-memory attachment cache.
    pub async fn router(&self) -> Router {
        // One connection so every query sees the same in-memory database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let cache: Arc<dyn AttachmentCache> =
            Arc::new(SqliteAttachmentCache::init(pool).await.unwrap());

        router(AppContext {
            orchestrator: self.orchestrator.clone(),
            events: self.events.clone(),
            cache: Some(cache),
        })
    }
}

pub fn test_track(title: &str) -> TrackDescriptor {
    TrackDescriptor {
        platform: "netease".to_string(),
        source_id: format!("id-{}", title),
        title: title.to_string(),
        artist: "artist".to_string(),
        album: None,
        url: format!("http://stream.example.com/{}.mp3", title),
        duration: Some("3:20".to_string()),
        cover_url: None,
        attachments: serde_json::Value::Null,
        channel: Some("#listening-room".to_string()),
        requested_by: Some("kei".to_string()),
    }
}

/// Rewind the live record's start time, as if the handoff had happened
/// `by_ms` earlier. Lets tests step past the engine-report grace window
/// without sleeping through it.
pub async fn age_current(store: &Arc<MemoryStore>, by_ms: i64) {
    let json = store.get(keys::CURRENT).await.unwrap().unwrap();
    let mut record: CurrentlyPlaying = serde_json::from_str(&json).unwrap();
    record.started_at = record.started_at - chrono::Duration::milliseconds(by_ms);
    store
        .set(keys::CURRENT, &serde_json::to_string(&record).unwrap(), None)
        .await
        .unwrap();
}
