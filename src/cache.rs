//! Attachment cache for track metadata payloads
//!
//! Sending a track card to chat costs two upstream calls: fetch the
//! cover image, then upload it as an attachment. The upload result is
//! keyed by `(source_type, source_id)` here so later plays of the same
//! track reuse the stored payload verbatim and skip both calls.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::SqlitePool;
use tracing::warn;

use crate::error::Result;

/// A cached attachment payload with its bookkeeping counters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Source platform (mirrors `TrackDescriptor::platform`)
    pub source_type: String,
    /// Platform-native track id
    pub source_id: String,
    /// URL the payload was originally fetched from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    /// Uploaded attachment payload, reused without modification
    pub attachment: Value,
    /// Times this entry has been served (the upload counts once)
    pub use_count: i64,
    /// Last time the entry was served
    pub last_used_at: DateTime<Utc>,
}

/// Payload for inserting a freshly uploaded attachment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCacheEntry {
    pub source_type: String,
    pub source_id: String,
    #[serde(default)]
    pub source_url: Option<String>,
    pub attachment: Value,
}

/// Lookup-before-upload gate used by enqueue and by producers
#[async_trait]
pub trait AttachmentCache: Send + Sync {
    /// Fetch the entry for `(source_type, source_id)`, bumping its use
    /// count and last-used timestamp on a hit.
    async fn lookup(&self, source_type: &str, source_id: &str) -> Result<Option<CacheEntry>>;

    /// Store an uploaded payload. An existing entry for the same key is
    /// kept untouched.
    async fn insert(&self, entry: &NewCacheEntry) -> Result<()>;
}

/// SQLite-backed [`AttachmentCache`]
pub struct SqliteAttachmentCache {
    pool: SqlitePool,
}

impl SqliteAttachmentCache {
    /// Create the cache table if needed and wrap the pool.
    pub async fn init(pool: SqlitePool) -> Result<Self> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS attachment_cache (
                source_type TEXT NOT NULL,
                source_id TEXT NOT NULL,
                source_url TEXT,
                attachment TEXT NOT NULL,
                use_count INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL,
                last_used_at TEXT NOT NULL,
                PRIMARY KEY (source_type, source_id)
            )",
        )
        .execute(&pool)
        .await?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl AttachmentCache for SqliteAttachmentCache {
    async fn lookup(&self, source_type: &str, source_id: &str) -> Result<Option<CacheEntry>> {
        // Bump and read in one statement so concurrent hits count fairly.
        let row = sqlx::query_as::<_, (String, String, Option<String>, String, i64, DateTime<Utc>)>(
            "UPDATE attachment_cache
             SET use_count = use_count + 1, last_used_at = ?3
             WHERE source_type = ?1 AND source_id = ?2
             RETURNING source_type, source_id, source_url, attachment, use_count, last_used_at",
        )
        .bind(source_type)
        .bind(source_id)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        let Some((source_type, source_id, source_url, attachment, use_count, last_used_at)) = row
        else {
            return Ok(None);
        };

        let attachment = match serde_json::from_str(&attachment) {
            Ok(value) => value,
            Err(e) => {
                warn!(
                    "Dropping undecodable cached attachment for {}:{}: {}",
                    source_type, source_id, e
                );
                // Deleting the row lets the caller's re-upload land;
                // keep-first inserts would otherwise miss forever.
                sqlx::query(
                    "DELETE FROM attachment_cache WHERE source_type = ?1 AND source_id = ?2",
                )
                .bind(&source_type)
                .bind(&source_id)
                .execute(&self.pool)
                .await?;
                return Ok(None);
            }
        };

        Ok(Some(CacheEntry {
            source_type,
            source_id,
            source_url,
            attachment,
            use_count,
            last_used_at,
        }))
    }

    async fn insert(&self, entry: &NewCacheEntry) -> Result<()> {
        let now = Utc::now();
        sqlx::query(
            "INSERT INTO attachment_cache
                 (source_type, source_id, source_url, attachment, use_count, created_at, last_used_at)
             VALUES (?1, ?2, ?3, ?4, 1, ?5, ?5)
             ON CONFLICT(source_type, source_id) DO NOTHING",
        )
        .bind(&entry.source_type)
        .bind(&entry.source_id)
        .bind(&entry.source_url)
        .bind(entry.attachment.to_string())
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
