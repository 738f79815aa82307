//! SQLite-backed coordination store
//!
//! Both processes open the same database file; SQLite serializes writers,
//! which gives the queue its cross-process pop atomicity. Values live in
//! `store_values` with lazy TTL expiry, lists in `store_lists` ordered by
//! a per-key sequence number.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::path::Path;
use std::time::Duration;
use tracing::info;

use super::{resolve_range, CoordinationStore};
use crate::error::Result;

/// Open (creating if needed) the coordination database at `db_path`.
pub async fn connect(db_path: &Path) -> Result<SqlitePool> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&db_url)
        .await?;

    info!("Coordination database opened at {}", db_path.display());
    Ok(pool)
}

/// Persistent [`CoordinationStore`] shared with the engine process
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Create the store tables if needed and wrap the pool.
    pub async fn init(pool: SqlitePool) -> Result<Self> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS store_values (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                expires_at INTEGER
            )",
        )
        .execute(&pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS store_lists (
                key TEXT NOT NULL,
                seq INTEGER NOT NULL,
                value TEXT NOT NULL,
                PRIMARY KEY (key, seq)
            )",
        )
        .execute(&pool)
        .await?;

        Ok(Self { pool })
    }

    /// Underlying pool, for sharing with other tables in the same file.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    fn now_millis() -> i64 {
        Utc::now().timestamp_millis()
    }
}

#[async_trait]
impl CoordinationStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let row = sqlx::query_as::<_, (String, Option<i64>)>(
            "SELECT value, expires_at FROM store_values WHERE key = ?1",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some((_, Some(expires_at))) if expires_at <= Self::now_millis() => {
                // Lazy expiry: drop the entry the first time it reads as stale.
                sqlx::query("DELETE FROM store_values WHERE key = ?1")
                    .bind(key)
                    .execute(&self.pool)
                    .await?;
                Ok(None)
            }
            Some((value, _)) => Ok(Some(value)),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()> {
        let expires_at = ttl.map(|t| Self::now_millis() + t.as_millis() as i64);
        sqlx::query(
            "INSERT INTO store_values (key, value, expires_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, expires_at = excluded.expires_at",
        )
        .bind(key)
        .bind(value)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let values = sqlx::query("DELETE FROM store_values WHERE key = ?1")
            .bind(key)
            .execute(&self.pool)
            .await?;
        let lists = sqlx::query("DELETE FROM store_lists WHERE key = ?1")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(values.rows_affected() > 0 || lists.rows_affected() > 0)
    }

    async fn push_back(&self, key: &str, value: &str) -> Result<u64> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "INSERT INTO store_lists (key, seq, value)
             SELECT ?1, COALESCE(MAX(seq), 0) + 1, ?2 FROM store_lists WHERE key = ?1",
        )
        .bind(key)
        .bind(value)
        .execute(&mut *tx)
        .await?;
        let len: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM store_lists WHERE key = ?1")
            .bind(key)
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(len as u64)
    }

    async fn push_front(&self, key: &str, value: &str) -> Result<u64> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "INSERT INTO store_lists (key, seq, value)
             SELECT ?1, COALESCE(MIN(seq), 0) - 1, ?2 FROM store_lists WHERE key = ?1",
        )
        .bind(key)
        .bind(value)
        .execute(&mut *tx)
        .await?;
        let len: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM store_lists WHERE key = ?1")
            .bind(key)
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(len as u64)
    }

    async fn pop_front(&self, key: &str) -> Result<Option<String>> {
        // Single statement keeps the pop atomic across processes.
        let value = sqlx::query_scalar::<_, String>(
            "DELETE FROM store_lists
             WHERE key = ?1 AND seq = (SELECT MIN(seq) FROM store_lists WHERE key = ?1)
             RETURNING value",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;
        Ok(value)
    }

    async fn list_range(&self, key: &str, start: i64, stop: i64) -> Result<Vec<String>> {
        let len = self.list_len(key).await?;
        let Some((start, stop)) = resolve_range(start, stop, len as usize) else {
            return Ok(Vec::new());
        };
        let values = sqlx::query_scalar::<_, String>(
            "SELECT value FROM store_lists WHERE key = ?1 ORDER BY seq LIMIT ?2 OFFSET ?3",
        )
        .bind(key)
        .bind((stop - start + 1) as i64)
        .bind(start as i64)
        .fetch_all(&self.pool)
        .await?;
        Ok(values)
    }

    async fn list_len(&self, key: &str) -> Result<u64> {
        let len: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM store_lists WHERE key = ?1")
            .bind(key)
            .fetch_one(&self.pool)
            .await?;
        Ok(len as u64)
    }

    async fn list_trim(&self, key: &str, start: i64, stop: i64) -> Result<()> {
        let len = self.list_len(key).await?;
        match resolve_range(start, stop, len as usize) {
            Some((start, stop)) => {
                sqlx::query(
                    "DELETE FROM store_lists
                     WHERE key = ?1 AND seq NOT IN (
                         SELECT seq FROM store_lists WHERE key = ?1
                         ORDER BY seq LIMIT ?2 OFFSET ?3
                     )",
                )
                .bind(key)
                .bind((stop - start + 1) as i64)
                .bind(start as i64)
                .execute(&self.pool)
                .await?;
            }
            None => {
                sqlx::query("DELETE FROM store_lists WHERE key = ?1")
                    .bind(key)
                    .execute(&self.pool)
                    .await?;
            }
        }
        Ok(())
    }

    async fn list_remove_at(&self, key: &str, index: u64) -> Result<bool> {
        // No row can sit past i64; a raw cast would wrap negative and
        // SQLite reads a negative OFFSET as 0.
        let Ok(index) = i64::try_from(index) else {
            return Ok(false);
        };
        let result = sqlx::query(
            "DELETE FROM store_lists
             WHERE key = ?1 AND seq = (
                 SELECT seq FROM store_lists WHERE key = ?1
                 ORDER BY seq LIMIT 1 OFFSET ?2
             )",
        )
        .bind(key)
        .bind(index)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
