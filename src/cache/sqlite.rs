//! SQLite-backed cache sharing the document database.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use super::{Cache, Clock, SystemClock};
use crate::db::DbPool;
use crate::{FilesError, Result};

/// Cache stored in the `cache_entries` table.
///
/// Entries survive restarts; expiry is checked against the injected clock
/// on every read and cleared by `purge_expired`.
#[derive(Debug, Clone)]
pub struct SqliteCache {
    pool: DbPool,
    clock: Arc<dyn Clock>,
}

impl SqliteCache {
    /// Create a cache on the system clock.
    pub fn new(pool: DbPool) -> Self {
        Self::with_clock(pool, Arc::new(SystemClock))
    }

    /// Create a cache on a custom clock.
    pub fn with_clock(pool: DbPool, clock: Arc<dyn Clock>) -> Self {
        Self { pool, clock }
    }

    fn now_millis(&self) -> i64 {
        self.clock.now().timestamp_millis()
    }
}

#[async_trait]
impl Cache for SqliteCache {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let value: Option<String> = sqlx::query_scalar(
            "SELECT value FROM cache_entries WHERE key = ? AND expires_at > ?",
        )
        .bind(key)
        .bind(self.now_millis())
        .fetch_optional(&self.pool)
        .await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let ttl_millis = i64::try_from(ttl.as_millis())
            .map_err(|_| FilesError::Validation("TTL too large".to_string()))?;
        let expires_at = self.now_millis().saturating_add(ttl_millis);

        sqlx::query(
            "INSERT INTO cache_entries (key, value, expires_at) VALUES (?, ?, ?)
             ON CONFLICT(key) DO UPDATE
             SET value = excluded.value, expires_at = excluded.expires_at",
        )
        .bind(key)
        .bind(value)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<bool> {
        let now = self.now_millis();
        let live: Option<i64> = sqlx::query_scalar(
            "DELETE FROM cache_entries WHERE key = ? RETURNING expires_at",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;
        Ok(live.is_some_and(|expires_at| expires_at > now))
    }

    async fn purge_expired(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM cache_entries WHERE expires_at <= ?")
            .bind(self.now_millis())
            .execute(&self.pool)
            .await?;

        let removed = result.rows_affected();
        if removed > 0 {
            debug!(removed, "Purged expired cache entries");
        }
        Ok(removed)
    }

    async fn is_alive(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}
