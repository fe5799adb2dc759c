//! In-process cache.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::debug;

use super::{Cache, Clock, SystemClock};
use crate::{FilesError, Result};

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: DateTime<Utc>,
}

/// Cache held in memory, with expiry judged against an injected clock.
#[derive(Debug)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, Entry>>,
    clock: Arc<dyn Clock>,
    available: AtomicBool,
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryCache {
    /// Create a cache on the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create a cache on a custom clock.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            clock,
            available: AtomicBool::new(true),
        }
    }

    /// Simulate losing (or regaining) the connection to the cache.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Number of entries held, expired or not.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether no entries are held.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    fn check_available(&self) -> Result<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(FilesError::Unavailable("memory cache is offline".to_string()))
        }
    }
}

#[async_trait]
impl Cache for MemoryCache {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.check_available()?;
        let now = self.clock.now();

        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                None => return Ok(None),
                Some(entry) if entry.expires_at > now => return Ok(Some(entry.value.clone())),
                Some(_) => {}
            }
        }

        // Expired: drop it unless it was replaced in the meantime.
        let mut entries = self.entries.write().await;
        if entries.get(key).is_some_and(|e| e.expires_at <= now) {
            entries.remove(key);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        self.check_available()?;
        let expires_at = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| self.clock.now().checked_add_signed(ttl))
            .ok_or_else(|| FilesError::Validation("TTL too large".to_string()))?;

        let entry = Entry {
            value: value.to_string(),
            expires_at,
        };
        self.entries.write().await.insert(key.to_string(), entry);
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<bool> {
        self.check_available()?;
        let now = self.clock.now();

        let removed = self.entries.write().await.remove(key);
        Ok(removed.is_some_and(|e| e.expires_at > now))
    }

    async fn purge_expired(&self) -> Result<u64> {
        self.check_available()?;
        let now = self.clock.now();

        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, e| e.expires_at > now);
        let removed = (before - entries.len()) as u64;

        if removed > 0 {
            debug!(removed, "Purged expired cache entries");
        }
        Ok(removed)
    }

    async fn is_alive(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;

    fn cache_with_clock() -> (MemoryCache, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        (MemoryCache::with_clock(clock.clone()), clock)
    }

    #[tokio::test]
    async fn test_set_and_get() {
        let cache = MemoryCache::new();
        cache.set("k", "v", Duration::from_secs(60)).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), Some("v".to_string()));
        assert_eq!(cache.get("other").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_overwrites() {
        let cache = MemoryCache::new();
        cache.set("k", "v1", Duration::from_secs(60)).await.unwrap();
        cache.set("k", "v2", Duration::from_secs(60)).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), Some("v2".to_string()));
    }

    #[tokio::test]
    async fn test_entry_expires() {
        let (cache, clock) = cache_with_clock();
        cache.set("k", "v", Duration::from_secs(10)).await.unwrap();

        clock.advance(Duration::from_secs(9));
        assert!(cache.get("k").await.unwrap().is_some());

        clock.advance(Duration::from_secs(1));
        assert!(cache.get("k").await.unwrap().is_none());
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_get_does_not_extend_ttl() {
        let (cache, clock) = cache_with_clock();
        cache.set("k", "v", Duration::from_secs(10)).await.unwrap();

        for _ in 0..3 {
            clock.advance(Duration::from_secs(3));
            assert!(cache.get("k").await.unwrap().is_some());
        }
        clock.advance(Duration::from_secs(1));
        assert!(cache.get("k").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_del() {
        let (cache, clock) = cache_with_clock();
        cache.set("k", "v", Duration::from_secs(10)).await.unwrap();

        assert!(cache.del("k").await.unwrap());
        assert!(!cache.del("k").await.unwrap());
        assert!(cache.get("k").await.unwrap().is_none());

        cache.set("e", "v", Duration::from_secs(1)).await.unwrap();
        clock.advance(Duration::from_secs(2));
        assert!(!cache.del("e").await.unwrap());
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let (cache, clock) = cache_with_clock();
        cache.set("short", "v", Duration::from_secs(1)).await.unwrap();
        cache.set("long", "v", Duration::from_secs(100)).await.unwrap();

        clock.advance(Duration::from_secs(5));
        assert_eq!(cache.purge_expired().await.unwrap(), 1);
        assert_eq!(cache.len().await, 1);
        assert!(cache.get("long").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_set_rejects_huge_ttl() {
        let cache = MemoryCache::new();

        let err = cache
            .set("k", "v", Duration::from_secs(10_000_000_000_000))
            .await
            .unwrap_err();
        assert!(matches!(err, FilesError::Validation(ref m) if m == "TTL too large"));

        let err = cache.set("k", "v", Duration::MAX).await.unwrap_err();
        assert!(matches!(err, FilesError::Validation(_)));
        assert!(cache.get("k").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unavailable_cache() {
        let cache = MemoryCache::new();
        cache.set_available(false);

        assert!(!cache.is_alive().await);
        assert!(matches!(
            cache.get("k").await,
            Err(FilesError::Unavailable(_))
        ));
    }
}
