//! Key-value cache with fixed per-entry expiry.
//!
//! Session tokens live here. Expiry is owned by the cache: an entry whose
//! TTL has elapsed is reported exactly like one that never existed.

mod clock;
mod memory;
mod sqlite;

pub use clock::{Clock, ManualClock, SystemClock};
pub use memory::MemoryCache;
pub use sqlite::SqliteCache;

use std::time::Duration;

use async_trait::async_trait;

use crate::Result;

/// Operations the service needs from a key-value cache.
///
/// Calls from one caller on one key complete in the order they are awaited.
#[async_trait]
pub trait Cache: Send + Sync {
    /// Name of the backend, for logs and diagnostics.
    fn backend_name(&self) -> &'static str;

    /// Value stored under `key`, unless missing or expired.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, expiring `ttl` from now. Overwrites.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;

    /// Remove `key`. Returns `true` if a live entry was removed.
    async fn del(&self, key: &str) -> Result<bool>;

    /// Drop expired entries, returning how many were removed.
    async fn purge_expired(&self) -> Result<u64>;

    /// Whether the backend is reachable.
    async fn is_alive(&self) -> bool;
}
