//! Cache store trait and shared types.
//!
//! The response cache stores serialized JSON bodies under a small, fixed set
//! of family keys. Values are opaque strings to the store.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Errors raised by cache backends.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
    #[error("Cache connection failed: {0}")]
    Connection(String),

    #[error("Cache command failed: {0}")]
    Command(String),

    #[error("Invalid cache configuration: {0}")]
    Config(String),
}

impl From<redis::RedisError> for CacheError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_connection_dropped() || err.is_connection_refusal() || err.is_timeout() {
            CacheError::Connection(err.to_string())
        } else {
            CacheError::Command(err.to_string())
        }
    }
}

pub type CacheResult<T> = Result<T, CacheError>;

/// Key-value store backing the response cache.
///
/// Implementations must be safe for concurrent use from many request tasks.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Fetch a value. Expired or absent keys yield `None`.
    async fn get(&self, key: &str) -> CacheResult<Option<String>>;

    /// Store a value with a time-to-live, overwriting any previous value.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()>;

    /// Remove a key. Returns whether a live value was removed.
    async fn delete(&self, key: &str) -> CacheResult<bool>;

    /// Check that the backend is reachable.
    async fn ping(&self) -> CacheResult<()>;

    /// Short backend name for logs.
    fn backend_name(&self) -> &'static str;
}

/// Statistics about cache usage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses.
    pub misses: u64,
    /// Number of writes.
    pub sets: u64,
    /// Number of keys removed by delete.
    pub deletes: u64,
    /// Number of entries currently held, including not-yet-reaped expired ones.
    pub entries: usize,
}

impl CacheStats {
    /// Hit rate in `[0.0, 1.0]`, or 0 when nothing was read yet.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
