//! Key-value backend abstraction
//!
//! The caches never talk to a store directly. They consume the narrow
//! [`KeyValueBackend`] interface, which must provide atomic increment and
//! atomic list append; no in-process locking is layered on top of it.

pub mod memory;
#[cfg(feature = "redis")]
pub mod redis;

use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

pub use memory::MemoryBackend;
#[cfg(feature = "redis")]
pub use self::redis::{RedisBackend, RedisConfig};

/// Backend handle shared between caches
pub type SharedBackend = Arc<dyn KeyValueBackend>;

/// Persistent key-value store consumed by the caches
#[async_trait]
pub trait KeyValueBackend: Send + Sync {
    /// Store a scalar value
    async fn set(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Store a scalar value that expires after `ttl`
    async fn set_with_ttl(&self, key: &str, value: &[u8], ttl: Duration) -> Result<()>;

    /// Read a scalar value, `None` when absent or expired
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Atomically increment an integer counter, creating it at 0 first
    async fn increment(&self, key: &str) -> Result<i64>;

    /// Atomically append to a list, returning the new list length
    async fn append_to_list(&self, list: &str, entry: &[u8]) -> Result<u64>;

    /// Read a whole list in append order, empty when absent
    async fn read_list(&self, list: &str) -> Result<Vec<Vec<u8>>>;

    /// Remove every key
    async fn flush(&self) -> Result<()>;
}

/// Parse a counter value the way the backend stores it (decimal text)
pub(crate) fn parse_counter(key: &str, raw: &[u8]) -> Result<i64> {
    std::str::from_utf8(raw)
        .ok()
        .and_then(|s| s.trim().parse::<i64>().ok())
        .ok_or_else(|| crate::error::CacheError::BackendCommand {
            command: "GET",
            key: key.to_string(),
            reason: "value is not an integer".to_string(),
        })
}
