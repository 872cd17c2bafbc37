//! In-process backend used for tests and the CLI's default mode

use super::KeyValueBackend;
use crate::error::{CacheError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, info};

/// Key-value store held in process memory
///
/// Every trait call takes the write lock for its whole duration, which makes
/// increment and append atomic with respect to each other.
#[derive(Default)]
pub struct MemoryBackend {
    slots: RwLock<HashMap<String, Slot>>,
}

struct Slot {
    value: SlotValue,
    expires_at: Option<Instant>,
}

enum SlotValue {
    Scalar(Vec<u8>),
    List(Vec<Vec<u8>>),
}

impl Slot {
    fn scalar(value: Vec<u8>, expires_at: Option<Instant>) -> Self {
        Self {
            value: SlotValue::Scalar(value),
            expires_at,
        }
    }

    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

fn wrong_type(command: &'static str, key: &str) -> CacheError {
    CacheError::BackendCommand {
        command,
        key: key.to_string(),
        reason: "operation against a key holding the wrong kind of value".to_string(),
    }
}

impl MemoryBackend {
    /// Create an empty backend
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live keys
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        let slots = self.slots.read().await;
        slots.values().filter(|s| !s.is_expired(now)).count()
    }

    /// Check if the backend holds no live keys
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Check if a live key exists
    pub async fn contains_key(&self, key: &str) -> bool {
        let now = Instant::now();
        let slots = self.slots.read().await;
        slots.get(key).is_some_and(|s| !s.is_expired(now))
    }

    /// Drop the slot if it has expired so callers see it as absent
    fn evict_expired(slots: &mut HashMap<String, Slot>, key: &str) {
        if slots.get(key).is_some_and(|s| s.is_expired(Instant::now())) {
            debug!("Expired key removed: {}", key);
            slots.remove(key);
        }
    }
}

#[async_trait]
impl KeyValueBackend for MemoryBackend {
    async fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        let mut slots = self.slots.write().await;
        slots.insert(key.to_string(), Slot::scalar(value.to_vec(), None));
        Ok(())
    }

    async fn set_with_ttl(&self, key: &str, value: &[u8], ttl: Duration) -> Result<()> {
        if ttl.is_zero() {
            return Err(CacheError::BackendCommand {
                command: "SETEX",
                key: key.to_string(),
                reason: "invalid expire time".to_string(),
            });
        }

        let mut slots = self.slots.write().await;
        slots.insert(
            key.to_string(),
            Slot::scalar(value.to_vec(), Some(Instant::now() + ttl)),
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut slots = self.slots.write().await;
        Self::evict_expired(&mut slots, key);

        match slots.get(key) {
            Some(Slot {
                value: SlotValue::Scalar(bytes),
                ..
            }) => Ok(Some(bytes.clone())),
            Some(_) => Err(wrong_type("GET", key)),
            None => Ok(None),
        }
    }

    async fn increment(&self, key: &str) -> Result<i64> {
        let mut slots = self.slots.write().await;
        Self::evict_expired(&mut slots, key);

        let slot = slots
            .entry(key.to_string())
            .or_insert_with(|| Slot::scalar(b"0".to_vec(), None));

        let SlotValue::Scalar(bytes) = &mut slot.value else {
            return Err(wrong_type("INCR", key));
        };

        let current = super::parse_counter(key, bytes).map_err(|_| CacheError::BackendCommand {
            command: "INCR",
            key: key.to_string(),
            reason: "value is not an integer or out of range".to_string(),
        })?;
        let next = current.checked_add(1).ok_or_else(|| CacheError::BackendCommand {
            command: "INCR",
            key: key.to_string(),
            reason: "increment would overflow".to_string(),
        })?;

        *bytes = next.to_string().into_bytes();
        Ok(next)
    }

    async fn append_to_list(&self, list: &str, entry: &[u8]) -> Result<u64> {
        let mut slots = self.slots.write().await;
        Self::evict_expired(&mut slots, list);

        let slot = slots.entry(list.to_string()).or_insert_with(|| Slot {
            value: SlotValue::List(Vec::new()),
            expires_at: None,
        });

        let SlotValue::List(items) = &mut slot.value else {
            return Err(wrong_type("RPUSH", list));
        };

        items.push(entry.to_vec());
        Ok(items.len() as u64)
    }

    async fn read_list(&self, list: &str) -> Result<Vec<Vec<u8>>> {
        let mut slots = self.slots.write().await;
        Self::evict_expired(&mut slots, list);

        match slots.get(list) {
            Some(Slot {
                value: SlotValue::List(items),
                ..
            }) => Ok(items.clone()),
            Some(_) => Err(wrong_type("LRANGE", list)),
            None => Ok(Vec::new()),
        }
    }

    async fn flush(&self) -> Result<()> {
        let mut slots = self.slots.write().await;
        let count = slots.len();
        slots.clear();
        info!("Flushed {} keys from memory backend", count);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_set_and_get() {
        let backend = MemoryBackend::new();
        backend.set("key1", b"value1").await.unwrap();

        assert_eq!(backend.get("key1").await.unwrap(), Some(b"value1".to_vec()));
        assert_eq!(backend.get("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_increment_starts_at_zero() {
        let backend = MemoryBackend::new();
        assert_eq!(backend.increment("counter").await.unwrap(), 1);
        assert_eq!(backend.increment("counter").await.unwrap(), 2);
        assert_eq!(backend.get("counter").await.unwrap(), Some(b"2".to_vec()));
    }

    #[tokio::test]
    async fn test_increment_non_integer() {
        let backend = MemoryBackend::new();
        backend.set("text", b"cookie").await.unwrap();

        let err = backend.increment("text").await.unwrap_err();
        assert!(matches!(err, CacheError::BackendCommand { command: "INCR", .. }));
    }

    #[tokio::test]
    async fn test_list_append_and_read() {
        let backend = MemoryBackend::new();
        assert_eq!(backend.append_to_list("list", b"a").await.unwrap(), 1);
        assert_eq!(backend.append_to_list("list", b"b").await.unwrap(), 2);

        let items = backend.read_list("list").await.unwrap();
        assert_eq!(items, vec![b"a".to_vec(), b"b".to_vec()]);
        assert!(backend.read_list("empty").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_wrong_type() {
        let backend = MemoryBackend::new();
        backend.append_to_list("list", b"a").await.unwrap();

        assert!(backend.get("list").await.is_err());
        assert!(backend.increment("list").await.is_err());

        backend.set("scalar", b"1").await.unwrap();
        assert!(backend.append_to_list("scalar", b"x").await.is_err());
        assert!(backend.read_list("scalar").await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_with_ttl_expires() {
        let backend = MemoryBackend::new();
        backend
            .set_with_ttl("page", b"<html>", Duration::from_secs(10))
            .await
            .unwrap();

        tokio::time::advance(Duration::from_secs(9)).await;
        assert!(backend.get("page").await.unwrap().is_some());

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(backend.get("page").await.unwrap().is_none());
        assert!(!backend.contains_key("page").await);
    }

    #[tokio::test]
    async fn test_zero_ttl_rejected() {
        let backend = MemoryBackend::new();
        assert!(backend.set_with_ttl("k", b"v", Duration::ZERO).await.is_err());
    }

    #[tokio::test]
    async fn test_flush() {
        let backend = MemoryBackend::new();
        backend.set("a", b"1").await.unwrap();
        backend.append_to_list("b", b"2").await.unwrap();
        assert_eq!(backend.len().await, 2);

        backend.flush().await.unwrap();
        assert!(backend.is_empty().await);
    }

    #[tokio::test]
    async fn test_concurrent_increments_are_atomic() {
        let backend = Arc::new(MemoryBackend::new());
        let mut handles = Vec::new();

        for _ in 0..64 {
            let backend = backend.clone();
            handles.push(tokio::spawn(async move {
                backend.increment("shared").await.unwrap()
            }));
        }

        let mut seen = Vec::new();
        for handle in handles {
            seen.push(handle.await.unwrap());
        }
        seen.sort_unstable();

        assert_eq!(seen, (1..=64).collect::<Vec<i64>>());
    }
}
