//! Key-value cache whose writes are counted and recorded

use crate::backend::SharedBackend;
use crate::cache::config::CacheConfig;
use crate::cache::history::Recordable;
use crate::cache::key::generate_key;
use crate::cache::replay::{Replay, ReplayLog};
use crate::cache::tracked::TrackedOperation;
use crate::cache::types::{converters, CacheKey, StoredValue};
use crate::error::{CacheError, Result};
use std::fmt::Display;
use tracing::{debug, info};

/// Stores values under generated opaque keys
///
/// `store` is a tracked operation: every call increments the `store` counter
/// and appends to `store:inputs` / `store:outputs` before and after the write.
/// `get` is not tracked.
///
/// ```no_run
/// use ouroboros_cache::{CacheConfig, InstrumentedCache, MemoryBackend};
/// use std::sync::Arc;
///
/// # async fn example() -> anyhow::Result<()> {
/// let cache = InstrumentedCache::new(Arc::new(MemoryBackend::new()), CacheConfig::default()).await?;
///
/// let key = cache.store("cookie").await?;
/// assert_eq!(cache.get_str(&key).await?, Some("cookie".to_string()));
///
/// println!("{}", cache.replay().await?);
/// # Ok(())
/// # }
/// ```
pub struct InstrumentedCache {
    backend: SharedBackend,
    store_op: TrackedOperation,
    config: CacheConfig,
}

impl InstrumentedCache {
    /// Operation identity of [`store`](Self::store)
    pub const STORE_OPERATION: &'static str = "store";

    /// Create a cache over `backend`, flushing it first if configured to
    pub async fn new(backend: SharedBackend, config: CacheConfig) -> Result<Self> {
        config.validate()?;
        info!("Initializing instrumented cache with config: {:?}", config);

        if config.flush_on_init {
            backend.flush().await?;
            info!("Flushed backend on cache initialization");
        }

        let store_op = TrackedOperation::new(backend.clone(), Self::STORE_OPERATION)
            .count_calls(config.count_calls)
            .record_history(config.record_history);

        Ok(Self {
            backend,
            store_op,
            config,
        })
    }

    /// Store `value` under a freshly generated key and return the key
    pub async fn store(&self, value: impl Into<StoredValue>) -> Result<CacheKey> {
        let value = value.into();
        let backend = &self.backend;

        self.store_op
            .invoke(vec![value.to_history()], || async move {
                let key = generate_key();
                backend.set(&key, &value.to_backend_bytes()).await?;
                debug!("Stored {} value under {}", value.kind(), key);
                Ok::<CacheKey, CacheError>(key)
            })
            .await
    }

    /// Raw stored representation of `key`, `None` if absent
    pub async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let value = self.backend.get(key).await?;
        if value.is_none() {
            debug!("Cache miss: {}", key);
        }
        Ok(value)
    }

    /// Look up `key` and run `converter` on the raw representation
    ///
    /// An absent key yields `Ok(None)` without calling the converter. A
    /// converter failure becomes [`CacheError::ConversionFailure`].
    pub async fn get_with<T, E, F>(&self, key: &str, converter: F) -> Result<Option<T>>
    where
        F: FnOnce(Vec<u8>) -> std::result::Result<T, E>,
        E: Display,
    {
        match self.get(key).await? {
            Some(raw) => converter(raw)
                .map(Some)
                .map_err(|e| CacheError::ConversionFailure(format!("{}: {}", key, e))),
            None => Ok(None),
        }
    }

    /// Value of `key` as UTF-8 text
    pub async fn get_str(&self, key: &str) -> Result<Option<String>> {
        self.get_with(key, converters::text).await
    }

    /// Value of `key` as an integer
    pub async fn get_int(&self, key: &str) -> Result<Option<i64>> {
        self.get_with(key, converters::integer).await
    }

    /// Value of `key` as a float
    pub async fn get_float(&self, key: &str) -> Result<Option<f64>> {
        self.get_with(key, converters::float).await
    }

    /// Number of `store` calls recorded by the backend
    pub async fn store_count(&self) -> Result<u64> {
        self.store_op.counter().await
    }

    /// Call history of `store`
    pub async fn replay(&self) -> Result<Replay> {
        ReplayLog::new(self.backend.clone())
            .replay(Self::STORE_OPERATION)
            .await
    }

    /// Backend shared by this cache
    pub fn backend(&self) -> &SharedBackend {
        &self.backend
    }

    /// Configuration this cache was created with
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }
}
