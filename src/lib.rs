//! # Ouroboros Cache (ouroboros-cache)
//!
//! An instrumented caching layer over a shared key-value store.
//!
//! ## Features
//!
//! - Opaque, collision-free keys for stored values
//! - Per-operation call counters backed by atomic backend increments
//! - Ordered, replayable input/output history per operation
//! - A TTL-bounded fetch cache with per-locator access counting
//! - Pluggable backends: in-memory, or redis behind the `redis` feature
//! - Async-first design using tokio
//!
//! ## Instrumented Cache
//!
//! ```no_run
//! use ouroboros_cache::{CacheConfig, InstrumentedCache, RedisBackend, RedisConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let backend = RedisBackend::connect(RedisConfig::from_env()).await?;
//!     let cache = InstrumentedCache::new(Arc::new(backend), CacheConfig::from_env()?).await?;
//!
//!     let key = cache.store("cookie").await?;
//!     println!("{} -> {:?}", key, cache.get_str(&key).await?);
//!     println!("{}", cache.replay().await?);
//!     Ok(())
//! }
//! ```
//!
//! ## Expiring Fetch Cache
//!
//! Repeated fetches of a locator within the TTL hit the network once; the
//! access counter still sees every call.
//!
//! ```no_run
//! use ouroboros_cache::{CacheConfig, ExpiringFetchCache, HttpFetcher, MemoryBackend};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let cache = ExpiringFetchCache::new(
//!         Arc::new(HttpFetcher::new()?),
//!         Arc::new(MemoryBackend::new()),
//!         CacheConfig::default(),
//!     )?;
//!
//!     let url = "http://slowwly.robertomurray.co.uk";
//!     for _ in 0..3 {
//!         cache.fetch(url).await?;
//!     }
//!     println!("{} accesses, {}", cache.access_count(url).await?, cache.stats().await);
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod cache;
pub mod docstore;
pub mod error;
pub mod fetch;

// Re-export main types for convenience
#[cfg(feature = "redis")]
pub use backend::{RedisBackend, RedisConfig};
pub use backend::{KeyValueBackend, MemoryBackend, SharedBackend};
pub use cache::{
    start_auto_cleanup, CacheConfig, CacheConfigBuilder, CacheKey, CallOutcome, CallRecord,
    ExpiringFetchCache, FetchStats, InstrumentedCache, OperationId, Replay, ReplayLog,
    StoredValue, TrackedOperation,
};
pub use docstore::{Document, DocumentStore, LogStats};
pub use error::{CacheError, Result};
pub use fetch::{ContentFetcher, FetchError, HttpFetcher};
