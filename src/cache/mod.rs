//! # Instrumented Caching Layer
//!
//! Two caches share one [`KeyValueBackend`](crate::backend::KeyValueBackend)
//! but never each other's keys.
//!
//! ## Features
//!
//! - **Opaque Keys**: every stored value gets a fresh 128-bit random key
//! - **Call Counting**: each tracked operation keeps an atomic counter under its name
//! - **Replayable History**: inputs and outputs are appended to per-operation lists
//!   and paired back up by call position
//! - **TTL-Bounded Fetching**: fetched content is reused until its TTL elapses,
//!   with a per-locator access counter and single-flight refreshes
//!
//! ## Keyspace
//!
//! - `<operation>`: call counter
//! - `<operation>:inputs` / `<operation>:outputs`: history lists
//! - `<generated key>`: stored values
//! - `count:<locator>`: fetch access counters
//!
//! ## Example
//!
//! ```no_run
//! use ouroboros_cache::cache::{CacheConfig, InstrumentedCache};
//! use ouroboros_cache::backend::MemoryBackend;
//! use std::sync::Arc;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let cache = InstrumentedCache::new(Arc::new(MemoryBackend::new()), CacheConfig::default()).await?;
//!
//! cache.store("a").await?;
//! cache.store(1i64).await?;
//! cache.store(2.5f64).await?;
//!
//! // store was called 3 times:
//! // store("a") -> "..."
//! println!("{}", cache.replay().await?);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod entry;
pub mod expiring;
pub mod history;
pub mod instrumented;
pub mod invalidation;
pub mod key;
pub mod replay;
pub mod tracked;
pub mod types;

pub use config::{CacheConfig, CacheConfigBuilder};
pub use entry::{EntryMetadata, FetchCacheEntry};
pub use expiring::{start_auto_cleanup, ExpiringFetchCache};
pub use history::{HistoryRecord, HistoryValue, RecordBody, Recordable};
pub use instrumented::InstrumentedCache;
pub use invalidation::{InvalidationEvent, InvalidationReason};
pub use key::{generate_key, OperationId};
pub use replay::{CallArguments, CallOutcome, CallRecord, Replay, ReplayLog};
pub use tracked::TrackedOperation;
pub use types::{converters, CacheKey, FetchStats, Locator, StoredValue};
