//! TTL-bounded cache for externally fetched content

use crate::backend::{parse_counter, SharedBackend};
use crate::cache::{
    config::CacheConfig,
    entry::FetchCacheEntry,
    invalidation::{InvalidationEvent, InvalidationReason},
    types::{FetchStats, Locator},
};
use crate::error::Result;
use crate::fetch::{ContentFetcher, FetchError};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

/// Content cache keyed by locator with a fixed TTL and per-locator access counting
///
/// This implementation provides:
/// - An access counter per locator in the shared backend, bumped on every call
/// - Process-local content entries that turn stale after `fetch_ttl`
/// - Single-flight fetching: concurrent callers for one stale locator share a
///   single underlying fetch and its result
/// - Failed fetches never replace or serve cached content
pub struct ExpiringFetchCache {
    /// Cache configuration
    pub(crate) config: CacheConfig,

    fetcher: Arc<dyn ContentFetcher>,

    backend: SharedBackend,

    /// Per-locator flight state
    flights: RwLock<HashMap<Locator, Arc<Flight>>>,

    stats: RwLock<FetchStats>,
}

/// Serializes fetches of one locator
#[derive(Default)]
struct Flight {
    /// Completed underlying fetch attempts, readable without the lock
    completed: AtomicU64,

    state: Mutex<FlightState>,
}

#[derive(Default)]
struct FlightState {
    entry: Option<FetchCacheEntry>,

    /// Error of the most recent attempt, cleared by a successful fetch
    last_failure: Option<FetchError>,
}

impl ExpiringFetchCache {
    /// Create a cache that fetches through `fetcher` and counts accesses in `backend`
    pub fn new(
        fetcher: Arc<dyn ContentFetcher>,
        backend: SharedBackend,
        config: CacheConfig,
    ) -> Result<Self> {
        config.validate()?;
        info!("Initializing fetch cache with config: {:?}", config);

        Ok(Self {
            config,
            fetcher,
            backend,
            flights: RwLock::new(HashMap::new()),
            stats: RwLock::new(FetchStats::default()),
        })
    }

    /// Content behind `locator`, fetched only when no fresh entry exists
    ///
    /// The access counter is incremented first, on every call. A failed fetch
    /// is returned as [`CacheError::Fetch`](crate::CacheError::Fetch) and
    /// leaves the previous entry untouched, so the locator stays stale.
    pub async fn fetch(&self, locator: &str) -> Result<String> {
        let count = self.backend.increment(&self.access_count_key(locator)).await?;
        self.stats.write().await.accesses += 1;
        debug!("Access #{} to {}", count, locator);

        let flight = self.flight(locator).await;
        let seen = flight.completed.load(Ordering::Acquire);
        let mut state = flight.state.lock().await;

        if let Some(entry) = state.entry.as_mut() {
            if entry.is_fresh() {
                entry.mark_hit();
                self.stats.write().await.hits += 1;
                debug!("Cache hit: {}", locator);
                return Ok(entry.content.clone());
            }
        }

        self.stats.write().await.misses += 1;

        // An attempt finished while this caller waited for the lock
        if flight.completed.load(Ordering::Acquire) != seen {
            if let Some(err) = &state.last_failure {
                debug!("Sharing failed fetch of {} with waiting caller", locator);
                return Err(err.clone().into());
            }
        }

        debug!("Cache miss: {}, fetching", locator);
        let result = self.fetcher.fetch(locator).await;
        flight.completed.fetch_add(1, Ordering::AcqRel);

        match result {
            Ok(content) => {
                let ttl = self.config.fetch_ttl;
                let mut stats = self.stats.write().await;
                stats.fetches += 1;
                state.last_failure = None;

                if let Some(entry) = state.entry.as_mut() {
                    entry.refresh(content.clone(), ttl);
                } else {
                    state.entry = Some(FetchCacheEntry::new(locator, content.clone(), ttl));
                    stats.entries += 1;
                }

                Ok(content)
            }
            Err(e) => {
                warn!("Fetch of {} failed, keeping it stale: {}", locator, e);
                self.stats.write().await.fetch_failures += 1;
                state.last_failure = Some(e.clone());
                Err(e.into())
            }
        }
    }

    /// Backend key holding the access counter of `locator`
    pub fn access_count_key(&self, locator: &str) -> String {
        format!("{}{}", self.config.access_count_prefix, locator)
    }

    /// Total `fetch` calls recorded for `locator`, hits and misses alike
    pub async fn access_count(&self, locator: &str) -> Result<u64> {
        let key = self.access_count_key(locator);
        match self.backend.get(&key).await? {
            Some(raw) => Ok(parse_counter(&key, &raw)?.max(0) as u64),
            None => Ok(0),
        }
    }

    /// Get cache statistics
    pub async fn stats(&self) -> FetchStats {
        self.stats.read().await.clone()
    }

    /// Drop the cached content of `locator` so the next call fetches again
    ///
    /// Waits for an in-flight fetch of the same locator to finish first.
    /// The access counter is not reset.
    pub async fn invalidate(&self, locator: &str) -> Option<InvalidationEvent> {
        let flight = self.flights.read().await.get(locator).cloned()?;

        let mut state = flight.state.lock().await;
        state.last_failure = None;
        state.entry.take()?;

        let mut stats = self.stats.write().await;
        stats.entries = stats.entries.saturating_sub(1);
        stats.invalidations += 1;

        info!("Invalidated cached content of {}", locator);
        Some(InvalidationEvent::new(
            InvalidationReason::Manual,
            vec![locator.to_string()],
        ))
    }

    /// Remove all entries whose TTL elapsed
    ///
    /// Locators with a fetch in flight are skipped.
    pub async fn purge_expired(&self) -> Vec<InvalidationEvent> {
        let mut expired_locators = Vec::new();

        {
            let mut flights = self.flights.write().await;
            flights.retain(|locator, flight| {
                let Ok(mut state) = flight.state.try_lock() else {
                    return true;
                };

                let stale = state.entry.as_ref().map_or(true, |e| e.is_expired());
                if !stale {
                    return true;
                }
                if state.entry.take().is_some() {
                    expired_locators.push(locator.clone());
                }

                // Slots are cloned out under the map lock, so a count of 1
                // means no caller is about to use this one.
                Arc::strong_count(flight) > 1
            });
        }

        let mut events = Vec::new();
        if !expired_locators.is_empty() {
            let mut stats = self.stats.write().await;
            stats.entries = stats.entries.saturating_sub(expired_locators.len());
            stats.evictions_ttl += expired_locators.len() as u64;

            let count = expired_locators.len();
            events.push(
                InvalidationEvent::new(InvalidationReason::Expired, expired_locators)
                    .with_context(format!("Purged {} expired entries", count)),
            );

            debug!("Purged {} expired entries", count);
        }

        events
    }

    /// Get number of locators with cached content (fresh or stale)
    pub async fn len(&self) -> usize {
        self.stats.read().await.entries
    }

    /// Check if no content is cached
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Configuration this cache was created with
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    async fn flight(&self, locator: &str) -> Arc<Flight> {
        if let Some(flight) = self.flights.read().await.get(locator) {
            return flight.clone();
        }

        let mut flights = self.flights.write().await;
        flights.entry(locator.to_string()).or_default().clone()
    }
}

/// Background task purging expired entries every `cleanup_interval`
pub async fn start_auto_cleanup(cache: Arc<ExpiringFetchCache>) {
    let interval = cache.config.cleanup_interval;

    info!("Starting automatic fetch cache cleanup task (interval: {:?})", interval);

    loop {
        tokio::time::sleep(interval).await;

        let events = cache.purge_expired().await;
        if !events.is_empty() {
            debug!("Auto cleanup: {} events", events.len());
        }
    }
}
