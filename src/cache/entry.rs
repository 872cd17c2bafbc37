//! Fetch cache entries with TTL support

use crate::cache::types::Locator;
use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::time::Instant;

/// Last fetched body of a locator
///
/// Freshness is measured on the tokio clock so it follows paused time in
/// tests; `fetched_at` is the wall-clock timestamp for display.
#[derive(Debug, Clone)]
pub struct FetchCacheEntry {
    /// The locator this body was fetched from
    pub locator: Locator,

    /// The fetched body
    pub content: String,

    /// Entry metadata
    pub metadata: EntryMetadata,
}

/// Metadata associated with a fetch cache entry
#[derive(Debug, Clone)]
pub struct EntryMetadata {
    /// Wall-clock time of the fetch that produced the content
    pub fetched_at: DateTime<Utc>,

    /// Monotonic time of that fetch
    pub refreshed_at: Instant,

    /// When the entry turns stale
    pub expires_at: Instant,

    /// Number of calls answered from this entry
    pub hit_count: u64,

    /// Incremented each time the content is replaced by a fresh fetch
    pub version: u64,
}

impl FetchCacheEntry {
    /// Create an entry for content fetched just now
    pub fn new(locator: impl Into<Locator>, content: String, ttl: Duration) -> Self {
        let now = Instant::now();

        Self {
            locator: locator.into(),
            content,
            metadata: EntryMetadata {
                fetched_at: Utc::now(),
                refreshed_at: now,
                expires_at: now + ttl,
                hit_count: 0,
                version: 1,
            },
        }
    }

    /// FRESH while `now - fetched < ttl`
    pub fn is_fresh(&self) -> bool {
        Instant::now() < self.metadata.expires_at
    }

    /// Check if the entry has gone stale
    pub fn is_expired(&self) -> bool {
        !self.is_fresh()
    }

    /// Get time until the entry turns stale
    pub fn time_until_expiration(&self) -> Option<Duration> {
        let now = Instant::now();
        if now >= self.metadata.expires_at {
            None
        } else {
            Some(self.metadata.expires_at - now)
        }
    }

    /// Time since the content was fetched
    pub fn age(&self) -> Duration {
        Instant::now().saturating_duration_since(self.metadata.refreshed_at)
    }

    /// Record a call answered from this entry
    pub fn mark_hit(&mut self) {
        self.metadata.hit_count += 1;
    }

    /// Replace the content with a fresh fetch and restart the TTL
    pub fn refresh(&mut self, content: String, ttl: Duration) {
        let now = Instant::now();
        self.content = content;
        self.metadata.fetched_at = Utc::now();
        self.metadata.refreshed_at = now;
        self.metadata.expires_at = now + ttl;
        self.metadata.hit_count = 0;
        self.metadata.version += 1;
    }

    /// Approximate size of this entry in bytes
    pub fn calculate_size(&self) -> usize {
        self.locator.len() + self.content.len() + std::mem::size_of::<EntryMetadata>()
    }
}
