//! Configuration for the cache system

use crate::error::{CacheError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration shared by the instrumented cache and the fetch cache
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// How long a fetched body stays fresh
    pub fetch_ttl: Duration,

    /// Flush the whole backend when an instrumented cache is created
    pub flush_on_init: bool,

    /// Increment per-operation call counters
    pub count_calls: bool,

    /// Record input/output history for tracked operations
    pub record_history: bool,

    /// Prefix of the per-locator access counters in the backend
    pub access_count_prefix: String,

    /// Interval of the background purge of expired fetch entries
    pub cleanup_interval: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            fetch_ttl: Duration::from_secs(10),
            flush_on_init: false,
            count_calls: true,
            record_history: true,
            access_count_prefix: "count:".to_string(),
            cleanup_interval: Duration::from_secs(60),
        }
    }
}

impl CacheConfig {
    /// Create a new builder for cache configuration
    pub fn builder() -> CacheConfigBuilder {
        CacheConfigBuilder::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.fetch_ttl.is_zero() {
            return Err(CacheError::ConfigError(
                "fetch_ttl must be greater than 0".to_string(),
            ));
        }

        if self.cleanup_interval.is_zero() {
            return Err(CacheError::ConfigError(
                "cleanup_interval must be greater than 0".to_string(),
            ));
        }

        if self.access_count_prefix.is_empty() {
            return Err(CacheError::ConfigError(
                "access_count_prefix must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Load overrides from the environment (and a `.env` file if present)
    ///
    /// Recognised variables:
    /// - `OUROBOROS_CACHE_FETCH_TTL_SECS`
    /// - `OUROBOROS_CACHE_FLUSH_ON_INIT` (`true`/`false`/`1`/`0`)
    /// - `OUROBOROS_CACHE_CLEANUP_INTERVAL_SECS`
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut builder = Self::builder();

        if let Some(raw) = lookup("OUROBOROS_CACHE_FETCH_TTL_SECS") {
            builder = builder.fetch_ttl(Duration::from_secs(parse_secs(
                "OUROBOROS_CACHE_FETCH_TTL_SECS",
                &raw,
            )?));
        }

        if let Some(raw) = lookup("OUROBOROS_CACHE_FLUSH_ON_INIT") {
            let flush = match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" => false,
                other => {
                    return Err(CacheError::ConfigError(format!(
                        "OUROBOROS_CACHE_FLUSH_ON_INIT: expected a boolean, got '{}'",
                        other
                    )))
                }
            };
            builder = builder.flush_on_init(flush);
        }

        if let Some(raw) = lookup("OUROBOROS_CACHE_CLEANUP_INTERVAL_SECS") {
            builder = builder.cleanup_interval(Duration::from_secs(parse_secs(
                "OUROBOROS_CACHE_CLEANUP_INTERVAL_SECS",
                &raw,
            )?));
        }

        let config = builder.build();
        config.validate()?;
        Ok(config)
    }
}

fn parse_secs(name: &str, raw: &str) -> Result<u64> {
    raw.trim().parse::<u64>().map_err(|e| {
        CacheError::ConfigError(format!("{}: expected whole seconds, got '{}': {}", name, raw, e))
    })
}

/// Builder for cache configuration
#[derive(Debug, Default)]
pub struct CacheConfigBuilder {
    fetch_ttl: Option<Duration>,
    flush_on_init: Option<bool>,
    count_calls: Option<bool>,
    record_history: Option<bool>,
    access_count_prefix: Option<String>,
    cleanup_interval: Option<Duration>,
}

impl CacheConfigBuilder {
    /// Set how long fetched content stays fresh
    pub fn fetch_ttl(mut self, ttl: Duration) -> Self {
        self.fetch_ttl = Some(ttl);
        self
    }

    /// Flush the backend when the instrumented cache is created
    pub fn flush_on_init(mut self, flush: bool) -> Self {
        self.flush_on_init = Some(flush);
        self
    }

    /// Enable or disable call counters
    pub fn count_calls(mut self, enable: bool) -> Self {
        self.count_calls = Some(enable);
        self
    }

    /// Enable or disable input/output history
    pub fn record_history(mut self, enable: bool) -> Self {
        self.record_history = Some(enable);
        self
    }

    /// Set the access counter prefix
    pub fn access_count_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.access_count_prefix = Some(prefix.into());
        self
    }

    /// Set cleanup interval
    pub fn cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = Some(interval);
        self
    }

    /// Build the cache configuration
    pub fn build(self) -> CacheConfig {
        let defaults = CacheConfig::default();

        CacheConfig {
            fetch_ttl: self.fetch_ttl.unwrap_or(defaults.fetch_ttl),
            flush_on_init: self.flush_on_init.unwrap_or(defaults.flush_on_init),
            count_calls: self.count_calls.unwrap_or(defaults.count_calls),
            record_history: self.record_history.unwrap_or(defaults.record_history),
            access_count_prefix: self
                .access_count_prefix
                .unwrap_or(defaults.access_count_prefix),
            cleanup_interval: self.cleanup_interval.unwrap_or(defaults.cleanup_interval),
        }
    }
}

/// Preset configurations
impl CacheConfig {
    /// Start every run from an empty backend, like a scratch database
    pub fn ephemeral() -> Self {
        Self {
            flush_on_init: true,
            ..Default::default()
        }
    }
}
