//! Core type definitions for the cache system

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque key assigned to a stored value
pub type CacheKey = String;

/// Locator (e.g. a URL) keying the fetch cache
pub type Locator = String;

/// A value accepted by [`crate::cache::InstrumentedCache::store`]
///
/// Values are written in the backend's native scalar representation: text as
/// UTF-8, binary as-is, numbers as decimal text. Reading them back therefore
/// goes through one of the [`converters`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum StoredValue {
    Text(String),
    Binary(Vec<u8>),
    Integer(i64),
    Float(f64),
}

impl StoredValue {
    /// Encode for the backend
    pub fn to_backend_bytes(&self) -> Vec<u8> {
        match self {
            StoredValue::Text(s) => s.as_bytes().to_vec(),
            StoredValue::Binary(b) => b.clone(),
            StoredValue::Integer(i) => i.to_string().into_bytes(),
            StoredValue::Float(f) => f.to_string().into_bytes(),
        }
    }

    /// Short type name used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            StoredValue::Text(_) => "text",
            StoredValue::Binary(_) => "binary",
            StoredValue::Integer(_) => "integer",
            StoredValue::Float(_) => "float",
        }
    }
}

impl From<&str> for StoredValue {
    fn from(s: &str) -> Self {
        StoredValue::Text(s.to_string())
    }
}

impl From<String> for StoredValue {
    fn from(s: String) -> Self {
        StoredValue::Text(s)
    }
}

impl From<Vec<u8>> for StoredValue {
    fn from(b: Vec<u8>) -> Self {
        StoredValue::Binary(b)
    }
}

impl From<&[u8]> for StoredValue {
    fn from(b: &[u8]) -> Self {
        StoredValue::Binary(b.to_vec())
    }
}

impl From<i64> for StoredValue {
    fn from(i: i64) -> Self {
        StoredValue::Integer(i)
    }
}

impl From<i32> for StoredValue {
    fn from(i: i32) -> Self {
        StoredValue::Integer(i64::from(i))
    }
}

impl From<u32> for StoredValue {
    fn from(i: u32) -> Self {
        StoredValue::Integer(i64::from(i))
    }
}

impl From<f64> for StoredValue {
    fn from(f: f64) -> Self {
        StoredValue::Float(f)
    }
}

impl From<f32> for StoredValue {
    fn from(f: f32) -> Self {
        StoredValue::Float(f64::from(f))
    }
}

/// Conversions from the raw stored representation
///
/// Each converter fails with a message describing why the bytes do not hold
/// the requested type; [`crate::cache::InstrumentedCache::get_with`] turns that
/// into a conversion failure.
pub mod converters {
    /// Raw bytes, unchanged
    pub fn bytes(raw: Vec<u8>) -> Result<Vec<u8>, String> {
        Ok(raw)
    }

    /// UTF-8 text
    pub fn text(raw: Vec<u8>) -> Result<String, String> {
        String::from_utf8(raw).map_err(|e| format!("stored value is not valid UTF-8: {}", e))
    }

    /// Decimal integer
    pub fn integer(raw: Vec<u8>) -> Result<i64, String> {
        let s = text(raw)?;
        s.trim()
            .parse::<i64>()
            .map_err(|e| format!("stored value '{}' is not an integer: {}", s, e))
    }

    /// Decimal floating-point number
    pub fn float(raw: Vec<u8>) -> Result<f64, String> {
        let s = text(raw)?;
        s.trim()
            .parse::<f64>()
            .map_err(|e| format!("stored value '{}' is not a float: {}", s, e))
    }
}

/// Statistics for the expiring fetch cache
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FetchStats {
    /// Total fetch calls made against the cache
    pub accesses: u64,

    /// Calls answered from a fresh entry
    pub hits: u64,

    /// Calls that found no fresh entry
    pub misses: u64,

    /// Underlying fetches that succeeded
    pub fetches: u64,

    /// Underlying fetches that failed
    pub fetch_failures: u64,

    /// Entries currently held (fresh or stale)
    pub entries: usize,

    /// Entries removed because they expired
    pub evictions_ttl: u64,

    /// Entries removed by explicit invalidation
    pub invalidations: u64,
}

impl FetchStats {
    /// Calculate cache hit rate as a percentage
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }

    /// Calculate miss rate as a percentage
    pub fn miss_rate(&self) -> f64 {
        100.0 - self.hit_rate()
    }

    /// Total calls to the underlying fetcher, successful or not
    pub fn fetch_attempts(&self) -> u64 {
        self.fetches + self.fetch_failures
    }
}

impl fmt::Display for FetchStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "FetchStats {{ accesses: {}, hits: {}, misses: {}, hit_rate: {:.2}%, fetches: {}, failures: {}, entries: {} }}",
            self.accesses,
            self.hits,
            self.misses,
            self.hit_rate(),
            self.fetches,
            self.fetch_failures,
            self.entries
        )
    }
}
