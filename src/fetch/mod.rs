//! Content fetching collaborators for the expiring fetch cache
//!
//! [`ContentFetcher`] is the seam between [`crate::cache::ExpiringFetchCache`]
//! and whatever actually retrieves a locator's body. [`HttpFetcher`] is the
//! production implementation; tests plug in counting fakes.

pub mod http;

use async_trait::async_trait;
use thiserror::Error;

pub use http::HttpFetcher;

/// Failure of an underlying content fetch
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Transport-level failure (DNS, connect, timeout)
    #[error("Request to {locator} failed: {reason}")]
    Network { locator: String, reason: String },

    /// Server answered with a non-success status
    #[error("{locator} returned HTTP {status}")]
    Status { locator: String, status: u16 },

    /// Response body could not be read or decoded
    #[error("Failed to read body from {locator}: {reason}")]
    Body { locator: String, reason: String },
}

impl FetchError {
    /// Locator the failed fetch was issued for
    pub fn locator(&self) -> &str {
        match self {
            FetchError::Network { locator, .. }
            | FetchError::Status { locator, .. }
            | FetchError::Body { locator, .. } => locator,
        }
    }
}

/// Retrieves the content behind a locator (e.g. an HTTP GET on a URL)
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    /// Fetch the full body for `locator`
    async fn fetch(&self, locator: &str) -> Result<String, FetchError>;
}
