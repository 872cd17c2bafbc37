//! HTTP implementation of [`ContentFetcher`] backed by reqwest

use super::{ContentFetcher, FetchError};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// Fetches locators with an HTTP GET
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Default request timeout
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Create a fetcher with the default timeout
    pub fn new() -> Result<Self, FetchError> {
        Self::with_timeout(Self::DEFAULT_TIMEOUT)
    }

    /// Create a fetcher with a custom request timeout
    pub fn with_timeout(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Network {
                locator: String::new(),
                reason: format!("failed to build HTTP client: {}", e),
            })?;

        Ok(Self { client })
    }

    /// Wrap an existing reqwest client
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ContentFetcher for HttpFetcher {
    async fn fetch(&self, locator: &str) -> Result<String, FetchError> {
        debug!("GET {}", locator);

        let response = self
            .client
            .get(locator)
            .send()
            .await
            .map_err(|e| FetchError::Network {
                locator: locator.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                locator: locator.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|e| FetchError::Body {
            locator: locator.to_string(),
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_fetcher_builds() {
        assert!(HttpFetcher::with_timeout(Duration::from_secs(1)).is_ok());
    }

    #[tokio::test]
    async fn test_invalid_url_is_network_error() {
        let fetcher = HttpFetcher::new().unwrap();
        let err = fetcher.fetch("not a url").await.unwrap_err();
        assert!(matches!(err, FetchError::Network { .. }));
        assert_eq!(err.locator(), "not a url");
    }
}
