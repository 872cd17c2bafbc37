//! Error types for cache operations
//!
//! Absent keys are not errors: lookups return `Ok(None)`. Everything that
//! reaches this enum is meant to be propagated to the immediate caller.

use crate::fetch::FetchError;
use thiserror::Error;

/// Main error type for cache and backend operations
#[derive(Error, Debug)]
pub enum CacheError {
    /// Backend could not be reached or dropped the connection
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    /// Backend was reachable but rejected the command
    #[error("Backend rejected {command} on '{key}': {reason}")]
    BackendCommand {
        command: &'static str,
        key: String,
        reason: String,
    },

    /// A caller-supplied converter failed on the stored representation
    #[error("Conversion failed: {0}")]
    ConversionFailure(String),

    /// Underlying content fetch failed
    #[error("Fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// Document store query failed or returned an unexpected shape
    #[error("Query error: {0}")]
    QueryError(String),

    /// History encoding or decoding error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Generic error with context
    #[error("Error: {0}")]
    Other(String),
}

/// Result type alias for cache operations
pub type Result<T> = std::result::Result<T, CacheError>;

impl CacheError {
    /// Whether the error came from the backend rather than from caller input
    pub fn is_backend(&self) -> bool {
        matches!(
            self,
            CacheError::BackendUnavailable(_) | CacheError::BackendCommand { .. }
        )
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(e: serde_json::Error) -> Self {
        CacheError::SerializationError(e.to_string())
    }
}

impl From<String> for CacheError {
    fn from(s: String) -> Self {
        CacheError::Other(s)
    }
}

impl From<&str> for CacheError {
    fn from(s: &str) -> Self {
        CacheError::Other(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = CacheError::BackendUnavailable("connection refused".to_string());
        assert_eq!(error.to_string(), "Backend unavailable: connection refused");

        let command_error = CacheError::BackendCommand {
            command: "INCR",
            key: "store".to_string(),
            reason: "value is not an integer".to_string(),
        };
        assert!(command_error.to_string().contains("INCR on 'store'"));

        let fetch_error: CacheError = FetchError::Status {
            locator: "https://example.test/x".to_string(),
            status: 503,
        }
        .into();
        assert!(fetch_error.to_string().contains("503"));
    }

    #[test]
    fn test_error_conversion() {
        let error: CacheError = "test error".into();
        assert!(matches!(error, CacheError::Other(_)));

        let error: CacheError = "test error".to_string().into();
        assert!(matches!(error, CacheError::Other(_)));

        let json_error = serde_json::from_str::<u32>("not json").unwrap_err();
        let error: CacheError = json_error.into();
        assert!(matches!(error, CacheError::SerializationError(_)));
    }

    #[test]
    fn test_is_backend() {
        assert!(CacheError::BackendUnavailable("down".into()).is_backend());
        assert!(!CacheError::ConversionFailure("bad".into()).is_backend());
    }
}
