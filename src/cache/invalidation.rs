//! Invalidation events for the fetch cache
//!
//! Entries leave the fetch cache in two ways:
//! - TTL-based: a purge drops entries whose TTL elapsed
//! - Manual: a caller invalidates a locator explicitly

use crate::cache::types::Locator;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Reason for cache invalidation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InvalidationReason {
    /// Entry expired based on TTL
    Expired,

    /// Manual invalidation by locator
    Manual,
}

impl std::fmt::Display for InvalidationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvalidationReason::Expired => write!(f, "TTL expired"),
            InvalidationReason::Manual => write!(f, "manual invalidation"),
        }
    }
}

/// Event for cache invalidation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvalidationEvent {
    /// Reason for invalidation
    pub reason: InvalidationReason,

    /// When the invalidation occurred
    pub timestamp: DateTime<Utc>,

    /// Locators whose content was dropped
    pub locators: Vec<Locator>,

    /// Additional context
    pub context: Option<String>,
}

impl InvalidationEvent {
    /// Create a new invalidation event
    pub fn new(reason: InvalidationReason, locators: Vec<Locator>) -> Self {
        Self {
            reason,
            timestamp: Utc::now(),
            locators,
            context: None,
        }
    }

    /// Add context to the event
    pub fn with_context(mut self, context: String) -> Self {
        self.context = Some(context);
        self
    }

    /// Number of locators affected
    pub fn len(&self) -> usize {
        self.locators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locators.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalidation_reason_display() {
        assert_eq!(InvalidationReason::Expired.to_string(), "TTL expired");
        assert_eq!(InvalidationReason::Manual.to_string(), "manual invalidation");
    }

    #[test]
    fn test_invalidation_event() {
        let event = InvalidationEvent::new(
            InvalidationReason::Manual,
            vec!["https://a.test".to_string(), "https://b.test".to_string()],
        )
        .with_context("operator request".to_string());

        assert_eq!(event.len(), 2);
        assert!(!event.is_empty());
        assert_eq!(event.context, Some("operator request".to_string()));
        assert!(matches!(event.reason, InvalidationReason::Manual));
    }

    #[test]
    fn test_event_serializes() {
        let event = InvalidationEvent::new(InvalidationReason::Expired, vec!["loc".to_string()]);
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["reason"], "Expired");
        assert_eq!(json["locators"][0], "loc");
        assert!(json["context"].is_null());
    }
}
