//! Document-store collaborators
//!
//! Query helpers over a document collection (school records, nginx access
//! logs). They only compose filters, updates and aggregation pipelines and
//! hand them to a [`DocumentStore`] unmodified; query semantics belong to
//! the store.

pub mod log_stats;
pub mod schools;

use crate::error::Result;
use async_trait::async_trait;
use serde_json::{Map, Value};

pub use log_stats::{IpCount, LogStats, HTTP_METHODS};
pub use schools::{insert_school, list_all, schools_by_topic, top_students, update_topics};

/// A single stored document
pub type Document = Map<String, Value>;

/// Handle on one document collection
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Documents matching `filter` (`{}` matches everything)
    async fn find(&self, filter: Value) -> Result<Vec<Document>>;

    /// Insert `document`, returning its generated id
    async fn insert_one(&self, document: Document) -> Result<Value>;

    /// Apply `update` to every document matching `filter`, returning the number modified
    async fn update_many(&self, filter: Value, update: Value) -> Result<u64>;

    /// Run an aggregation pipeline
    async fn aggregate(&self, pipeline: Vec<Value>) -> Result<Vec<Document>>;

    /// Number of documents matching `filter`
    async fn count_documents(&self, filter: Value) -> Result<u64>;
}
