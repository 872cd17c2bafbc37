//! School record queries

use crate::docstore::{Document, DocumentStore};
use crate::error::Result;
use serde_json::{json, Value};
use tracing::debug;

/// All documents in the collection, empty when there are none
pub async fn list_all<S>(store: &S) -> Result<Vec<Document>>
where
    S: DocumentStore + ?Sized,
{
    store.find(json!({})).await
}

/// Insert a school built from `fields` and return its generated id
pub async fn insert_school<S>(store: &S, fields: Document) -> Result<Value>
where
    S: DocumentStore + ?Sized,
{
    let id = store.insert_one(fields).await?;
    debug!("Inserted school {}", id);
    Ok(id)
}

/// Replace the topics of every school named `name`
pub async fn update_topics<S>(store: &S, name: &str, topics: &[String]) -> Result<u64>
where
    S: DocumentStore + ?Sized,
{
    let modified = store
        .update_many(json!({ "name": name }), json!({ "$set": { "topics": topics } }))
        .await?;
    debug!("Updated topics of {} school(s) named {}", modified, name);
    Ok(modified)
}

/// Schools whose topics contain `topic`
pub async fn schools_by_topic<S>(store: &S, topic: &str) -> Result<Vec<Document>>
where
    S: DocumentStore + ?Sized,
{
    store.find(json!({ "topics": topic })).await
}

/// Students sorted by average topic score, best first
///
/// Each returned document carries `_id`, `name` and `averageScore`.
pub async fn top_students<S>(store: &S) -> Result<Vec<Document>>
where
    S: DocumentStore + ?Sized,
{
    store
        .aggregate(vec![
            json!({ "$project": {
                "name": "$name",
                "averageScore": { "$avg": "$topics.score" }
            }}),
            json!({ "$sort": { "averageScore": -1 } }),
        ])
        .await
}
