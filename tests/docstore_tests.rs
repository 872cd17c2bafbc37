//! Document-store helper tests against a recording fake
//!
//! The helpers only compose queries, so the assertions check what reaches
//! the store and that answers are passed back untouched.

use async_trait::async_trait;
use ouroboros_cache::docstore::{
    insert_school, list_all, schools_by_topic, top_students, update_topics, Document,
    DocumentStore, IpCount, LogStats,
};
use ouroboros_cache::{CacheError, Result};
use serde_json::{json, Value};
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Find(Value),
    InsertOne(Document),
    UpdateMany(Value, Value),
    Aggregate(Vec<Value>),
    CountDocuments(Value),
}

/// Records every call and answers from canned data
#[derive(Default)]
struct RecordingStore {
    calls: Mutex<Vec<Call>>,
    documents: Vec<Document>,
    aggregate_rows: Vec<Document>,
    counts: Vec<(Value, u64)>,
}

impl RecordingStore {
    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl DocumentStore for RecordingStore {
    async fn find(&self, filter: Value) -> Result<Vec<Document>> {
        self.record(Call::Find(filter));
        Ok(self.documents.clone())
    }

    async fn insert_one(&self, document: Document) -> Result<Value> {
        self.record(Call::InsertOne(document));
        Ok(json!("5f2b7c1e9d3a4b0012345678"))
    }

    async fn update_many(&self, filter: Value, update: Value) -> Result<u64> {
        self.record(Call::UpdateMany(filter, update));
        Ok(1)
    }

    async fn aggregate(&self, pipeline: Vec<Value>) -> Result<Vec<Document>> {
        self.record(Call::Aggregate(pipeline));
        Ok(self.aggregate_rows.clone())
    }

    async fn count_documents(&self, filter: Value) -> Result<u64> {
        let count = self
            .counts
            .iter()
            .find(|(f, _)| *f == filter)
            .map(|(_, c)| *c)
            .unwrap_or(0);
        self.record(Call::CountDocuments(filter));
        Ok(count)
    }
}

fn doc(value: Value) -> Document {
    match value {
        Value::Object(map) => map,
        other => panic!("not an object: {}", other),
    }
}

#[tokio::test]
async fn test_list_all_uses_empty_filter() {
    let store = RecordingStore {
        documents: vec![doc(json!({ "name": "Holberton school" }))],
        ..Default::default()
    };

    let docs = list_all(&store).await.unwrap();
    assert_eq!(docs.len(), 1);
    assert_eq!(store.calls(), vec![Call::Find(json!({}))]);
}

#[tokio::test]
async fn test_list_all_empty_collection() {
    let store = RecordingStore::default();
    assert!(list_all(&store).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_insert_school_returns_generated_id() {
    let store = RecordingStore::default();
    let fields = doc(json!({ "name": "UCSF", "address": "505 Parnassus Ave" }));

    let id = insert_school(&store, fields.clone()).await.unwrap();
    assert_eq!(id, json!("5f2b7c1e9d3a4b0012345678"));
    assert_eq!(store.calls(), vec![Call::InsertOne(fields)]);
}

#[tokio::test]
async fn test_update_topics_sets_topics_by_name() {
    let store = RecordingStore::default();
    let topics = vec!["Sys admin".to_string(), "AI".to_string()];

    update_topics(&store, "Holberton school", &topics).await.unwrap();
    assert_eq!(
        store.calls(),
        vec![Call::UpdateMany(
            json!({ "name": "Holberton school" }),
            json!({ "$set": { "topics": ["Sys admin", "AI"] } }),
        )]
    );
}

#[tokio::test]
async fn test_schools_by_topic_filters_on_topics() {
    let store = RecordingStore::default();

    schools_by_topic(&store, "Python").await.unwrap();
    assert_eq!(store.calls(), vec![Call::Find(json!({ "topics": "Python" }))]);
}

#[tokio::test]
async fn test_top_students_pipeline() {
    let store = RecordingStore {
        aggregate_rows: vec![doc(json!({ "_id": 1, "name": "Bob", "averageScore": 90.5 }))],
        ..Default::default()
    };

    let students = top_students(&store).await.unwrap();
    assert_eq!(students[0]["averageScore"], json!(90.5));
    assert_eq!(
        store.calls(),
        vec![Call::Aggregate(vec![
            json!({ "$project": { "name": "$name", "averageScore": { "$avg": "$topics.score" } } }),
            json!({ "$sort": { "averageScore": -1 } }),
        ])]
    );
}

#[tokio::test]
async fn test_top_students_through_trait_object() {
    let store: Box<dyn DocumentStore> = Box::new(RecordingStore::default());
    assert!(top_students(store.as_ref()).await.unwrap().is_empty());
}

fn nginx_store() -> RecordingStore {
    RecordingStore {
        counts: vec![
            (json!({}), 94778),
            (json!({ "method": "GET" }), 93842),
            (json!({ "method": "POST" }), 229),
            (json!({ "method": "GET", "path": "/status" }), 47415),
        ],
        aggregate_rows: vec![
            doc(json!({ "_id": "172.31.63.67", "count": 15805 })),
            doc(json!({ "_id": "172.31.2.14", "count": 15805 })),
            doc(json!({ "_id": null, "count": 3 })),
        ],
        ..Default::default()
    }
}

#[tokio::test]
async fn test_log_stats_report() {
    let store = nginx_store();
    let stats = LogStats::collect(&store, None).await.unwrap();

    assert_eq!(
        stats.to_string(),
        "94778 logs\n\
         Methods:\n\
         \tmethod GET: 93842\n\
         \tmethod POST: 229\n\
         \tmethod PUT: 0\n\
         \tmethod PATCH: 0\n\
         \tmethod DELETE: 0\n\
         47415 status check"
    );
    assert!(!store
        .calls()
        .iter()
        .any(|c| matches!(c, Call::Aggregate(_))));
}

#[tokio::test]
async fn test_log_stats_top_ips() {
    let store = nginx_store();
    let stats = LogStats::collect(&store, Some(2)).await.unwrap();

    assert_eq!(
        stats.top_ips,
        Some(vec![
            IpCount {
                ip: "172.31.63.67".to_string(),
                count: 15805
            },
            IpCount {
                ip: "172.31.2.14".to_string(),
                count: 15805
            },
        ])
    );
    assert!(stats
        .to_string()
        .ends_with("IPs:\n\t172.31.63.67: 15805\n\t172.31.2.14: 15805"));

    let pipeline = store
        .calls()
        .into_iter()
        .find_map(|c| match c {
            Call::Aggregate(p) => Some(p),
            _ => None,
        })
        .unwrap();
    assert_eq!(
        pipeline,
        vec![
            json!({ "$group": { "_id": "$ip", "count": { "$sum": 1 } } }),
            json!({ "$sort": { "count": -1 } }),
            json!({ "$limit": 2 }),
        ]
    );
}

#[tokio::test]
async fn test_log_stats_rejects_malformed_group() {
    let store = RecordingStore {
        aggregate_rows: vec![doc(json!({ "_id": "10.0.0.1" }))],
        ..Default::default()
    };

    let err = LogStats::collect(&store, Some(10)).await.unwrap_err();
    assert!(matches!(err, CacheError::QueryError(_)));
}

#[test]
fn test_helpers_run_outside_a_runtime() {
    let store = RecordingStore::default();

    tokio_test::assert_ok!(tokio_test::block_on(update_topics(&store, "UCSF", &[])));
    tokio_test::assert_err!(tokio_test::block_on(LogStats::collect(
        &RecordingStore {
            aggregate_rows: vec![doc(json!({ "count": "many" }))],
            ..Default::default()
        },
        Some(1),
    )));
}
