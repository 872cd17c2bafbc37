//! Integration tests against a live redis server
//!
//! These tests flush the selected database. Point `REDIS_URL` at a scratch
//! instance (default `redis://127.0.0.1:6379`) and run with `--ignored`.

#![cfg(feature = "redis")]

use ouroboros_cache::{
    CacheConfig, InstrumentedCache, KeyValueBackend, RedisBackend, RedisConfig,
};
use std::sync::Arc;
use std::time::Duration;

async fn connect() -> RedisBackend {
    RedisBackend::connect(RedisConfig::from_env())
        .await
        .expect("Failed to connect to redis")
}

#[tokio::test]
#[ignore] // Run with: cargo test --ignored
async fn test_redis_primitives() {
    let backend = connect().await;
    backend.flush().await.unwrap();

    backend.set("greeting", b"hello").await.unwrap();
    assert_eq!(backend.get("greeting").await.unwrap(), Some(b"hello".to_vec()));
    assert_eq!(backend.get("missing").await.unwrap(), None);

    assert_eq!(backend.increment("hits").await.unwrap(), 1);
    assert_eq!(backend.increment("hits").await.unwrap(), 2);

    assert_eq!(backend.append_to_list("log", b"a").await.unwrap(), 1);
    assert_eq!(backend.append_to_list("log", b"b").await.unwrap(), 2);
    assert_eq!(
        backend.read_list("log").await.unwrap(),
        vec![b"a".to_vec(), b"b".to_vec()]
    );
    assert!(backend.read_list("no-such-list").await.unwrap().is_empty());
}

#[tokio::test]
#[ignore]
async fn test_redis_wrong_type_is_command_error() {
    let backend = connect().await;
    backend.flush().await.unwrap();

    backend.set("scalar", b"not a number").await.unwrap();
    let err = backend.increment("scalar").await.unwrap_err();
    assert!(err.is_backend());
}

#[tokio::test]
#[ignore]
async fn test_redis_ttl_expiry() {
    let backend = connect().await;
    backend.flush().await.unwrap();

    backend
        .set_with_ttl("short", b"lived", Duration::from_secs(1))
        .await
        .unwrap();
    assert!(backend.get("short").await.unwrap().is_some());

    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert_eq!(backend.get("short").await.unwrap(), None);
}

#[tokio::test]
#[ignore]
async fn test_instrumented_cache_on_redis() {
    let backend = Arc::new(connect().await);
    let cache = InstrumentedCache::new(backend, CacheConfig::ephemeral())
        .await
        .unwrap();

    let k1 = cache.store("a").await.unwrap();
    let k2 = cache.store(1i64).await.unwrap();
    let k3 = cache.store(2.5f64).await.unwrap();

    assert_eq!(cache.get_int(&k2).await.unwrap(), Some(1));
    assert_eq!(cache.get_float(&k3).await.unwrap(), Some(2.5));

    let replay = cache.replay().await.unwrap();
    assert_eq!(replay.call_count, 3);
    assert_eq!(replay.lines()[0], format!("store(\"a\") -> {:?}", k1));
}
