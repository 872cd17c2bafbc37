//! Redis implementation of [`KeyValueBackend`]
//!
//! Requires the `redis` feature. The multiplexed connection is cheap to clone,
//! so each call clones it instead of locking a shared connection.

use super::KeyValueBackend;
use crate::error::{CacheError, Result};
use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client, ErrorKind, RedisError};
use std::time::Duration;
use tracing::{debug, info};

/// Redis connection configuration
#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// Redis connection URL (e.g., "redis://127.0.0.1:6379")
    pub url: String,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
        }
    }
}

impl RedisConfig {
    /// Create a configuration for the given URL
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    /// Create from environment variables (`REDIS_URL`), honouring a `.env` file
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        match std::env::var("REDIS_URL") {
            Ok(url) if !url.trim().is_empty() => Self::new(url),
            _ => Self::default(),
        }
    }
}

/// Redis-backed key-value store
pub struct RedisBackend {
    conn: MultiplexedConnection,
    config: RedisConfig,
}

impl RedisBackend {
    /// Connect to Redis
    pub async fn connect(config: RedisConfig) -> Result<Self> {
        info!("Connecting to Redis at {}", config.url);

        let client = Client::open(config.url.as_str())
            .map_err(|e| CacheError::ConfigError(format!("Invalid Redis URL: {}", e)))?;

        let conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| CacheError::BackendUnavailable(e.to_string()))?;

        info!("Successfully connected to Redis");
        Ok(Self { conn, config })
    }

    /// Connect using [`RedisConfig::from_env`]
    pub async fn from_env() -> Result<Self> {
        Self::connect(RedisConfig::from_env()).await
    }

    /// Configuration this backend was created with
    pub fn config(&self) -> &RedisConfig {
        &self.config
    }
}

/// Split redis errors into "could not talk to redis" and "redis said no"
fn map_err(command: &'static str, key: &str, e: RedisError) -> CacheError {
    match e.kind() {
        ErrorKind::TypeError | ErrorKind::ResponseError | ErrorKind::ExtensionError => {
            CacheError::BackendCommand {
                command,
                key: key.to_string(),
                reason: e.to_string(),
            }
        }
        _ => CacheError::BackendUnavailable(e.to_string()),
    }
}

#[async_trait]
impl KeyValueBackend for RedisBackend {
    async fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: () = conn
            .set(key, value)
            .await
            .map_err(|e| map_err("SET", key, e))?;
        Ok(())
    }

    async fn set_with_ttl(&self, key: &str, value: &[u8], ttl: Duration) -> Result<()> {
        let seconds = ttl.as_secs().max(1);
        let mut conn = self.conn.clone();
        let _: () = conn
            .set_ex(key, value, seconds)
            .await
            .map_err(|e| map_err("SETEX", key, e))?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut conn = self.conn.clone();
        conn.get(key).await.map_err(|e| map_err("GET", key, e))
    }

    async fn increment(&self, key: &str) -> Result<i64> {
        let mut conn = self.conn.clone();
        conn.incr(key, 1i64)
            .await
            .map_err(|e| map_err("INCR", key, e))
    }

    async fn append_to_list(&self, list: &str, entry: &[u8]) -> Result<u64> {
        let mut conn = self.conn.clone();
        conn.rpush(list, entry)
            .await
            .map_err(|e| map_err("RPUSH", list, e))
    }

    async fn read_list(&self, list: &str) -> Result<Vec<Vec<u8>>> {
        let mut conn = self.conn.clone();
        conn.lrange(list, 0, -1)
            .await
            .map_err(|e| map_err("LRANGE", list, e))
    }

    async fn flush(&self) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: () = redis::cmd("FLUSHDB")
            .query_async(&mut conn)
            .await
            .map_err(|e| map_err("FLUSHDB", "*", e))?;
        debug!("Flushed Redis database");
        Ok(())
    }
}
