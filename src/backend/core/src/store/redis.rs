//! Redis record store.
//!
//! Entities are stored as JSON strings under `{prefix}{collection}:{id}`.
//! Redis owns connection pooling (multiplexed async connection); all
//! transport failures map to `StoreUnavailable`.

use async_trait::async_trait;
use metrics::counter;
use redis::AsyncCommands;
use tracing::info;

use super::RecordStore;
use crate::error::{Result, ScribeError};
use crate::model::{Collection, Entity};

/// Configuration for the Redis record store.
#[derive(Debug, Clone)]
pub struct RedisStoreConfig {
    /// Redis connection URL
    pub url: String,

    /// Key prefix
    pub key_prefix: String,
}

impl Default for RedisStoreConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            key_prefix: "scribe:".to_string(),
        }
    }
}

/// Durable record store backed by Redis.
pub struct RedisStore {
    client: redis::Client,
    config: RedisStoreConfig,
}

impl RedisStore {
    /// Create a new Redis store and verify connectivity.
    pub async fn new(config: RedisStoreConfig) -> Result<Self> {
        let client = redis::Client::open(config.url.as_str())
            .map_err(|e| ScribeError::store_unavailable(e.to_string()).with_source(e))?;

        // Fail fast on a bad URL or unreachable server
        let mut conn = client.get_multiplexed_async_connection().await?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;

        info!("Redis record store connected to {}", config.url);

        Ok(Self { client, config })
    }

    async fn get_conn(&self) -> Result<redis::aio::MultiplexedConnection> {
        Ok(self.client.get_multiplexed_async_connection().await?)
    }

    /// Build the full key with prefix.
    fn full_key(&self, collection: &Collection, id: &str) -> String {
        format!("{}{}:{}", self.config.key_prefix, collection, id)
    }
}

#[async_trait]
impl RecordStore for RedisStore {
    async fn put(&self, collection: &Collection, entity: &Entity) -> Result<()> {
        let mut conn = self.get_conn().await?;
        let key = self.full_key(collection, &entity.id);

        let data = serde_json::to_string(entity)?;

        // Plain SET: upsert semantics, last writer wins
        conn.set::<_, _, ()>(&key, data).await?;

        counter!("scribe_store_puts_total", "backend" => "redis").increment(1);
        Ok(())
    }

    async fn get(&self, collection: &Collection, id: &str) -> Result<Entity> {
        let mut conn = self.get_conn().await?;
        let key = self.full_key(collection, id);

        let data: Option<String> = conn.get(&key).await?;

        match data {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Err(ScribeError::not_found(collection, id)),
        }
    }

    async fn delete(&self, collection: &Collection, id: &str) -> Result<()> {
        let mut conn = self.get_conn().await?;
        let key = self.full_key(collection, id);

        // DEL returns the number of removed keys; zero is still success
        let _removed: i64 = conn.del(&key).await?;

        counter!("scribe_store_deletes_total", "backend" => "redis").increment(1);
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        let mut conn = self.get_conn().await?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}
