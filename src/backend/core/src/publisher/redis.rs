//! Redis stream event publisher.
//!
//! Events are appended with `XADD` onto one stream per collection
//! (`{prefix}events:{collection}`). Stream append order gives per-subject
//! ordering, since all publishes for a given subject flow sequentially
//! through the write orchestrator.
//!
//! All transport failures map to `PublishFailed`: the publisher reports the
//! failure to its caller and nothing more. Retry and acknowledgment tracking
//! are a future hardening concern, deliberately not part of this contract.

use async_trait::async_trait;
use metrics::counter;
use tracing::info;

use super::EventPublisher;
use crate::error::{Result, ScribeError};
use crate::model::ChangeEvent;

/// Configuration for the Redis stream publisher.
#[derive(Debug, Clone)]
pub struct RedisStreamPublisherConfig {
    /// Redis connection URL
    pub url: String,

    /// Stream key prefix
    pub stream_prefix: String,
}

impl Default for RedisStreamPublisherConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            stream_prefix: "scribe:".to_string(),
        }
    }
}

/// Change-event publisher backed by Redis streams.
pub struct RedisStreamPublisher {
    client: redis::Client,
    config: RedisStreamPublisherConfig,
}

impl RedisStreamPublisher {
    /// Create a new stream publisher and verify connectivity.
    pub async fn new(config: RedisStreamPublisherConfig) -> Result<Self> {
        let client = redis::Client::open(config.url.as_str())
            .map_err(|e| ScribeError::publish_failed(e.to_string()).with_source(e))?;

        let mut conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| ScribeError::publish_failed(e.to_string()).with_source(e))?;
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| ScribeError::publish_failed(e.to_string()).with_source(e))?;

        info!("Redis stream publisher connected to {}", config.url);

        Ok(Self { client, config })
    }

    /// Build the stream key for a collection.
    fn stream_key(&self, event: &ChangeEvent) -> String {
        format!("{}events:{}", self.config.stream_prefix, event.collection)
    }
}

#[async_trait]
impl EventPublisher for RedisStreamPublisher {
    async fn publish(&self, event: &ChangeEvent) -> Result<()> {
        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| ScribeError::publish_failed(e.to_string()).with_source(e))?;

        let stream = self.stream_key(event);
        let payload = serde_json::to_string(&event.payload)
            .map_err(|e| ScribeError::publish_failed(e.to_string()).with_source(e))?;

        let _id: String = redis::cmd("XADD")
            .arg(&stream)
            .arg("*")
            .arg("event_id")
            .arg(event.event_id.to_string())
            .arg("event_type")
            .arg(event.event_type.as_str())
            .arg("subject_id")
            .arg(&event.subject_id)
            .arg("payload")
            .arg(payload)
            .arg("occurred_at")
            .arg(event.occurred_at.to_rfc3339())
            .query_async(&mut conn)
            .await
            .map_err(|e| ScribeError::publish_failed(e.to_string()).with_source(e))?;

        counter!(
            "scribe_events_published_total",
            "backend" => "redis",
            "event_type" => event.event_type.as_str()
        )
        .increment(1);

        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| ScribeError::publish_failed(e.to_string()).with_source(e))?;
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| ScribeError::publish_failed(e.to_string()).with_source(e))?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}
