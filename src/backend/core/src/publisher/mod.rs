//! Event publisher: append-only delivery of change events to downstream
//! consumers.
//!
//! This module provides pluggable publisher backends behind the
//! `EventPublisher` capability trait:
//! - **MemoryPublisher**: records events in memory; used by tests, can be
//!   armed to fail for exercising the notify-phase failure path
//! - **RedisStreamPublisher**: appends events onto per-collection Redis
//!   streams
//!
//! The contract is a single best-effort send per event: no buffering,
//! batching, retry, or acknowledgment tracking. Delivery is serialized per
//! `subject_id` (the partition key); there is no cross-key ordering.

mod memory;
mod redis;

pub use memory::MemoryPublisher;
pub use redis::{RedisStreamPublisher, RedisStreamPublisherConfig};

use async_trait::async_trait;

use crate::error::Result;
use crate::model::ChangeEvent;

/// Capability trait for at-least-once change-event delivery.
///
/// A failed publish reports `PublishFailed` to the caller; it must never
/// panic or otherwise take the process down. The write orchestrator absorbs
/// the failure, so it is never visible to the original request.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Attempt a single best-effort send of the event.
    async fn publish(&self, event: &ChangeEvent) -> Result<()>;

    /// Connectivity probe for health checks.
    async fn ping(&self) -> Result<()>;

    /// Get the backend name.
    fn name(&self) -> &'static str;
}
