//! Record store: durable key-value persistence for entities.
//!
//! This module provides pluggable store backends behind the `RecordStore`
//! capability trait:
//! - **MemoryStore**: in-process store for tests and local development
//! - **RedisStore**: durable store backed by Redis
//!
//! The contract is deliberately narrow (scoped per collection, keyed by id):
//! `put` is an unconditional upsert with no optimistic-concurrency check,
//! `delete` is idempotent, and all connectivity/serialization failures
//! surface as `StoreUnavailable`.

mod memory;
mod redis;

pub use memory::MemoryStore;
pub use redis::{RedisStore, RedisStoreConfig};

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{Collection, Entity};

/// Capability trait for durable entity persistence.
///
/// Implementations must be safe for concurrent use by simultaneous requests;
/// connection pooling and locking are the backend's responsibility. The
/// orchestrator performs no locking of its own, so two concurrent writes to
/// the same id race here and the last commit to land wins.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Write the entity, silently replacing any record with the same id.
    async fn put(&self, collection: &Collection, entity: &Entity) -> Result<()>;

    /// Read the current record, failing with `RecordNotFound` if absent.
    async fn get(&self, collection: &Collection, id: &str) -> Result<Entity>;

    /// Remove the record if present; succeeds as a no-op if already absent.
    async fn delete(&self, collection: &Collection, id: &str) -> Result<()>;

    /// Connectivity probe for health checks.
    async fn ping(&self) -> Result<()>;

    /// Get the backend name.
    fn name(&self) -> &'static str;
}
