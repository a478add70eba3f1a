//! In-memory record store.
//!
//! Satisfies the same contract as the Redis backend; used by tests and local
//! development. Keys are `collection:id`.

use async_trait::async_trait;
use dashmap::DashMap;
use metrics::counter;

use super::RecordStore;
use crate::error::{Result, ScribeError};
use crate::model::{Collection, Entity};

/// In-process store backed by a concurrent hash map.
#[derive(Default)]
pub struct MemoryStore {
    records: DashMap<String, Entity>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records, across all collections.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn key(collection: &Collection, id: &str) -> String {
        format!("{}:{}", collection, id)
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn put(&self, collection: &Collection, entity: &Entity) -> Result<()> {
        self.records
            .insert(Self::key(collection, &entity.id), entity.clone());
        counter!("scribe_store_puts_total", "backend" => "memory").increment(1);
        Ok(())
    }

    async fn get(&self, collection: &Collection, id: &str) -> Result<Entity> {
        self.records
            .get(&Self::key(collection, id))
            .map(|e| e.clone())
            .ok_or_else(|| ScribeError::not_found(collection, id))
    }

    async fn delete(&self, collection: &Collection, id: &str) -> Result<()> {
        self.records.remove(&Self::key(collection, id));
        counter!("scribe_store_deletes_total", "backend" => "memory").increment(1);
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
