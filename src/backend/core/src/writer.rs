//! Write orchestrator: the persist-then-publish core.
//!
//! `EntityWriter` sequences every mutation through two phases:
//!
//! 1. **Commit**: the record store operation, bounded by the commit timeout.
//!    This is the authoritative outcome of the request. On failure the error
//!    propagates to the caller unchanged and no event is published.
//! 2. **Notify**: only after a successful commit, a matching change event is
//!    published best-effort, bounded by the notify timeout. A notify failure
//!    is logged and counted but absorbed: the caller still sees success,
//!    there is no retry and no compensating rollback. Storage is the source
//!    of truth; events are best-effort.
//!
//! The writer is a stateless per-request coordinator. It holds no locks, so
//! concurrent writes to the same id race at the store and the last commit to
//! land wins.

use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use tracing::{debug, instrument, warn};

use crate::error::{Result, ScribeError};
use crate::model::{ChangeEvent, ChangeKind, Collection, Entity};
use crate::publisher::EventPublisher;
use crate::store::RecordStore;

/// Timeouts bounding the two phases of a write.
#[derive(Debug, Clone)]
pub struct WriterConfig {
    /// Upper bound on the commit phase; a timed-out commit is `StoreUnavailable`
    pub commit_timeout: Duration,

    /// Upper bound on the notify phase; a timed-out notify is `PublishFailed`
    pub notify_timeout: Duration,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            commit_timeout: Duration::from_secs(5),
            notify_timeout: Duration::from_secs(5),
        }
    }
}

/// Stateless coordinator for entity mutations.
///
/// Constructed once at startup with its store and publisher injected
/// explicitly; it keeps no per-request state and is cheap to clone.
#[derive(Clone)]
pub struct EntityWriter {
    store: Arc<dyn RecordStore>,
    publisher: Arc<dyn EventPublisher>,
    config: WriterConfig,
}

impl EntityWriter {
    pub fn new(
        store: Arc<dyn RecordStore>,
        publisher: Arc<dyn EventPublisher>,
        config: WriterConfig,
    ) -> Self {
        Self {
            store,
            publisher,
            config,
        }
    }

    /// Create an entity.
    ///
    /// A pre-existing record with the same id is silently replaced (upsert
    /// semantics). Emits a `create` event carrying the committed snapshot.
    #[instrument(skip(self, entity), fields(collection = %collection, id = %entity.id))]
    pub async fn create(&self, collection: &Collection, entity: Entity) -> Result<Entity> {
        self.write(ChangeKind::Created, collection, entity).await
    }

    /// Update an entity (full replace, not partial patch).
    ///
    /// An update of a nonexistent id succeeds and creates the record; the
    /// store's replace semantics make no existence check. Callers needing
    /// strict must-already-exist updates should `read` first.
    #[instrument(skip(self, entity), fields(collection = %collection, id = %entity.id))]
    pub async fn update(&self, collection: &Collection, entity: Entity) -> Result<Entity> {
        self.write(ChangeKind::Updated, collection, entity).await
    }

    /// Read the current record.
    #[instrument(skip(self), fields(collection = %collection, id = id))]
    pub async fn read(&self, collection: &Collection, id: &str) -> Result<Entity> {
        match tokio::time::timeout(
            self.config.commit_timeout,
            self.store.get(collection, id),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(ScribeError::store_unavailable(format!(
                "read of {}/{} timed out",
                collection, id
            ))),
        }
    }

    /// Delete an entity.
    ///
    /// Deletion is idempotent: a nonexistent id still succeeds and still
    /// emits a `delete` event with the tombstone, so downstream consumers
    /// must treat duplicate deletes as no-ops.
    #[instrument(skip(self), fields(collection = %collection, id = id))]
    pub async fn delete(&self, collection: &Collection, id: &str) -> Result<()> {
        let commit = tokio::time::timeout(
            self.config.commit_timeout,
            self.store.delete(collection, id),
        )
        .await;

        match commit {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                counter!("scribe_writes_total", "op" => "delete", "outcome" => "commit_failed")
                    .increment(1);
                return Err(e);
            }
            Err(_) => {
                counter!("scribe_writes_total", "op" => "delete", "outcome" => "commit_failed")
                    .increment(1);
                return Err(ScribeError::store_unavailable(format!(
                    "delete of {}/{} timed out",
                    collection, id
                )));
            }
        }

        counter!("scribe_writes_total", "op" => "delete", "outcome" => "committed").increment(1);

        let event = ChangeEvent::tombstone(collection.clone(), id);
        self.notify(event).await;
        Ok(())
    }

    /// Shared commit-then-notify path for create and update.
    async fn write(
        &self,
        kind: ChangeKind,
        collection: &Collection,
        entity: Entity,
    ) -> Result<Entity> {
        entity.validate()?;
        let op = kind.as_str();

        let commit =
            tokio::time::timeout(self.config.commit_timeout, self.store.put(collection, &entity))
                .await;

        match commit {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                counter!("scribe_writes_total", "op" => op, "outcome" => "commit_failed")
                    .increment(1);
                return Err(e);
            }
            Err(_) => {
                counter!("scribe_writes_total", "op" => op, "outcome" => "commit_failed")
                    .increment(1);
                return Err(ScribeError::store_unavailable(format!(
                    "{} of {}/{} timed out",
                    op, collection, entity.id
                )));
            }
        }

        counter!("scribe_writes_total", "op" => op, "outcome" => "committed").increment(1);

        let event = ChangeEvent::snapshot(kind, collection.clone(), &entity)?;
        self.notify(event).await;
        Ok(entity)
    }

    /// Notify phase: best-effort publish of the committed mutation.
    ///
    /// The publish future is detached onto the runtime so a caller disconnect
    /// after a successful commit cannot drop the event mid-flight; the writer
    /// then waits for it, keeping notify sequential within one request.
    /// Failures (including timeouts) are recorded and absorbed.
    async fn notify(&self, event: ChangeEvent) {
        let publisher = Arc::clone(&self.publisher);
        let timeout = self.config.notify_timeout;

        let handle = tokio::spawn(async move {
            let kind = event.event_type;
            let subject = event.subject_id.clone();

            let outcome = match tokio::time::timeout(timeout, publisher.publish(&event)).await {
                Ok(Ok(())) => Ok(()),
                Ok(Err(e)) => Err(e),
                Err(_) => Err(ScribeError::publish_failed(format!(
                    "publish of {} event for {} timed out",
                    kind, subject
                ))),
            };

            match outcome {
                Ok(()) => {
                    debug!(event_type = %kind, subject_id = %subject, "change event published");
                }
                Err(e) => {
                    counter!("scribe_publish_failures_total", "event_type" => kind.as_str())
                        .increment(1);
                    warn!(
                        event_type = %kind,
                        subject_id = %subject,
                        error = %e,
                        "change event publish failed; commit stands, event dropped"
                    );
                }
            }
        });

        // Join failure means the notify task panicked; the commit already
        // decided the request outcome either way.
        let _ = handle.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::publisher::MemoryPublisher;
    use crate::store::MemoryStore;
    use serde_json::{Map, Value};

    fn users() -> Collection {
        Collection::parse("users").unwrap()
    }

    fn entity(id: &str, name: &str) -> Entity {
        let mut fields = Map::new();
        fields.insert("name".into(), Value::String(name.into()));
        Entity::new(id, fields)
    }

    fn writer() -> (EntityWriter, Arc<MemoryStore>, Arc<MemoryPublisher>) {
        let store = Arc::new(MemoryStore::new());
        let publisher = Arc::new(MemoryPublisher::new());
        let writer = EntityWriter::new(
            store.clone(),
            publisher.clone(),
            WriterConfig::default(),
        );
        (writer, store, publisher)
    }

    #[tokio::test]
    async fn test_create_commits_and_publishes() {
        let (writer, _store, publisher) = writer();

        let created = writer.create(&users(), entity("1", "Ann")).await.unwrap();
        assert_eq!(created.id, "1");

        let got = writer.read(&users(), "1").await.unwrap();
        assert_eq!(got.fields["name"], "Ann");

        let events = publisher.published_for("1");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, ChangeKind::Created);
        assert_eq!(events[0].payload["name"], "Ann");
    }

    #[tokio::test]
    async fn test_create_with_empty_id_is_rejected_before_commit() {
        let (writer, store, publisher) = writer();

        let err = writer.create(&users(), entity("", "Ann")).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);
        assert!(store.is_empty());
        assert!(publisher.published().is_empty());
    }

    #[tokio::test]
    async fn test_publish_failure_does_not_fail_the_write() {
        let (writer, _store, publisher) = writer();
        publisher.set_failing(true);

        writer.create(&users(), entity("1", "Ann")).await.unwrap();

        // Commit stood even though no event went out
        let got = writer.read(&users(), "1").await.unwrap();
        assert_eq!(got.id, "1");
        assert!(publisher.published().is_empty());
    }

    #[tokio::test]
    async fn test_update_on_missing_id_upserts() {
        let (writer, _store, publisher) = writer();

        writer.update(&users(), entity("ghost", "Ann")).await.unwrap();

        let got = writer.read(&users(), "ghost").await.unwrap();
        assert_eq!(got.fields["name"], "Ann");

        let events = publisher.published_for("ghost");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, ChangeKind::Updated);
    }

    #[tokio::test]
    async fn test_delete_missing_id_succeeds_with_tombstone_event() {
        let (writer, _store, publisher) = writer();

        writer.delete(&users(), "missing").await.unwrap();

        let events = publisher.published_for("missing");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, ChangeKind::Deleted);
        assert_eq!(events[0].payload, serde_json::json!({ "id": "missing" }));
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let (writer, _store, _publisher) = writer();

        writer.create(&users(), entity("1", "Ann")).await.unwrap();
        writer.delete(&users(), "1").await.unwrap();
        writer.delete(&users(), "1").await.unwrap();

        let err = writer.read(&users(), "1").await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::RecordNotFound);
    }
}
