//! In-memory event publisher.
//!
//! Records published events for inspection and can be armed to fail, which
//! is how the orchestrator's notify-phase failure handling is tested.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use super::EventPublisher;
use crate::error::{Result, ScribeError};
use crate::model::ChangeEvent;

/// In-process publisher that appends events to a shared log.
#[derive(Default)]
pub struct MemoryPublisher {
    events: Mutex<Vec<ChangeEvent>>,
    fail_next: AtomicBool,
}

impl MemoryPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the publisher so every subsequent publish fails until disarmed.
    pub fn set_failing(&self, failing: bool) {
        self.fail_next.store(failing, Ordering::SeqCst);
    }

    /// Snapshot of all published events, in publish order.
    pub fn published(&self) -> Vec<ChangeEvent> {
        self.events.lock().clone()
    }

    /// Events published for one subject id, in publish order.
    pub fn published_for(&self, subject_id: &str) -> Vec<ChangeEvent> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.subject_id == subject_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl EventPublisher for MemoryPublisher {
    async fn publish(&self, event: &ChangeEvent) -> Result<()> {
        if self.fail_next.load(Ordering::SeqCst) {
            return Err(ScribeError::publish_failed("memory publisher armed to fail"));
        }
        self.events.lock().push(event.clone());
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::model::Collection;

    #[tokio::test]
    async fn test_publish_appends_in_order() {
        let publisher = MemoryPublisher::new();
        let users = Collection::parse("users").unwrap();

        publisher
            .publish(&ChangeEvent::tombstone(users.clone(), "a"))
            .await
            .unwrap();
        publisher
            .publish(&ChangeEvent::tombstone(users, "b"))
            .await
            .unwrap();

        let events = publisher.published();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].subject_id, "a");
        assert_eq!(events[1].subject_id, "b");
    }

    #[tokio::test]
    async fn test_armed_publisher_fails() {
        let publisher = MemoryPublisher::new();
        let users = Collection::parse("users").unwrap();
        publisher.set_failing(true);

        let err = publisher
            .publish(&ChangeEvent::tombstone(users, "a"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::PublishFailed);
        assert!(publisher.published().is_empty());
    }
}
