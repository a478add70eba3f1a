//! # Scribe Core
//!
//! Entity record service with persist-then-publish change events.
//!
//! ## Architecture
//!
//! - **Record Store**: durable key-value persistence for identified entities
//! - **Event Publisher**: best-effort change-event fan-out over Redis streams
//! - **Entity Writer**: the commit-then-notify orchestrator joining the two
//! - **API Gateway**: HTTP surface mapping CRUD requests to writer calls
//! - **Observability**: structured logging and Prometheus metrics
//!
//! The invariant the whole crate is built around: storage is the source of
//! truth. A mutation is only acknowledged after it is durably committed, and
//! the matching change event is published afterwards, best-effort. Consumers
//! may miss events but never see an event for a write that did not commit.

pub mod api;
pub mod config;
pub mod error;
pub mod health;
pub mod model;
pub mod observability;
pub mod publisher;
pub mod store;
pub mod writer;

pub use error::{ErrorCode, ErrorSeverity, Result, ScribeError};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::{ErrorCode, ErrorSeverity, Result, ScribeError};
    pub use crate::model::{ChangeEvent, ChangeKind, Collection, Entity};
    pub use crate::publisher::{EventPublisher, MemoryPublisher, RedisStreamPublisher};
    pub use crate::store::{MemoryStore, RecordStore, RedisStore};
    pub use crate::writer::{EntityWriter, WriterConfig};
}
