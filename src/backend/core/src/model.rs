//! Core data model: entities and the change events describing their mutations.
//!
//! This module provides:
//! - `Collection`, a validated collection name
//! - `Entity`, an opaque identified record with a collection-specific payload
//! - `ChangeKind` / `ChangeEvent`, immutable facts describing committed mutations

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::{Result, ScribeError};

// =============================================================================
// Collections
// =============================================================================

/// Maximum accepted collection name length.
const MAX_COLLECTION_LEN: usize = 64;

/// A validated collection name (e.g. `users`, `policies`, `audit-log`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Collection(String);

impl Collection {
    /// Parse and validate a collection name.
    ///
    /// Accepted names are non-empty, at most 64 characters, and restricted to
    /// lowercase alphanumerics, `-` and `_`.
    pub fn parse(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(ScribeError::validation("collection name is empty"));
        }
        if name.len() > MAX_COLLECTION_LEN {
            return Err(ScribeError::validation(format!(
                "collection name exceeds {} characters",
                MAX_COLLECTION_LEN
            )));
        }
        if !name
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-' || b == b'_')
        {
            return Err(ScribeError::validation(format!(
                "invalid collection name: {}",
                name
            )));
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// Entities
// =============================================================================

/// An opaque identified record.
///
/// The `id` is the caller-supplied primary key, immutable once created and
/// unique within a collection. Everything else is a collection-specific
/// payload of arbitrary JSON fields, carried verbatim. Wire shape:
/// `{ "id": "...", ...fields }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Primary key within the collection
    pub id: String,

    /// Collection-specific payload fields
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Entity {
    /// Create an entity from an id and payload fields.
    pub fn new(id: impl Into<String>, fields: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    /// Validate the entity for writing: the id must be non-empty.
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(ScribeError::validation("entity id is empty"));
        }
        Ok(())
    }

    /// Serialize to the persisted wire shape.
    pub fn to_json(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

// =============================================================================
// Change Events
// =============================================================================

/// The kind of mutation a change event describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    #[serde(rename = "create")]
    Created,
    #[serde(rename = "update")]
    Updated,
    #[serde(rename = "delete")]
    Deleted,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "create",
            Self::Updated => "update",
            Self::Deleted => "delete",
        }
    }
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An immutable fact describing a committed mutation.
///
/// Events carry no causal ordering token beyond publish order on their
/// partition key; the partition key is `subject_id`, so consumers get
/// per-entity ordering but no cross-entity ordering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// Unique event identifier
    pub event_id: Uuid,

    /// The mutation kind
    pub event_type: ChangeKind,

    /// Collection the subject belongs to
    pub collection: Collection,

    /// The mutated entity's id (publish partition key)
    pub subject_id: String,

    /// Entity snapshot at commit time; for deletes, a tombstone `{ "id": ... }`
    pub payload: Value,

    /// When the mutation was committed
    pub occurred_at: DateTime<Utc>,
}

impl ChangeEvent {
    /// Build an event carrying the post-commit entity snapshot.
    pub fn snapshot(kind: ChangeKind, collection: Collection, entity: &Entity) -> Result<Self> {
        Ok(Self {
            event_id: Uuid::new_v4(),
            event_type: kind,
            collection,
            subject_id: entity.id.clone(),
            payload: entity.to_json()?,
            occurred_at: Utc::now(),
        })
    }

    /// Build a `delete` event whose payload is the minimal tombstone.
    pub fn tombstone(collection: Collection, id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            event_id: Uuid::new_v4(),
            event_type: ChangeKind::Deleted,
            collection,
            subject_id: id.clone(),
            payload: serde_json::json!({ "id": id }),
            occurred_at: Utc::now(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    fn entity(id: &str, name: &str) -> Entity {
        let mut fields = Map::new();
        fields.insert("name".into(), Value::String(name.into()));
        Entity::new(id, fields)
    }

    #[test]
    fn test_collection_accepts_valid_names() {
        for name in ["users", "policies", "audit-log", "audit_log", "v2"] {
            assert!(Collection::parse(name).is_ok(), "rejected {}", name);
        }
    }

    #[test]
    fn test_collection_rejects_invalid_names() {
        for name in ["", "Users", "a b", "röster", &"x".repeat(65)] {
            let err = Collection::parse(name.to_string()).unwrap_err();
            assert_eq!(err.code(), ErrorCode::ValidationError);
        }
    }

    #[test]
    fn test_entity_wire_shape_is_flat() {
        let e = entity("1", "Ann");
        let json = e.to_json().unwrap();
        assert_eq!(json["id"], "1");
        assert_eq!(json["name"], "Ann");
        assert!(json.get("fields").is_none());
    }

    #[test]
    fn test_entity_round_trip() {
        let e = entity("u-1", "Ann");
        let json = serde_json::to_string(&e).unwrap();
        let back: Entity = serde_json::from_str(&json).unwrap();
        assert_eq!(e, back);
    }

    #[test]
    fn test_change_kind_wire_names() {
        assert_eq!(
            serde_json::to_string(&ChangeKind::Created).unwrap(),
            "\"create\""
        );
        assert_eq!(
            serde_json::to_string(&ChangeKind::Updated).unwrap(),
            "\"update\""
        );
        assert_eq!(
            serde_json::to_string(&ChangeKind::Deleted).unwrap(),
            "\"delete\""
        );
    }

    #[test]
    fn test_snapshot_event_carries_entity_payload() {
        let e = entity("1", "Ann");
        let event =
            ChangeEvent::snapshot(ChangeKind::Created, Collection::parse("users").unwrap(), &e)
                .unwrap();

        assert_eq!(event.event_type, ChangeKind::Created);
        assert_eq!(event.subject_id, "1");
        assert_eq!(event.payload["name"], "Ann");
    }

    #[test]
    fn test_tombstone_payload_carries_only_id() {
        let event = ChangeEvent::tombstone(Collection::parse("users").unwrap(), "missing");

        assert_eq!(event.event_type, ChangeKind::Deleted);
        assert_eq!(event.subject_id, "missing");
        assert_eq!(event.payload, serde_json::json!({ "id": "missing" }));
    }
}
