//! Canonical log records.
//!
//! A canonical record is the normalized shape of a change event, ready to be
//! encoded as a log document. Records only exist for the span of one append
//! call; they carry no identity of their own.

use serde::Serialize;
use serde_json::Value;

use crate::event::{Metadata, Operation, Row};

/// Operations that produce a full change record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Insert,
    Update,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::Insert => "INSERT",
            ChangeKind::Update => "UPDATE",
        }
    }
}

/// Normalized change event.
#[derive(Debug, Clone, PartialEq)]
pub enum CanonicalRecord {
    /// INSERT or UPDATE: full row image plus the previous state
    Change {
        kind: ChangeKind,
        payload: Row,
        before: Option<Row>,
        metadata: Metadata,
    },

    /// DELETE: identity and metadata only
    Tombstone { id: Value, metadata: Metadata },
}

/// Wire shape of a record. Field order is part of the format.
#[derive(Serialize)]
#[serde(untagged)]
enum Document<'a> {
    Change {
        operation: &'static str,
        payload: &'a Row,
        metadata: &'a Metadata,
        before: Option<&'a Row>,
    },
    Tombstone {
        operation: &'static str,
        id: &'a Value,
        metadata: &'a Metadata,
    },
}

impl CanonicalRecord {
    /// Operation this record was produced from.
    pub fn operation(&self) -> Operation {
        match self {
            CanonicalRecord::Change { kind: ChangeKind::Insert, .. } => Operation::Insert,
            CanonicalRecord::Change { kind: ChangeKind::Update, .. } => Operation::Update,
            CanonicalRecord::Tombstone { .. } => Operation::Delete,
        }
    }

    /// Row identity (`payload.id` or the tombstone id).
    pub fn id(&self) -> &Value {
        match self {
            CanonicalRecord::Change { payload, .. } => payload.get("id").unwrap_or(&Value::Null),
            CanonicalRecord::Tombstone { id, .. } => id,
        }
    }

    pub fn metadata(&self) -> &Metadata {
        match self {
            CanonicalRecord::Change { metadata, .. }
            | CanonicalRecord::Tombstone { metadata, .. } => metadata,
        }
    }

    pub fn is_tombstone(&self) -> bool {
        matches!(self, CanonicalRecord::Tombstone { .. })
    }

    /// Encode as the self-describing JSON document stored in the log.
    ///
    /// Changes: `{"operation", "payload", "metadata", "before"}` (`before` is
    /// `null` when absent). Tombstones: `{"operation": "DELETE", "id", "metadata"}`.
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        let document = match self {
            CanonicalRecord::Change {
                kind,
                payload,
                before,
                metadata,
            } => Document::Change {
                operation: kind.as_str(),
                payload,
                metadata,
                before: before.as_ref(),
            },
            CanonicalRecord::Tombstone { id, metadata } => Document::Tombstone {
                operation: "DELETE",
                id,
                metadata,
            },
        };

        serde_json::to_string(&document)
    }
}

// =============================================================================
// Tests
// =============================================================================
