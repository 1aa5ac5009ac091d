//! Event normalization.
//!
//! Turns a [`ChangeEvent`] into a [`CanonicalRecord`], or says why it can't.
//! Pure function of its input.

use serde_json::Value;
use thiserror::Error;

use crate::event::{ChangeEvent, Operation};
use crate::record::{CanonicalRecord, ChangeKind};

/// Why an event did not produce a record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    /// Payload missing, empty, or without a non-null `id`
    #[error("Invalid event: {0}")]
    Invalid(String),

    /// Operation outside INSERT/UPDATE/DELETE. Callers skip these.
    #[error("Unsupported operation: {0}")]
    Unsupported(String),
}

impl Rejection {
    /// Short label used for logs and metric labels.
    pub fn reason(&self) -> &'static str {
        match self {
            Rejection::Invalid(_) => "invalid_event",
            Rejection::Unsupported(_) => "unsupported_operation",
        }
    }
}

/// Normalize a change event.
///
/// The payload is `after` when present, else `before`. It must be a non-empty
/// row with a non-null `id`, for every supported operation including DELETE.
/// Unknown operations are reported as [`Rejection::Unsupported`] before the
/// payload is looked at.
pub fn normalize(event: &ChangeEvent) -> Result<CanonicalRecord, Rejection> {
    if !event.operation.is_supported() {
        return Err(Rejection::Unsupported(event.operation.as_str().to_string()));
    }

    let payload = event.after.as_ref().or(event.before.as_ref());

    let payload = match payload {
        Some(row) if !row.is_empty() => row,
        _ => {
            return Err(Rejection::Invalid(format!(
                "{} event has no row image",
                event.operation
            )))
        },
    };

    let id = match payload.get("id") {
        Some(Value::Null) | None => {
            return Err(Rejection::Invalid(format!(
                "{} event payload is missing 'id'",
                event.operation
            )))
        },
        Some(id) => id,
    };

    let kind = match event.operation {
        Operation::Insert => ChangeKind::Insert,
        Operation::Update => ChangeKind::Update,
        Operation::Delete => {
            return Ok(CanonicalRecord::Tombstone {
                id: id.clone(),
                metadata: event.metadata.clone(),
            })
        },
        Operation::Other(ref raw) => return Err(Rejection::Unsupported(raw.clone())),
    };

    Ok(CanonicalRecord::Change {
        kind,
        payload: payload.clone(),
        before: event.before.clone(),
        metadata: event.metadata.clone(),
    })
}

// =============================================================================
// Tests
// =============================================================================
