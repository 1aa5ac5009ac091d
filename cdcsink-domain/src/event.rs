//! Upstream change events.
//!
//! A change event describes one row-level mutation on a source table. The
//! connector framework hands these to the sink as-is; nothing here validates
//! them (see [`crate::normalize`]).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Row image (column name → value).
pub type Row = Map<String, Value>;

/// Event metadata. Expected to carry `table`, but not guaranteed to.
pub type Metadata = Map<String, Value>;

// =============================================================================
// Operation
// =============================================================================

/// Kind of row mutation.
///
/// The upstream set is open: anything that is not `INSERT`, `UPDATE` or
/// `DELETE` is kept verbatim in [`Operation::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Operation {
    Insert,
    Update,
    Delete,
    /// Unrecognized operation (e.g. `TRUNCATE`)
    Other(String),
}

impl Operation {
    /// Upstream spelling of the operation.
    pub fn as_str(&self) -> &str {
        match self {
            Operation::Insert => "INSERT",
            Operation::Update => "UPDATE",
            Operation::Delete => "DELETE",
            Operation::Other(raw) => raw,
        }
    }

    /// True for INSERT, UPDATE and DELETE.
    pub fn is_supported(&self) -> bool {
        !matches!(self, Operation::Other(_))
    }
}

impl From<&str> for Operation {
    fn from(raw: &str) -> Self {
        match raw {
            "INSERT" => Operation::Insert,
            "UPDATE" => Operation::Update,
            "DELETE" => Operation::Delete,
            other => Operation::Other(other.to_string()),
        }
    }
}

impl From<String> for Operation {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "INSERT" | "UPDATE" | "DELETE" => Operation::from(raw.as_str()),
            _ => Operation::Other(raw),
        }
    }
}

impl From<Operation> for String {
    fn from(op: Operation) -> Self {
        match op {
            Operation::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// ChangeEvent
// =============================================================================

/// A row-level change captured from a source table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// What happened to the row
    pub operation: Operation,
    /// Previous row state (UPDATE, DELETE)
    #[serde(default)]
    pub before: Option<Row>,
    /// New row state (INSERT, UPDATE)
    #[serde(default)]
    pub after: Option<Row>,
    /// Source metadata (table, schema, commit timestamp, ...)
    #[serde(default)]
    pub metadata: Metadata,
}

impl ChangeEvent {
    /// Create an event with no row images and empty metadata.
    pub fn new(operation: Operation) -> Self {
        Self {
            operation,
            before: None,
            after: None,
            metadata: Metadata::new(),
        }
    }

    /// Set the previous row state
    pub fn with_before(mut self, before: Row) -> Self {
        self.before = Some(before);
        self
    }

    /// Set the new row state
    pub fn with_after(mut self, after: Row) -> Self {
        self.after = Some(after);
        self
    }

    /// Insert a metadata entry
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Set `metadata["table"]`
    pub fn with_table(self, table: impl Into<String>) -> Self {
        self.with_metadata("table", table.into())
    }}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_operation_parsing() {
        assert_eq!(Operation::from("INSERT"), Operation::Insert);
        assert_eq!(Operation::from("UPDATE"), Operation::Update);
        assert_eq!(Operation::from("DELETE"), Operation::Delete);
        assert_eq!(Operation::from("TRUNCATE"), Operation::Other("TRUNCATE".to_string()));
        // upstream spellings are case-sensitive
        assert_eq!(Operation::from("insert"), Operation::Other("insert".to_string()));
    }

    #[test]
    fn test_operation_display() {
        assert_eq!(Operation::Delete.to_string(), "DELETE");
        assert_eq!(Operation::Other("TRUNCATE".into()).to_string(), "TRUNCATE");
        assert!(!Operation::Other("TRUNCATE".into()).is_supported());
        assert!(Operation::Update.is_supported());
    }

    #[test]
    fn test_change_event_deserialization() {
        let event: ChangeEvent = serde_json::from_value(json!({
            "operation": "UPDATE",
            "before": {"id": 1, "qty": 2},
            "after": {"id": 1, "qty": 3},
            "metadata": {"table": "orders", "lsn": 42}
        }))
        .unwrap();

        assert_eq!(event.operation, Operation::Update);
        assert_eq!(event.after.as_ref().unwrap()["qty"], json!(3));
        assert_eq!(event.metadata["table"], json!("orders"));
    }

    #[test]
    fn test_change_event_optional_fields_default() {
        let event: ChangeEvent = serde_json::from_value(json!({"operation": "MERGE"})).unwrap();

        assert_eq!(event.operation, Operation::Other("MERGE".to_string()));
        assert!(event.before.is_none());
        assert!(event.after.is_none());
        assert!(event.metadata.is_empty());
    }

    #[test]
    fn test_operation_serializes_as_string() {
        let event = ChangeEvent::new(Operation::Other("TRUNCATE".into())).with_table("t");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["operation"], json!("TRUNCATE"));
    }
}
