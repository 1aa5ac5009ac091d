//! Decoding of stored log documents.
//!
//! Each log entry carries a single field, [`EVENT_FIELD`], whose value is the
//! JSON document produced by [`crate::CanonicalRecord::encode`]. Downstream
//! consumers use [`LogDocument`] to read it back.

use serde::Deserialize;
use serde_json::Value;

use crate::event::{Metadata, Operation, Row};

/// Field name under which the encoded document is stored.
pub const EVENT_FIELD: &str = "event";

/// A decoded log document.
///
/// `payload`/`before` are only present for INSERT/UPDATE; `id` only for DELETE.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LogDocument {
    pub operation: Operation,
    #[serde(default)]
    pub payload: Option<Row>,
    #[serde(default)]
    pub before: Option<Row>,
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub metadata: Metadata,
}

impl LogDocument {
    pub fn decode(document: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(document)
    }

    pub fn is_tombstone(&self) -> bool {
        self.operation == Operation::Delete
    }

    /// Row identity regardless of document shape.
    pub fn row_id(&self) -> Option<&Value> {
        self.id
            .as_ref()
            .or_else(|| self.payload.as_ref().and_then(|p| p.get("id")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::ChangeEvent;
    use crate::normalize::normalize;
    use serde_json::json;

    #[test]
    fn test_decode_tombstone() {
        let event = ChangeEvent::new(Operation::Delete)
            .with_before(json!({"id": 5}).as_object().cloned().unwrap())
            .with_table("t");
        let encoded = normalize(&event).unwrap().encode().unwrap();

        let doc = LogDocument::decode(&encoded).unwrap();
        assert!(doc.is_tombstone());
        assert!(doc.payload.is_none());
        assert!(doc.before.is_none());
        assert_eq!(doc.row_id(), Some(&json!(5)));
        assert_eq!(doc.metadata["table"], json!("t"));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(LogDocument::decode("not json").is_err());
    }
}
