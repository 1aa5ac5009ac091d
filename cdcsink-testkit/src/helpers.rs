//! Event builders and log inspection.

use cdcsink_domain::{ChangeEvent, LogDocument, Operation, Row, EVENT_FIELD};
use cdcsink_log::MemoryLog;
use serde_json::{json, Value};

/// Build a row from a JSON object literal.
///
/// Panics if `value` is not an object.
pub fn row(value: Value) -> Row {
    match value {
        Value::Object(map) => map,
        other => panic!("row must be a JSON object, got {}", other),
    }
}

/// INSERT into `table` with `after = {"id": id, "name": "item-<id>"}`.
pub fn insert_event(table: &str, id: impl Into<Value>) -> ChangeEvent {
    let id: Value = id.into();
    let name = format!("item-{}", id);
    ChangeEvent::new(Operation::Insert)
        .with_after(row(json!({"id": id, "name": name})))
        .with_table(table)
}

/// UPDATE on `table` with a before image (`version: 1`) and after image (`version: 2`).
pub fn update_event(table: &str, id: impl Into<Value>) -> ChangeEvent {
    let id: Value = id.into();
    ChangeEvent::new(Operation::Update)
        .with_before(row(json!({"id": id.clone(), "version": 1})))
        .with_after(row(json!({"id": id, "version": 2})))
        .with_table(table)
}

/// DELETE on `table`; identity only available from the before image.
pub fn delete_event(table: &str, id: impl Into<Value>) -> ChangeEvent {
    let id: Value = id.into();
    ChangeEvent::new(Operation::Delete)
        .with_before(row(json!({"id": id, "name": "gone"})))
        .with_table(table)
}

/// Event whose payload lacks `id`.
pub fn event_without_id(operation: Operation, table: &str) -> ChangeEvent {
    ChangeEvent::new(operation)
        .with_after(row(json!({"name": "anonymous"})))
        .with_table(table)
}

/// Decode every entry of a memory-log partition.
///
/// Panics if an entry is not stored under the event field or does not decode.
pub fn decode_partition(log: &MemoryLog, partition: &str) -> Vec<LogDocument> {
    log.entries(partition)
        .into_iter()
        .map(|entry| {
            assert_eq!(entry.field, EVENT_FIELD, "unexpected field in {}", partition);
            LogDocument::decode(&entry.document)
                .unwrap_or_else(|e| panic!("undecodable entry {}: {}", entry.id, e))
        })
        .collect()
}
