//! Connector lifecycle tests: framework hooks and the connection state machine.

use cdcsink_connector::{ConnectionState, EventSink, SinkConfig, SinkConnector, SinkError};
use cdcsink_domain::Operation;
use cdcsink_log::MemoryLog;
use cdcsink_testkit::{decode_partition, event_without_id, insert_event};
use serde_json::{json, Map, Value};

fn options(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap()
}

#[tokio::test]
async fn test_framework_hooks_end_to_end() {
    let log = MemoryLog::new();
    let mut connector: Box<dyn SinkConnector> = Box::new(EventSink::new(log.clone()));

    connector
        .connect(&options(json!({"redis_host": "localhost", "redis_port": 6379})))
        .await
        .unwrap();
    connector.write(&insert_event("orders", 1)).await.unwrap();
    connector
        .batch_write(&[insert_event("orders", 2), event_without_id(Operation::Insert, "orders")])
        .await
        .unwrap();
    connector.commit().await.unwrap();
    connector.disconnect().await.unwrap();

    let docs = decode_partition(&log, "gluesync_events:orders");
    assert_eq!(docs.len(), 2);
    assert_eq!(log.close_count(), 1);
}

#[tokio::test]
async fn test_connect_missing_host_is_configuration_error() {
    let log = MemoryLog::new();
    let mut sink = EventSink::new(log.clone());

    let err = SinkConnector::connect(&mut sink, &options(json!({"port": 1234})))
        .await
        .unwrap_err();

    assert!(matches!(err, SinkError::Configuration(_)));
    assert_eq!(sink.state(), ConnectionState::Disconnected);
    // validation happens before any backend call
    assert_eq!(log.round_trips(), 0);
}

#[tokio::test]
async fn test_connect_handshake_failure_is_connection_error() {
    let log = MemoryLog::new();
    log.set_fail_connect(true);
    let mut sink = EventSink::new(log.clone());

    let err = sink.connect(SinkConfig::test()).await.unwrap_err();

    assert!(matches!(err, SinkError::Connection(_)));
    assert_eq!(sink.state(), ConnectionState::Disconnected);

    // recovers once the backend is reachable
    log.set_fail_connect(false);
    sink.connect(SinkConfig::test()).await.unwrap();
    assert_eq!(sink.state(), ConnectionState::Connected);
}

#[tokio::test]
async fn test_operations_before_connect_fail() {
    let mut sink = EventSink::new(MemoryLog::new());

    let err = sink.append_batch(&[insert_event("t", 1)]).await.unwrap_err();
    assert!(matches!(err, SinkError::NotConnected));

    let err = sink.append_one(&insert_event("t", 1)).await.unwrap_err();
    assert!(matches!(err, SinkError::NotConnected));
}

#[tokio::test]
async fn test_operations_after_disconnect_fail() {
    let mut sink = EventSink::new(MemoryLog::new());
    sink.connect(SinkConfig::test()).await.unwrap();
    sink.disconnect().await.unwrap();

    let err = sink.append_one(&insert_event("t", 1)).await.unwrap_err();
    assert!(matches!(err, SinkError::NotConnected));
}

#[tokio::test]
async fn test_disconnect_is_idempotent() {
    let log = MemoryLog::new();
    let mut sink = EventSink::new(log.clone());

    // never connected
    sink.disconnect().await.unwrap();

    sink.connect(SinkConfig::test()).await.unwrap();
    sink.disconnect().await.unwrap();
    sink.disconnect().await.unwrap();

    assert_eq!(sink.state(), ConnectionState::Disconnected);
    assert_eq!(log.close_count(), 1);
}

#[tokio::test]
async fn test_commit_has_no_observable_effect() {
    let log = MemoryLog::new();
    let mut sink = EventSink::new(log.clone());

    // allowed in any state
    sink.commit().await.unwrap();

    sink.connect(SinkConfig::test()).await.unwrap();
    let round_trips = log.round_trips();
    sink.commit().await.unwrap();

    assert_eq!(log.round_trips(), round_trips);
    assert_eq!(log.entry_count(), 0);
}
