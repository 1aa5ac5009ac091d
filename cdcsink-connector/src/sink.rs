//! Event sink: normalizes change events and appends them to the log.
//!
//! # Pipeline
//!
//! ```text
//! ChangeEvent → normalize → route → encode → LogEntry → LogSession
//! ```
//!
//! # Connection lifecycle
//!
//! ```text
//! Disconnected → Connecting → Connected → Disconnected
//! ```
//!
//! Only [`EventSink::connect`] and [`EventSink::disconnect`] change the state.
//! Every call awaits the backend acknowledgement before returning; there is
//! no background work and no retry. One sink serves one caller at a time.

use std::collections::BTreeMap;

use cdcsink_domain::{normalize, ChangeEvent, PartitionKey, Router, EVENT_FIELD};
use cdcsink_log::{EntryId, LogBackend, LogEntry, LogSession};
use tracing::{debug, error, info, warn};

use crate::config::SinkConfig;
use crate::error::{SinkError, SinkResult};
use crate::metrics::SinkMetrics;
use crate::report::{BatchReport, RecordOutcome, SkipReason};

/// Connection state of a sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Live connection and the settings it was opened with.
struct Connection<S> {
    session: S,
    config: SinkConfig,
    router: Router,
}

/// A record ready for the backend.
struct Prepared {
    partition: PartitionKey,
    entry: LogEntry,
}

/// CDC event sink over a log backend.
pub struct EventSink<B: LogBackend> {
    backend: B,
    state: ConnectionState,
    connection: Option<Connection<B::Session>>,
    positions: BTreeMap<PartitionKey, EntryId>,
    metrics: SinkMetrics,
}

impl<B: LogBackend> EventSink<B> {
    /// Create a disconnected sink.
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            state: ConnectionState::Disconnected,
            connection: None,
            positions: BTreeMap::new(),
            metrics: SinkMetrics::new(),
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    /// Configuration of the current connection
    pub fn config(&self) -> Option<&SinkConfig> {
        self.connection.as_ref().map(|c| &c.config)
    }

    pub fn metrics(&self) -> &SinkMetrics {
        &self.metrics
    }

    /// Last acknowledged entry per partition.
    ///
    /// Tracked for observability only; nothing is persisted (see [`EventSink::commit`]).
    pub fn last_positions(&self) -> &BTreeMap<PartitionKey, EntryId> {
        &self.positions
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Validate `config` and open a backend session.
    ///
    /// An existing connection is released first. On failure the sink stays
    /// `Disconnected`.
    pub async fn connect(&mut self, config: SinkConfig) -> SinkResult<()> {
        if self.connection.is_some() {
            self.disconnect().await?;
        }

        if let Err(e) = config.validate() {
            error!(error = %e, "Configuration error");
            return Err(e);
        }

        self.state = ConnectionState::Connecting;
        let endpoint = config.endpoint();

        match self.backend.open(&endpoint).await {
            Ok(session) => {
                info!(
                    address = %endpoint.address(),
                    stream = %config.stream_name,
                    "Connected to log backend"
                );
                self.connection = Some(Connection {
                    session,
                    router: Router::new(config.stream_name.clone()),
                    config,
                });
                self.state = ConnectionState::Connected;
                Ok(())
            },
            Err(e) => {
                self.state = ConnectionState::Disconnected;
                error!(
                    address = %endpoint.address(),
                    error = %e,
                    "Failed to connect to log backend"
                );
                Err(SinkError::Connection(e.to_string()))
            },
        }
    }

    /// Acknowledge delivered events.
    ///
    /// Offsets are owned by the caller, so this persists nothing. It logs the
    /// last entry per partition, which is where checkpointing would hook in.
    pub async fn commit(&mut self) -> SinkResult<()> {
        debug!(partitions = self.positions.len(), "Commit called");
        for (partition, entry_id) in &self.positions {
            debug!(partition = %partition, entry_id = %entry_id, "Last delivered entry");
        }
        Ok(())
    }

    /// Release the backend session. Safe to call when already disconnected.
    ///
    /// Close errors are logged, not returned.
    pub async fn disconnect(&mut self) -> SinkResult<()> {
        if let Some(mut connection) = self.connection.take() {
            match connection.session.close().await {
                Ok(()) => info!("Disconnected from log backend"),
                Err(e) => warn!(error = %e, "Error during log backend disconnect"),
            }
        }
        self.state = ConnectionState::Disconnected;
        Ok(())
    }

    // =========================================================================
    // Delivery
    // =========================================================================

    /// Append one event as one log entry.
    ///
    /// Unsupported operations are logged and skipped (`Ok(Skipped)`); invalid
    /// events fail with `InvalidEvent` and write nothing.
    pub async fn append_one(&mut self, event: &ChangeEvent) -> SinkResult<RecordOutcome> {
        let connection = self.connection.as_mut().ok_or(SinkError::NotConnected)?;

        let prepared = match prepare(&connection.router, &self.metrics, event) {
            Ok(prepared) => prepared,
            Err(SinkError::UnsupportedOperation(operation)) => {
                warn!(operation = %operation, "Unsupported operation, skipping event");
                self.metrics.record_skipped(SkipReason::UnsupportedOperation);
                return Ok(RecordOutcome::Skipped {
                    reason: SkipReason::UnsupportedOperation,
                    detail: operation,
                });
            },
            Err(e) => {
                warn!(error = %e, operation = %event.operation, "Rejected event");
                return Err(e);
            },
        };

        match connection.session.append(&prepared.entry).await {
            Ok(entry_id) => {
                debug!(
                    partition = %prepared.partition,
                    entry_id = %entry_id,
                    operation = %event.operation,
                    "Wrote event"
                );
                self.metrics.record_appended(1);
                self.positions.insert(prepared.partition.clone(), entry_id.clone());
                Ok(RecordOutcome::Appended {
                    partition: prepared.partition,
                    entry_id,
                })
            },
            Err(e) => {
                error!(partition = %prepared.partition, error = %e, "Failed to write event");
                self.metrics.record_delivery_failure();
                Err(SinkError::delivery(e.to_string()))
            },
        }
    }

    /// Append many events as one pipelined write-group.
    ///
    /// Invalid and unsupported events are logged and excluded without failing
    /// the batch. Valid events are submitted in input order in a single
    /// round-trip. The group is not atomic in the backend.
    ///
    /// Returns one outcome per input event. If the backend rejects individual
    /// entries the call fails with `Delivery` carrying the full report; if the
    /// exchange itself fails, the report is `None`.
    pub async fn append_batch(&mut self, events: &[ChangeEvent]) -> SinkResult<BatchReport> {
        if events.is_empty() {
            debug!("Empty batch, skipping");
            return Ok(BatchReport::default());
        }

        let connection = self.connection.as_mut().ok_or(SinkError::NotConnected)?;

        // Skipped events get their outcome now; the rest wait for the group result.
        let mut outcomes: Vec<Option<RecordOutcome>> = Vec::with_capacity(events.len());
        let mut pending: Vec<Prepared> = Vec::new();

        for (index, event) in events.iter().enumerate() {
            match prepare(&connection.router, &self.metrics, event) {
                Ok(prepared) => {
                    outcomes.push(None);
                    pending.push(prepared);
                },
                Err(e) if e.is_skippable() => {
                    let reason = match e {
                        SinkError::UnsupportedOperation(_) => SkipReason::UnsupportedOperation,
                        _ => SkipReason::InvalidEvent,
                    };
                    warn!(index, reason = reason.as_str(), error = %e, "Skipping event in batch");
                    self.metrics.record_skipped(reason);
                    outcomes.push(Some(RecordOutcome::Skipped {
                        reason,
                        detail: e.to_string(),
                    }));
                },
                Err(e) => {
                    error!(index, error = %e, "Failed to prepare batch");
                    return Err(e);
                },
            }
        }

        if pending.is_empty() {
            info!(skipped = events.len(), "No valid events in batch");
            return Ok(BatchReport::new(outcomes.into_iter().flatten().collect()));
        }

        let entries: Vec<LogEntry> = pending.iter().map(|p| p.entry.clone()).collect();
        let results = match connection.session.append_group(&entries).await {
            Ok(results) if results.len() == entries.len() => results,
            Ok(results) => {
                error!(
                    submitted = entries.len(),
                    acknowledged = results.len(),
                    "Write-group acknowledgement count mismatch"
                );
                self.metrics.record_delivery_failure();
                return Err(SinkError::delivery(format!(
                    "backend acknowledged {} of {} entries",
                    results.len(),
                    entries.len()
                )));
            },
            Err(e) => {
                error!(entries = entries.len(), error = %e, "Failed to batch write events");
                self.metrics.record_delivery_failure();
                return Err(SinkError::delivery(e.to_string()));
            },
        };

        let mut resolved = pending.into_iter().zip(results);
        let mut appended = 0;
        let mut failed = 0;

        for slot in outcomes.iter_mut().filter(|slot| slot.is_none()) {
            let Some((prepared, result)) = resolved.next() else {
                break;
            };
            *slot = Some(match result {
                Ok(entry_id) => {
                    appended += 1;
                    self.positions.insert(prepared.partition.clone(), entry_id.clone());
                    RecordOutcome::Appended {
                        partition: prepared.partition,
                        entry_id,
                    }
                },
                Err(e) => {
                    failed += 1;
                    warn!(partition = %prepared.partition, error = %e, "Backend rejected entry");
                    RecordOutcome::Failed {
                        partition: prepared.partition,
                        error: e.to_string(),
                    }
                },
            });
        }

        self.metrics.record_appended(appended);
        let report = BatchReport::new(outcomes.into_iter().flatten().collect());

        if failed > 0 {
            self.metrics.record_delivery_failure();
            error!(appended, failed, "Batch partially written");
            return Err(SinkError::Delivery {
                message: format!("{} of {} entries rejected by backend", failed, appended + failed),
                report: Some(report),
            });
        }

        info!(
            appended,
            skipped = report.skipped(),
            "Wrote batch to log"
        );
        Ok(report)
    }
}

/// Normalize, route and encode one event.
fn prepare(router: &Router, metrics: &SinkMetrics, event: &ChangeEvent) -> SinkResult<Prepared> {
    let record = normalize(event)?;

    let route = router.route(record.metadata());
    if route.fallback {
        warn!(
            partition = %route.key,
            operation = %event.operation,
            "Event metadata has no table, routing to fallback partition"
        );
        metrics.record_routing_fallback();
    }

    let document = record.encode()?;

    Ok(Prepared {
        entry: LogEntry::new(route.key.as_str(), EVENT_FIELD, document),
        partition: route.key,
    })
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use cdcsink_domain::Operation;
    use cdcsink_log::MemoryLog;
    use serde_json::json;

    fn event(operation: Operation, after: serde_json::Value) -> ChangeEvent {
        ChangeEvent::new(operation)
            .with_after(after.as_object().cloned().unwrap())
            .with_table("items")
    }

    #[test]
    fn test_prepare_builds_entry() {
        let router = Router::new("s");
        let metrics = SinkMetrics::new();

        let prepared =
            prepare(&router, &metrics, &event(Operation::Insert, json!({"id": 1}))).unwrap();

        assert_eq!(prepared.partition.as_str(), "s:items");
        assert_eq!(prepared.entry.partition, "s:items");
        assert_eq!(prepared.entry.field, "event");
        assert!(prepared.entry.document.starts_with(r#"{"operation":"INSERT""#));
        assert_eq!(metrics.routing_fallbacks(), 0);
    }

    #[test]
    fn test_prepare_counts_fallback() {
        let router = Router::new("s");
        let metrics = SinkMetrics::new();
        let event = ChangeEvent::new(Operation::Insert)
            .with_after(json!({"id": 1}).as_object().cloned().unwrap());

        let prepared = prepare(&router, &metrics, &event).unwrap();

        assert_eq!(prepared.partition.as_str(), "s:unknown");
        assert_eq!(metrics.routing_fallbacks(), 1);
    }

    #[test]
    fn test_prepare_classifies_rejections() {
        let router = Router::new("s");
        let metrics = SinkMetrics::new();

        let err = prepare(&router, &metrics, &event(Operation::Insert, json!({"x": 1})))
            .err()
            .unwrap();
        assert!(matches!(err, SinkError::InvalidEvent(_)));

        let err = prepare(&router, &metrics, &ChangeEvent::new(Operation::from("TRUNCATE")))
            .err()
            .unwrap();
        assert!(matches!(err, SinkError::UnsupportedOperation(ref op) if op == "TRUNCATE"));
    }

    #[tokio::test]
    async fn test_state_transitions() {
        let mut sink = EventSink::new(MemoryLog::new());
        assert_eq!(sink.state(), ConnectionState::Disconnected);

        sink.connect(SinkConfig::test()).await.unwrap();
        assert_eq!(sink.state(), ConnectionState::Connected);
        assert_eq!(sink.config().unwrap().stream_name, "test_events");

        sink.disconnect().await.unwrap();
        assert_eq!(sink.state(), ConnectionState::Disconnected);
        assert!(sink.config().is_none());
    }

    #[tokio::test]
    async fn test_reconnect_releases_previous_session() {
        let log = MemoryLog::new();
        let mut sink = EventSink::new(log.clone());

        sink.connect(SinkConfig::test()).await.unwrap();
        sink.connect(SinkConfig::test().with_stream_name("other")).await.unwrap();

        assert_eq!(log.close_count(), 1);
        assert!(sink.is_connected());
        assert_eq!(sink.config().unwrap().stream_name, "other");
    }
}
