//! In-memory log implementation
//!
//! Used for testing and dry runs without a log server.
//! Cloning a `MemoryLog` shares the same storage, so a test can hand one
//! clone to the sink and inspect the other.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tracing::debug;

use crate::backend::{Endpoint, EntryId, LogBackend, LogEntry, LogSession};
use crate::error::LogError;

/// Entry as stored in a memory partition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredEntry {
    pub id: EntryId,
    pub field: String,
    pub document: String,
}

/// Simulated failures
#[derive(Default)]
struct Faults {
    fail_connect: bool,
    fail_next_round_trip: bool,
    rejected_partitions: HashSet<String>,
}

#[derive(Default)]
struct Inner {
    partitions: RwLock<BTreeMap<String, Vec<StoredEntry>>>,
    faults: RwLock<Faults>,
    seq: AtomicU64,
    round_trips: AtomicU64,
    closes: AtomicU64,
}

/// Shared in-memory append-only log
#[derive(Clone, Default)]
pub struct MemoryLog {
    inner: Arc<Inner>,
}

impl MemoryLog {
    /// Create a new empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries of one partition, in append order
    pub fn entries(&self, partition: &str) -> Vec<StoredEntry> {
        let partitions = self.inner.partitions.read().unwrap();
        partitions.get(partition).cloned().unwrap_or_default()
    }

    /// Names of all partitions that have at least one entry
    pub fn partitions(&self) -> Vec<String> {
        self.inner.partitions.read().unwrap().keys().cloned().collect()
    }

    /// Total number of entries across partitions
    pub fn entry_count(&self) -> usize {
        self.inner.partitions.read().unwrap().values().map(Vec::len).sum()
    }

    /// Number of requests served (pings, appends and groups each count once)
    pub fn round_trips(&self) -> u64 {
        self.inner.round_trips.load(Ordering::SeqCst)
    }

    /// Number of sessions closed
    pub fn close_count(&self) -> u64 {
        self.inner.closes.load(Ordering::SeqCst)
    }

    /// Make `open` fail until reset
    pub fn set_fail_connect(&self, fail: bool) {
        self.inner.faults.write().unwrap().fail_connect = fail;
    }

    /// Fail the next append or group with a transport error (nothing written)
    pub fn fail_next_round_trip(&self) {
        self.inner.faults.write().unwrap().fail_next_round_trip = true;
    }

    /// Reject every append addressed to `partition`
    pub fn reject_partition(&self, partition: impl Into<String>) {
        self.inner
            .faults
            .write()
            .unwrap()
            .rejected_partitions
            .insert(partition.into());
    }


    /// Count a request and consume a pending transport fault
    fn begin_round_trip(&self) -> Result<(), LogError> {
        self.inner.round_trips.fetch_add(1, Ordering::SeqCst);

        let mut faults = self.inner.faults.write().unwrap();
        if std::mem::take(&mut faults.fail_next_round_trip) {
            return Err(LogError::Transport("Simulated transport failure".to_string()));
        }
        Ok(())
    }

    fn store(&self, entry: &LogEntry) -> Result<EntryId, LogError> {
        if self
            .inner
            .faults
            .read()
            .unwrap()
            .rejected_partitions
            .contains(&entry.partition)
        {
            return Err(LogError::append(&entry.partition, "Simulated append rejection"));
        }

        let seq = self.inner.seq.fetch_add(1, Ordering::SeqCst);
        let id = EntryId(format!("{}-{}", Utc::now().timestamp_millis(), seq));

        let mut partitions = self.inner.partitions.write().unwrap();
        partitions
            .entry(entry.partition.clone())
            .or_default()
            .push(StoredEntry {
                id: id.clone(),
                field: entry.field.clone(),
                document: entry.document.clone(),
            });

        Ok(id)
    }
}

#[async_trait]
impl LogBackend for MemoryLog {
    type Session = MemorySession;

    async fn open(&self, endpoint: &Endpoint) -> Result<MemorySession, LogError> {
        if self.inner.faults.read().unwrap().fail_connect {
            return Err(LogError::Connection(format!(
                "Simulated connection failure to {}",
                endpoint.address()
            )));
        }

        let mut session = MemorySession {
            log: self.clone(),
            open: true,
        };
        session.ping().await?;

        debug!(address = %endpoint.address(), "Memory log session opened");
        Ok(session)
    }
}

/// Session on a [`MemoryLog`]
pub struct MemorySession {
    log: MemoryLog,
    open: bool,
}

impl MemorySession {
    fn ensure_open(&self) -> Result<(), LogError> {
        if self.open {
            Ok(())
        } else {
            Err(LogError::Closed)
        }
    }
}

#[async_trait]
impl LogSession for MemorySession {
    async fn ping(&mut self) -> Result<(), LogError> {
        self.ensure_open()?;
        self.log.begin_round_trip()
    }

    async fn append(&mut self, entry: &LogEntry) -> Result<EntryId, LogError> {
        self.ensure_open()?;
        self.log.begin_round_trip()?;
        self.log.store(entry)
    }

    async fn append_group(
        &mut self,
        entries: &[LogEntry],
    ) -> Result<Vec<Result<EntryId, LogError>>, LogError> {
        self.ensure_open()?;
        self.log.begin_round_trip()?;
        Ok(entries.iter().map(|entry| self.log.store(entry)).collect())
    }

    async fn close(&mut self) -> Result<(), LogError> {
        if std::mem::take(&mut self.open) {
            self.log.inner.closes.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint() -> Endpoint {
        Endpoint::new("localhost", 6379)
    }

    #[tokio::test]
    async fn test_append_assigns_ordered_ids() {
        let log = MemoryLog::new();
        let mut session = log.open(&endpoint()).await.unwrap();

        let first = session.append(&LogEntry::new("s:a", "event", "1")).await.unwrap();
        let second = session.append(&LogEntry::new("s:a", "event", "2")).await.unwrap();

        assert_ne!(first, second);
        let entries = log.entries("s:a");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].id, first);
        assert_eq!(entries[1].document, "2");
    }

    #[tokio::test]
    async fn test_group_is_one_round_trip() {
        let log = MemoryLog::new();
        let mut session = log.open(&endpoint()).await.unwrap();
        let before = log.round_trips();

        let results = session
            .append_group(&[
                LogEntry::new("s:a", "event", "1"),
                LogEntry::new("s:b", "event", "2"),
                LogEntry::new("s:a", "event", "3"),
            ])
            .await
            .unwrap();

        assert_eq!(results.len(), 3);
        assert!(results.iter().all(Result::is_ok));
        assert_eq!(log.round_trips() - before, 1);
        assert_eq!(log.partitions(), vec!["s:a".to_string(), "s:b".to_string()]);
        assert_eq!(log.entries("s:a")[1].document, "3");
    }

    #[tokio::test]
    async fn test_rejected_partition_is_per_entry() {
        let log = MemoryLog::new();
        log.reject_partition("s:bad");
        let mut session = log.open(&endpoint()).await.unwrap();

        let results = session
            .append_group(&[
                LogEntry::new("s:ok", "event", "1"),
                LogEntry::new("s:bad", "event", "2"),
                LogEntry::new("s:ok", "event", "3"),
            ])
            .await
            .unwrap();

        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(LogError::Append { .. })));
        assert!(results[2].is_ok());
        assert_eq!(log.entry_count(), 2);
    }

    #[tokio::test]
    async fn test_transport_failure_writes_nothing() {
        let log = MemoryLog::new();
        let mut session = log.open(&endpoint()).await.unwrap();
        log.fail_next_round_trip();

        let result = session.append_group(&[LogEntry::new("s:a", "event", "1")]).await;

        assert!(matches!(result, Err(LogError::Transport(_))));
        assert_eq!(log.entry_count(), 0);

        // fault is consumed
        assert!(session.append(&LogEntry::new("s:a", "event", "1")).await.is_ok());
    }

    #[tokio::test]
    async fn test_connect_failure() {
        let log = MemoryLog::new();
        log.set_fail_connect(true);

        let result = log.open(&endpoint()).await;
        assert!(matches!(result, Err(LogError::Connection(_))));
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let log = MemoryLog::new();
        let mut session = log.open(&endpoint()).await.unwrap();

        session.close().await.unwrap();
        session.close().await.unwrap();

        assert_eq!(log.close_count(), 1);
        assert!(matches!(
            session.append(&LogEntry::new("s:a", "event", "x")).await,
            Err(LogError::Closed)
        ));
    }
}
