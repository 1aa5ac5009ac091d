//! Log backend port definitions.
//!
//! Ports define what the sink needs from a log store. Adapters implement them
//! for a specific backend (in-memory, Redis Streams).

use async_trait::async_trait;
use std::fmt;

use crate::error::LogError;

// =============================================================================
// Connection parameters
// =============================================================================

/// Where and how to reach the log backend.
#[derive(Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
    pub password: Option<String>,
    /// Use TLS for the connection
    pub tls: bool,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            password: None,
            tls: false,
        }
    }

    /// `host:port`, bracketing IPv6 literals.
    pub fn address(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("tls", &self.tls)
            .finish()
    }
}

// =============================================================================
// Entries
// =============================================================================

/// Backend-assigned entry identifier (e.g. Redis stream ID `1700000000000-0`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntryId(pub String);

impl EntryId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One entry to append: a single opaque field in a named partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub partition: String,
    pub field: String,
    pub document: String,
}

impl LogEntry {
    pub fn new(
        partition: impl Into<String>,
        field: impl Into<String>,
        document: impl Into<String>,
    ) -> Self {
        Self {
            partition: partition.into(),
            field: field.into(),
            document: document.into(),
        }
    }
}

// =============================================================================
// Ports
// =============================================================================

/// Port for opening log sessions.
///
/// Implementations:
/// - `MemoryLog` - shared in-memory log
/// - `RedisLog` - Redis Streams (feature `redis`)
#[async_trait]
pub trait LogBackend: Send + Sync {
    type Session: LogSession;

    /// Connect and verify the backend answers (handshake).
    async fn open(&self, endpoint: &Endpoint) -> Result<Self::Session, LogError>;
}

/// Port for appending to an open log.
///
/// A session may be pooled internally, but callers issue one request at a
/// time and wait for the acknowledgement.
#[async_trait]
pub trait LogSession: Send {
    /// Round-trip health check.
    async fn ping(&mut self) -> Result<(), LogError>;

    /// Append one entry and return its backend-assigned ID.
    async fn append(&mut self, entry: &LogEntry) -> Result<EntryId, LogError>;

    /// Submit all entries in one pipelined round-trip, then wait for every
    /// acknowledgement.
    ///
    /// Returns one result per entry, in input order. The group is not atomic:
    /// entries before a failed one may already be durable. An outer `Err`
    /// means the exchange itself failed and no per-entry outcome is known.
    async fn append_group(
        &mut self,
        entries: &[LogEntry],
    ) -> Result<Vec<Result<EntryId, LogError>>, LogError>;

    /// Release the connection. Closing twice is not an error.
    async fn close(&mut self) -> Result<(), LogError>;
}
