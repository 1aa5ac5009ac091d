//! Redis Streams log implementation (feature `redis`).
//!
//! Each partition is a Redis stream; each entry is `XADD <partition> * <field> <document>`.
//! Groups are sent as a single pipeline. The `ConnectionManager` multiplexes
//! requests and reconnects on its own, so the session holds one cloneable handle.

use ::redis::aio::ConnectionManager;
use ::redis::{Client, IntoConnectionInfo, RedisError};
use async_trait::async_trait;
use tracing::{debug, info};

use crate::backend::{Endpoint, EntryId, LogBackend, LogEntry, LogSession};
use crate::error::LogError;

/// Opens Redis Streams sessions
#[derive(Debug, Clone, Copy, Default)]
pub struct RedisLog;

impl RedisLog {
    pub fn new() -> Self {
        Self
    }

    fn client(endpoint: &Endpoint) -> Result<Client, RedisError> {
        let scheme = if endpoint.tls { "rediss" } else { "redis" };
        let mut info = format!("{}://{}/", scheme, endpoint.address()).into_connection_info()?;

        // kept out of the URL so it needs no escaping
        info.redis.password = endpoint.password.clone();

        Client::open(info)
    }
}

#[async_trait]
impl LogBackend for RedisLog {
    type Session = RedisSession;

    async fn open(&self, endpoint: &Endpoint) -> Result<RedisSession, LogError> {
        let client = Self::client(endpoint).map_err(|e| LogError::Connection(e.to_string()))?;

        let conn = client
            .get_connection_manager()
            .await
            .map_err(|e| LogError::Connection(e.to_string()))?;

        let mut session = RedisSession { conn: Some(conn) };
        session
            .ping()
            .await
            .map_err(|e| LogError::Connection(e.to_string()))?;

        info!(
            address = %endpoint.address(),
            tls = endpoint.tls,
            "Connected to Redis"
        );
        Ok(session)
    }
}

/// Open Redis connection
pub struct RedisSession {
    conn: Option<ConnectionManager>,
}

impl RedisSession {
    fn conn(&mut self) -> Result<&mut ConnectionManager, LogError> {
        self.conn.as_mut().ok_or(LogError::Closed)
    }
}

/// Server error replies are per-command; anything else leaves the outcome unknown.
fn classify(partition: &str, err: RedisError) -> LogError {
    if err.is_io_error() || err.is_timeout() || err.is_connection_dropped() {
        LogError::Transport(err.to_string())
    } else {
        LogError::append(partition, err.to_string())
    }
}

#[async_trait]
impl LogSession for RedisSession {
    async fn ping(&mut self) -> Result<(), LogError> {
        let conn = self.conn()?;
        let _: String = ::redis::cmd("PING")
            .query_async(conn)
            .await
            .map_err(|e| LogError::Transport(e.to_string()))?;
        Ok(())
    }

    async fn append(&mut self, entry: &LogEntry) -> Result<EntryId, LogError> {
        let conn = self.conn()?;
        let id: String = ::redis::cmd("XADD")
            .arg(&entry.partition)
            .arg("*")
            .arg(&entry.field)
            .arg(&entry.document)
            .query_async(conn)
            .await
            .map_err(|e| classify(&entry.partition, e))?;

        debug!(partition = %entry.partition, entry_id = %id, "XADD acknowledged");
        Ok(EntryId(id))
    }

    async fn append_group(
        &mut self,
        entries: &[LogEntry],
    ) -> Result<Vec<Result<EntryId, LogError>>, LogError> {
        if entries.is_empty() {
            return Ok(Vec::new());
        }

        let mut pipe = ::redis::pipe();
        for entry in entries {
            pipe.cmd("XADD")
                .arg(&entry.partition)
                .arg("*")
                .arg(&entry.field)
                .arg(&entry.document);
        }

        let conn = self.conn()?;
        // A failed reply fails the whole pipeline query, so per-entry outcomes
        // are only known on success.
        let ids: Vec<String> = pipe
            .query_async(conn)
            .await
            .map_err(|e| LogError::Transport(e.to_string()))?;

        debug!(entries = ids.len(), "Pipelined XADD group acknowledged");
        Ok(ids.into_iter().map(|id| Ok(EntryId(id))).collect())
    }

    async fn close(&mut self) -> Result<(), LogError> {
        // Dropping the manager releases its connection.
        if self.conn.take().is_some() {
            debug!("Redis connection released");
        }
        Ok(())
    }
}
