//! cdcsink Log Backends
//!
//! Append-only, partitioned log storage behind two ports:
//!
//! - **[`LogBackend`]**: opens sessions (connection handshake)
//! - **[`LogSession`]**: appends entries, singly or as a pipelined group
//!
//! # Implementations
//!
//! - **In-memory log**: shared, inspectable, with failure injection (tests, dry runs)
//! - **Redis Streams**: production backend (feature `redis`), one stream per partition
//!
//! The backend owns entry ordering and IDs; callers never assign either.

#![warn(clippy::all)]

mod backend;
mod error;
mod memory;
#[cfg(feature = "redis")]
mod redis_stream;

pub use backend::{Endpoint, EntryId, LogBackend, LogEntry, LogSession};
pub use error::LogError;
pub use memory::{MemoryLog, MemorySession, StoredEntry};
#[cfg(feature = "redis")]
pub use redis_stream::{RedisLog, RedisSession};
