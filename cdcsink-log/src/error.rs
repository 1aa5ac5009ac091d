//! Log backend errors

use thiserror::Error;

/// Errors raised by log backends
#[derive(Debug, Error)]
pub enum LogError {
    /// Handshake with the backend failed
    #[error("Connection error: {0}")]
    Connection(String),

    /// The backend rejected an append
    #[error("Append to {partition} failed: {message}")]
    Append {
        /// Partition the entry was addressed to
        partition: String,
        /// Backend error message
        message: String,
    },

    /// Request/response exchange failed; outcome of the request is unknown
    #[error("Transport error: {0}")]
    Transport(String),

    /// Session used after close
    #[error("Session closed")]
    Closed,
}

impl LogError {
    /// Create an append error
    pub fn append(partition: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Append {
            partition: partition.into(),
            message: message.into(),
        }
    }
}
