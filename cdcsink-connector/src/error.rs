//! Sink error types.

use cdcsink_domain::Rejection;
use thiserror::Error;

use crate::report::BatchReport;

/// Errors surfaced by the event sink.
#[derive(Debug, Error)]
pub enum SinkError {
    /// Missing or malformed connect parameters
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Backend handshake failed
    #[error("Connection error: {0}")]
    Connection(String),

    /// Operation attempted before a successful connect
    #[error("Not connected")]
    NotConnected,

    /// Payload missing or without identity field
    #[error("Invalid event: {0}")]
    InvalidEvent(String),

    /// Operation outside INSERT/UPDATE/DELETE (skipped, never fatal)
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// Encoding the record failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Backend append or write-group failed
    ///
    /// `report` is present when the backend acknowledged entries
    /// individually; `None` means the outcome of every submitted entry is unknown.
    #[error("Delivery error: {message}")]
    Delivery {
        message: String,
        report: Option<BatchReport>,
    },
}

impl SinkError {
    /// Create a delivery error without per-record outcomes
    pub fn delivery(message: impl Into<String>) -> Self {
        Self::Delivery {
            message: message.into(),
            report: None,
        }
    }

    /// Errors that batch delivery absorbs per record
    pub fn is_skippable(&self) -> bool {
        matches!(self, SinkError::InvalidEvent(_) | SinkError::UnsupportedOperation(_))
    }
}

impl From<Rejection> for SinkError {
    fn from(rejection: Rejection) -> Self {
        match rejection {
            Rejection::Invalid(reason) => SinkError::InvalidEvent(reason),
            Rejection::Unsupported(operation) => SinkError::UnsupportedOperation(operation),
        }
    }
}

/// Result type for sink operations.
pub type SinkResult<T> = Result<T, SinkError>;
