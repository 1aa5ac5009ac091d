//! cdcsink Connector
//!
//! CDC sink that appends change events to a partitioned append-only log.
//!
//! # Architecture
//!
//! ```text
//! Connector framework → SinkConnector → EventSink → LogSession → log backend
//!                                          ↓
//!                              normalize → route → encode
//! ```
//!
//! # Components
//!
//! - **EventSink**: connection state machine, single and batched delivery
//! - **SinkConnector**: the framework's five lifecycle hooks
//! - **SinkConfig**: option-map and environment configuration
//! - **BatchReport**: per-event outcome of a delivery
//! - **SinkMetrics**: per-sink prometheus counters
//!
//! # Example
//!
//! ```rust
//! use cdcsink_connector::{EventSink, SinkConfig};
//! use cdcsink_domain::{ChangeEvent, Operation};
//! use cdcsink_log::MemoryLog;
//! use serde_json::json;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let log = MemoryLog::new();
//! let mut sink = EventSink::new(log.clone());
//! sink.connect(SinkConfig::new("localhost", 6379)).await?;
//!
//! let event = ChangeEvent::new(Operation::Insert)
//!     .with_after(json!({"id": 1}).as_object().cloned().unwrap())
//!     .with_table("orders");
//! sink.append_one(&event).await?;
//!
//! assert_eq!(log.entries("gluesync_events:orders").len(), 1);
//! sink.disconnect().await?;
//! # Ok(())
//! # }
//! ```

#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod lifecycle;
pub mod metrics;
pub mod report;
pub mod sink;

// Re-exports for convenience
pub use config::{
    ConnectorOptions, SinkConfig, DEFAULT_BATCH_SIZE, DEFAULT_KEY_PREFIX, DEFAULT_STREAM_NAME,
};
pub use error::{SinkError, SinkResult};
pub use lifecycle::SinkConnector;
pub use metrics::SinkMetrics;
pub use report::{BatchReport, RecordOutcome, SkipReason};
pub use sink::{ConnectionState, EventSink};
