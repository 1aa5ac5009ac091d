//! cdcsink Daemon Library
//!
//! Feeds newline-delimited JSON change events into an [`EventSink`].
//!
//! # Example
//!
//! ```rust,ignore
//! use cdcsink_connector::{EventSink, SinkConfig};
//! use cdcsink_log::RedisLog;
//! use tokio::io::BufReader;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = SinkConfig::from_env()?;
//!     let mut sink = EventSink::new(RedisLog::new());
//!     sink.connect(config.clone()).await?;
//!     cdcsinkd::tail(&mut sink, BufReader::new(tokio::io::stdin()), config.batch_size).await?;
//!     Ok(())
//! }
//! ```
//!
//! [`EventSink`]: cdcsink_connector::EventSink

#![warn(clippy::all)]

pub mod tail;

pub use tail::{tail, TailStats};
