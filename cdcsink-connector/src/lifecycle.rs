//! Connector framework lifecycle.
//!
//! The surrounding connector framework drives a sink through five fixed
//! hooks. [`EventSink`] implements them on top of its typed API.

use async_trait::async_trait;
use cdcsink_domain::ChangeEvent;
use cdcsink_log::LogBackend;

use crate::config::{ConnectorOptions, SinkConfig};
use crate::error::SinkResult;
use crate::sink::EventSink;

/// Hooks the connector framework calls, in order:
/// `connect` → (`write` | `batch_write`)* → `commit`* → `disconnect`.
#[async_trait]
pub trait SinkConnector: Send {
    /// Validate options and connect to the backend.
    async fn connect(&mut self, options: &ConnectorOptions) -> SinkResult<()>;

    /// Deliver one event.
    async fn write(&mut self, event: &ChangeEvent) -> SinkResult<()>;

    /// Deliver a batch of events.
    async fn batch_write(&mut self, events: &[ChangeEvent]) -> SinkResult<()>;

    /// Acknowledge delivered events.
    async fn commit(&mut self) -> SinkResult<()>;

    /// Release the backend connection.
    async fn disconnect(&mut self) -> SinkResult<()>;
}

#[async_trait]
impl<B: LogBackend> SinkConnector for EventSink<B> {
    async fn connect(&mut self, options: &ConnectorOptions) -> SinkResult<()> {
        let config = SinkConfig::from_options(options)?;
        EventSink::connect(self, config).await
    }

    async fn write(&mut self, event: &ChangeEvent) -> SinkResult<()> {
        self.append_one(event).await.map(|_| ())
    }

    async fn batch_write(&mut self, events: &[ChangeEvent]) -> SinkResult<()> {
        self.append_batch(events).await.map(|_| ())
    }

    async fn commit(&mut self) -> SinkResult<()> {
        EventSink::commit(self).await
    }

    async fn disconnect(&mut self) -> SinkResult<()> {
        EventSink::disconnect(self).await
    }
}
