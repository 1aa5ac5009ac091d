//! cdcsink Daemon
//!
//! Reads newline-delimited JSON change events from stdin and appends them to
//! per-table Redis streams.
//!
//! # Usage
//!
//! ```bash
//! CDCSINK_HOST=localhost CDCSINK_PORT=6379 cdcsinkd < events.jsonl
//!
//! # Parse and route without a Redis server
//! CDCSINK_DRY_RUN=1 CDCSINK_HOST=localhost CDCSINK_PORT=6379 cdcsinkd < events.jsonl
//! ```
//!
//! # Environment Variables
//!
//! - `CDCSINK_HOST`, `CDCSINK_PORT`: Redis endpoint (required)
//! - `CDCSINK_PASSWORD`: Redis password
//! - `CDCSINK_STREAM_NAME`: partition prefix (default: gluesync_events)
//! - `CDCSINK_BATCH_SIZE`: events per pipelined write (default: 100)
//! - `CDCSINK_SSL_ENABLED`: connect over TLS (default: false)
//! - `CDCSINK_DRY_RUN`: use an in-memory log instead of Redis

use cdcsink_connector::{EventSink, SinkConfig};
use cdcsink_log::{LogBackend, MemoryLog, RedisLog};
use std::env;
use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::from_default_env()
                .add_directive("cdcsinkd=info".parse()?)
                .add_directive("cdcsink_connector=info".parse()?),
        )
        .init();

    // Load configuration
    let config = SinkConfig::from_env()?;
    let dry_run = env::var("CDCSINK_DRY_RUN")
        .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        host = %config.host,
        port = config.port,
        stream = %config.stream_name,
        batch_size = config.batch_size,
        dry_run,
        "cdcsink daemon"
    );

    if dry_run {
        run(EventSink::new(MemoryLog::new()), config).await
    } else {
        run(EventSink::new(RedisLog::new()), config).await
    }
}

async fn run<B: LogBackend>(mut sink: EventSink<B>, config: SinkConfig) -> anyhow::Result<()> {
    let batch_size = config.batch_size;
    sink.connect(config).await?;

    let result = cdcsinkd::tail(&mut sink, BufReader::new(tokio::io::stdin()), batch_size).await;
    sink.disconnect().await?;

    info!(metrics = %sink.metrics().render()?, "Final metrics");
    result.map(|_| ())
}
