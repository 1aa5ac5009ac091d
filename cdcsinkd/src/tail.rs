//! Line-oriented event ingestion.
//!
//! Each input line is one JSON-encoded change event. Lines are grouped into
//! chunks of `batch_size` and delivered with `append_batch`, followed by a
//! `commit`. Unparseable lines are logged and skipped; a delivery failure stops
//! ingestion so the upstream can replay from its own checkpoint.

use anyhow::Context;
use cdcsink_connector::EventSink;
use cdcsink_domain::ChangeEvent;
use cdcsink_log::LogBackend;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, info, warn};

/// Counters for one ingestion run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TailStats {
    /// Non-empty lines read
    pub lines: usize,
    /// Lines that were not valid change events
    pub parse_errors: usize,
    /// Batches delivered
    pub batches: usize,
    /// Events appended to the log
    pub appended: usize,
    /// Events skipped by the sink (invalid or unsupported)
    pub skipped: usize,
}

/// Read events from `input` until EOF and deliver them through `sink`.
///
/// The sink must already be connected. Lines are read as raw bytes, so a line
/// that is not valid UTF-8 counts as a parse error rather than a read failure.
/// On a read failure the events buffered so far are delivered before the error
/// is returned.
pub async fn tail<B, R>(
    sink: &mut EventSink<B>,
    mut input: R,
    batch_size: usize,
) -> anyhow::Result<TailStats>
where
    B: LogBackend,
    R: AsyncBufRead + Unpin,
{
    let batch_size = batch_size.max(1);
    let mut stats = TailStats::default();
    let mut batch: Vec<ChangeEvent> = Vec::with_capacity(batch_size);
    let mut buf = Vec::new();
    let mut line_no = 0usize;

    loop {
        buf.clear();
        let read = match input.read_until(b'\n', &mut buf).await {
            Ok(read) => read,
            Err(e) => {
                if !batch.is_empty() {
                    flush(sink, &mut batch, &mut stats).await?;
                }
                return Err(e).context("failed to read input");
            },
        };
        if read == 0 {
            break;
        }
        line_no += 1;

        let line = buf.trim_ascii();
        if line.is_empty() {
            continue;
        }
        stats.lines += 1;

        match serde_json::from_slice::<ChangeEvent>(line) {
            Ok(event) => batch.push(event),
            Err(e) => {
                warn!(line = line_no, error = %e, "Skipping unparseable change event");
                stats.parse_errors += 1;
                continue;
            },
        }

        if batch.len() >= batch_size {
            flush(sink, &mut batch, &mut stats).await?;
        }
    }

    if !batch.is_empty() {
        flush(sink, &mut batch, &mut stats).await?;
    }

    info!(
        lines = stats.lines,
        batches = stats.batches,
        appended = stats.appended,
        skipped = stats.skipped,
        parse_errors = stats.parse_errors,
        "Input exhausted"
    );
    Ok(stats)
}

async fn flush<B: LogBackend>(
    sink: &mut EventSink<B>,
    batch: &mut Vec<ChangeEvent>,
    stats: &mut TailStats,
) -> anyhow::Result<()> {
    let report = sink
        .append_batch(batch)
        .await
        .with_context(|| format!("failed to deliver batch of {} events", batch.len()))?;
    sink.commit().await?;

    stats.batches += 1;
    stats.appended += report.appended();
    stats.skipped += report.skipped();
    debug!(
        events = batch.len(),
        appended = report.appended(),
        "Batch delivered"
    );

    batch.clear();
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
