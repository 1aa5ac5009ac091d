//! Sink metrics.
//!
//! Each sink owns its own prometheus registry so several sinks can live in
//! one process. Hosts expose it via [`SinkMetrics::registry`] or render it
//! with [`SinkMetrics::render`].

use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

use crate::report::SkipReason;

/// Counters for one sink instance.
#[derive(Clone)]
pub struct SinkMetrics {
    registry: Registry,
    appended: IntCounter,
    skipped: IntCounterVec,
    routing_fallbacks: IntCounter,
    delivery_failures: IntCounter,
}

impl SinkMetrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let appended = IntCounter::new(
            "cdcsink_events_appended_total",
            "Change events durably appended to the log",
        )
        .expect("valid metric definition");
        let skipped = IntCounterVec::new(
            Opts::new(
                "cdcsink_events_skipped_total",
                "Change events left out of delivery",
            ),
            &["reason"],
        )
        .expect("valid metric definition");
        let routing_fallbacks = IntCounter::new(
            "cdcsink_routing_fallback_total",
            "Records routed to the unknown partition because metadata lacked a table",
        )
        .expect("valid metric definition");
        let delivery_failures = IntCounter::new(
            "cdcsink_delivery_failures_total",
            "Backend append or write-group failures",
        )
        .expect("valid metric definition");

        for collector in [
            Box::new(appended.clone()) as Box<dyn prometheus::core::Collector>,
            Box::new(skipped.clone()),
            Box::new(routing_fallbacks.clone()),
            Box::new(delivery_failures.clone()),
        ] {
            registry
                .register(collector)
                .expect("metric names are unique within a fresh registry");
        }

        Self {
            registry,
            appended,
            skipped,
            routing_fallbacks,
            delivery_failures,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub(crate) fn record_appended(&self, count: usize) {
        self.appended.inc_by(count as u64);
    }

    pub(crate) fn record_skipped(&self, reason: SkipReason) {
        self.skipped.with_label_values(&[reason.as_str()]).inc();
    }

    pub(crate) fn record_routing_fallback(&self) {
        self.routing_fallbacks.inc();
    }

    pub(crate) fn record_delivery_failure(&self) {
        self.delivery_failures.inc();
    }

    pub fn appended_total(&self) -> u64 {
        self.appended.get()
    }

    pub fn skipped_total(&self, reason: SkipReason) -> u64 {
        self.skipped.with_label_values(&[reason.as_str()]).get()
    }

    pub fn routing_fallbacks(&self) -> u64 {
        self.routing_fallbacks.get()
    }

    pub fn delivery_failures(&self) -> u64 {
        self.delivery_failures.get()
    }

    /// Render all counters in the text exposition format
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

impl Default for SinkMetrics {
    fn default() -> Self {
        Self::new()
    }
}
