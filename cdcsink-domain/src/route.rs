//! Partition routing.
//!
//! Every source table gets its own log partition, named
//! `{stream_name}:{table}`. Events without a table land in the `unknown`
//! partition instead of failing; callers see that through [`Route::fallback`].

use serde_json::Value;
use std::fmt;

use crate::event::Metadata;

/// Table name used when `metadata["table"]` is missing.
pub const UNKNOWN_TABLE: &str = "unknown";

/// Name of a log partition (`{stream_name}:{table}`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PartitionKey(String);

impl PartitionKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PartitionKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Result of routing one record.
///
/// A `table` of `null` counts as absent and routes to [`UNKNOWN_TABLE`]
/// rather than to a partition named after the null value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub key: PartitionKey,
    /// True when the table was missing or null and [`UNKNOWN_TABLE`] was used
    pub fallback: bool,
}

/// Derives partition keys from event metadata.
#[derive(Debug, Clone)]
pub struct Router {
    stream_name: String,
}

impl Router {
    pub fn new(stream_name: impl Into<String>) -> Self {
        Self {
            stream_name: stream_name.into(),
        }
    }

    /// Compute the partition for a record's metadata. Never fails.
    pub fn route(&self, metadata: &Metadata) -> Route {
        let (table, fallback) = match metadata.get("table") {
            None | Some(Value::Null) => (UNKNOWN_TABLE.to_string(), true),
            Some(Value::String(table)) => (table.clone(), false),
            Some(other) => (other.to_string(), false),
        };

        Route {
            key: PartitionKey(format!("{}:{}", self.stream_name, table)),
            fallback,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
