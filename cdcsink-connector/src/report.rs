//! Per-record delivery outcomes.

use cdcsink_domain::PartitionKey;
use cdcsink_log::EntryId;

/// Why an event was left out of delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    InvalidEvent,
    UnsupportedOperation,
}

impl SkipReason {
    /// Metric label
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::InvalidEvent => "invalid_event",
            SkipReason::UnsupportedOperation => "unsupported_operation",
        }
    }
}

/// What happened to one input event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    /// Durably appended
    Appended {
        partition: PartitionKey,
        entry_id: EntryId,
    },

    /// Not submitted to the backend
    Skipped { reason: SkipReason, detail: String },

    /// Submitted and rejected by the backend
    Failed { partition: PartitionKey, error: String },
}

impl RecordOutcome {
    pub fn is_appended(&self) -> bool {
        matches!(self, RecordOutcome::Appended { .. })
    }

    pub fn entry_id(&self) -> Option<&EntryId> {
        match self {
            RecordOutcome::Appended { entry_id, .. } => Some(entry_id),
            _ => None,
        }
    }
}

/// Outcome of a batch, one entry per input event in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    outcomes: Vec<RecordOutcome>,
}

impl BatchReport {
    pub fn new(outcomes: Vec<RecordOutcome>) -> Self {
        Self { outcomes }
    }

    pub fn outcomes(&self) -> &[RecordOutcome] {
        &self.outcomes
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn appended(&self) -> usize {
        self.count(|o| matches!(o, RecordOutcome::Appended { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, RecordOutcome::Skipped { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, RecordOutcome::Failed { .. }))
    }

    fn count(&self, predicate: impl Fn(&RecordOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|o| predicate(o)).count()
    }
}
