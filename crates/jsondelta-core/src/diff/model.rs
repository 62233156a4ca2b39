//! Diff output types.
//!
//! Collections use `BTreeMap` so serialized output is deterministic.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::model::EVENT_PAIR;

/// Result of one run, detached from the compared documents
///
/// `records` maps each event tag to its records in discovery order; each
/// record is an object with `left`, `right`, `left_path`, `right_path` and
/// the event's extra fields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiffOutcome {
    /// True iff the root score is exactly 1
    pub equal: bool,
    /// Root similarity in `[0, 1]`
    pub score: f64,
    /// Exported records grouped by event tag
    pub records: BTreeMap<String, Vec<Value>>,
}

impl DiffOutcome {
    /// Records under one tag (empty when the tag never fired)
    pub fn records_for(&self, event: &str) -> &[Value] {
        self.records.get(event).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of records across every tag except path correspondences
    pub fn change_count(&self) -> usize {
        self.records
            .iter()
            .filter(|(event, _)| event.as_str() != EVENT_PAIR)
            .map(|(_, records)| records.len())
            .sum()
    }
}
