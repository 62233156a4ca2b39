use serde_json::{Map, Value};
use std::collections::BTreeMap;

use super::level::Level;

/// Path correspondence between differing left/right locations (visual aid only)
pub const EVENT_PAIR: &str = "just4vis:pairs";
/// Mapping key present only on the left
pub const EVENT_DICT_REMOVE: &str = "dict:remove";
/// Mapping key present only on the right
pub const EVENT_DICT_ADD: &str = "dict:add";
/// Sequence item with no counterpart on the right
pub const EVENT_LIST_REMOVE: &str = "list:remove";
/// Sequence item with no counterpart on the left
pub const EVENT_LIST_ADD: &str = "list:add";
/// Primitive value differs between sides
pub const EVENT_VALUE_CHANGES: &str = "value_changes";

/// A discovered difference or correspondence
#[derive(Debug, Clone)]
pub struct Record<'a> {
    pub event: String,
    pub level: Level<'a>,
    pub extra: Map<String, Value>,
}

impl Record<'_> {
    /// Level fields followed by event-specific extras
    pub fn to_json(&self) -> Value {
        let mut map = self.level.to_json();
        for (key, value) in &self.extra {
            map.insert(key.clone(), value.clone());
        }
        Value::Object(map)
    }
}

/// Append-only store of records grouped by event tag
///
/// The pair group always exists so exports carry it even when empty.
#[derive(Debug, Clone)]
pub struct RecordStore<'a> {
    groups: BTreeMap<String, Vec<Record<'a>>>,
}

impl<'a> RecordStore<'a> {
    pub fn new() -> Self {
        let mut groups = BTreeMap::new();
        groups.insert(EVENT_PAIR.to_string(), Vec::new());
        Self { groups }
    }

    pub fn push(&mut self, event: &str, level: Level<'a>, extra: Map<String, Value>) {
        self.groups.entry(event.to_string()).or_default().push(Record {
            event: event.to_string(),
            level,
            extra,
        });
    }

    /// Records for one tag, in discovery order
    pub fn get(&self, event: &str) -> &[Record<'a>] {
        self.groups.get(event).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Total number of records across every group
    pub fn len(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop everything, back to the freshly constructed state
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Export grouped by tag (tags in lexicographic order)
    pub fn to_map(&self, exclude_pairs: bool) -> BTreeMap<String, Vec<Value>> {
        self.groups
            .iter()
            .filter(|(event, _)| !(exclude_pairs && event.as_str() == EVENT_PAIR))
            .map(|(event, records)| {
                (
                    event.clone(),
                    records.iter().map(Record::to_json).collect(),
                )
            })
            .collect()
    }
}

impl Default for RecordStore<'_> {
    fn default() -> Self {
        Self::new()
    }
}
