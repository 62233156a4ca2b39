//! Comparison model: value slots, paths, levels and records.
//!
//! Values themselves are plain `serde_json::Value` trees; the engine
//! borrows them for the lifetime of a run.

pub mod level;
pub mod path;
pub mod record;

pub use level::{slot_to_json, Level, OverrideScorer, Slot, ValueKind, ABSENT_MARKER};
pub use path::{Path, Segment, PATH_SEPARATOR};
pub use record::{
    Record, RecordStore, EVENT_DICT_ADD, EVENT_DICT_REMOVE, EVENT_LIST_ADD, EVENT_LIST_REMOVE,
    EVENT_PAIR, EVENT_VALUE_CHANGES,
};
