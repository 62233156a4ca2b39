use serde_json::Value;

use super::path::Path;

/// One side of a level: a borrowed value, or `None` when the side is absent
pub type Slot<'a> = Option<&'a Value>;

/// Marker an absent side serializes to in exported records
pub const ABSENT_MARKER: &str = "__NON_EXIST__";

/// Value kinds the engine dispatches on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Absent,
    Null,
    Bool,
    Number,
    String,
    Sequence,
    Mapping,
}

impl ValueKind {
    pub fn of(slot: Slot<'_>) -> Self {
        match slot {
            None => ValueKind::Absent,
            Some(Value::Null) => ValueKind::Null,
            Some(Value::Bool(_)) => ValueKind::Bool,
            Some(Value::Number(_)) => ValueKind::Number,
            Some(Value::String(_)) => ValueKind::String,
            Some(Value::Array(_)) => ValueKind::Sequence,
            Some(Value::Object(_)) => ValueKind::Mapping,
        }
    }
}

/// Scorer attached to synthetic levels for keys present on one side only
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverrideScorer {
    /// Key exists only on the left
    KeyRemoved,
    /// Key exists only on the right
    KeyAdded,
}

/// One comparison unit
///
/// Levels are built by the engine for every pair it scores, including
/// synthetic levels for unmatched items. They are never mutated after
/// construction.
#[derive(Debug, Clone)]
pub struct Level<'a> {
    pub left: Slot<'a>,
    pub right: Slot<'a>,
    pub left_path: Path,
    pub right_path: Path,
    pub scorer: Option<OverrideScorer>,
}

impl<'a> Level<'a> {
    /// Level for two present values
    pub fn new(left: &'a Value, right: &'a Value, left_path: Path, right_path: Path) -> Self {
        Self {
            left: Some(left),
            right: Some(right),
            left_path,
            right_path,
            scorer: None,
        }
    }

    /// Root level of a run
    pub fn root(left: &'a Value, right: &'a Value) -> Self {
        Self::new(left, right, Path::root(), Path::root())
    }

    /// Level for a value present only on the left
    pub fn left_only(left: &'a Value, left_path: Path) -> Self {
        Self {
            left: Some(left),
            right: None,
            left_path,
            right_path: Path::root(),
            scorer: None,
        }
    }

    /// Level for a value present only on the right
    pub fn right_only(right: &'a Value, right_path: Path) -> Self {
        Self {
            left: None,
            right: Some(right),
            left_path: Path::root(),
            right_path,
            scorer: None,
        }
    }

    pub fn with_scorer(mut self, scorer: OverrideScorer) -> Self {
        self.scorer = Some(scorer);
        self
    }

    /// Path operators and order rules are matched against: the left path
    /// when the left side exists, else the right path
    pub fn effective_path(&self) -> String {
        if self.left.is_some() {
            self.left_path.render()
        } else {
            self.right_path.render()
        }
    }

    /// True when both rendered paths are identical
    pub fn paths_agree(&self) -> bool {
        self.left_path == self.right_path || self.left_path.render() == self.right_path.render()
    }

    /// Export shape shared by every record: both values and both paths
    pub fn to_json(&self) -> serde_json::Map<String, Value> {
        let mut map = serde_json::Map::new();
        map.insert("left".to_string(), slot_to_json(self.left));
        map.insert("right".to_string(), slot_to_json(self.right));
        map.insert(
            "left_path".to_string(),
            Value::String(self.left_path.render()),
        );
        map.insert(
            "right_path".to_string(),
            Value::String(self.right_path.render()),
        );
        map
    }
}

/// Serialize a slot, mapping an absent side to [`ABSENT_MARKER`]
pub fn slot_to_json(slot: Slot<'_>) -> Value {
    match slot {
        Some(value) => value.clone(),
        None => Value::String(ABSENT_MARKER.to_string()),
    }
}
