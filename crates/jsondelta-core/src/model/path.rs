use serde::{Deserialize, Serialize};
use std::fmt;

/// Separator placed between rendered path segments
pub const PATH_SEPARATOR: &str = "->";

/// One step into a value tree
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Segment {
    /// Field of a mapping
    Key(String),
    /// Position in a sequence
    Index(usize),
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Key(key) => write!(f, "{}", key),
            Segment::Index(index) => write!(f, "[{}]", index),
        }
    }
}

/// Ordered segment sequence locating a node in one of the two input trees
///
/// The canonical rendering joins segments with `->` and brackets indices,
/// e.g. `a->[3]->b`. The root path renders as the empty string; so does
/// the path of an absent side.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Path {
    segments: Vec<Segment>,
}

impl Path {
    /// The root path (no segments)
    pub fn root() -> Self {
        Self::default()
    }

    /// This path extended with a mapping key
    pub fn child_key(&self, key: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(Segment::Key(key.to_string()));
        Self { segments }
    }

    /// This path extended with a sequence index
    pub fn child_index(&self, index: usize) -> Self {
        let mut segments = self.segments.clone();
        segments.push(Segment::Index(index));
        Self { segments }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Canonical string key used for identity, caching and reporting
    pub fn render(&self) -> String {
        self.segments
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
            .join(PATH_SEPARATOR)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}
