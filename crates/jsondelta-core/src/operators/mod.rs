//! Pluggable comparison operators.
//!
//! An operator pairs a compiled path pattern with a comparison rule. The
//! differ asks every configured operator, in order, whether its pattern
//! matches the level's effective path; a matching operator either handles
//! the level with a fixed score or defers to the next operator and finally
//! to the generic comparison.
//!
//! Operators record through the differ, and only when `drill` is false.
//! Every built-in record carries the operator's `path_regex`.

use regex::Regex;
use serde_json::{Map, Value};
use std::fmt;

use crate::diff::engine::Differ;
use crate::errors::Result;
use crate::model::Level;

pub mod builtin;
pub mod registry;

pub use builtin::{
    ExpectChangeOperator, ExpectExistOperator, FloatInRangeOperator, IgnoreOperator,
    MatchWithFieldOperator,
};
pub use registry::{global_registry, OperatorFactory, OperatorRegistry};

/// Result of applying an operator to a level
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Outcome {
    /// The operator decided the level's score
    Handled(f64),
    /// Fall through to the next operator, then the generic comparison
    Defer,
}

/// A path-scoped comparison rule
pub trait Operator: Send + Sync + fmt::Debug {
    /// Registry name the operator was built under
    fn name(&self) -> &str;

    /// Compiled path pattern
    fn pattern(&self) -> &Regex;

    /// Whether this operator applies to `level`
    ///
    /// The pattern is searched (not anchored) in the effective path.
    fn matches(&self, level: &Level<'_>) -> bool {
        self.pattern().is_match(&level.effective_path())
    }

    /// Evaluate `level`
    ///
    /// # Errors
    ///
    /// Implementations return `OperatorFailed` (typically via
    /// [`crate::errors::OperatorError`]) for faults; the differ wraps them
    /// with the level's context.
    fn apply<'a>(&self, level: &Level<'a>, differ: &mut Differ<'a>, drill: bool) -> Result<Outcome>;
}

/// Base extra fields shared by operator records
pub fn record_fields(pattern: &Regex) -> Map<String, Value> {
    let mut extra = Map::new();
    extra.insert(
        "path_regex".to_string(),
        Value::String(pattern.as_str().to_string()),
    );
    extra
}
