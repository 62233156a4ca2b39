//! Order policy trait and implementations
//!
//! An `OrderPolicy` decides, per sequence level, whether the differ compares
//! items positionally (LCS alignment) or as a multiset (greedy + weighted
//! matching). It is consulted once for every sequence level scored, drill or
//! not.

use regex::Regex;

use crate::errors::{ExError, ExErrorKind, Result};
use crate::model::Level;

/// Policy deciding whether a sequence level ignores item order
///
/// Implemented for any `Fn(&Level, bool) -> bool` closure, so ad-hoc
/// policies don't need a named type.
pub trait OrderPolicy: Send + Sync {
    /// # Arguments
    /// * `level` - the sequence level about to be compared
    /// * `drill` - whether the comparison is a speculative probe
    ///
    /// # Returns
    /// * `true` - compare as an unordered collection
    /// * `false` - compare with order preserved
    fn ignore_order(&self, level: &Level<'_>, drill: bool) -> bool;
}

impl<F> OrderPolicy for F
where
    F: Fn(&Level<'_>, bool) -> bool + Send + Sync,
{
    fn ignore_order(&self, level: &Level<'_>, drill: bool) -> bool {
        self(level, drill)
    }
}

/// Policy that preserves order everywhere (the default)
///
/// # Example
/// ```
/// use jsondelta_core::model::Level;
/// use jsondelta_core::policy::{OrderPolicy, PreserveOrder};
/// use serde_json::json;
///
/// let (l, r) = (json!([1, 2]), json!([2, 1]));
/// assert!(!PreserveOrder.ignore_order(&Level::root(&l, &r), false));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct PreserveOrder;

impl OrderPolicy for PreserveOrder {
    fn ignore_order(&self, _level: &Level<'_>, _drill: bool) -> bool {
        false
    }
}

/// Policy ignoring order for sequences whose effective path matches any
/// of a set of patterns
///
/// Patterns are searched, not anchored: `^v$` matches only the top-level
/// key `v`, while `v` matches any path containing it.
///
/// # Example
/// ```
/// use jsondelta_core::model::{Level, Path};
/// use jsondelta_core::policy::{OrderPolicy, PatternOrderPolicy};
/// use serde_json::json;
///
/// let policy = PatternOrderPolicy::new(["^set$"]).unwrap();
/// let (l, r) = (json!([1, 2]), json!([2, 1]));
/// let at = |key: &str| Path::root().child_key(key);
///
/// assert!(policy.ignore_order(&Level::new(&l, &r, at("set"), at("set")), false));
/// assert!(!policy.ignore_order(&Level::new(&l, &r, at("list"), at("list")), false));
/// ```
#[derive(Debug, Clone, Default)]
pub struct PatternOrderPolicy {
    patterns: Vec<Regex>,
}

impl PatternOrderPolicy {
    /// Compile a policy from pattern sources
    ///
    /// # Errors
    ///
    /// - `InvalidPattern` if any pattern fails to compile
    pub fn new<I, S>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|p| compile(p.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(Regex::as_str)
    }
}

impl OrderPolicy for PatternOrderPolicy {
    fn ignore_order(&self, level: &Level<'_>, _drill: bool) -> bool {
        let path = level.effective_path();
        self.patterns.iter().any(|p| p.is_match(&path))
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| {
        ExError::new(ExErrorKind::InvalidPattern)
            .with_op("compile_order_pattern")
            .with_message(format!("invalid path pattern `{}`: {}", pattern, e))
    })
}
