//! Operator registry: name to constructor.
//!
//! Built once at startup, read-only afterwards. The process-wide instance
//! returned by [`global_registry`] holds the built-ins and is safe to share
//! between concurrent runs.

use regex::Regex;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

use super::builtin::{
    self, ExpectChangeOperator, ExpectExistOperator, FloatInRangeOperator,
    MatchWithFieldOperator, EXPECT_CHANGE, EXPECT_EXIST, FLOAT_IN_RANGE, IGNORE, MATCH_WITH_FIELD,
};
use super::Operator;
use crate::errors::{ExError, ExErrorKind, Result};

/// Constructor taking the path pattern and the rule's parameter object
pub type OperatorFactory = fn(&str, &Map<String, Value>) -> Result<Box<dyn Operator>>;

/// Built-in operators and every name they register under
pub const BUILTIN_OPERATORS: &[(&str, OperatorFactory)] = &[
    (MATCH_WITH_FIELD, MatchWithFieldOperator::build),
    (EXPECT_CHANGE, ExpectChangeOperator::build),
    (EXPECT_EXIST, ExpectExistOperator::build),
    (FLOAT_IN_RANGE, FloatInRangeOperator::build),
    (IGNORE, builtin::build_ignore),
    ("diff_word", builtin::build_diff_word),
    ("diff_image", builtin::build_diff_image),
    ("diff_pdf", builtin::build_diff_pdf),
];

#[derive(Clone, Default)]
pub struct OperatorRegistry {
    factories: BTreeMap<String, OperatorFactory>,
}

impl fmt::Debug for OperatorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.factories.keys()).finish()
    }
}

impl OperatorRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every built-in operator
    pub fn builtins() -> Self {
        let factories = BUILTIN_OPERATORS
            .iter()
            .map(|(name, factory)| (name.to_string(), *factory))
            .collect();
        Self { factories }
    }

    /// Add a constructor under `name`
    ///
    /// # Errors
    ///
    /// - `DuplicateOperator` if `name` is already registered
    pub fn register(&mut self, name: &str, factory: OperatorFactory) -> Result<()> {
        if self.factories.contains_key(name) {
            return Err(ExError::new(ExErrorKind::DuplicateOperator)
                .with_op("register_operator")
                .with_operator(name)
                .with_message(format!("duplicate operator name: {}", name)));
        }
        self.factories.insert(name.to_string(), factory);
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    /// Construct the operator registered as `name`
    ///
    /// # Errors
    ///
    /// - `UnknownOperator` if nothing is registered under `name`
    /// - whatever the constructor reports (`InvalidPattern`,
    ///   `InvalidRuleParameter`)
    pub fn build(
        &self,
        name: &str,
        pattern: &str,
        params: &Map<String, Value>,
    ) -> Result<Box<dyn Operator>> {
        let factory = self.factories.get(name).ok_or_else(|| {
            ExError::new(ExErrorKind::UnknownOperator)
                .with_op("build_operator")
                .with_operator(name)
                .with_message(format!("unknown operation [{}]", name))
        })?;
        factory(pattern, params).map_err(|e| {
            if e.operator().is_some() {
                e
            } else {
                e.with_operator(name)
            }
        })
    }
}

/// Compile an operator path pattern
///
/// # Errors
///
/// - `InvalidPattern` if the regex does not compile
pub fn compile_pattern(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| {
        ExError::new(ExErrorKind::InvalidPattern)
            .with_op("compile_pattern")
            .with_message(format!("invalid path pattern `{}`: {}", pattern, e))
    })
}

static GLOBAL_REGISTRY: OnceLock<OperatorRegistry> = OnceLock::new();

/// The shared registry preloaded with the built-ins
pub fn global_registry() -> &'static OperatorRegistry {
    GLOBAL_REGISTRY.get_or_init(OperatorRegistry::builtins)
}
