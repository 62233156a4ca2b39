//! Rule loading.
//!
//! A rule list names operators by registry name and scopes each to a path
//! pattern. The special operation [`IGNORE_ORDER_OPERATION`] carries no
//! operator; its patterns select the sequences compared without regard to
//! order.
//!
//! ```json
//! [
//!   {"operation": "operator:list:ignoreOrder", "value": "^items$"},
//!   {"operation": "operator:list:matchWithField", "value": "^items->\\[\\d+\\]$",
//!    "parameter": {"field": "id"}},
//!   {"operation": "ignore", "value": "^updated_at$"}
//! ]
//! ```

#![allow(clippy::result_large_err)]

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Instant;

use crate::diff::{DiffOutcome, Differ, DifferOptions};
use crate::errors::{ExError, ExErrorKind, Result};
use crate::operators::{global_registry, Operator, OperatorRegistry};
use crate::policy::{OrderPolicy, PatternOrderPolicy};
use crate::{log_op_end, log_op_error, log_op_start};

/// Operation name marking order-agnostic sequence paths
pub const IGNORE_ORDER_OPERATION: &str = "operator:list:ignoreOrder";

/// One configured rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    /// Registry name of the operator, or [`IGNORE_ORDER_OPERATION`]
    pub operation: String,
    /// Path pattern the rule applies to
    pub value: String,
    /// Operator parameters; absent or null means none
    #[serde(default)]
    pub parameter: Option<Map<String, Value>>,
}

impl Rule {
    pub fn new(operation: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            value: value.into(),
            parameter: None,
        }
    }

    pub fn with_parameter(mut self, name: impl Into<String>, value: Value) -> Self {
        self.parameter
            .get_or_insert_with(Map::new)
            .insert(name.into(), value);
        self
    }
}

/// Parse a JSON rule list
///
/// # Errors
///
/// - `InvalidInput` if the bytes are not a JSON array of rule objects
pub fn parse_rules(bytes: &[u8]) -> Result<Vec<Rule>> {
    serde_json::from_slice(bytes).map_err(|e| {
        ExError::new(ExErrorKind::InvalidInput)
            .with_op("parse_rules")
            .with_message(format!("rules are not a valid rule list: {}", e))
    })
}

/// Operators and order patterns built from a rule list
///
/// Immutable once built; clones share the same operators.
#[derive(Clone)]
pub struct RuleSet {
    operators: Arc<[Box<dyn Operator>]>,
    order_policy: Arc<PatternOrderPolicy>,
}

impl RuleSet {
    /// Build every rule through `registry`, preserving rule order
    ///
    /// # Errors
    ///
    /// - `UnknownOperator` for an operation the registry does not know
    /// - `InvalidPattern` for a pattern that does not compile
    /// - `InvalidRuleParameter` for missing or mistyped parameters
    pub fn from_rules(registry: &OperatorRegistry, rules: &[Rule]) -> Result<Self> {
        let start = Instant::now();
        log_op_start!("load_rules", rule_count = rules.len() as u64);

        match Self::build(registry, rules) {
            Ok(rule_set) => {
                log_op_end!(
                    "load_rules",
                    duration_ms = start.elapsed().as_millis() as u64,
                    operator_count = rule_set.operators.len() as u64
                );
                Ok(rule_set)
            }
            Err(err) => {
                log_op_error!(
                    "load_rules",
                    err.clone(),
                    duration_ms = start.elapsed().as_millis() as u64
                );
                Err(err)
            }
        }
    }

    fn build(registry: &OperatorRegistry, rules: &[Rule]) -> Result<Self> {
        let empty = Map::new();
        let mut operators = Vec::new();
        let mut order_patterns = Vec::new();

        for rule in rules {
            if rule.operation == IGNORE_ORDER_OPERATION {
                order_patterns.push(rule.value.as_str());
                continue;
            }
            let params = rule.parameter.as_ref().unwrap_or(&empty);
            operators.push(registry.build(&rule.operation, &rule.value, params)?);
        }

        Ok(Self {
            operators: Arc::from(operators),
            order_policy: Arc::new(PatternOrderPolicy::new(order_patterns)?),
        })
    }

    pub fn operators(&self) -> Arc<[Box<dyn Operator>]> {
        Arc::clone(&self.operators)
    }

    pub fn order_policy(&self) -> Arc<dyn OrderPolicy> {
        self.order_policy.clone()
    }

    pub fn operator_names(&self) -> Vec<&str> {
        self.operators.iter().map(|op| op.name()).collect()
    }

    pub fn ignore_order_patterns(&self) -> Vec<&str> {
        self.order_policy.patterns().collect()
    }
}

impl std::fmt::Debug for RuleSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleSet")
            .field("operators", &self.operators)
            .field("order_policy", &self.order_policy)
            .finish()
    }
}

/// Diff two documents under a rule list, using the built-in registry
///
/// # Example
/// ```
/// use jsondelta_core::{diff_with_rules, DifferOptions, Rule};
/// use serde_json::json;
///
/// let rules = vec![Rule::new("operator:list:ignoreOrder", "^v$")];
/// let outcome = diff_with_rules(
///     &json!({"v": [1, 2, 3]}),
///     &json!({"v": [3, 2, 1]}),
///     &rules,
///     DifferOptions::default(),
/// )?;
/// assert!(outcome.equal);
/// # Ok::<(), jsondelta_core::ExError>(())
/// ```
///
/// # Errors
///
/// - configuration errors from [`RuleSet::from_rules`], before any comparison
/// - `ComparisonFailed` if scoring faults
pub fn diff_with_rules(
    left: &Value,
    right: &Value,
    rules: &[Rule],
    options: DifferOptions,
) -> Result<DiffOutcome> {
    let rule_set = RuleSet::from_rules(global_registry(), rules)?;
    let mut differ = Differ::new(left, right)
        .with_rule_set(&rule_set)
        .with_options(options);
    differ.diff()?;
    differ.outcome(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_rules_with_null_and_missing_parameter() {
        let rules = parse_rules(
            br#"[
                {"operation": "ignore", "value": "^a$", "parameter": null},
                {"operation": "operator:list:ignoreOrder", "value": "^b$"},
                {"operation": "operator:floatInRange", "value": "c",
                 "parameter": {"interval_start": 0, "interval_end": 2}}
            ]"#,
        )
        .unwrap();
        assert_eq!(rules.len(), 3);
        assert_eq!(rules[0].parameter, None);
        assert_eq!(rules[1].parameter, None);
        assert_eq!(
            rules[2].parameter.as_ref().and_then(|p| p.get("interval_end")),
            Some(&json!(2))
        );
    }

    #[test]
    fn test_parse_rules_rejects_non_list() {
        let err = parse_rules(br#"{"operation": "ignore"}"#).unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::InvalidInput);
    }

    #[test]
    fn test_rule_set_splits_order_patterns() {
        let rules = vec![
            Rule::new("ignore", "^skip$"),
            Rule::new(IGNORE_ORDER_OPERATION, "^set$"),
            Rule::new("operator:list:matchWithField", "^set->\\[\\d+\\]$")
                .with_parameter("field", json!("id")),
        ];
        let rule_set = RuleSet::from_rules(global_registry(), &rules).unwrap();
        assert_eq!(
            rule_set.operator_names(),
            vec!["ignore", "operator:list:matchWithField"]
        );
        assert_eq!(rule_set.ignore_order_patterns(), vec!["^set$"]);
    }

    #[test]
    fn test_unknown_operation_is_configuration_error() {
        let rules = vec![Rule::new("operator:doesNotExist", ".*")];
        let err = RuleSet::from_rules(global_registry(), &rules).unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::UnknownOperator);
        assert!(err.kind().is_configuration());
    }

    #[test]
    fn test_bad_order_pattern() {
        let rules = vec![Rule::new(IGNORE_ORDER_OPERATION, "[")];
        let err = RuleSet::from_rules(global_registry(), &rules).unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::InvalidPattern);
    }
}
