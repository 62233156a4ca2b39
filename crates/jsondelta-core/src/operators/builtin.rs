//! Built-in operators.

use regex::Regex;
use serde_json::{Map, Value};

use super::registry::compile_pattern;
use super::{record_fields, Operator, Outcome};
use crate::diff::engine::Differ;
use crate::errors::{OperatorError, Result};
use crate::model::{Level, Slot};

pub const MATCH_WITH_FIELD: &str = "operator:list:matchWithField";
pub const EXPECT_CHANGE: &str = "operator:expectChange";
pub const EXPECT_EXIST: &str = "operator:expectExist";
pub const FLOAT_IN_RANGE: &str = "operator:floatInRange";
pub const IGNORE: &str = "ignore";
/// Extra names the ignore operator answers to
pub const IGNORE_ALIASES: [&str; 3] = ["diff_word", "diff_image", "diff_pdf"];

fn string_param(operator: &str, params: &Map<String, Value>, name: &str) -> Result<String> {
    match params.get(name) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(OperatorError::InvalidParameter {
            operator: operator.to_string(),
            parameter: name.to_string(),
            expected: "a string",
        }
        .into()),
        None => Err(OperatorError::MissingParameter {
            operator: operator.to_string(),
            parameter: name.to_string(),
        }
        .into()),
    }
}

fn number_param(operator: &str, params: &Map<String, Value>, name: &str) -> Result<(Value, f64)> {
    match params.get(name) {
        Some(value @ Value::Number(n)) => match n.as_f64() {
            Some(f) => Ok((value.clone(), f)),
            None => Err(OperatorError::InvalidParameter {
                operator: operator.to_string(),
                parameter: name.to_string(),
                expected: "a finite number",
            }
            .into()),
        },
        Some(_) => Err(OperatorError::InvalidParameter {
            operator: operator.to_string(),
            parameter: name.to_string(),
            expected: "a number",
        }
        .into()),
        None => Err(OperatorError::MissingParameter {
            operator: operator.to_string(),
            parameter: name.to_string(),
        }
        .into()),
    }
}

/// Identifies sequence items by one field during order-agnostic matching
///
/// Under drill, two mappings carrying equal `field` values are treated as
/// the same entity (score 1). Non-drill evaluation records the rule and
/// falls through, so the paired items still get a full comparison.
#[derive(Debug, Clone)]
pub struct MatchWithFieldOperator {
    pattern: Regex,
    field: String,
}

impl MatchWithFieldOperator {
    /// # Errors
    ///
    /// - `InvalidPattern` if `pattern` does not compile
    pub fn new(pattern: &str, field: impl Into<String>) -> Result<Self> {
        Ok(Self {
            pattern: compile_pattern(pattern)?,
            field: field.into(),
        })
    }

    pub(crate) fn build(pattern: &str, params: &Map<String, Value>) -> Result<Box<dyn Operator>> {
        let field = string_param(MATCH_WITH_FIELD, params, "field")?;
        Ok(Box::new(Self::new(pattern, field)?))
    }

    fn field_of<'v>(&self, slot: Slot<'v>) -> Option<&'v Value> {
        slot.and_then(Value::as_object)
            .and_then(|map| map.get(&self.field))
    }
}

impl Operator for MatchWithFieldOperator {
    fn name(&self) -> &str {
        MATCH_WITH_FIELD
    }

    fn pattern(&self) -> &Regex {
        &self.pattern
    }

    fn apply<'a>(&self, level: &Level<'a>, differ: &mut Differ<'a>, drill: bool) -> Result<Outcome> {
        if drill {
            if let (Some(left), Some(right)) = (self.field_of(level.left), self.field_of(level.right)) {
                if left == right {
                    return Ok(Outcome::Handled(1.0));
                }
            }
        } else {
            let mut extra = record_fields(&self.pattern);
            extra.insert("field".to_string(), Value::String(self.field.clone()));
            differ.report(MATCH_WITH_FIELD, level.clone(), extra);
        }
        Ok(Outcome::Defer)
    }
}

/// Passes only when the two sides differ
#[derive(Debug, Clone)]
pub struct ExpectChangeOperator {
    pattern: Regex,
}

impl ExpectChangeOperator {
    /// # Errors
    ///
    /// - `InvalidPattern` if `pattern` does not compile
    pub fn new(pattern: &str) -> Result<Self> {
        Ok(Self {
            pattern: compile_pattern(pattern)?,
        })
    }

    pub(crate) fn build(pattern: &str, _params: &Map<String, Value>) -> Result<Box<dyn Operator>> {
        Ok(Box::new(Self::new(pattern)?))
    }
}

impl Operator for ExpectChangeOperator {
    fn name(&self) -> &str {
        EXPECT_CHANGE
    }

    fn pattern(&self) -> &Regex {
        &self.pattern
    }

    fn apply<'a>(&self, level: &Level<'a>, differ: &mut Differ<'a>, drill: bool) -> Result<Outcome> {
        let changed = level.left != level.right;
        if !drill {
            let mut extra = record_fields(&self.pattern);
            extra.insert("pass".to_string(), Value::Bool(changed));
            differ.report(EXPECT_CHANGE, level.clone(), extra);
        }
        Ok(Outcome::Handled(if changed { 1.0 } else { 0.0 }))
    }
}

/// Passes only when both sides are present
#[derive(Debug, Clone)]
pub struct ExpectExistOperator {
    pattern: Regex,
}

impl ExpectExistOperator {
    /// # Errors
    ///
    /// - `InvalidPattern` if `pattern` does not compile
    pub fn new(pattern: &str) -> Result<Self> {
        Ok(Self {
            pattern: compile_pattern(pattern)?,
        })
    }

    pub(crate) fn build(pattern: &str, _params: &Map<String, Value>) -> Result<Box<dyn Operator>> {
        Ok(Box::new(Self::new(pattern)?))
    }
}

impl Operator for ExpectExistOperator {
    fn name(&self) -> &str {
        EXPECT_EXIST
    }

    fn pattern(&self) -> &Regex {
        &self.pattern
    }

    fn apply<'a>(&self, level: &Level<'a>, differ: &mut Differ<'a>, drill: bool) -> Result<Outcome> {
        let pass = level.left.is_some() && level.right.is_some();
        if !drill {
            let mut extra = record_fields(&self.pattern);
            extra.insert("pass".to_string(), Value::Bool(pass));
            if level.left.is_none() {
                extra.insert("left_non_exist".to_string(), Value::Bool(true));
            }
            if level.right.is_none() {
                extra.insert("right_non_exist".to_string(), Value::Bool(true));
            }
            differ.report(EXPECT_EXIST, level.clone(), extra);
        }
        Ok(Outcome::Handled(if pass { 1.0 } else { 0.0 }))
    }
}

/// Checks both sides fall in the interval `(start, end]`
#[derive(Debug, Clone)]
pub struct FloatInRangeOperator {
    pattern: Regex,
    start: f64,
    end: f64,
    start_value: Value,
    end_value: Value,
}

impl FloatInRangeOperator {
    /// # Errors
    ///
    /// - `InvalidPattern` if `pattern` does not compile
    /// - `InvalidRuleParameter` if either bound is not a finite number
    pub fn new(pattern: &str, start: f64, end: f64) -> Result<Self> {
        let bound = |name: &str, v: f64| {
            serde_json::Number::from_f64(v)
                .map(Value::Number)
                .ok_or_else(|| OperatorError::InvalidParameter {
                    operator: FLOAT_IN_RANGE.to_string(),
                    parameter: name.to_string(),
                    expected: "a finite number",
                })
        };
        let start_value = bound("interval_start", start)?;
        let end_value = bound("interval_end", end)?;
        Ok(Self {
            pattern: compile_pattern(pattern)?,
            start,
            end,
            start_value,
            end_value,
        })
    }

    pub(crate) fn build(pattern: &str, params: &Map<String, Value>) -> Result<Box<dyn Operator>> {
        let (start_value, start) = number_param(FLOAT_IN_RANGE, params, "interval_start")?;
        let (end_value, end) = number_param(FLOAT_IN_RANGE, params, "interval_end")?;
        Ok(Box::new(Self {
            pattern: compile_pattern(pattern)?,
            start,
            end,
            start_value,
            end_value,
        }))
    }

    fn number(&self, slot: Slot<'_>, side: &'static str) -> Result<f64> {
        slot.and_then(Value::as_f64).ok_or_else(|| {
            OperatorError::NonNumericValue {
                operator: FLOAT_IN_RANGE.to_string(),
                side,
                found: slot
                    .map(Value::to_string)
                    .unwrap_or_else(|| "nothing".to_string()),
            }
            .into()
        })
    }

    fn in_range(&self, v: f64) -> bool {
        self.start < v && v <= self.end
    }
}

impl Operator for FloatInRangeOperator {
    fn name(&self) -> &str {
        FLOAT_IN_RANGE
    }

    fn pattern(&self) -> &Regex {
        &self.pattern
    }

    fn apply<'a>(&self, level: &Level<'a>, differ: &mut Differ<'a>, drill: bool) -> Result<Outcome> {
        let left_ok = self.in_range(self.number(level.left, "left")?);
        let right_ok = self.in_range(self.number(level.right, "right")?);
        let pass = left_ok && right_ok;

        if !drill {
            let mut extra = record_fields(&self.pattern);
            extra.insert("interval_start".to_string(), self.start_value.clone());
            extra.insert("interval_end".to_string(), self.end_value.clone());
            extra.insert("pass".to_string(), Value::Bool(pass));
            if !left_ok {
                extra.insert("left_invalid".to_string(), Value::Bool(true));
            }
            if !right_ok {
                extra.insert("right_invalid".to_string(), Value::Bool(true));
            }
            differ.report(FLOAT_IN_RANGE, level.clone(), extra);
        }
        Ok(Outcome::Handled(if pass { 1.0 } else { 0.0 }))
    }
}

/// Marks a subtree as equal without looking at it
#[derive(Debug, Clone)]
pub struct IgnoreOperator {
    name: String,
    pattern: Regex,
}

impl IgnoreOperator {
    /// # Errors
    ///
    /// - `InvalidPattern` if `pattern` does not compile
    pub fn new(pattern: &str) -> Result<Self> {
        Self::named(IGNORE, pattern)
    }

    /// Build under one of the alias names
    ///
    /// # Errors
    ///
    /// - `InvalidPattern` if `pattern` does not compile
    pub fn named(name: &str, pattern: &str) -> Result<Self> {
        Ok(Self {
            name: name.to_string(),
            pattern: compile_pattern(pattern)?,
        })
    }
}

impl Operator for IgnoreOperator {
    fn name(&self) -> &str {
        &self.name
    }

    fn pattern(&self) -> &Regex {
        &self.pattern
    }

    fn apply<'a>(&self, level: &Level<'a>, differ: &mut Differ<'a>, drill: bool) -> Result<Outcome> {
        if !drill {
            let mut extra = record_fields(&self.pattern);
            extra.insert("pass".to_string(), Value::Bool(true));
            differ.report(IGNORE, level.clone(), extra);
        }
        Ok(Outcome::Handled(1.0))
    }
}

pub(crate) fn build_ignore(pattern: &str, _params: &Map<String, Value>) -> Result<Box<dyn Operator>> {
    Ok(Box::new(IgnoreOperator::new(pattern)?))
}

pub(crate) fn build_diff_word(pattern: &str, _params: &Map<String, Value>) -> Result<Box<dyn Operator>> {
    Ok(Box::new(IgnoreOperator::named(IGNORE_ALIASES[0], pattern)?))
}

pub(crate) fn build_diff_image(
    pattern: &str,
    _params: &Map<String, Value>,
) -> Result<Box<dyn Operator>> {
    Ok(Box::new(IgnoreOperator::named(IGNORE_ALIASES[1], pattern)?))
}

pub(crate) fn build_diff_pdf(pattern: &str, _params: &Map<String, Value>) -> Result<Box<dyn Operator>> {
    Ok(Box::new(IgnoreOperator::named(IGNORE_ALIASES[2], pattern)?))
}
