#![allow(clippy::unwrap_used, clippy::expect_used)]

/// Operator Tests
///
/// Built-in operators driven directly through `Differ::with_operators`,
/// plus a caller-defined operator and registry behavior.
use jsondelta_core::model::Level;
use jsondelta_core::operators::registry::compile_pattern;
use jsondelta_core::operators::{
    ExpectChangeOperator, ExpectExistOperator, FloatInRangeOperator, IgnoreOperator,
    MatchWithFieldOperator,
};
use jsondelta_core::{Differ, ExErrorKind, Operator, OperatorRegistry, Outcome, Result};
use regex::Regex;
use serde_json::{json, Map, Value};

#[test]
fn test_expect_change_records_pass_and_fail() {
    // GIVEN one key that changes and one that does not
    let left = json!({"expect_change_pos": 1, "expect_change_neg": 1});
    let right = json!({"expect_change_pos": 11111, "expect_change_neg": 1});

    // WHEN both are guarded by expect-change operators
    let mut differ = Differ::new(&left, &right).with_operators(vec![
        Box::new(ExpectChangeOperator::new("^expect_change_pos").unwrap()),
        Box::new(ExpectChangeOperator::new("^expect_change_neg").unwrap()),
    ]);
    differ.diff().unwrap();

    // THEN each key carries a pass/fail record and nothing else is reported
    let expected = json!({
        "operator:expectChange": [
            {"left": 1, "right": 1, "left_path": "expect_change_neg", "right_path": "expect_change_neg",
             "path_regex": "^expect_change_neg", "pass": false},
            {"left": 1, "right": 11111, "left_path": "expect_change_pos", "right_path": "expect_change_pos",
             "path_regex": "^expect_change_pos", "pass": true}
        ]
    });
    assert_eq!(serde_json::to_value(differ.to_map(true)).unwrap(), expected);

    // AND the unchanged key scores 0
    assert_eq!(differ.root_score(), Some(0.5));
}

#[test]
fn test_expect_exist_flags_missing_side() {
    // GIVEN a key removed on the right and one present on both sides
    let left = json!({
        "expect_exist_pos": 1,
        "expect_exist_neg": 999,
        "key:removed": "23456",
        "key:changed": "abc"
    });
    let right = json!({
        "expect_exist_pos": "",
        "key:changed": "xyz",
        "key:added": "ooooooo"
    });

    // WHEN guarded by expect-exist operators
    let mut differ = Differ::new(&left, &right).with_operators(vec![
        Box::new(ExpectExistOperator::new("expect_exist_pos").unwrap()),
        Box::new(ExpectExistOperator::new("expect_exist_neg").unwrap()),
    ]);
    differ.diff().unwrap();

    // THEN the operator intercepts its keys before the mapping add/remove logic
    let expected = json!({
        "dict:add": [
            {"left": "__NON_EXIST__", "right": "ooooooo", "left_path": "", "right_path": "key:added"}
        ],
        "dict:remove": [
            {"left": "23456", "right": "__NON_EXIST__", "left_path": "key:removed", "right_path": ""}
        ],
        "operator:expectExist": [
            {"left": 999, "right": "__NON_EXIST__", "left_path": "expect_exist_neg", "right_path": "",
             "path_regex": "expect_exist_neg", "pass": false, "right_non_exist": true},
            {"left": 1, "right": "", "left_path": "expect_exist_pos", "right_path": "expect_exist_pos",
             "path_regex": "expect_exist_pos", "pass": true}
        ],
        "value_changes": [
            {"left": "abc", "right": "xyz", "left_path": "key:changed", "right_path": "key:changed",
             "old": "abc", "new": "xyz"}
        ]
    });
    assert_eq!(serde_json::to_value(differ.to_map(true)).unwrap(), expected);
}

#[test]
fn test_float_in_range_checks_both_sides() {
    // GIVEN one key inside (0, 2] and one far outside
    let left = json!({"float_in_range_pos": 1, "float_in_range_neg": 2333});
    let right = json!({"float_in_range_pos": 1.5, "float_in_range_neg": 4567});

    // WHEN guarded by range operators built from rule parameters
    let registry = OperatorRegistry::builtins();
    let params = json!({"interval_start": 0, "interval_end": 2});
    let params = params.as_object().unwrap();
    let mut differ = Differ::new(&left, &right).with_operators(vec![
        registry
            .build("operator:floatInRange", "float_in_range_pos", params)
            .unwrap(),
        registry
            .build("operator:floatInRange", "float_in_range_neg", params)
            .unwrap(),
    ]);
    differ.diff().unwrap();

    // THEN the records keep the interval as configured and flag each bad side
    let expected = json!({
        "operator:floatInRange": [
            {"left": 2333, "right": 4567, "left_path": "float_in_range_neg", "right_path": "float_in_range_neg",
             "path_regex": "float_in_range_neg", "interval_start": 0, "interval_end": 2, "pass": false,
             "left_invalid": true, "right_invalid": true},
            {"left": 1, "right": 1.5, "left_path": "float_in_range_pos", "right_path": "float_in_range_pos",
             "path_regex": "float_in_range_pos", "interval_start": 0, "interval_end": 2, "pass": true}
        ]
    });
    assert_eq!(serde_json::to_value(differ.to_map(true)).unwrap(), expected);
}

#[test]
fn test_float_in_range_non_number_fails_the_run() {
    // GIVEN a range-checked key holding a string
    let left = json!({"ratio": "high"});
    let right = json!({"ratio": 0.5});

    // WHEN diffing
    let mut differ = Differ::new(&left, &right)
        .with_operators(vec![Box::new(FloatInRangeOperator::new("^ratio$", 0.0, 1.0).unwrap())]);
    let err = differ.diff().unwrap_err();

    // THEN the fault is wrapped once with the failing level's context
    assert_eq!(err.kind(), ExErrorKind::ComparisonFailed);
    assert_eq!(err.left_path(), Some("ratio"));
    assert_eq!(err.right_path(), Some("ratio"));
    assert_eq!(err.drill(), Some(false));
    let source = err.source_error().expect("wrapped fault keeps its source");
    assert_eq!(source.kind(), ExErrorKind::OperatorFailed);
    assert_eq!(source.operator(), Some("operator:floatInRange"));

    // AND no partial records survive
    assert!(differ.to_map(false)["just4vis:pairs"].is_empty());
    assert!(differ.to_map(true).is_empty());
}

#[test]
fn test_ignore_marks_subtree_equal() {
    // GIVEN a subtree that differs wildly
    let left = json!({"meta": {"ts": 1, "host": "a"}, "body": 1});
    let right = json!({"meta": [1, 2, 3], "body": 1});

    // WHEN the subtree is ignored
    let mut differ = Differ::new(&left, &right)
        .with_operators(vec![Box::new(IgnoreOperator::new("^meta").unwrap())]);

    // THEN the documents compare equal and the ignore is recorded once
    assert!(differ.diff().unwrap());
    let ignored = differ.records("ignore");
    assert_eq!(ignored.len(), 1);
    assert_eq!(ignored[0].to_json()["path_regex"], "^meta");
    assert_eq!(ignored[0].to_json()["pass"], true);
}

#[test]
fn test_ignore_aliases_record_under_ignore() {
    let registry = OperatorRegistry::builtins();
    let left = json!({"doc": "v1"});
    let right = json!({"doc": "v2"});

    for alias in ["diff_word", "diff_image", "diff_pdf"] {
        let op = registry.build(alias, "^doc$", &Map::new()).unwrap();
        assert_eq!(op.name(), alias);

        let mut differ = Differ::new(&left, &right).with_operators(vec![op]);
        assert!(differ.diff().unwrap());
        assert_eq!(differ.records("ignore").len(), 1);
    }
}

#[test]
fn test_match_with_field_defers_when_field_missing() {
    // GIVEN items where the correlation field is absent on one side
    let left = json!([{"name": "a"}]);
    let right = json!([{"id": 1, "name": "a"}]);

    // WHEN matching by id
    let mut differ = Differ::new(&left, &right)
        .with_operators(vec![Box::new(MatchWithFieldOperator::new(r"^\[\d+\]$", "id").unwrap())]);
    differ.diff().unwrap();

    // THEN the generic comparison decides, and the rule is recorded
    let records = differ.to_map(true);
    assert_eq!(records["dict:add"][0]["right_path"], "[0]->id");
    assert_eq!(records["operator:list:matchWithField"][0]["field"], "id");
}

/// Two-dimensional points compared by Euclidean distance
#[derive(Debug)]
struct L2DistanceOperator {
    pattern: Regex,
    threshold: f64,
}

impl L2DistanceOperator {
    const NAME: &'static str = "operator:l2distance";

    fn new(pattern: &str, threshold: f64) -> Result<Self> {
        Ok(Self {
            pattern: compile_pattern(pattern)?,
            threshold,
        })
    }
}

fn coordinate(side: Option<&Value>, axis: &str) -> f64 {
    side.and_then(|v| v[axis].as_f64()).unwrap_or(0.0)
}

impl Operator for L2DistanceOperator {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn pattern(&self) -> &Regex {
        &self.pattern
    }

    fn apply<'a>(&self, level: &Level<'a>, differ: &mut Differ<'a>, drill: bool) -> Result<Outcome> {
        let dx = coordinate(level.left, "x") - coordinate(level.right, "x");
        let dy = coordinate(level.left, "y") - coordinate(level.right, "y");
        let distance = (dx * dx + dy * dy).sqrt();
        let pass = distance < self.threshold;

        if !drill {
            let mut extra = Map::new();
            extra.insert("distance".to_string(), json!(distance));
            extra.insert("distance_threshold".to_string(), json!(self.threshold));
            extra.insert("pass".to_string(), json!(pass));
            differ.report(Self::NAME, level.clone(), extra);
        }
        Ok(Outcome::Handled(if pass { 1.0 } else { 0.0 }))
    }
}

#[test]
fn test_custom_operator_records_its_own_event() {
    // GIVEN two points, one close and one far
    let left = json!({"distance_ok": {"x": 1, "y": 1}, "distance_too_far": {"x": 5, "y": 5}});
    let right = json!({"distance_ok": {"x": 2, "y": 2}, "distance_too_far": {"x": 7, "y": 9}});

    // WHEN compared with a distance threshold of 3
    let mut differ = Differ::new(&left, &right)
        .with_operators(vec![Box::new(L2DistanceOperator::new("distance.*", 3.0).unwrap())]);
    differ.diff().unwrap();

    // THEN the operator replaces the coordinate comparison entirely
    let records = differ.to_map(true);
    assert_eq!(records.keys().collect::<Vec<_>>(), ["operator:l2distance"]);
    let events = &records["operator:l2distance"];
    assert_eq!(events[0]["left_path"], "distance_ok");
    assert_eq!(events[0]["pass"], true);
    assert!((events[0]["distance"].as_f64().unwrap() - 2f64.sqrt()).abs() < 1e-12);
    assert_eq!(events[1]["left_path"], "distance_too_far");
    assert_eq!(events[1]["pass"], false);
    assert_eq!(differ.root_score(), Some(0.5));
}

#[test]
fn test_custom_operator_registered_by_name() {
    // GIVEN a registry extended with a caller-defined factory
    fn build_l2(pattern: &str, params: &Map<String, Value>) -> Result<Box<dyn Operator>> {
        let threshold = params
            .get("threshold")
            .and_then(Value::as_f64)
            .unwrap_or(1.0);
        Ok(Box::new(L2DistanceOperator::new(pattern, threshold)?))
    }

    let mut registry = OperatorRegistry::builtins();
    registry.register(L2DistanceOperator::NAME, build_l2).unwrap();

    // WHEN the same name is registered twice
    let err = registry
        .register(L2DistanceOperator::NAME, build_l2)
        .unwrap_err();

    // THEN the duplicate is a configuration error and the first stays usable
    assert_eq!(err.kind(), ExErrorKind::DuplicateOperator);
    assert!(registry.contains(L2DistanceOperator::NAME));
    let params = json!({"threshold": 10.0});
    let op = registry
        .build(L2DistanceOperator::NAME, "^p$", params.as_object().unwrap())
        .unwrap();
    assert_eq!(op.name(), L2DistanceOperator::NAME);
}

#[test]
fn test_first_handling_operator_wins() {
    // GIVEN two operators matching the same path
    let left = json!({"k": 1});
    let right = json!({"k": 1});

    // WHEN expect-change comes before ignore
    let mut differ = Differ::new(&left, &right).with_operators(vec![
        Box::new(ExpectChangeOperator::new("^k$").unwrap()),
        Box::new(IgnoreOperator::new("^k$").unwrap()),
    ]);

    // THEN expect-change decides and ignore never runs
    assert!(!differ.diff().unwrap());
    assert_eq!(differ.records("operator:expectChange").len(), 1);
    assert!(differ.records("ignore").is_empty());
}
