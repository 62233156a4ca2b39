#![allow(clippy::unwrap_used, clippy::expect_used)]

/// Scenario 1: Mixed Document Tests
///
/// One document exercising every core event: mapping keys added and
/// removed, primitive changes at several depths, and a sequence of
/// mappings with one item replaced.
use jsondelta_core::model::ABSENT_MARKER;
use jsondelta_core::Differ;
use serde_json::{json, Value};

fn left_doc() -> Value {
    json!({
        "a": 1,
        "b": 2,
        "d": "12345",
        "f": false,
        "e": [{"x": 1, "y": 1}, {"x": 2, "y": 2}, {"x": 3, "y": 3}, {"x": 4, "y": 4}]
    })
}

fn right_doc() -> Value {
    json!({
        "a": 1,
        "b": 3,
        "c": 4,
        "f": true,
        "e": [{"x": 0, "y": 1}, {"x": 2, "y": 2}, {"x": 3, "y": 3}, {"x": 5, "y": 5}]
    })
}

#[test]
fn test_scenario_01_happy_every_core_event_reported() {
    // GIVEN two documents differing at several depths
    let left = left_doc();
    let right = right_doc();

    // WHEN diffing with the default configuration
    let mut differ = Differ::new(&left, &right);
    let equal = differ.diff().expect("diff should succeed");

    // THEN the documents are reported as different
    assert!(!equal);

    // AND the export holds exactly the expected records
    let records = differ.to_map(true);
    let expected = json!({
        "dict:add": [
            {"left": ABSENT_MARKER, "right": 4, "left_path": "", "right_path": "c"}
        ],
        "dict:remove": [
            {"left": "12345", "right": ABSENT_MARKER, "left_path": "d", "right_path": ""}
        ],
        "list:add": [
            {"left": ABSENT_MARKER, "right": {"x": 5, "y": 5}, "left_path": "", "right_path": "e->[3]"}
        ],
        "list:remove": [
            {"left": {"x": 4, "y": 4}, "right": ABSENT_MARKER, "left_path": "e->[3]", "right_path": ""}
        ],
        "value_changes": [
            {"left": 2, "right": 3, "left_path": "b", "right_path": "b", "old": 2, "new": 3},
            {"left": 1, "right": 0, "left_path": "e->[0]->x", "right_path": "e->[0]->x", "old": 1, "new": 0},
            {"left": false, "right": true, "left_path": "f", "right_path": "f", "old": false, "new": true}
        ]
    });
    assert_eq!(serde_json::to_value(&records).unwrap(), expected);
}

#[test]
fn test_scenario_01_root_score_is_mean_of_keys() {
    // GIVEN the mixed documents
    let left = left_doc();
    let right = right_doc();

    // WHEN diffing
    let mut differ = Differ::new(&left, &right);
    differ.diff().unwrap();

    // THEN the root score averages a, b, c, d, e, f
    // e = (0.5 + 1 + 1 + 0) / 4
    let expected = (1.0 + 0.0 + 0.0 + 0.0 + 0.625 + 0.0) / 6.0;
    let score = differ.root_score().unwrap();
    assert!((score - expected).abs() < 1e-12, "score was {}", score);
}

#[test]
fn test_scenario_01_pairs_cover_one_sided_keys() {
    // GIVEN the mixed documents
    let left = left_doc();
    let right = right_doc();

    // WHEN exporting with pairs
    let mut differ = Differ::new(&left, &right);
    differ.diff().unwrap();
    let records = differ.to_map(false);

    // THEN the only correspondences are the one-sided keys
    let pairs = &records["just4vis:pairs"];
    let paths: Vec<(&str, &str)> = pairs
        .iter()
        .map(|p| {
            (
                p["left_path"].as_str().unwrap(),
                p["right_path"].as_str().unwrap(),
            )
        })
        .collect();
    assert_eq!(paths, vec![("", "c"), ("d", "")]);
}

#[test]
fn test_scenario_01_identical_sequence_has_only_empty_pairs() {
    // GIVEN identical documents holding a sequence
    let left = json!({"v": [1, 2, 3]});
    let right = json!({"v": [1, 2, 3]});

    // WHEN diffing
    let mut differ = Differ::new(&left, &right);

    // THEN they are equal and nothing but the empty pair group is exported
    assert!(differ.diff().unwrap());
    let records = differ.to_map(false);
    assert_eq!(records.len(), 1);
    assert!(records["just4vis:pairs"].is_empty());
    assert!(differ.to_map(true).is_empty());
}

#[test]
fn test_scenario_01_records_are_deterministic() {
    // GIVEN the mixed documents
    let left = left_doc();
    let right = right_doc();

    // WHEN diffing twice with fresh engines
    let mut first = Differ::new(&left, &right);
    first.diff().unwrap();
    let mut second = Differ::new(&left, &right);
    second.diff().unwrap();

    // THEN the exports are identical, pairs included
    assert_eq!(first.to_map(false), second.to_map(false));
}

#[test]
fn test_scenario_01_swapped_sides_swap_old_and_new() {
    // GIVEN the mixed documents in both directions
    let left = left_doc();
    let right = right_doc();

    let mut forward = Differ::new(&left, &right);
    forward.diff().unwrap();
    let mut backward = Differ::new(&right, &left);
    backward.diff().unwrap();

    // THEN every value change appears at the same path with old/new swapped
    let forward_changes = forward.to_map(true)["value_changes"].clone();
    let backward_changes = backward.to_map(true)["value_changes"].clone();
    assert_eq!(forward_changes.len(), backward_changes.len());
    for (f, b) in forward_changes.iter().zip(backward_changes.iter()) {
        assert_eq!(f["left_path"], b["left_path"]);
        assert_eq!(f["old"], b["new"]);
        assert_eq!(f["new"], b["old"]);
    }

    // AND removals become additions
    let backward_records = backward.to_map(true);
    assert_eq!(backward_records["dict:add"][0]["right_path"], "d");
    assert_eq!(backward_records["dict:remove"][0]["left_path"], "c");
}

#[test]
fn test_scenario_01_type_mismatch_is_a_zero_score_not_an_error() {
    // GIVEN a key whose value changes kind
    let left = json!({"k": "1"});
    let right = json!({"k": 1});

    // WHEN diffing
    let mut differ = Differ::new(&left, &right);

    // THEN the run succeeds with score 0 and records nothing for the key
    assert!(!differ.diff().unwrap());
    assert_eq!(differ.root_score(), Some(0.0));
    assert!(differ.to_map(true).is_empty());
}

#[test]
fn test_scenario_01_integer_and_float_are_different_numbers() {
    let left = json!({"n": 1});
    let right = json!({"n": 1.0});

    let mut differ = Differ::new(&left, &right);
    assert!(!differ.diff().unwrap());
    assert_eq!(differ.records("value_changes").len(), 1);
}

#[test]
fn test_scenario_01_empty_containers_score_one() {
    for (left, right) in [
        (json!({}), json!({})),
        (json!([]), json!([])),
        (json!({"a": {}, "b": []}), json!({"a": {}, "b": []})),
    ] {
        let mut differ = Differ::new(&left, &right);
        assert!(differ.diff().unwrap());
        assert_eq!(differ.root_score(), Some(1.0));
    }
}

#[test]
fn test_scenario_01_arrow_in_key_is_not_a_nested_path() {
    // GIVEN a top-level key whose name renders like a nested path
    let left = json!({"a": {"b": 2}, "a->b": 1});
    let right = json!({"a": {"b": 2}, "a->b": 999});

    // WHEN diffing
    let mut differ = Differ::new(&left, &right);
    let equal = differ.diff().unwrap();

    // THEN the flat key is scored on its own values
    assert!(!equal);
    let changes = differ.records("value_changes");
    assert_eq!(changes.len(), 1);
    let change = changes[0].to_json();
    assert_eq!(change["left_path"], json!("a->b"));
    assert_eq!(change["old"], json!(1));
    assert_eq!(change["new"], json!(999));
}
