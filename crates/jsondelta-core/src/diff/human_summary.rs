//! Human-readable summary renderer for diff outcomes.

use serde_json::Value;

use crate::diff::model::DiffOutcome;
use crate::model::{
    EVENT_DICT_ADD, EVENT_DICT_REMOVE, EVENT_LIST_ADD, EVENT_LIST_REMOVE, EVENT_PAIR,
    EVENT_VALUE_CHANGES,
};

/// Core groups in display order, with their section titles
const CORE_SECTIONS: [(&str, &str); 5] = [
    (EVENT_VALUE_CHANGES, "Value Changes"),
    (EVENT_DICT_REMOVE, "Removed Keys"),
    (EVENT_DICT_ADD, "Added Keys"),
    (EVENT_LIST_REMOVE, "Removed Items"),
    (EVENT_LIST_ADD, "Added Items"),
];

/// Render a Markdown summary of a [`DiffOutcome`].
///
/// Informational only. Path correspondences are skipped; operator groups
/// follow the core groups in tag order.
pub fn render_human_summary(outcome: &DiffOutcome) -> String {
    let mut out = String::new();

    out.push_str("## JSON Diff\n\n");
    let verdict = if outcome.equal { "Equal" } else { "Different" };
    out.push_str(&format!(
        "**Verdict**: {verdict}  \n**Score**: {:.4}\n\n",
        outcome.score
    ));

    if outcome.change_count() == 0 {
        out.push_str("_No differences detected._\n");
        return out;
    }

    for (event, title) in CORE_SECTIONS {
        let records = outcome.records_for(event);
        if records.is_empty() {
            continue;
        }
        out.push_str(&format!("### {} ({})\n\n", title, records.len()));
        for record in records {
            out.push_str(&core_line(event, record));
        }
        out.push('\n');
    }

    let core: Vec<&str> = CORE_SECTIONS.iter().map(|(event, _)| *event).collect();
    for (event, records) in &outcome.records {
        if event == EVENT_PAIR || core.contains(&event.as_str()) || records.is_empty() {
            continue;
        }
        out.push_str(&format!("### `{}` ({})\n\n", event, records.len()));
        for record in records {
            out.push_str(&operator_line(record));
        }
        out.push('\n');
    }

    out
}

static MISSING: Value = Value::Null;

fn field<'v>(record: &'v Value, name: &str) -> &'v Value {
    record.get(name).unwrap_or(&MISSING)
}

fn path(record: &Value, name: &str) -> String {
    field(record, name).as_str().unwrap_or_default().to_string()
}

fn core_line(event: &str, record: &Value) -> String {
    match event {
        EVENT_VALUE_CHANGES => format!(
            "- `{}`: `{}` → `{}`\n",
            path(record, "left_path"),
            field(record, "old"),
            field(record, "new")
        ),
        EVENT_DICT_REMOVE | EVENT_LIST_REMOVE => format!(
            "- `{}`: `{}`\n",
            path(record, "left_path"),
            field(record, "left")
        ),
        _ => format!(
            "- `{}`: `{}`\n",
            path(record, "right_path"),
            field(record, "right")
        ),
    }
}

fn operator_line(record: &Value) -> String {
    let left = path(record, "left_path");
    let right = path(record, "right_path");
    let location = if left.is_empty() {
        right
    } else if right.is_empty() || left == right {
        left
    } else {
        format!("{} / {}", left, right)
    };
    match record.get("pass").and_then(Value::as_bool) {
        Some(true) => format!("- `{}`: pass\n", location),
        Some(false) => format!("- `{}`: **fail**\n", location),
        None => format!("- `{}`\n", location),
    }
}
