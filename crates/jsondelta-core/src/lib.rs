//! jsondelta core - structured JSON differ
//!
//! This crate compares two JSON documents and explains how they differ:
//! - Recursive similarity scoring in `[0, 1]` over mappings, sequences and
//!   primitives
//! - Order-preserving sequence alignment (LCS anchors plus gap alignment)
//!   and order-agnostic matching (greedy exact pass plus Kuhn-Munkres)
//! - Path-scoped operators looked up by name in a registry
//! - Per-run score memoization keyed on level paths and drill flag
//! - Grouped record export and a Markdown summary
//!
//! ```
//! use jsondelta_core::Differ;
//! use serde_json::json;
//!
//! let left = json!({"a": 1, "d": "12345"});
//! let right = json!({"a": 1, "c": 4});
//! let mut differ = Differ::new(&left, &right);
//!
//! assert!(!differ.diff()?);
//! let records = differ.to_map(true);
//! assert_eq!(records["dict:remove"][0]["left_path"], "d");
//! assert_eq!(records["dict:add"][0]["right_path"], "c");
//! # Ok::<(), jsondelta_core::ExError>(())
//! ```

pub mod diff;
pub mod errors;
pub mod input;
pub mod logging_facility;
pub mod model;
pub mod operators;
pub mod policy;
pub mod rules;

// Re-export commonly used types
pub use diff::{render_human_summary, DiffOutcome, Differ, DifferOptions};
pub use errors::{ExError, ExErrorKind, OperatorError, Result};
pub use input::parse_document;
pub use model::{Level, Path, Segment};
pub use operators::{global_registry, Operator, OperatorRegistry, Outcome};
pub use policy::{OrderPolicy, PatternOrderPolicy, PreserveOrder};
pub use rules::{diff_with_rules, parse_rules, Rule, RuleSet};
