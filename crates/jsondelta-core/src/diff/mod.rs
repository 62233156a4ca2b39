//! Structured JSON diff engine.
//!
//! Scores two JSON documents recursively and records every difference it
//! commits to: mapping keys added or removed, sequence items added or
//! removed, primitive values changed, plus operator-specific events.
//!
//! ## Entry point
//!
//! ```
//! use jsondelta_core::diff::{render_human_summary, Differ};
//! use serde_json::json;
//!
//! let left = json!({"name": "a", "tags": [1, 2]});
//! let right = json!({"name": "b", "tags": [1, 2]});
//! let mut differ = Differ::new(&left, &right);
//! differ.diff()?;
//! let summary = render_human_summary(&differ.outcome(true)?);
//! assert!(summary.contains("Value Changes"));
//! # Ok::<(), jsondelta_core::ExError>(())
//! ```
//!
//! ## Guarantees
//!
//! - **Determinism**: identical inputs and configuration produce identical
//!   records in identical order.
//! - **Drill isolation**: speculative comparisons never record.
//! - **Score range**: every score lies in `[0, 1]`; empty mappings and
//!   sequences score exactly 1.

mod array;
pub mod cache;
pub mod engine;
pub mod human_summary;
pub mod matcher;
pub mod model;

pub use cache::CacheStats;
pub use engine::{Differ, DifferOptions};
pub use human_summary::render_human_summary;
pub use matcher::{max_weight_matching, Matching};
pub use model::DiffOutcome;
