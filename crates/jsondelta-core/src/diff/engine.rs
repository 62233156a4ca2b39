//! Recursive scoring engine.
//!
//! The core entry point is [`Differ::diff`], which scores the root level of
//! two JSON documents and collects every difference it commits to.

#![allow(clippy::result_large_err)]

use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Instant;

use jsondelta_core_types::schema::EVENT_SCORE;
use jsondelta_core_types::RunId;

use crate::diff::cache::{CacheKey, CacheStats, ScoreCache};
use crate::diff::model::DiffOutcome;
use crate::errors::{ExError, ExErrorKind, Result};
use crate::model::{
    Level, OverrideScorer, Record, RecordStore, ValueKind, EVENT_DICT_ADD, EVENT_DICT_REMOVE,
    EVENT_PAIR, EVENT_VALUE_CHANGES,
};
use crate::operators::{Operator, Outcome};
use crate::policy::{OrderPolicy, PreserveOrder};
use crate::rules::RuleSet;
use crate::{log_op_end, log_op_error, log_op_start};

/// Score of two values considered identical
pub(crate) const FULL_MATCH: f64 = 1.0;

/// Per-run switches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DifferOptions {
    /// Pair sequence items by index instead of aligning them
    pub fast_mode: bool,
    /// Memoize scores on `(left path, right path, drill)`
    pub use_cache: bool,
    /// Emit a trace event for every scored level
    pub debug: bool,
}

impl Default for DifferOptions {
    fn default() -> Self {
        Self {
            fast_mode: false,
            use_cache: true,
            debug: false,
        }
    }
}

/// One comparison run over two borrowed documents
///
/// A `Differ` is single-use: build it, call [`Differ::diff`] once, then read
/// the records. Operators and the order policy are shared through `Arc`, so
/// a rule set can serve many runs.
///
/// # Example
/// ```
/// use jsondelta_core::Differ;
/// use serde_json::json;
///
/// let left = json!({"a": 1, "b": 2});
/// let right = json!({"a": 1, "b": 3});
/// let mut differ = Differ::new(&left, &right);
///
/// assert!(!differ.diff().unwrap());
/// assert_eq!(differ.to_map(true)["value_changes"].len(), 1);
/// ```
pub struct Differ<'a> {
    left: &'a Value,
    right: &'a Value,
    operators: Arc<[Box<dyn Operator>]>,
    order_policy: Arc<dyn OrderPolicy>,
    options: DifferOptions,
    cache: ScoreCache,
    records: RecordStore<'a>,
    run_id: RunId,
    completed: bool,
    root_score: Option<f64>,
}

impl<'a> Differ<'a> {
    /// Engine with no operators, order preserved everywhere, default options
    pub fn new(left: &'a Value, right: &'a Value) -> Self {
        Self {
            left,
            right,
            operators: Arc::from(Vec::<Box<dyn Operator>>::new()),
            order_policy: Arc::new(PreserveOrder),
            options: DifferOptions::default(),
            cache: ScoreCache::new(),
            records: RecordStore::new(),
            run_id: RunId::new(),
            completed: false,
            root_score: None,
        }
    }

    /// Operators consulted, in order, before generic comparison
    pub fn with_operators(mut self, operators: Vec<Box<dyn Operator>>) -> Self {
        self.operators = Arc::from(operators);
        self
    }

    pub fn with_shared_operators(mut self, operators: Arc<[Box<dyn Operator>]>) -> Self {
        self.operators = operators;
        self
    }

    pub fn with_order_policy(mut self, policy: impl OrderPolicy + 'static) -> Self {
        self.order_policy = Arc::new(policy);
        self
    }

    pub fn with_shared_order_policy(mut self, policy: Arc<dyn OrderPolicy>) -> Self {
        self.order_policy = policy;
        self
    }

    /// Install the operators and order patterns of a loaded rule set
    pub fn with_rule_set(self, rules: &RuleSet) -> Self {
        self.with_shared_operators(rules.operators())
            .with_shared_order_policy(rules.order_policy())
    }

    pub fn with_options(mut self, options: DifferOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> DifferOptions {
        self.options
    }

    pub fn run_id(&self) -> &RunId {
        &self.run_id
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Compare the two documents and collect records
    ///
    /// Returns `true` iff the root score is exactly 1.
    ///
    /// # Errors
    ///
    /// - `EngineReused` if this engine already ran
    /// - `ComparisonFailed` wrapping the innermost failing level's fault;
    ///   the record store is emptied
    pub fn diff(&mut self) -> Result<bool> {
        if self.completed {
            return Err(ExError::new(ExErrorKind::EngineReused)
                .with_op("diff")
                .with_message(format!("run {} already completed", self.run_id)));
        }
        self.completed = true;

        let start = Instant::now();
        log_op_start!(
            "diff",
            run_id = self.run_id.as_str(),
            fast_mode = self.options.fast_mode,
            use_cache = self.options.use_cache,
            operator_count = self.operators.len() as u64
        );

        let root = Level::root(self.left, self.right);
        match self.score(&root, false) {
            Ok(score) => {
                let stats = self.cache.stats();
                log_op_end!(
                    "diff",
                    duration_ms = start.elapsed().as_millis() as u64,
                    run_id = self.run_id.as_str(),
                    score = score,
                    record_count = self.records.len() as u64,
                    cache_hits = stats.hits,
                    cache_misses = stats.misses
                );
                self.root_score = Some(score);
                Ok(score == FULL_MATCH)
            }
            Err(err) => {
                self.records.reset();
                self.cache.clear();
                log_op_error!(
                    "diff",
                    err.clone(),
                    duration_ms = start.elapsed().as_millis() as u64,
                    run_id = self.run_id.as_str()
                );
                Err(err)
            }
        }
    }

    /// Score one level in `[0, 1]`
    ///
    /// With `drill` set nothing is recorded. Results are memoized per
    /// `(left path, right path, drill)` unless caching is disabled.
    ///
    /// # Errors
    ///
    /// - `ComparisonFailed` carrying the innermost failing level's paths
    ///   and drill flag, with the underlying fault as source
    pub fn score(&mut self, level: &Level<'a>, drill: bool) -> Result<f64> {
        if !self.options.use_cache {
            let score = self.evaluate(level, drill)?;
            self.trace(level, drill, score, "off");
            return Ok(score);
        }

        let key = CacheKey::for_level(level, drill);
        if let Some(score) = self.cache.get(&key) {
            self.trace(level, drill, score, "hit");
            return Ok(score);
        }
        let score = self.evaluate(level, drill)?;
        self.cache.insert(key, score);
        self.trace(level, drill, score, "miss");
        Ok(score)
    }

    fn trace(&self, level: &Level<'_>, drill: bool, score: f64, cache: &str) {
        if self.options.debug {
            tracing::debug!(
                component = module_path!(),
                op = "score",
                event = EVENT_SCORE,
                run_id = self.run_id.as_str(),
                left_path = %level.left_path,
                right_path = %level.right_path,
                drill = drill,
                score = score,
                cache = cache,
            );
        }
    }

    /// Dispatch boundary: wraps any fault exactly once with this level's context
    ///
    /// Committed levels whose two paths differ are recorded as pairs before
    /// their children.
    fn evaluate(&mut self, level: &Level<'a>, drill: bool) -> Result<f64> {
        if !drill {
            self.report_pair(level);
        }
        self.dispatch(level, drill).map_err(|err| {
            if err.kind() == ExErrorKind::ComparisonFailed {
                err
            } else {
                ExError::new(ExErrorKind::ComparisonFailed)
                    .with_op("score")
                    .with_paths(level.left_path.render(), level.right_path.render())
                    .with_drill(drill)
                    .with_message(err.to_string())
                    .with_source(err)
            }
        })
    }

    fn dispatch(&mut self, level: &Level<'a>, drill: bool) -> Result<f64> {
        let operators = Arc::clone(&self.operators);
        for operator in operators.iter().filter(|op| op.matches(level)) {
            if let Outcome::Handled(score) = operator.apply(level, self, drill)? {
                return Ok(score);
            }
        }

        if let Some(scorer) = level.scorer {
            return Ok(self.apply_override(scorer, level, drill));
        }

        match (level.left, level.right) {
            (Some(Value::Array(left)), Some(Value::Array(right))) => {
                self.compare_sequence(level, left, right, drill)
            }
            (Some(Value::Object(left)), Some(Value::Object(right))) => {
                self.compare_mapping(level, left, right, drill)
            }
            (Some(left), Some(right))
                if ValueKind::of(Some(left)) == ValueKind::of(Some(right)) =>
            {
                Ok(self.compare_primitive(level, left, right, drill))
            }
            _ => Ok(0.0),
        }
    }

    fn apply_override(&mut self, scorer: OverrideScorer, level: &Level<'a>, drill: bool) -> f64 {
        if !drill {
            let event = match scorer {
                OverrideScorer::KeyRemoved => EVENT_DICT_REMOVE,
                OverrideScorer::KeyAdded => EVENT_DICT_ADD,
            };
            self.report(event, level.clone(), Map::new());
        }
        0.0
    }

    fn compare_mapping(
        &mut self,
        level: &Level<'a>,
        left: &'a Map<String, Value>,
        right: &'a Map<String, Value>,
        drill: bool,
    ) -> Result<f64> {
        let keys: BTreeSet<&'a String> = left.keys().chain(right.keys()).collect();
        if keys.is_empty() {
            return Ok(FULL_MATCH);
        }

        let mut total = 0.0;
        for key in &keys {
            let child = match (left.get(*key), right.get(*key)) {
                (Some(l), Some(r)) => Level::new(
                    l,
                    r,
                    level.left_path.child_key(key),
                    level.right_path.child_key(key),
                ),
                (Some(l), None) => Level::left_only(l, level.left_path.child_key(key))
                    .with_scorer(OverrideScorer::KeyRemoved),
                (None, Some(r)) => Level::right_only(r, level.right_path.child_key(key))
                    .with_scorer(OverrideScorer::KeyAdded),
                (None, None) => continue,
            };
            total += self.score(&child, drill)?;
        }
        Ok(total / keys.len() as f64)
    }

    fn compare_primitive(
        &mut self,
        level: &Level<'a>,
        left: &Value,
        right: &Value,
        drill: bool,
    ) -> f64 {
        if left == right {
            return FULL_MATCH;
        }
        if !drill {
            let mut extra = Map::new();
            extra.insert("old".to_string(), left.clone());
            extra.insert("new".to_string(), right.clone());
            self.report(EVENT_VALUE_CHANGES, level.clone(), extra);
        }
        0.0
    }

    /// Append a record under `event`
    pub fn report(&mut self, event: &str, level: Level<'a>, extra: Map<String, Value>) {
        self.records.push(event, level, extra);
    }

    /// Record a path correspondence when the two rendered paths differ
    pub fn report_pair(&mut self, level: &Level<'a>) {
        if !level.paths_agree() {
            self.records.push(EVENT_PAIR, level.clone(), Map::new());
        }
    }

    pub(crate) fn order_policy(&self) -> Arc<dyn OrderPolicy> {
        Arc::clone(&self.order_policy)
    }

    /// Records under one event tag, in discovery order
    pub fn records(&self, event: &str) -> &[Record<'a>] {
        self.records.get(event)
    }

    /// Export every record grouped by event tag
    ///
    /// Tags come out sorted. `exclude_pairs` drops the path-correspondence
    /// group.
    pub fn to_map(&self, exclude_pairs: bool) -> BTreeMap<String, Vec<Value>> {
        self.records.to_map(exclude_pairs)
    }

    /// Root score of the completed run
    pub fn root_score(&self) -> Option<f64> {
        self.root_score
    }

    /// Verdict plus export, detached from the borrowed documents
    ///
    /// # Errors
    ///
    /// - `Internal` if no run completed successfully on this engine
    pub fn outcome(&self, exclude_pairs: bool) -> Result<DiffOutcome> {
        let score = self.root_score.ok_or_else(|| {
            ExError::new(ExErrorKind::Internal)
                .with_op("outcome")
                .with_message(format!("run {} has no completed diff", self.run_id))
        })?;
        Ok(DiffOutcome {
            equal: score == FULL_MATCH,
            score,
            records: self.to_map(exclude_pairs),
        })
    }
}
