//! Sequence reconciliation.
//!
//! Two strategies, picked per level by the order policy:
//!
//! - **Order-preserving**: exact matches (drill score 1) form an LCS whose
//!   pairs become anchors; the gaps between anchors are aligned with a
//!   zero-cost insert/delete table to separate removed, added and updated
//!   items. Fast mode skips all of this and pairs items by index.
//! - **Order-agnostic**: a greedy pass binds exact matches, then the
//!   leftovers go through maximum-weight bipartite matching. Only pairs with
//!   a positive score count as matched.

use serde_json::{Map, Value};
use std::ops::Range;

use super::engine::{Differ, FULL_MATCH};
use super::matcher::max_weight_matching;
use crate::errors::Result;
use crate::model::{Level, EVENT_LIST_ADD, EVENT_LIST_REMOVE};

/// Outcome of aligning one gap between anchors
#[derive(Debug, Default, PartialEq, Eq)]
struct SegmentAlignment {
    removed: Vec<usize>,
    added: Vec<usize>,
    updated: Vec<(usize, usize)>,
}

fn item_level<'a>(
    level: &Level<'a>,
    left: &'a [Value],
    right: &'a [Value],
    i: usize,
    j: usize,
) -> Level<'a> {
    Level::new(
        &left[i],
        &right[j],
        level.left_path.child_index(i),
        level.right_path.child_index(j),
    )
}

fn ratio(matched: f64, left: usize, right: usize) -> f64 {
    match left.max(right) {
        0 => FULL_MATCH,
        longest => matched / longest as f64,
    }
}

impl<'a> Differ<'a> {
    pub(crate) fn compare_sequence(
        &mut self,
        level: &Level<'a>,
        left: &'a [Value],
        right: &'a [Value],
        drill: bool,
    ) -> Result<f64> {
        if self.order_policy().ignore_order(level, drill) {
            return self.compare_unordered(level, left, right, drill);
        }
        if left.is_empty() && right.is_empty() {
            return Ok(FULL_MATCH);
        }
        if self.options().fast_mode {
            self.compare_by_index(level, left, right, drill)
        } else {
            self.compare_aligned(level, left, right, drill)
        }
    }

    fn report_removed(&mut self, level: &Level<'a>, left: &'a [Value], i: usize) {
        let item = Level::left_only(&left[i], level.left_path.child_index(i));
        self.report(EVENT_LIST_REMOVE, item, Map::new());
    }

    fn report_added(&mut self, level: &Level<'a>, right: &'a [Value], j: usize) {
        let item = Level::right_only(&right[j], level.right_path.child_index(j));
        self.report(EVENT_LIST_ADD, item, Map::new());
    }

    fn compare_by_index(
        &mut self,
        level: &Level<'a>,
        left: &'a [Value],
        right: &'a [Value],
        drill: bool,
    ) -> Result<f64> {
        let common = left.len().min(right.len());
        let mut total = 0.0;
        for i in 0..common {
            total += self.score(&item_level(level, left, right, i, i), drill)?;
        }

        if !drill {
            for i in common..left.len() {
                self.report_removed(level, left, i);
            }
            for j in common..right.len() {
                self.report_added(level, right, j);
            }
        }
        Ok(ratio(total, left.len(), right.len()))
    }

    fn compare_aligned(
        &mut self,
        level: &Level<'a>,
        left: &'a [Value],
        right: &'a [Value],
        drill: bool,
    ) -> Result<f64> {
        let anchors = self.lcs_anchors(level, left, right)?;

        let mut total = 0.0;
        let mut gaps = Vec::with_capacity(anchors.len() + 1);
        let (mut next_left, mut next_right) = (0, 0);
        for &(i, j) in &anchors {
            total += self.score(&item_level(level, left, right, i, j), drill)?;
            gaps.push((next_left..i, next_right..j));
            next_left = i + 1;
            next_right = j + 1;
        }
        gaps.push((next_left..left.len(), next_right..right.len()));

        for (left_gap, right_gap) in gaps {
            let aligned = self.align_gap(level, left, right, left_gap, right_gap)?;
            if !drill {
                for &i in &aligned.removed {
                    self.report_removed(level, left, i);
                }
                for &j in &aligned.added {
                    self.report_added(level, right, j);
                }
            }
            for &(i, j) in &aligned.updated {
                total += self.score(&item_level(level, left, right, i, j), drill)?;
            }
        }

        Ok(ratio(total, left.len(), right.len()))
    }

    /// Index pairs of the longest run of exact matches, in order
    ///
    /// Backtracking takes a match first, then steps the left index back
    /// only when that strictly keeps a longer subsequence.
    fn lcs_anchors(
        &mut self,
        level: &Level<'a>,
        left: &'a [Value],
        right: &'a [Value],
    ) -> Result<Vec<(usize, usize)>> {
        let (n, m) = (left.len(), right.len());
        let mut table = vec![vec![0usize; m + 1]; n + 1];
        let mut exact = vec![vec![false; m]; n];

        for i in 1..=n {
            for j in 1..=m {
                let probe = item_level(level, left, right, i - 1, j - 1);
                if self.score(&probe, true)? == FULL_MATCH {
                    exact[i - 1][j - 1] = true;
                    table[i][j] = table[i - 1][j - 1] + 1;
                } else {
                    table[i][j] = table[i - 1][j].max(table[i][j - 1]);
                }
            }
        }

        let mut anchors = Vec::with_capacity(table[n][m]);
        let (mut i, mut j) = (n, m);
        while i > 0 && j > 0 {
            if exact[i - 1][j - 1] {
                anchors.push((i - 1, j - 1));
                i -= 1;
                j -= 1;
            } else if table[i - 1][j] > table[i][j - 1] {
                i -= 1;
            } else {
                j -= 1;
            }
        }
        anchors.reverse();
        Ok(anchors)
    }

    /// Align the items of one gap between anchors
    ///
    /// `table[x][y]` holds the best total drill score for aligning the
    /// suffixes starting at `x` and `y`. Reconstruction walks from the
    /// front and prefers removing, then adding, then pairing on ties.
    fn align_gap(
        &mut self,
        level: &Level<'a>,
        left: &'a [Value],
        right: &'a [Value],
        left_gap: Range<usize>,
        right_gap: Range<usize>,
    ) -> Result<SegmentAlignment> {
        let size_x = left_gap.len() + 1;
        let size_y = right_gap.len() + 1;
        let mut table = vec![vec![0.0_f64; size_y]; size_x];

        for x in (0..size_x - 1).rev() {
            for y in (0..size_y - 1).rev() {
                let probe = item_level(
                    level,
                    left,
                    right,
                    left_gap.start + x,
                    right_gap.start + y,
                );
                let diagonal = self.score(&probe, true)? + table[x + 1][y + 1];
                table[x][y] = table[x + 1][y].max(table[x][y + 1]).max(diagonal);
            }
        }

        let mut updated = Vec::new();
        let (mut x, mut y) = (0, 0);
        while x + y < size_x + size_y - 2 {
            let current = table[x][y];
            if x + 1 < size_x && current == table[x + 1][y] {
                x += 1;
                continue;
            }
            if y + 1 < size_y && current == table[x][y + 1] {
                y += 1;
                continue;
            }
            updated.push((left_gap.start + x, right_gap.start + y));
            x += 1;
            y += 1;
        }

        let removed = left_gap
            .clone()
            .filter(|i| !updated.iter().any(|&(l, _)| l == *i))
            .collect();
        let added = right_gap
            .clone()
            .filter(|j| !updated.iter().any(|&(_, r)| r == *j))
            .collect();

        Ok(SegmentAlignment {
            removed,
            added,
            updated,
        })
    }

    fn compare_unordered(
        &mut self,
        level: &Level<'a>,
        left: &'a [Value],
        right: &'a [Value],
        drill: bool,
    ) -> Result<f64> {
        let mut left_taken = vec![false; left.len()];
        let mut right_taken = vec![false; right.len()];
        let mut exact = Vec::new();

        for i in 0..left.len() {
            for j in 0..right.len() {
                if right_taken[j] {
                    continue;
                }
                if self.score(&item_level(level, left, right, i, j), true)? == FULL_MATCH {
                    exact.push((i, j));
                    left_taken[i] = true;
                    right_taken[j] = true;
                    break;
                }
            }
        }

        if !drill {
            self.commit_unordered(level, left, right, &exact, &left_taken, &right_taken)?;
        }

        Ok(ratio(exact.len() as f64, left.len(), right.len()))
    }

    /// Record the unordered reconciliation: exact pairs, then weighted
    /// matching over the leftovers
    fn commit_unordered(
        &mut self,
        level: &Level<'a>,
        left: &'a [Value],
        right: &'a [Value],
        exact: &[(usize, usize)],
        left_taken: &[bool],
        right_taken: &[bool],
    ) -> Result<()> {
        for &(i, j) in exact {
            self.score(&item_level(level, left, right, i, j), false)?;
        }

        let rest_left: Vec<usize> = (0..left.len()).filter(|&i| !left_taken[i]).collect();
        let rest_right: Vec<usize> = (0..right.len()).filter(|&j| !right_taken[j]).collect();

        let mut matched = Vec::new();
        if !rest_left.is_empty() && !rest_right.is_empty() {
            let mut weights = vec![vec![0.0; rest_right.len()]; rest_left.len()];
            for (a, &i) in rest_left.iter().enumerate() {
                for (b, &j) in rest_right.iter().enumerate() {
                    weights[a][b] = self.score(&item_level(level, left, right, i, j), true)?;
                }
            }
            let matching = max_weight_matching(&weights)?;
            matched = matching
                .pairs
                .into_iter()
                .filter(|&(a, b)| weights[a][b] > 0.0)
                .map(|(a, b)| (rest_left[a], rest_right[b]))
                .collect();
        }

        for &i in &rest_left {
            if !matched.iter().any(|&(l, _)| l == i) {
                self.report_removed(level, left, i);
            }
        }
        for &j in &rest_right {
            if !matched.iter().any(|&(_, r)| r == j) {
                self.report_added(level, right, j);
            }
        }
        for &(i, j) in &matched {
            self.score(&item_level(level, left, right, i, j), false)?;
        }
        Ok(())
    }
}
