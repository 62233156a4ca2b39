//! Maximum-weight bipartite matching (Kuhn-Munkres).
//!
//! Works on a dense `n x m` matrix of nonnegative weights. The solver keeps
//! feasible vertex labels and grows an alternating tree from one free row
//! at a time, relaxing labels by the minimum column slack whenever the
//! equality subgraph runs out of edges. Every row of the smaller side is
//! matched; the larger side keeps `|m - n|` columns free.

use crate::errors::{ExError, ExErrorKind, Result};

const ABS_TOLERANCE: f64 = 1e-8;
const REL_TOLERANCE: f64 = 1e-5;

/// Result of a matching run, in the caller's orientation
#[derive(Debug, Clone, PartialEq)]
pub struct Matching {
    /// `(row, column)` pairs sorted by row
    pub pairs: Vec<(usize, usize)>,
    /// Sum of the matched weights
    pub total: f64,
}

impl Matching {
    fn empty() -> Self {
        Self {
            pairs: Vec::new(),
            total: 0.0,
        }
    }
}

/// Solve the assignment problem for `weights`, maximizing total weight
///
/// Rows may outnumber columns; the matrix is transposed internally and the
/// pairs are returned in the caller's orientation. An empty matrix (no rows
/// or no columns) yields an empty matching of weight 0.
///
/// # Errors
///
/// - `InvalidMatrix` when rows differ in length or a weight is negative,
///   NaN or infinite
pub fn max_weight_matching(weights: &[Vec<f64>]) -> Result<Matching> {
    let rows = weights.len();
    let cols = weights.first().map(Vec::len).unwrap_or(0);
    validate(weights, cols)?;

    if rows == 0 || cols == 0 {
        return Ok(Matching::empty());
    }

    let transposed = rows > cols;
    let oriented: Vec<Vec<f64>> = if transposed {
        (0..cols)
            .map(|c| (0..rows).map(|r| weights[r][c]).collect())
            .collect()
    } else {
        weights.to_vec()
    };

    let solver = KuhnMunkres::new(oriented);
    let assignment = solver.solve();

    let mut pairs: Vec<(usize, usize)> = assignment
        .into_iter()
        .map(|(x, y)| if transposed { (y, x) } else { (x, y) })
        .collect();
    pairs.sort_unstable();
    let total = pairs.iter().map(|&(r, c)| weights[r][c]).sum();

    Ok(Matching { pairs, total })
}

fn validate(weights: &[Vec<f64>], cols: usize) -> Result<()> {
    for (r, row) in weights.iter().enumerate() {
        if row.len() != cols {
            return Err(ExError::new(ExErrorKind::InvalidMatrix)
                .with_op("max_weight_matching")
                .with_message(format!(
                    "row {} has {} columns, expected {}",
                    r,
                    row.len(),
                    cols
                )));
        }
        if let Some((c, w)) = row
            .iter()
            .enumerate()
            .find(|(_, w)| !w.is_finite() || **w < 0.0)
        {
            return Err(ExError::new(ExErrorKind::InvalidMatrix)
                .with_op("max_weight_matching")
                .with_message(format!(
                    "weight at ({}, {}) must be finite and nonnegative, got {}",
                    r, c, w
                )));
        }
    }
    Ok(())
}

fn is_close(a: f64, b: f64) -> bool {
    (a - b).abs() <= ABS_TOLERANCE + REL_TOLERANCE * b.abs()
}

/// Solver state for one `n x m` problem with `n <= m`
struct KuhnMunkres {
    weights: Vec<Vec<f64>>,
    n: usize,
    m: usize,
    label_x: Vec<f64>,
    label_y: Vec<f64>,
    xy: Vec<Option<usize>>,
    yx: Vec<Option<usize>>,
}

/// Alternating tree rooted at one free row
struct Tree {
    in_s: Vec<bool>,
    in_t: Vec<bool>,
    slack: Vec<f64>,
    slack_x: Vec<usize>,
    prev: Vec<Option<usize>>,
}

impl KuhnMunkres {
    fn new(weights: Vec<Vec<f64>>) -> Self {
        let n = weights.len();
        let m = weights.first().map(Vec::len).unwrap_or(0);
        let label_x = weights
            .iter()
            .map(|row| row.iter().copied().fold(0.0_f64, f64::max))
            .collect();
        Self {
            weights,
            n,
            m,
            label_x,
            label_y: vec![0.0; m],
            xy: vec![None; n],
            yx: vec![None; m],
        }
    }

    fn solve(mut self) -> Vec<(usize, usize)> {
        while let Some(root) = self.xy.iter().position(Option::is_none) {
            let (x, y, tree) = self.find_augmenting_path(root);
            self.augment(x, y, &tree);
        }
        self.xy
            .iter()
            .enumerate()
            .filter_map(|(x, y)| y.map(|y| (x, y)))
            .collect()
    }

    fn reduced_cost(&self, x: usize, y: usize) -> f64 {
        self.label_x[x] + self.label_y[y] - self.weights[x][y]
    }

    fn find_augmenting_path(&mut self, root: usize) -> (usize, usize, Tree) {
        let mut tree = Tree {
            in_s: vec![false; self.n],
            in_t: vec![false; self.m],
            slack: (0..self.m).map(|y| self.reduced_cost(root, y)).collect(),
            slack_x: vec![root; self.m],
            prev: vec![None; self.n],
        };
        tree.in_s[root] = true;
        let mut queue = vec![root];

        loop {
            let mut head = 0;
            while head < queue.len() {
                let x = queue[head];
                head += 1;
                for y in 0..self.m {
                    if tree.in_t[y]
                        || !is_close(self.weights[x][y], self.label_x[x] + self.label_y[y])
                    {
                        continue;
                    }
                    match self.yx[y] {
                        None => return (x, y, tree),
                        Some(matched) => {
                            tree.in_t[y] = true;
                            queue.push(matched);
                            self.add_to_tree(&mut tree, matched, x);
                        }
                    }
                }
            }

            self.update_labels(&mut tree);
            queue.clear();

            for y in 0..self.m {
                if tree.in_t[y] || !is_close(tree.slack[y], 0.0) {
                    continue;
                }
                let x = tree.slack_x[y];
                match self.yx[y] {
                    None => return (x, y, tree),
                    Some(matched) => {
                        tree.in_t[y] = true;
                        if !tree.in_s[matched] {
                            queue.push(matched);
                            self.add_to_tree(&mut tree, matched, x);
                        }
                    }
                }
            }
        }
    }

    fn add_to_tree(&self, tree: &mut Tree, x: usize, prev_x: usize) {
        tree.in_s[x] = true;
        tree.prev[x] = Some(prev_x);
        for y in 0..self.m {
            let cost = self.reduced_cost(x, y);
            if cost < tree.slack[y] {
                tree.slack[y] = cost;
                tree.slack_x[y] = x;
            }
        }
    }

    fn update_labels(&mut self, tree: &mut Tree) {
        let delta = (0..self.m)
            .filter(|&y| !tree.in_t[y])
            .map(|y| tree.slack[y])
            .fold(f64::INFINITY, f64::min);
        for x in 0..self.n {
            if tree.in_s[x] {
                self.label_x[x] -= delta;
            }
        }
        for y in 0..self.m {
            if tree.in_t[y] {
                self.label_y[y] += delta;
            } else {
                tree.slack[y] -= delta;
            }
        }
    }

    /// Flip the alternating path ending at free column `y`
    fn augment(&mut self, mut x: usize, mut y: usize, tree: &Tree) {
        loop {
            self.yx[y] = Some(x);
            let previous_y = self.xy[x];
            self.xy[x] = Some(y);
            match (tree.prev[x], previous_y) {
                (Some(px), Some(py)) => {
                    x = px;
                    y = py;
                }
                _ => break,
            }
        }
    }
}
