//! Per-run score memoization.
//!
//! Keys are `(left path, right path, drill)` over segment paths, so a key
//! containing `->` never aliases a nested path. Entries live for the whole
//! run and are never invalidated.

use std::collections::HashMap;

use crate::model::{Level, Path};

/// Identity of one scoring call
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub left_path: Path,
    pub right_path: Path,
    pub drill: bool,
}

impl CacheKey {
    pub fn for_level(level: &Level<'_>, drill: bool) -> Self {
        Self {
            left_path: level.left_path.clone(),
            right_path: level.right_path.clone(),
            drill,
        }
    }
}

/// Hit/miss counters reported at the end of a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

#[derive(Debug, Default)]
pub struct ScoreCache {
    scores: HashMap<CacheKey, f64>,
    hits: u64,
    misses: u64,
}

impl ScoreCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a score, counting the hit or miss
    pub fn get(&mut self, key: &CacheKey) -> Option<f64> {
        match self.scores.get(key) {
            Some(score) => {
                self.hits += 1;
                Some(*score)
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    pub fn insert(&mut self, key: CacheKey, score: f64) {
        self.scores.insert(key, score);
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            entries: self.scores.len(),
        }
    }

    pub fn clear(&mut self) {
        self.scores.clear();
    }
}
