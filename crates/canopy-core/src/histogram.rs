//! Land-cover class histograms.
//!
//! Keys are ascending class codes, so every iteration (and every floating-point
//! sum built from one) happens in the same order for identical inputs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::grid::RasterGrid;

/// Class code → cell count. Zero counts are never stored and the grid's
/// no-data sentinel is never a key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<i32, u64>", into = "BTreeMap<i32, u64>")]
pub struct ClassHistogram {
    counts: BTreeMap<i32, u64>,
}

impl ClassHistogram {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count every cell of `grid` except the no-data sentinel.
    pub fn from_grid(grid: &RasterGrid) -> Self {
        let mut hist = Self::new();
        for &v in &grid.data {
            if !grid.is_nodata(v) {
                hist.add(v, 1);
            }
        }
        hist
    }

    /// Build from explicit `(class, count)` pairs; zero counts are dropped.
    pub fn from_counts<I>(counts: I) -> Self
    where
        I: IntoIterator<Item = (i32, u64)>,
    {
        let mut hist = Self::new();
        for (class, n) in counts {
            hist.add(class, n);
        }
        hist
    }

    pub fn add(&mut self, class: i32, n: u64) {
        if n > 0 {
            *self.counts.entry(class).or_insert(0) += n;
        }
    }

    pub fn count(&self, class: i32) -> u64 {
        self.counts.get(&class).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Number of distinct classes present.
    pub fn class_count(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Fraction of the total held by `class`; 0.0 for absent classes and empty histograms.
    pub fn fraction(&self, class: i32) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        self.count(class) as f64 / total as f64
    }

    pub fn classes(&self) -> impl Iterator<Item = i32> + '_ {
        self.counts.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (i32, u64)> + '_ {
        self.counts.iter().map(|(&c, &n)| (c, n))
    }
}

impl From<BTreeMap<i32, u64>> for ClassHistogram {
    fn from(map: BTreeMap<i32, u64>) -> Self {
        Self::from_counts(map)
    }
}

impl From<ClassHistogram> for BTreeMap<i32, u64> {
    fn from(hist: ClassHistogram) -> Self {
        hist.counts
    }
}

impl FromIterator<(i32, u64)> for ClassHistogram {
    fn from_iter<T: IntoIterator<Item = (i32, u64)>>(iter: T) -> Self {
        Self::from_counts(iter)
    }
}
