//! Weighted sweep: objective plus a class-count penalty.
//!
//! `F(w) = F + w · (|classes(G)|/20 − |classes(L)|/20)²` for `w` in `0..=MAX_WEIGHT`.
//! The penalty only depends on how many classes each histogram has, not on
//! which ones, and is added once per tile.
//!
//! Cost is 21 passes over the candidates. Callers with many tiles should rank
//! unweighted first and sweep a pre-filtered subset.

use serde::{Deserialize, Serialize};

use super::objective::{class_count_penalty, objective};
use super::{ensure_non_empty, map_candidates, TileCandidate};
use crate::error::{CanopyError, Result};
use crate::histogram::ClassHistogram;

pub const MAX_WEIGHT: u32 = 20;

/// Best tile at one weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedPick {
    pub weight: u32,
    pub id: String,
    pub score: f64,
}

/// One pick per weight, ascending by weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<WeightedPick>", into = "Vec<WeightedPick>")]
pub struct WeightedScoreTable {
    picks: Vec<WeightedPick>,
}

impl WeightedScoreTable {
    pub fn get(&self, weight: u32) -> Option<&WeightedPick> {
        self.picks.get(weight as usize)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, WeightedPick> {
        self.picks.iter()
    }

    pub fn len(&self) -> usize {
        self.picks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.picks.is_empty()
    }
}

impl From<Vec<WeightedPick>> for WeightedScoreTable {
    fn from(mut picks: Vec<WeightedPick>) -> Self {
        picks.sort_by_key(|p| p.weight);
        Self { picks }
    }
}

impl From<WeightedScoreTable> for Vec<WeightedPick> {
    fn from(table: WeightedScoreTable) -> Self {
        table.picks
    }
}

impl<'a> IntoIterator for &'a WeightedScoreTable {
    type Item = &'a WeightedPick;
    type IntoIter = std::slice::Iter<'a, WeightedPick>;

    fn into_iter(self) -> Self::IntoIter {
        self.picks.iter()
    }
}

struct Terms {
    id: String,
    base: f64,
    penalty: f64,
}

/// Sweep weights 0..=20 and keep the lowest-scoring tile at each.
///
/// Ties at a weight go to the smallest id. Fails with `EmptyHistogram` for
/// an empty region or tile and with `NoCandidates` when there is nothing to pick.
pub fn score_weighted(region: &ClassHistogram, candidates: &[TileCandidate]) -> Result<WeightedScoreTable> {
    ensure_non_empty(region, candidates)?;
    if candidates.is_empty() {
        return Err(CanopyError::NoCandidates);
    }

    let mut terms = map_candidates(candidates, |c| Terms {
        id: c.id.clone(),
        base: objective(region, &c.histogram),
        penalty: class_count_penalty(region, &c.histogram),
    });
    terms.sort_by(|a, b| a.id.cmp(&b.id));

    let picks = (0..=MAX_WEIGHT)
        .map(|w| {
            let wf = w as f64;
            let mut best = &terms[0];
            let mut best_score = best.base + wf * best.penalty;
            for t in &terms[1..] {
                let s = t.base + wf * t.penalty;
                if s < best_score {
                    best = t;
                    best_score = s;
                }
            }
            WeightedPick { weight: w, id: best.id.clone(), score: best_score }
        })
        .collect();

    Ok(WeightedScoreTable { picks })
}
