//! Representative tile selection.
//!
//! Each candidate tile is scored by how far its land-cover class distribution
//! is from the distribution of the whole region (lower is more
//! representative). Two modes:
//!
//! * unweighted: one objective per tile, ranked ascending, ties by id;
//! * weighted: for every integer weight 0..=20 a class-count penalty scaled by
//!   the weight is added and the single best tile is kept.
//!
//! Both are pure functions of their inputs. With the `threading` feature the
//! per-candidate work runs on rayon; the final ordering does not depend on it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CanopyError, Result};
use crate::histogram::ClassHistogram;

pub mod objective;
pub mod ranking;
pub mod weighted;

pub use ranking::{score_unweighted, ScoreTable, TileScore};
pub use weighted::{score_weighted, WeightedPick, WeightedScoreTable, MAX_WEIGHT};

/// A tile considered for selection, for the duration of one scoring pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileCandidate {
    pub id: String,
    pub histogram: ClassHistogram,
}

impl TileCandidate {
    pub fn new(id: impl Into<String>, histogram: ClassHistogram) -> Self {
        Self { id: id.into(), histogram }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreMode {
    #[default]
    Unweighted,
    Weighted,
}

impl FromStr for ScoreMode {
    type Err = CanopyError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "unweighted" => Ok(Self::Unweighted),
            "weighted" => Ok(Self::Weighted),
            other => Err(CanopyError::InvalidMode(other.to_string())),
        }
    }
}

impl fmt::Display for ScoreMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Unweighted => "unweighted",
            Self::Weighted => "weighted",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", content = "scores", rename_all = "lowercase")]
pub enum ScoreOutcome {
    Unweighted(ScoreTable),
    Weighted(WeightedScoreTable),
}

/// Score `candidates` against `region` in the given mode.
pub fn score_tiles(region: &ClassHistogram, candidates: &[TileCandidate], mode: ScoreMode) -> Result<ScoreOutcome> {
    match mode {
        ScoreMode::Unweighted => score_unweighted(region, candidates).map(ScoreOutcome::Unweighted),
        ScoreMode::Weighted => score_weighted(region, candidates).map(ScoreOutcome::Weighted),
    }
}

/// Every fraction divides by a histogram total, so none may be zero.
fn ensure_non_empty(region: &ClassHistogram, candidates: &[TileCandidate]) -> Result<()> {
    if region.total() == 0 {
        return Err(CanopyError::EmptyHistogram { tile: None });
    }
    if let Some(c) = candidates.iter().find(|c| c.histogram.total() == 0) {
        return Err(CanopyError::EmptyHistogram { tile: Some(c.id.clone()) });
    }
    Ok(())
}

/// Apply `f` to every candidate, in parallel when `threading` is enabled.
/// Output order matches input order.
fn map_candidates<T, F>(candidates: &[TileCandidate], f: F) -> Vec<T>
where
    T: Send,
    F: Fn(&TileCandidate) -> T + Sync + Send,
{
    #[cfg(feature = "threading")]
    {
        use rayon::prelude::*;
        candidates.par_iter().map(f).collect()
    }
    #[cfg(not(feature = "threading"))]
    {
        candidates.iter().map(f).collect()
    }
}
