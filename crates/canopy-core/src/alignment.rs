//! Snap-grid cell size check.
//!
//! Reprojection leaves floating-point drift in cell sizes (0.6 becomes
//! 0.5999999...), so axes are compared with `|a - b| <= tolerance`.
//!
//! Historically the check only failed when *both* axes were off; a single-axis
//! mismatch went through. That behaviour is kept as the default
//! ([`MismatchRule::BothAxes`]) and [`MismatchRule::AnyAxis`] is available for
//! callers that want every axis enforced. Per-axis flags are reported either way.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_TOLERANCE: f64 = 0.0001;

/// Cell (width, height) in ground units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CellDims {
    pub width: f64,
    pub height: f64,
}

impl CellDims {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for CellDims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.width, self.height)
    }
}

/// Which axis mismatches make the check fail.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MismatchRule {
    /// Fail only when width and height are both out of tolerance.
    #[default]
    BothAxes,
    /// Fail when either axis is out of tolerance.
    AnyAxis,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlignmentResult {
    pub reference: CellDims,
    pub candidate: CellDims,
    pub tolerance: f64,
    pub width_matches: bool,
    pub height_matches: bool,
}

impl AlignmentResult {
    /// True when both axes are within tolerance, regardless of the rule that let the check pass.
    pub fn fully_aligned(&self) -> bool {
        self.width_matches && self.height_matches
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq)]
#[error("cell size {candidate} does not match snap grid {reference} within {tolerance} ({rule:?})")]
pub struct AlignmentError {
    pub reference: CellDims,
    pub candidate: CellDims,
    pub tolerance: f64,
    pub rule: MismatchRule,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlignmentChecker {
    pub tolerance: f64,
    pub rule: MismatchRule,
}

impl Default for AlignmentChecker {
    fn default() -> Self {
        Self { tolerance: DEFAULT_TOLERANCE, rule: MismatchRule::default() }
    }
}

impl AlignmentChecker {
    pub fn new(tolerance: f64, rule: MismatchRule) -> Self {
        Self { tolerance, rule }
    }

    pub fn check(&self, reference: CellDims, candidate: CellDims) -> Result<AlignmentResult, AlignmentError> {
        let width_matches = (reference.width - candidate.width).abs() <= self.tolerance;
        let height_matches = (reference.height - candidate.height).abs() <= self.tolerance;

        let failed = match self.rule {
            MismatchRule::BothAxes => !width_matches && !height_matches,
            MismatchRule::AnyAxis => !width_matches || !height_matches,
        };
        if failed {
            return Err(AlignmentError {
                reference,
                candidate,
                tolerance: self.tolerance,
                rule: self.rule,
            });
        }

        Ok(AlignmentResult {
            reference,
            candidate,
            tolerance: self.tolerance,
            width_matches,
            height_matches,
        })
    }
}

/// Check `candidate` against `reference` with the historical rule ([`MismatchRule::BothAxes`]).
pub fn check_alignment(
    reference: CellDims,
    candidate: CellDims,
    tolerance: f64,
) -> Result<AlignmentResult, AlignmentError> {
    AlignmentChecker::new(tolerance, MismatchRule::BothAxes).check(reference, candidate)
}
