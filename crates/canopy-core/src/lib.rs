//! Numeric core of the canopy tile QA pipeline.
//!
//! Everything here works on arrays already in memory: snap-grid alignment,
//! mosaic gap detection, representative tile selection, canopy inversion
//! correction and ground-truth point sampling. Raster I/O is reached through
//! [`store::RasterStore`].

pub mod alignment;
pub mod canopy;
pub mod config;
pub mod error;
pub mod gaps;
pub mod grid;
pub mod gtpoints;
pub mod histogram;
pub mod selection;
pub mod store;

pub use alignment::{check_alignment, AlignmentChecker, AlignmentError, AlignmentResult, CellDims, MismatchRule};
pub use error::{CanopyError, Result};
pub use gaps::{detect_gaps, find_gap};
pub use grid::RasterGrid;
pub use histogram::ClassHistogram;
pub use selection::{score_tiles, ScoreMode, ScoreOutcome, ScoreTable, TileCandidate, WeightedScoreTable};
