use std::path::PathBuf;

use thiserror::Error;

use crate::alignment::AlignmentError;

#[derive(Error, Debug)]
pub enum CanopyError {
    #[error(transparent)]
    Alignment(#[from] AlignmentError),

    /// A histogram whose counts sum to zero. `tile` is `None` for the region.
    #[error("empty histogram for {}", .tile.as_deref().unwrap_or("region"))]
    EmptyHistogram { tile: Option<String> },

    #[error("no tile candidates to score")]
    NoCandidates,

    #[error("invalid scoring mode: {0:?} (expected \"unweighted\" or \"weighted\")")]
    InvalidMode(String),

    #[error("grid data length {len} does not match {width}x{height}")]
    GridShape { len: usize, width: usize, height: usize },

    #[error("cell size must be positive and finite, got {width} x {height}")]
    InvalidCellSize { width: f64, height: f64 },

    #[error("grid has no valid cells to sample")]
    NoValidCells,

    /// A valid cell of a canopy raster holding something other than 0 or 1.
    #[error("value {value} at row {row}, col {col} is not a canopy value (0 or 1)")]
    NotCanopy { row: usize, col: usize, value: i32 },

    #[error("unknown region: {0}")]
    UnknownRegion(String),

    #[error("unknown tile {tile} in region {region}")]
    UnknownTile { region: String, tile: String },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("raster backend error on {path}: {message}")]
    Backend { path: PathBuf, message: String },

    #[error("config parse error: {0}")]
    ConfigParse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, CanopyError>;
