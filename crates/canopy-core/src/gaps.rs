//! Mosaic gap detection.
//!
//! A stitching defect shows up as a lone no-data cell inside classified data.
//! Every cell with `value >= threshold` is treated as no-data; for each one the
//! 8-connected neighbourhood (radius 1, clipped at the grid edge, centre not
//! counted) is inspected and a cell with at most [`MAX_NODATA_NEIGHBOURS`]
//! no-data neighbours is reported as a gap. Large no-data areas (outside the
//! region boundary) have denser no-data neighbourhoods and are ignored.
//!
//! Known limitation: the heuristic assumes gaps are one cell wide. Wider holes
//! are missed, and no-data cells on a clipped grid edge or corner have fewer
//! neighbours, so a thin no-data strip along the edge can be flagged.

use crate::grid::RasterGrid;

/// A no-data cell with this many no-data neighbours or fewer is a gap.
pub const MAX_NODATA_NEIGHBOURS: usize = 2;

/// No-data cells among the (up to 8) neighbours of `(r, c)`.
fn nodata_neighbours(grid: &RasterGrid, r: usize, c: usize, threshold: i32) -> usize {
    let r0 = r.saturating_sub(1);
    let c0 = c.saturating_sub(1);
    let r1 = (r + 1).min(grid.height - 1);
    let c1 = (c + 1).min(grid.width - 1);

    let mut n = 0;
    for rr in r0..=r1 {
        for cc in c0..=c1 {
            if (rr, cc) != (r, c) && grid.get(rr, cc) >= threshold {
                n += 1;
            }
        }
    }
    n
}

/// Column of the first gap in row `r`, if any.
fn first_gap_in_row(grid: &RasterGrid, r: usize, threshold: i32) -> Option<usize> {
    (0..grid.width).find(|&c| {
        grid.get(r, c) >= threshold && nodata_neighbours(grid, r, c, threshold) <= MAX_NODATA_NEIGHBOURS
    })
}

/// First gap in row-major order, as `(row, col)`.
pub fn find_gap(grid: &RasterGrid, nodata_threshold: i32) -> Option<(usize, usize)> {
    (0..grid.height).find_map(|r| first_gap_in_row(grid, r, nodata_threshold).map(|c| (r, c)))
}

/// True if the grid contains at least one isolated no-data cell.
///
/// Stops at the first detection. With the `threading` feature rows are scanned
/// in parallel; only existence is reported, so the result is the same.
pub fn detect_gaps(grid: &RasterGrid, nodata_threshold: i32) -> bool {
    #[cfg(feature = "threading")]
    {
        use rayon::prelude::*;
        (0..grid.height)
            .into_par_iter()
            .any(|r| first_gap_in_row(grid, r, nodata_threshold).is_some())
    }
    #[cfg(not(feature = "threading"))]
    {
        find_gap(grid, nodata_threshold).is_some()
    }
}
