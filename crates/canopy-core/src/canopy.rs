//! Binary canopy rasters (1 = canopy, 0 = non-canopy).
//!
//! Some regions come out of the classifier inverted. They are corrected by
//! flipping every valid cell; no-data becomes the 2-bit output sentinel.
//! Anything but 0 or 1 on a valid cell means the raster is not a canopy
//! raster (a land-cover class raster, say) and is rejected.

use crate::error::{CanopyError, Result};
use crate::grid::RasterGrid;

pub const CANOPY: i32 = 1;
pub const NON_CANOPY: i32 = 0;
/// No-data value of the 2-bit canopy output rasters.
pub const CANOPY_NODATA: i32 = 3;

pub fn is_canopy_value(v: i32) -> bool {
    v == CANOPY || v == NON_CANOPY
}

/// Label for a canopy cell value, flipped when the region is inverted.
pub fn canopy_label(v: i32, inverted: bool) -> i32 {
    if inverted {
        CANOPY + NON_CANOPY - v
    } else {
        v
    }
}

/// Fails with `NotCanopy` on the first valid cell (row-major) outside {0, 1}.
pub fn ensure_canopy(grid: &RasterGrid) -> Result<()> {
    match grid
        .data
        .iter()
        .position(|&v| !grid.is_nodata(v) && !is_canopy_value(v))
    {
        Some(i) => Err(CanopyError::NotCanopy {
            row: i / grid.width,
            col: i % grid.width,
            value: grid.data[i],
        }),
        None => Ok(()),
    }
}

/// Flip canopy and non-canopy on every valid cell.
///
/// The result always declares [`CANOPY_NODATA`]; cells that were no-data in
/// the input carry it.
pub fn invert_canopy(grid: &RasterGrid) -> Result<RasterGrid> {
    ensure_canopy(grid)?;
    let data = grid
        .data
        .iter()
        .map(|&v| if grid.is_nodata(v) { CANOPY_NODATA } else { canopy_label(v, true) })
        .collect();
    Ok(RasterGrid { data, nodata: Some(CANOPY_NODATA), ..grid.clone() })
}

/// Canopy value at map coordinate `(x, y)`, flipped when the region is known
/// to be inverted. None outside the grid or on no-data.
pub fn canopy_value_at(grid: &RasterGrid, x: f64, y: f64, inverted: bool) -> Option<i32> {
    let (r, c) = grid.row_col(x, y)?;
    let v = grid.get(r, c);
    if grid.is_nodata(v) {
        return None;
    }
    Some(canopy_label(v, inverted))
}
