use serde::{Deserialize, Serialize};

use crate::alignment::CellDims;
use crate::error::{CanopyError, Result};

/// A classified raster held in memory: land-cover or canopy codes, row-major,
/// row 0 = northernmost row.
///
/// Map coordinates use f64; `(x_min, y_max)` is the upper-left corner of the
/// upper-left cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RasterGrid {
    /// Row-major class codes.
    pub data: Vec<i32>,
    pub width: usize,
    pub height: usize,
    /// No-data sentinel, if the source raster declares one.
    pub nodata: Option<i32>,
    /// Cell width in ground units.
    pub cell_width: f64,
    /// Cell height in ground units (positive, north-up).
    pub cell_height: f64,
    pub x_min: f64,
    pub y_max: f64,
}

/// Map-coordinate bounding box of a grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub x_min: f64,
    pub y_min: f64,
    pub x_max: f64,
    pub y_max: f64,
}

impl RasterGrid {
    /// Wrap existing cell data. Fails if the data does not fill `width * height`
    /// or if either cell dimension is not a positive finite number.
    pub fn from_vec(
        data: Vec<i32>,
        width: usize,
        height: usize,
        nodata: Option<i32>,
        cell: CellDims,
    ) -> Result<Self> {
        if data.len() != width * height {
            return Err(CanopyError::GridShape { len: data.len(), width, height });
        }
        if !(cell.width > 0.0 && cell.width.is_finite() && cell.height > 0.0 && cell.height.is_finite()) {
            return Err(CanopyError::InvalidCellSize { width: cell.width, height: cell.height });
        }
        Ok(Self {
            data,
            width,
            height,
            nodata,
            cell_width: cell.width,
            cell_height: cell.height,
            x_min: 0.0,
            y_max: height as f64 * cell.height,
        })
    }

    /// Grid filled with a single value, unit cells, origin at (0, height).
    pub fn filled(width: usize, height: usize, fill: i32, nodata: Option<i32>) -> Self {
        Self {
            data: vec![fill; width * height],
            width,
            height,
            nodata,
            cell_width: 1.0,
            cell_height: 1.0,
            x_min: 0.0,
            y_max: height as f64,
        }
    }

    /// Place the grid's upper-left corner at `(x_min, y_max)`.
    pub fn with_origin(mut self, x_min: f64, y_max: f64) -> Self {
        self.x_min = x_min;
        self.y_max = y_max;
        self
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> i32 {
        self.data[row * self.width + col]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, val: i32) {
        self.data[row * self.width + col] = val;
    }

    #[inline]
    pub fn is_nodata(&self, value: i32) -> bool {
        self.nodata == Some(value)
    }

    pub fn cell_dims(&self) -> CellDims {
        CellDims::new(self.cell_width, self.cell_height)
    }

    pub fn extent(&self) -> Extent {
        Extent {
            x_min: self.x_min,
            y_min: self.y_max - self.height as f64 * self.cell_height,
            x_max: self.x_min + self.width as f64 * self.cell_width,
            y_max: self.y_max,
        }
    }

    /// Cell containing map coordinate `(x, y)`. Returns None outside the grid.
    ///
    /// `row = floor((y_max - y) / cell_height)`, `col = floor((x - x_min) / cell_width)`.
    pub fn row_col(&self, x: f64, y: f64) -> Option<(usize, usize)> {
        let fr = ((self.y_max - y) / self.cell_height).floor();
        let fc = ((x - self.x_min) / self.cell_width).floor();
        if !(fr >= 0.0 && fc >= 0.0) {
            return None;
        }
        let (row, col) = (fr as usize, fc as usize);
        if row >= self.height || col >= self.width {
            return None;
        }
        Some((row, col))
    }

    /// Map coordinate of the centre of cell `(row, col)`.
    pub fn cell_centre(&self, row: usize, col: usize) -> (f64, f64) {
        (
            self.x_min + (col as f64 + 0.5) * self.cell_width,
            self.y_max - (row as f64 + 0.5) * self.cell_height,
        )
    }

    /// Number of cells not equal to the no-data sentinel.
    pub fn valid_count(&self) -> usize {
        self.data.iter().filter(|&&v| !self.is_nodata(v)).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_vec_rejects_wrong_length() {
        let err = RasterGrid::from_vec(vec![0; 5], 2, 3, None, CellDims::new(1.0, 1.0));
        assert!(matches!(err, Err(CanopyError::GridShape { len: 5, width: 2, height: 3 })));
    }

    #[test]
    fn from_vec_rejects_non_positive_cells() {
        let err = RasterGrid::from_vec(vec![0; 4], 2, 2, None, CellDims::new(0.0, 1.0));
        assert!(matches!(err, Err(CanopyError::InvalidCellSize { .. })));
    }

    #[test]
    fn row_col_matches_upper_left_origin() {
        let grid = RasterGrid::from_vec(vec![0; 12], 4, 3, None, CellDims::new(0.5, 2.0))
            .unwrap()
            .with_origin(100.0, 50.0);
        // Upper-left cell.
        assert_eq!(grid.row_col(100.1, 49.9), Some((0, 0)));
        // Lower-right cell: x in [101.5, 102), y in [44, 46).
        assert_eq!(grid.row_col(101.9, 44.1), Some((2, 3)));
        assert_eq!(grid.row_col(99.9, 49.0), None);
        assert_eq!(grid.row_col(100.1, 43.9), None);
        assert_eq!(grid.row_col(102.0, 49.0), None);
    }

    #[test]
    fn cell_centre_round_trips_through_row_col() {
        let grid = RasterGrid::filled(7, 5, 1, None).with_origin(-3.0, 12.0);
        for r in 0..5 {
            for c in 0..7 {
                let (x, y) = grid.cell_centre(r, c);
                assert_eq!(grid.row_col(x, y), Some((r, c)));
            }
        }
    }

    #[test]
    fn extent_spans_all_cells() {
        let grid = RasterGrid::from_vec(vec![0; 6], 3, 2, None, CellDims::new(2.0, 4.0))
            .unwrap()
            .with_origin(10.0, 20.0);
        let e = grid.extent();
        assert_eq!((e.x_min, e.y_min, e.x_max, e.y_max), (10.0, 12.0, 16.0, 20.0));
    }

    #[test]
    fn valid_count_skips_nodata() {
        let grid = RasterGrid::from_vec(vec![1, 3, 0, 3], 2, 2, Some(3), CellDims::new(1.0, 1.0)).unwrap();
        assert_eq!(grid.valid_count(), 2);
    }
}
