//! Ground-truth point sampling.
//!
//! Each region gets a number of random points proportional to its area,
//! clamped to a configured range. Points fall inside valid cells of the
//! region's canopy raster and carry the canopy value under them, flipped for
//! regions whose classification came out inverted.
//!
//! Points from an earlier year can be carried forward with
//! [`relabel_points`], which reads their labels off a newer canopy raster.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::canopy::{canopy_label, canopy_value_at, ensure_canopy};
use crate::error::{CanopyError, Result};
use crate::grid::RasterGrid;

/// Linear area → point-count mapping.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PointBounds {
    pub min_area_sqkm: f64,
    pub max_area_sqkm: f64,
    pub min_points: u32,
    pub max_points: u32,
}

impl PointBounds {
    /// Swap reversed ranges so that `min <= max` on both axes.
    pub fn normalized(self) -> Self {
        let (min_area_sqkm, max_area_sqkm) = if self.min_area_sqkm > self.max_area_sqkm {
            (self.max_area_sqkm, self.min_area_sqkm)
        } else {
            (self.min_area_sqkm, self.max_area_sqkm)
        };
        let (min_points, max_points) = if self.min_points > self.max_points {
            (self.max_points, self.min_points)
        } else {
            (self.min_points, self.max_points)
        };
        Self { min_area_sqkm, max_area_sqkm, min_points, max_points }
    }
}

/// Number of ground-truth points for a region of `area_sqkm`.
///
/// `trunc(min_points + (max_points − min_points) / (max_area − min_area) · (area − min_area) + 1)`
/// clamped to `[min_points, max_points]`. The `+ 1` counts a partial point
/// (0.1 of a point still needs one). A degenerate area range gives `max_points`.
pub fn point_count(area_sqkm: f64, bounds: PointBounds) -> u32 {
    let b = bounds.normalized();
    let area_range = b.max_area_sqkm - b.min_area_sqkm;
    if area_range <= 0.0 {
        return b.max_points;
    }
    let slope = (b.max_points - b.min_points) as f64 / area_range;
    let raw = (b.min_points as f64 + slope * (area_sqkm - b.min_area_sqkm) + 1.0).trunc();
    if raw < b.min_points as f64 {
        b.min_points
    } else if raw > b.max_points as f64 {
        b.max_points
    } else {
        raw as u32
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundTruthPoint {
    pub id: usize,
    pub x: f64,
    pub y: f64,
    /// Canopy value under the point after inversion correction.
    pub gt: i32,
}

/// Draw `count` uniformly random points over the valid cells of `grid`.
///
/// Fails with `NotCanopy` when `grid` holds anything but canopy values, and
/// with `NoValidCells` when every cell is no-data and `count > 0`.
pub fn sample_points<R: Rng + ?Sized>(
    grid: &RasterGrid,
    count: u32,
    inverted: bool,
    rng: &mut R,
) -> Result<Vec<GroundTruthPoint>> {
    ensure_canopy(grid)?;
    if count == 0 {
        return Ok(Vec::new());
    }
    let valid: Vec<usize> = (0..grid.data.len()).filter(|&i| !grid.is_nodata(grid.data[i])).collect();
    if valid.is_empty() {
        return Err(CanopyError::NoValidCells);
    }

    let points = (0..count as usize)
        .map(|id| {
            let idx = valid[rng.gen_range(0..valid.len())];
            let (r, c) = (idx / grid.width, idx % grid.width);
            let x = grid.x_min + (c as f64 + rng.gen::<f64>()) * grid.cell_width;
            let y = grid.y_max - (r as f64 + rng.gen::<f64>()) * grid.cell_height;
            GroundTruthPoint { id, x, y, gt: canopy_label(grid.data[idx], inverted) }
        })
        .collect();
    Ok(points)
}

/// Existing points with labels read from a newer canopy raster.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Relabelled {
    pub points: Vec<GroundTruthPoint>,
    /// Ids of points outside the grid or on no-data; these keep no label.
    pub unlabelled: Vec<usize>,
}

/// Relabel `points` from `grid`, keeping ids and coordinates.
pub fn relabel_points(grid: &RasterGrid, points: &[GroundTruthPoint], inverted: bool) -> Result<Relabelled> {
    ensure_canopy(grid)?;
    let mut out = Relabelled::default();
    for p in points {
        match canopy_value_at(grid, p.x, p.y, inverted) {
            Some(gt) => out.points.push(GroundTruthPoint { gt, ..p.clone() }),
            None => out.unlabelled.push(p.id),
        }
    }
    Ok(out)
}
