//! `canopy check`: snap-grid alignment and mosaic gap QA.
use anyhow::{bail, Context, Result};
use canopy_core::config::{PipelineConfig, RegionConfig};
use canopy_core::store::RasterStore;
use canopy_core::{find_gap, AlignmentChecker, CellDims};
use log::{info, warn};
use serde::Serialize;

use crate::geotiff::{read_grid, GeoTiffStore};

#[derive(Debug, Serialize)]
pub struct TileCheck {
    pub tile: String,
    pub cell_size: CellDims,
    pub width_matches: bool,
    pub height_matches: bool,
    /// Passed the configured mismatch rule.
    pub aligned: bool,
    /// First isolated no-data cell, `(row, col)`.
    pub gap: Option<(usize, usize)>,
}

#[derive(Debug, Serialize)]
pub struct RegionCheck {
    pub region: String,
    pub name: String,
    pub reference: CellDims,
    pub gap: Option<(usize, usize)>,
    pub tiles: Vec<TileCheck>,
}

impl RegionCheck {
    pub fn failures(&self) -> usize {
        let tiles = self.tiles.iter().filter(|t| !t.aligned || t.gap.is_some()).count();
        tiles + usize::from(self.gap.is_some())
    }
}

fn check_region(
    store: &GeoTiffStore,
    region: &RegionConfig,
    snap: Option<CellDims>,
    checker: AlignmentChecker,
    threshold: i32,
) -> Result<RegionCheck> {
    let grid = store.read_region_array(&region.id)?;
    let reference = snap.unwrap_or_else(|| grid.cell_dims());
    let gap = find_gap(&grid, threshold);
    if let Some((r, c)) = gap {
        warn!("{}: gap in region raster at row {}, col {}", region.display_name(), r, c);
    }

    let mut tiles = Vec::with_capacity(region.tiles.len());
    for id in store.tile_ids(&region.id)? {
        let tile = store.read_tile_array(&region.id, &id)?;
        let cell_size = tile.cell_dims();
        let (width_matches, height_matches, aligned) = match checker.check(reference, cell_size) {
            Ok(res) => {
                if !res.fully_aligned() {
                    warn!("{}/{}: one axis of {} is off the snap grid {}", region.id, id, cell_size, reference);
                }
                (res.width_matches, res.height_matches, true)
            }
            Err(e) => {
                warn!("{}/{}: {}", region.id, id, e);
                let tol = checker.tolerance;
                (
                    (reference.width - cell_size.width).abs() <= tol,
                    (reference.height - cell_size.height).abs() <= tol,
                    false,
                )
            }
        };
        let gap = find_gap(&tile, threshold);
        if let Some((r, c)) = gap {
            warn!("{}/{}: gap at row {}, col {}", region.id, id, r, c);
        }
        tiles.push(TileCheck { tile: id, cell_size, width_matches, height_matches, aligned, gap });
    }

    Ok(RegionCheck {
        region: region.id.clone(),
        name: region.display_name().to_string(),
        reference,
        gap,
        tiles,
    })
}

/// Check every selected region. Tiles are compared against the snap raster,
/// or against their own region raster when no snap raster is configured.
pub fn check_regions(config: &PipelineConfig, filter: Option<&str>) -> Result<Vec<RegionCheck>> {
    let regions = config.select_regions(filter)?;
    let store = GeoTiffStore::from_config(config);
    let checker = config.alignment.checker();

    let snap = match &config.snap_raster {
        Some(path) => {
            let dims = read_grid(path).with_context(|| "reading snap raster")?.cell_dims();
            info!("Snap grid {} from {}", dims, path.display());
            Some(dims)
        }
        None => None,
    };

    regions
        .into_iter()
        .map(|r| check_region(&store, r, snap, checker, config.nodata_threshold))
        .collect()
}

pub fn run(config: &PipelineConfig, filter: Option<&str>) -> Result<()> {
    let report = check_regions(config, filter)?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    let failures: usize = report.iter().map(RegionCheck::failures).sum();
    if failures > 0 {
        bail!("{} raster(s) failed QA", failures);
    }
    info!("All rasters passed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::fixtures;

    #[test]
    fn reports_misaligned_tiles_and_gaps() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = fixtures::pipeline(dir.path());
        let report = check_regions(&config, Some("8")).unwrap();
        assert_eq!(report.len(), 1);

        let r8 = &report[0];
        assert_eq!(r8.name, "Winder Slope");
        assert_eq!(r8.reference, CellDims::new(0.6, 0.6));
        assert_eq!(r8.gap, None);

        let a = &r8.tiles[0];
        assert_eq!(a.tile, "a");
        assert!(a.aligned);
        assert_eq!(a.gap, Some((1, 1)));

        let b = &r8.tiles[1];
        assert_eq!(b.tile, "b");
        assert!(!b.aligned);
        assert!(!b.width_matches && !b.height_matches);
        assert_eq!(b.gap, None);

        assert_eq!(r8.failures(), 2);
    }

    #[test]
    fn single_axis_mismatch_passes_by_default() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut config = fixtures::pipeline(dir.path());
        let reshaped = canopy_core::RasterGrid::from_vec(
            vec![2, 2, 2, 1],
            2,
            2,
            Some(fixtures::ND),
            CellDims::new(0.6, 0.7),
        )
        .unwrap();
        crate::geotiff::write_grid_u8(&dir.path().join("b.tif"), &reshaped).unwrap();

        let b = |config: &PipelineConfig| {
            let report = check_regions(config, Some("8")).unwrap();
            report[0].tiles.iter().find(|t| t.tile == "b").map(|t| t.aligned).unwrap()
        };
        assert!(b(&config));

        config.alignment.rule = canopy_core::MismatchRule::AnyAxis;
        assert!(!b(&config));
    }

    #[test]
    fn run_fails_when_anything_failed() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = fixtures::pipeline(dir.path());
        assert!(run(&config, Some("8")).is_err());
    }

    #[test]
    fn unknown_region_is_an_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = fixtures::pipeline(dir.path());
        assert!(check_regions(&config, Some("42")).is_err());
    }
}
