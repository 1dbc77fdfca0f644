//! Raster access capability.
//!
//! Reading georeferenced rasters (and producing them: reprojection, mask
//! extraction, polygon conversion) belongs to whatever raster backend the
//! caller has. The numeric components only need arrays, so the backend is
//! reached through this narrow trait. Queries are explicit and stateless:
//! there is no "current selection" carried between calls.

use std::collections::BTreeMap;

use crate::error::{CanopyError, Result};
use crate::grid::RasterGrid;
use crate::histogram::ClassHistogram;
use crate::selection::TileCandidate;

pub trait RasterStore {
    /// Ids of the tiles belonging to `region`, ascending.
    fn tile_ids(&self, region: &str) -> Result<Vec<String>>;

    /// Classified raster covering the whole region.
    fn read_region_array(&self, region: &str) -> Result<RasterGrid>;

    /// Classified raster of one tile of `region`.
    fn read_tile_array(&self, region: &str, tile: &str) -> Result<RasterGrid>;
}

/// Region histogram plus one candidate per tile, in ascending tile id order.
pub fn collect_candidates<S: RasterStore + ?Sized>(
    store: &S,
    region: &str,
) -> Result<(ClassHistogram, Vec<TileCandidate>)> {
    let region_hist = ClassHistogram::from_grid(&store.read_region_array(region)?);
    let mut ids = store.tile_ids(region)?;
    ids.sort();
    let candidates = ids
        .into_iter()
        .map(|id| {
            let grid = store.read_tile_array(region, &id)?;
            Ok(TileCandidate::new(id, ClassHistogram::from_grid(&grid)))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok((region_hist, candidates))
}

#[derive(Debug, Clone, Default)]
struct MemoryRegion {
    raster: Option<RasterGrid>,
    tiles: BTreeMap<String, RasterGrid>,
}

/// In-memory store, for embedding callers that already hold their arrays.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    regions: BTreeMap<String, MemoryRegion>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_region(&mut self, region: impl Into<String>, grid: RasterGrid) {
        self.regions.entry(region.into()).or_default().raster = Some(grid);
    }

    pub fn insert_tile(&mut self, region: impl Into<String>, tile: impl Into<String>, grid: RasterGrid) {
        self.regions.entry(region.into()).or_default().tiles.insert(tile.into(), grid);
    }

    fn region(&self, region: &str) -> Result<&MemoryRegion> {
        self.regions.get(region).ok_or_else(|| CanopyError::UnknownRegion(region.to_string()))
    }
}

impl RasterStore for MemoryStore {
    fn tile_ids(&self, region: &str) -> Result<Vec<String>> {
        Ok(self.region(region)?.tiles.keys().cloned().collect())
    }

    fn read_region_array(&self, region: &str) -> Result<RasterGrid> {
        self.region(region)?
            .raster
            .clone()
            .ok_or_else(|| CanopyError::UnknownRegion(region.to_string()))
    }

    fn read_tile_array(&self, region: &str, tile: &str) -> Result<RasterGrid> {
        self.region(region)?.tiles.get(tile).cloned().ok_or_else(|| CanopyError::UnknownTile {
            region: region.to_string(),
            tile: tile.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::score_unweighted;

    fn grid(values: &[i32]) -> RasterGrid {
        let mut g = RasterGrid::filled(values.len(), 1, 0, Some(255));
        g.data.copy_from_slice(values);
        g
    }

    fn store() -> MemoryStore {
        let mut s = MemoryStore::new();
        s.insert_region("piedmont", grid(&[10, 10, 20, 255, 10, 20]));
        s.insert_tile("piedmont", "t2", grid(&[10, 20, 20, 20]));
        s.insert_tile("piedmont", "t1", grid(&[10, 10, 20, 255]));
        s
    }

    #[test]
    fn candidates_come_back_sorted_with_nodata_stripped() {
        let (region, candidates) = collect_candidates(&store(), "piedmont").unwrap();
        assert_eq!(region, ClassHistogram::from_counts([(10, 3), (20, 2)]));
        let ids: Vec<&str> = candidates.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["t1", "t2"]);
        assert_eq!(candidates[0].histogram.total(), 3);
    }

    #[test]
    fn store_feeds_scorer() {
        let (region, candidates) = collect_candidates(&store(), "piedmont").unwrap();
        let table = score_unweighted(&region, &candidates).unwrap();
        assert_eq!(table.best().unwrap().id, "t1");
    }

    #[test]
    fn unknown_region_and_tile() {
        let s = store();
        assert!(matches!(s.tile_ids("coastal"), Err(CanopyError::UnknownRegion(_))));
        assert!(matches!(s.read_tile_array("piedmont", "t9"), Err(CanopyError::UnknownTile { .. })));
    }
}
