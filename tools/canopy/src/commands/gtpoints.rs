//! `canopy gtpoints`: random ground-truth points per region, sized by area,
//! or last year's points relabelled from the current canopy rasters.
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use canopy_core::config::{PipelineConfig, RegionConfig};
use canopy_core::gtpoints::{point_count, relabel_points, sample_points, GroundTruthPoint};
use log::{info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::geotiff::read_grid;

#[derive(Debug, Serialize, Deserialize)]
pub struct PointFile {
    pub region: String,
    pub name: String,
    pub inverted: bool,
    pub points: Vec<GroundTruthPoint>,
    /// Ids of carried-over points that could not be labelled.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unlabelled: Vec<usize>,
}

impl PointFile {
    fn new(region: &RegionConfig, points: Vec<GroundTruthPoint>, unlabelled: Vec<usize>) -> Self {
        Self {
            region: region.id.clone(),
            name: region.display_name().to_string(),
            inverted: region.inverted,
            points,
            unlabelled,
        }
    }
}

fn file_name(region: &RegionConfig) -> String {
    format!("gtpoints_{}.json", region.file_stem())
}

fn write_points(path: &Path, doc: &PointFile) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Cannot create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, doc)?;
    writeln!(writer)?;
    writer.flush().with_context(|| format!("Write failed: {}", path.display()))?;
    Ok(())
}

fn read_points(path: &Path) -> Result<PointFile> {
    let text = fs::read_to_string(path).with_context(|| format!("Cannot read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid point file {}", path.display()))
}

/// Returns the point files written.
///
/// Each region draws from its own generator seeded with `seed + index`, index
/// being its position in the config, so output does not depend on the filter.
pub fn run(config: &PipelineConfig, filter: Option<&str>, output_dir: &Path) -> Result<Vec<PathBuf>> {
    let gt = config.gtpoints.ok_or_else(|| anyhow!("config has no \"gtpoints\" section"))?;
    let bounds = gt.bounds();
    let selected: Vec<&str> = config.select_regions(filter)?.into_iter().map(|r| r.id.as_str()).collect();
    fs::create_dir_all(output_dir).with_context(|| format!("Cannot create {}", output_dir.display()))?;

    let mut written = Vec::new();
    for (index, region) in config.regions.iter().enumerate() {
        if !selected.contains(&region.id.as_str()) {
            continue;
        }
        let Some(area) = region.area_sqkm else {
            warn!("{}: no area_sqkm, skipping", region.display_name());
            continue;
        };
        let Some(canopy) = &region.canopy else {
            warn!("{}: no canopy raster, skipping", region.display_name());
            continue;
        };

        let count = point_count(area, bounds);
        let grid = read_grid(canopy)?;
        let mut rng = StdRng::seed_from_u64(gt.seed.wrapping_add(index as u64));
        let points = sample_points(&grid, count, region.inverted, &mut rng)
            .with_context(|| format!("sampling region {}", region.id))?;

        let out = output_dir.join(file_name(region));
        write_points(&out, &PointFile::new(region, points, Vec::new()))?;
        info!("{}: {} points ({} km²) → {}", region.display_name(), count, area, out.display());
        written.push(out);
    }
    Ok(written)
}

/// Relabel the point files in `from_dir` from each region's canopy raster and
/// write them to `output_dir`. Regions without a previous file are skipped;
/// points off the raster or on no-data are dropped and listed as unlabelled.
pub fn relabel(
    config: &PipelineConfig,
    filter: Option<&str>,
    from_dir: &Path,
    output_dir: &Path,
) -> Result<Vec<PathBuf>> {
    let regions = config.select_regions(filter)?;
    fs::create_dir_all(output_dir).with_context(|| format!("Cannot create {}", output_dir.display()))?;

    let mut written = Vec::new();
    for region in regions {
        let Some(canopy) = &region.canopy else {
            warn!("{}: no canopy raster, skipping", region.display_name());
            continue;
        };
        let prev = from_dir.join(file_name(region));
        if !prev.exists() {
            warn!("{}: no previous points at {}, skipping", region.display_name(), prev.display());
            continue;
        }
        let out = output_dir.join(file_name(region));
        if out == prev {
            bail!("{} would overwrite its own input", out.display());
        }

        let old = read_points(&prev)?;
        if old.region != region.id {
            warn!("{} was written for region {}, not {}", prev.display(), old.region, region.id);
        }
        let grid = read_grid(canopy)?;
        let fresh = relabel_points(&grid, &old.points, region.inverted)
            .with_context(|| format!("relabelling region {}", region.id))?;
        if !fresh.unlabelled.is_empty() {
            warn!(
                "{}: {} point(s) off the canopy raster or on no-data: {:?}",
                region.display_name(),
                fresh.unlabelled.len(),
                fresh.unlabelled
            );
        }

        let labelled = fresh.points.len();
        write_points(&out, &PointFile::new(region, fresh.points, fresh.unlabelled))?;
        info!("{}: relabelled {} of {} points → {}", region.display_name(), labelled, old.points.len(), out.display());
        written.push(out);
    }
    Ok(written)
}
