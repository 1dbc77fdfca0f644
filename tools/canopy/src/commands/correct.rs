//! `canopy correct`: write flipped canopy rasters for inverted regions.
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use canopy_core::canopy::invert_canopy;
use canopy_core::config::PipelineConfig;
use log::{debug, info, warn};

use crate::geotiff::{read_grid, write_grid_u8};

/// Returns the rasters written. Existing outputs are left alone.
pub fn run(config: &PipelineConfig, filter: Option<&str>, output_dir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(output_dir).with_context(|| format!("Cannot create {}", output_dir.display()))?;

    let mut written = Vec::new();
    for region in config.select_regions(filter)? {
        if !region.inverted {
            debug!("{}: not inverted", region.display_name());
            continue;
        }
        let Some(canopy) = &region.canopy else {
            warn!("{}: inverted but no canopy raster configured, skipping", region.display_name());
            continue;
        };
        let out = output_dir.join(format!("corrected_canopy_{}.tif", region.file_stem()));
        if out.exists() {
            info!("{} exists, skipping", out.display());
            continue;
        }

        let grid = read_grid(canopy)?;
        let corrected =
            invert_canopy(&grid).with_context(|| format!("correcting {}", canopy.display()))?;
        write_grid_u8(&out, &corrected)?;
        info!("{}: wrote {}", region.display_name(), out.display());
        written.push(out);
    }
    Ok(written)
}
