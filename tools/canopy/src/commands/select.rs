//! `canopy select`: rank tiles by how closely their class mix matches the region.
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use canopy_core::config::PipelineConfig;
use canopy_core::store::collect_candidates;
use canopy_core::{score_tiles, ScoreMode, ScoreOutcome};
use log::{debug, info, warn};
use serde::Serialize;

use crate::geotiff::GeoTiffStore;

#[derive(Debug, Serialize)]
pub struct RegionSelection {
    pub region: String,
    pub name: String,
    #[serde(flatten)]
    pub result: ScoreOutcome,
}

pub fn select_tiles(config: &PipelineConfig, filter: Option<&str>, mode: ScoreMode) -> Result<Vec<RegionSelection>> {
    let store = GeoTiffStore::from_config(config);
    let mut out = Vec::new();

    for region in config.select_regions(filter)? {
        if region.tiles.is_empty() {
            warn!("{}: no tiles configured, skipping", region.display_name());
            continue;
        }
        let (hist, candidates) = collect_candidates(&store, &region.id)?;
        debug!("{}: {} classes over {} cells", region.id, hist.class_count(), hist.total());

        let result = score_tiles(&hist, &candidates, mode).with_context(|| format!("scoring region {}", region.id))?;
        match &result {
            ScoreOutcome::Unweighted(table) => {
                if let Some(best) = table.best() {
                    info!("{}: best tile {} (F = {:.6})", region.display_name(), best.id, best.score);
                }
            }
            ScoreOutcome::Weighted(table) => {
                for pick in table {
                    debug!("{}: w={} → {} ({:.6})", region.id, pick.weight, pick.id, pick.score);
                }
                if let (Some(lo), Some(hi)) = (table.iter().next(), table.iter().last()) {
                    info!(
                        "{}: w={} picks {}, w={} picks {}",
                        region.display_name(),
                        lo.weight,
                        lo.id,
                        hi.weight,
                        hi.id
                    );
                }
            }
        }

        out.push(RegionSelection { region: region.id.clone(), name: region.display_name().to_string(), result });
    }
    Ok(out)
}

pub fn run(config: &PipelineConfig, filter: Option<&str>, mode: Option<&str>, output: Option<&Path>) -> Result<()> {
    let mode = match mode {
        Some(m) => ScoreMode::from_str(m)?,
        None => config.score_mode,
    };
    info!("Scoring tiles ({mode})");
    let selections = select_tiles(config, filter, mode)?;

    let mut writer: Box<dyn Write> = match output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("Cannot create {}", path.display()))?,
        )),
        None => Box::new(io::stdout().lock()),
    };
    serde_json::to_writer_pretty(&mut writer, &selections)?;
    writeln!(writer)?;
    writer.flush()?;
    if let Some(path) = output {
        info!("Wrote {}", path.display());
    }
    Ok(())
}
