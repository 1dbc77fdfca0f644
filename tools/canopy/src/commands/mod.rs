//! Subcommand implementations. Each takes the loaded config and an optional
//! region filter and returns what it wrote, so tests can drive them directly.

use std::path::Path;

use anyhow::{Context, Result};
use canopy_core::config::PipelineConfig;
use log::info;

pub mod check;
pub mod correct;
pub mod gtpoints;
pub mod select;

pub fn load_config(path: &Path) -> Result<PipelineConfig> {
    let config = PipelineConfig::load(path).with_context(|| format!("loading config {}", path.display()))?;
    info!("Loaded {} region(s) from {}", config.regions.len(), path.display());
    Ok(config)
}
