//! Canopy tile QA driver: snap-grid and gap checks, representative tile
//! selection, inversion correction and ground-truth point generation over the
//! GeoTIFFs listed in a pipeline config.
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use env_logger::Env;

mod commands;
mod geotiff;

// ── CLI ──────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "canopy", about = "Canopy classification tile QA and sampling", version)]
struct Cli {
    /// Pipeline config (JSON).
    #[arg(short, long, global = true, default_value = "canopy.json")]
    config: PathBuf,

    /// Process only this region id (omit to process all regions).
    #[arg(short, long, global = true)]
    region: Option<String>,

    /// Enable debug logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check tile cell sizes against the snap raster and look for mosaic gaps.
    Check,

    /// Rank each region's tiles by how well they represent the region's land cover.
    Select {
        /// "unweighted" or "weighted" (default: score_mode from the config).
        #[arg(short, long)]
        mode: Option<String>,

        /// Write JSON results here instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Write corrected rasters for regions flagged as inverted.
    Correct {
        #[arg(short, long, default_value = "corrected")]
        output_dir: PathBuf,
    },

    /// Generate ground-truth points per region, sized by region area.
    Gtpoints {
        #[arg(short, long, default_value = "gtpoints")]
        output_dir: PathBuf,

        /// Relabel the point files in this directory instead of sampling new ones.
        #[arg(long)]
        from: Option<PathBuf>,
    },
}

// ── main ─────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    let config = commands::load_config(&cli.config)?;
    let region = cli.region.as_deref();

    match cli.command {
        Command::Check => commands::check::run(&config, region),
        Command::Select { mode, output } => commands::select::run(&config, region, mode.as_deref(), output.as_deref()),
        Command::Correct { output_dir } => commands::correct::run(&config, region, &output_dir).map(|_| ()),
        Command::Gtpoints { output_dir, from: None } => commands::gtpoints::run(&config, region, &output_dir).map(|_| ()),
        Command::Gtpoints { output_dir, from: Some(from) } => {
            commands::gtpoints::relabel(&config, region, &from, &output_dir).map(|_| ())
        }
    }
}
