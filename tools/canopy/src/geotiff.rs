//! Single-band GeoTIFF I/O for class rasters, and the config-backed raster store.
//!
//! Georeferencing comes from the GeoTIFF model tags:
//!   ModelPixelScaleTag (33550) = [scale_x, scale_y, scale_z]
//!   ModelTiepointTag   (33922) = [i, j, k, x, y, z]
//! and the GDAL no-data tag (42113), an ASCII number.
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use canopy_core::config::PipelineConfig;
use canopy_core::store::RasterStore;
use canopy_core::{CanopyError, CellDims, RasterGrid};
use log::{debug, warn};
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::{colortype::Gray8, TiffEncoder};
use tiff::tags::Tag;

/// Code given to NaN cells of float rasters that declare no no-data value.
const NAN_CODE: i32 = i32::MIN;

// ── Reading ──────────────────────────────────────────────────────────────────

/// Cell size and upper-left corner from the model tags.
fn georeference<R: Read + Seek>(decoder: &mut Decoder<R>, height: usize) -> Result<(CellDims, f64, f64)> {
    let scale = match decoder.find_tag(Tag::ModelPixelScaleTag)? {
        Some(v) => v.into_f64_vec()?,
        None => bail!("missing ModelPixelScaleTag; cell size unknown"),
    };
    if scale.len() < 2 {
        bail!("ModelPixelScaleTag has {} values, expected 3", scale.len());
    }
    let cell = CellDims::new(scale[0], scale[1]);

    let (x_min, y_max) = match decoder.find_tag(Tag::ModelTiepointTag)? {
        Some(v) => {
            let tie = v.into_f64_vec()?;
            if tie.len() < 6 {
                bail!("ModelTiepointTag has {} values, expected 6", tie.len());
            }
            (tie[3] - tie[0] * cell.width, tie[4] + tie[1] * cell.height)
        }
        None => {
            warn!("missing ModelTiepointTag; placing origin at (0, {})", height as f64 * cell.height);
            (0.0, height as f64 * cell.height)
        }
    };
    Ok((cell, x_min, y_max))
}

fn nodata_tag<R: Read + Seek>(decoder: &mut Decoder<R>) -> Result<Option<f64>> {
    let Some(v) = decoder.find_tag(Tag::GdalNodata)? else {
        return Ok(None);
    };
    let text = v.into_string()?;
    let text = text.trim_matches(char::from(0)).trim();
    if text.eq_ignore_ascii_case("nan") {
        return Ok(Some(f64::NAN));
    }
    let nd = text.parse::<f64>().with_context(|| format!("unparseable GDAL no-data value {text:?}"))?;
    Ok(Some(nd))
}

fn ints<T: Copy>(v: Vec<T>, f: impl Fn(T) -> i32) -> Vec<i32> {
    v.into_iter().map(f).collect()
}

/// Read band 1 of a GeoTIFF as class codes.
pub fn read_grid(path: &Path) -> Result<RasterGrid> {
    let file = File::open(path).with_context(|| format!("Cannot open {}", path.display()))?;
    let mut decoder =
        Decoder::new(BufReader::new(file)).with_context(|| format!("Not a valid TIFF: {}", path.display()))?;
    let (width, height) = decoder.dimensions()?;
    let (width, height) = (width as usize, height as usize);
    if width == 0 || height == 0 {
        bail!("{} has zero size ({}x{})", path.display(), width, height);
    }

    let (cell, x_min, y_max) = georeference(&mut decoder, height)?;
    let nodata_raw = nodata_tag(&mut decoder)?;
    let mut nodata = nodata_raw.filter(|v| v.is_finite()).map(|v| v.round() as i32);

    let (samples, has_nan) = match decoder.read_image()? {
        DecodingResult::U8(v) => (ints(v, i32::from), false),
        DecodingResult::U16(v) => (ints(v, i32::from), false),
        DecodingResult::U32(v) => (ints(v, |x| x.min(i32::MAX as u32) as i32), false),
        DecodingResult::I8(v) => (ints(v, i32::from), false),
        DecodingResult::I16(v) => (ints(v, i32::from), false),
        DecodingResult::I32(v) => (v, false),
        DecodingResult::F32(v) => {
            let nan = v.iter().any(|x| x.is_nan());
            let code = nodata.unwrap_or(NAN_CODE);
            (ints(v, |x| if x.is_nan() { code } else { x.round() as i32 }), nan)
        }
        DecodingResult::F64(v) => {
            let nan = v.iter().any(|x| x.is_nan());
            let code = nodata.unwrap_or(NAN_CODE);
            (ints(v, |x| if x.is_nan() { code } else { x.round() as i32 }), nan)
        }
        _ => bail!("{}: unsupported sample type", path.display()),
    };
    if has_nan && nodata.is_none() {
        nodata = Some(NAN_CODE);
    }

    let cells = width * height;
    if samples.len() % cells != 0 {
        bail!("{}: {} samples do not fill {}x{}", path.display(), samples.len(), width, height);
    }
    let bands = samples.len() / cells;
    let data = if bands > 1 {
        warn!("{} has {} bands; using band 1", path.display(), bands);
        samples.into_iter().step_by(bands).collect()
    } else {
        samples
    };

    debug!(
        "{}: {}x{} cells of {} at ({}, {}), nodata {:?}",
        path.display(),
        width,
        height,
        cell,
        x_min,
        y_max,
        nodata
    );
    let grid = RasterGrid::from_vec(data, width, height, nodata, cell)?.with_origin(x_min, y_max);
    Ok(grid)
}

// ── Writing ──────────────────────────────────────────────────────────────────

/// Write an 8-bit single-band GeoTIFF carrying pixel scale, tiepoint and no-data tags.
pub fn write_grid_u8(path: &Path, grid: &RasterGrid) -> Result<()> {
    let bytes = grid
        .data
        .iter()
        .map(|&v| u8::try_from(v).with_context(|| format!("value {v} does not fit an 8-bit raster")))
        .collect::<Result<Vec<u8>>>()?;

    let file = File::create(path).with_context(|| format!("Cannot create {}", path.display()))?;
    let mut encoder = TiffEncoder::new(BufWriter::new(file))?;
    let mut image = encoder.new_image::<Gray8>(grid.width as u32, grid.height as u32)?;

    let scale = [grid.cell_width, grid.cell_height, 0.0];
    let tiepoint = [0.0, 0.0, 0.0, grid.x_min, grid.y_max, 0.0];
    image.encoder().write_tag(Tag::ModelPixelScaleTag, &scale[..])?;
    image.encoder().write_tag(Tag::ModelTiepointTag, &tiepoint[..])?;
    if let Some(nd) = grid.nodata {
        let text = nd.to_string();
        image.encoder().write_tag(Tag::GdalNodata, text.as_str())?;
    }
    image
        .write_data(&bytes)
        .with_context(|| format!("Write failed: {}", path.display()))?;
    Ok(())
}

// ── Store ────────────────────────────────────────────────────────────────────

struct RegionFiles {
    raster: PathBuf,
    tiles: BTreeMap<String, PathBuf>,
}

/// Raster store over the GeoTIFF paths listed in the pipeline config.
pub struct GeoTiffStore {
    regions: BTreeMap<String, RegionFiles>,
}

impl GeoTiffStore {
    pub fn from_config(config: &PipelineConfig) -> Self {
        let regions = config
            .regions
            .iter()
            .map(|r| (r.id.clone(), RegionFiles { raster: r.raster.clone(), tiles: r.tiles.clone() }))
            .collect();
        Self { regions }
    }

    fn region(&self, region: &str) -> canopy_core::Result<&RegionFiles> {
        self.regions
            .get(region)
            .ok_or_else(|| CanopyError::UnknownRegion(region.to_string()))
    }

    /// Path of a tile raster.
    pub fn tile_path(&self, region: &str, tile: &str) -> canopy_core::Result<&Path> {
        self.region(region)?
            .tiles
            .get(tile)
            .map(PathBuf::as_path)
            .ok_or_else(|| CanopyError::UnknownTile { region: region.to_string(), tile: tile.to_string() })
    }
}

fn backend(path: &Path, err: anyhow::Error) -> CanopyError {
    CanopyError::Backend { path: path.to_path_buf(), message: format!("{err:#}") }
}

impl RasterStore for GeoTiffStore {
    fn tile_ids(&self, region: &str) -> canopy_core::Result<Vec<String>> {
        Ok(self.region(region)?.tiles.keys().cloned().collect())
    }

    fn read_region_array(&self, region: &str) -> canopy_core::Result<RasterGrid> {
        let path = &self.region(region)?.raster;
        read_grid(path).map_err(|e| backend(path, e))
    }

    fn read_tile_array(&self, region: &str, tile: &str) -> canopy_core::Result<RasterGrid> {
        let path = self.tile_path(region, tile)?;
        read_grid(path).map_err(|e| backend(path, e))
    }
}
