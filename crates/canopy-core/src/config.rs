//! Pipeline configuration.
//!
//! A JSON document with named, typed fields. Unknown keys anywhere are
//! rejected at load time, as are values that would only fail later (duplicate
//! region ids, negative tolerance, non-finite areas).
//!
//! ```json
//! {
//!   "snap_raster": "data/snaprast.tif",
//!   "alignment": { "tolerance": 0.0001, "rule": "both_axes" },
//!   "nodata_threshold": 3,
//!   "score_mode": "unweighted",
//!   "regions": [
//!     { "id": "8", "name": "Winder Slope", "raster": "winder_slope/classes.tif",
//!       "canopy": "winder_slope/canopy.tif",
//!       "tiles": { "3408301_ne": "winder_slope/cfr3408301_ne.tif" },
//!       "inverted": false, "area_sqkm": 1234.5 }
//!   ],
//!   "gtpoints": { "min_area_sqkm": 100, "max_area_sqkm": 10000,
//!                 "min_points": 10, "max_points": 200, "seed": 2009 }
//! }
//! ```

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::alignment::{AlignmentChecker, MismatchRule, DEFAULT_TOLERANCE};
use crate::canopy::CANOPY_NODATA;
use crate::error::{CanopyError, Result};
use crate::gtpoints::PointBounds;
use crate::selection::ScoreMode;

fn default_tolerance() -> f64 {
    DEFAULT_TOLERANCE
}

fn default_nodata_threshold() -> i32 {
    CANOPY_NODATA
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AlignmentConfig {
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    #[serde(default)]
    pub rule: MismatchRule,
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        Self { tolerance: DEFAULT_TOLERANCE, rule: MismatchRule::default() }
    }
}

impl AlignmentConfig {
    pub fn checker(&self) -> AlignmentChecker {
        AlignmentChecker::new(self.tolerance, self.rule)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegionConfig {
    pub id: String,
    /// Display name; defaults to the id.
    #[serde(default)]
    pub name: Option<String>,
    /// Land-cover class raster covering the region, scored against its tiles.
    pub raster: PathBuf,
    /// Binary canopy raster (1 = canopy, 0 = non-canopy) for inversion
    /// correction and ground-truth points.
    #[serde(default)]
    pub canopy: Option<PathBuf>,
    /// Tile id → classified tile raster.
    #[serde(default)]
    pub tiles: BTreeMap<String, PathBuf>,
    /// Classifier output for this region has canopy and non-canopy swapped.
    #[serde(default)]
    pub inverted: bool,
    #[serde(default)]
    pub area_sqkm: Option<f64>,
}

impl RegionConfig {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }

    /// Name safe for file names: spaces and dashes become underscores.
    pub fn file_stem(&self) -> String {
        self.display_name().replace([' ', '-'], "_")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GtPointsConfig {
    pub min_area_sqkm: f64,
    pub max_area_sqkm: f64,
    pub min_points: u32,
    pub max_points: u32,
    #[serde(default)]
    pub seed: u64,
}

impl GtPointsConfig {
    pub fn bounds(&self) -> PointBounds {
        PointBounds {
            min_area_sqkm: self.min_area_sqkm,
            max_area_sqkm: self.max_area_sqkm,
            min_points: self.min_points,
            max_points: self.max_points,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    /// Reference raster whose cell size every tile must match.
    #[serde(default)]
    pub snap_raster: Option<PathBuf>,
    #[serde(default)]
    pub alignment: AlignmentConfig,
    /// Cells with values at or above this are no-data for gap detection.
    #[serde(default = "default_nodata_threshold")]
    pub nodata_threshold: i32,
    #[serde(default)]
    pub score_mode: ScoreMode,
    pub regions: Vec<RegionConfig>,
    #[serde(default)]
    pub gtpoints: Option<GtPointsConfig>,
}

impl PipelineConfig {
    /// Read, parse and validate a config file. Relative paths inside it are
    /// resolved against the file's directory.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| CanopyError::Io { path: path.to_path_buf(), source })?;
        let mut config: Self = serde_json::from_str(&text)?;
        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate without touching paths.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    fn resolve_paths(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        if let Some(p) = self.snap_raster.as_mut() {
            resolve(p);
        }
        for region in &mut self.regions {
            resolve(&mut region.raster);
            if let Some(p) = region.canopy.as_mut() {
                resolve(p);
            }
            region.tiles.values_mut().for_each(resolve);
        }
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(CanopyError::InvalidConfig(msg));

        let tol = self.alignment.tolerance;
        if !(tol.is_finite() && tol >= 0.0) {
            return invalid(format!("alignment.tolerance must be a non-negative number, got {tol}"));
        }
        if self.regions.is_empty() {
            return invalid("at least one region is required".into());
        }

        let mut seen = HashSet::new();
        for region in &self.regions {
            if region.id.trim().is_empty() {
                return invalid("region id must not be empty".into());
            }
            if !seen.insert(region.id.as_str()) {
                return invalid(format!("duplicate region id {:?}", region.id));
            }
            if let Some(area) = region.area_sqkm {
                if !(area.is_finite() && area >= 0.0) {
                    return invalid(format!("region {}: area_sqkm must be a non-negative number", region.id));
                }
            }
            if region.tiles.keys().any(|t| t.trim().is_empty()) {
                return invalid(format!("region {}: tile ids must not be empty", region.id));
            }
        }

        if let Some(gt) = &self.gtpoints {
            for (key, v) in [("min_area_sqkm", gt.min_area_sqkm), ("max_area_sqkm", gt.max_area_sqkm)] {
                if !(v.is_finite() && v >= 0.0) {
                    return invalid(format!("gtpoints.{key} must be a non-negative number, got {v}"));
                }
            }
        }
        Ok(())
    }

    pub fn region(&self, id: &str) -> Option<&RegionConfig> {
        self.regions.iter().find(|r| r.id == id)
    }

    /// All regions, or just `filter` if given. An unknown filter is an error.
    pub fn select_regions(&self, filter: Option<&str>) -> Result<Vec<&RegionConfig>> {
        match filter {
            None => Ok(self.regions.iter().collect()),
            Some(id) => self
                .region(id)
                .map(|r| vec![r])
                .ok_or_else(|| CanopyError::UnknownRegion(id.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"{ "regions": [ { "id": "8", "raster": "r8.tif" } ] }"#;

    #[test]
    fn defaults_fill_optional_fields() {
        let c = PipelineConfig::from_json_str(MINIMAL).unwrap();
        assert_eq!(c.alignment.tolerance, DEFAULT_TOLERANCE);
        assert_eq!(c.alignment.rule, MismatchRule::BothAxes);
        assert_eq!(c.nodata_threshold, 3);
        assert_eq!(c.score_mode, ScoreMode::Unweighted);
        assert!(c.snap_raster.is_none());
        assert!(c.gtpoints.is_none());
        let r = &c.regions[0];
        assert_eq!(r.display_name(), "8");
        assert!(!r.inverted);
        assert!(r.tiles.is_empty());
        assert!(r.canopy.is_none());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let top = r#"{ "regions": [ { "id": "8", "raster": "r.tif" } ], "verbosity": 2 }"#;
        assert!(matches!(PipelineConfig::from_json_str(top), Err(CanopyError::ConfigParse(_))));

        let nested = r#"{ "regions": [ { "id": "8", "raster": "r.tif", "phyreg": 8 } ] }"#;
        assert!(matches!(PipelineConfig::from_json_str(nested), Err(CanopyError::ConfigParse(_))));

        let alignment = r#"{ "alignment": { "tol": 1 }, "regions": [ { "id": "8", "raster": "r.tif" } ] }"#;
        assert!(PipelineConfig::from_json_str(alignment).is_err());
    }

    #[test]
    fn bad_mode_and_rule_are_parse_errors() {
        let mode = r#"{ "score_mode": "fast", "regions": [ { "id": "8", "raster": "r.tif" } ] }"#;
        assert!(PipelineConfig::from_json_str(mode).is_err());
        let rule = r#"{ "alignment": { "rule": "either" }, "regions": [ { "id": "8", "raster": "r.tif" } ] }"#;
        assert!(PipelineConfig::from_json_str(rule).is_err());
    }

    #[test]
    fn validation_catches_semantic_errors() {
        let cases = [
            r#"{ "regions": [] }"#,
            r#"{ "regions": [ { "id": "8", "raster": "a.tif" }, { "id": "8", "raster": "b.tif" } ] }"#,
            r#"{ "alignment": { "tolerance": -1 }, "regions": [ { "id": "8", "raster": "a.tif" } ] }"#,
            r#"{ "regions": [ { "id": "8", "raster": "a.tif", "area_sqkm": -3 } ] }"#,
            r#"{ "regions": [ { "id": " ", "raster": "a.tif" } ] }"#,
            r#"{ "regions": [ { "id": "8", "raster": "a.tif" } ],
                 "gtpoints": { "min_area_sqkm": -1, "max_area_sqkm": 5, "min_points": 1, "max_points": 2 } }"#,
        ];
        for text in cases {
            assert!(
                matches!(PipelineConfig::from_json_str(text), Err(CanopyError::InvalidConfig(_))),
                "accepted: {text}"
            );
        }
    }

    #[test]
    fn full_config_round_trips_fields() {
        let text = r#"{
            "snap_raster": "snap.tif",
            "alignment": { "tolerance": 0.001, "rule": "any_axis" },
            "nodata_threshold": 255,
            "score_mode": "weighted",
            "regions": [
                { "id": "8", "name": "Winder Slope", "raster": "r8.tif",
                  "tiles": { "b": "b.tif", "a": "a.tif" }, "inverted": true, "area_sqkm": 812.5 }
            ],
            "gtpoints": { "min_area_sqkm": 10, "max_area_sqkm": 100, "min_points": 5, "max_points": 50, "seed": 9 }
        }"#;
        let c = PipelineConfig::from_json_str(text).unwrap();
        assert_eq!(c.alignment.checker(), AlignmentChecker::new(0.001, MismatchRule::AnyAxis));
        assert_eq!(c.score_mode, ScoreMode::Weighted);
        let r = c.region("8").unwrap();
        assert_eq!(r.file_stem(), "Winder_Slope");
        assert_eq!(r.tiles.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(c.gtpoints.unwrap().bounds().max_points, 50);
    }

    #[test]
    fn select_regions_filters_by_id() {
        let c = PipelineConfig::from_json_str(MINIMAL).unwrap();
        assert_eq!(c.select_regions(None).unwrap().len(), 1);
        assert_eq!(c.select_regions(Some("8")).unwrap()[0].id, "8");
        assert!(matches!(c.select_regions(Some("9")), Err(CanopyError::UnknownRegion(_))));
    }

    #[test]
    fn load_resolves_relative_paths() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("canopy.json");
        fs::write(
            &path,
            r#"{ "snap_raster": "snap.tif",
                 "regions": [ { "id": "8", "raster": "r8.tif", "canopy": "c8.tif",
                                "tiles": { "t": "/abs/t.tif" } } ] }"#,
        )
        .unwrap();
        let c = PipelineConfig::load(&path).unwrap();
        assert_eq!(c.snap_raster.as_deref(), Some(dir.path().join("snap.tif").as_path()));
        assert_eq!(c.regions[0].raster, dir.path().join("r8.tif"));
        assert_eq!(c.regions[0].canopy, Some(dir.path().join("c8.tif")));
        assert_eq!(c.regions[0].tiles["t"], PathBuf::from("/abs/t.tif"));
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let err = PipelineConfig::load(Path::new("/nonexistent/canopy.json")).unwrap_err();
        assert!(matches!(err, CanopyError::Io { .. }));
    }
}
