//! Generation parameters.
//!
//! [`GridSpec`] is the immutable input of one generation run. [`CityConfig`]
//! bundles it with the capacity ceilings so both can be kept in one JSON file;
//! command line flags override what the file says.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::{CityGenError, Result};

/// How wide the active archetype set is
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum VarietyLevel {
    Low,
    Medium,
    High,
    Extreme,
}

impl VarietyLevel {
    pub fn name(&self) -> &'static str {
        match self {
            VarietyLevel::Low => "Low",
            VarietyLevel::Medium => "Medium",
            VarietyLevel::High => "High",
            VarietyLevel::Extreme => "Extreme",
        }
    }
}

/// Which road perturbation system is active for a network. Exactly one per run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum RoadPerturbationMode {
    /// Rigid orthogonal grid
    None,
    /// Orthogonal grid with bounded organic offsets scaled by `curve_intensity`
    OrthogonalOrganic,
    /// Rigid orthogonal grid plus corner-to-corner diagonal avenues
    DiagonalOverlay,
}

/// Sidewalk and lot sizing used by the block subdivider
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementParams {
    /// Clearance between the zone edge and the usable lot area
    pub sidewalk_margin: f64,
    /// Smallest lot side that may hold a building
    pub min_lot_size: f64,
    /// Gap kept between neighbouring lots
    pub lot_spacing: f64,
}

impl Default for PlacementParams {
    fn default() -> Self {
        Self {
            sidewalk_margin: 1.5,
            min_lot_size: 4.0,
            lot_spacing: 1.0,
        }
    }
}

/// Manhattan-distance cut-offs for zone tiers.
///
/// Distance `<= business_max` is business, `<= commercial_max` commercial,
/// anything further residential.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierThresholds {
    pub business_max: u32,
    pub commercial_max: u32,
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self {
            business_max: 0,
            commercial_max: 1,
        }
    }
}

/// Immutable input of one generation run
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridSpec {
    /// Blocks along x
    pub width: usize,
    /// Blocks along y
    pub length: usize,
    /// Road centerline spacing
    pub block_size: f64,
    /// Nominal road width, strictly below `block_size`
    pub road_width: f64,
    /// Organic curve strength in [0, 1]
    pub curve_intensity: f64,
    /// Fraction of `buildings_per_block` actually requested, in (0, 1]
    pub density: f64,
    pub variety_level: VarietyLevel,
    pub buildings_per_block: usize,
    /// Floor count spread within a tier's range: 0 uniform, 1 full range
    pub height_variation: f64,
    pub road_mode: RoadPerturbationMode,
    pub seed: u64,
    pub placement: PlacementParams,
    pub tiers: TierThresholds,
}

impl Default for GridSpec {
    fn default() -> Self {
        Self {
            width: 3,
            length: 3,
            block_size: 20.0,
            road_width: 2.0,
            curve_intensity: 0.0,
            density: 1.0,
            variety_level: VarietyLevel::Medium,
            buildings_per_block: 1,
            height_variation: 0.5,
            road_mode: RoadPerturbationMode::OrthogonalOrganic,
            seed: 0,
            placement: PlacementParams::default(),
            tiers: TierThresholds::default(),
        }
    }
}

fn check_positive(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(CityGenError::config(format!(
            "{name} must be a positive finite number, got {value}"
        )));
    }
    Ok(())
}

fn check_unit_range(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || !(0.0..=1.0).contains(&value) {
        return Err(CityGenError::config(format!("{name} must be within [0, 1], got {value}")));
    }
    Ok(())
}

impl GridSpec {
    pub fn builder() -> GridSpecBuilder {
        GridSpecBuilder::default()
    }

    /// Number of blocks, `None` when it does not fit in a `usize`
    pub fn block_count(&self) -> Option<usize> {
        self.width.checked_mul(self.length)
    }

    /// Buildings requested before density is applied, `None` on overflow
    pub fn requested_buildings(&self) -> Option<usize> {
        self.block_count()?.checked_mul(self.buildings_per_block)
    }

    /// Reject parameter combinations the generator cannot honour
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.length == 0 {
            return Err(CityGenError::config(format!(
                "grid must have at least one block per axis, got {}x{}",
                self.width, self.length
            )));
        }
        check_positive("block_size", self.block_size)?;
        check_positive("road_width", self.road_width)?;
        if self.road_width >= self.block_size {
            return Err(CityGenError::config(format!(
                "road_width ({}) must be smaller than block_size ({})",
                self.road_width, self.block_size
            )));
        }
        check_unit_range("curve_intensity", self.curve_intensity)?;
        if !self.density.is_finite() || self.density <= 0.0 || self.density > 1.0 {
            return Err(CityGenError::config(format!(
                "density must be within (0, 1], got {}",
                self.density
            )));
        }
        if self.buildings_per_block == 0 {
            return Err(CityGenError::config("buildings_per_block must be at least 1"));
        }
        check_unit_range("height_variation", self.height_variation)?;

        let p = &self.placement;
        if !p.sidewalk_margin.is_finite() || p.sidewalk_margin < 0.0 {
            return Err(CityGenError::config(format!(
                "sidewalk_margin must be non-negative, got {}",
                p.sidewalk_margin
            )));
        }
        check_positive("min_lot_size", p.min_lot_size)?;
        if !p.lot_spacing.is_finite() || p.lot_spacing < 0.0 {
            return Err(CityGenError::config(format!(
                "lot_spacing must be non-negative, got {}",
                p.lot_spacing
            )));
        }
        if self.tiers.business_max > self.tiers.commercial_max {
            return Err(CityGenError::config(format!(
                "tier thresholds out of order: business_max {} > commercial_max {}",
                self.tiers.business_max, self.tiers.commercial_max
            )));
        }
        Ok(())
    }
}

/// Fluent construction of a [`GridSpec`] starting from the defaults
#[derive(Default)]
pub struct GridSpecBuilder {
    spec: GridSpec,
}

impl GridSpecBuilder {
    pub fn size(mut self, width: usize, length: usize) -> Self {
        self.spec.width = width;
        self.spec.length = length;
        self
    }

    pub fn block_size(mut self, block_size: f64) -> Self {
        self.spec.block_size = block_size;
        self
    }

    pub fn road_width(mut self, road_width: f64) -> Self {
        self.spec.road_width = road_width;
        self
    }

    pub fn curve_intensity(mut self, curve: f64) -> Self {
        self.spec.curve_intensity = curve;
        self
    }

    pub fn density(mut self, density: f64) -> Self {
        self.spec.density = density;
        self
    }

    pub fn variety_level(mut self, level: VarietyLevel) -> Self {
        self.spec.variety_level = level;
        self
    }

    pub fn buildings_per_block(mut self, count: usize) -> Self {
        self.spec.buildings_per_block = count;
        self
    }

    pub fn height_variation(mut self, variation: f64) -> Self {
        self.spec.height_variation = variation;
        self
    }

    pub fn road_mode(mut self, mode: RoadPerturbationMode) -> Self {
        self.spec.road_mode = mode;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.spec.seed = seed;
        self
    }

    pub fn placement(mut self, placement: PlacementParams) -> Self {
        self.spec.placement = placement;
        self
    }

    pub fn tiers(mut self, tiers: TierThresholds) -> Self {
        self.spec.tiers = tiers;
        self
    }

    pub fn build(self) -> GridSpec {
        self.spec
    }
}

/// Ceilings guarding against runaway generation.
///
/// Above a hard ceiling the run is rejected. Above the soft building ceiling the
/// buildings per block are reduced and the reduction is reported.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CapacityLimits {
    pub max_blocks: usize,
    pub soft_max_buildings: usize,
    pub hard_max_buildings: usize,
}

impl Default for CapacityLimits {
    fn default() -> Self {
        Self {
            max_blocks: 25,
            soft_max_buildings: 50,
            hard_max_buildings: 500,
        }
    }
}

impl CapacityLimits {
    /// No practical ceiling; for tooling that sizes runs itself
    pub fn unbounded() -> Self {
        Self {
            max_blocks: usize::MAX,
            soft_max_buildings: usize::MAX,
            hard_max_buildings: usize::MAX,
        }
    }
}

/// On-disk configuration: the grid parameters plus capacity ceilings
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CityConfig {
    pub grid: GridSpec,
    pub limits: CapacityLimits,
}

impl CityConfig {
    /// Load configuration from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let config: CityConfig = serde_json::from_reader(reader)?;
        Ok(config)
    }

    /// Save configuration to a JSON file
    pub fn to_json_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_spec_is_valid() {
        assert!(GridSpec::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_road_as_wide_as_block() {
        let spec = GridSpec::builder().block_size(10.0).road_width(10.0).build();
        assert!(matches!(spec.validate(), Err(CityGenError::Configuration(_))));
    }

    #[test]
    fn test_rejects_bad_values() {
        let bad = [
            GridSpec::builder().size(0, 3).build(),
            GridSpec::builder().size(3, 0).build(),
            GridSpec::builder().block_size(-1.0).build(),
            GridSpec::builder().road_width(0.0).build(),
            GridSpec::builder().density(0.0).build(),
            GridSpec::builder().density(1.5).build(),
            GridSpec::builder().curve_intensity(1.2).build(),
            GridSpec::builder().curve_intensity(f64::NAN).build(),
            GridSpec::builder().buildings_per_block(0).build(),
            GridSpec::builder().height_variation(-0.1).build(),
            GridSpec::builder()
                .tiers(TierThresholds { business_max: 2, commercial_max: 1 })
                .build(),
        ];
        for spec in bad {
            assert!(spec.validate().is_err(), "expected rejection for {spec:?}");
        }
    }

    #[test]
    fn test_counts_report_overflow() {
        let spec = GridSpec::builder().size(4, 5).buildings_per_block(3).build();
        assert_eq!(spec.block_count(), Some(20));
        assert_eq!(spec.requested_buildings(), Some(60));

        let wide = GridSpec::builder().size(usize::MAX / 2, 3).build();
        assert_eq!(wide.block_count(), None);
        assert_eq!(wide.requested_buildings(), None);

        let crowded = GridSpec::builder().size(5, 5).buildings_per_block(usize::MAX).build();
        assert_eq!(crowded.block_count(), Some(25));
        assert_eq!(crowded.requested_buildings(), None);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let json = r#"{ "grid": { "width": 5, "variety_level": "extreme" } }"#;
        let config: CityConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.grid.width, 5);
        assert_eq!(config.grid.length, 3);
        assert_eq!(config.grid.variety_level, VarietyLevel::Extreme);
        assert_eq!(config.limits, CapacityLimits::default());
    }

    #[test]
    fn test_config_file_round_trip() {
        let config = CityConfig {
            grid: GridSpec::builder().size(4, 2).seed(77).build(),
            limits: CapacityLimits::default(),
        };
        let path = std::env::temp_dir().join("city_generator_test_config.json");
        config.to_json_file(&path).unwrap();
        let loaded = CityConfig::from_json_file(&path).unwrap();
        assert_eq!(config, loaded);
        std::fs::remove_file(&path).ok();
    }
}
