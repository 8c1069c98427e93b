//! Generation pipeline
//!
//! `GridSpec -> (RoadNetwork, ZoneGrid, buildings per zone)` as a pure function.
//! Roads are generated in one ordered pass; zones and per-zone placement fan
//! out over rayon and are collected back in zone index order, so the result is
//! identical however the work is scheduled. Nothing outlives a call: every
//! regeneration recomputes from scratch.

use std::fmt::Write as _;
use std::time::{Duration, Instant};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::{CapacityLimits, GridSpec};
use crate::error::{CityGenError, Result};
use crate::geometry::Extent;
use crate::placement::lots::{usable_extent, Lot};
use crate::placement::place_buildings;
use crate::roads::{generate_roads, RoadNetwork};
use crate::seeds::CitySeeds;
use crate::variety::{assign_variety, Building};
use crate::verify::{check_roads, check_zone_grid, check_zone_plan, check_zones};
use crate::zones::{identify_zones, ZoneGrid, ZoneTier};

/// A recoverable degradation noticed during generation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// Buildings per block were cut to stay under the soft building ceiling
    CapacityDegraded {
        requested_per_block: usize,
        granted_per_block: usize,
        requested_buildings: usize,
        soft_limit: usize,
        reason: String,
    },
    /// A zone too small for even one lot; it stays empty
    DegenerateFit {
        zone: (usize, usize),
        usable: Extent,
    },
    /// A zone holds fewer lots than requested
    LotsReduced {
        zone: (usize, usize),
        requested: usize,
        granted: usize,
    },
}

/// Zone counts per tier
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierCounts {
    pub business: usize,
    pub commercial: usize,
    pub residential: usize,
}

impl From<[usize; 3]> for TierCounts {
    fn from(counts: [usize; 3]) -> Self {
        Self {
            business: counts[0],
            commercial: counts[1],
            residential: counts[2],
        }
    }
}

/// Lots and finished buildings of one zone
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ZoneBuildings {
    pub grid_position: (usize, usize),
    pub tier: ZoneTier,
    pub lots: Vec<Lot>,
    pub buildings: Vec<Building>,
}

/// Buildings for every zone, in zone index order, plus what was degraded
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BuildingSet {
    pub zones: Vec<ZoneBuildings>,
    pub diagnostics: Vec<Diagnostic>,
}

impl BuildingSet {
    pub fn building_count(&self) -> usize {
        self.zones.iter().map(|z| z.buildings.len()).sum()
    }
}

/// Summary of one run
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenerationReport {
    pub seed: u64,
    pub zone_count: usize,
    pub building_count: usize,
    pub tier_counts: TierCounts,
    pub diagnostics: Vec<Diagnostic>,
}

/// Complete output of one generation run
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CityLayout {
    /// Parameters actually used (after any capacity degradation)
    pub spec: GridSpec,
    pub roads: RoadNetwork,
    pub zones: ZoneGrid,
    pub buildings: Vec<ZoneBuildings>,
    pub report: GenerationReport,
}

impl CityLayout {
    pub fn building_count(&self) -> usize {
        self.report.building_count
    }

    /// Every building of the district in zone index order
    pub fn all_buildings(&self) -> impl Iterator<Item = (&ZoneBuildings, &Building)> {
        self.buildings
            .iter()
            .flat_map(|zone| zone.buildings.iter().map(move |b| (zone, b)))
    }

    /// Human readable multi-line summary
    pub fn summary(&self) -> String {
        let mut out = String::new();
        let s = &self.spec;
        let bounds = self.roads.bounds();
        let _ = writeln!(out, "District {}x{} blocks (seed {})", s.width, s.length, s.seed);
        let _ = writeln!(
            out,
            "  Footprint: {:.1} x {:.1} m, road mode {:?}, curve {:.2}",
            bounds.width(),
            bounds.height(),
            self.roads.mode,
            s.curve_intensity
        );
        let _ = writeln!(
            out,
            "  Roads: {} vertical, {} horizontal, {} diagonal (peak offset {:.2} m)",
            self.roads.vertical.len(),
            self.roads.horizontal.len(),
            self.roads.diagonals.len(),
            self.roads.peak_offset()
        );
        let t = self.report.tier_counts;
        let _ = writeln!(
            out,
            "  Zones: {} ({} business, {} commercial, {} residential)",
            self.report.zone_count, t.business, t.commercial, t.residential
        );
        let _ = writeln!(
            out,
            "  Buildings: {} ({} variety, {} per block requested)",
            self.report.building_count,
            s.variety_level.name(),
            s.buildings_per_block
        );
        if let Some(tallest) = self.all_buildings().map(|(_, b)| b.placement.floor_count).max() {
            let _ = writeln!(out, "  Tallest: {} floors", tallest);
        }
        for diagnostic in &self.report.diagnostics {
            let _ = writeln!(out, "  Note: {}", describe(diagnostic));
        }
        out
    }
}

/// One-line description of a diagnostic
pub fn describe(diagnostic: &Diagnostic) -> String {
    match diagnostic {
        Diagnostic::CapacityDegraded {
            requested_per_block,
            granted_per_block,
            reason,
            ..
        } => format!(
            "buildings per block reduced {requested_per_block} -> {granted_per_block}: {reason}"
        ),
        Diagnostic::DegenerateFit { zone, usable } => format!(
            "zone {:?} too small for a lot (usable {:.2} x {:.2} m)",
            zone, usable.width, usable.height
        ),
        Diagnostic::LotsReduced {
            zone,
            requested,
            granted,
        } => format!("zone {zone:?} fits {granted} of {requested} requested lots"),
    }
}

/// Wall-clock time spent per stage
#[derive(Clone, Copy, Debug, Default)]
pub struct StageTimings {
    pub roads: Duration,
    pub zones: Duration,
    pub buildings: Duration,
}

impl StageTimings {
    pub fn total(&self) -> Duration {
        self.roads + self.zones + self.buildings
    }
}

/// Apply the capacity ceilings, returning the grid spec to run with
pub fn apply_capacity(
    spec: &GridSpec,
    limits: &CapacityLimits,
) -> Result<(GridSpec, Option<Diagnostic>)> {
    let Some(blocks) = spec.block_count() else {
        return Err(CityGenError::Capacity {
            requested_blocks: usize::MAX,
            requested_buildings: usize::MAX,
            limit: limits.max_blocks,
            reason: "block count overflows",
        });
    };
    if blocks > limits.max_blocks {
        return Err(CityGenError::Capacity {
            requested_blocks: blocks,
            requested_buildings: blocks.saturating_mul(spec.buildings_per_block),
            limit: limits.max_blocks,
            reason: "block count above hard ceiling",
        });
    }
    let Some(requested) = spec.requested_buildings() else {
        return Err(CityGenError::Capacity {
            requested_blocks: blocks,
            requested_buildings: usize::MAX,
            limit: limits.hard_max_buildings,
            reason: "building count overflows",
        });
    };
    if requested > limits.hard_max_buildings {
        return Err(CityGenError::Capacity {
            requested_blocks: blocks,
            requested_buildings: requested,
            limit: limits.hard_max_buildings,
            reason: "building count above hard ceiling",
        });
    }
    if requested <= limits.soft_max_buildings {
        return Ok((spec.clone(), None));
    }

    let granted = (limits.soft_max_buildings / blocks).max(1).min(spec.buildings_per_block);
    let mut effective = spec.clone();
    effective.buildings_per_block = granted;
    let diagnostic = Diagnostic::CapacityDegraded {
        requested_per_block: spec.buildings_per_block,
        granted_per_block: granted,
        requested_buildings: requested,
        soft_limit: limits.soft_max_buildings,
        reason: format!(
            "{requested} requested buildings exceed the soft ceiling of {}",
            limits.soft_max_buildings
        ),
    };
    warn!(
        requested_per_block = spec.buildings_per_block,
        granted_per_block = granted,
        requested_buildings = requested,
        "capacity degraded"
    );
    Ok((effective, Some(diagnostic)))
}

/// Generate and verify only the road network
pub fn generate_roads_only(spec: &GridSpec) -> Result<RoadNetwork> {
    let network = generate_roads(spec)?;
    check_roads(&network, spec.width, spec.length)?;
    Ok(network)
}

/// Place, verify and decorate buildings for every zone of an existing grid.
///
/// The grid spec is used as given; apply [`apply_capacity`] first when it comes
/// from an untrusted source.
fn build_zones(zones: &ZoneGrid, spec: &GridSpec) -> Result<BuildingSet> {
    let seeds = CitySeeds::from_master(spec.seed);

    let planned: Vec<(ZoneBuildings, Vec<Diagnostic>)> = zones
        .zones
        .par_iter()
        .map(|zone| -> Result<(ZoneBuildings, Vec<Diagnostic>)> {
            let plan = place_buildings(zone, spec, seeds.placement);
            check_zone_plan(zone, &plan, &spec.placement)?;

            let mut diagnostics = Vec::new();
            if plan.lots.is_degenerate() {
                diagnostics.push(Diagnostic::DegenerateFit {
                    zone: zone.grid_position,
                    usable: usable_extent(zone.extent, &spec.placement),
                });
            } else if plan.lots.was_reduced() {
                diagnostics.push(Diagnostic::LotsReduced {
                    zone: zone.grid_position,
                    requested: plan.lots.requested,
                    granted: plan.lots.lots.len(),
                });
            }

            let buildings = plan
                .buildings
                .into_iter()
                .map(|placement| {
                    let variety =
                        assign_variety(&placement, zone.tier, spec.variety_level, seeds.variety);
                    Building::new(placement, variety)
                })
                .collect();

            Ok((
                ZoneBuildings {
                    grid_position: zone.grid_position,
                    tier: zone.tier,
                    lots: plan.lots.lots,
                    buildings,
                },
                diagnostics,
            ))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut set = BuildingSet {
        zones: Vec::with_capacity(planned.len()),
        diagnostics: Vec::new(),
    };
    for (zone, diagnostics) in planned {
        set.zones.push(zone);
        set.diagnostics.extend(diagnostics);
    }

    let degenerate = set
        .diagnostics
        .iter()
        .filter(|d| matches!(d, Diagnostic::DegenerateFit { .. }))
        .count();
    if degenerate > 0 {
        warn!(zones = degenerate, "zones too small for any lot were left empty");
    }
    Ok(set)
}

/// Recompute buildings for an existing zone grid, e.g. after only variety changed
pub fn regenerate_buildings(
    zones: &ZoneGrid,
    spec: &GridSpec,
    limits: &CapacityLimits,
) -> Result<BuildingSet> {
    spec.validate()?;
    if zones.width != spec.width || zones.length != spec.length {
        return Err(CityGenError::config(format!(
            "zone grid is {}x{} but the grid spec describes {}x{}",
            zones.width, zones.length, spec.width, spec.length
        )));
    }
    let (effective, capacity) = apply_capacity(spec, limits)?;
    check_zone_grid(zones, &effective)?;
    let mut set = build_zones(zones, &effective)?;
    if let Some(diagnostic) = capacity {
        set.diagnostics.insert(0, diagnostic);
    }
    Ok(set)
}

/// Run the full pipeline and report how long each stage took
pub fn generate_city_timed(
    spec: &GridSpec,
    limits: &CapacityLimits,
) -> Result<(CityLayout, StageTimings)> {
    spec.validate()?;
    let (effective, capacity) = apply_capacity(spec, limits)?;
    info!(
        width = effective.width,
        length = effective.length,
        seed = effective.seed,
        "generating district"
    );
    let mut timings = StageTimings::default();

    let start = Instant::now();
    let roads = generate_roads_only(&effective)?;
    timings.roads = start.elapsed();

    let start = Instant::now();
    let zones = identify_zones(&roads, &effective)?;
    check_zones(&zones, &roads, &effective)?;
    timings.zones = start.elapsed();

    let start = Instant::now();
    let set = build_zones(&zones, &effective)?;
    timings.buildings = start.elapsed();

    let mut diagnostics: Vec<Diagnostic> = capacity.into_iter().collect();
    diagnostics.extend(set.diagnostics);

    let report = GenerationReport {
        seed: effective.seed,
        zone_count: zones.len(),
        building_count: set.zones.iter().map(|z| z.buildings.len()).sum(),
        tier_counts: zones.tier_counts().into(),
        diagnostics,
    };
    info!(
        zones = report.zone_count,
        buildings = report.building_count,
        diagnostics = report.diagnostics.len(),
        "district generated"
    );
    debug!(?timings, "stage timings");

    Ok((
        CityLayout {
            spec: effective,
            roads,
            zones,
            buildings: set.zones,
            report,
        },
        timings,
    ))
}

/// Run the full pipeline
pub fn generate_city(spec: &GridSpec, limits: &CapacityLimits) -> Result<CityLayout> {
    generate_city_timed(spec, limits).map(|(layout, _)| layout)
}
