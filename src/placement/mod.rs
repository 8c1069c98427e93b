//! Block subdivision and building placement
//!
//! For each zone: decide how many lots it gets, lay them out on a sub-grid
//! inside the sidewalk margin, then put one building on every lot. Zones are
//! independent of each other, so callers may run this for many zones in
//! parallel.

pub mod buildings;
pub mod lots;

use serde::{Deserialize, Serialize};

use crate::config::GridSpec;
use crate::seeds::indexed_rng;
use crate::zones::{Zone, ZoneTier};

use buildings::{place_on_lot, BuildingPlacement};
use lots::{requested_lot_count, subdivide, LotLayout};

/// Lots and buildings of one zone
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ZonePlan {
    pub grid_position: (usize, usize),
    pub tier: ZoneTier,
    pub lots: LotLayout,
    pub buildings: Vec<BuildingPlacement>,
}

/// Subdivide a zone into lots
pub fn place_lots(zone: &Zone, spec: &GridSpec) -> LotLayout {
    let requested = requested_lot_count(spec.buildings_per_block, spec.density);
    subdivide(zone.extent, requested, &spec.placement)
}

/// Subdivide a zone and place one building per lot.
///
/// `placement_seed` is the placement stage seed; each building's RNG is keyed by
/// the zone position and lot index.
pub fn place_buildings(zone: &Zone, spec: &GridSpec, placement_seed: u64) -> ZonePlan {
    let lots = place_lots(zone, spec);
    let (i, j) = zone.grid_position;

    let buildings = lots
        .lots
        .iter()
        .enumerate()
        .map(|(index, lot)| {
            let mut rng = indexed_rng(placement_seed, &[i as u64, j as u64, lot.index as u64]);
            place_on_lot(zone, lot, index, spec.height_variation, &mut rng)
        })
        .collect();

    ZonePlan {
        grid_position: zone.grid_position,
        tier: zone.tier,
        lots,
        buildings,
    }
}
