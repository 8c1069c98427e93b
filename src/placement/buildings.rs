//! Building footprints and heights
//!
//! Each lot receives one building, inset from the lot edges by a random margin
//! so neighbours never touch, with a floor count drawn from its zone tier's range.

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use super::lots::Lot;
use crate::geometry::{Extent, Point2, Rect};
use crate::zones::{Zone, ZoneTier};

/// Per-side inset as a fraction of the lot side
const INSET_MIN: f64 = 0.06;
const INSET_MAX: f64 = 0.16;

/// A placed structure before archetype and color are chosen
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BuildingPlacement {
    pub zone_position: (usize, usize),
    /// Index of the building within its zone
    pub index: usize,
    pub lot_index: usize,
    /// Footprint center in world coordinates
    pub center: Point2,
    pub footprint: Extent,
    pub floor_count: u32,
    /// Roof height in meters
    pub height: f64,
}

impl BuildingPlacement {
    pub fn world_rect(&self) -> Rect {
        Rect::from_center(self.center, self.footprint)
    }
}

/// Floor count for a tier, spread by `height_variation` around the range midpoint
pub fn floor_count(tier: ZoneTier, height_variation: f64, rng: &mut ChaCha8Rng) -> u32 {
    let (lo, hi) = tier.floor_range();
    let r: f64 = rng.gen();
    let mid = (lo + hi) as f64 / 2.0;
    let span = (hi - lo) as f64;
    (mid + (r - 0.5) * span * height_variation)
        .round()
        .clamp(lo as f64, hi as f64) as u32
}

/// Place one building on a lot
pub fn place_on_lot(
    zone: &Zone,
    lot: &Lot,
    index: usize,
    height_variation: f64,
    rng: &mut ChaCha8Rng,
) -> BuildingPlacement {
    let inset_x = lot.width * rng.gen_range(INSET_MIN..INSET_MAX);
    let inset_y = lot.depth * rng.gen_range(INSET_MIN..INSET_MAX);
    let footprint = Extent::new(lot.width - 2.0 * inset_x, lot.depth - 2.0 * inset_y);

    // Drift inside the lot by at most half the inset, keeping a gap on every side
    let drift_x = rng.gen_range(-0.5..0.5) * inset_x;
    let drift_y = rng.gen_range(-0.5..0.5) * inset_y;

    let lot_center = lot.center_offset();
    let center = Point2::new(
        zone.center.x + lot_center.x + drift_x,
        zone.center.y + lot_center.y + drift_y,
    );

    let floors = floor_count(zone.tier, height_variation, rng);

    BuildingPlacement {
        zone_position: zone.grid_position,
        index,
        lot_index: lot.index,
        center,
        footprint,
        floor_count: floors,
        height: floors as f64 * zone.tier.floor_height(),
    }
}
