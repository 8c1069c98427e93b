//! Archetype and color assignment
//!
//! Every building gets a silhouette archetype drawn from a per-tier weighted
//! table and a color from its tier's palette. The variety level decides how
//! many archetypes are in play. Both choices are pure functions of the variety
//! seed, the zone position and the building index.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::VarietyLevel;
use crate::geometry::Extent;
use crate::placement::buildings::BuildingPlacement;
use crate::seeds::{hash_indices, indexed_rng};
use crate::zones::ZoneTier;

/// Salt separating the color hash from the archetype RNG
const COLOR_SALT: u64 = 0xC0;

/// Weight multiplier for non-rectangular shapes at EXTREME variety
const EXTREME_SHAPE_BOOST: f64 = 1.5;

/// Structural silhouette category
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Archetype {
    Rectangular,
    Tower,
    LShaped,
    UShaped,
    TShaped,
    Stepped,
    Circular,
    Courtyard,
    Complex,
}

impl Archetype {
    pub fn all() -> &'static [Archetype] {
        &[
            Archetype::Rectangular,
            Archetype::Tower,
            Archetype::LShaped,
            Archetype::UShaped,
            Archetype::TShaped,
            Archetype::Stepped,
            Archetype::Circular,
            Archetype::Courtyard,
            Archetype::Complex,
        ]
    }

    /// Lowest variety level at which this archetype becomes available
    pub fn min_level(&self) -> VarietyLevel {
        match self {
            Archetype::Rectangular | Archetype::Tower | Archetype::LShaped => VarietyLevel::Low,
            Archetype::TShaped | Archetype::UShaped | Archetype::Stepped => VarietyLevel::Medium,
            Archetype::Circular | Archetype::Courtyard => VarietyLevel::High,
            Archetype::Complex => VarietyLevel::Extreme,
        }
    }

    pub fn is_active(&self, level: VarietyLevel) -> bool {
        self.min_level() <= level
    }

    /// Whether a building of this footprint and height can take this shape
    pub fn fits(&self, footprint: Extent, floors: u32) -> bool {
        let aspect = footprint.aspect_ratio();
        match self {
            Archetype::Rectangular => true,
            Archetype::Circular => aspect > 0.7 && aspect < 1.4,
            Archetype::UShaped | Archetype::Courtyard => footprint.min_side() >= 8.0,
            Archetype::Tower => floors >= 8,
            Archetype::LShaped | Archetype::TShaped | Archetype::Stepped | Archetype::Complex => {
                footprint.min_side() >= 4.0
            }
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Archetype::Rectangular => "Rectangular",
            Archetype::Tower => "Tower",
            Archetype::LShaped => "L-Shaped",
            Archetype::UShaped => "U-Shaped",
            Archetype::TShaped => "T-Shaped",
            Archetype::Stepped => "Stepped",
            Archetype::Circular => "Circular",
            Archetype::Courtyard => "Courtyard",
            Archetype::Complex => "Complex",
        }
    }

    /// Plan glyph used by the ASCII renderer
    pub fn glyph(&self) -> char {
        match self {
            Archetype::Rectangular => 'r',
            Archetype::Tower => 't',
            Archetype::LShaped => 'l',
            Archetype::UShaped => 'u',
            Archetype::TShaped => 'T',
            Archetype::Stepped => 's',
            Archetype::Circular => 'o',
            Archetype::Courtyard => 'c',
            Archetype::Complex => 'x',
        }
    }
}

/// Base weight of an archetype within a tier
fn tier_weight(tier: ZoneTier, archetype: Archetype) -> f64 {
    use Archetype::*;
    match (tier, archetype) {
        (ZoneTier::Business, Rectangular) => 2.0,
        (ZoneTier::Business, Tower) => 8.0,
        (ZoneTier::Business, Stepped) => 6.0,
        (ZoneTier::Business, Complex) => 5.0,
        (ZoneTier::Business, Circular) => 2.0,
        (ZoneTier::Business, LShaped | TShaped) => 1.0,
        (ZoneTier::Business, UShaped | Courtyard) => 0.5,

        (ZoneTier::Commercial, Rectangular) => 5.0,
        (ZoneTier::Commercial, LShaped) => 3.0,
        (ZoneTier::Commercial, TShaped) => 3.0,
        (ZoneTier::Commercial, Stepped) => 3.0,
        (ZoneTier::Commercial, UShaped) => 2.0,
        (ZoneTier::Commercial, Courtyard) => 2.0,
        (ZoneTier::Commercial, Tower) => 2.0,
        (ZoneTier::Commercial, Circular) => 1.0,
        (ZoneTier::Commercial, Complex) => 1.0,

        (ZoneTier::Residential, LShaped) => 6.0,
        (ZoneTier::Residential, TShaped) => 5.0,
        (ZoneTier::Residential, Rectangular) => 3.0,
        (ZoneTier::Residential, UShaped) => 3.0,
        (ZoneTier::Residential, Courtyard) => 2.0,
        (ZoneTier::Residential, Stepped) => 1.0,
        (ZoneTier::Residential, Circular) => 0.5,
        (ZoneTier::Residential, Complex) => 0.5,
        (ZoneTier::Residential, Tower) => 0.0,
    }
}

/// Effective weights for every archetype, zero for inactive or ill-fitting ones
pub fn archetype_weights(
    tier: ZoneTier,
    level: VarietyLevel,
    footprint: Extent,
    floors: u32,
) -> Vec<(Archetype, f64)> {
    Archetype::all()
        .iter()
        .map(|&archetype| {
            let mut weight = tier_weight(tier, archetype);
            if !archetype.is_active(level) || !archetype.fits(footprint, floors) {
                weight = 0.0;
            }
            if level == VarietyLevel::Extreme && archetype != Archetype::Rectangular {
                weight *= EXTREME_SHAPE_BOOST;
            }
            (archetype, weight)
        })
        .collect()
}

/// Colors available to a tier as RGB triples. Palette sizes differ per tier.
pub fn palette(tier: ZoneTier) -> &'static [[u8; 3]] {
    match tier {
        // Glass, steel and dark stone
        ZoneTier::Business => &[
            [112, 128, 144],
            [70, 90, 110],
            [160, 175, 190],
            [48, 56, 66],
            [95, 140, 170],
            [185, 190, 195],
        ],
        // Brick, render and warm concrete
        ZoneTier::Commercial => &[
            [178, 102, 76],
            [205, 170, 125],
            [150, 110, 90],
            [222, 200, 160],
            [130, 130, 120],
            [190, 140, 100],
            [160, 82, 60],
            [210, 185, 150],
        ],
        // Pastel facades and timber
        ZoneTier::Residential => &[
            [236, 222, 196],
            [214, 196, 170],
            [200, 215, 190],
            [230, 205, 180],
            [190, 205, 220],
            [245, 235, 215],
            [210, 180, 160],
            [180, 160, 130],
            [225, 215, 230],
            [200, 190, 165],
        ],
    }
}

/// Archetype and palette entry chosen for one building
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variety {
    pub archetype: Archetype,
    pub color_index: usize,
}

/// A placed structure with its visual variety applied
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Building {
    #[serde(flatten)]
    pub placement: BuildingPlacement,
    pub archetype: Archetype,
    pub color_index: usize,
}

impl Building {
    pub fn new(placement: BuildingPlacement, variety: Variety) -> Self {
        Self {
            placement,
            archetype: variety.archetype,
            color_index: variety.color_index,
        }
    }

    /// Color of this building in its tier's palette
    pub fn color(&self, tier: ZoneTier) -> [u8; 3] {
        let colors = palette(tier);
        colors[self.color_index % colors.len()]
    }
}

/// Choose archetype and color for a placed building
pub fn assign_variety(
    building: &BuildingPlacement,
    tier: ZoneTier,
    level: VarietyLevel,
    seed: u64,
) -> Variety {
    let (i, j) = building.zone_position;
    let key = [i as u64, j as u64, building.index as u64];

    let weights = archetype_weights(tier, level, building.footprint, building.floor_count);
    let total: f64 = weights.iter().map(|(_, w)| w).sum();

    let mut archetype = Archetype::Rectangular;
    if total > 0.0 {
        let mut rng = indexed_rng(seed, &key);
        let mut roll = rng.gen_range(0.0..total);
        for (candidate, weight) in &weights {
            if *weight <= 0.0 {
                continue;
            }
            archetype = *candidate;
            if roll < *weight {
                break;
            }
            roll -= weight;
        }
    }

    let colors = palette(tier);
    let color_hash = hash_indices(seed, &[key[0], key[1], key[2], COLOR_SALT]);
    let color_index = (color_hash % colors.len() as u64) as usize;

    Variety {
        archetype,
        color_index,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point2;
    use std::collections::{HashMap, HashSet};

    fn placement(index: usize, footprint: Extent, floors: u32) -> BuildingPlacement {
        BuildingPlacement {
            zone_position: (2, 3),
            index,
            lot_index: index,
            center: Point2::default(),
            footprint,
            floor_count: floors,
            height: floors as f64 * 3.0,
        }
    }

    fn histogram(tier: ZoneTier, level: VarietyLevel, floors: u32) -> HashMap<Archetype, usize> {
        let mut counts = HashMap::new();
        for index in 0..2000 {
            let b = placement(index, Extent::new(12.0, 12.0), floors);
            *counts.entry(assign_variety(&b, tier, level, 7).archetype).or_insert(0) += 1;
        }
        counts
    }

    #[test]
    fn test_palette_sizes_differ() {
        let sizes: HashSet<usize> = ZoneTier::all().iter().map(|t| palette(*t).len()).collect();
        assert_eq!(sizes.len(), 3);
    }

    #[test]
    fn test_low_variety_restricts_set() {
        let counts = histogram(ZoneTier::Commercial, VarietyLevel::Low, 10);
        for archetype in counts.keys() {
            assert_eq!(archetype.min_level(), VarietyLevel::Low, "{archetype:?} leaked into LOW");
        }
    }

    #[test]
    fn test_extreme_enables_everything() {
        let counts = histogram(ZoneTier::Business, VarietyLevel::Extreme, 30);
        assert!(counts.contains_key(&Archetype::Complex));
        assert!(counts.contains_key(&Archetype::Circular));
        assert!(counts.len() >= 7);
    }

    #[test]
    fn test_extreme_lowers_rectangular_share() {
        let high = histogram(ZoneTier::Commercial, VarietyLevel::High, 10);
        let extreme = histogram(ZoneTier::Commercial, VarietyLevel::Extreme, 10);
        let rect = |h: &HashMap<Archetype, usize>| *h.get(&Archetype::Rectangular).unwrap_or(&0);
        assert!(rect(&extreme) < rect(&high));
    }

    #[test]
    fn test_tier_bias() {
        let residential = histogram(ZoneTier::Residential, VarietyLevel::Medium, 4);
        let count = |h: &HashMap<Archetype, usize>, a: Archetype| *h.get(&a).unwrap_or(&0);
        let lt = count(&residential, Archetype::LShaped) + count(&residential, Archetype::TShaped);
        assert!(lt > *residential.get(&Archetype::Rectangular).unwrap_or(&0));
        assert!(!residential.contains_key(&Archetype::Tower));

        let business = histogram(ZoneTier::Business, VarietyLevel::Medium, 30);
        let tall = count(&business, Archetype::Tower) + count(&business, Archetype::Stepped);
        assert!(tall > 2000 / 2);
    }

    #[test]
    fn test_unfit_shapes_excluded() {
        // Thin footprint: no circles, no courtyards; low building: no towers
        for index in 0..500 {
            let b = placement(index, Extent::new(20.0, 5.0), 3);
            let v = assign_variety(&b, ZoneTier::Business, VarietyLevel::Extreme, 11);
            assert!(!matches!(
                v.archetype,
                Archetype::Circular | Archetype::Courtyard | Archetype::UShaped | Archetype::Tower
            ));
        }
    }

    #[test]
    fn test_deterministic_and_color_in_palette() {
        for tier in ZoneTier::all() {
            for index in 0..200 {
                let b = placement(index, Extent::new(10.0, 9.0), 6);
                let a = assign_variety(&b, *tier, VarietyLevel::High, 3);
                let again = assign_variety(&b, *tier, VarietyLevel::High, 3);
                assert_eq!(a, again);
                assert!(a.color_index < palette(*tier).len());
            }
        }
    }

    #[test]
    fn test_colors_vary_across_buildings() {
        let colors: HashSet<usize> = (0..100)
            .map(|index| {
                let b = placement(index, Extent::new(10.0, 10.0), 3);
                assign_variety(&b, ZoneTier::Residential, VarietyLevel::Medium, 1).color_index
            })
            .collect();
        assert!(colors.len() > 5);
    }
}
