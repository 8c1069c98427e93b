//! Zone identification
//!
//! Computes the blocks enclosed by the road network and classifies each by its
//! Manhattan distance from the grid center: a radial scheme with business at the
//! core, a commercial ring, and residential everywhere else.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{GridSpec, TierThresholds};
use crate::error::{CityGenError, Result};
use crate::geometry::{Extent, Point2, Rect};
use crate::roads::{Axis, RoadNetwork, RoadSegment};

/// Smallest extent a zone is given when its roads nearly touch
const MIN_ZONE_EXTENT: f64 = 1e-3;

/// Zoning classification driving height and archetype bias
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneTier {
    Business,
    Commercial,
    Residential,
}

impl ZoneTier {
    pub fn all() -> &'static [ZoneTier] {
        &[ZoneTier::Business, ZoneTier::Commercial, ZoneTier::Residential]
    }

    /// Classify a Manhattan distance from the grid center
    pub fn from_distance(distance: u32, thresholds: &TierThresholds) -> Self {
        if distance <= thresholds.business_max {
            ZoneTier::Business
        } else if distance <= thresholds.commercial_max {
            ZoneTier::Commercial
        } else {
            ZoneTier::Residential
        }
    }

    /// Inclusive floor count range for buildings in this tier
    pub fn floor_range(&self) -> (u32, u32) {
        match self {
            ZoneTier::Business => (12, 45),
            ZoneTier::Commercial => (5, 15),
            ZoneTier::Residential => (2, 6),
        }
    }

    /// Storey height in meters
    pub fn floor_height(&self) -> f64 {
        match self {
            ZoneTier::Business => 4.0,
            ZoneTier::Commercial => 3.6,
            ZoneTier::Residential => 3.0,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ZoneTier::Business => "Business",
            ZoneTier::Commercial => "Commercial",
            ZoneTier::Residential => "Residential",
        }
    }
}

/// One block enclosed by two vertical and two horizontal roads
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    /// `(i, j)`: between vertical roads `i, i+1` and horizontal roads `j, j+1`
    pub grid_position: (usize, usize),
    pub center: Point2,
    /// Block size between the road edges
    pub extent: Extent,
    /// Manhattan distance from the grid center
    pub distance: u32,
    pub tier: ZoneTier,
}

impl Zone {
    pub fn bounds(&self) -> Rect {
        Rect::from_center(self.center, self.extent)
    }
}

/// All zones of a district, `width * length` of them, indexed `i * length + j`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ZoneGrid {
    pub width: usize,
    pub length: usize,
    pub zones: Vec<Zone>,
}

impl ZoneGrid {
    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    pub fn index_of(&self, i: usize, j: usize) -> usize {
        i * self.length + j
    }

    pub fn get(&self, i: usize, j: usize) -> Option<&Zone> {
        if i >= self.width || j >= self.length {
            return None;
        }
        self.zones.get(self.index_of(i, j))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Zone> {
        self.zones.iter()
    }

    /// Zone counts as `[business, commercial, residential]`
    pub fn tier_counts(&self) -> [usize; 3] {
        let mut counts = [0; 3];
        for zone in &self.zones {
            counts[zone.tier as usize] += 1;
        }
        counts
    }
}

/// Grid cell the zoning rings are centered on
pub fn grid_center(width: usize, length: usize) -> (usize, usize) {
    (width / 2, length / 2)
}

pub fn manhattan_distance(a: (usize, usize), b: (usize, usize)) -> u32 {
    (a.0.abs_diff(b.0) + a.1.abs_diff(b.1)) as u32
}

/// Sort one road family by index and check it matches the expected count
fn ordered_family(network: &RoadNetwork, axis: Axis, blocks: usize) -> Result<Vec<&RoadSegment>> {
    let expected = blocks + 1;
    let family = network.segments(axis);
    if family.len() != expected {
        return Err(CityGenError::MalformedNetwork {
            axis,
            expected,
            found: family.len(),
        });
    }

    let mut sorted: Vec<&RoadSegment> = family.iter().collect();
    sorted.sort_by_key(|s| s.index);
    for (k, segment) in sorted.iter().enumerate() {
        if segment.index != k || segment.axis != axis {
            return Err(CityGenError::invariant(
                "zones",
                vec![k],
                format!(
                    "{axis} family expected road index {k}, found {} ({} axis)",
                    segment.index, segment.axis
                ),
            ));
        }
    }
    Ok(sorted)
}

/// Center coordinate and extent of the cell between two roads
fn span(low: &RoadSegment, high: &RoadSegment, road_width: f64) -> (f64, f64) {
    let center = (low.perturbed_coordinate + high.perturbed_coordinate) * 0.5;
    let spacing = high.perturbed_coordinate - low.perturbed_coordinate;
    (center, (spacing - road_width).max(MIN_ZONE_EXTENT))
}

/// Identify the `width * length` zones enclosed by the road network
pub fn identify_zones(network: &RoadNetwork, spec: &GridSpec) -> Result<ZoneGrid> {
    let vertical = ordered_family(network, Axis::Vertical, spec.width)?;
    let horizontal = ordered_family(network, Axis::Horizontal, spec.length)?;

    let road_width = network.nominal_width;
    let center = grid_center(spec.width, spec.length);
    let length = spec.length;

    let zones: Vec<Zone> = (0..spec.width * spec.length)
        .into_par_iter()
        .map(|idx| {
            let (i, j) = (idx / length, idx % length);
            let (cx, ex) = span(vertical[i], vertical[i + 1], road_width);
            let (cy, ey) = span(horizontal[j], horizontal[j + 1], road_width);
            let distance = manhattan_distance((i, j), center);
            Zone {
                grid_position: (i, j),
                center: Point2::new(cx, cy),
                extent: Extent::new(ex, ey),
                distance,
                tier: ZoneTier::from_distance(distance, &spec.tiers),
            }
        })
        .collect();

    let grid = ZoneGrid {
        width: spec.width,
        length: spec.length,
        zones,
    };
    let [business, commercial, residential] = grid.tier_counts();
    debug!(zones = grid.len(), business, commercial, residential, "zones identified");
    Ok(grid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RoadPerturbationMode;
    use crate::roads::generate_roads;

    fn spec(width: usize, length: usize, curve: f64) -> GridSpec {
        GridSpec::builder()
            .size(width, length)
            .block_size(20.0)
            .road_width(2.0)
            .curve_intensity(curve)
            .build()
    }

    #[test]
    fn test_zone_count_never_collapses() {
        let modes = [
            RoadPerturbationMode::None,
            RoadPerturbationMode::OrthogonalOrganic,
            RoadPerturbationMode::DiagonalOverlay,
        ];
        for width in 1..=8 {
            for length in 1..=8 {
                for curve in [0.0, 0.3, 0.7, 1.0] {
                    for mode in modes {
                        for seed in 0..3 {
                            let mut s = spec(width, length, curve);
                            s.road_mode = mode;
                            s.seed = seed;
                            let network = generate_roads(&s).unwrap();
                            let zones = identify_zones(&network, &s).unwrap();
                            let label = format!("{width}x{length} curve {curve} {mode:?}");
                            assert_eq!(zones.len(), width * length, "{label}");
                            for (idx, zone) in zones.iter().enumerate() {
                                let (i, j) = zone.grid_position;
                                assert_eq!(zones.index_of(i, j), idx);
                                assert!(zone.extent.width > 0.0 && zone.extent.height > 0.0);
                            }
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_three_by_three_tiers() {
        let s = spec(3, 3, 0.0);
        let zones = identify_zones(&generate_roads(&s).unwrap(), &s).unwrap();
        assert_eq!(zones.tier_counts(), [1, 4, 4]);
        assert_eq!(zones.get(1, 1).unwrap().tier, ZoneTier::Business);
        assert_eq!(zones.get(0, 1).unwrap().tier, ZoneTier::Commercial);
        assert_eq!(zones.get(0, 0).unwrap().tier, ZoneTier::Residential);
        let middle = zones.get(1, 1).unwrap();
        assert_eq!(middle.center, Point2::new(0.0, 0.0));
        assert_eq!(middle.extent, Extent::new(18.0, 18.0));
    }

    #[test]
    fn test_single_zone_is_business() {
        let s = spec(1, 1, 1.0);
        let zones = identify_zones(&generate_roads(&s).unwrap(), &s).unwrap();
        assert_eq!(zones.len(), 1);
        assert_eq!(zones.zones[0].tier, ZoneTier::Business);
        assert_eq!(zones.zones[0].distance, 0);
    }

    #[test]
    fn test_even_grid_uses_integer_center() {
        let s = spec(2, 2, 0.0);
        let zones = identify_zones(&generate_roads(&s).unwrap(), &s).unwrap();
        assert_eq!(zones.get(1, 1).unwrap().tier, ZoneTier::Business);
        assert_eq!(zones.tier_counts(), [1, 2, 1]);
    }

    #[test]
    fn test_custom_thresholds_widen_rings() {
        let mut s = spec(5, 5, 0.0);
        s.tiers = TierThresholds {
            business_max: 1,
            commercial_max: 3,
        };
        let zones = identify_zones(&generate_roads(&s).unwrap(), &s).unwrap();
        assert_eq!(zones.tier_counts(), [5, 16, 4]);
    }

    #[test]
    fn test_missing_segment_fails_fast() {
        let s = spec(3, 3, 0.5);
        let mut network = generate_roads(&s).unwrap();
        network.vertical.pop();
        let err = identify_zones(&network, &s).unwrap_err();
        assert!(matches!(
            err,
            CityGenError::MalformedNetwork {
                axis: Axis::Vertical,
                expected: 4,
                found: 3
            }
        ));
        assert!(err.is_structural());
    }

    #[test]
    fn test_shuffled_segments_are_sorted() {
        let s = spec(4, 2, 0.7);
        let network = generate_roads(&s).unwrap();
        let expected = identify_zones(&network, &s).unwrap();

        let mut shuffled = network.clone();
        shuffled.vertical.reverse();
        shuffled.horizontal.swap(0, 2);
        assert_eq!(identify_zones(&shuffled, &s).unwrap(), expected);
    }

    #[test]
    fn test_duplicate_index_is_structural_error() {
        let s = spec(3, 3, 0.0);
        let mut network = generate_roads(&s).unwrap();
        network.horizontal[2].index = 1;
        let err = identify_zones(&network, &s).unwrap_err();
        assert!(matches!(err, CityGenError::StructuralInvariant { component: "zones", .. }));
    }
}
