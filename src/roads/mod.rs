//! Road network generation
//!
//! Produces the road centerlines of the district: one VERTICAL road per block
//! boundary along x and one HORIZONTAL road per block boundary along y. The grid
//! is centered on the origin. Depending on [`RoadPerturbationMode`] the interior
//! roads receive bounded organic offsets, or the rigid grid is overlaid with
//! diagonal avenues. Never both.

pub mod diagonal;
pub mod organic;

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{GridSpec, RoadPerturbationMode};
use crate::error::Result;
use crate::geometry::{Point2, Rect};
use crate::seeds::{indexed_rng, CitySeeds};

pub use diagonal::DiagonalRoad;
use diagonal::generate_diagonals;
use organic::OrganicBounds;

/// Orientation of a road family
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    /// Runs along x; its coordinate is a y position
    Horizontal,
    /// Runs along y; its coordinate is an x position
    Vertical,
}

impl Axis {
    /// Stable id mixed into per-road seeds
    pub fn id(&self) -> u64 {
        match self {
            Axis::Horizontal => 0,
            Axis::Vertical => 1,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::Horizontal => write!(f, "horizontal"),
            Axis::Vertical => write!(f, "vertical"),
        }
    }
}

/// One road centerline
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoadSegment {
    pub axis: Axis,
    pub index: usize,
    /// Position across the road before perturbation
    pub baseline_coordinate: f64,
    /// Position across the road after perturbation
    pub perturbed_coordinate: f64,
    /// Rendered width (nominal width with a small jitter)
    pub width: f64,
}

impl RoadSegment {
    pub fn offset(&self) -> f64 {
        self.perturbed_coordinate - self.baseline_coordinate
    }

    /// Near edge of the rendered road
    pub fn low_edge(&self) -> f64 {
        self.perturbed_coordinate - self.width * 0.5
    }

    /// Far edge of the rendered road
    pub fn high_edge(&self) -> f64 {
        self.perturbed_coordinate + self.width * 0.5
    }

    /// The strip this road covers within `bounds`
    pub fn footprint(&self, bounds: &Rect) -> Rect {
        match self.axis {
            Axis::Vertical => Rect::new(
                Point2::new(self.low_edge(), bounds.min.y),
                Point2::new(self.high_edge(), bounds.max.y),
            ),
            Axis::Horizontal => Rect::new(
                Point2::new(bounds.min.x, self.low_edge()),
                Point2::new(bounds.max.x, self.high_edge()),
            ),
        }
    }
}

/// All roads of one district
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoadNetwork {
    pub mode: RoadPerturbationMode,
    /// Ordered by index, `length + 1` entries
    pub horizontal: Vec<RoadSegment>,
    /// Ordered by index, `width + 1` entries
    pub vertical: Vec<RoadSegment>,
    /// Empty unless `mode` is `DiagonalOverlay`
    pub diagonals: Vec<DiagonalRoad>,
    /// Width used for logical spacing
    pub nominal_width: f64,
    /// Largest offset any road may receive
    pub max_offset: f64,
    pub bounds: Rect,
}

impl RoadNetwork {
    pub fn segments(&self, axis: Axis) -> &[RoadSegment] {
        match axis {
            Axis::Horizontal => &self.horizontal,
            Axis::Vertical => &self.vertical,
        }
    }

    pub fn segment_count(&self) -> usize {
        self.horizontal.len() + self.vertical.len()
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Largest absolute offset actually applied
    pub fn peak_offset(&self) -> f64 {
        self.horizontal
            .iter()
            .chain(self.vertical.iter())
            .map(|s| s.offset().abs())
            .fold(0.0, f64::max)
    }
}

/// Baseline coordinate of road `k` on an axis with `blocks` blocks
pub fn baseline_coordinate(k: usize, blocks: usize, block_size: f64) -> f64 {
    (k as f64 - blocks as f64 / 2.0) * block_size
}

/// District rectangle for a grid spec
pub fn district_bounds(spec: &GridSpec) -> Rect {
    Rect::new(
        Point2::new(
            baseline_coordinate(0, spec.width, spec.block_size),
            baseline_coordinate(0, spec.length, spec.block_size),
        ),
        Point2::new(
            baseline_coordinate(spec.width, spec.width, spec.block_size),
            baseline_coordinate(spec.length, spec.length, spec.block_size),
        ),
    )
}

/// Generate the road network for a grid spec
pub fn generate_roads(spec: &GridSpec) -> Result<RoadNetwork> {
    spec.validate()?;
    let seeds = CitySeeds::from_master(spec.seed);

    let organic =
        spec.road_mode == RoadPerturbationMode::OrthogonalOrganic && spec.curve_intensity > 0.0;
    if spec.road_mode == RoadPerturbationMode::DiagonalOverlay && spec.curve_intensity > 0.0 {
        debug!(
            curve_intensity = spec.curve_intensity,
            "diagonal overlay active, organic curves disabled for this network"
        );
    }

    let limits = OrganicBounds::new(spec.block_size, spec.road_width);
    let curve = if organic { spec.curve_intensity } else { 0.0 };

    let vertical = generate_axis(Axis::Vertical, spec.width, spec, curve, &limits, seeds.roads);
    let horizontal =
        generate_axis(Axis::Horizontal, spec.length, spec, curve, &limits, seeds.roads);

    let bounds = district_bounds(spec);
    let diagonals = if spec.road_mode == RoadPerturbationMode::DiagonalOverlay {
        generate_diagonals(&bounds, spec.road_width)
    } else {
        Vec::new()
    };

    let network = RoadNetwork {
        mode: spec.road_mode,
        horizontal,
        vertical,
        diagonals,
        nominal_width: spec.road_width,
        max_offset: limits.max_offset,
        bounds,
    };

    debug!(
        vertical = network.vertical.len(),
        horizontal = network.horizontal.len(),
        diagonals = network.diagonals.len(),
        peak_offset = network.peak_offset(),
        "road network generated"
    );

    Ok(network)
}

/// Generate the ordered roads of one axis family
fn generate_axis(
    axis: Axis,
    blocks: usize,
    spec: &GridSpec,
    curve: f64,
    limits: &OrganicBounds,
    seed: u64,
) -> Vec<RoadSegment> {
    let phase = organic::axis_phase(seed, axis);

    (0..=blocks)
        .map(|k| {
            let baseline = baseline_coordinate(k, blocks, spec.block_size);
            let mut rng = indexed_rng(seed, &[axis.id(), k as u64]);

            // Offset jitter is drawn first and always, so width jitter does not
            // depend on whether curves are active.
            let offset = organic::organic_offset(k, blocks, curve, phase, limits, &mut rng);
            let width = organic::rendered_width(spec.road_width, limits, &mut rng);

            RoadSegment {
                axis,
                index: k,
                baseline_coordinate: baseline,
                perturbed_coordinate: if offset == 0.0 { baseline } else { baseline + offset },
                width,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verify::check_roads;

    fn spec(width: usize, length: usize, curve: f64, seed: u64) -> GridSpec {
        GridSpec::builder()
            .size(width, length)
            .block_size(20.0)
            .road_width(2.0)
            .curve_intensity(curve)
            .seed(seed)
            .build()
    }

    #[test]
    fn test_straight_grid_is_exact() {
        let network = generate_roads(&spec(3, 3, 0.0, 9)).unwrap();
        assert_eq!(network.vertical.len(), 4);
        assert_eq!(network.horizontal.len(), 4);
        let expected = [-30.0, -10.0, 10.0, 30.0];
        for (road, want) in network.vertical.iter().zip(expected) {
            assert_eq!(road.perturbed_coordinate, want);
            assert_eq!(road.baseline_coordinate, want);
        }
        assert_eq!(network.peak_offset(), 0.0);
    }

    #[test]
    fn test_boundary_roads_stay_straight() {
        for seed in 0..50 {
            let network = generate_roads(&spec(5, 4, 1.0, seed)).unwrap();
            for family in [&network.vertical, &network.horizontal] {
                let first = family.first().unwrap();
                let last = family.last().unwrap();
                assert_eq!(first.perturbed_coordinate, first.baseline_coordinate);
                assert_eq!(last.perturbed_coordinate, last.baseline_coordinate);
            }
        }
    }

    #[test]
    fn test_curves_move_interior_roads() {
        let network = generate_roads(&spec(6, 6, 1.0, 3)).unwrap();
        assert!(network.peak_offset() > 0.0);
        assert!(network.peak_offset() <= network.max_offset);
    }

    #[test]
    fn test_ordering_holds_for_many_seeds() {
        for seed in 0..1200u64 {
            let width = 1 + (seed % 7) as usize;
            let length = 1 + (seed % 5) as usize;
            let curve = [0.3, 0.7, 1.0][(seed % 3) as usize];
            let network = generate_roads(&spec(width, length, curve, seed)).unwrap();
            check_roads(&network, width, length).unwrap();
        }
    }

    #[test]
    fn test_ordering_holds_with_wide_roads() {
        // Roads wider than half a block leave no room for curves at all.
        for seed in 0..200u64 {
            let s = GridSpec::builder()
                .size(5, 5)
                .block_size(10.0)
                .road_width(9.5)
                .curve_intensity(1.0)
                .seed(seed)
                .build();
            let network = generate_roads(&s).unwrap();
            assert_eq!(network.max_offset, 0.0);
            check_roads(&network, 5, 5).unwrap();
        }
    }

    #[test]
    fn test_diagonal_overlay_excludes_curves() {
        let mut s = spec(4, 4, 0.8, 11);
        s.road_mode = RoadPerturbationMode::DiagonalOverlay;
        let network = generate_roads(&s).unwrap();
        assert_eq!(network.peak_offset(), 0.0);
        assert_eq!(network.diagonals.len(), 2);

        s.road_mode = RoadPerturbationMode::OrthogonalOrganic;
        let organic = generate_roads(&s).unwrap();
        assert!(organic.diagonals.is_empty());
        assert!(organic.peak_offset() > 0.0);
    }

    #[test]
    fn test_mode_none_ignores_curve() {
        let mut s = spec(4, 4, 1.0, 5);
        s.road_mode = RoadPerturbationMode::None;
        let network = generate_roads(&s).unwrap();
        assert_eq!(network.peak_offset(), 0.0);
        assert!(network.diagonals.is_empty());
    }

    #[test]
    fn test_rendered_width_jitter_is_bounded() {
        let network = generate_roads(&spec(7, 7, 0.5, 21)).unwrap();
        for road in network.vertical.iter().chain(network.horizontal.iter()) {
            assert!(road.width > 0.0);
            assert!((road.width - 2.0).abs() <= 0.2 + 1e-12);
        }
    }

    #[test]
    fn test_invalid_spec_rejected() {
        let s = GridSpec::builder().road_width(25.0).build();
        assert!(generate_roads(&s).is_err());
    }
}
