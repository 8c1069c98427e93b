//! Structural invariant checks.
//!
//! These run after every generation and turn generator defects into
//! [`CityGenError::StructuralInvariant`] errors naming the component and the
//! indices involved, instead of letting malformed geometry reach the host.
//!
//! # Checks
//!
//! - **Roads**: family sizes, index order, offsets within the clamp, straight
//!   boundary roads, no overlapping half-widths, no diagonal + organic mix
//! - **Zones**: exactly `width * length` zones that, inflated by the road
//!   half-widths, tile the district rectangle
//! - **Lots**: inside the usable area and pairwise disjoint
//! - **Buildings**: inside their lot

use crate::config::{GridSpec, PlacementParams, RoadPerturbationMode};
use crate::error::{CityGenError, Result};
use crate::geometry::{Point2, Rect};
use crate::placement::lots::usable_extent;
use crate::placement::ZonePlan;
use crate::roads::{Axis, RoadNetwork, RoadSegment};
use crate::zones::{Zone, ZoneGrid};

/// Relative tolerance for floating point comparisons
const RELATIVE_EPSILON: f64 = 1e-9;

fn tolerance(bounds: &Rect) -> f64 {
    RELATIVE_EPSILON * bounds.width().max(bounds.height()).max(1.0)
}

fn check_family(
    family: &[RoadSegment],
    axis: Axis,
    blocks: usize,
    network: &RoadNetwork,
) -> Result<()> {
    if family.len() != blocks + 1 {
        return Err(CityGenError::invariant(
            "roads",
            vec![family.len()],
            format!("{axis} family has {} roads, expected {}", family.len(), blocks + 1),
        ));
    }

    let eps = tolerance(&network.bounds);
    for (k, road) in family.iter().enumerate() {
        if road.index != k || road.axis != axis {
            return Err(CityGenError::invariant(
                "roads",
                vec![k],
                format!(
                    "{axis} road at position {k} has index {} on {} axis",
                    road.index, road.axis
                ),
            ));
        }
        if !(road.width > 0.0) {
            return Err(CityGenError::invariant(
                "roads",
                vec![k],
                format!("{axis} road width {} is not positive", road.width),
            ));
        }
        if road.offset().abs() > network.max_offset + eps {
            return Err(CityGenError::invariant(
                "roads",
                vec![k],
                format!(
                    "{axis} road offset {:.6} exceeds clamp {:.6}",
                    road.offset(),
                    network.max_offset
                ),
            ));
        }
    }

    for k in [0, blocks] {
        if family[k].perturbed_coordinate != family[k].baseline_coordinate {
            return Err(CityGenError::invariant(
                "roads",
                vec![k],
                format!("{axis} boundary road {k} was perturbed"),
            ));
        }
    }

    for pair in family.windows(2) {
        if pair[1].low_edge() <= pair[0].high_edge() {
            return Err(CityGenError::invariant(
                "roads",
                vec![pair[0].index, pair[1].index],
                format!(
                    "{axis} roads overlap: {:.6} + {:.6}/2 >= {:.6} - {:.6}/2",
                    pair[0].perturbed_coordinate,
                    pair[0].width,
                    pair[1].perturbed_coordinate,
                    pair[1].width
                ),
            ));
        }
    }
    Ok(())
}

/// Check a road network against the grid it was generated for
pub fn check_roads(network: &RoadNetwork, width: usize, length: usize) -> Result<()> {
    check_family(&network.vertical, Axis::Vertical, width, network)?;
    check_family(&network.horizontal, Axis::Horizontal, length, network)?;

    match network.mode {
        RoadPerturbationMode::DiagonalOverlay => {
            if network.peak_offset() != 0.0 {
                return Err(CityGenError::invariant(
                    "roads",
                    vec![],
                    "diagonal overlay combined with organic offsets",
                ));
            }
            for (a_idx, a) in network.diagonals.iter().enumerate() {
                for (b_idx, b) in network.diagonals.iter().enumerate().skip(a_idx + 1) {
                    if a.duplicates(b) {
                        return Err(CityGenError::invariant(
                            "roads",
                            vec![a_idx, b_idx],
                            "duplicated diagonal avenue",
                        ));
                    }
                }
            }
        }
        _ => {
            if !network.diagonals.is_empty() {
                return Err(CityGenError::invariant(
                    "roads",
                    vec![],
                    format!(
                        "{} diagonal roads present outside diagonal overlay mode",
                        network.diagonals.len()
                    ),
                ));
            }
        }
    }
    Ok(())
}

/// Interval a zone covers along one axis once inflated by the road half-widths
fn inflated_interval(zone: &Zone, axis: Axis, road_width: f64) -> (f64, f64) {
    let (center, extent) = match axis {
        Axis::Vertical => (zone.center.x, zone.extent.width),
        Axis::Horizontal => (zone.center.y, zone.extent.height),
    };
    let half = (extent + road_width) * 0.5;
    (center - half, center + half)
}

/// Check that consecutive intervals are contiguous and span `[start, end]`
fn check_contiguous(
    intervals: &[(f64, f64)],
    start: f64,
    end: f64,
    eps: f64,
    axis: Axis,
) -> Result<()> {
    let mut cursor = start;
    for (k, (lo, hi)) in intervals.iter().enumerate() {
        if (lo - cursor).abs() > eps {
            let what = if *lo > cursor { "gap" } else { "overlap" };
            return Err(CityGenError::invariant(
                "zones",
                vec![k],
                format!("{what} along {axis} axis at {cursor:.9}: next zone starts at {lo:.9}"),
            ));
        }
        cursor = *hi;
    }
    if (cursor - end).abs() > eps {
        return Err(CityGenError::invariant(
            "zones",
            vec![intervals.len()],
            format!("{axis} axis tiling ends at {cursor:.9}, district ends at {end:.9}"),
        ));
    }
    Ok(())
}

/// Check that a zone grid holds exactly `width * length` zones in index order
pub fn check_zone_grid(zones: &ZoneGrid, spec: &GridSpec) -> Result<()> {
    let expected = spec.width.checked_mul(spec.length);
    if Some(zones.len()) != expected || zones.width != spec.width || zones.length != spec.length {
        return Err(CityGenError::invariant(
            "zones",
            vec![zones.width, zones.length],
            format!(
                "{} zones in a {}x{} grid, expected {}x{}",
                zones.len(),
                zones.width,
                zones.length,
                spec.width,
                spec.length
            ),
        ));
    }

    for (idx, zone) in zones.iter().enumerate() {
        let (i, j) = zone.grid_position;
        if i >= zones.width || j >= zones.length || zones.index_of(i, j) != idx {
            return Err(CityGenError::invariant(
                "zones",
                vec![i, j],
                format!("zone stored at index {idx} out of order"),
            ));
        }
    }
    Ok(())
}

/// Check zone count and tiling of the district rectangle
pub fn check_zones(zones: &ZoneGrid, network: &RoadNetwork, spec: &GridSpec) -> Result<()> {
    check_zone_grid(zones, spec)?;

    let bounds = network.bounds;
    let eps = tolerance(&bounds);
    let rw = network.nominal_width;

    // Every column shares one x interval and every row one y interval, so the
    // grid tiles the rectangle when both axes tile their side.
    for j in 0..spec.length {
        let column_spans: Vec<(f64, f64)> = (0..spec.width)
            .filter_map(|i| zones.get(i, j))
            .map(|z| inflated_interval(z, Axis::Vertical, rw))
            .collect();
        check_contiguous(&column_spans, bounds.min.x, bounds.max.x, eps, Axis::Vertical)?;
    }
    for i in 0..spec.width {
        let row_spans: Vec<(f64, f64)> = (0..spec.length)
            .filter_map(|j| zones.get(i, j))
            .map(|z| inflated_interval(z, Axis::Horizontal, rw))
            .collect();
        check_contiguous(&row_spans, bounds.min.y, bounds.max.y, eps, Axis::Horizontal)?;
    }

    let covered: f64 = zones
        .iter()
        .map(|z| (z.extent.width + rw) * (z.extent.height + rw))
        .sum();
    if (covered - bounds.area()).abs() > eps * bounds.area().max(1.0) {
        return Err(CityGenError::invariant(
            "zones",
            vec![],
            format!("zones cover {covered:.6}, district area is {:.6}", bounds.area()),
        ));
    }
    Ok(())
}

/// Check lots and buildings of one zone
pub fn check_zone_plan(zone: &Zone, plan: &ZonePlan, params: &PlacementParams) -> Result<()> {
    let (i, j) = zone.grid_position;
    let usable = Rect::from_center(Point2::default(), usable_extent(zone.extent, params));
    let eps = RELATIVE_EPSILON * zone.extent.width.max(zone.extent.height).max(1.0);
    let lots = &plan.lots.lots;

    for (a_idx, a) in lots.iter().enumerate() {
        if !usable.contains_rect(&a.local_rect(), eps) {
            return Err(CityGenError::invariant(
                "lots",
                vec![i, j, a_idx],
                "lot extends past the sidewalk margin",
            ));
        }
        for (b_idx, b) in lots.iter().enumerate().skip(a_idx + 1) {
            if a.local_rect().overlaps(&b.local_rect()) {
                return Err(CityGenError::invariant(
                    "lots",
                    vec![i, j, a_idx, b_idx],
                    "lots overlap",
                ));
            }
        }
    }

    if plan.buildings.len() > lots.len() {
        return Err(CityGenError::invariant(
            "buildings",
            vec![i, j],
            format!("{} buildings on {} lots", plan.buildings.len(), lots.len()),
        ));
    }
    for building in &plan.buildings {
        let lot = lots.get(building.lot_index).ok_or_else(|| {
            CityGenError::invariant(
                "buildings",
                vec![i, j, building.index],
                "building references a missing lot",
            )
        })?;
        if !lot.world_rect(zone.center).contains_rect(&building.world_rect(), eps) {
            return Err(CityGenError::invariant(
                "buildings",
                vec![i, j, building.index],
                "footprint exceeds its lot",
            ));
        }
    }
    Ok(())
}
