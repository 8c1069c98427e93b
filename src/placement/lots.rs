//! Lot subdivision
//!
//! Splits a zone's usable area (its extent minus the sidewalk margin on every
//! side) into a sub-grid of equally sized lots. The number of lots is capped by
//! how many minimum-size lots physically fit, and the grid shape is the one that
//! leaves the smallest lot side as large as possible.

use serde::{Deserialize, Serialize};

use crate::config::PlacementParams;
use crate::geometry::{Extent, Point2, Rect};

/// A candidate building footprint inside a zone
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Lot {
    pub index: usize,
    /// Minimum corner, relative to the zone center
    pub origin: Point2,
    /// Size along x
    pub width: f64,
    /// Size along y
    pub depth: f64,
}

impl Lot {
    /// Lot rectangle in zone-local coordinates
    pub fn local_rect(&self) -> Rect {
        Rect::from_origin(self.origin, Extent::new(self.width, self.depth))
    }

    /// Lot rectangle in world coordinates
    pub fn world_rect(&self, zone_center: Point2) -> Rect {
        self.local_rect().translate(zone_center)
    }

    /// Lot center relative to the zone center
    pub fn center_offset(&self) -> Point2 {
        self.local_rect().center()
    }
}

/// Outcome of subdividing one zone
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LotLayout {
    pub lots: Vec<Lot>,
    /// Lots asked for after density was applied
    pub requested: usize,
    /// Most minimum-size lots the zone can hold
    pub capacity: usize,
    /// Sub-grid shape as `(columns, rows)`, `(0, 0)` when nothing fits
    pub arrangement: (usize, usize),
}

impl LotLayout {
    pub fn is_degenerate(&self) -> bool {
        self.capacity == 0
    }

    pub fn was_reduced(&self) -> bool {
        self.lots.len() < self.requested
    }
}

/// Lots requested for a zone: `round(buildings_per_block * density)`, at least 1
pub fn requested_lot_count(buildings_per_block: usize, density: f64) -> usize {
    ((buildings_per_block as f64 * density).round() as usize).max(1)
}

/// Usable area of a zone extent once the sidewalk margin is removed
pub fn usable_extent(extent: Extent, params: &PlacementParams) -> Extent {
    Extent::new(
        extent.width - 2.0 * params.sidewalk_margin,
        extent.height - 2.0 * params.sidewalk_margin,
    )
}

/// How many minimum-size lots fit along a side of `length`
fn fit_along(length: f64, params: &PlacementParams) -> usize {
    if length < params.min_lot_size {
        return 0;
    }
    ((length + params.lot_spacing) / (params.min_lot_size + params.lot_spacing)).floor() as usize
}

/// Size of one cell when `count` cells and their gaps share `length`
fn cell_size(length: f64, count: usize, spacing: f64) -> f64 {
    (length - (count as f64 - 1.0) * spacing) / count as f64
}

/// Pick `(columns, rows)` for `n` lots maximizing the smallest cell side
fn choose_arrangement(
    n: usize,
    max_cols: usize,
    max_rows: usize,
    usable: Extent,
    spacing: f64,
) -> (usize, usize) {
    let mut best: Option<((usize, usize), f64, usize)> = None;
    for cols in 1..=max_cols.min(n) {
        let rows = n.div_ceil(cols);
        if rows > max_rows {
            continue;
        }
        let min_side =
            cell_size(usable.width, cols, spacing).min(cell_size(usable.height, rows, spacing));
        let empty = cols * rows - n;
        let better = match best {
            None => true,
            Some((_, best_side, best_empty)) => {
                min_side > best_side || (min_side == best_side && empty < best_empty)
            }
        };
        if better {
            best = Some(((cols, rows), min_side, empty));
        }
    }
    best.map(|(shape, _, _)| shape).unwrap_or((1, 1))
}

/// Subdivide a zone extent into at most `requested` lots
pub fn subdivide(extent: Extent, requested: usize, params: &PlacementParams) -> LotLayout {
    let usable = usable_extent(extent, params);
    let max_cols = fit_along(usable.width, params);
    let max_rows = fit_along(usable.height, params);
    let capacity = max_cols * max_rows;

    if capacity == 0 {
        return LotLayout {
            lots: Vec::new(),
            requested,
            capacity,
            arrangement: (0, 0),
        };
    }

    let n = requested.min(capacity);
    let (cols, rows) = choose_arrangement(n, max_cols, max_rows, usable, params.lot_spacing);
    let cell_w = cell_size(usable.width, cols, params.lot_spacing);
    let cell_d = cell_size(usable.height, rows, params.lot_spacing);
    let pitch_x = cell_w + params.lot_spacing;
    let pitch_y = cell_d + params.lot_spacing;
    let base = Point2::new(-usable.width * 0.5, -usable.height * 0.5);

    let mut lots = Vec::with_capacity(n);
    for index in 0..n {
        let row = index / cols;
        let col = index % cols;
        let in_row = cols.min(n - row * cols);
        // Center a partially filled row
        let shift = (cols - in_row) as f64 * pitch_x * 0.5;
        lots.push(Lot {
            index,
            origin: base.offset(col as f64 * pitch_x + shift, row as f64 * pitch_y),
            width: cell_w,
            depth: cell_d,
        });
    }

    LotLayout {
        lots,
        requested,
        capacity,
        arrangement: (cols, rows),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> PlacementParams {
        PlacementParams::default()
    }

    #[test]
    fn test_requested_count_rounds_and_floors_at_one() {
        assert_eq!(requested_lot_count(3, 1.0), 3);
        assert_eq!(requested_lot_count(3, 0.7), 2);
        assert_eq!(requested_lot_count(3, 0.3), 1);
        assert_eq!(requested_lot_count(1, 0.1), 1);
        assert_eq!(requested_lot_count(4, 0.5), 2);
    }

    #[test]
    fn test_single_lot_fills_usable_area() {
        let layout = subdivide(Extent::new(18.0, 18.0), 1, &params());
        assert_eq!(layout.lots.len(), 1);
        assert_eq!(layout.arrangement, (1, 1));
        let lot = &layout.lots[0];
        assert_eq!(lot.width, 15.0);
        assert_eq!(lot.depth, 15.0);
        assert_eq!(lot.center_offset(), Point2::new(0.0, 0.0));
    }

    #[test]
    fn test_lots_disjoint_and_inside_usable_area() {
        for requested in 1..=12 {
            let extent = Extent::new(30.0, 17.0);
            let layout = subdivide(extent, requested, &params());
            let usable = usable_extent(extent, &params());
            let area = Rect::from_center(Point2::default(), usable);
            assert!(!layout.lots.is_empty());
            for (a_idx, a) in layout.lots.iter().enumerate() {
                assert!(area.contains_rect(&a.local_rect(), 1e-9));
                assert!(a.width >= params().min_lot_size - 1e-9);
                for b in layout.lots.iter().skip(a_idx + 1) {
                    assert!(!a.local_rect().overlaps(&b.local_rect()));
                }
            }
        }
    }

    #[test]
    fn test_request_reduced_to_capacity() {
        // Usable 7x7: one 4m lot plus a 1m gap leaves no room for a second.
        let layout = subdivide(Extent::new(10.0, 10.0), 3, &params());
        assert_eq!(layout.capacity, 1);
        assert_eq!(layout.lots.len(), 1);
        assert!(layout.was_reduced());
        assert!(!layout.is_degenerate());
    }

    #[test]
    fn test_tiny_zone_is_degenerate() {
        let layout = subdivide(Extent::new(5.0, 20.0), 2, &params());
        assert!(layout.is_degenerate());
        assert!(layout.lots.is_empty());
        assert_eq!(layout.arrangement, (0, 0));
    }

    #[test]
    fn test_arrangement_follows_aspect() {
        // A long thin zone should be split along its long side.
        let layout = subdivide(Extent::new(40.0, 12.0), 2, &params());
        assert_eq!(layout.arrangement, (2, 1));
        let layout = subdivide(Extent::new(12.0, 40.0), 2, &params());
        assert_eq!(layout.arrangement, (1, 2));
    }

    #[test]
    fn test_partial_row_is_centered() {
        let layout = subdivide(Extent::new(23.0, 23.0), 3, &params());
        assert_eq!(layout.arrangement, (2, 2));
        let last = &layout.lots[2];
        assert!(last.center_offset().x.abs() < 1e-9);
    }
}
