//! Diagonal avenue overlay
//!
//! Cross-cutting avenues drawn on top of a rigid orthogonal grid. They are
//! purely an overlay: zone identification never looks at them.

use serde::{Deserialize, Serialize};

use crate::geometry::{Point2, Rect};

/// Endpoint tolerance when deciding two avenues are the same road
const DUPLICATE_EPSILON: f64 = 1e-9;

/// A straight avenue between two points on the district boundary
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DiagonalRoad {
    pub start: Point2,
    pub end: Point2,
    pub width: f64,
}

impl DiagonalRoad {
    pub fn length(&self) -> f64 {
        ((self.end.x - self.start.x).powi(2) + (self.end.y - self.start.y).powi(2)).sqrt()
    }

    /// True when both avenues join the same endpoints, in either direction
    pub fn duplicates(&self, other: &DiagonalRoad) -> bool {
        let close = |a: Point2, b: Point2| {
            (a.x - b.x).abs() <= DUPLICATE_EPSILON && (a.y - b.y).abs() <= DUPLICATE_EPSILON
        };
        (close(self.start, other.start) && close(self.end, other.end))
            || (close(self.start, other.end) && close(self.end, other.start))
    }

    /// Point at parameter `t` in [0, 1] along the avenue
    pub fn point_at(&self, t: f64) -> Point2 {
        Point2::new(
            self.start.x + (self.end.x - self.start.x) * t,
            self.start.y + (self.end.y - self.start.y) * t,
        )
    }

    /// Distance from `p` to the nearest point of the centerline
    pub fn distance_to(&self, p: Point2) -> f64 {
        let (dx, dy) = (self.end.x - self.start.x, self.end.y - self.start.y);
        let len_sq = dx * dx + dy * dy;
        let t = if len_sq > 0.0 {
            (((p.x - self.start.x) * dx + (p.y - self.start.y) * dy) / len_sq).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let closest = self.point_at(t);
        ((p.x - closest.x).powi(2) + (p.y - closest.y).powi(2)).sqrt()
    }

    /// True when `p` lies on the paved strip
    pub fn covers(&self, p: Point2) -> bool {
        self.distance_to(p) <= self.width / 2.0
    }
}

/// Corner-to-corner avenues of the district, without duplicates
pub fn generate_diagonals(bounds: &Rect, width: f64) -> Vec<DiagonalRoad> {
    let candidates = [
        DiagonalRoad {
            start: bounds.min,
            end: bounds.max,
            width,
        },
        DiagonalRoad {
            start: Point2::new(bounds.min.x, bounds.max.y),
            end: Point2::new(bounds.max.x, bounds.min.y),
            width,
        },
    ];

    let mut roads: Vec<DiagonalRoad> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        if candidate.length() <= DUPLICATE_EPSILON {
            continue;
        }
        if roads.iter().any(|r| r.duplicates(&candidate)) {
            continue;
        }
        roads.push(candidate);
    }
    roads
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_distinct_diagonals() {
        let bounds = Rect::new(Point2::new(-30.0, -20.0), Point2::new(30.0, 20.0));
        let roads = generate_diagonals(&bounds, 2.0);
        assert_eq!(roads.len(), 2);
        assert!(!roads[0].duplicates(&roads[1]));
        assert_eq!(roads[0].point_at(0.5), Point2::new(0.0, 0.0));
    }

    #[test]
    fn test_reversed_road_is_duplicate() {
        let a = DiagonalRoad {
            start: Point2::new(0.0, 0.0),
            end: Point2::new(1.0, 1.0),
            width: 1.0,
        };
        let b = DiagonalRoad {
            start: a.end,
            end: a.start,
            width: 1.0,
        };
        assert!(a.duplicates(&b));
    }

    #[test]
    fn test_coverage_follows_width() {
        let road = DiagonalRoad {
            start: Point2::new(0.0, 0.0),
            end: Point2::new(10.0, 0.0),
            width: 2.0,
        };
        assert!(road.covers(Point2::new(5.0, 0.9)));
        assert!(!road.covers(Point2::new(5.0, 1.1)));
        assert!((road.distance_to(Point2::new(13.0, 4.0)) - 5.0).abs() < 1e-12);
    }
}
