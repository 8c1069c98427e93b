//! Planar geometry primitives for the district layout.
//!
//! All coordinates are in world units (meters) on the ground plane, with the
//! district centered on the origin. `x` runs along the district width and `y`
//! along its length.

use serde::{Deserialize, Serialize};

/// A point (or offset) on the ground plane
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn offset(&self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    pub fn midpoint(a: Point2, b: Point2) -> Self {
        Self::new((a.x + b.x) * 0.5, (a.y + b.y) * 0.5)
    }
}

/// Width (along x) and depth/height (along y) of an axis-aligned area
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub width: f64,
    pub height: f64,
}

impl Extent {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    pub fn min_side(&self) -> f64 {
        self.width.min(self.height)
    }

    /// Width over height. Degenerate extents report 1.0.
    pub fn aspect_ratio(&self) -> f64 {
        if self.height <= 0.0 {
            1.0
        } else {
            self.width / self.height
        }
    }
}

/// Axis-aligned rectangle given by its minimum and maximum corners
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub min: Point2,
    pub max: Point2,
}

impl Rect {
    pub fn new(min: Point2, max: Point2) -> Self {
        Self { min, max }
    }

    pub fn from_center(center: Point2, extent: Extent) -> Self {
        let hw = extent.width * 0.5;
        let hh = extent.height * 0.5;
        Self {
            min: Point2::new(center.x - hw, center.y - hh),
            max: Point2::new(center.x + hw, center.y + hh),
        }
    }

    pub fn from_origin(origin: Point2, extent: Extent) -> Self {
        Self {
            min: origin,
            max: Point2::new(origin.x + extent.width, origin.y + extent.height),
        }
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> Point2 {
        Point2::midpoint(self.min, self.max)
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    pub fn translate(&self, by: Point2) -> Self {
        Self {
            min: self.min.offset(by.x, by.y),
            max: self.max.offset(by.x, by.y),
        }
    }

    /// True when the interiors intersect. Rectangles sharing only an edge do not overlap.
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.min.x < other.max.x
            && other.min.x < self.max.x
            && self.min.y < other.max.y
            && other.min.y < self.max.y
    }

    /// True when `other` lies inside `self`, allowing `tolerance` of slack on each side
    pub fn contains_rect(&self, other: &Rect, tolerance: f64) -> bool {
        other.min.x >= self.min.x - tolerance
            && other.min.y >= self.min.y - tolerance
            && other.max.x <= self.max.x + tolerance
            && other.max.y <= self.max.y + tolerance
    }

    pub fn contains_point(&self, p: Point2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_touching_rects_do_not_overlap() {
        let a = Rect::new(Point2::new(0.0, 0.0), Point2::new(1.0, 1.0));
        let b = Rect::new(Point2::new(1.0, 0.0), Point2::new(2.0, 1.0));
        assert!(!a.overlaps(&b));

        let c = Rect::new(Point2::new(0.5, 0.5), Point2::new(1.5, 1.5));
        assert!(a.overlaps(&c));
    }

    #[test]
    fn test_from_center_round_trips_center() {
        let r = Rect::from_center(Point2::new(3.0, -2.0), Extent::new(4.0, 2.0));
        assert_eq!(r.center(), Point2::new(3.0, -2.0));
        assert_eq!(r.width(), 4.0);
        assert_eq!(r.height(), 2.0);
        assert!(r.contains_rect(&Rect::from_center(r.center(), Extent::new(3.0, 1.0)), 0.0));
    }
}
