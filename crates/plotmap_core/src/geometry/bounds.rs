//! Axis-aligned bounding boxes and distance metrics.
//!
//! # Invariants
//! - `right = x + width`, `bottom = y + height`.
//! - `edge_distance` is symmetric and never negative.

use serde::{Deserialize, Serialize};

/// A point in map units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned box anchored at its top-left corner.
///
/// Rotation never affects bounds; it is a display transform only.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Builds the canonical rectangle spanned by two arbitrary corners.
    pub fn from_corners(a: Point, b: Point) -> Self {
        let left = a.x.min(b.x);
        let top = a.y.min(b.y);
        Self {
            x: left,
            y: top,
            width: a.x.max(b.x) - left,
            height: a.y.max(b.y) - top,
        }
    }

    pub fn left(&self) -> f64 {
        self.x
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn top(&self) -> f64 {
        self.y
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// Returns whether two boxes share interior area.
///
/// Uses half-open intervals, so boxes that only share an edge do not overlap.
/// This is the collision test for same-layer placement.
pub fn aabb_overlap(a: &Bounds, b: &Bounds) -> bool {
    !(a.right() <= b.left()
        || a.left() >= b.right()
        || a.bottom() <= b.top()
        || a.top() >= b.bottom())
}

/// Returns whether a box touches or overlaps another, edges included.
///
/// Selection rectangles use this closed test so a zero-area click on an item
/// edge still selects it.
pub fn rect_touches(rect: &Bounds, b: &Bounds) -> bool {
    !(b.right() < rect.left()
        || b.left() > rect.right()
        || b.bottom() < rect.top()
        || b.top() > rect.bottom())
}

/// Gap between two boxes measured on the Manhattan metric.
///
/// Computes the Manhattan distance between centers minus the half-extents of
/// both boxes on both axes, clamped at zero. Zero means the edges touch.
pub fn edge_distance(a: &Bounds, b: &Bounds) -> f64 {
    let ca = a.center();
    let cb = b.center();
    let distance = (ca.x - cb.x).abs() + (ca.y - cb.y).abs();
    let min_adjacent = a.width / 2.0 + b.width / 2.0 + a.height / 2.0 + b.height / 2.0;
    (distance - min_adjacent).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::{aabb_overlap, edge_distance, rect_touches, Bounds, Point};

    #[test]
    fn from_corners_normalizes_reversed_points() {
        let rect = Bounds::from_corners(Point::new(10.0, 2.0), Point::new(4.0, 8.0));
        assert_eq!(rect, Bounds::new(4.0, 2.0, 6.0, 6.0));
    }

    #[test]
    fn shared_edge_is_not_overlap_but_touches() {
        let a = Bounds::new(0.0, 0.0, 1.0, 1.0);
        let b = Bounds::new(1.0, 0.0, 1.0, 1.0);
        assert!(!aabb_overlap(&a, &b));
        assert!(rect_touches(&a, &b));
        assert_eq!(edge_distance(&a, &b), 0.0);
    }

    #[test]
    fn nested_box_overlaps() {
        let outer = Bounds::new(0.0, 0.0, 10.0, 10.0);
        let inner = Bounds::new(2.0, 2.0, 1.0, 1.0);
        assert!(aabb_overlap(&outer, &inner));
        assert!(aabb_overlap(&inner, &outer));
    }
}
