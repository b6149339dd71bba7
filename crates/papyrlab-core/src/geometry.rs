//! Axis-aligned boxes and the bounded working area.
//!
//! Boxes follow the `(top, left, width, height)` convention used throughout the
//! project file format. Positions handed around as `(x, y)` pairs are always
//! `(left, top)`.

use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    pub top: i32,
    pub left: i32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    /// Creates a box from its top-left corner and size.
    pub fn new(top: i32, left: i32, width: u32, height: u32) -> Self {
        Self {
            top,
            left,
            width,
            height,
        }
    }

    /// Creates a box anchored at `(x, y)` (left, top).
    pub fn at(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self::new(y, x, width, height)
    }

    /// Right edge (exclusive).
    pub fn right(&self) -> i64 {
        self.left as i64 + self.width as i64
    }

    /// Bottom edge (exclusive).
    pub fn bottom(&self) -> i64 {
        self.top as i64 + self.height as i64
    }

    /// Top-left corner as `(x, y)`.
    pub fn top_left(&self) -> (i32, i32) {
        (self.left, self.top)
    }

    /// Geometric centre as `(x, y)`.
    pub fn center(&self) -> (f64, f64) {
        (
            self.left as f64 + self.width as f64 / 2.0,
            self.top as f64 + self.height as f64 / 2.0,
        )
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Returns true if the point lies inside the box or on its border.
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.left as f64
            && x <= self.right() as f64
            && y >= self.top as f64
            && y <= self.bottom() as f64
    }

    /// Returns true if the boxes share a region of positive area.
    ///
    /// Boxes that only touch along an edge do not intersect.
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.intersection_area(other) > 0
    }

    /// Area of the overlap between two boxes (0 when disjoint).
    pub fn intersection_area(&self, other: &BoundingBox) -> u64 {
        let left = (self.left as i64).max(other.left as i64);
        let top = (self.top as i64).max(other.top as i64);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if right <= left || bottom <= top {
            return 0;
        }
        ((right - left) * (bottom - top)) as u64
    }

    /// Smallest box containing both boxes.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        let left = (self.left as i64).min(other.left as i64);
        let top = (self.top as i64).min(other.top as i64);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        BoundingBox::new(
            top as i32,
            left as i32,
            (right - left) as u32,
            (bottom - top) as u32,
        )
    }

    /// Joint box of a set of boxes, `None` for an empty set.
    pub fn union_all<'a, I>(boxes: I) -> Option<BoundingBox>
    where
        I: IntoIterator<Item = &'a BoundingBox>,
    {
        boxes
            .into_iter()
            .fold(None, |acc: Option<BoundingBox>, b| match acc {
                Some(joint) => Some(joint.union(b)),
                None => Some(*b),
            })
    }

    /// Returns a copy moved by `(dx, dy)`.
    pub fn translated(&self, dx: i32, dy: i32) -> BoundingBox {
        BoundingBox::new(self.top + dy, self.left + dx, self.width, self.height)
    }

    /// Returns a copy whose top-left corner is `(x, y)`.
    pub fn moved_to(&self, x: i32, y: i32) -> BoundingBox {
        BoundingBox::new(y, x, self.width, self.height)
    }
}

/// The bounded canvas new fragments are laid out on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkingArea {
    pub width: u32,
    pub height: u32,
}

impl WorkingArea {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Component-wise maximum of two areas.
    pub fn expanded_to(&self, other: &WorkingArea) -> WorkingArea {
        WorkingArea::new(self.width.max(other.width), self.height.max(other.height))
    }

    pub fn as_box(&self) -> BoundingBox {
        BoundingBox::new(0, 0, self.width, self.height)
    }
}
