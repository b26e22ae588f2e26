//! Axis-aligned bounding boxes.

use crate::math::Vec2d;

/// An axis-aligned bounding box, `min` inclusive to `max` inclusive.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    /// Lower-left corner (smallest x and y).
    pub min: Vec2d,
    /// Upper-right corner (largest x and y).
    pub max: Vec2d,
}

impl Aabb {
    /// Box spanning two arbitrary corners.
    pub fn new(a: Vec2d, b: Vec2d) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Box centred on `center` extending `half` on each side.
    pub fn from_center(center: Vec2d, half: Vec2d) -> Self {
        let half = half.abs();
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Smallest box containing every point. `None` for an empty iterator.
    pub fn from_points(points: impl IntoIterator<Item = Vec2d>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut out = Self {
            min: first,
            max: first,
        };
        for p in iter {
            out.min = out.min.min(p);
            out.max = out.max.max(p);
        }
        Some(out)
    }

    /// The four corners: `min`, `(max.x, min.y)`, `max`, `(min.x, max.y)`.
    pub fn corners(&self) -> [Vec2d; 4] {
        [
            self.min,
            Vec2d::new(self.max.x, self.min.y),
            self.max,
            Vec2d::new(self.min.x, self.max.y),
        ]
    }

    /// Centre point.
    pub fn center(&self) -> Vec2d {
        (self.min + self.max) * 0.5
    }

    /// Extent along x.
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    /// Extent along y.
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    /// Whether the two boxes share any point (touching edges count).
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }

    /// Whether `p` lies inside or on the boundary.
    pub fn contains(&self, p: Vec2d) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// Smallest box containing both.
    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }
}
