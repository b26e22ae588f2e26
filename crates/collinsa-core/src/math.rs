//! Two-dimensional vector types.
//!
//! Simulation state is double precision ([`Vec2d`]); geometry handed to
//! drawing code is single precision ([`Vec2f`]). Both are `Copy` values,
//! so arithmetic always yields a fresh vector. The `*Assign` operators are
//! the only in-place forms.

pub use glam::{DVec2 as Vec2d, Vec2 as Vec2f};

/// Rigid-body vocabulary on top of [`Vec2d`].
///
/// glam already provides `dot`, `length`, `perp_dot` and friends; this
/// trait adds the names the physics code reads naturally with, plus the
/// scalar/vector cross products used for angular terms.
pub trait Vec2Ext: Copy {
    /// Scalar 2D cross product `a.x * b.y - a.y * b.x`.
    fn cross(self, other: Self) -> f64;
    /// Vector × scalar: `(s * y, -s * x)`.
    fn cross_scalar(self, s: f64) -> Self;
    /// Euclidean length.
    fn magnitude(self) -> f64;
    /// Rotate counter-clockwise by `angle` radians.
    fn rotated(self, angle: f64) -> Self;
    /// Narrow to render precision.
    fn to_render(self) -> Vec2f;
}

impl Vec2Ext for Vec2d {
    #[inline]
    fn cross(self, other: Self) -> f64 {
        self.perp_dot(other)
    }

    #[inline]
    fn cross_scalar(self, s: f64) -> Self {
        Vec2d::new(s * self.y, -s * self.x)
    }

    #[inline]
    fn magnitude(self) -> f64 {
        self.length()
    }

    #[inline]
    fn rotated(self, angle: f64) -> Self {
        let (sin, cos) = angle.sin_cos();
        Vec2d::new(self.x * cos - self.y * sin, self.x * sin + self.y * cos)
    }

    #[inline]
    fn to_render(self) -> Vec2f {
        self.as_vec2()
    }
}

/// Scalar × vector: `(-s * v.y, s * v.x)`.
#[inline]
pub fn scalar_cross(s: f64, v: Vec2d) -> Vec2d {
    Vec2d::new(-s * v.y, s * v.x)
}
