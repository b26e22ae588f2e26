//! Linear and rotational inertia.

use crate::shape::Shape;

/// Mass properties of an entity.
///
/// Inverse fields are zero whenever the corresponding quantity is zero,
/// and are forced to zero for kinematic entities. A zero inverse reads as
/// "infinitely heavy": forces scaled by it vanish without dividing by zero.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Inertia {
    /// Mass.
    pub mass: f64,
    /// `1 / mass`, or zero.
    pub mass_inverse: f64,
    /// Rotational inertia about the centroid.
    pub j: f64,
    /// `1 / j`, or zero.
    pub j_inverse: f64,
}

fn safe_inverse(v: f64) -> f64 {
    if v != 0.0 && v.is_finite() {
        1.0 / v
    } else {
        0.0
    }
}

impl Inertia {
    /// Inertia from explicit mass and rotational inertia.
    pub fn new(mass: f64, j: f64) -> Self {
        Self {
            mass,
            mass_inverse: safe_inverse(mass),
            j,
            j_inverse: safe_inverse(j),
        }
    }

    /// Derive from shape geometry and material density:
    /// `mass = density · area`, `j = density · ∫r² dA`.
    pub fn from_shape(shape: &Shape, density: f64) -> Self {
        Self::new(density * shape.area(), density * shape.second_moment())
    }

    /// Same mass and rotational inertia, immune to forces.
    ///
    /// Kinematic entities keep a real mass so they can still attract
    /// others through gravity.
    pub fn pinned(self) -> Self {
        Self {
            mass_inverse: 0.0,
            j_inverse: 0.0,
            ..self
        }
    }

    /// Whether forces have any effect.
    pub fn is_pinned(&self) -> bool {
        self.mass_inverse == 0.0 && self.j_inverse == 0.0
    }
}
