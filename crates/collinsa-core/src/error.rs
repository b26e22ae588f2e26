//! Error types for shape construction.

use std::error::Error;
use std::fmt;

/// Errors detected while building a [`Shape`](crate::Shape).
#[derive(Clone, Debug, PartialEq)]
pub enum ShapeError {
    /// A length parameter (radius, width, height) is zero, negative or
    /// not finite.
    InvalidDimension {
        /// Which parameter was rejected.
        name: &'static str,
        /// The rejected value.
        value: f64,
    },
    /// A polygon needs at least three vertices.
    TooFewVertices {
        /// Number of vertices supplied.
        count: usize,
    },
    /// The polygon's vertices enclose no area.
    DegeneratePolygon,
    /// A polygon declared convex has a reflex vertex.
    NotConvex {
        /// Index of the first offending vertex.
        vertex: usize,
    },
    /// Emitters may not emit emitters.
    NestedEmitter,
    /// An emission rate or speed is negative or not finite.
    InvalidEmission {
        /// Description of the rejected parameter.
        reason: String,
    },
}

impl fmt::Display for ShapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidDimension { name, value } => {
                write!(f, "{name} must be finite and positive, got {value}")
            }
            Self::TooFewVertices { count } => {
                write!(f, "polygon needs at least 3 vertices, got {count}")
            }
            Self::DegeneratePolygon => write!(f, "polygon has zero area"),
            Self::NotConvex { vertex } => write!(f, "polygon is not convex at vertex {vertex}"),
            Self::NestedEmitter => write!(f, "an emitter cannot emit emitters"),
            Self::InvalidEmission { reason } => write!(f, "invalid emission: {reason}"),
        }
    }
}

impl Error for ShapeError {}
