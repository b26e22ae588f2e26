//! Error types for grid construction.

use std::fmt;

/// Errors arising from grid construction or resizing.
#[derive(Debug, Clone, PartialEq)]
pub enum SpaceError {
    /// A world extent is zero, negative or not finite.
    InvalidExtent {
        /// Which extent (`"width"` or `"height"`).
        name: &'static str,
        /// The rejected value.
        value: f64,
    },
    /// Attempted to build a grid with zero chunks along an axis.
    EmptyGrid,
    /// A chunk count exceeds the supported maximum.
    DimensionTooLarge {
        /// Which axis (`"chunks_x"` or `"chunks_y"`).
        name: &'static str,
        /// The value that was provided.
        value: u32,
        /// The maximum allowed value.
        max: u32,
    },
}

impl fmt::Display for SpaceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidExtent { name, value } => {
                write!(f, "world {name} must be finite and positive, got {value}")
            }
            Self::EmptyGrid => write!(f, "grid must have at least one chunk per axis"),
            Self::DimensionTooLarge { name, value, max } => {
                write!(f, "{name} = {value} exceeds maximum {max}")
            }
        }
    }
}

impl std::error::Error for SpaceError {}
