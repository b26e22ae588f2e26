//! World extent and chunk layout.

use collinsa_core::{Aabb, Vec2d};
use smallvec::SmallVec;

use crate::error::SpaceError;

/// Size of the simulated world and how it is cut into chunks.
///
/// The world spans `[0, width) × [0, height)`; chunks are uniform
/// `cell_width × cell_height` rectangles numbered row-major from the
/// origin. A validated geometry is the only way to build a
/// [`ChunkGrid`](crate::ChunkGrid).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridGeometry {
    width: f64,
    height: f64,
    chunks_x: u32,
    chunks_y: u32,
}

impl GridGeometry {
    /// Maximum chunks along one axis.
    pub const MAX_CHUNKS_PER_AXIS: u32 = 1 << 12;

    /// Validate and build a geometry.
    pub fn new(width: f64, height: f64, chunks_x: u32, chunks_y: u32) -> Result<Self, SpaceError> {
        if !(width.is_finite() && width > 0.0) {
            return Err(SpaceError::InvalidExtent {
                name: "width",
                value: width,
            });
        }
        if !(height.is_finite() && height > 0.0) {
            return Err(SpaceError::InvalidExtent {
                name: "height",
                value: height,
            });
        }
        if chunks_x == 0 || chunks_y == 0 {
            return Err(SpaceError::EmptyGrid);
        }
        for (name, value) in [("chunks_x", chunks_x), ("chunks_y", chunks_y)] {
            if value > Self::MAX_CHUNKS_PER_AXIS {
                return Err(SpaceError::DimensionTooLarge {
                    name,
                    value,
                    max: Self::MAX_CHUNKS_PER_AXIS,
                });
            }
        }
        Ok(Self {
            width,
            height,
            chunks_x,
            chunks_y,
        })
    }

    /// World width.
    pub fn width(&self) -> f64 {
        self.width
    }

    /// World height.
    pub fn height(&self) -> f64 {
        self.height
    }

    /// Number of chunk columns.
    pub fn chunks_x(&self) -> u32 {
        self.chunks_x
    }

    /// Number of chunk rows.
    pub fn chunks_y(&self) -> u32 {
        self.chunks_y
    }

    /// Width of one chunk.
    pub fn cell_width(&self) -> f64 {
        self.width / self.chunks_x as f64
    }

    /// Height of one chunk.
    pub fn cell_height(&self) -> f64 {
        self.height / self.chunks_y as f64
    }

    /// Total number of chunks.
    pub fn cell_count(&self) -> usize {
        self.chunks_x as usize * self.chunks_y as usize
    }

    /// Chunk index of a world position:
    /// `floor(x / cell_width) + chunks_x · floor(y / cell_height)`.
    ///
    /// Returns `None` when the position lies outside the world, including
    /// an `x` past the right edge that would otherwise alias into the
    /// next row.
    pub fn position_hash(&self, x: f64, y: f64) -> Option<usize> {
        let col = (x / self.cell_width()).floor();
        let row = (y / self.cell_height()).floor();
        // NaN fails every comparison below.
        if !(col >= 0.0 && row >= 0.0) {
            return None;
        }
        if col >= self.chunks_x as f64 || row >= self.chunks_y as f64 {
            return None;
        }
        Some(col as usize + self.chunks_x as usize * row as usize)
    }

    /// Hash of each AABB corner, in [`Aabb::corners`] order.
    pub fn corner_hashes(&self, aabb: &Aabb) -> [Option<usize>; 4] {
        aabb.corners().map(|c| self.position_hash(c.x, c.y))
    }

    /// Chunks an AABB is taken to overlap: the distinct in-world hashes
    /// of its four corners, in corner order.
    ///
    /// Corner sampling under-reports for boxes wider or taller than two
    /// chunks: interior chunks that no corner lands in are missed. Keep
    /// entities smaller than a chunk for exact broad-phase coverage.
    pub fn chunks_containing(&self, aabb: &Aabb) -> SmallVec<[usize; 4]> {
        let mut out = SmallVec::new();
        for idx in self.corner_hashes(aabb).into_iter().flatten() {
            if !out.contains(&idx) {
                out.push(idx);
            }
        }
        out
    }

    /// World-space bounds of a chunk, or `None` past the last chunk.
    pub fn chunk_bounds(&self, index: usize) -> Option<Aabb> {
        if index >= self.cell_count() {
            return None;
        }
        let nx = self.chunks_x as usize;
        let (col, row) = ((index % nx) as f64, (index / nx) as f64);
        let (w, h) = (self.cell_width(), self.cell_height());
        Some(Aabb::new(
            Vec2d::new(col * w, row * h),
            Vec2d::new((col + 1.0) * w, (row + 1.0) * h),
        ))
    }
}

impl Default for GridGeometry {
    /// A 1440 × 900 world cut into 10 × 10 chunks.
    fn default() -> Self {
        Self {
            width: 1440.0,
            height: 900.0,
            chunks_x: 10,
            chunks_y: 10,
        }
    }
}
