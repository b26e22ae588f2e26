//! Spatial partition and broad phase for Collinsa.
//!
//! The world rectangle is cut into a uniform grid of [`Chunk`]s described
//! by a [`GridGeometry`]. Every simulation step the [`ChunkGrid`] is
//! cleared and each entity id is recorded in the chunks its AABB corners
//! hash into. The [`Collider`] then walks chunk memberships to produce
//! broad-phase [`CandidatePair`]s.
//!
//! # Corner sampling
//!
//! Membership is decided by hashing the four AABB corners, not by
//! rasterizing the box. An AABB spanning more than two chunks along an
//! axis is therefore absent from the interior chunks it covers. This
//! keeps insertion at four hashes per entity; scenes with entities larger
//! than a chunk should use coarser chunks.
//!
//! # Out-of-world positions
//!
//! Corners outside `[0, width) × [0, height)` hash to `None` and are
//! skipped. An entity entirely outside the world is simply in no chunk.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod chunk;
pub mod collider;
pub mod error;
pub mod geometry;
pub mod grid;

pub use chunk::Chunk;
pub use collider::{CandidatePair, Collider};
pub use error::SpaceError;
pub use geometry::GridGeometry;
pub use grid::{ChunkGrid, RebuildStats};
