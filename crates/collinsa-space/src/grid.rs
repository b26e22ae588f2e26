//! The uniform chunk grid.

use collinsa_core::{Aabb, EntityId};
use indexmap::IndexSet;
use smallvec::SmallVec;

use crate::chunk::Chunk;
use crate::geometry::GridGeometry;

/// Outcome of a [`ChunkGrid::rebuild`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RebuildStats {
    /// Entities offered to the grid.
    pub entities: usize,
    /// Chunk memberships recorded.
    pub memberships: usize,
    /// AABB corners that fell outside the world and were skipped.
    pub skipped_corners: usize,
    /// Entities with no corner inside the world.
    pub outside: usize,
}

/// Many-to-many relation between chunks and entity ids.
///
/// The grid is rebuilt from scratch once per simulation step; it keeps no
/// per-entity state between rebuilds.
#[derive(Clone, Debug, PartialEq)]
pub struct ChunkGrid {
    geometry: GridGeometry,
    chunks: Vec<Chunk>,
}

impl ChunkGrid {
    /// An empty grid laid out by `geometry`.
    pub fn new(geometry: GridGeometry) -> Self {
        Self {
            geometry,
            chunks: Self::layout(&geometry),
        }
    }

    fn layout(geometry: &GridGeometry) -> Vec<Chunk> {
        (0..geometry.cell_count())
            .filter_map(|i| geometry.chunk_bounds(i).map(|b| Chunk::new(i, b)))
            .collect()
    }

    /// The layout.
    pub fn geometry(&self) -> &GridGeometry {
        &self.geometry
    }

    /// All chunks, row-major.
    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// One chunk by index.
    pub fn chunk(&self, index: usize) -> Option<&Chunk> {
        self.chunks.get(index)
    }

    /// See [`GridGeometry::position_hash`].
    pub fn position_hash(&self, x: f64, y: f64) -> Option<usize> {
        self.geometry.position_hash(x, y)
    }

    /// See [`GridGeometry::chunks_containing`].
    pub fn chunks_containing(&self, aabb: &Aabb) -> SmallVec<[usize; 4]> {
        self.geometry.chunks_containing(aabb)
    }

    /// Record `id` in every chunk its AABB corners land in.
    ///
    /// Returns the number of corners skipped for lying outside the world.
    pub fn insert(&mut self, id: EntityId, aabb: &Aabb) -> usize {
        let mut skipped = 0;
        for hash in self.geometry.corner_hashes(aabb) {
            match hash.and_then(|i| self.chunks.get_mut(i)) {
                Some(chunk) => {
                    chunk.insert(id);
                }
                None => skipped += 1,
            }
        }
        skipped
    }

    /// Drop `id` from every chunk. Returns whether it was present anywhere.
    pub fn remove(&mut self, id: EntityId) -> bool {
        let mut found = false;
        for chunk in &mut self.chunks {
            found |= chunk.remove(id);
        }
        found
    }

    /// Empty every chunk.
    pub fn clear(&mut self) {
        for chunk in &mut self.chunks {
            chunk.clear();
        }
    }

    /// Clear, then insert every entity. Rebuilding twice from the same
    /// input yields identical membership.
    pub fn rebuild<I>(&mut self, entities: I) -> RebuildStats
    where
        I: IntoIterator<Item = (EntityId, Aabb)>,
    {
        self.clear();
        let mut stats = RebuildStats::default();
        for (id, aabb) in entities {
            stats.entities += 1;
            let skipped = self.insert(id, &aabb);
            stats.skipped_corners += skipped;
            if skipped == 4 {
                stats.outside += 1;
            }
        }
        stats.memberships = self.chunks.iter().map(Chunk::len).sum();
        if stats.skipped_corners > 0 {
            log::trace!(
                "grid rebuild: {} entities, {} corners outside world",
                stats.entities,
                stats.skipped_corners
            );
        }
        stats
    }

    /// Entities sharing a chunk with `aabb`, minus `id` itself, in first
    /// seen order.
    pub fn nearby(&self, id: EntityId, aabb: &Aabb) -> IndexSet<EntityId> {
        let mut out = IndexSet::new();
        for idx in self.geometry.chunks_containing(aabb) {
            if let Some(chunk) = self.chunks.get(idx) {
                out.extend(chunk.members().iter().copied().filter(|m| *m != id));
            }
        }
        out
    }

    /// Replace the layout. All memberships are dropped; the caller
    /// rebuilds.
    pub fn resize(&mut self, geometry: GridGeometry) {
        log::debug!(
            "grid resize: {}x{} world, {}x{} chunks",
            geometry.width(),
            geometry.height(),
            geometry.chunks_x(),
            geometry.chunks_y()
        );
        self.geometry = geometry;
        self.chunks = Self::layout(&geometry);
    }

    /// Total memberships across chunks.
    pub fn membership_count(&self) -> usize {
        self.chunks.iter().map(Chunk::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use collinsa_core::Vec2d;

    fn grid() -> ChunkGrid {
        ChunkGrid::new(GridGeometry::new(1440.0, 900.0, 10, 10).unwrap())
    }

    fn boxed(x: f64, y: f64, half: f64) -> Aabb {
        Aabb::from_center(Vec2d::new(x, y), Vec2d::splat(half))
    }

    #[test]
    fn layout_covers_every_cell() {
        let g = grid();
        assert_eq!(g.chunks().len(), 100);
        assert!(g.chunks().iter().enumerate().all(|(i, c)| c.index() == i));
        assert!(g.chunks().iter().all(Chunk::is_empty));
    }

    #[test]
    fn insert_into_single_cell() {
        let mut g = grid();
        let id = EntityId::next();
        assert_eq!(g.insert(id, &boxed(100.0, 100.0, 5.0)), 0);
        assert!(g.chunk(10).unwrap().contains(id));
        assert_eq!(g.membership_count(), 1);
    }

    #[test]
    fn insert_partially_outside_skips_corners() {
        let mut g = grid();
        let id = EntityId::next();
        assert_eq!(g.insert(id, &boxed(0.0, 0.0, 5.0)), 3);
        assert!(g.chunk(0).unwrap().contains(id));
    }

    #[test]
    fn rebuild_counts_outside_entities() {
        let mut g = grid();
        let stats = g.rebuild([
            (EntityId::next(), boxed(100.0, 100.0, 5.0)),
            (EntityId::next(), boxed(-100.0, -100.0, 5.0)),
        ]);
        assert_eq!(stats.entities, 2);
        assert_eq!(stats.outside, 1);
        assert_eq!(stats.skipped_corners, 4);
        assert_eq!(stats.memberships, 1);
    }

    #[test]
    fn nearby_excludes_self_and_dedups() {
        let mut g = grid();
        let a = EntityId::next();
        let b = EntityId::next();
        let c = EntityId::next();
        // a and b both straddle the same four chunks; c is far away.
        g.rebuild([
            (a, boxed(144.0, 90.0, 3.0)),
            (b, boxed(145.0, 91.0, 3.0)),
            (c, boxed(1000.0, 800.0, 3.0)),
        ]);
        let near = g.nearby(a, &boxed(144.0, 90.0, 3.0));
        assert_eq!(near.iter().copied().collect::<Vec<_>>(), vec![b]);
    }

    #[test]
    fn remove_clears_all_memberships() {
        let mut g = grid();
        let id = EntityId::next();
        g.insert(id, &boxed(144.0, 90.0, 3.0));
        assert_eq!(g.membership_count(), 4);
        assert!(g.remove(id));
        assert_eq!(g.membership_count(), 0);
        assert!(!g.remove(id));
    }

    #[test]
    fn resize_relayouts_and_empties() {
        let mut g = grid();
        g.insert(EntityId::next(), &boxed(100.0, 100.0, 5.0));
        g.resize(GridGeometry::new(200.0, 200.0, 2, 2).unwrap());
        assert_eq!(g.chunks().len(), 4);
        assert_eq!(g.membership_count(), 0);
        assert_eq!(g.position_hash(150.0, 50.0), Some(1));
    }
}
