//! A single grid cell.

use collinsa_core::{Aabb, EntityId};
use indexmap::IndexSet;

/// One cell of the grid and the entities whose AABB corners land in it.
///
/// A chunk never owns entities; it records ids in insertion order. The
/// same id may sit in up to four chunks at once.
#[derive(Clone, Debug, PartialEq)]
pub struct Chunk {
    index: usize,
    bounds: Aabb,
    members: IndexSet<EntityId>,
}

impl Chunk {
    pub(crate) fn new(index: usize, bounds: Aabb) -> Self {
        Self {
            index,
            bounds,
            members: IndexSet::new(),
        }
    }

    /// Position in the grid's row-major chunk list.
    pub fn index(&self) -> usize {
        self.index
    }

    /// World-space rectangle covered by the chunk.
    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    /// Member ids in insertion order.
    pub fn members(&self) -> &IndexSet<EntityId> {
        &self.members
    }

    /// Whether `id` is a member.
    pub fn contains(&self, id: EntityId) -> bool {
        self.members.contains(&id)
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the chunk has no members.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub(crate) fn insert(&mut self, id: EntityId) -> bool {
        self.members.insert(id)
    }

    pub(crate) fn remove(&mut self, id: EntityId) -> bool {
        self.members.shift_remove(&id)
    }

    pub(crate) fn clear(&mut self) {
        self.members.clear();
    }
}
