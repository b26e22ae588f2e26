//! Broad-phase candidate discovery over a [`ChunkGrid`].

use std::collections::HashSet;

use collinsa_core::{BodyLookup, CollisionType, Entity, EntityId};

use crate::grid::ChunkGrid;

/// An unordered pair of entities whose AABBs overlap, stored with
/// `a < b`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CandidatePair {
    /// Smaller id.
    pub a: EntityId,
    /// Larger id.
    pub b: EntityId,
}

impl CandidatePair {
    /// Normalize two ids into a pair. `None` if they are equal.
    pub fn new(x: EntityId, y: EntityId) -> Option<Self> {
        match x.cmp(&y) {
            std::cmp::Ordering::Less => Some(Self { a: x, b: y }),
            std::cmp::Ordering::Greater => Some(Self { a: y, b: x }),
            std::cmp::Ordering::Equal => None,
        }
    }
}

/// Broad-phase pass: walks each chunk's members and keeps pairs that
/// could be in contact.
///
/// A pair is kept when both entities exist, their AABBs overlap, neither
/// is [`CollisionType::Ignore`], they are not both kinematic and not both
/// inactive. The scratch set is reused between calls.
#[derive(Debug, Default)]
pub struct Collider {
    seen: HashSet<CandidatePair>,
    tested: usize,
}

impl Collider {
    /// A collider with empty scratch space.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pairs tested during the last call, before deduplication.
    pub fn last_tested(&self) -> usize {
        self.tested
    }

    /// Compute this step's candidate pairs, in discovery order.
    pub fn candidate_pairs(
        &mut self,
        grid: &ChunkGrid,
        bodies: &impl BodyLookup,
    ) -> Vec<CandidatePair> {
        self.seen.clear();
        self.tested = 0;
        let mut out = Vec::new();
        for chunk in grid.chunks() {
            let members = chunk.members();
            for (i, &x) in members.iter().enumerate() {
                for &y in members.iter().skip(i + 1) {
                    self.tested += 1;
                    let Some(pair) = CandidatePair::new(x, y) else {
                        continue;
                    };
                    if self.seen.contains(&pair) {
                        continue;
                    }
                    let (Some(ea), Some(eb)) = (bodies.body(pair.a), bodies.body(pair.b)) else {
                        continue;
                    };
                    if may_collide(ea, eb) {
                        self.seen.insert(pair);
                        out.push(pair);
                    }
                }
            }
        }
        out
    }
}

fn may_collide(a: &Entity, b: &Entity) -> bool {
    if a.collision() == CollisionType::Ignore || b.collision() == CollisionType::Ignore {
        return false;
    }
    if a.is_kinematic() && b.is_kinematic() {
        return false;
    }
    if !a.is_active() && !b.is_active() {
        return false;
    }
    a.aabb().overlaps(&b.aabb())
}
