//! Strongly-typed identifiers.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counter for [`EntityId`] allocation.
static ENTITY_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Counter for [`ForceId`] allocation.
static FORCE_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Process-unique identifier of an entity.
///
/// Allocated from a monotonic atomic counter when the entity is
/// constructed. Snapshot copies keep the id, which is how forces and
/// chunk memberships find "the same" entity in a newer tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(u64);

impl EntityId {
    /// Allocate a fresh id. Thread-safe; never returns the same value twice.
    pub fn next() -> Self {
        Self(ENTITY_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw counter value.
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

/// Process-unique identifier of a force generator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ForceId(u64);

impl ForceId {
    /// Allocate a fresh id.
    pub fn next() -> Self {
        Self(FORCE_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw counter value.
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ForceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "f{}", self.0)
    }
}

/// Monotonically increasing tick counter.
///
/// Incremented each time a tick is opened. The first open tick of a world
/// is `TickId(0)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TickId(pub u64);

impl TickId {
    /// The id of the tick opened after this one.
    pub fn successor(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for TickId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for TickId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}
