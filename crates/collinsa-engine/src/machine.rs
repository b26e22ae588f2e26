//! The double-buffered tick lifecycle.

use std::sync::Arc;
use std::time::Duration;

use collinsa_core::TickId;
use collinsa_space::{GridGeometry, RebuildStats};

use crate::ring::TickRing;
use crate::tick::{CloseStats, Tick};

/// Owns the open tick and publishes closed ones.
///
/// * `current` is the open [`Tick`], owned exclusively by whoever drives
///   the simulation.
/// * `previous` is the newest tick in the [`TickRing`]: a value copy that
///   no later mutation of `current` can reach.
/// * `last_delivered` is whatever the render consumer took last through
///   [`latest_closed_tick`](Self::latest_closed_tick).
///
/// Only the ring slot hand-off is synchronized; the open tick is never
/// shared.
pub struct TickMachine {
    current: Tick,
    geometry: GridGeometry,
    ring: Arc<TickRing>,
}

impl TickMachine {
    /// A machine whose first open tick is `TickId(0)` at simulation time 0.
    pub fn new(geometry: GridGeometry, ring: Arc<TickRing>) -> Self {
        Self {
            current: Tick::new(TickId(0), geometry, 0.0),
            geometry,
            ring,
        }
    }

    /// The open tick.
    pub fn current(&self) -> &Tick {
        &self.current
    }

    /// The open tick, mutably.
    pub fn current_mut(&mut self) -> &mut Tick {
        &mut self.current
    }

    /// The last closed tick, without marking it delivered.
    pub fn previous(&self) -> Option<Arc<Tick>> {
        self.ring.latest()
    }

    /// The tick most recently handed to the render consumer.
    pub fn last_delivered(&self) -> Option<Arc<Tick>> {
        self.ring.last_delivered()
    }

    /// The last closed tick, marked delivered.
    pub fn latest_closed_tick(&self) -> Option<Arc<Tick>> {
        self.ring.deliver_latest()
    }

    /// Chunk layout used for new ticks.
    pub fn geometry(&self) -> &GridGeometry {
        &self.geometry
    }

    /// The publication ring.
    pub fn ring(&self) -> &Arc<TickRing> {
        &self.ring
    }

    /// Change the chunk layout. The open tick is re-partitioned at once;
    /// every later tick is built with the new layout.
    pub fn resize(&mut self, geometry: GridGeometry) -> RebuildStats {
        self.geometry = geometry;
        self.current.regrid(geometry)
    }

    /// Close the open tick and publish it as `previous`.
    ///
    /// The successor becomes the new open tick.
    pub fn close(&mut self, duration: Duration) -> CloseStats {
        let (successor, stats) = self.current.close(duration, self.geometry);
        let closed = std::mem::replace(&mut self.current, successor);
        log::trace!(
            "tick {} closed: {} entities, {} inserted, {} removed",
            closed.id(),
            closed.entity_count(),
            stats.inserted,
            stats.removed
        );
        self.ring.push(closed);
        stats
    }
}

impl std::fmt::Debug for TickMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TickMachine")
            .field("current", &self.current.id())
            .field("published", &self.ring.write_pos())
            .finish()
    }
}
