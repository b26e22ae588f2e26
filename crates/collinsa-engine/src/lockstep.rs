//! Lockstep (synchronous) simulation world.
//!
//! [`LockstepWorld`] runs the simulation on the caller's thread. Each
//! [`step()`](LockstepWorld::step) drains any queued mutations, runs one
//! full step, closes the open tick and publishes it. No background
//! threads are involved; rendering, if any, is the caller's business
//! through [`latest_closed_tick()`](LockstepWorld::latest_closed_tick).
//!
//! Mutations can arrive two ways:
//!
//! * directly through `&mut self` methods such as
//!   [`place_entity()`](LockstepWorld::place_entity), which act on the
//!   open tick at once;
//! * through a [`WorldHandle`] from [`handle()`](LockstepWorld::handle),
//!   applied at the start of the next step.

use std::sync::Arc;

use collinsa_core::{Entity, EntityId, Force, ForceId, Vec2d};
use collinsa_space::{GridGeometry, RebuildStats};
use crossbeam_channel::Receiver;

use crate::config::{ConfigError, WorldConfig};
use crate::engine::SimulationEngine;
use crate::ingress::{self, Ingress, WorldHandle};
use crate::metrics::StepMetrics;
use crate::tick::{PlaceError, Tick};

// Compile-time assertion: LockstepWorld is Send (can move to a worker
// thread) even though nothing in it is shared.
const _: fn() = || {
    fn assert<T: Send>() {}
    assert::<LockstepWorld>();
};

/// Single-threaded simulation world.
///
/// # Example
///
/// ```ignore
/// let mut world = LockstepWorld::new(WorldConfig::default())?;
/// let id = world.place_entity(Entity::circle(5.0, Material::default(), pos)?)?;
/// for _ in 0..60 {
///     world.step();
/// }
/// let tick = world.latest_closed_tick().unwrap();
/// println!("{:?}", tick.entity(id).map(|e| e.position()));
/// ```
pub struct LockstepWorld {
    engine: SimulationEngine,
    handle: WorldHandle,
    rx: Receiver<Ingress>,
}

impl LockstepWorld {
    /// Validate `config` and create a world with an empty open tick 0.
    pub fn new(config: WorldConfig) -> Result<Self, ConfigError> {
        let engine = SimulationEngine::new(config)?;
        let (handle, rx) = ingress::channel();
        log::debug!("lockstep world created: {:?}", engine.machine().geometry());
        Ok(Self { engine, handle, rx })
    }

    /// A sender whose mutations are applied at the start of the next step.
    pub fn handle(&self) -> WorldHandle {
        self.handle.clone()
    }

    // ── Direct mutation of the open tick ─────────────────────────

    /// Insert an entity into the open tick and its partition.
    pub fn place_entity(&mut self, entity: Entity) -> Result<EntityId, PlaceError> {
        self.engine.machine_mut().current_mut().place(entity)
    }

    /// Queue an entity for removal at the next close. Returns false if the
    /// id is unknown to the open tick.
    pub fn remove_entity(&mut self, id: EntityId) -> bool {
        self.engine.machine_mut().current_mut().queue_removal(id)
    }

    /// Register a targeted force on the open tick.
    pub fn add_force(&mut self, force: Force) -> ForceId {
        self.engine.machine_mut().current_mut().add_force(force)
    }

    /// Register a force applied to every entity. A stored target is dropped.
    pub fn add_global_force(&mut self, force: Force) -> ForceId {
        self.engine.machine_mut().current_mut().add_global_force(force)
    }

    /// Unregister a force. Returns false if it was not registered.
    pub fn remove_force(&mut self, id: ForceId) -> bool {
        self.engine.machine_mut().current_mut().remove_force(id)
    }

    /// Replace the chunk layout, re-partitioning the open tick.
    pub fn resize(&mut self, geometry: GridGeometry) -> RebuildStats {
        log::debug!("resizing chunk grid to {geometry:?}");
        self.engine.machine_mut().resize(geometry)
    }

    // ── Stepping ─────────────────────────────────────────────────

    /// Run one step with the configured time step.
    pub fn step(&mut self) -> StepMetrics {
        let dt = self.engine.next_dt();
        self.step_dt(dt)
    }

    /// Run one step advancing exactly `dt` seconds.
    pub fn step_dt(&mut self, dt: f64) -> StepMetrics {
        let batch: Vec<Ingress> = self.rx.try_iter().collect();
        self.engine.step(batch, dt)
    }

    // ── Readers ──────────────────────────────────────────────────

    /// The open tick.
    pub fn current(&self) -> &Tick {
        self.engine.machine().current()
    }

    /// The open tick, mutably.
    pub fn current_mut(&mut self) -> &mut Tick {
        self.engine.machine_mut().current_mut()
    }

    /// The last closed tick, without marking it delivered.
    pub fn previous(&self) -> Option<Arc<Tick>> {
        self.engine.machine().previous()
    }

    /// The last closed tick, marked delivered.
    pub fn latest_closed_tick(&self) -> Option<Arc<Tick>> {
        self.engine.machine().latest_closed_tick()
    }

    /// The tick handed out by the last
    /// [`latest_closed_tick()`](Self::latest_closed_tick).
    pub fn last_delivered(&self) -> Option<Arc<Tick>> {
        self.engine.machine().last_delivered()
    }

    /// The entity in the open tick nearest to `position`, within
    /// `max_distance`.
    pub fn closest_entity(&self, position: Vec2d, max_distance: f64) -> Option<&Entity> {
        self.current().closest_entity(position, max_distance)
    }

    /// Chunk layout in use.
    pub fn geometry(&self) -> &GridGeometry {
        self.engine.machine().geometry()
    }

    /// Metrics from the most recent step.
    pub fn last_metrics(&self) -> &StepMetrics {
        self.engine.last_metrics()
    }

    /// Discard every entity and force and restart from tick 0.
    ///
    /// Mutations still queued through a [`WorldHandle`] are dropped.
    pub fn reset(&mut self) {
        let dropped = self.rx.try_iter().count();
        if dropped > 0 {
            log::debug!("reset dropped {dropped} queued mutations");
        }
        let capacity = self.engine.machine().ring().capacity();
        self.engine
            .reset(Arc::new(crate::ring::TickRing::new(capacity)));
    }
}

impl std::fmt::Debug for LockstepWorld {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockstepWorld")
            .field("current_tick", &self.current().id())
            .field("entities", &self.current().entity_count())
            .field("geometry", self.geometry())
            .finish()
    }
}
