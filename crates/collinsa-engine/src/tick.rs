//! One simulation step's worth of world state.
//!
//! A [`Tick`] starts [`Open`](TickState::Open): the simulation loop
//! integrates, applies forces and re-partitions it in place. Closing it
//! stamps the step duration and builds the successor tick from a deep
//! copy of its entities, after which the closed tick is moved behind an
//! `Arc` and never written again. Readers only ever get `&Tick`.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, SystemTime};

use collinsa_core::{Entity, EntityId, Force, ForceId, TickId, Vec2d};
use collinsa_space::{CandidatePair, ChunkGrid, GridGeometry, RebuildStats};
use indexmap::{IndexMap, IndexSet};

// ── TickState ───────────────────────────────────────────────────

/// Lifecycle of a [`Tick`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickState {
    /// Being simulated; the only state in which the tick is mutated.
    Open,
    /// Duration stamped, successor being built.
    Closing,
    /// Immutable and published to readers.
    Closed,
    /// Handed to the render consumer at least once.
    Delivered,
}

// ── PlaceError ──────────────────────────────────────────────────

/// Error placing an entity directly into a tick.
#[derive(Debug, PartialEq, Eq)]
pub enum PlaceError {
    /// An entity with this id is already in the tick.
    DuplicateId {
        /// The colliding id.
        id: EntityId,
    },
    /// The tick is no longer open.
    TickClosed {
        /// The tick that refused the placement.
        tick: TickId,
    },
}

impl fmt::Display for PlaceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateId { id } => write!(f, "entity {id} is already placed"),
            Self::TickClosed { tick } => write!(f, "tick {tick} is closed"),
        }
    }
}

impl std::error::Error for PlaceError {}

// ── Close bookkeeping ───────────────────────────────────────────

/// What happened while closing a tick and building its successor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CloseStats {
    /// Pending insertions materialized into the successor.
    pub inserted: usize,
    /// Entities removed from the successor.
    pub removed: usize,
    /// Pending insertions rejected because the id already existed.
    pub rejected_insertions: usize,
    /// Forces dropped because an entity they name is gone.
    pub dropped_forces: usize,
    /// Partition of the successor.
    pub partition: RebuildStats,
}

/// Entities spawned and expired during one integration pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IntegrateStats {
    /// Entities spawned by emitters, queued for insertion.
    pub spawned: usize,
    /// Entities whose lifespan ran out, queued for removal.
    pub expired: usize,
}

// ── Tick ────────────────────────────────────────────────────────

/// Entity states, forces and partition at one simulation step.
pub struct Tick {
    id: TickId,
    created_at: SystemTime,
    sim_time: f64,
    dt: f64,
    duration: Option<Duration>,
    state: TickState,
    delivered: AtomicBool,
    entities: IndexMap<EntityId, Entity>,
    grid: ChunkGrid,
    forces: IndexMap<ForceId, Force>,
    global_forces: IndexMap<ForceId, Force>,
    pending_insertions: Vec<Entity>,
    pending_removals: IndexSet<EntityId>,
    candidates: Vec<CandidatePair>,
}

// Compile-time assertion: closed ticks are shared across threads.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<Tick>();
};

impl Tick {
    /// An empty open tick.
    pub fn new(id: TickId, geometry: GridGeometry, sim_time: f64) -> Self {
        Self {
            id,
            created_at: SystemTime::now(),
            sim_time,
            dt: 0.0,
            duration: None,
            state: TickState::Open,
            delivered: AtomicBool::new(false),
            entities: IndexMap::new(),
            grid: ChunkGrid::new(geometry),
            forces: IndexMap::new(),
            global_forces: IndexMap::new(),
            pending_insertions: Vec::new(),
            pending_removals: IndexSet::new(),
            candidates: Vec::new(),
        }
    }

    // ── Read access ─────────────────────────────────────────────

    /// Tick number.
    pub fn id(&self) -> TickId {
        self.id
    }

    /// Wall-clock time at which the tick was opened.
    pub fn created_at(&self) -> SystemTime {
        self.created_at
    }

    /// Simulation time at which the tick was opened, in seconds.
    pub fn sim_time(&self) -> f64 {
        self.sim_time
    }

    /// Simulated seconds this tick advanced (zero until integrated).
    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Wall-clock time spent simulating the tick; `None` while open.
    pub fn duration(&self) -> Option<Duration> {
        self.duration
    }

    /// Lifecycle state.
    pub fn state(&self) -> TickState {
        if self.delivered.load(Ordering::Acquire) {
            TickState::Delivered
        } else {
            self.state
        }
    }

    /// Whether the tick is open for mutation.
    pub fn is_open(&self) -> bool {
        self.state == TickState::Open
    }

    /// Entities by id, in insertion order.
    pub fn entities(&self) -> &IndexMap<EntityId, Entity> {
        &self.entities
    }

    /// One entity by id.
    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    /// Number of live entities.
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// The spatial partition.
    pub fn grid(&self) -> &ChunkGrid {
        &self.grid
    }

    /// Targeted forces.
    pub fn forces(&self) -> impl Iterator<Item = &Force> {
        self.forces.values()
    }

    /// Global forces.
    pub fn global_forces(&self) -> impl Iterator<Item = &Force> {
        self.global_forces.values()
    }

    /// Entities waiting to join the successor tick.
    pub fn pending_insertions(&self) -> &[Entity] {
        &self.pending_insertions
    }

    /// Ids waiting to leave the successor tick.
    pub fn pending_removals(&self) -> &IndexSet<EntityId> {
        &self.pending_removals
    }

    /// Broad-phase candidate pairs computed this step.
    pub fn candidates(&self) -> &[CandidatePair] {
        &self.candidates
    }

    /// Entities sharing a chunk with `id`, excluding `id`.
    pub fn nearby(&self, id: EntityId) -> IndexSet<EntityId> {
        match self.entities.get(&id) {
            Some(e) => self.grid.nearby(id, &e.aabb()),
            None => IndexSet::new(),
        }
    }

    /// Nearest entity to `position` whose centre lies within
    /// `max_distance`. Linear scan.
    pub fn closest_entity(&self, position: Vec2d, max_distance: f64) -> Option<&Entity> {
        self.entities
            .values()
            .map(|e| (e.distance_to(position), e))
            .filter(|(d, _)| *d <= max_distance)
            .min_by(|(a, _), (b, _)| a.total_cmp(b))
            .map(|(_, e)| e)
    }

    // ── Mutation (open ticks only) ──────────────────────────────

    /// Insert an entity directly and record it in the partition.
    pub fn place(&mut self, entity: Entity) -> Result<EntityId, PlaceError> {
        if !self.is_open() {
            return Err(PlaceError::TickClosed { tick: self.id });
        }
        let id = entity.id();
        if self.entities.contains_key(&id) {
            return Err(PlaceError::DuplicateId { id });
        }
        self.grid.insert(id, &entity.aabb());
        self.entities.insert(id, entity);
        Ok(id)
    }

    /// Mutable access to one entity.
    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    /// Queue an entity for the successor tick.
    pub fn queue_insertion(&mut self, entity: Entity) {
        self.pending_insertions.push(entity);
    }

    /// Queue an entity's removal at close. Returns whether it is known to
    /// this tick (live or pending).
    pub fn queue_removal(&mut self, id: EntityId) -> bool {
        let known = self.entities.contains_key(&id)
            || self.pending_insertions.iter().any(|e| e.id() == id);
        self.pending_removals.insert(id);
        known
    }

    /// Register a force. Global forces (no target) go to the global list.
    pub fn add_force(&mut self, force: Force) -> ForceId {
        let id = force.id();
        if force.is_global() {
            self.global_forces.insert(id, force);
        } else {
            self.forces.insert(id, force);
        }
        id
    }

    /// Register a force for every entity. A stored target is dropped.
    pub fn add_global_force(&mut self, force: Force) -> ForceId {
        if !force.is_global() {
            log::debug!("force {} re-registered as global", force.id());
        }
        let force = force.into_global();
        let id = force.id();
        self.global_forces.insert(id, force);
        id
    }

    /// Unregister a force of either kind.
    pub fn remove_force(&mut self, id: ForceId) -> bool {
        self.forces.shift_remove(&id).is_some() || self.global_forces.shift_remove(&id).is_some()
    }

    /// Apply every targeted force, then every global force to every
    /// entity. Returns how many applications had an effect.
    pub fn apply_forces(&mut self) -> usize {
        let mut applied = 0;
        for force in self.forces.values() {
            if force.apply(&mut self.entities) {
                applied += 1;
            }
        }
        if !self.global_forces.is_empty() {
            let ids: Vec<EntityId> = self.entities.keys().copied().collect();
            for force in self.global_forces.values() {
                for &id in &ids {
                    if force.apply_to(id, &mut self.entities) {
                        applied += 1;
                    }
                }
            }
        }
        applied
    }

    /// Advance every entity by `dt`. Emitter output is queued for
    /// insertion and expired entities are queued for removal.
    pub fn integrate(&mut self, dt: f64) -> IntegrateStats {
        let mut stats = IntegrateStats::default();
        for (id, entity) in &mut self.entities {
            let spawned = entity.emit(dt);
            stats.spawned += spawned.len();
            self.pending_insertions.extend(spawned);
            entity.update(dt);
            if entity.is_expired() && self.pending_removals.insert(*id) {
                stats.expired += 1;
            }
        }
        self.dt = dt;
        stats
    }

    /// Rebuild the partition from current AABBs.
    pub fn repartition(&mut self) -> RebuildStats {
        self.grid
            .rebuild(self.entities.iter().map(|(id, e)| (*id, e.aabb())))
    }

    /// Replace the chunk layout and re-partition.
    pub fn regrid(&mut self, geometry: GridGeometry) -> RebuildStats {
        self.grid.resize(geometry);
        self.repartition()
    }

    /// Store this step's broad-phase result.
    pub fn set_candidates(&mut self, candidates: Vec<CandidatePair>) {
        self.candidates = candidates;
    }

    // ── Close ───────────────────────────────────────────────────

    /// Stamp `duration`, mark the tick closed, and build the open
    /// successor.
    ///
    /// The successor holds deep copies of every surviving entity (same
    /// ids), the drained pending insertions, a partition rebuilt over
    /// `geometry`, and every force that still resolves. The closed tick
    /// keeps its own entity map untouched.
    pub fn close(&mut self, duration: Duration, geometry: GridGeometry) -> (Tick, CloseStats) {
        self.state = TickState::Closing;
        self.duration = Some(duration);

        let mut stats = CloseStats::default();
        let removals = std::mem::take(&mut self.pending_removals);
        let insertions = std::mem::take(&mut self.pending_insertions);

        let mut entities: IndexMap<EntityId, Entity> =
            IndexMap::with_capacity(self.entities.len() + insertions.len());
        for (id, e) in &self.entities {
            if removals.contains(id) {
                stats.removed += 1;
            } else {
                entities.insert(*id, e.clone());
            }
        }
        for e in insertions {
            let id = e.id();
            if removals.contains(&id) {
                continue;
            }
            if entities.contains_key(&id) {
                log::warn!("tick {}: dropping duplicate insertion of {id}", self.id);
                stats.rejected_insertions += 1;
                continue;
            }
            entities.insert(id, e);
            stats.inserted += 1;
        }

        let mut rehome = |forces: &IndexMap<ForceId, Force>| -> IndexMap<ForceId, Force> {
            forces
                .values()
                .filter(|f| {
                    let keep = f.is_resolvable(&entities);
                    if !keep {
                        log::debug!("tick {}: dropping dangling force {}", self.id, f.id());
                        stats.dropped_forces += 1;
                    }
                    keep
                })
                .map(|f| (f.id(), f.clone()))
                .collect()
        };
        let forces = rehome(&self.forces);
        let global_forces = rehome(&self.global_forces);

        let mut successor = Tick::new(self.id.successor(), geometry, self.sim_time + self.dt);
        successor.entities = entities;
        successor.forces = forces;
        successor.global_forces = global_forces;
        stats.partition = successor.repartition();

        self.state = TickState::Closed;
        (successor, stats)
    }

    /// Record a hand-off to the render consumer. Returns true the first
    /// time.
    pub fn mark_delivered(&self) -> bool {
        !self.delivered.swap(true, Ordering::AcqRel)
    }
}

impl fmt::Debug for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tick")
            .field("id", &self.id)
            .field("state", &self.state())
            .field("sim_time", &self.sim_time)
            .field("entities", &self.entities.len())
            .field("forces", &self.forces.len())
            .field("global_forces", &self.global_forces.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use collinsa_core::Material;

    fn ball(x: f64, y: f64) -> Entity {
        Entity::circle(5.0, Material::default(), Vec2d::new(x, y)).unwrap()
    }

    fn open() -> Tick {
        Tick::new(TickId(0), GridGeometry::default(), 0.0)
    }

    #[test]
    fn place_records_partition() {
        let mut t = open();
        let id = t.place(ball(100.0, 100.0)).unwrap();
        assert_eq!(t.entity_count(), 1);
        assert!(t.grid().chunk(10).unwrap().contains(id));
    }

    #[test]
    fn place_rejects_duplicate() {
        let mut t = open();
        let e = ball(100.0, 100.0);
        let copy = e.clone();
        t.place(e).unwrap();
        assert_eq!(
            t.place(copy.clone()),
            Err(PlaceError::DuplicateId { id: copy.id() })
        );
    }

    #[test]
    fn close_builds_independent_successor() {
        let mut t = open();
        let id = t.place(ball(100.0, 100.0)).unwrap();
        let (mut next, stats) = t.close(Duration::from_millis(1), GridGeometry::default());
        assert_eq!(stats, CloseStats { partition: stats.partition, ..CloseStats::default() });
        assert_eq!(t.state(), TickState::Closed);
        assert_eq!(next.state(), TickState::Open);
        assert_eq!(next.id(), TickId(1));

        next.entity_mut(id).unwrap().set_position(Vec2d::new(500.0, 500.0));
        assert_eq!(t.entity(id).unwrap().position(), Vec2d::new(100.0, 100.0));
        assert!(t.place(ball(1.0, 1.0)).is_err());
    }

    #[test]
    fn close_materializes_pending_and_drops_dangling_forces() {
        let mut t = open();
        let a = t.place(ball(100.0, 100.0)).unwrap();
        let b = t.place(ball(120.0, 100.0)).unwrap();
        let c = ball(300.0, 300.0);
        let c_id = c.id();
        t.queue_insertion(c);
        t.add_force(Force::spring(a, b, 10.0, 1.0, 0.0));
        t.add_force(Force::motor(a, 1.0));
        t.add_force(Force::global_planet_gravity(Vec2d::new(0.0, 9.81)));
        assert!(t.queue_removal(b));

        let (next, stats) = t.close(Duration::ZERO, GridGeometry::default());
        assert_eq!(stats.inserted, 1);
        assert_eq!(stats.removed, 1);
        assert_eq!(stats.dropped_forces, 1);
        assert!(next.entity(c_id).is_some());
        assert!(next.entity(b).is_none());
        assert_eq!(next.forces().count(), 1);
        assert_eq!(next.global_forces().count(), 1);
        // The closed tick still shows what it simulated.
        assert!(t.entity(b).is_some());
        assert_eq!(t.forces().count(), 2);
    }

    #[test]
    fn integrate_expires_and_queues() {
        let mut t = open();
        let id = t.place(ball(100.0, 100.0).with_lifespan(0.01)).unwrap();
        let stats = t.integrate(1.0 / 60.0);
        assert_eq!(stats.expired, 1);
        assert!(t.pending_removals().contains(&id));
        let (next, _) = t.close(Duration::ZERO, GridGeometry::default());
        assert_eq!(next.entity_count(), 0);
        assert!((next.sim_time() - 1.0 / 60.0).abs() < 1e-12);
    }

    #[test]
    fn global_forces_reach_every_entity() {
        let mut t = open();
        let a = t.place(ball(100.0, 100.0)).unwrap();
        let b = t.place(ball(300.0, 100.0)).unwrap();
        t.add_force(Force::global_planet_gravity(Vec2d::new(0.0, 10.0)));
        assert_eq!(t.apply_forces(), 2);
        for id in [a, b] {
            assert!((t.entity(id).unwrap().acceleration().y - 10.0).abs() < 1e-9);
        }
    }

    #[test]
    fn closest_entity_respects_max_distance() {
        let mut t = open();
        let near = t.place(ball(100.0, 100.0)).unwrap();
        t.place(ball(200.0, 100.0)).unwrap();
        let hit = t.closest_entity(Vec2d::new(110.0, 100.0), 50.0).unwrap();
        assert_eq!(hit.id(), near);
        assert!(t.closest_entity(Vec2d::new(700.0, 700.0), 50.0).is_none());
    }

    #[test]
    fn delivered_flag_flips_once() {
        let mut t = open();
        t.close(Duration::ZERO, GridGeometry::default());
        assert!(t.mark_delivered());
        assert!(!t.mark_delivered());
        assert_eq!(t.state(), TickState::Delivered);
    }

    #[test]
    fn nearby_uses_partition() {
        let mut t = open();
        let a = t.place(ball(100.0, 100.0)).unwrap();
        let b = t.place(ball(110.0, 100.0)).unwrap();
        t.place(ball(1000.0, 800.0)).unwrap();
        let near = t.nearby(a);
        assert_eq!(near.len(), 1);
        assert!(near.contains(&b));
    }
}
