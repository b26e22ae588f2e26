//! The per-step simulation pipeline.
//!
//! [`SimulationEngine::step`] runs, in order:
//!
//! 1. apply queued [`Ingress`] messages to the open tick,
//! 2. apply targeted and global forces,
//! 3. integrate every entity (emitters spawn, lifespans expire),
//! 4. re-partition the chunk grid,
//! 5. compute broad-phase candidate pairs,
//! 6. close the tick and publish it.
//!
//! The engine is driven either by [`LockstepWorld`](crate::LockstepWorld)
//! on the caller's thread or by the simulation thread of a
//! [`RealtimeWorld`](crate::RealtimeWorld); it never spawns threads itself.

use std::sync::Arc;
use std::time::Instant;

use collinsa_space::Collider;

use crate::config::{ConfigError, TimeStep, WorldConfig};
use crate::ingress::{apply_batch, Ingress};
use crate::machine::TickMachine;
use crate::metrics::StepMetrics;
use crate::ring::TickRing;

/// Owns the tick machine and the broad-phase scratch state.
pub struct SimulationEngine {
    machine: TickMachine,
    collider: Collider,
    config: WorldConfig,
    last_step_at: Option<Instant>,
    last_metrics: StepMetrics,
}

// Compile-time assertion: the engine moves into the simulation thread.
const _: fn() = || {
    fn assert<T: Send>() {}
    assert::<SimulationEngine>();
};

fn micros_since(start: Instant) -> u64 {
    start.elapsed().as_micros() as u64
}

impl SimulationEngine {
    /// Validate `config` and build an engine publishing into a fresh ring.
    pub fn new(config: WorldConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let ring = Arc::new(TickRing::new(config.ring_buffer_size));
        Ok(Self {
            machine: TickMachine::new(config.geometry, ring),
            collider: Collider::new(),
            config,
            last_step_at: None,
            last_metrics: StepMetrics::default(),
        })
    }

    /// The tick machine.
    pub fn machine(&self) -> &TickMachine {
        &self.machine
    }

    /// The tick machine, mutably.
    pub fn machine_mut(&mut self) -> &mut TickMachine {
        &mut self.machine
    }

    /// The configuration the engine was built from. The geometry reflects
    /// construction time; see [`TickMachine::geometry`] for the live one.
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Metrics from the most recent step.
    pub fn last_metrics(&self) -> &StepMetrics {
        &self.last_metrics
    }

    /// Simulated seconds the next step should advance.
    ///
    /// Fixed steps return the configured value. Wall-clock steps return
    /// the time since the previous step, capped at `max_dt`; the first
    /// step uses one tick period.
    pub fn next_dt(&self) -> f64 {
        match self.config.time_step {
            TimeStep::Fixed(dt) => dt,
            TimeStep::WallClock { max_dt } => {
                let elapsed = match self.last_step_at {
                    Some(t) => t.elapsed().as_secs_f64(),
                    None => 1.0 / self.config.tick_rate_hz,
                };
                elapsed.clamp(0.0, max_dt)
            }
        }
    }

    /// Run one full step advancing `dt` seconds and close the tick.
    pub fn step(&mut self, ingress: impl IntoIterator<Item = Ingress>, dt: f64) -> StepMetrics {
        let step_start = Instant::now();
        self.last_step_at = Some(step_start);
        let mut m = StepMetrics {
            tick: self.machine.current().id(),
            dt,
            ..StepMetrics::default()
        };

        // 1. Ingress.
        let t = Instant::now();
        let ingress_stats = apply_batch(&mut self.machine, ingress);
        m.rejected_insertions = ingress_stats.rejected_insertions;
        m.ingress_us = micros_since(t);

        let tick = self.machine.current_mut();

        // 2. Forces.
        let t = Instant::now();
        m.forces_applied = tick.apply_forces();
        m.forces_us = micros_since(t);

        // 3. Integration.
        let t = Instant::now();
        let integrated = tick.integrate(dt);
        m.spawned = integrated.spawned;
        m.expired = integrated.expired;
        m.integrate_us = micros_since(t);

        // 4. Partition.
        let t = Instant::now();
        let partition = tick.repartition();
        m.skipped_corners = partition.skipped_corners;
        m.partition_us = micros_since(t);

        // 5. Broad phase.
        let t = Instant::now();
        let pairs = self.collider.candidate_pairs(tick.grid(), tick.entities());
        m.candidate_pairs = pairs.len();
        tick.set_candidates(pairs);
        m.broad_phase_us = micros_since(t);
        m.entity_count = tick.entity_count();

        // 6. Close.
        let t = Instant::now();
        let closed = self.machine.close(step_start.elapsed());
        m.forces_dropped = closed.dropped_forces;
        m.rejected_insertions += closed.rejected_insertions;
        m.close_us = micros_since(t);

        m.total_us = micros_since(step_start);
        self.last_metrics = m.clone();
        m
    }

    /// Discard all world state and publish into `ring` from tick 0.
    pub fn reset(&mut self, ring: Arc<TickRing>) {
        self.machine = TickMachine::new(*self.machine.geometry(), ring);
        self.collider = Collider::new();
        self.last_step_at = None;
        self.last_metrics = StepMetrics::default();
    }
}

impl std::fmt::Debug for SimulationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulationEngine")
            .field("machine", &self.machine)
            .field("time_step", &self.config.time_step)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use collinsa_core::{CollisionType, Entity, Force, Material, TickId, Vec2d};

    fn engine() -> SimulationEngine {
        SimulationEngine::new(WorldConfig::default()).unwrap()
    }

    fn ball(x: f64, y: f64) -> Entity {
        Entity::circle(5.0, Material::default(), Vec2d::new(x, y)).unwrap()
    }

    #[test]
    fn step_publishes_one_tick() {
        let mut e = engine();
        let m = e.step([], 1.0 / 60.0);
        assert_eq!(m.tick, TickId(0));
        assert_eq!(e.machine().previous().unwrap().id(), TickId(0));
        assert_eq!(e.machine().current().id(), TickId(1));
    }

    #[test]
    fn inserted_entity_is_integrated_in_same_step() {
        let mut e = engine();
        let b = ball(100.0, 100.0).with_velocity(Vec2d::new(60.0, 0.0));
        let id = b.id();
        e.step([Ingress::Insert(b)], 1.0 / 60.0);
        let prev = e.machine().previous().unwrap();
        let snap = prev.entity(id).unwrap();
        assert!((snap.position().x - 101.0).abs() < 1e-9);
        assert!((snap.aabb().center() - snap.position()).length() < 1e-12);
    }

    #[test]
    fn candidate_pairs_are_recorded() {
        let mut e = engine();
        let m = e.step(
            [
                Ingress::Insert(ball(100.0, 100.0)),
                Ingress::Insert(ball(104.0, 100.0)),
                Ingress::Insert(ball(104.0, 100.0).with_collision(CollisionType::Ignore)),
            ],
            1.0 / 60.0,
        );
        assert_eq!(m.candidate_pairs, 1);
        assert_eq!(e.machine().previous().unwrap().candidates().len(), 1);
    }

    #[test]
    fn dangling_force_dropped_at_close() {
        let mut e = engine();
        let a = ball(100.0, 100.0);
        let b = ball(130.0, 100.0);
        let (ia, ib) = (a.id(), b.id());
        let m = e.step(
            [
                Ingress::Insert(a),
                Ingress::Insert(b),
                Ingress::AddForce(Force::spring(ia, ib, 10.0, 1.0, 0.1)),
                Ingress::Remove(ib),
            ],
            1.0 / 60.0,
        );
        assert_eq!(m.forces_applied, 1);
        assert_eq!(m.forces_dropped, 1);
        assert_eq!(e.machine().current().forces().count(), 0);
        assert!(e.machine().current().entity(ib).is_none());
    }

    #[test]
    fn wall_clock_dt_is_capped() {
        let config = WorldConfig {
            time_step: TimeStep::WallClock { max_dt: 0.001 },
            ..WorldConfig::default()
        };
        let mut e = SimulationEngine::new(config).unwrap();
        assert!(e.next_dt() <= 0.001);
        e.step([], e.next_dt());
        std::thread::sleep(std::time::Duration::from_millis(5));
        assert_eq!(e.next_dt(), 0.001);
    }

    #[test]
    fn reset_starts_over() {
        let mut e = engine();
        e.step([Ingress::Insert(ball(1.0, 1.0))], 0.1);
        let ring = Arc::new(TickRing::new(4));
        e.reset(Arc::clone(&ring));
        assert_eq!(e.machine().current().id(), TickId(0));
        assert_eq!(e.machine().current().entity_count(), 0);
        assert!(ring.is_empty());
    }
}
