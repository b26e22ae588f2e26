//! User-facing [`RealtimeWorld`] API and shutdown state machine.
//!
//! The simulation runs on a dedicated background thread at the configured
//! tick rate. An optional rendering thread consumes closed ticks at its
//! own frame rate. The two never wait on each other: the only shared
//! state is the [`TickRing`].
//!
//! # Architecture
//!
//! ```text
//! User Thread(s)              Sim Thread                 Render Thread
//!     |                           |                           |
//!     |--WorldHandle::send()----->| rx.try_iter()             |
//!     |   [unbounded channel]     | engine.step(batch, dt)    |
//!     |                           | ring.push(closed tick)    |
//!     |                           | park(budget - elapsed)    |
//!     |                           |                           |
//!     |                           |        ring.deliver_latest()
//!     |                           |        sink.draw(&tick, frame)
//!     |                           |        park(budget - elapsed)
//!     |                           |                           |
//!     |--latest_closed_tick()-----+--> ring.deliver_latest()  |
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use collinsa_core::{Entity, EntityId, Force, ForceId};
use collinsa_space::GridGeometry;

use crate::config::{ConfigError, RenderConfig, WorldConfig};
use crate::engine::SimulationEngine;
use crate::ingress::{self, SubmitError, WorldHandle};
use crate::render_loop::{FrameSink, RenderThreadState};
use crate::ring::TickRing;
use crate::sim_thread::SimThreadState;
use crate::tick::Tick;

// ── ShutdownReport ───────────────────────────────────────────────

/// Report from the shutdown state machine.
#[derive(Debug)]
pub struct ShutdownReport {
    /// Total time spent in the shutdown sequence.
    pub total_ms: u64,
    /// Time spent waiting for the simulation loop to stop.
    pub drain_ms: u64,
    /// Time spent waiting for the rendering loop (if any) to stop.
    pub quiesce_ms: u64,
    /// Whether the simulation thread was joined and its engine recovered.
    pub sim_joined: bool,
    /// Whether the rendering thread (if any) was joined.
    pub render_joined: bool,
}

// ── ShutdownState ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ShutdownState {
    Running,
    Draining,
    Quiescing,
    Dropped,
}

/// Spin until `flag` is raised or `limit` passes. Returns whether it was.
fn wait_for_flag(flag: &AtomicBool, limit: Duration) -> bool {
    let deadline = Instant::now() + limit;
    while !flag.load(Ordering::Acquire) {
        if Instant::now() > deadline {
            return false;
        }
        thread::yield_now();
    }
    true
}

// ── Thread spawning ──────────────────────────────────────────────

fn spawn_sim(state: SimThreadState) -> Result<JoinHandle<SimulationEngine>, ConfigError> {
    thread::Builder::new()
        .name("collinsa-sim".into())
        .spawn(move || state.run())
        .map_err(|e| ConfigError::ThreadSpawnFailed {
            reason: format!("simulation thread: {e}"),
        })
}

fn spawn_render(state: RenderThreadState) -> Result<JoinHandle<Box<dyn FrameSink>>, ConfigError> {
    thread::Builder::new()
        .name("collinsa-render".into())
        .spawn(move || state.run())
        .map_err(|e| ConfigError::ThreadSpawnFailed {
            reason: format!("render thread: {e}"),
        })
}

// ── RealtimeWorld ────────────────────────────────────────────────

/// Realtime simulation world with decoupled simulation and rendering
/// loops.
///
/// Mutations go through [`WorldHandle`]s and are applied at the start of
/// the next simulation step. Closed ticks are read with
/// [`latest_closed_tick()`](Self::latest_closed_tick) or drawn by the
/// [`FrameSink`] given to [`with_renderer()`](Self::with_renderer).
pub struct RealtimeWorld {
    ring: Arc<TickRing>,
    handle: WorldHandle,
    shutdown_flag: Arc<AtomicBool>,
    sim_stopped: Arc<AtomicBool>,
    /// Raised from the start when there is no renderer.
    render_stopped: Arc<AtomicBool>,
    sim_thread: Option<JoinHandle<SimulationEngine>>,
    render_thread: Option<JoinHandle<Box<dyn FrameSink>>>,
    state: ShutdownState,
    /// Recovered from the simulation thread on shutdown, used by `reset()`.
    recovered_engine: Mutex<Option<SimulationEngine>>,
    recovered_sink: Mutex<Option<Box<dyn FrameSink>>>,
    config: WorldConfig,
    render_config: Option<RenderConfig>,
}

// Compile-time assertion: the world can be shared with producer threads.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<RealtimeWorld>();
};

impl RealtimeWorld {
    /// Validate `config` and start the simulation thread. No rendering
    /// thread is started; poll [`latest_closed_tick()`](Self::latest_closed_tick)
    /// instead.
    pub fn new(config: WorldConfig) -> Result<Self, ConfigError> {
        Self::start(config, None)
    }

    /// Validate both configs and start the simulation and rendering
    /// threads.
    pub fn with_renderer(
        config: WorldConfig,
        render_config: RenderConfig,
        sink: Box<dyn FrameSink>,
    ) -> Result<Self, ConfigError> {
        render_config.validate()?;
        Self::start(config, Some((render_config, sink)))
    }

    fn start(
        config: WorldConfig,
        render: Option<(RenderConfig, Box<dyn FrameSink>)>,
    ) -> Result<Self, ConfigError> {
        let engine = SimulationEngine::new(config.clone())?;
        let ring = Arc::clone(engine.machine().ring());
        let shutdown_flag = Arc::new(AtomicBool::new(false));
        let sim_stopped = Arc::new(AtomicBool::new(false));
        let render_stopped = Arc::new(AtomicBool::new(render.is_none()));
        let (handle, rx) = ingress::channel();

        let sim_thread = spawn_sim(SimThreadState::new(
            engine,
            rx,
            Arc::clone(&shutdown_flag),
            Arc::clone(&sim_stopped),
        ))?;

        let mut world = Self {
            ring,
            handle,
            shutdown_flag,
            sim_stopped,
            render_stopped,
            sim_thread: Some(sim_thread),
            render_thread: None,
            state: ShutdownState::Running,
            recovered_engine: Mutex::new(None),
            recovered_sink: Mutex::new(None),
            config,
            render_config: None,
        };

        if let Some((render_config, sink)) = render {
            world.render_thread = Some(spawn_render(RenderThreadState::new(
                sink,
                Arc::clone(&world.ring),
                Arc::clone(&world.shutdown_flag),
                Arc::clone(&world.render_stopped),
                render_config.frame_rate_hz,
            ))?);
            world.render_config = Some(render_config);
        }
        log::debug!(
            "realtime world started at {} Hz (renderer: {})",
            world.config.tick_rate_hz,
            world.render_config.is_some()
        );
        Ok(world)
    }

    /// A sender for world mutations. Handles stop working after
    /// [`shutdown()`](Self::shutdown) and are not carried across
    /// [`reset()`](Self::reset).
    pub fn handle(&self) -> WorldHandle {
        self.handle.clone()
    }

    /// Queue an entity for placement.
    pub fn place_entity(&self, entity: Entity) -> Result<EntityId, SubmitError> {
        self.handle.place_entity(entity)
    }

    /// Queue an entity's removal.
    pub fn remove_entity(&self, id: EntityId) -> Result<(), SubmitError> {
        self.handle.remove_entity(id)
    }

    /// Queue a targeted force.
    pub fn add_force(&self, force: Force) -> Result<ForceId, SubmitError> {
        self.handle.add_force(force)
    }

    /// Queue a force applied to every entity.
    pub fn add_global_force(&self, force: Force) -> Result<ForceId, SubmitError> {
        self.handle.add_global_force(force)
    }

    /// Queue a force's removal.
    pub fn remove_force(&self, id: ForceId) -> Result<(), SubmitError> {
        self.handle.remove_force(id)
    }

    /// Queue a chunk layout change.
    pub fn resize(&self, geometry: GridGeometry) -> Result<(), SubmitError> {
        self.handle.resize(geometry)
    }

    /// The newest closed tick, marked delivered.
    pub fn latest_closed_tick(&self) -> Option<Arc<Tick>> {
        self.ring.deliver_latest()
    }

    /// The newest closed tick, without marking it delivered.
    pub fn peek_latest(&self) -> Option<Arc<Tick>> {
        self.ring.latest()
    }

    /// The tick most recently handed out by
    /// [`latest_closed_tick()`](Self::latest_closed_tick) or the renderer.
    pub fn last_delivered(&self) -> Option<Arc<Tick>> {
        self.ring.last_delivered()
    }

    /// Closed ticks published since the world (re)started.
    pub fn published(&self) -> u64 {
        self.ring.write_pos()
    }

    /// The configuration the world was started with.
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Whether the threads are running.
    pub fn is_running(&self) -> bool {
        self.state == ShutdownState::Running
    }

    /// Shut the world down with the 4-state machine.
    ///
    /// 1. **Running → Draining:** set the shutdown flag, unpark both
    ///    threads (waking them from their budget park), wait for the
    ///    simulation loop to stop.
    /// 2. **Draining → Quiescing:** wait for the rendering loop to finish
    ///    its current frame and exit on the same flag.
    /// 3. **Quiescing → Dropped:** join both threads, keeping the engine
    ///    and sink for [`reset()`](Self::reset).
    pub fn shutdown(&mut self) -> ShutdownReport {
        if self.state == ShutdownState::Dropped {
            return ShutdownReport {
                total_ms: 0,
                drain_ms: 0,
                quiesce_ms: 0,
                sim_joined: true,
                render_joined: true,
            };
        }

        let start = Instant::now();

        // Phase 1: Running → Draining
        self.state = ShutdownState::Draining;
        self.shutdown_flag.store(true, Ordering::Release);
        if let Some(handle) = &self.sim_thread {
            handle.thread().unpark();
        }
        if let Some(handle) = &self.render_thread {
            handle.thread().unpark();
        }

        // A step in progress finishes before the flag is seen.
        if !wait_for_flag(&self.sim_stopped, Duration::from_millis(100)) {
            log::warn!("simulation loop did not stop within 100ms; joining anyway");
        }
        let drain_ms = start.elapsed().as_millis() as u64;

        // Phase 2: Draining → Quiescing
        self.state = ShutdownState::Quiescing;
        let quiesce_start = Instant::now();
        // A frame being drawn finishes before the flag is seen.
        if !wait_for_flag(&self.render_stopped, Duration::from_millis(100)) {
            log::warn!("render loop did not stop within 100ms; joining anyway");
        }
        let quiesce_ms = quiesce_start.elapsed().as_millis() as u64;

        // Phase 3: Quiescing → Dropped
        self.state = ShutdownState::Dropped;

        let sim_joined = match self.sim_thread.take().map(JoinHandle::join) {
            Some(Ok(engine)) => {
                *self
                    .recovered_engine
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner) = Some(engine);
                true
            }
            Some(Err(_)) => {
                log::warn!("simulation thread panicked");
                false
            }
            None => true,
        };

        let render_joined = match self.render_thread.take().map(JoinHandle::join) {
            Some(Ok(sink)) => {
                *self
                    .recovered_sink
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner) = Some(sink);
                true
            }
            Some(Err(_)) => {
                log::warn!("render thread panicked");
                false
            }
            None => true,
        };

        let total_ms = start.elapsed().as_millis() as u64;
        log::debug!("realtime world shut down in {total_ms}ms");
        ShutdownReport {
            total_ms,
            drain_ms,
            quiesce_ms,
            sim_joined,
            render_joined,
        }
    }

    /// Stop both threads, discard all world state and restart at tick 0.
    ///
    /// The engine and sink are recovered from their threads and reused.
    /// A fresh ring and ingress channel are created, so previously issued
    /// [`WorldHandle`]s and ticks belong to the old run.
    pub fn reset(&mut self) -> Result<(), ConfigError> {
        if self.state != ShutdownState::Dropped {
            self.shutdown();
        }

        let mut engine = self
            .recovered_engine
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or(ConfigError::EngineRecoveryFailed)?;

        self.ring = Arc::new(TickRing::new(self.ring.capacity()));
        engine.reset(Arc::clone(&self.ring));
        self.shutdown_flag = Arc::new(AtomicBool::new(false));
        self.sim_stopped = Arc::new(AtomicBool::new(false));
        let (handle, rx) = ingress::channel();
        self.handle = handle;

        self.sim_thread = Some(spawn_sim(SimThreadState::new(
            engine,
            rx,
            Arc::clone(&self.shutdown_flag),
            Arc::clone(&self.sim_stopped),
        ))?);

        let sink = self
            .recovered_sink
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        self.render_stopped = Arc::new(AtomicBool::new(true));
        if let (Some(render_config), Some(sink)) = (&self.render_config, sink) {
            self.render_stopped.store(false, Ordering::Release);
            self.render_thread = Some(spawn_render(RenderThreadState::new(
                sink,
                Arc::clone(&self.ring),
                Arc::clone(&self.shutdown_flag),
                Arc::clone(&self.render_stopped),
                render_config.frame_rate_hz,
            ))?);
        }

        self.state = ShutdownState::Running;
        log::debug!("realtime world reset");
        Ok(())
    }
}

impl Drop for RealtimeWorld {
    fn drop(&mut self) {
        if self.state != ShutdownState::Dropped {
            self.shutdown();
        }
    }
}

impl std::fmt::Debug for RealtimeWorld {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeWorld")
            .field("state", &self.state)
            .field("published", &self.ring.write_pos())
            .field("renderer", &self.render_config.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render_loop::FrameInfo;
    use collinsa_core::{Material, TickId, Vec2d};
    use std::sync::atomic::AtomicU64;

    fn fast_config() -> WorldConfig {
        WorldConfig {
            tick_rate_hz: 500.0,
            ..WorldConfig::default()
        }
    }

    fn wait_for<F: FnMut() -> bool>(what: &str, mut f: F) {
        let deadline = Instant::now() + Duration::from_secs(2);
        while !f() {
            if Instant::now() > deadline {
                panic!("{what} not reached within 2s");
            }
            thread::sleep(Duration::from_millis(2));
        }
    }

    #[test]
    fn lifecycle_start_and_shutdown() {
        let mut world = RealtimeWorld::new(fast_config()).unwrap();
        wait_for("first tick", || world.peek_latest().is_some());
        assert!(world.is_running());

        let report = world.shutdown();
        assert!(report.sim_joined);
        assert!(report.render_joined);
        assert!(!world.is_running());

        // Idempotent.
        let again = world.shutdown();
        assert_eq!(again.total_ms, 0);
    }

    #[test]
    fn placed_entity_reaches_closed_tick() {
        let world = RealtimeWorld::new(fast_config()).unwrap();
        let id = world
            .place_entity(Entity::circle(5.0, Material::default(), Vec2d::new(100.0, 100.0)).unwrap())
            .unwrap();
        wait_for("entity published", || {
            world
                .latest_closed_tick()
                .is_some_and(|t| t.entity(id).is_some())
        });
        assert!(world.last_delivered().is_some());
    }

    #[test]
    fn handle_fails_after_shutdown() {
        let mut world = RealtimeWorld::new(fast_config()).unwrap();
        let handle = world.handle();
        world.shutdown();
        assert_eq!(handle.remove_entity(EntityId::next()), Err(SubmitError::Shutdown));
    }

    #[test]
    fn renderer_draws_frames() {
        let frames = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&frames);
        let sink = Box::new(move |_: &Tick, _: FrameInfo| {
            counter.fetch_add(1, Ordering::Relaxed);
        });
        let mut world =
            RealtimeWorld::with_renderer(fast_config(), RenderConfig { frame_rate_hz: 500.0 }, sink)
                .unwrap();
        wait_for("frames drawn", || frames.load(Ordering::Relaxed) >= 5);
        let report = world.shutdown();
        assert!(report.render_joined);
    }

    #[test]
    fn shutdown_waits_for_frame_in_progress() {
        let drawing = Arc::new(AtomicBool::new(false));
        let finished = Arc::new(AtomicU64::new(0));
        let (flag, done) = (Arc::clone(&drawing), Arc::clone(&finished));
        let sink = Box::new(move |_: &Tick, _: FrameInfo| {
            flag.store(true, Ordering::Release);
            thread::sleep(Duration::from_millis(20));
            done.fetch_add(1, Ordering::Release);
        });
        let mut world =
            RealtimeWorld::with_renderer(fast_config(), RenderConfig { frame_rate_hz: 500.0 }, sink)
                .unwrap();
        wait_for("frame started", || drawing.load(Ordering::Acquire));

        let report = world.shutdown();
        assert!(report.render_joined);
        assert!(report.quiesce_ms <= report.total_ms);
        assert!(finished.load(Ordering::Acquire) >= 1);
        assert!(world.render_stopped.load(Ordering::Acquire));
    }

    #[test]
    fn headless_shutdown_has_nothing_to_quiesce() {
        let mut world = RealtimeWorld::new(fast_config()).unwrap();
        assert!(world.render_stopped.load(Ordering::Acquire));
        let report = world.shutdown();
        assert_eq!(report.quiesce_ms, 0);
    }

    #[test]
    fn invalid_render_config_rejected() {
        let sink = Box::new(|_: &Tick, _: FrameInfo| {});
        let err = RealtimeWorld::with_renderer(
            WorldConfig::default(),
            RenderConfig {
                frame_rate_hz: f64::NAN,
            },
            sink,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidFrameRate { .. }));
    }

    #[test]
    fn reset_restarts_from_tick_zero() {
        let mut world = RealtimeWorld::new(fast_config()).unwrap();
        let id = world
            .place_entity(Entity::circle(5.0, Material::default(), Vec2d::new(10.0, 10.0)).unwrap())
            .unwrap();
        wait_for("entity published", || {
            world.peek_latest().is_some_and(|t| t.entity(id).is_some())
        });

        world.reset().unwrap();
        assert!(world.is_running());
        wait_for("tick after reset", || world.peek_latest().is_some());
        let tick = world.peek_latest().unwrap();
        assert!(tick.entity(id).is_none());
        assert!(tick.id() < TickId(1_000));
        world.shutdown();
    }

    #[test]
    fn drop_without_shutdown_joins() {
        let world = RealtimeWorld::new(fast_config()).unwrap();
        wait_for("first tick", || world.peek_latest().is_some());
        drop(world);
    }
}
