//! The simulation loop of a [`RealtimeWorld`](crate::RealtimeWorld).
//!
//! The simulation thread owns the [`SimulationEngine`] exclusively (moved
//! in at spawn). Mutations arrive on an unbounded crossbeam channel and
//! are drained once per step; closed ticks leave through the engine's
//! [`TickRing`](crate::TickRing). Nothing on the hot path takes a lock
//! except the ring slot hand-off.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::Receiver;

use crate::engine::SimulationEngine;
use crate::ingress::Ingress;

/// State held by the simulation thread's main loop.
pub(crate) struct SimThreadState {
    engine: SimulationEngine,
    rx: Receiver<Ingress>,
    shutdown_flag: Arc<AtomicBool>,
    sim_stopped: Arc<AtomicBool>,
    budget: Duration,
}

impl SimThreadState {
    pub fn new(
        engine: SimulationEngine,
        rx: Receiver<Ingress>,
        shutdown_flag: Arc<AtomicBool>,
        sim_stopped: Arc<AtomicBool>,
    ) -> Self {
        let budget = Duration::from_secs_f64(1.0 / engine.config().tick_rate_hz);
        Self {
            engine,
            rx,
            shutdown_flag,
            sim_stopped,
            budget,
        }
    }

    /// Main loop. Runs until `shutdown_flag` is set.
    ///
    /// Consumes self and returns the engine so the owner can recover it
    /// for `reset()` through the `JoinHandle`.
    pub fn run(mut self) -> SimulationEngine {
        log::debug!("simulation loop started, budget {:?}", self.budget);
        let mut steps = 0u64;
        loop {
            if self.shutdown_flag.load(Ordering::Acquire) {
                break;
            }
            let step_start = Instant::now();

            // 1. Drain the ingress channel.
            let batch: Vec<Ingress> = self.rx.try_iter().collect();

            // 2. Step, close, publish.
            let dt = self.engine.next_dt();
            let metrics = self.engine.step(batch, dt);
            steps += 1;
            log::trace!(
                "tick {} stepped in {}us: {} entities, {} pairs",
                metrics.tick,
                metrics.total_us,
                metrics.entity_count,
                metrics.candidate_pairs
            );

            // 3. Park for the rest of the budget. park_timeout rather than
            //    sleep so shutdown() can wake the thread with unpark().
            if let Some(remaining) = self.budget.checked_sub(step_start.elapsed()) {
                thread::park_timeout(remaining);
            }
        }

        log::debug!("simulation loop stopped after {steps} steps");
        self.sim_stopped.store(true, Ordering::Release);
        self.engine
    }
}
