//! Per-step performance and bookkeeping metrics.
//!
//! [`StepMetrics`] captures timing and counts for a single simulation
//! step. Timings are wall-clock microseconds.

use collinsa_core::TickId;

/// Timing and counts collected during a single step.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StepMetrics {
    /// The tick that was simulated and closed.
    pub tick: TickId,
    /// Simulated seconds advanced.
    pub dt: f64,
    /// Wall-clock time for the entire step.
    pub total_us: u64,
    /// Time spent applying queued world mutations.
    pub ingress_us: u64,
    /// Time spent applying forces.
    pub forces_us: u64,
    /// Time spent integrating entities.
    pub integrate_us: u64,
    /// Time spent re-partitioning.
    pub partition_us: u64,
    /// Time spent in the broad phase.
    pub broad_phase_us: u64,
    /// Time spent closing the tick and publishing it.
    pub close_us: u64,
    /// Entities in the closed tick.
    pub entity_count: usize,
    /// Broad-phase candidate pairs found.
    pub candidate_pairs: usize,
    /// Force applications that had an effect.
    pub forces_applied: usize,
    /// Forces dropped at close because an entity they name is gone.
    pub forces_dropped: usize,
    /// AABB corners outside the world, skipped during partitioning.
    pub skipped_corners: usize,
    /// Entities spawned by emitters.
    pub spawned: usize,
    /// Entities whose lifespan ran out.
    pub expired: usize,
    /// Queued insertions refused for a duplicate id.
    pub rejected_insertions: usize,
}
