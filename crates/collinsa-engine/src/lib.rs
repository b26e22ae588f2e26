//! Tick snapshot protocol and simulation/render loops for Collinsa.
//!
//! A [`Tick`] holds one step's entities, forces and chunk partition. The
//! [`TickMachine`] owns the open tick and publishes each closed one into a
//! [`TickRing`] as an `Arc<Tick>`, so a renderer can read the previous
//! step while the next one is simulated.
//!
//! Two ways to drive it:
//!
//! * [`LockstepWorld`]: step on the caller's thread.
//! * [`RealtimeWorld`]: a simulation thread at `tick_rate_hz` plus an
//!   optional rendering thread at `frame_rate_hz` feeding a [`FrameSink`].

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod engine;
pub mod ingress;
pub mod lockstep;
pub mod machine;
pub mod metrics;
pub mod realtime;
pub mod render_loop;
pub mod ring;
pub(crate) mod sim_thread;
pub mod tick;

pub use config::{ConfigError, RenderConfig, TimeStep, WorldConfig};
pub use engine::SimulationEngine;
pub use ingress::{Ingress, IngressStats, SubmitError, WorldHandle};
pub use lockstep::LockstepWorld;
pub use machine::TickMachine;
pub use metrics::StepMetrics;
pub use realtime::{RealtimeWorld, ShutdownReport};
pub use render_loop::{FrameInfo, FrameSink};
pub use ring::TickRing;
pub use tick::{CloseStats, IntegrateStats, PlaceError, Tick, TickState};
