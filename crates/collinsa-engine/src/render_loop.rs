//! The rendering loop of a [`RealtimeWorld`](crate::RealtimeWorld).
//!
//! Runs at its own frame rate, independent of the simulation rate. Each
//! frame it takes the latest closed tick from the ring and hands a
//! `&Tick` to a [`FrameSink`]. It never waits on the simulation: if no
//! new tick has been published since the last frame, the same tick is
//! drawn again and the frame is flagged stale.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use collinsa_core::TickId;

use crate::ring::TickRing;
use crate::tick::Tick;

/// Per-frame bookkeeping passed to a [`FrameSink`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameInfo {
    /// Frames drawn before this one.
    pub frame: u64,
    /// The tick being drawn.
    pub tick_id: TickId,
    /// True when the tick was already drawn by the previous frame.
    pub stale: bool,
}

/// Consumer of closed ticks on the rendering thread.
///
/// Implementations must not hold on to the `&Tick`; clone what they need.
pub trait FrameSink: Send {
    /// Draw one frame.
    fn draw(&mut self, tick: &Tick, frame: FrameInfo);
}

impl<F> FrameSink for F
where
    F: FnMut(&Tick, FrameInfo) + Send,
{
    fn draw(&mut self, tick: &Tick, frame: FrameInfo) {
        self(tick, frame)
    }
}

/// State held by the rendering thread's main loop.
pub(crate) struct RenderThreadState {
    sink: Box<dyn FrameSink>,
    ring: Arc<TickRing>,
    shutdown_flag: Arc<AtomicBool>,
    render_stopped: Arc<AtomicBool>,
    budget: Duration,
}

impl RenderThreadState {
    pub fn new(
        sink: Box<dyn FrameSink>,
        ring: Arc<TickRing>,
        shutdown_flag: Arc<AtomicBool>,
        render_stopped: Arc<AtomicBool>,
        frame_rate_hz: f64,
    ) -> Self {
        Self {
            sink,
            ring,
            shutdown_flag,
            render_stopped,
            budget: Duration::from_secs_f64(1.0 / frame_rate_hz),
        }
    }

    /// Main loop. Runs until `shutdown_flag` is set, raises
    /// `render_stopped` and returns the sink.
    pub fn run(mut self) -> Box<dyn FrameSink> {
        log::debug!("render loop started, budget {:?}", self.budget);
        let mut frame = 0u64;
        let mut last_drawn: Option<TickId> = None;
        let mut stale_frames = 0u64;
        loop {
            if self.shutdown_flag.load(Ordering::Acquire) {
                break;
            }
            let frame_start = Instant::now();

            // Nothing published yet: skip the frame.
            if let Some(tick) = self.ring.deliver_latest() {
                let stale = last_drawn == Some(tick.id());
                if stale {
                    stale_frames += 1;
                }
                self.sink.draw(
                    &tick,
                    FrameInfo {
                        frame,
                        tick_id: tick.id(),
                        stale,
                    },
                );
                last_drawn = Some(tick.id());
                frame += 1;
            }

            if let Some(remaining) = self.budget.checked_sub(frame_start.elapsed()) {
                thread::park_timeout(remaining);
            }
        }
        self.render_stopped.store(true, Ordering::Release);
        log::debug!("render loop stopped after {frame} frames ({stale_frames} stale)");
        self.sink
    }
}
