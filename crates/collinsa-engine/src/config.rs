//! World configuration, validation, and error types.
//!
//! [`WorldConfig`] is the input for constructing a simulation world.
//! [`validate()`](WorldConfig::validate) checks every invariant at
//! construction time; invalid worlds never start.

use std::error::Error;
use std::fmt;

use collinsa_space::{GridGeometry, SpaceError};

// ── TimeStep ───────────────────────────────────────────────────────

/// How much simulated time one step advances.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TimeStep {
    /// Always advance by this many seconds. Deterministic.
    Fixed(f64),
    /// Advance by the wall-clock time since the previous step, capped at
    /// `max_dt` so a stalled step cannot produce a huge jump.
    WallClock {
        /// Upper bound on a single step, in seconds.
        max_dt: f64,
    },
}

impl TimeStep {
    fn bound(&self) -> f64 {
        match *self {
            Self::Fixed(dt) => dt,
            Self::WallClock { max_dt } => max_dt,
        }
    }
}

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected while building or restarting a world.
#[derive(Debug, PartialEq)]
pub enum ConfigError {
    /// World extent or chunk counts are invalid.
    Space(SpaceError),
    /// tick_rate_hz is NaN, infinite, zero, or negative.
    InvalidTickRate {
        /// The invalid value.
        value: f64,
    },
    /// frame_rate_hz is NaN, infinite, zero, or negative.
    InvalidFrameRate {
        /// The invalid value.
        value: f64,
    },
    /// The fixed step or wall-clock cap is NaN, infinite, zero, or negative.
    InvalidTimeStep {
        /// The invalid value.
        value: f64,
    },
    /// Ring buffer size is below the minimum of 2.
    RingBufferTooSmall {
        /// The configured size that was too small.
        configured: usize,
    },
    /// Engine could not be recovered from the simulation thread (e.g. the
    /// thread panicked).
    EngineRecoveryFailed,
    /// A background thread could not be spawned.
    ThreadSpawnFailed {
        /// Description of which thread failed.
        reason: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Space(e) => write!(f, "space: {e}"),
            Self::InvalidTickRate { value } => {
                write!(f, "tick_rate_hz must be finite and positive, got {value}")
            }
            Self::InvalidFrameRate { value } => {
                write!(f, "frame_rate_hz must be finite and positive, got {value}")
            }
            Self::InvalidTimeStep { value } => {
                write!(f, "time step must be finite and positive, got {value}")
            }
            Self::RingBufferTooSmall { configured } => {
                write!(f, "ring_buffer_size {configured} is below minimum of 2")
            }
            Self::EngineRecoveryFailed => {
                write!(f, "engine could not be recovered from simulation thread")
            }
            Self::ThreadSpawnFailed { reason } => {
                write!(f, "thread spawn failed: {reason}")
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Space(e) => Some(e),
            _ => None,
        }
    }
}

impl From<SpaceError> for ConfigError {
    fn from(e: SpaceError) -> Self {
        Self::Space(e)
    }
}

fn rate_is_valid(hz: f64) -> bool {
    // Also rejects subnormals where 1/hz overflows, which would panic in
    // Duration::from_secs_f64.
    hz.is_finite() && hz > 0.0 && (1.0 / hz).is_finite()
}

// ── WorldConfig ────────────────────────────────────────────────────

/// Complete configuration for constructing a simulation world.
#[derive(Clone, Debug, PartialEq)]
pub struct WorldConfig {
    /// World extent and chunk layout.
    pub geometry: GridGeometry,
    /// Target simulation steps per second for the realtime loop.
    /// Default: 60.
    pub tick_rate_hz: f64,
    /// Simulated time advanced per step. Default: fixed 1/60 s.
    pub time_step: TimeStep,
    /// Number of closed ticks retained for readers. Default: 8. Minimum: 2.
    pub ring_buffer_size: usize,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            geometry: GridGeometry::default(),
            tick_rate_hz: 60.0,
            time_step: TimeStep::Fixed(1.0 / 60.0),
            ring_buffer_size: 8,
        }
    }
}

impl WorldConfig {
    /// Default configuration for a world of the given size and chunking.
    pub fn with_world(
        width: f64,
        height: f64,
        chunks_x: u32,
        chunks_y: u32,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            geometry: GridGeometry::new(width, height, chunks_x, chunks_y)?,
            ..Self::default()
        })
    }

    /// Validate all invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        // 1. Geometry fields are private and validated on construction;
        //    re-check in case the caller built it from a stale copy.
        let g = &self.geometry;
        GridGeometry::new(g.width(), g.height(), g.chunks_x(), g.chunks_y())?;
        // 2. Tick rate.
        if !rate_is_valid(self.tick_rate_hz) {
            return Err(ConfigError::InvalidTickRate {
                value: self.tick_rate_hz,
            });
        }
        // 3. Time step.
        let dt = self.time_step.bound();
        if !dt.is_finite() || dt <= 0.0 {
            return Err(ConfigError::InvalidTimeStep { value: dt });
        }
        // 4. Ring buffer >= 2.
        if self.ring_buffer_size < 2 {
            return Err(ConfigError::RingBufferTooSmall {
                configured: self.ring_buffer_size,
            });
        }
        Ok(())
    }
}

// ── RenderConfig ───────────────────────────────────────────────────

/// Configuration of the rendering loop.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderConfig {
    /// Target frames per second. Default: 60.
    pub frame_rate_hz: f64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            frame_rate_hz: 60.0,
        }
    }
}

impl RenderConfig {
    /// Validate the frame rate.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !rate_is_valid(self.frame_rate_hz) {
            return Err(ConfigError::InvalidFrameRate {
                value: self.frame_rate_hz,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        let c = WorldConfig::default();
        assert!(c.validate().is_ok());
        assert_eq!(c.geometry.width(), 1440.0);
        assert_eq!(c.geometry.chunks_y(), 10);
        assert!(RenderConfig::default().validate().is_ok());
    }

    #[test]
    fn invalid_world_fails_fast() {
        let err = WorldConfig::with_world(-1.0, 900.0, 10, 10).unwrap_err();
        assert!(matches!(err, ConfigError::Space(SpaceError::InvalidExtent { .. })));
        assert!(err.source().is_some());
        assert_eq!(
            WorldConfig::with_world(1440.0, 900.0, 10, 0).unwrap_err(),
            ConfigError::Space(SpaceError::EmptyGrid)
        );
    }

    #[test]
    fn rejects_bad_rates_and_steps() {
        for hz in [0.0, -1.0, f64::NAN, f64::INFINITY, f64::MIN_POSITIVE / 4.0] {
            let c = WorldConfig {
                tick_rate_hz: hz,
                ..WorldConfig::default()
            };
            assert!(matches!(c.validate(), Err(ConfigError::InvalidTickRate { .. })), "{hz}");
        }
        let c = WorldConfig {
            time_step: TimeStep::Fixed(0.0),
            ..WorldConfig::default()
        };
        assert_eq!(c.validate(), Err(ConfigError::InvalidTimeStep { value: 0.0 }));
        let c = WorldConfig {
            time_step: TimeStep::WallClock { max_dt: f64::NAN },
            ..WorldConfig::default()
        };
        assert!(matches!(c.validate(), Err(ConfigError::InvalidTimeStep { .. })));
        let r = RenderConfig { frame_rate_hz: 0.0 };
        assert_eq!(r.validate(), Err(ConfigError::InvalidFrameRate { value: 0.0 }));
    }

    #[test]
    fn rejects_small_ring() {
        let c = WorldConfig {
            ring_buffer_size: 1,
            ..WorldConfig::default()
        };
        assert_eq!(
            c.validate(),
            Err(ConfigError::RingBufferTooSmall { configured: 1 })
        );
    }
}
