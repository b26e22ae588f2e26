//! Collinsa: a real-time 2D rigid-body simulation kernel.
//!
//! This is the top-level facade crate that re-exports the public API from
//! the Collinsa sub-crates. For most users, adding `collinsa` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use collinsa::prelude::*;
//!
//! // 1440×900 world, 10×10 chunks, fixed 1/60 s steps.
//! let mut world = LockstepWorld::new(WorldConfig::default()).unwrap();
//! let ball = Entity::circle(5.0, Material::default(), Vec2d::new(100.0, 100.0))
//!     .unwrap()
//!     .with_velocity(Vec2d::new(50.0, 0.0));
//! let id = world.place_entity(ball).unwrap();
//!
//! for _ in 0..60 {
//!     world.step();
//! }
//!
//! let tick = world.latest_closed_tick().unwrap();
//! let x = tick.entity(id).unwrap().position().x;
//! assert!((x - 150.0).abs() < 1e-6);
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `collinsa-core` | Vectors, ids, shapes, materials, entities, forces |
//! | [`space`] | `collinsa-space` | Chunk grid and broad-phase collider |
//! | [`engine`] | `collinsa-engine` | Ticks, lockstep and realtime worlds |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core value types (`collinsa-core`).
///
/// Shapes, materials, inertia, [`types::Entity`] and the
/// [`types::Force`] generators.
pub use collinsa_core as types;

/// Spatial partition and broad phase (`collinsa-space`).
///
/// [`space::GridGeometry`] describes the world and its chunking;
/// [`space::ChunkGrid`] records memberships; [`space::Collider`] turns them
/// into candidate pairs.
pub use collinsa_space as space;

/// Tick protocol and simulation loops (`collinsa-engine`).
///
/// [`engine::LockstepWorld`] for stepping on the caller's thread,
/// [`engine::RealtimeWorld`] for background simulation and rendering.
pub use collinsa_engine as engine;

/// Common imports for typical Collinsa usage.
///
/// ```rust
/// use collinsa::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use collinsa_core::{
        Aabb, CollisionType, Color, EmitterTemplate, Entity, EntityId, Force, ForceId, ForceKind,
        Material, Shape, ShapeKind, TickId, Vec2Ext, Vec2d, Vec2f,
    };

    // Errors
    pub use collinsa_core::ShapeError;
    pub use collinsa_engine::{ConfigError, PlaceError, SubmitError};
    pub use collinsa_space::SpaceError;

    // Space
    pub use collinsa_space::{ChunkGrid, GridGeometry};

    // Engine
    pub use collinsa_engine::{
        FrameInfo, FrameSink, LockstepWorld, RealtimeWorld, RenderConfig, StepMetrics, Tick,
        TickState, TimeStep, WorldConfig, WorldHandle,
    };
}
