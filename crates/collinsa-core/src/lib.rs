//! Core types for the Collinsa 2D rigid-body simulation kernel.
//!
//! This is the leaf crate of the workspace. It defines the value types
//! every other crate shares: vectors, identifiers, bounding boxes,
//! materials, inertia, the tagged [`Shape`] enum, the [`Entity`] record,
//! and the [`Force`] generators that act on entities.
//!
//! Nothing here knows about ticks, threads, or the spatial partition.
//! Cross-entity references are always [`EntityId`]s resolved through a
//! [`BodyLookup`], never pointers.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod aabb;
pub mod entity;
pub mod error;
pub mod force;
pub mod id;
pub mod inertia;
pub mod material;
pub mod math;
pub mod shape;

pub use aabb::Aabb;
pub use entity::{CollisionType, Entity};
pub use error::ShapeError;
pub use force::{BodyLookup, Force, ForceKind, GRAVITATIONAL_CONSTANT, MIN_DISTANCE};
pub use id::{EntityId, ForceId, TickId};
pub use inertia::Inertia;
pub use material::{Color, Material};
pub use math::{Vec2Ext, Vec2d, Vec2f};
pub use shape::{
    Circle, Emitter, EmitterTemplate, Polygon, Rect, Shape, ShapeKind, MAX_EMISSIONS_PER_STEP,
};
