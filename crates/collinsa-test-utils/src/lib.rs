//! Test fixtures for Collinsa development.
//!
//! Small entity builders for hand-written scenarios and seeded scatter
//! scenes (see [`fixtures`]) for property tests and benchmarks.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use collinsa_core::{Entity, Material, Vec2d};

/// A radius-`r` disk of default material at `(x, y)`.
pub fn ball(x: f64, y: f64, r: f64) -> Entity {
    Entity::circle(r, Material::default(), Vec2d::new(x, y))
        .unwrap_or_else(|e| panic!("invalid test ball radius {r}: {e}"))
}

/// A `w`×`h` box of default material centred on `(x, y)`.
pub fn crate_box(x: f64, y: f64, w: f64, h: f64) -> Entity {
    Entity::rect(w, h, Material::default(), Vec2d::new(x, y))
        .unwrap_or_else(|e| panic!("invalid test box {w}x{h}: {e}"))
}

/// A disk with an explicit mass, for gravity scenarios.
pub fn massive_ball(x: f64, y: f64, r: f64, mass: f64) -> Entity {
    ball(x, y, r).with_mass(mass)
}

pub use fixtures::{emitter, scatter_scene, ScatterParams};
