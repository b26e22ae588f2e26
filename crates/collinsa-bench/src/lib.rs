//! Benchmark profiles for the Collinsa 2D physics kernel.
//!
//! - [`reference_profile`]: the default 1440×900 world with 10×10 chunks
//! - [`dense_profile`]: same world, 40×25 chunks for crowded scenes
//! - [`populated_world`]: a lockstep world filled with a seeded scatter

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use collinsa_engine::{LockstepWorld, WorldConfig};
use collinsa_space::GridGeometry;
use collinsa_test_utils::{scatter_scene, ScatterParams};

/// 1440×900 world, 10×10 chunks, fixed 1/60 s steps.
pub fn reference_profile() -> WorldConfig {
    WorldConfig::default()
}

/// 1440×900 world split into 40×25 chunks (36 m square cells).
pub fn dense_profile() -> WorldConfig {
    WorldConfig {
        geometry: GridGeometry::new(1440.0, 900.0, 40, 25)
            .unwrap_or_else(|e| panic!("dense profile geometry: {e}")),
        ..WorldConfig::default()
    }
}

/// A lockstep world built from `config` holding `count` scattered
/// entities generated from `seed`.
pub fn populated_world(config: WorldConfig, count: usize, seed: u64) -> LockstepWorld {
    let mut world =
        LockstepWorld::new(config).unwrap_or_else(|e| panic!("benchmark config rejected: {e}"));
    let params = ScatterParams {
        seed,
        count,
        ..ScatterParams::default()
    };
    for entity in scatter_scene(world.geometry(), &params) {
        world
            .place_entity(entity)
            .unwrap_or_else(|e| panic!("scatter placement failed: {e}"));
    }
    world
}
