//! Seeded scenes.
//!
//! - [`scatter_scene`]: random disks and boxes inside a world, reproducible
//!   from a seed (ChaCha8).
//! - [`emitter`]: an entity that sprays short-lived disks.

use collinsa_core::{
    CollisionType, EmitterTemplate, Entity, Material, Shape, Vec2d, Vec2Ext,
};
use collinsa_space::GridGeometry;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

/// Parameters of a [`scatter_scene`].
#[derive(Clone, Debug, PartialEq)]
pub struct ScatterParams {
    pub seed: u64,
    pub count: usize,
    /// Smallest disk radius / half box side.
    pub min_size: f64,
    /// Largest disk radius / half box side.
    pub max_size: f64,
    /// Upper bound on initial speed.
    pub max_speed: f64,
    /// Fraction of entities that are boxes rather than disks.
    pub box_fraction: f64,
}

impl Default for ScatterParams {
    fn default() -> Self {
        Self {
            seed: 42,
            count: 200,
            min_size: 2.0,
            max_size: 12.0,
            max_speed: 80.0,
            box_fraction: 0.25,
        }
    }
}

/// `params.count` entities fully inside `geometry`'s world, with random
/// size, material preset, heading and speed. The same seed always yields
/// the same scene (ids aside).
pub fn scatter_scene(geometry: &GridGeometry, params: &ScatterParams) -> Vec<Entity> {
    let mut rng = ChaCha8Rng::seed_from_u64(params.seed);
    let margin = params.max_size * 1.5;
    let (w, h) = (geometry.width(), geometry.height());
    assert!(
        w > 2.0 * margin && h > 2.0 * margin,
        "world {w}x{h} too small for entities of size {}",
        params.max_size
    );

    (0..params.count)
        .map(|_| {
            let position = Vec2d::new(
                rng.random_range(margin..w - margin),
                rng.random_range(margin..h - margin),
            );
            let size = rng.random_range(params.min_size..=params.max_size);
            let preset = Material::PRESETS[rng.random_range(0..Material::PRESETS.len())];
            let material = Material::preset(preset).unwrap_or_default();
            let heading = rng.random_range(0.0..std::f64::consts::TAU);
            let speed = rng.random_range(0.0..=params.max_speed);

            let entity = if rng.random_bool(params.box_fraction) {
                Entity::rect(2.0 * size, 2.0 * size, material, position)
            } else {
                Entity::circle(size, material, position)
            };
            entity
                .unwrap_or_else(|e| panic!("scatter produced invalid size {size}: {e}"))
                .with_velocity(Vec2d::X.rotated(heading) * speed)
                .with_rotation(heading)
        })
        .collect()
}

/// An emitter at `(x, y)` facing +x that spawns `rate` radius-2 disks per
/// second at `speed`, each living `lifespan` seconds.
pub fn emitter(x: f64, y: f64, rate: f64, speed: f64, lifespan: f64) -> Entity {
    let template = EmitterTemplate {
        shape: Box::new(Shape::circle(2.0).unwrap_or_else(|e| panic!("{e}"))),
        material: Material::rubber(),
        collision: CollisionType::Classic,
        lifespan: Some(lifespan),
    };
    let shape = Shape::emitter(5.0, template, rate, speed)
        .unwrap_or_else(|e| panic!("invalid test emitter: {e}"));
    Entity::new(shape, Material::metal(), Vec2d::new(x, y)).with_collision(CollisionType::Kinematic)
}
