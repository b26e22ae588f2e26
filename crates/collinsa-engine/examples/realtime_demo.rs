//! Realtime demo: a simulation thread and a text "renderer".
//!
//! Starts a [`RealtimeWorld`] with a sink that prints one summary line per
//! 30 frames, drops a few balls under planet gravity, sprays an emitter,
//! then shuts down and prints the shutdown report.
//!
//! Run with:
//!   RUST_LOG=debug cargo run -p collinsa-engine --example realtime_demo

use std::thread;
use std::time::Duration;

use collinsa_core::{CollisionType, EmitterTemplate, Entity, Force, Material, Shape, Vec2d};
use collinsa_engine::{FrameInfo, RealtimeWorld, RenderConfig, Tick, WorldConfig};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let sink = Box::new(|tick: &Tick, frame: FrameInfo| {
        if frame.frame % 30 == 0 {
            let outline_points: usize = tick.entities().values().map(|e| e.outline().len()).sum();
            println!(
                "frame {:>4} tick {:>4}{} t={:.2}s entities={:>3} pairs={:>3} outline_pts={}",
                frame.frame,
                frame.tick_id,
                if frame.stale { " (stale)" } else { "" },
                tick.sim_time(),
                tick.entity_count(),
                tick.candidates().len(),
                outline_points,
            );
        }
    });

    let mut world = RealtimeWorld::with_renderer(
        WorldConfig::default(),
        RenderConfig {
            frame_rate_hz: 90.0,
        },
        sink,
    )?;

    for i in 0..8 {
        let x = 200.0 + 120.0 * f64::from(i);
        world.place_entity(Entity::circle(15.0, Material::rubber(), Vec2d::new(x, 100.0))?)?;
    }
    world.place_entity(
        Entity::rect(1400.0, 20.0, Material::rock(), Vec2d::new(720.0, 880.0))?
            .with_collision(CollisionType::Kinematic),
    )?;

    let template = EmitterTemplate {
        shape: Box::new(Shape::regular_polygon(4.0, 5)?),
        material: Material::wood(),
        collision: CollisionType::Classic,
        lifespan: Some(2.0),
    };
    world.place_entity(
        Entity::new(
            Shape::emitter(8.0, template, 5.0, 150.0)?,
            Material::metal(),
            Vec2d::new(100.0, 450.0),
        )
        .with_collision(CollisionType::Kinematic),
    )?;
    world.add_global_force(Force::global_planet_gravity(Vec2d::new(0.0, 98.1)))?;

    thread::sleep(Duration::from_secs(3));

    let report = world.shutdown();
    println!("{report:?}");
    Ok(())
}
