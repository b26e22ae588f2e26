//! Criterion benchmarks for whole simulation steps.

use std::hint::black_box;

use collinsa_bench::{populated_world, reference_profile};
use collinsa_core::{Force, Vec2d};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

/// Benchmark: one lockstep step (forces, integration, partition, broad
/// phase, close) under planet gravity.
fn bench_lockstep_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("lockstep_step");
    for count in [100usize, 1_000] {
        let mut world = populated_world(reference_profile(), count, 42);
        world.add_global_force(Force::global_planet_gravity(Vec2d::new(0.0, 9.81)));
        group.bench_function(BenchmarkId::from_parameter(count), |b| {
            b.iter(|| black_box(world.step()));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_lockstep_step);
criterion_main!(benches);
