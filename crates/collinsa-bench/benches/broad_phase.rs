//! Criterion micro-benchmarks for partitioning and the broad phase.

use std::hint::black_box;

use collinsa_bench::{dense_profile, populated_world, reference_profile};
use collinsa_core::{Aabb, EntityId};
use collinsa_space::{ChunkGrid, Collider};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

/// Benchmark: rebuild the chunk grid for scatter scenes of growing size.
fn bench_rebuild(c: &mut Criterion) {
    let mut group = c.benchmark_group("rebuild");
    for count in [100usize, 1_000, 5_000] {
        let world = populated_world(reference_profile(), count, 42);
        let aabbs: Vec<(EntityId, Aabb)> = world
            .current()
            .entities()
            .iter()
            .map(|(id, e)| (*id, e.aabb()))
            .collect();
        let mut grid = ChunkGrid::new(*world.geometry());
        group.bench_with_input(BenchmarkId::from_parameter(count), &aabbs, |b, aabbs| {
            b.iter(|| black_box(grid.rebuild(aabbs.iter().copied())));
        });
    }
    group.finish();
}

/// Benchmark: candidate pairs on a coarse and a fine chunking of the
/// same 1000-entity scene.
fn bench_candidate_pairs(c: &mut Criterion) {
    let mut group = c.benchmark_group("candidate_pairs_1k");
    for (name, config) in [("10x10", reference_profile()), ("40x25", dense_profile())] {
        let world = populated_world(config, 1_000, 7);
        let tick = world.current();
        let mut collider = Collider::new();
        group.bench_function(name, |b| {
            b.iter(|| black_box(collider.candidate_pairs(tick.grid(), tick.entities())));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_rebuild, bench_candidate_pairs);
criterion_main!(benches);
