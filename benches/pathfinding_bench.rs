use std::collections::HashSet;

use bevy::prelude::Vec2;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256StarStar;

use tactical_core::grid::{GridPos, MapGrid, ZoneTag};
use tactical_core::particles::{BurstConfig, ParticlePool};
use tactical_core::pathfinding::{find_path, reachable_tiles};
use tactical_core::placement::{auto_place, PlacementDescriptor};
use tactical_core::zones::compute_threat_zones;

/// 32x32 grid with a sparse deterministic wall pattern that forces detours.
fn walled_grid() -> MapGrid {
    let mut walls = Vec::new();
    for y in 0..32i32 {
        for x in 0..32i32 {
            if x % 7 == 3 && y % 5 != 2 {
                walls.push((GridPos::new(x, y), ZoneTag::Wall));
            }
        }
    }
    MapGrid::new("bench", 32, 32, &walls, vec![])
}

fn bench_pathfinding(c: &mut Criterion) {
    let grid = walled_grid();
    let blocked = HashSet::new();

    c.bench_function("find_path_32x32_corner_to_corner", |b| {
        b.iter(|| {
            find_path(
                black_box(GridPos::new(0, 0)),
                black_box(GridPos::new(31, 31)),
                &grid,
                &blocked,
                false,
            )
        })
    });

    c.bench_function("find_path_32x32_unreachable", |b| {
        let sealed: Vec<(GridPos, ZoneTag)> = GridPos::new(20, 20)
            .neighbors8()
            .iter()
            .map(|&p| (p, ZoneTag::Wall))
            .collect();
        let sealed_grid = MapGrid::new("bench", 32, 32, &sealed, vec![]);
        b.iter(|| {
            find_path(
                black_box(GridPos::new(0, 0)),
                black_box(GridPos::new(20, 20)),
                &sealed_grid,
                &blocked,
                false,
            )
        })
    });

    c.bench_function("reachable_tiles_radius_4", |b| {
        b.iter(|| reachable_tiles(black_box(GridPos::new(16, 16)), &grid, &blocked, 4))
    });
}

fn bench_zones(c: &mut Criterion) {
    let grid = MapGrid::new("bench", 32, 32, &[], vec![]);
    let hostiles: Vec<GridPos> = (0..12)
        .map(|i| GridPos::new((i * 5) % 32, (i * 7) % 32))
        .collect();

    c.bench_function("compute_threat_zones_12_hostiles", |b| {
        b.iter(|| compute_threat_zones(black_box(&hostiles), &grid, false))
    });
}

fn bench_placement(c: &mut Criterion) {
    let grid = walled_grid();
    let descriptors: Vec<PlacementDescriptor> = (0..16)
        .map(|i| PlacementDescriptor {
            id: format!("npc_{i}"),
            hint: None,
        })
        .collect();

    c.bench_function("auto_place_16_entities", |b| {
        b.iter(|| {
            auto_place(
                black_box(&descriptors),
                GridPos::new(16, 16),
                &grid,
                &HashSet::new(),
            )
        })
    });
}

fn bench_particles(c: &mut Criterion) {
    c.bench_function("pool_burst_and_advance", |b| {
        let mut pool = ParticlePool::with_capacity(192);
        let mut rng = Xoshiro256StarStar::seed_from_u64(42);
        let cfg = BurstConfig::death(Vec2::ZERO);
        b.iter(|| {
            pool.emit_burst(black_box(&cfg), &mut rng);
            pool.advance(black_box(0.016));
        })
    });
}

criterion_group!(
    benches,
    bench_pathfinding,
    bench_zones,
    bench_placement,
    bench_particles
);
criterion_main!(benches);
