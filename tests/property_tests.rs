//! Property-based tests using proptest.
//!
//! Invariants that must hold for all inputs:
//! - Pathfinding: routes are adjacent, in-bounds, and never cross blockers
//! - Reachability: bounded by Chebyshev radius
//! - Threat zones: ring-1 of hostiles, suppressed in combat
//! - Particle pool: bounded occupancy under arbitrary load
//! - Viewport: zoom stays in range, content never fully pans off screen
//! - Placement: no overlaps, only spawn-legal tiles

use std::collections::HashSet;

use bevy::prelude::Vec2;
use proptest::prelude::*;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256StarStar;

use tactical_core::grid::{GridPos, MapGrid, ZoneTag};
use tactical_core::particles::{BurstConfig, ParticlePool};
use tactical_core::pathfinding::{find_path, reachable_tiles};
use tactical_core::placement::{auto_place, PlacementDescriptor};
use tactical_core::viewport::Viewport;
use tactical_core::zones::compute_threat_zones;

const W: i32 = 9;
const H: i32 = 9;

fn pos_strategy() -> impl Strategy<Value = GridPos> {
    (0..W, 0..H).prop_map(|(x, y)| GridPos::new(x, y))
}

fn open_grid() -> MapGrid {
    MapGrid::new("prop", W as u32, H as u32, &[], vec![])
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_path_to_self_is_singleton(p in pos_strategy()) {
        let grid = open_grid();
        prop_assert_eq!(
            find_path(p, p, &grid, &HashSet::new(), false),
            Some(vec![p])
        );
    }

    #[test]
    fn prop_paths_are_adjacent_and_legal(
        start in pos_strategy(),
        goal in pos_strategy(),
        blockers in prop::collection::hash_set(pos_strategy(), 0..20),
    ) {
        let grid = open_grid();
        let mut blocked = blockers.clone();
        blocked.remove(&start);
        if let Some(path) = find_path(start, goal, &grid, &blocked, false) {
            prop_assert_eq!(path[0], start);
            prop_assert_eq!(*path.last().unwrap(), goal);
            for pair in path.windows(2) {
                prop_assert_eq!(pair[0].chebyshev(pair[1]), 1);
            }
            for pos in &path[1..] {
                prop_assert!(grid.in_bounds(*pos));
                prop_assert!(grid.is_traversable(*pos));
                prop_assert!(!blocked.contains(pos));
            }
        }
    }

    #[test]
    fn prop_occupied_goal_exemption_only_touches_goal(
        start in pos_strategy(),
        goal in pos_strategy(),
        blockers in prop::collection::hash_set(pos_strategy(), 1..20),
    ) {
        let grid = open_grid();
        let mut blocked = blockers.clone();
        blocked.remove(&start);
        blocked.insert(goal);
        prop_assume!(start != goal);
        if let Some(path) = find_path(start, goal, &grid, &blocked, true) {
            // Intermediate tiles obey the blocked set even when the goal
            // itself is exempt.
            for pos in &path[1..path.len() - 1] {
                prop_assert!(!blocked.contains(pos));
            }
            prop_assert_eq!(*path.last().unwrap(), goal);
        }
    }

    #[test]
    fn prop_path_is_deterministic(
        start in pos_strategy(),
        goal in pos_strategy(),
        blockers in prop::collection::hash_set(pos_strategy(), 0..15),
    ) {
        let grid = open_grid();
        let a = find_path(start, goal, &grid, &blockers, false);
        let b = find_path(start, goal, &grid, &blockers, false);
        prop_assert_eq!(a, b);
    }

    #[test]
    fn prop_reachable_bounded_by_radius(
        start in pos_strategy(),
        max_steps in 0u32..6,
    ) {
        let grid = open_grid();
        let reached = reachable_tiles(start, &grid, &HashSet::new(), max_steps);
        prop_assert!(!reached.contains(&start));
        for pos in &reached {
            prop_assert!(start.chebyshev(*pos) <= max_steps as i32);
            prop_assert!(grid.in_bounds(*pos));
        }
    }

    #[test]
    fn prop_threat_ring_excludes_hostiles(
        hostiles in prop::collection::vec(pos_strategy(), 1..8),
    ) {
        let grid = open_grid();
        let zones = compute_threat_zones(&hostiles, &grid, false);
        for hostile in &hostiles {
            prop_assert!(!zones.contains(hostile));
        }
        for zone in &zones {
            prop_assert!(grid.in_bounds(*zone));
            let adjacent = hostiles.iter().any(|h| h.chebyshev(*zone) == 1);
            prop_assert!(adjacent, "threat tile {zone:?} not adjacent to any hostile");
        }
    }

    #[test]
    fn prop_combat_always_suppresses_threat(
        hostiles in prop::collection::vec(pos_strategy(), 0..8),
    ) {
        let grid = open_grid();
        prop_assert!(compute_threat_zones(&hostiles, &grid, true).is_empty());
    }

    #[test]
    fn prop_pool_occupancy_is_bounded(
        capacity in 1usize..64,
        bursts in 1usize..8,
        count in 1usize..48,
        seed in any::<u64>(),
    ) {
        let mut pool = ParticlePool::with_capacity(capacity);
        let mut rng = Xoshiro256StarStar::seed_from_u64(seed);
        let cfg = BurstConfig {
            count,
            ..BurstConfig::impact(Vec2::ZERO)
        };
        for _ in 0..bursts {
            pool.emit_burst(&cfg, &mut rng);
            prop_assert!(pool.active_count() <= capacity);
        }
        // Draining and refilling never grows the pool either.
        pool.advance(10.0);
        prop_assert_eq!(pool.active_count(), 0);
        pool.emit_burst(&cfg, &mut rng);
        prop_assert!(pool.active_count() <= capacity);
    }

    #[test]
    fn prop_viewport_zoom_stays_in_range(
        scale in -10.0f32..10.0,
        focal_x in 0.0f32..800.0,
        focal_y in 0.0f32..600.0,
    ) {
        let mut viewport = Viewport::new(
            Vec2::new(576.0, 576.0),
            Vec2::new(800.0, 600.0),
            0.5,
            1.0,
            2.5,
            0.25,
            0.1,
        );
        viewport.set_zoom(scale, Some(Vec2::new(focal_x, focal_y)));
        prop_assert!(viewport.zoom >= viewport.min_zoom());
        prop_assert!(viewport.zoom <= viewport.max_zoom());
    }

    #[test]
    fn prop_viewport_keeps_content_visible(
        pans in prop::collection::vec((-2000.0f32..2000.0, -2000.0f32..2000.0), 1..10),
        scale in 0.5f32..2.5,
    ) {
        let mut viewport = Viewport::new(
            Vec2::new(576.0, 576.0),
            Vec2::new(800.0, 600.0),
            0.5,
            1.0,
            2.5,
            0.25,
            0.1,
        );
        viewport.set_zoom(scale, None);
        for (dx, dy) in pans {
            viewport.pan_by(dx, dy);
            let visible = viewport.visible_fraction();
            prop_assert!(visible.x >= 0.1 - 1e-3);
            prop_assert!(visible.y >= 0.1 - 1e-3);
        }
    }

    #[test]
    fn prop_placement_unique_and_legal(
        anchor in pos_strategy(),
        roster_len in 1usize..10,
        walls in prop::collection::hash_set(pos_strategy(), 0..10),
    ) {
        let tags: Vec<(GridPos, ZoneTag)> =
            walls.iter().map(|&p| (p, ZoneTag::Wall)).collect();
        let grid = MapGrid::new("prop", W as u32, H as u32, &tags, vec![]);
        let descriptors: Vec<PlacementDescriptor> = (0..roster_len)
            .map(|i| PlacementDescriptor {
                id: format!("npc_{i}"),
                hint: None,
            })
            .collect();
        let placed = auto_place(&descriptors, anchor, &grid, &HashSet::new());
        let positions: HashSet<GridPos> = placed.iter().map(|p| p.position).collect();
        prop_assert_eq!(positions.len(), placed.len());
        for p in &placed {
            prop_assert!(grid.in_bounds(p.position));
            prop_assert!(grid.is_traversable(p.position));
        }
    }
}
