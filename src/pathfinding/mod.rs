//! Breadth-first pathfinding over the tile grid.
//!
//! 8-directional adjacency (diagonals allowed) over traversable, unblocked
//! tiles. The frontier is a plain `VecDeque` and neighbors are expanded in
//! the fixed `neighbors8` order, so ties break by insertion order and
//! results are reproducible.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::grid::{GridPos, MapGrid};

/// Find a route from `start` to `goal`.
///
/// Returns the full tile sequence including `start`, or `None` when no
/// route exists. `blocked` normally excludes occupied tiles; when
/// `allow_occupied_goal` is set the goal tile itself is exempt from the
/// blocked check (walking up to an NPC).
pub fn find_path(
    start: GridPos,
    goal: GridPos,
    grid: &MapGrid,
    blocked: &HashSet<GridPos>,
    allow_occupied_goal: bool,
) -> Option<Vec<GridPos>> {
    if !grid.in_bounds(start) || !grid.in_bounds(goal) {
        return None;
    }
    if start == goal {
        return Some(vec![start]);
    }
    if !grid.is_traversable(goal) {
        return None;
    }
    if blocked.contains(&goal) && !allow_occupied_goal {
        return None;
    }

    let mut frontier = VecDeque::new();
    let mut came_from: HashMap<GridPos, GridPos> = HashMap::new();
    frontier.push_back(start);
    came_from.insert(start, start);

    while let Some(current) = frontier.pop_front() {
        if current == goal {
            return Some(reconstruct(&came_from, start, goal));
        }
        for next in current.neighbors8() {
            if came_from.contains_key(&next) || !grid.is_traversable(next) {
                continue;
            }
            if blocked.contains(&next) && next != goal {
                continue;
            }
            came_from.insert(next, current);
            frontier.push_back(next);
        }
    }
    None
}

fn reconstruct(came_from: &HashMap<GridPos, GridPos>, start: GridPos, goal: GridPos) -> Vec<GridPos> {
    let mut path = vec![goal];
    let mut current = goal;
    while current != start {
        current = came_from[&current];
        path.push(current);
    }
    path.reverse();
    path
}

/// All tiles reachable from `start` within `max_steps` moves, excluding
/// `start` itself. Used for the combat movement-range overlay.
pub fn reachable_tiles(
    start: GridPos,
    grid: &MapGrid,
    blocked: &HashSet<GridPos>,
    max_steps: u32,
) -> HashSet<GridPos> {
    let mut reached = HashSet::new();
    let mut depth: HashMap<GridPos, u32> = HashMap::new();
    let mut frontier = VecDeque::new();
    depth.insert(start, 0);
    frontier.push_back(start);

    while let Some(current) = frontier.pop_front() {
        let d = depth[&current];
        if d == max_steps {
            continue;
        }
        for next in current.neighbors8() {
            if depth.contains_key(&next)
                || !grid.is_traversable(next)
                || blocked.contains(&next)
            {
                continue;
            }
            depth.insert(next, d + 1);
            reached.insert(next);
            frontier.push_back(next);
        }
    }
    reached
}
