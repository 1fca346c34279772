//! Deterministic auto-placement of non-player entities.
//!
//! Greedy layout: explicit hints first, then unoccupied spawn-legal tiles
//! at increasing Chebyshev radius from the anchor, each ring scanned in a
//! fixed order. A per-room cache pins placements so repeated layout calls
//! with the same roster never reshuffle already-placed entities.

use std::collections::{HashMap, HashSet};

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::grid::{GridPos, MapGrid, ZoneTag};

pub struct PlacementPlugin;

impl Plugin for PlacementPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PlacementCache>();
    }
}

/// What the layout pass needs to know about one entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacementDescriptor {
    pub id: String,
    /// Layout hint from room data; used verbatim when legal.
    pub hint: Option<GridPos>,
}

/// A resolved placement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacedEntity {
    pub id: String,
    pub position: GridPos,
}

/// Per-room placement memory keyed by the sorted roster, so layout is
/// idempotent until the candidate set changes.
#[derive(Resource, Debug, Default)]
pub struct PlacementCache {
    rooms: HashMap<String, CachedLayout>,
}

#[derive(Debug)]
struct CachedLayout {
    roster: Vec<String>,
    placements: Vec<PlacedEntity>,
}

impl PlacementCache {
    pub fn lookup(&self, room_id: &str, roster: &[String]) -> Option<&[PlacedEntity]> {
        let cached = self.rooms.get(room_id)?;
        (cached.roster == roster).then_some(cached.placements.as_slice())
    }

    pub fn store(&mut self, room_id: &str, roster: Vec<String>, placements: Vec<PlacedEntity>) {
        self.rooms
            .insert(room_id.to_string(), CachedLayout { roster, placements });
    }

    pub fn clear_room(&mut self, room_id: &str) {
        self.rooms.remove(room_id);
    }
}

fn spawn_legal(grid: &MapGrid, pos: GridPos, taken: &HashSet<GridPos>) -> bool {
    grid.in_bounds(pos)
        && grid.is_traversable(pos)
        && grid.tile(pos).is_some_and(|t| t.zone_tag != Some(ZoneTag::NoSpawn))
        && !taken.contains(&pos)
}

/// Tiles at exactly Chebyshev radius `r` around `anchor`, scanned row by
/// row, left to right. The order is what makes placement deterministic.
fn ring(anchor: GridPos, r: i32) -> Vec<GridPos> {
    let mut out = Vec::new();
    for dy in -r..=r {
        for dx in -r..=r {
            if dx.abs().max(dy.abs()) == r {
                out.push(GridPos::new(anchor.x + dx, anchor.y + dy));
            }
        }
    }
    out
}

/// Place `descriptors` around `anchor`. Hinted positions win when legal;
/// everything else walks outward ring by ring. No two results ever share
/// a tile; entities that cannot be placed at all are skipped with a log.
pub fn auto_place(
    descriptors: &[PlacementDescriptor],
    anchor: GridPos,
    grid: &MapGrid,
    occupied: &HashSet<GridPos>,
) -> Vec<PlacedEntity> {
    let mut taken = occupied.clone();
    let mut placements = Vec::with_capacity(descriptors.len());
    let max_radius = grid.width().max(grid.height()) as i32;

    for descriptor in descriptors {
        let hinted = descriptor
            .hint
            .filter(|&hint| spawn_legal(grid, hint, &taken));
        let position = hinted.or_else(|| {
            if spawn_legal(grid, anchor, &taken) {
                return Some(anchor);
            }
            (1..=max_radius)
                .flat_map(|r| ring(anchor, r))
                .find(|&pos| spawn_legal(grid, pos, &taken))
        });

        let Some(position) = position else {
            warn!("no spawn-legal tile for '{}'", descriptor.id);
            continue;
        };
        taken.insert(position);
        placements.push(PlacedEntity {
            id: descriptor.id.clone(),
            position,
        });
    }
    placements
}

/// Companion-follows-player heuristic: nearest free tile scanning west
/// first, then the remaining neighbors. Intentionally a cheap local rule,
/// not a pathfinding query.
pub fn companion_position(
    player: GridPos,
    grid: &MapGrid,
    occupied: &HashSet<GridPos>,
) -> Option<GridPos> {
    const SCAN: [(i32, i32); 8] = [
        (-1, 0),
        (-1, -1),
        (-1, 1),
        (0, -1),
        (0, 1),
        (1, 0),
        (1, -1),
        (1, 1),
    ];
    SCAN.iter()
        .map(|&(dx, dy)| GridPos::new(player.x + dx, player.y + dy))
        .find(|&pos| spawn_legal(grid, pos, occupied))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_grid(w: u32, h: u32) -> MapGrid {
        MapGrid::new("room", w, h, &[], vec![])
    }

    fn descriptors(ids: &[&str]) -> Vec<PlacementDescriptor> {
        ids.iter()
            .map(|id| PlacementDescriptor {
                id: id.to_string(),
                hint: None,
            })
            .collect()
    }

    #[test]
    fn test_no_overlap() {
        let grid = open_grid(9, 9);
        let placed = auto_place(
            &descriptors(&["a", "b", "c", "d", "e"]),
            GridPos::new(4, 4),
            &grid,
            &HashSet::new(),
        );
        assert_eq!(placed.len(), 5);
        let positions: HashSet<GridPos> = placed.iter().map(|p| p.position).collect();
        assert_eq!(positions.len(), 5);
    }

    #[test]
    fn test_hints_win_when_legal() {
        let grid = open_grid(9, 9);
        let descriptors = vec![
            PlacementDescriptor {
                id: "hinted".into(),
                hint: Some(GridPos::new(7, 1)),
            },
            PlacementDescriptor {
                id: "free".into(),
                hint: None,
            },
        ];
        let placed = auto_place(&descriptors, GridPos::new(4, 4), &grid, &HashSet::new());
        assert_eq!(placed[0].position, GridPos::new(7, 1));
    }

    #[test]
    fn test_illegal_hint_falls_back_to_rings() {
        let grid = MapGrid::new("room", 9, 9, &[(GridPos::new(7, 1), ZoneTag::Wall)], vec![]);
        let descriptors = vec![PlacementDescriptor {
            id: "hinted".into(),
            hint: Some(GridPos::new(7, 1)),
        }];
        let placed = auto_place(&descriptors, GridPos::new(4, 4), &grid, &HashSet::new());
        assert_eq!(placed.len(), 1);
        assert_ne!(placed[0].position, GridPos::new(7, 1));
    }

    #[test]
    fn test_avoids_no_spawn_and_occupied() {
        let tags: Vec<(GridPos, ZoneTag)> = GridPos::new(4, 4)
            .neighbors8()
            .iter()
            .map(|&p| (p, ZoneTag::NoSpawn))
            .collect();
        let grid = MapGrid::new("room", 9, 9, &tags, vec![]);
        let occupied: HashSet<GridPos> = [GridPos::new(4, 4)].into_iter().collect();
        let placed = auto_place(&descriptors(&["a"]), GridPos::new(4, 4), &grid, &occupied);
        assert_eq!(placed.len(), 1);
        // Anchor occupied, ring 1 all no-spawn: must land at radius 2.
        assert_eq!(placed[0].position.chebyshev(GridPos::new(4, 4)), 2);
    }

    #[test]
    fn test_idempotent_for_same_input() {
        let grid = open_grid(9, 9);
        let ds = descriptors(&["a", "b", "c"]);
        let first = auto_place(&ds, GridPos::new(4, 4), &grid, &HashSet::new());
        let second = auto_place(&ds, GridPos::new(4, 4), &grid, &HashSet::new());
        assert_eq!(first, second);
    }

    #[test]
    fn test_cache_pins_layout_until_roster_changes() {
        let mut cache = PlacementCache::default();
        let roster = vec!["a".to_string(), "b".to_string()];
        let placements = vec![
            PlacedEntity {
                id: "a".into(),
                position: GridPos::new(1, 1),
            },
            PlacedEntity {
                id: "b".into(),
                position: GridPos::new(2, 1),
            },
        ];
        cache.store("room", roster.clone(), placements.clone());
        assert_eq!(cache.lookup("room", &roster), Some(placements.as_slice()));
        let grown = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        assert_eq!(cache.lookup("room", &grown), None);
    }

    #[test]
    fn test_companion_prefers_west() {
        let grid = open_grid(9, 9);
        let player = GridPos::new(4, 4);
        assert_eq!(
            companion_position(player, &grid, &HashSet::new()),
            Some(GridPos::new(3, 4))
        );
        let occupied: HashSet<GridPos> = [GridPos::new(3, 4)].into_iter().collect();
        assert_eq!(
            companion_position(player, &grid, &occupied),
            Some(GridPos::new(3, 3))
        );
    }

    #[test]
    fn test_companion_at_west_edge() {
        let grid = open_grid(9, 9);
        let player = GridPos::new(0, 0);
        // West and north out of bounds; first legal scan hit is south.
        assert_eq!(
            companion_position(player, &grid, &HashSet::new()),
            Some(GridPos::new(0, 1))
        );
    }
}
