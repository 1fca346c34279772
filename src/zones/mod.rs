//! Zone calculator: threat-zone derivation and zone-tag classification.
//!
//! Threat zones are the tiles within immediate engagement range of a live,
//! upright hostile, and only exist outside combat — once combat starts the
//! encounter itself governs engagement, so the set is suppressed.

use std::collections::HashSet;

use bevy::prelude::*;

use crate::grid::{GridPos, GridPosition, HighlightKind, MapEntity, MapGrid, TerrainType, ZoneTag};
use crate::mode::ModeController;

pub struct ZonesPlugin;

impl Plugin for ZonesPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ThreatZones>();
    }
}

/// The current threat set. Sole writer is `refresh_threat_zones`.
#[derive(Resource, Debug, Default)]
pub struct ThreatZones(pub HashSet<GridPos>);

/// Runtime tile properties derived from a static layout tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileClass {
    pub traversable: bool,
    pub terrain: TerrainType,
    pub blocks_vision: bool,
}

/// Map a static layout tag to runtime tile properties. `Wall` is the only
/// tag that blocks traversal; `NoSpawn` only constrains placement.
pub fn classify_tile(tag: Option<ZoneTag>) -> TileClass {
    match tag {
        Some(ZoneTag::Wall) => TileClass {
            traversable: false,
            terrain: TerrainType::Impassable,
            blocks_vision: true,
        },
        Some(ZoneTag::Water) => TileClass {
            traversable: true,
            terrain: TerrainType::Water,
            blocks_vision: false,
        },
        Some(ZoneTag::Hazard) => TileClass {
            traversable: true,
            terrain: TerrainType::Hazard,
            blocks_vision: false,
        },
        Some(ZoneTag::NoSpawn) | None => TileClass {
            traversable: true,
            terrain: TerrainType::Normal,
            blocks_vision: false,
        },
    }
}

/// Compute the threat set: every in-bounds tile at Chebyshev distance 1 of
/// a hostile position, minus the hostile tiles themselves. Empty while
/// combat is active.
pub fn compute_threat_zones(
    hostile_positions: &[GridPos],
    grid: &MapGrid,
    combat_active: bool,
) -> HashSet<GridPos> {
    if combat_active {
        return HashSet::new();
    }
    let mut zones = HashSet::new();
    for &pos in hostile_positions {
        for neighbor in pos.neighbors8() {
            if grid.in_bounds(neighbor) {
                zones.insert(neighbor);
            }
        }
    }
    for pos in hostile_positions {
        zones.remove(pos);
    }
    zones
}

/// Recompute the threat set from current hostile positions and repaint the
/// threat highlights. Runs after grid mutations, before the scheduler.
pub fn refresh_threat_zones(
    mode: Res<ModeController>,
    entities: Query<(&MapEntity, &GridPosition)>,
    mut grid: ResMut<MapGrid>,
    mut threat: ResMut<ThreatZones>,
) {
    let hostiles: Vec<GridPos> = entities
        .iter()
        .filter(|(e, _)| e.projects_threat())
        .map(|(_, p)| p.0)
        .collect();

    let next = compute_threat_zones(&hostiles, &grid, mode.in_combat);
    if next == threat.0 {
        return;
    }

    grid.clear_highlights(HighlightKind::ThreatZone);
    for &pos in &next {
        grid.set_highlight(pos, HighlightKind::ThreatZone);
    }
    threat.0 = next;
}
