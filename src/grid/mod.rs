//! Grid model and entity registry.
//!
//! Owns the tile grid, the map-entity registry, exits, and the aggregate
//! `MapState` snapshot. Mutations arrive as `GridCommand` events and are
//! applied before any zone/timeline work in the same tick. The registry
//! never starts animations itself; the mode controller and timeline
//! scheduler react to its changes.

use std::collections::{HashMap, HashSet};

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::timeline::{AnimationTimeline, TimelineFinished, TimelineState, Visual};
use crate::zones::{self, ThreatZones};

pub struct GridPlugin;

impl Plugin for GridPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<EntityIndex>()
            .init_resource::<MapState>()
            .add_event::<GridCommand>()
            .add_event::<MapStateChanged>();
    }
}

// =====================================================
// Positions & directions
// =====================================================

/// Integer tile coordinate.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct GridPos {
    pub x: i32,
    pub y: i32,
}

impl GridPos {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Chebyshev (chessboard) distance: diagonals count as one step.
    pub fn chebyshev(self, other: GridPos) -> i32 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }

    /// The 8 surrounding tiles, in a fixed clockwise-from-north order.
    /// The order is load-bearing: BFS frontier insertion uses it for
    /// reproducible tie-breaking.
    pub fn neighbors8(self) -> [GridPos; 8] {
        const OFFSETS: [(i32, i32); 8] = [
            (0, -1),
            (1, -1),
            (1, 0),
            (1, 1),
            (0, 1),
            (-1, 1),
            (-1, 0),
            (-1, -1),
        ];
        let mut out = [GridPos::default(); 8];
        for (i, (dx, dy)) in OFFSETS.iter().enumerate() {
            out[i] = GridPos::new(self.x + dx, self.y + dy);
        }
        out
    }

    /// Center of this tile in tile-space world units.
    pub fn center(self) -> Vec2 {
        Vec2::new(self.x as f32 + 0.5, self.y as f32 + 0.5)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CardinalDir {
    North,
    South,
    East,
    West,
}

// =====================================================
// Tiles
// =====================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TerrainType {
    #[default]
    Normal,
    Difficult,
    Impassable,
    Hazard,
    Water,
}

/// Static per-tile classification from room layout data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ZoneTag {
    Wall,
    Water,
    Hazard,
    NoSpawn,
}

/// Transient visual marker painted onto a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum HighlightKind {
    #[default]
    None,
    ThreatZone,
    ValidMovement,
    AttackRange,
    AoePreview,
    Exit,
    PlayerPosition,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tile {
    pub position: GridPos,
    pub traversable: bool,
    pub terrain: TerrainType,
    pub zone_tag: Option<ZoneTag>,
    pub highlight: HighlightKind,
}

/// An exit leading to another room. Derived from room topology,
/// read-only to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExitTile {
    pub position: GridPos,
    pub direction: CardinalDir,
    pub target_room_id: String,
    pub target_room_name: String,
}

// =====================================================
// Grid resource
// =====================================================

/// The tile grid for the currently loaded room.
#[derive(Resource, Debug, Clone, Serialize, Deserialize)]
pub struct MapGrid {
    width: u32,
    height: u32,
    tiles: Vec<Tile>,
    exits: Vec<ExitTile>,
    pub room_id: String,
}

impl Default for MapGrid {
    fn default() -> Self {
        MapGrid::new("", 1, 1, &[], Vec::new())
    }
}

impl MapGrid {
    /// Build a grid from room layout data. Zone tags are classified into
    /// runtime tile properties up front; only highlights and traversability
    /// mutate afterwards.
    pub fn new(
        room_id: &str,
        width: u32,
        height: u32,
        zone_data: &[(GridPos, ZoneTag)],
        exits: Vec<ExitTile>,
    ) -> Self {
        let tags: HashMap<GridPos, ZoneTag> = zone_data.iter().copied().collect();
        let mut tiles = Vec::with_capacity((width * height) as usize);
        for y in 0..height as i32 {
            for x in 0..width as i32 {
                let position = GridPos::new(x, y);
                let tag = tags.get(&position).copied();
                let class = zones::classify_tile(tag);
                tiles.push(Tile {
                    position,
                    traversable: class.traversable,
                    terrain: class.terrain,
                    zone_tag: tag,
                    highlight: HighlightKind::None,
                });
            }
        }
        let mut grid = Self {
            width,
            height,
            tiles,
            exits,
            room_id: room_id.to_string(),
        };
        let exit_positions: Vec<GridPos> = grid.exits.iter().map(|e| e.position).collect();
        for pos in exit_positions {
            grid.set_highlight(pos, HighlightKind::Exit);
        }
        grid
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn in_bounds(&self, pos: GridPos) -> bool {
        pos.x >= 0 && pos.y >= 0 && pos.x < self.width as i32 && pos.y < self.height as i32
    }

    fn index(&self, pos: GridPos) -> Option<usize> {
        if self.in_bounds(pos) {
            Some((pos.y as u32 * self.width + pos.x as u32) as usize)
        } else {
            None
        }
    }

    pub fn tile(&self, pos: GridPos) -> Option<&Tile> {
        self.index(pos).map(|i| &self.tiles[i])
    }

    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter()
    }

    pub fn is_traversable(&self, pos: GridPos) -> bool {
        self.tile(pos).is_some_and(|t| t.traversable)
    }

    pub fn set_traversable(&mut self, pos: GridPos, traversable: bool) {
        if let Some(i) = self.index(pos) {
            self.tiles[i].traversable = traversable;
        }
    }

    pub fn set_highlight(&mut self, pos: GridPos, highlight: HighlightKind) {
        if let Some(i) = self.index(pos) {
            self.tiles[i].highlight = highlight;
        }
    }

    /// Clear every tile carrying the given highlight kind.
    pub fn clear_highlights(&mut self, kind: HighlightKind) {
        for tile in &mut self.tiles {
            if tile.highlight == kind {
                tile.highlight = HighlightKind::None;
            }
        }
    }

    /// Clear all transient highlights except exits.
    pub fn clear_all_highlights(&mut self) {
        for tile in &mut self.tiles {
            if tile.highlight != HighlightKind::Exit {
                tile.highlight = HighlightKind::None;
            }
        }
    }

    pub fn exits(&self) -> &[ExitTile] {
        &self.exits
    }

    pub fn exit_at(&self, pos: GridPos) -> Option<&ExitTile> {
        self.exits.iter().find(|e| e.position == pos)
    }
}

// =====================================================
// Map entities
// =====================================================

/// Relationship of an entity to the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Allegiance {
    Player,
    BondedAlly,
    Hostile,
    Neutral,
}

/// Opaque handle into the render backend's portrait store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PortraitHandle(pub String);

/// A participant on the local map. The stable `id` outlives position and
/// timeline churn for the whole session.
#[derive(Component, Debug, Clone, Serialize, Deserialize)]
pub struct MapEntity {
    pub id: String,
    pub name: String,
    pub level: u32,
    pub allegiance: Allegiance,
    pub current_hp: i32,
    pub max_hp: i32,
    pub portrait: PortraitHandle,
    pub is_bonded: bool,
    pub is_captured: bool,
    pub is_dead: bool,
    pub is_incapacitated: bool,
}

impl MapEntity {
    /// Hostile entities project threat only while alive and upright.
    pub fn projects_threat(&self) -> bool {
        self.allegiance == Allegiance::Hostile && !self.is_dead && !self.is_incapacitated
    }
}

/// Logical tile position of a map entity.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridPosition(pub GridPos);

/// Plain-data description used to create or update a map entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityDescriptor {
    pub id: String,
    pub name: String,
    pub level: u32,
    pub allegiance: Allegiance,
    pub current_hp: i32,
    pub max_hp: i32,
    #[serde(default)]
    pub portrait: PortraitHandle,
    #[serde(default)]
    pub is_bonded: bool,
    #[serde(default)]
    pub is_captured: bool,
    #[serde(default)]
    pub position: Option<GridPos>,
}

impl EntityDescriptor {
    fn into_entity(self) -> MapEntity {
        MapEntity {
            id: self.id,
            name: self.name,
            level: self.level,
            allegiance: self.allegiance,
            current_hp: self.current_hp,
            max_hp: self.max_hp,
            portrait: self.portrait,
            is_bonded: self.is_bonded,
            is_captured: self.is_captured,
            is_dead: false,
            is_incapacitated: false,
        }
    }
}

/// Stable id -> ECS entity lookup.
#[derive(Resource, Debug, Default)]
pub struct EntityIndex {
    by_id: HashMap<String, Entity>,
}

impl EntityIndex {
    pub fn get(&self, id: &str) -> Option<Entity> {
        self.by_id.get(id).copied()
    }

    pub fn insert(&mut self, id: String, entity: Entity) {
        self.by_id.insert(id, entity);
    }

    pub fn remove(&mut self, id: &str) -> Option<Entity> {
        self.by_id.remove(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &String> {
        self.by_id.keys()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

/// Registry mutations. Callers validate collisions before `MoveTo`; the
/// registry applies blindly.
#[derive(Event, Debug, Clone)]
pub enum GridCommand {
    Upsert(EntityDescriptor),
    Remove { id: String },
    MoveTo { id: String, position: GridPos },
}

/// Apply queued registry mutations. Runs before zone recompute so nothing
/// downstream reads stale positions within the tick.
pub fn apply_grid_commands(
    mut commands: Commands,
    mut events: EventReader<GridCommand>,
    mut index: ResMut<EntityIndex>,
    mut finished: EventWriter<TimelineFinished>,
    mut entities: Query<(
        &mut MapEntity,
        &mut GridPosition,
        Option<&AnimationTimeline>,
    )>,
) {
    for command in events.read() {
        match command {
            GridCommand::Upsert(descriptor) => {
                upsert_entity(&mut commands, &mut index, &mut entities, descriptor.clone());
            }
            GridCommand::Remove { id } => {
                remove_entity(&mut commands, &mut index, &entities, id, &mut finished);
            }
            GridCommand::MoveTo { id, position } => {
                let Some(entity) = index.get(id) else {
                    warn!("MoveTo for unknown entity '{id}'");
                    continue;
                };
                if let Ok((_, mut pos, _)) = entities.get_mut(entity) {
                    pos.0 = *position;
                }
            }
        }
    }
}

fn upsert_entity(
    commands: &mut Commands,
    index: &mut EntityIndex,
    entities: &mut Query<(
        &mut MapEntity,
        &mut GridPosition,
        Option<&AnimationTimeline>,
    )>,
    descriptor: EntityDescriptor,
) {
    if let Some(existing) = index.get(&descriptor.id) {
        if let Ok((mut entity, mut pos, _)) = entities.get_mut(existing) {
            if let Some(p) = descriptor.position {
                pos.0 = p;
            }
            let preserved_dead = entity.is_dead;
            let preserved_incapacitated = entity.is_incapacitated;
            *entity = descriptor.into_entity();
            entity.is_dead = preserved_dead;
            entity.is_incapacitated = preserved_incapacitated;
        }
        return;
    }

    // Exactly one player and at most one bonded ally may exist.
    if matches!(
        descriptor.allegiance,
        Allegiance::Player | Allegiance::BondedAlly
    ) {
        let duplicate = entities
            .iter()
            .any(|(e, _, _)| e.allegiance == descriptor.allegiance);
        if duplicate {
            warn!(
                "rejecting duplicate {:?} upsert for '{}'",
                descriptor.allegiance, descriptor.id
            );
            return;
        }
    }

    let position = descriptor.position.unwrap_or_default();
    let id = descriptor.id.clone();
    let spawned = commands
        .spawn((
            descriptor.into_entity(),
            GridPosition(position),
            Visual::default(),
            AnimationTimeline::default(),
        ))
        .id();
    index.insert(id, spawned);
}

/// Spawn a fresh map entity at a known-legal position with its entrance
/// animation already running. Used by room loading, where placement has
/// validated the tile; interactive upserts go through `GridCommand`.
pub fn spawn_map_entity(
    commands: &mut Commands,
    index: &mut EntityIndex,
    descriptor: EntityDescriptor,
    position: GridPos,
) -> Entity {
    let id = descriptor.id.clone();
    let spawned = commands
        .spawn((
            descriptor.into_entity(),
            GridPosition(position),
            Visual {
                scale: 0.0,
                alpha: 0.0,
                ..Default::default()
            },
            AnimationTimeline {
                state: TimelineState::entrance(),
                ..Default::default()
            },
        ))
        .id();
    index.insert(id, spawned);
    spawned
}

/// Despawn an entity, forcing any in-flight timeline to resolve its
/// completion first so callers never wait on a dead animation.
pub fn remove_entity(
    commands: &mut Commands,
    index: &mut EntityIndex,
    entities: &Query<(
        &mut MapEntity,
        &mut GridPosition,
        Option<&AnimationTimeline>,
    )>,
    id: &str,
    finished: &mut EventWriter<TimelineFinished>,
) {
    let Some(entity) = index.remove(id) else {
        return;
    };
    if let Ok((_, _, Some(timeline))) = entities.get(entity) {
        if let Some(kind) = timeline.running_kind() {
            finished.send(TimelineFinished {
                entity_id: id.to_string(),
                kind,
                completed: false,
            });
        }
    }
    commands.entity(entity).despawn();
}

// =====================================================
// MapState snapshot
// =====================================================

/// Per-entity slice of the aggregate snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySnapshot {
    pub id: String,
    pub name: String,
    pub allegiance: Allegiance,
    pub position: GridPos,
    pub current_hp: i32,
    pub max_hp: i32,
    pub is_dead: bool,
    pub is_incapacitated: bool,
}

/// Value-like aggregate of everything a collaborator needs to reason about
/// the map: rebuilt at the end of every tick, never mutated in place
/// mid-tick.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct MapState {
    pub room_id: String,
    pub width: u32,
    pub height: u32,
    pub entities: Vec<EntitySnapshot>,
    pub exits: Vec<ExitTile>,
    pub threat_zones: Vec<GridPos>,
    pub player_position: Option<GridPos>,
    pub in_combat: bool,
}

impl MapState {
    pub fn entity_at(&self, pos: GridPos) -> Option<&EntitySnapshot> {
        self.entities.iter().find(|e| e.position == pos)
    }

    pub fn is_occupied(&self, pos: GridPos, excluding: Option<&str>) -> bool {
        self.entities
            .iter()
            .any(|e| e.position == pos && excluding != Some(e.id.as_str()))
    }

    pub fn entity(&self, id: &str) -> Option<&EntitySnapshot> {
        self.entities.iter().find(|e| e.id == id)
    }
}

/// Emitted when the snapshot changed this tick, only while not in combat;
/// once combat starts, state ownership transfers to the combat caller.
#[derive(Event, Debug, Clone)]
pub struct MapStateChanged(pub MapState);

/// Rebuild the aggregate snapshot and publish it if it changed.
pub fn publish_map_state(
    grid: Res<MapGrid>,
    threat: Res<ThreatZones>,
    mode: Res<crate::mode::ModeController>,
    entities: Query<(&MapEntity, &GridPosition)>,
    mut state: ResMut<MapState>,
    mut changed: EventWriter<MapStateChanged>,
) {
    let mut snapshots: Vec<EntitySnapshot> = entities
        .iter()
        .map(|(e, p)| EntitySnapshot {
            id: e.id.clone(),
            name: e.name.clone(),
            allegiance: e.allegiance,
            position: p.0,
            current_hp: e.current_hp,
            max_hp: e.max_hp,
            is_dead: e.is_dead,
            is_incapacitated: e.is_incapacitated,
        })
        .collect();
    snapshots.sort_by(|a, b| a.id.cmp(&b.id));

    let player_position = snapshots
        .iter()
        .find(|e| e.allegiance == Allegiance::Player)
        .map(|e| e.position);

    let mut threat_zones: Vec<GridPos> = threat.0.iter().copied().collect();
    threat_zones.sort();

    let next = MapState {
        room_id: grid.room_id.clone(),
        width: grid.width(),
        height: grid.height(),
        entities: snapshots,
        exits: grid.exits().to_vec(),
        threat_zones,
        player_position,
        in_combat: mode.in_combat,
    };

    if *state != next {
        *state = next.clone();
        if !mode.in_combat {
            changed.send(MapStateChanged(next));
        }
    }
}

/// Positions currently occupied by live entities, optionally excluding one id.
pub fn occupied_positions(
    entities: &Query<(&MapEntity, &GridPosition)>,
    excluding: Option<&str>,
) -> HashSet<GridPos> {
    entities
        .iter()
        .filter(|(e, _)| excluding != Some(e.id.as_str()))
        .map(|(_, p)| p.0)
        .collect()
}
