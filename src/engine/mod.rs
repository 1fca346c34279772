//! Engine integration layer: configuration, room loading, and the
//! top-level plugin that wires every component with the per-tick ordering
//! the rest of the crate assumes:
//!
//!   input/mode -> grid mutation -> zone recompute -> highlights ->
//!   timelines -> projectiles/particles -> indicators -> snapshot publish
//!
//! Nothing downstream of a position mutation ever reads stale zone data
//! within a tick.

pub mod config;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

pub use config::{ConfigError, EngineConfig, ZoomConfig};

use crate::grid::{
    self, spawn_map_entity, EntityDescriptor, EntityIndex, ExitTile, GridPos, MapGrid, ZoneTag,
};
use crate::indicators::{self, FloatingText};
use crate::logging;
use crate::mode::{self, ExitCombat, PendingHits};
use crate::particles::{self, EffectRng, ParticlePool, Projectile};
use crate::placement::{self, PlacedEntity, PlacementCache, PlacementDescriptor};
use crate::timeline::{self, TimelineFinished};
use crate::viewport::Viewport;
use crate::zones;

// =====================================================
// Room definitions
// =====================================================

/// Room data handed over by the world/persistence layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomDef {
    pub id: String,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub zone_tags: Vec<(GridPos, ZoneTag)>,
    #[serde(default)]
    pub exits: Vec<ExitTile>,
    pub player: EntityDescriptor,
    #[serde(default)]
    pub companion: Option<EntityDescriptor>,
    #[serde(default)]
    pub npcs: Vec<EntityDescriptor>,
}

/// Swap the engine onto a new room: rebuild the grid, tear down the old
/// roster (resolving in-flight timelines), and place the new one.
#[derive(Event, Debug, Clone)]
pub struct LoadRoom(pub RoomDef);

// =====================================================
// Plugin
// =====================================================

pub struct MapEnginePlugin {
    config: EngineConfig,
}

impl MapEnginePlugin {
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }
}

impl Default for MapEnginePlugin {
    fn default() -> Self {
        Self {
            config: EngineConfig::default(),
        }
    }
}

impl Plugin for MapEnginePlugin {
    fn build(&self, app: &mut App) {
        logging::init_tracing_default();
        let config = &self.config;
        app.add_plugins((
            grid::GridPlugin,
            zones::ZonesPlugin,
            placement::PlacementPlugin,
            timeline::TimelinePlugin,
            particles::ParticlesPlugin,
            indicators::IndicatorsPlugin,
            crate::viewport::ViewportPlugin,
            mode::ModePlugin,
        ))
        .insert_resource(config.clone())
        .insert_resource(ParticlePool::with_capacity(config.particle_pool_size))
        .insert_resource(EffectRng::from_seed(config.effect_seed))
        .insert_resource(Viewport::new(
            Vec2::new(
                config.grid_width as f32 * config.tile_size,
                config.grid_height as f32 * config.tile_size,
            ),
            Vec2::new(config.viewport_width, config.viewport_height),
            config.zoom.min,
            config.zoom.default,
            config.zoom.max,
            config.zoom.step,
            config.min_visible_fraction,
        ))
        .insert_resource(MapGrid::new(
            "",
            config.grid_width,
            config.grid_height,
            &[],
            Vec::new(),
        ))
        .add_event::<LoadRoom>()
        .add_systems(
            Update,
            (
                handle_load_room,
                mode::handle_mode_transitions,
                grid::apply_grid_commands,
                mode::handle_combat_commands,
                mode::handle_entity_clicks,
                mode::handle_tile_clicks,
                mode::advance_path_follow,
                zones::refresh_threat_zones,
                mode::update_targeting_highlights,
                timeline::advance_timelines,
                particles::handle_emit_requests,
                particles::handle_launch_requests,
                particles::advance_projectiles,
                mode::resolve_attack_hits,
                particles::advance_particles,
                indicators::advance_floating_text,
                grid::publish_map_state,
            )
                .chain(),
        );
    }
}

// =====================================================
// Room loading
// =====================================================

/// Rebuild the world for a newly loaded room.
#[allow(clippy::too_many_arguments)]
pub fn handle_load_room(
    mut commands: Commands,
    mut rooms: EventReader<LoadRoom>,
    config: Res<EngineConfig>,
    mut map_grid: ResMut<MapGrid>,
    mut index: ResMut<EntityIndex>,
    mut cache: ResMut<PlacementCache>,
    mut viewport: ResMut<Viewport>,
    mut exit_combat: EventWriter<ExitCombat>,
    mut finished: EventWriter<TimelineFinished>,
    mut pending: ResMut<PendingHits>,
    entities: Query<(
        &mut grid::MapEntity,
        &mut grid::GridPosition,
        Option<&crate::timeline::AnimationTimeline>,
    )>,
    projectiles: Query<Entity, With<Projectile>>,
    floating_text: Query<Entity, With<FloatingText>>,
) {
    let Some(LoadRoom(room)) = rooms.read().last().cloned() else {
        return;
    };

    // Tear down the previous roster; forced completions fire here.
    let ids: Vec<String> = index.ids().cloned().collect();
    for id in &ids {
        grid::remove_entity(&mut commands, &mut index, &entities, id, &mut finished);
    }

    // In-flight effects die with the room. A projectile launched in the
    // old room must not land on a same-id entity in the new roster.
    for entity in &projectiles {
        commands.entity(entity).despawn();
    }
    for entity in &floating_text {
        commands.entity(entity).despawn();
    }
    pending.clear();

    *map_grid = MapGrid::new(
        &room.id,
        room.width,
        room.height,
        &room.zone_tags,
        room.exits.clone(),
    );
    exit_combat.send(ExitCombat);

    viewport.content_size = Vec2::new(
        room.width as f32 * config.tile_size,
        room.height as f32 * config.tile_size,
    );
    viewport.set_pan(0.0, 0.0);

    // Player first: everything else is laid out relative to them.
    let center = GridPos::new(room.width as i32 / 2, room.height as i32 / 2);
    let player_pos = room.player.position.unwrap_or(center);
    let mut occupied: std::collections::HashSet<GridPos> = [player_pos].into_iter().collect();
    spawn_map_entity(&mut commands, &mut index, room.player.clone(), player_pos);

    if let Some(companion) = &room.companion {
        let pos = companion
            .position
            .or_else(|| placement::companion_position(player_pos, &map_grid, &occupied));
        if let Some(pos) = pos {
            occupied.insert(pos);
            spawn_map_entity(&mut commands, &mut index, companion.clone(), pos);
        } else {
            warn!("no free tile for companion '{}'", companion.id);
        }
    }

    let mut roster: Vec<String> = room.npcs.iter().map(|npc| npc.id.clone()).collect();
    roster.sort();
    let placements: Vec<PlacedEntity> = match cache.lookup(&room.id, &roster) {
        Some(cached) => cached.to_vec(),
        None => {
            let descriptors: Vec<PlacementDescriptor> = room
                .npcs
                .iter()
                .map(|npc| PlacementDescriptor {
                    id: npc.id.clone(),
                    hint: npc.position,
                })
                .collect();
            let placed = placement::auto_place(&descriptors, center, &map_grid, &occupied);
            cache.store(&room.id, roster, placed.clone());
            placed
        }
    };
    for placed in placements {
        let Some(npc) = room.npcs.iter().find(|npc| npc.id == placed.id) else {
            continue;
        };
        spawn_map_entity(&mut commands, &mut index, npc.clone(), placed.position);
    }

    info!(
        "loaded room '{}' ({}x{}, {} npcs, {} exits)",
        room.id,
        room.width,
        room.height,
        room.npcs.len(),
        room.exits.len()
    );
}
