//! Mode controller: exploration vs. combat, targeting, and the event
//! surface exposed to the host application.
//!
//! This is the single authority that decides when exploration motion must
//! yield to combat initiation, and the sole writer of `in_combat` and
//! `targeting`. Input events (`TileClicked`, `EntityClicked`) drive
//! exploration; the imperative `CombatCommand` surface drives combat
//! animation on behalf of the external combat orchestrator.

use std::collections::{HashMap, HashSet, VecDeque};

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::color::Rgba;
use crate::engine::EngineConfig;
use crate::grid::{
    occupied_positions, Allegiance, CardinalDir, EntityIndex, GridPos, GridPosition,
    HighlightKind, MapEntity, MapGrid, MapState,
};
use crate::indicators::FloatingText;
use crate::particles::{
    BurstConfig, EffectRng, LaunchProjectile, ParticlePool, ProjectileArrived,
};
use crate::pathfinding;
use crate::timeline::{
    request_timeline, AnimationTimeline, AttackApex, TimelineFinished, TimelineKind,
    TimelineState, Visual,
};
use crate::zones::ThreatZones;

pub struct ModePlugin;

impl Plugin for ModePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ModeController>()
            .init_resource::<BlastPattern>()
            .init_resource::<PendingHits>()
            .add_event::<TileClicked>()
            .add_event::<TileHovered>()
            .add_event::<EntityClicked>()
            .add_event::<EnterCombat>()
            .add_event::<ExitCombat>()
            .add_event::<SetTargetingMode>()
            .add_event::<CombatCommand>()
            .add_event::<ExitReached>()
            .add_event::<ThreatZoneEntered>();
    }
}

// =====================================================
// Mode state
// =====================================================

/// Combat input interpretation; meaningful only while in combat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TargetingMode {
    #[default]
    None,
    Move,
    Attack,
    Item,
    Area,
}

/// Exploration/combat switch plus the targeting sub-state. All other
/// components only read this.
#[derive(Resource, Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModeController {
    pub in_combat: bool,
    pub targeting: TargetingMode,
}

/// Caller-supplied blast footprint for area targeting. The host installs
/// a function mapping a center tile to the affected tiles.
#[derive(Resource, Default)]
pub struct BlastPattern(Option<Box<dyn Fn(GridPos) -> Vec<GridPos> + Send + Sync>>);

impl BlastPattern {
    pub fn set(&mut self, pattern: impl Fn(GridPos) -> Vec<GridPos> + Send + Sync + 'static) {
        self.0 = Some(Box::new(pattern));
    }

    pub fn clear(&mut self) {
        self.0 = None;
    }

    pub fn footprint(&self, center: GridPos) -> Option<Vec<GridPos>> {
        self.0.as_ref().map(|f| f(center))
    }
}

/// Damage deferred until an attack animation reaches its hook point:
/// apex for melee, arrival for projectiles.
#[derive(Resource, Debug, Default)]
pub struct PendingHits {
    next_token: u64,
    ranged: HashMap<u64, PendingHit>,
    melee: HashMap<(String, String), i32>,
}

#[derive(Debug, Clone)]
struct PendingHit {
    target_id: String,
    damage: i32,
}

impl PendingHits {
    fn allocate(&mut self, target_id: String, damage: i32) -> u64 {
        let token = self.next_token;
        self.next_token += 1;
        self.ranged.insert(token, PendingHit { target_id, damage });
        token
    }

    /// Drop every deferred hit. Used on room teardown: the entities the
    /// hits were aimed at no longer exist.
    pub fn clear(&mut self) {
        self.ranged.clear();
        self.melee.clear();
    }
}

// =====================================================
// Input events (from the presentation layer)
// =====================================================

#[derive(Event, Debug, Clone, Copy)]
pub struct TileClicked {
    pub position: GridPos,
}

#[derive(Event, Debug, Clone, Copy)]
pub struct TileHovered {
    pub position: GridPos,
}

#[derive(Event, Debug, Clone)]
pub struct EntityClicked {
    pub id: String,
}

#[derive(Event, Debug, Clone, Copy, Default)]
pub struct EnterCombat;

#[derive(Event, Debug, Clone, Copy, Default)]
pub struct ExitCombat;

#[derive(Event, Debug, Clone, Copy)]
pub struct SetTargetingMode(pub TargetingMode);

/// Imperative control surface for the external combat orchestrator.
#[derive(Event, Debug, Clone)]
pub enum CombatCommand {
    AnimateMove {
        id: String,
        target: GridPos,
    },
    AnimateAttack {
        attacker_id: String,
        target_id: String,
        damage: i32,
        ranged: bool,
    },
    PlayDeath {
        id: String,
    },
    PlayIncapacitation {
        id: String,
    },
    PlayRevival {
        id: String,
    },
    ShowDamageNumber {
        id: String,
        value: i32,
    },
    ShowMissIndicator {
        id: String,
    },
}

// =====================================================
// Outbound events (to the host)
// =====================================================

/// The player clicked the exit tile they are standing on.
#[derive(Event, Debug, Clone)]
pub struct ExitReached {
    pub direction: CardinalDir,
    pub target_room_id: String,
}

/// The player stepped into a hostile's threat zone during exploration.
/// Carries the entity positions frozen at that instant; path following
/// halts and ownership passes to the combat caller.
#[derive(Event, Debug, Clone)]
pub struct ThreatZoneEntered {
    pub hostile_ids: Vec<String>,
    pub position: GridPos,
    pub frozen_state: MapState,
}

// =====================================================
// Path following
// =====================================================

/// Remaining steps of a multi-tile route. One `Moving` timeline per step,
/// so the controller can react at every step boundary.
#[derive(Component, Debug, Clone)]
pub struct PathFollow {
    pub steps: VecDeque<GridPos>,
}

impl PathFollow {
    /// Build from a full BFS path (including the start tile).
    pub fn from_path(path: &[GridPos]) -> Self {
        Self {
            steps: path.iter().skip(1).copied().collect(),
        }
    }
}

// =====================================================
// Systems
// =====================================================

/// Apply EnterCombat/ExitCombat/SetTargetingMode requests.
pub fn handle_mode_transitions(
    mut mode: ResMut<ModeController>,
    mut grid: ResMut<MapGrid>,
    mut enter: EventReader<EnterCombat>,
    mut exit: EventReader<ExitCombat>,
    mut set_targeting: EventReader<SetTargetingMode>,
) {
    if enter.read().next().is_some() && !mode.in_combat {
        mode.in_combat = true;
        mode.targeting = TargetingMode::None;
        grid.clear_all_highlights();
        info!("entering combat mode");
    }
    if exit.read().next().is_some() && mode.in_combat {
        mode.in_combat = false;
        mode.targeting = TargetingMode::None;
        grid.clear_all_highlights();
        info!("returning to exploration mode");
    }
    for SetTargetingMode(targeting) in set_targeting.read() {
        if mode.in_combat {
            mode.targeting = *targeting;
        } else {
            warn!("targeting mode {targeting:?} requested outside combat, ignored");
        }
    }
}

/// Exploration tile clicks: exit trigger or path request.
pub fn handle_tile_clicks(
    mut commands: Commands,
    mode: Res<ModeController>,
    grid: Res<MapGrid>,
    mut clicks: EventReader<TileClicked>,
    mut exits: EventWriter<ExitReached>,
    entities: Query<(&MapEntity, &GridPosition)>,
    player: Query<(Entity, &MapEntity, &GridPosition)>,
) {
    if mode.in_combat {
        clicks.clear();
        return;
    }
    let Some((player_entity, player_data, player_pos)) = player
        .iter()
        .find(|(_, e, _)| e.allegiance == Allegiance::Player)
    else {
        clicks.clear();
        return;
    };

    for click in clicks.read() {
        if click.position == player_pos.0 {
            if let Some(exit) = grid.exit_at(click.position) {
                exits.send(ExitReached {
                    direction: exit.direction,
                    target_room_id: exit.target_room_id.clone(),
                });
            }
            continue;
        }
        let blocked = occupied_positions(&entities, Some(&player_data.id));
        match pathfinding::find_path(player_pos.0, click.position, &grid, &blocked, false) {
            Some(path) if path.len() > 1 => {
                commands
                    .entity(player_entity)
                    .insert(PathFollow::from_path(&path));
            }
            // Unreachable destination is a no-op move, not an error.
            _ => debug!("no route to {:?}", click.position),
        }
    }
}

/// Exploration entity clicks: walk up next to the clicked entity.
pub fn handle_entity_clicks(
    mut commands: Commands,
    mode: Res<ModeController>,
    grid: Res<MapGrid>,
    index: Res<EntityIndex>,
    mut clicks: EventReader<EntityClicked>,
    entities: Query<(&MapEntity, &GridPosition)>,
    player: Query<(Entity, &MapEntity, &GridPosition)>,
) {
    if mode.in_combat {
        clicks.clear();
        return;
    }
    let Some((player_entity, player_data, player_pos)) = player
        .iter()
        .find(|(_, e, _)| e.allegiance == Allegiance::Player)
    else {
        clicks.clear();
        return;
    };

    for click in clicks.read() {
        let Some(target) = index.get(&click.id) else {
            continue;
        };
        let Ok((_, target_pos)) = entities.get(target) else {
            continue;
        };
        if player_pos.0.chebyshev(target_pos.0) <= 1 {
            continue;
        }
        let blocked = occupied_positions(&entities, Some(&player_data.id));
        // Path onto the occupied tile, then stop one step short.
        if let Some(path) =
            pathfinding::find_path(player_pos.0, target_pos.0, &grid, &blocked, true)
        {
            if path.len() > 2 {
                commands
                    .entity(player_entity)
                    .insert(PathFollow::from_path(&path[..path.len() - 1]));
            }
        }
    }
}

/// Walk queued path steps, one `Moving` timeline at a time, checking for
/// threat-zone entry at every step boundary.
pub fn advance_path_follow(
    mut commands: Commands,
    mode: Res<ModeController>,
    threat: Res<ThreatZones>,
    state: Res<MapState>,
    mut threat_events: EventWriter<ThreatZoneEntered>,
    mut finished: EventWriter<TimelineFinished>,
    mut followers: Query<(
        Entity,
        &mut MapEntity,
        &mut GridPosition,
        &mut AnimationTimeline,
        &mut Visual,
        &mut PathFollow,
    )>,
    hostiles: Query<(&MapEntity, &GridPosition), Without<PathFollow>>,
) {
    for (entity, mut map_entity, mut position, mut timeline, mut visual, mut follow) in
        &mut followers
    {
        if timeline.running_kind().is_some() {
            continue;
        }

        // Exploration threat check happens between steps, with the entity
        // settled on its new tile.
        if !mode.in_combat
            && map_entity.allegiance == Allegiance::Player
            && threat.0.contains(&position.0)
        {
            let hostile_ids = hostiles
                .iter()
                .filter(|(e, p)| e.projects_threat() && p.0.chebyshev(position.0) <= 1)
                .map(|(e, _)| e.id.clone())
                .collect();
            threat_events.send(ThreatZoneEntered {
                hostile_ids,
                position: position.0,
                frozen_state: state.clone(),
            });
            commands.entity(entity).remove::<PathFollow>();
            continue;
        }

        let Some(next) = follow.steps.pop_front() else {
            commands.entity(entity).remove::<PathFollow>();
            continue;
        };
        let from = position.0;
        position.0 = next;
        request_timeline(
            &mut timeline,
            &mut visual,
            &mut map_entity,
            TimelineState::moving(from, next),
            &mut finished,
        );
    }
}

fn attack_range_tiles(center: GridPos, range: u32, grid: &MapGrid) -> Vec<GridPos> {
    let r = range as i32;
    let mut tiles = Vec::new();
    for dy in -r..=r {
        for dx in -r..=r {
            if dx == 0 && dy == 0 {
                continue;
            }
            let pos = GridPos::new(center.x + dx, center.y + dy);
            if grid.in_bounds(pos) {
                tiles.push(pos);
            }
        }
    }
    tiles
}

/// Repaint targeting highlights whenever the mode, the hovered tile, or
/// entity positions change.
pub fn update_targeting_highlights(
    mode: Res<ModeController>,
    config: Res<EngineConfig>,
    blast: Res<BlastPattern>,
    mut hover: EventReader<TileHovered>,
    mut last_hover: Local<Option<GridPos>>,
    entities: Query<(&MapEntity, &GridPosition)>,
    moved: Query<(), Changed<GridPosition>>,
    mut grid: ResMut<MapGrid>,
) {
    let mut dirty = mode.is_changed() || !moved.is_empty();
    if let Some(hovered) = hover.read().last() {
        *last_hover = Some(hovered.position);
        dirty = true;
    }
    if !dirty {
        return;
    }

    grid.clear_highlights(HighlightKind::ValidMovement);
    grid.clear_highlights(HighlightKind::AttackRange);
    grid.clear_highlights(HighlightKind::AoePreview);
    grid.clear_highlights(HighlightKind::PlayerPosition);

    let Some((player_data, player_pos)) = entities
        .iter()
        .find(|(e, _)| e.allegiance == Allegiance::Player)
    else {
        return;
    };
    grid.set_highlight(player_pos.0, HighlightKind::PlayerPosition);

    if !mode.in_combat {
        return;
    }
    match mode.targeting {
        TargetingMode::Move => {
            let blocked = occupied_positions(&entities, Some(&player_data.id));
            let reachable =
                pathfinding::reachable_tiles(player_pos.0, &grid, &blocked, config.move_range);
            for pos in reachable {
                grid.set_highlight(pos, HighlightKind::ValidMovement);
            }
        }
        TargetingMode::Attack => {
            for pos in attack_range_tiles(player_pos.0, config.attack_range, &grid) {
                grid.set_highlight(pos, HighlightKind::AttackRange);
            }
        }
        TargetingMode::Area => {
            if let Some(center) = *last_hover {
                if let Some(footprint) = blast.footprint(center) {
                    for pos in footprint {
                        if grid.in_bounds(pos) {
                            grid.set_highlight(pos, HighlightKind::AoePreview);
                        }
                    }
                }
            }
        }
        TargetingMode::Item | TargetingMode::None => {}
    }
}

/// Apply the imperative combat control surface. Unknown ids fail soft:
/// the request's completion resolves immediately and nothing animates.
pub fn handle_combat_commands(
    mut commands: Commands,
    grid: Res<MapGrid>,
    index: Res<EntityIndex>,
    mut events: EventReader<CombatCommand>,
    mut pending: ResMut<PendingHits>,
    mut launch: EventWriter<LaunchProjectile>,
    mut finished: EventWriter<TimelineFinished>,
    mut entities: Query<(
        &mut MapEntity,
        &mut GridPosition,
        &mut AnimationTimeline,
        &mut Visual,
    )>,
) {
    for command in events.read() {
        match command {
            CombatCommand::AnimateMove { id, target } => {
                let Some(entity) = index.get(id) else {
                    resolve_missing(&mut finished, id, TimelineKind::Moving);
                    continue;
                };
                let blocked: HashSet<GridPos> = entities
                    .iter()
                    .filter(|(e, _, _, _)| e.id != *id)
                    .map(|(_, p, _, _)| p.0)
                    .collect();
                let Ok((_, position, _, _)) = entities.get(entity) else {
                    continue;
                };
                match pathfinding::find_path(position.0, *target, &grid, &blocked, false) {
                    Some(path) if path.len() > 1 => {
                        commands.entity(entity).insert(PathFollow::from_path(&path));
                    }
                    _ => resolve_missing(&mut finished, id, TimelineKind::Moving),
                }
            }
            CombatCommand::AnimateAttack {
                attacker_id,
                target_id,
                damage,
                ranged,
            } => {
                let (Some(attacker), Some(target)) =
                    (index.get(attacker_id), index.get(target_id))
                else {
                    resolve_missing(&mut finished, attacker_id, TimelineKind::Attacking);
                    continue;
                };
                let Ok((_, target_pos, _, _)) = entities.get(target) else {
                    continue;
                };
                let target_tile = target_pos.0;
                let Ok((mut map_entity, position, mut timeline, mut visual)) =
                    entities.get_mut(attacker)
                else {
                    continue;
                };
                if *ranged {
                    let token = pending.allocate(target_id.clone(), *damage);
                    launch.send(LaunchProjectile {
                        from: position.0.center(),
                        to: target_tile.center(),
                        color: Rgba::SOFT_BLUE,
                        token,
                    });
                } else {
                    drop_pending_melee(&mut pending, attacker_id, &timeline);
                    let accepted = request_timeline(
                        &mut timeline,
                        &mut visual,
                        &mut map_entity,
                        TimelineState::attacking(position.0, target_tile, target_id.clone()),
                        &mut finished,
                    );
                    if accepted {
                        pending
                            .melee
                            .insert((attacker_id.clone(), target_id.clone()), *damage);
                    }
                }
            }
            CombatCommand::PlayDeath { id } => {
                start_on(
                    &index,
                    &mut entities,
                    &mut pending,
                    id,
                    TimelineState::death(),
                    &mut finished,
                );
            }
            CombatCommand::PlayIncapacitation { id } => {
                start_on(
                    &index,
                    &mut entities,
                    &mut pending,
                    id,
                    TimelineState::incapacitation(),
                    &mut finished,
                );
            }
            CombatCommand::PlayRevival { id } => {
                start_on(
                    &index,
                    &mut entities,
                    &mut pending,
                    id,
                    TimelineState::revival(),
                    &mut finished,
                );
            }
            CombatCommand::ShowDamageNumber { id, value } => {
                if let Some(position) = lookup(&index, &entities, id) {
                    commands.spawn(FloatingText::damage(position, *value));
                }
            }
            CombatCommand::ShowMissIndicator { id } => {
                if let Some(position) = lookup(&index, &entities, id) {
                    commands.spawn(FloatingText::miss(position));
                }
            }
        }
    }
}

/// A cancelled attack must not leave its deferred melee hit behind: a
/// later apex for the same attacker/target pair would land stale damage.
fn drop_pending_melee(pending: &mut PendingHits, attacker_id: &str, timeline: &AnimationTimeline) {
    if let TimelineState::Attacking { target_id, .. } = &timeline.state {
        pending
            .melee
            .remove(&(attacker_id.to_string(), target_id.clone()));
    }
}

fn resolve_missing(finished: &mut EventWriter<TimelineFinished>, id: &str, kind: TimelineKind) {
    debug!("{kind:?} request for unknown or unreachable entity '{id}'");
    finished.send(TimelineFinished {
        entity_id: id.to_string(),
        kind,
        completed: false,
    });
}

fn lookup(
    index: &EntityIndex,
    entities: &Query<(
        &mut MapEntity,
        &mut GridPosition,
        &mut AnimationTimeline,
        &mut Visual,
    )>,
    id: &str,
) -> Option<GridPos> {
    let entity = index.get(id)?;
    let (_, position, _, _) = entities.get(entity).ok()?;
    Some(position.0)
}

fn start_on(
    index: &EntityIndex,
    entities: &mut Query<(
        &mut MapEntity,
        &mut GridPosition,
        &mut AnimationTimeline,
        &mut Visual,
    )>,
    pending: &mut PendingHits,
    id: &str,
    state: TimelineState,
    finished: &mut EventWriter<TimelineFinished>,
) {
    let kind = state.kind();
    let Some(entity) = index.get(id) else {
        resolve_missing(finished, id, kind);
        return;
    };
    let Ok((mut map_entity, _, mut timeline, mut visual)) = entities.get_mut(entity) else {
        resolve_missing(finished, id, kind);
        return;
    };
    drop_pending_melee(pending, id, &timeline);
    request_timeline(&mut timeline, &mut visual, &mut map_entity, state, finished);
}

/// Apply deferred damage when an attack reaches its hook point.
pub fn resolve_attack_hits(
    mut commands: Commands,
    index: Res<EntityIndex>,
    mut pending: ResMut<PendingHits>,
    mut apex: EventReader<AttackApex>,
    mut arrived: EventReader<ProjectileArrived>,
    mut pool: ResMut<ParticlePool>,
    mut rng: ResMut<EffectRng>,
    mut entities: Query<(&mut MapEntity, &GridPosition)>,
) {
    for hit in apex.read() {
        let key = (hit.attacker_id.clone(), hit.target_id.clone());
        let Some(damage) = pending.melee.remove(&key) else {
            continue;
        };
        apply_hit(
            &mut commands,
            &index,
            &mut entities,
            &hit.target_id,
            damage,
            &mut pool,
            &mut rng,
            None,
        );
    }
    for arrival in arrived.read() {
        let Some(hit) = pending.ranged.remove(&arrival.token) else {
            continue;
        };
        apply_hit(
            &mut commands,
            &index,
            &mut entities,
            &hit.target_id,
            hit.damage,
            &mut pool,
            &mut rng,
            Some(arrival.position),
        );
    }
}

#[allow(clippy::too_many_arguments)]
fn apply_hit(
    commands: &mut Commands,
    index: &EntityIndex,
    entities: &mut Query<(&mut MapEntity, &GridPosition)>,
    target_id: &str,
    damage: i32,
    pool: &mut ParticlePool,
    rng: &mut EffectRng,
    fallback_position: Option<Vec2>,
) {
    let target = index.get(target_id);
    let Some((mut entity, position)) = target.and_then(|t| entities.get_mut(t).ok()) else {
        // Target vanished mid-flight: play the impact where it landed.
        if let Some(position) = fallback_position {
            pool.emit_burst(&BurstConfig::impact(position), &mut rng.0);
        }
        return;
    };
    entity.current_hp = (entity.current_hp - damage).max(0);
    pool.emit_burst(&BurstConfig::impact(position.0.center()), &mut rng.0);
    commands.spawn(FloatingText::damage(position.0, damage));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attack_range_ring() {
        let grid = MapGrid::new("room", 9, 9, &[], vec![]);
        let tiles = attack_range_tiles(GridPos::new(4, 4), 1, &grid);
        assert_eq!(tiles.len(), 8);
        let tiles2 = attack_range_tiles(GridPos::new(4, 4), 2, &grid);
        assert_eq!(tiles2.len(), 24);
    }

    #[test]
    fn test_attack_range_clipped_at_edges() {
        let grid = MapGrid::new("room", 9, 9, &[], vec![]);
        let tiles = attack_range_tiles(GridPos::new(0, 0), 1, &grid);
        assert_eq!(tiles.len(), 3);
    }

    #[test]
    fn test_blast_pattern_roundtrip() {
        let mut blast = BlastPattern::default();
        assert!(blast.footprint(GridPos::new(0, 0)).is_none());
        blast.set(|center| {
            center
                .neighbors8()
                .into_iter()
                .chain(std::iter::once(center))
                .collect()
        });
        let footprint = blast.footprint(GridPos::new(4, 4)).unwrap();
        assert_eq!(footprint.len(), 9);
        blast.clear();
        assert!(blast.footprint(GridPos::new(4, 4)).is_none());
    }

    #[test]
    fn test_path_follow_skips_start() {
        let path = [GridPos::new(0, 0), GridPos::new(1, 1), GridPos::new(2, 2)];
        let follow = PathFollow::from_path(&path);
        assert_eq!(follow.steps.len(), 2);
        assert_eq!(follow.steps[0], GridPos::new(1, 1));
    }

    #[test]
    fn test_pending_hits_tokens_unique() {
        let mut pending = PendingHits::default();
        let a = pending.allocate("x".into(), 3);
        let b = pending.allocate("y".into(), 4);
        assert_ne!(a, b);
        assert_eq!(pending.ranged.len(), 2);
    }

    #[test]
    fn test_cancelled_attack_drops_pending_melee() {
        let mut pending = PendingHits::default();
        pending.melee.insert(("hero".into(), "gob".into()), 5);
        let timeline = AnimationTimeline {
            state: TimelineState::attacking(GridPos::new(0, 0), GridPos::new(1, 0), "gob".into()),
            idle_phase: 0.0,
        };
        drop_pending_melee(&mut pending, "hero", &timeline);
        assert!(pending.melee.is_empty());

        // An idle timeline has no hit to drop.
        pending.melee.insert(("hero".into(), "gob".into()), 5);
        drop_pending_melee(&mut pending, "hero", &AnimationTimeline::default());
        assert_eq!(pending.melee.len(), 1);

        // Another attacker's hit is untouched.
        pending.melee.insert(("other".into(), "gob".into()), 2);
        drop_pending_melee(&mut pending, "hero", &timeline);
        assert_eq!(pending.melee.len(), 1);
        assert!(pending
            .melee
            .contains_key(&("other".to_string(), "gob".to_string())));
    }

    #[test]
    fn test_clear_drops_every_deferred_hit() {
        let mut pending = PendingHits::default();
        pending.allocate("gob".into(), 3);
        pending.melee.insert(("hero".into(), "gob".into()), 5);
        pending.clear();
        assert!(pending.ranged.is_empty());
        assert!(pending.melee.is_empty());
        // Tokens stay unique across a clear.
        assert_eq!(pending.allocate("gob".into(), 3), 1);
    }
}
