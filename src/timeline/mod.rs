//! Per-entity animation timeline scheduler.
//!
//! Each map entity owns exactly one `AnimationTimeline`, a tagged-union
//! state machine advanced by wall-clock delta so playback is frame-rate
//! independent. The scheduler writes the `Visual` capability surface
//! (offset/scale/alpha/rotation/tint) that the render backend consumes.
//!
//! Invariants:
//! - `Death`, `Incapacitation`, `Revival` are never pre-empted; conflicting
//!   requests are dropped (their completion still resolves immediately).
//! - Every request resolves a `TimelineFinished` exactly once, including
//!   cancellations and entity teardown mid-timeline.
//! - A new `Moving`/`Attacking` request cancels an in-flight
//!   `Moving`/`Attacking`, resolving the old completion first.

pub mod easing;

use std::f32::consts::PI;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::color::Rgba;
use crate::constants::*;
use crate::grid::{GridPos, GridPosition, MapEntity};
use crate::particles::{BurstConfig, DirectionalConfig, EffectRng, ParticlePool};

pub struct TimelinePlugin;

impl Plugin for TimelinePlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<TimelineFinished>().add_event::<AttackApex>();
    }
}

// =====================================================
// Capability surface
// =====================================================

/// Render-facing transform and tint state. The scheduler is the only
/// writer; the backend reads it each frame. `offset` is in tile units
/// relative to the entity's logical tile (y grows downward, so the hop
/// arc subtracts).
#[derive(Component, Debug, Clone, PartialEq)]
pub struct Visual {
    pub offset: Vec2,
    pub scale: f32,
    pub alpha: f32,
    pub rotation: f32,
    pub tint: Rgba,
    pub saturation: f32,
    pub interactive: bool,
}

impl Default for Visual {
    fn default() -> Self {
        Self {
            offset: Vec2::ZERO,
            scale: 1.0,
            alpha: 1.0,
            rotation: 0.0,
            tint: Rgba::WHITE,
            saturation: 1.0,
            interactive: true,
        }
    }
}

// =====================================================
// Timeline states
// =====================================================

/// Discriminant of a timeline state, used in events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimelineKind {
    Idle,
    Entrance,
    Moving,
    Attacking,
    Death,
    Incapacitation,
    Revival,
}

/// Active timeline state with per-state progress.
#[derive(Debug, Clone, PartialEq)]
pub enum TimelineState {
    Idle,
    Entrance {
        elapsed: f32,
    },
    Moving {
        from: GridPos,
        to: GridPos,
        elapsed: f32,
    },
    Attacking {
        origin: GridPos,
        target: GridPos,
        target_id: String,
        elapsed: f32,
        apex_fired: bool,
    },
    Death {
        elapsed: f32,
        burst_fired: bool,
    },
    Incapacitation {
        elapsed: f32,
    },
    Revival {
        elapsed: f32,
        sparks_fired: bool,
    },
}

impl TimelineState {
    pub fn kind(&self) -> TimelineKind {
        match self {
            TimelineState::Idle => TimelineKind::Idle,
            TimelineState::Entrance { .. } => TimelineKind::Entrance,
            TimelineState::Moving { .. } => TimelineKind::Moving,
            TimelineState::Attacking { .. } => TimelineKind::Attacking,
            TimelineState::Death { .. } => TimelineKind::Death,
            TimelineState::Incapacitation { .. } => TimelineKind::Incapacitation,
            TimelineState::Revival { .. } => TimelineKind::Revival,
        }
    }

    pub fn entrance() -> Self {
        TimelineState::Entrance { elapsed: 0.0 }
    }

    pub fn moving(from: GridPos, to: GridPos) -> Self {
        TimelineState::Moving {
            from,
            to,
            elapsed: 0.0,
        }
    }

    pub fn attacking(origin: GridPos, target: GridPos, target_id: String) -> Self {
        TimelineState::Attacking {
            origin,
            target,
            target_id,
            elapsed: 0.0,
            apex_fired: false,
        }
    }

    pub fn death() -> Self {
        TimelineState::Death {
            elapsed: 0.0,
            burst_fired: false,
        }
    }

    pub fn incapacitation() -> Self {
        TimelineState::Incapacitation { elapsed: 0.0 }
    }

    pub fn revival() -> Self {
        TimelineState::Revival {
            elapsed: 0.0,
            sparks_fired: false,
        }
    }
}

/// One timeline per entity. `idle_phase` persists across states so the
/// bob does not snap when a timeline finishes.
#[derive(Component, Debug, Clone)]
pub struct AnimationTimeline {
    pub state: TimelineState,
    pub idle_phase: f32,
}

impl Default for AnimationTimeline {
    fn default() -> Self {
        Self {
            state: TimelineState::Idle,
            idle_phase: 0.0,
        }
    }
}

impl AnimationTimeline {
    /// The running non-idle state, if any.
    pub fn running_kind(&self) -> Option<TimelineKind> {
        match self.state.kind() {
            TimelineKind::Idle => None,
            kind => Some(kind),
        }
    }

    /// Terminal and near-terminal states complete before any override.
    pub fn is_terminal_running(&self) -> bool {
        matches!(
            self.state.kind(),
            TimelineKind::Death | TimelineKind::Incapacitation | TimelineKind::Revival
        )
    }
}

// =====================================================
// Completion events
// =====================================================

/// Resolved exactly once per timeline request. `completed` is true only
/// when the animation ran to its natural end; drops, cancellations, and
/// teardown resolve with `completed = false`.
#[derive(Event, Debug, Clone, PartialEq)]
pub struct TimelineFinished {
    pub entity_id: String,
    pub kind: TimelineKind,
    pub completed: bool,
}

/// Fired exactly once at the apex of an attack lunge, before the return
/// phase. Damage application and impact effects hook here.
#[derive(Event, Debug, Clone)]
pub struct AttackApex {
    pub attacker_id: String,
    pub target_id: String,
}

// =====================================================
// Requests
// =====================================================

/// Try to start a timeline on an entity, honoring pre-emption rules.
///
/// Returns true when the new state was installed. When the request is
/// dropped (terminal state running, or revival of a non-incapacitated
/// entity) its completion resolves immediately with `completed = false`
/// so callers never wait.
pub fn request_timeline(
    timeline: &mut AnimationTimeline,
    visual: &mut Visual,
    entity: &mut MapEntity,
    new_state: TimelineState,
    finished: &mut EventWriter<TimelineFinished>,
) -> bool {
    let kind = new_state.kind();

    if timeline.is_terminal_running() {
        finished.send(TimelineFinished {
            entity_id: entity.id.clone(),
            kind,
            completed: false,
        });
        return false;
    }

    if kind == TimelineKind::Revival && !entity.is_incapacitated {
        warn!("revival requested for upright entity '{}'", entity.id);
        finished.send(TimelineFinished {
            entity_id: entity.id.clone(),
            kind,
            completed: false,
        });
        return false;
    }

    // Cancel an in-flight moving/attacking timeline, resolving its
    // completion before the replacement starts.
    if let Some(running) = timeline.running_kind() {
        finished.send(TimelineFinished {
            entity_id: entity.id.clone(),
            kind: running,
            completed: false,
        });
        visual.offset = Vec2::ZERO;
    }

    // On-entry side effects.
    match kind {
        TimelineKind::Entrance => {
            visual.scale = 0.0;
            visual.alpha = 0.0;
        }
        TimelineKind::Death => {
            entity.is_dead = true;
            visual.interactive = false;
        }
        TimelineKind::Incapacitation => {
            entity.is_incapacitated = true;
            visual.interactive = false;
        }
        _ => {}
    }

    timeline.state = new_state;
    true
}

// =====================================================
// Advance
// =====================================================

/// Advance every timeline by the frame delta, writing visuals and
/// resolving completions. Idle bobbing runs only while no other state is
/// active and the entity is upright and alive.
pub fn advance_timelines(
    time: Res<Time>,
    mut pool: ResMut<ParticlePool>,
    mut rng: ResMut<EffectRng>,
    mut apex_events: EventWriter<AttackApex>,
    mut finished: EventWriter<TimelineFinished>,
    mut query: Query<(
        &mut MapEntity,
        &GridPosition,
        &mut AnimationTimeline,
        &mut Visual,
    )>,
) {
    let dt = time.delta_secs();
    for (mut entity, position, mut timeline, mut visual) in &mut query {
        let mut done = false;
        match &mut timeline.state {
            TimelineState::Idle => {
                if !entity.is_dead && !entity.is_incapacitated {
                    timeline.idle_phase += dt * IDLE_BOB_SPEED;
                    visual.offset = Vec2::new(0.0, -IDLE_BOB_AMPLITUDE * timeline.idle_phase.sin());
                }
            }
            TimelineState::Entrance { elapsed } => {
                *elapsed += dt;
                let t = (*elapsed / ENTRANCE_SECS).min(1.0);
                visual.scale = easing::ease_out_back(t);
                visual.alpha = easing::ease_out_quad(t);
                if *elapsed >= ENTRANCE_SECS {
                    visual.scale = 1.0;
                    visual.alpha = 1.0;
                    done = true;
                }
            }
            TimelineState::Moving { from, to, elapsed } => {
                *elapsed += dt;
                let t = (*elapsed / MOVE_STEP_SECS).min(1.0);
                let eased = easing::ease_in_out_quad(t);
                // Logical position is already `to`; the visual walks the
                // remaining offset down to zero with a hop arc on top.
                let back = Vec2::new((from.x - to.x) as f32, (from.y - to.y) as f32);
                visual.offset = back * (1.0 - eased)
                    + Vec2::new(0.0, -MOVE_HOP_HEIGHT * (PI * t).sin());
                if *elapsed >= MOVE_STEP_SECS {
                    visual.offset = Vec2::ZERO;
                    done = true;
                }
            }
            TimelineState::Attacking {
                origin,
                target,
                target_id,
                elapsed,
                apex_fired,
            } => {
                *elapsed += dt;
                let t = (*elapsed / ATTACK_SECS).min(1.0);
                let dir = (target.center() - origin.center()).normalize_or_zero();
                let reach = if t < ATTACK_APEX_FRACTION {
                    easing::ease_out_quad(t / ATTACK_APEX_FRACTION)
                } else {
                    1.0 - easing::ease_in_out_quad(
                        (t - ATTACK_APEX_FRACTION) / (1.0 - ATTACK_APEX_FRACTION),
                    )
                };
                visual.offset = dir * ATTACK_LUNGE_DISTANCE * reach;
                if t >= ATTACK_APEX_FRACTION && !*apex_fired {
                    *apex_fired = true;
                    apex_events.send(AttackApex {
                        attacker_id: entity.id.clone(),
                        target_id: target_id.clone(),
                    });
                }
                if *elapsed >= ATTACK_SECS {
                    visual.offset = Vec2::ZERO;
                    done = true;
                }
            }
            TimelineState::Death {
                elapsed,
                burst_fired,
            } => {
                *elapsed += dt;
                if *elapsed < DEATH_JITTER_SECS {
                    let t = *elapsed / DEATH_JITTER_SECS;
                    visual.offset = Vec2::new(
                        rng.range(-DEATH_JITTER_AMPLITUDE, DEATH_JITTER_AMPLITUDE),
                        rng.range(-DEATH_JITTER_AMPLITUDE, DEATH_JITTER_AMPLITUDE),
                    );
                    visual.tint = Rgba::WHITE.lerp(Rgba::RED, 0.5 + 0.5 * (t * 24.0).sin());
                } else {
                    if !*burst_fired {
                        *burst_fired = true;
                        visual.offset = Vec2::ZERO;
                        pool.emit_burst(&BurstConfig::death(position.0.center()), &mut rng.0);
                    }
                    let t = ((*elapsed - DEATH_JITTER_SECS) / DEATH_FADE_SECS).min(1.0);
                    let fade = 1.0 - easing::ease_out_quad(t);
                    visual.alpha = fade;
                    visual.scale = 0.2 + 0.8 * fade;
                    visual.tint = Rgba::RED.lerp(Rgba::WHITE, t);
                }
                if *elapsed >= DEATH_JITTER_SECS + DEATH_FADE_SECS {
                    visual.alpha = 0.0;
                    visual.scale = 0.2;
                    done = true;
                }
            }
            TimelineState::Incapacitation { elapsed } => {
                *elapsed += dt;
                let t = (*elapsed / INCAPACITATION_SECS).min(1.0);
                let eased = easing::ease_out_bounce(t);
                visual.rotation = -(PI / 2.0) * eased;
                visual.saturation = 1.0 - (1.0 - INCAPACITATED_SATURATION) * t;
                if *elapsed >= INCAPACITATION_SECS {
                    visual.rotation = -(PI / 2.0);
                    visual.saturation = INCAPACITATED_SATURATION;
                    done = true;
                }
            }
            TimelineState::Revival {
                elapsed,
                sparks_fired,
            } => {
                *elapsed += dt;
                let t = (*elapsed / REVIVAL_SECS).min(1.0);
                let eased = easing::ease_in_out_quad(t);
                visual.rotation = -(PI / 2.0) * (1.0 - eased);
                visual.saturation = INCAPACITATED_SATURATION + (1.0 - INCAPACITATED_SATURATION) * t;
                // Glow sweep peaks mid-timeline, fading back to neutral.
                visual.tint = Rgba::WHITE.lerp(Rgba::GOLD, (PI * t).sin());
                if t >= 0.5 && !*sparks_fired {
                    *sparks_fired = true;
                    pool.emit_directional(
                        &DirectionalConfig::revival(position.0.center()),
                        &mut rng.0,
                    );
                }
                if *elapsed >= REVIVAL_SECS {
                    visual.rotation = 0.0;
                    visual.saturation = 1.0;
                    visual.alpha = 1.0;
                    visual.tint = Rgba::WHITE;
                    visual.interactive = true;
                    entity.is_incapacitated = false;
                    done = true;
                }
            }
        }

        if done {
            let kind = timeline.state.kind();
            timeline.state = TimelineState::Idle;
            finished.send(TimelineFinished {
                entity_id: entity.id.clone(),
                kind,
                completed: true,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{Allegiance, PortraitHandle};

    fn entity(id: &str) -> MapEntity {
        MapEntity {
            id: id.into(),
            name: id.into(),
            level: 1,
            allegiance: Allegiance::Hostile,
            current_hp: 10,
            max_hp: 10,
            portrait: PortraitHandle::default(),
            is_bonded: false,
            is_captured: false,
            is_dead: false,
            is_incapacitated: false,
        }
    }

    /// Harness: collect TimelineFinished events from a request.
    fn request_collect(
        timeline: &mut AnimationTimeline,
        visual: &mut Visual,
        entity: &mut MapEntity,
        state: TimelineState,
    ) -> (bool, Vec<TimelineFinished>) {
        let mut world = World::new();
        world.init_resource::<Events<TimelineFinished>>();
        let accepted;
        {
            let mut system_state: bevy::ecs::system::SystemState<EventWriter<TimelineFinished>> =
                bevy::ecs::system::SystemState::new(&mut world);
            let mut writer = system_state.get_mut(&mut world);
            accepted = request_timeline(timeline, visual, entity, state, &mut writer);
        }
        let events = world
            .resource_mut::<Events<TimelineFinished>>()
            .drain()
            .collect();
        (accepted, events)
    }

    #[test]
    fn test_death_cannot_be_preempted() {
        let mut timeline = AnimationTimeline::default();
        let mut visual = Visual::default();
        let mut e = entity("goblin_1");

        let (accepted, _) =
            request_collect(&mut timeline, &mut visual, &mut e, TimelineState::death());
        assert!(accepted);
        assert_eq!(timeline.state.kind(), TimelineKind::Death);

        let (accepted, events) = request_collect(
            &mut timeline,
            &mut visual,
            &mut e,
            TimelineState::moving(GridPos::new(0, 0), GridPos::new(1, 0)),
        );
        assert!(!accepted);
        assert_eq!(timeline.state.kind(), TimelineKind::Death);
        // The dropped request still resolves, exactly once, uncompleted.
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, TimelineKind::Moving);
        assert!(!events[0].completed);
    }

    #[test]
    fn test_moving_replaced_resolves_old_first() {
        let mut timeline = AnimationTimeline::default();
        let mut visual = Visual::default();
        let mut e = entity("npc");

        request_collect(
            &mut timeline,
            &mut visual,
            &mut e,
            TimelineState::moving(GridPos::new(0, 0), GridPos::new(1, 0)),
        );
        let (accepted, events) = request_collect(
            &mut timeline,
            &mut visual,
            &mut e,
            TimelineState::moving(GridPos::new(1, 0), GridPos::new(1, 1)),
        );
        assert!(accepted);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, TimelineKind::Moving);
        assert!(!events[0].completed);
    }

    #[test]
    fn test_revival_requires_incapacitation() {
        let mut timeline = AnimationTimeline::default();
        let mut visual = Visual::default();
        let mut e = entity("npc");

        let (accepted, events) = request_collect(
            &mut timeline,
            &mut visual,
            &mut e,
            TimelineState::revival(),
        );
        assert!(!accepted);
        assert_eq!(events.len(), 1);
        assert!(!events[0].completed);
    }

    #[test]
    fn test_death_entry_disables_interaction() {
        let mut timeline = AnimationTimeline::default();
        let mut visual = Visual::default();
        let mut e = entity("npc");
        request_collect(&mut timeline, &mut visual, &mut e, TimelineState::death());
        assert!(!visual.interactive);
        assert!(e.is_dead);
    }

    #[test]
    fn test_incapacitation_entry_flags() {
        let mut timeline = AnimationTimeline::default();
        let mut visual = Visual::default();
        let mut e = entity("npc");
        request_collect(
            &mut timeline,
            &mut visual,
            &mut e,
            TimelineState::incapacitation(),
        );
        assert!(!visual.interactive);
        assert!(e.is_incapacitated);
        assert_eq!(timeline.state.kind(), TimelineKind::Incapacitation);
    }
}
