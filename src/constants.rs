//! Centralized engine constants.
//!
//! Eliminates magic numbers duplicated across the timeline scheduler,
//! particle system, and mode controller. Per-module tunables that only one
//! module reads (placement scan order, BFS offsets) stay in their modules.

// =====================================================
// Animation Timelines
// =====================================================

/// Entrance ramp-in duration in seconds
pub const ENTRANCE_SECS: f32 = 0.45;

/// Single-tile movement step duration in seconds
pub const MOVE_STEP_SECS: f32 = 0.28;

/// Peak height of the movement hop arc, in tile units
pub const MOVE_HOP_HEIGHT: f32 = 0.25;

/// Full attack lunge duration (out + return) in seconds
pub const ATTACK_SECS: f32 = 0.36;

/// Fraction of the attack duration spent lunging toward the target;
/// the apex (hit point) sits at this fraction
pub const ATTACK_APEX_FRACTION: f32 = 0.4;

/// Distance of the attack lunge, in tile units
pub const ATTACK_LUNGE_DISTANCE: f32 = 0.6;

/// Death jitter phase duration in seconds
pub const DEATH_JITTER_SECS: f32 = 0.5;

/// Death fade+shrink phase duration in seconds
pub const DEATH_FADE_SECS: f32 = 0.6;

/// Positional jitter amplitude during the death convulsion, in tile units
pub const DEATH_JITTER_AMPLITUDE: f32 = 0.08;

/// Incapacitation topple duration in seconds
pub const INCAPACITATION_SECS: f32 = 0.6;

/// Revival (reverse topple + glow sweep) duration in seconds
pub const REVIVAL_SECS: f32 = 0.7;

/// Saturation floor while incapacitated (1.0 = full color)
pub const INCAPACITATED_SATURATION: f32 = 0.3;

/// Idle bob amplitude in tile units
pub const IDLE_BOB_AMPLITUDE: f32 = 0.04;

/// Idle bob angular speed in radians per second
pub const IDLE_BOB_SPEED: f32 = 3.2;

// =====================================================
// Particles & Projectiles
// =====================================================

/// Default particle pool capacity
pub const DEFAULT_PARTICLE_POOL_SIZE: usize = 192;

/// Projectile travel speed in tiles per second
pub const PROJECTILE_SPEED: f32 = 14.0;

/// Minimum projectile travel time, so point-blank shots still render
pub const PROJECTILE_MIN_SECS: f32 = 0.08;

/// Seconds between trail particle emissions while a projectile travels
pub const PROJECTILE_TRAIL_INTERVAL: f32 = 0.025;

/// Default gravity applied to burst particles, tile units per second^2
pub const PARTICLE_GRAVITY: f32 = 2.4;

// =====================================================
// Indicators
// =====================================================

/// Floating combat text lifetime in seconds
pub const FLOATING_TEXT_SECS: f32 = 0.9;

/// Total rise of floating combat text over its lifetime, in tile units
pub const FLOATING_TEXT_RISE: f32 = 0.8;

// =====================================================
// Viewport
// =====================================================

/// Default minimum zoom scale
pub const DEFAULT_MIN_ZOOM: f32 = 0.5;

/// Default initial zoom scale
pub const DEFAULT_ZOOM: f32 = 1.0;

/// Default maximum zoom scale
pub const DEFAULT_MAX_ZOOM: f32 = 2.5;

/// Default zoom step per wheel notch
pub const DEFAULT_ZOOM_STEP: f32 = 0.25;

/// Minimum fraction of the scaled content that must stay on screen
pub const DEFAULT_MIN_VISIBLE_FRACTION: f32 = 0.1;

// =====================================================
// Combat Ranges
// =====================================================

/// Default movement range (tiles) for the combat Move targeting overlay
pub const DEFAULT_MOVE_RANGE: u32 = 4;

/// Default attack range (Chebyshev tiles) for the Attack targeting overlay
pub const DEFAULT_ATTACK_RANGE: u32 = 1;
