//! Pooled particle effects and traveling projectiles.
//!
//! Particles come from a fixed-size pool with an O(1) free list; when the
//! pool is exhausted, extra spawn requests are silently dropped — bounded
//! memory is a hard requirement, the pool never grows. Projectiles are
//! ordinary ECS entities (low cardinality, one per attack) that feed their
//! trails through the same pool and announce arrival with an event.
//!
//! All positions are in tile-space units; the render backend applies tile
//! size and the viewport transform.

use bevy::prelude::*;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256StarStar;

use crate::color::Rgba;
use crate::constants::*;

pub struct ParticlesPlugin;

impl Plugin for ParticlesPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<EmitBurst>()
            .add_event::<EmitDirectional>()
            .add_event::<LaunchProjectile>()
            .add_event::<ProjectileArrived>();
    }
}

// =====================================================
// Deterministic effect RNG
// =====================================================

/// Seeded RNG for all visual jitter, so effect playback is reproducible
/// in tests and replays.
#[derive(Resource, Debug)]
pub struct EffectRng(pub Xoshiro256StarStar);

impl EffectRng {
    pub fn from_seed(seed: u64) -> Self {
        Self(Xoshiro256StarStar::seed_from_u64(seed))
    }

    pub fn range(&mut self, lo: f32, hi: f32) -> f32 {
        if lo >= hi {
            return lo;
        }
        self.0.gen_range(lo..hi)
    }
}

impl Default for EffectRng {
    fn default() -> Self {
        Self::from_seed(0)
    }
}

// =====================================================
// Particles
// =====================================================

#[derive(Debug, Clone)]
pub struct Particle {
    pub position: Vec2,
    pub velocity: Vec2,
    pub color: Rgba,
    pub size: f32,
    base_size: f32,
    pub lifetime: f32,
    pub max_lifetime: f32,
    pub gravity: f32,
    pub fade: bool,
    pub shrink: bool,
    active: bool,
}

impl Particle {
    fn inactive() -> Self {
        Self {
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            color: Rgba::WHITE,
            size: 0.0,
            base_size: 0.0,
            lifetime: 0.0,
            max_lifetime: 1.0,
            gravity: 0.0,
            fade: true,
            shrink: true,
            active: false,
        }
    }

    /// Remaining-lifetime ratio in `[0, 1]`.
    pub fn life_ratio(&self) -> f32 {
        (self.lifetime / self.max_lifetime).clamp(0.0, 1.0)
    }
}

/// Spawn parameters for a radial burst.
#[derive(Debug, Clone)]
pub struct BurstConfig {
    pub origin: Vec2,
    pub count: usize,
    pub color: Rgba,
    pub speed: (f32, f32),
    pub lifetime: (f32, f32),
    pub size: (f32, f32),
    pub gravity: f32,
    pub fade: bool,
    pub shrink: bool,
}

impl BurstConfig {
    /// Burst played between the death jitter and fade phases.
    pub fn death(origin: Vec2) -> Self {
        Self {
            origin,
            count: 24,
            color: Rgba::RED,
            speed: (1.5, 4.0),
            lifetime: (0.3, 0.7),
            size: (0.04, 0.1),
            gravity: PARTICLE_GRAVITY,
            fade: true,
            shrink: true,
        }
    }

    /// Impact puff on attack apex or projectile arrival.
    pub fn impact(origin: Vec2) -> Self {
        Self {
            origin,
            count: 12,
            color: Rgba::GOLD,
            speed: (1.0, 3.0),
            lifetime: (0.2, 0.4),
            size: (0.03, 0.07),
            gravity: PARTICLE_GRAVITY * 0.5,
            fade: true,
            shrink: true,
        }
    }
}

/// Spawn parameters for a cone spray around a direction.
#[derive(Debug, Clone)]
pub struct DirectionalConfig {
    pub origin: Vec2,
    pub direction: Vec2,
    /// Half-angle of the cone, radians.
    pub spread: f32,
    pub count: usize,
    pub color: Rgba,
    pub speed: (f32, f32),
    pub lifetime: (f32, f32),
    pub size: (f32, f32),
    pub gravity: f32,
    pub fade: bool,
    pub shrink: bool,
}

impl DirectionalConfig {
    /// Upward golden spray for the revival glow.
    pub fn revival(origin: Vec2) -> Self {
        Self {
            origin,
            direction: Vec2::new(0.0, -1.0),
            spread: 0.6,
            count: 18,
            color: Rgba::GOLD,
            speed: (1.0, 2.5),
            lifetime: (0.4, 0.8),
            size: (0.03, 0.08),
            gravity: PARTICLE_GRAVITY * 0.3,
            fade: true,
            shrink: false,
        }
    }
}

/// Fixed-capacity pool. Slots are pre-allocated once; acquire/release are
/// free-list pushes and pops.
#[derive(Resource, Debug)]
pub struct ParticlePool {
    slots: Vec<Particle>,
    free: Vec<usize>,
}

impl Default for ParticlePool {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_PARTICLE_POOL_SIZE)
    }
}

impl ParticlePool {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: vec![Particle::inactive(); capacity],
            free: (0..capacity).rev().collect(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn active_count(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn active(&self) -> impl Iterator<Item = &Particle> {
        self.slots.iter().filter(|p| p.active)
    }

    fn acquire(&mut self) -> Option<usize> {
        self.free.pop()
    }

    fn activate(&mut self, index: usize, particle: Particle) {
        self.slots[index] = Particle {
            active: true,
            ..particle
        };
    }

    /// Radial burst; overflow beyond pool capacity is dropped.
    pub fn emit_burst(&mut self, cfg: &BurstConfig, rng: &mut Xoshiro256StarStar) {
        for _ in 0..cfg.count {
            let Some(index) = self.acquire() else {
                debug!("particle pool exhausted, dropping burst remainder");
                return;
            };
            let angle = rng.gen_range(0.0..std::f32::consts::TAU);
            let speed = rng.gen_range(cfg.speed.0..=cfg.speed.1);
            let lifetime = rng.gen_range(cfg.lifetime.0..=cfg.lifetime.1);
            let size = rng.gen_range(cfg.size.0..=cfg.size.1);
            self.activate(
                index,
                Particle {
                    position: cfg.origin,
                    velocity: Vec2::new(angle.cos(), angle.sin()) * speed,
                    color: cfg.color,
                    size,
                    base_size: size,
                    lifetime,
                    max_lifetime: lifetime,
                    gravity: cfg.gravity,
                    fade: cfg.fade,
                    shrink: cfg.shrink,
                    active: true,
                },
            );
        }
    }

    /// Cone spray around `cfg.direction`; overflow is dropped.
    pub fn emit_directional(&mut self, cfg: &DirectionalConfig, rng: &mut Xoshiro256StarStar) {
        let base = cfg.direction.normalize_or_zero();
        let base_angle = base.y.atan2(base.x);
        for _ in 0..cfg.count {
            let Some(index) = self.acquire() else {
                debug!("particle pool exhausted, dropping spray remainder");
                return;
            };
            let angle = base_angle + rng.gen_range(-cfg.spread..=cfg.spread);
            let speed = rng.gen_range(cfg.speed.0..=cfg.speed.1);
            let lifetime = rng.gen_range(cfg.lifetime.0..=cfg.lifetime.1);
            let size = rng.gen_range(cfg.size.0..=cfg.size.1);
            self.activate(
                index,
                Particle {
                    position: cfg.origin,
                    velocity: Vec2::new(angle.cos(), angle.sin()) * speed,
                    color: cfg.color,
                    size,
                    base_size: size,
                    lifetime,
                    max_lifetime: lifetime,
                    gravity: cfg.gravity,
                    fade: cfg.fade,
                    shrink: cfg.shrink,
                    active: true,
                },
            );
        }
    }

    /// Single trail particle, used by projectiles.
    pub fn emit_one(&mut self, position: Vec2, velocity: Vec2, color: Rgba, lifetime: f32, size: f32) {
        let Some(index) = self.acquire() else {
            return;
        };
        self.activate(
            index,
            Particle {
                position,
                velocity,
                color,
                size,
                base_size: size,
                lifetime,
                max_lifetime: lifetime,
                gravity: 0.0,
                fade: true,
                shrink: true,
                active: true,
            },
        );
    }

    /// Advance all live particles; expired slots go back on the free list.
    pub fn advance(&mut self, dt: f32) {
        for (index, particle) in self.slots.iter_mut().enumerate() {
            if !particle.active {
                continue;
            }
            particle.lifetime -= dt;
            if particle.lifetime <= 0.0 {
                particle.active = false;
                self.free.push(index);
                continue;
            }
            particle.velocity.y += particle.gravity * dt;
            let velocity = particle.velocity;
            particle.position += velocity * dt;
            let ratio = particle.life_ratio();
            if particle.fade {
                particle.color.a = ratio;
            }
            if particle.shrink {
                particle.size = particle.base_size * ratio;
            }
        }
    }
}

// =====================================================
// External emit surface
// =====================================================

/// External request for a radial burst.
#[derive(Event, Debug, Clone)]
pub struct EmitBurst(pub BurstConfig);

/// External request for a directional spray.
#[derive(Event, Debug, Clone)]
pub struct EmitDirectional(pub DirectionalConfig);

/// External request to launch a projectile. `token` is echoed back in
/// `ProjectileArrived` so the caller can sequence the impact.
#[derive(Event, Debug, Clone)]
pub struct LaunchProjectile {
    pub from: Vec2,
    pub to: Vec2,
    pub color: Rgba,
    pub token: u64,
}

/// Resolution of a `LaunchProjectile` request: the projectile reached its
/// target this tick.
#[derive(Event, Debug, Clone, PartialEq)]
pub struct ProjectileArrived {
    pub token: u64,
    pub position: Vec2,
}

/// A traveling projectile. Not pooled; trail particles go through the pool.
#[derive(Component, Debug)]
pub struct Projectile {
    pub from: Vec2,
    pub to: Vec2,
    pub elapsed: f32,
    pub duration: f32,
    pub color: Rgba,
    pub token: u64,
    trail_accum: f32,
}

impl Projectile {
    pub fn new(from: Vec2, to: Vec2, color: Rgba, token: u64) -> Self {
        let duration = (from.distance(to) / PROJECTILE_SPEED).max(PROJECTILE_MIN_SECS);
        Self {
            from,
            to,
            elapsed: 0.0,
            duration,
            color,
            token,
            trail_accum: 0.0,
        }
    }

    pub fn position(&self) -> Vec2 {
        self.from.lerp(self.to, (self.elapsed / self.duration).clamp(0.0, 1.0))
    }
}

/// Spawn projectiles requested by external emit events.
pub fn handle_launch_requests(mut commands: Commands, mut requests: EventReader<LaunchProjectile>) {
    for request in requests.read() {
        commands.spawn(Projectile::new(
            request.from,
            request.to,
            request.color,
            request.token,
        ));
    }
}

/// Apply external burst/spray requests to the pool.
pub fn handle_emit_requests(
    mut pool: ResMut<ParticlePool>,
    mut rng: ResMut<EffectRng>,
    mut bursts: EventReader<EmitBurst>,
    mut sprays: EventReader<EmitDirectional>,
) {
    for EmitBurst(cfg) in bursts.read() {
        pool.emit_burst(cfg, &mut rng.0);
    }
    for EmitDirectional(cfg) in sprays.read() {
        pool.emit_directional(cfg, &mut rng.0);
    }
}

/// Move projectiles, emit their trails, and resolve arrivals.
pub fn advance_projectiles(
    time: Res<Time>,
    mut commands: Commands,
    mut pool: ResMut<ParticlePool>,
    mut rng: ResMut<EffectRng>,
    mut arrived: EventWriter<ProjectileArrived>,
    mut projectiles: Query<(Entity, &mut Projectile)>,
) {
    let dt = time.delta_secs();
    for (entity, mut projectile) in &mut projectiles {
        projectile.elapsed += dt;
        projectile.trail_accum += dt;
        while projectile.trail_accum >= PROJECTILE_TRAIL_INTERVAL {
            projectile.trail_accum -= PROJECTILE_TRAIL_INTERVAL;
            let jitter = Vec2::new(rng.range(-0.04, 0.04), rng.range(-0.04, 0.04));
            let position = projectile.position() + jitter;
            let color = projectile.color;
            pool.emit_one(position, Vec2::ZERO, color, 0.25, 0.05);
        }
        if projectile.elapsed >= projectile.duration {
            arrived.send(ProjectileArrived {
                token: projectile.token,
                position: projectile.to,
            });
            commands.entity(entity).despawn();
        }
    }
}

/// Advance the pool by the frame delta.
pub fn advance_particles(time: Res<Time>, mut pool: ResMut<ParticlePool>) {
    pool.advance(time.delta_secs());
}
