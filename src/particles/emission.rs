//! Spawn generator and emission policies
//!
//! A particle is generated once per pool slot when an emitter is activated.
//! Afterwards, whenever its life runs out, the emitter's [`EmissionPolicy`]
//! decides how the slot is reinitialized:
//!
//! - `Normal` respawns at the emitter origin, forever.
//! - `Wide` respawns anywhere inside the configured spawn volume, forever.
//! - `Explosion` retires each particle once per burst and switches the
//!   emitter off when every slot has retired, until the burst is re-armed.

use std::f32::consts::TAU;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::constants::emitter::FULL_ROTATION_DEGREES;
use crate::particles::{EmitterConfig, Particle};

/// Rule set applied when a particle expires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EmissionPolicy {
    /// Perpetual stream from the emitter origin
    #[default]
    Normal,
    /// One-shot burst that goes quiet once every particle has retired
    Explosion,
    /// Perpetual stream spread over the spawn volume
    Wide,
}

/// What happened to a particle when its policy ran
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    /// Stream policies: fully reinitialized
    Respawned,
    /// Explosion: marked dead for this burst
    Retired,
    /// Explosion: brought back for a new burst
    ReArmed,
    /// Explosion: every slot has retired, emitter switched off
    Exhausted,
    /// Explosion: already retired, waiting for the burst to finish
    Waiting,
}

/// Read-only inputs for spawning during one frame
#[derive(Debug, Clone, Copy)]
pub struct SpawnContext<'a> {
    pub config: &'a EmitterConfig,
    /// World position of the owning transform
    pub origin: Vec3,
    /// Capacity of the pool being updated
    pub pool_size: usize,
}

/// Emitter-level burst state shared by every worker of a frame
///
/// The only cross-block mutable state of an update. `dead_count` only ever
/// moves through `retire` and `reset`, so concurrent retirements in
/// different blocks are never lost.
#[derive(Debug)]
pub struct BurstState {
    dead_count: AtomicUsize,
    active: AtomicBool,
}

impl Default for BurstState {
    fn default() -> Self {
        Self {
            dead_count: AtomicUsize::new(0),
            active: AtomicBool::new(true),
        }
    }
}

impl BurstState {
    pub fn dead_count(&self) -> usize {
        self.dead_count.load(Ordering::Acquire)
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    pub fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::Release);
    }

    /// Count one more retired particle, returning the new total
    pub fn retire(&self) -> usize {
        self.dead_count.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Start a new burst
    pub fn reset(&self) {
        self.dead_count.store(0, Ordering::Release);
    }

    /// Switch the emitter off once every slot of a `pool_size` pool retired
    ///
    /// Returns true if this call switched it off.
    pub fn settle(&self, pool_size: usize) -> bool {
        if pool_size > 0 && self.dead_count() >= pool_size {
            return self.active.swap(false, Ordering::AcqRel);
        }
        false
    }
}

impl EmissionPolicy {
    /// Particles of this policy are visible as soon as they are generated
    pub fn spawns_visible(self) -> bool {
        matches!(self, EmissionPolicy::Explosion)
    }

    /// Apply this policy to an expired particle
    pub fn reinitialize<R: Rng + ?Sized>(
        self,
        particle: &mut Particle,
        ctx: &SpawnContext<'_>,
        burst: &BurstState,
        rng: &mut R,
    ) -> Expiry {
        match self {
            EmissionPolicy::Normal => respawn_at_origin(particle, ctx, rng),
            EmissionPolicy::Wide => respawn_in_volume(particle, ctx, rng),
            EmissionPolicy::Explosion => expire_explosion(particle, ctx, burst, rng),
        }
    }

    /// Reinitialize a particle for an explicit re-trigger
    ///
    /// Explosion particles are all re-armed at once instead of going through
    /// the retire branch, so a re-trigger restarts the whole burst.
    pub fn refresh<R: Rng + ?Sized>(
        self,
        particle: &mut Particle,
        ctx: &SpawnContext<'_>,
        burst: &BurstState,
        rng: &mut R,
    ) -> Expiry {
        match self {
            EmissionPolicy::Explosion => {
                rearm(particle, ctx, rng);
                Expiry::ReArmed
            }
            _ => self.reinitialize(particle, ctx, burst, rng),
        }
    }
}

/// Generate a fresh particle for a pool slot
pub fn spawn_particle<R: Rng + ?Sized>(ctx: &SpawnContext<'_>, rng: &mut R) -> Particle {
    let config = ctx.config;

    Particle {
        position: ctx.origin,
        direction: sample_direction(config, rng),
        velocity_scale: sample_velocity(config.velocity_bounds, rng),
        rotation: sample_rotation(rng),
        rotation_speed: sample_rotation_speed(config, rng),
        color: config.start_color,
        life: sample_life(config, rng),
        dead: false,
        hidden: !config.policy.spawns_visible(),
    }
}

/// Sample a unit-length spawn direction
///
/// Uniform over the sphere when no angle range is configured, otherwise in
/// the XY plane at an angle (degrees) inside the range.
pub fn sample_direction<R: Rng + ?Sized>(config: &EmitterConfig, rng: &mut R) -> Vec3 {
    match config.spawn_angle_range {
        Some(range) => {
            let rad = sample_between(range.min, range.max, rng).to_radians();
            Vec3::new(rad.cos(), rad.sin(), 0.0)
        }
        None => {
            let z = rng.gen_range(-1.0f32..=1.0);
            let theta = rng.gen_range(0.0..TAU);
            let r = (1.0 - z * z).max(0.0).sqrt();
            Vec3::new(r * theta.cos(), r * theta.sin(), z)
        }
    }
}

/// Per-axis sample in `[-bounds, bounds]`
pub fn sample_velocity<R: Rng + ?Sized>(bounds: Vec3, rng: &mut R) -> Vec3 {
    Vec3::new(
        sample_between(-bounds.x, bounds.x, rng),
        sample_between(-bounds.y, bounds.y, rng),
        sample_between(-bounds.z, bounds.z, rng),
    )
}

/// Per-axis sample in `[center - extents, center + extents]`
pub fn sample_in_volume<R: Rng + ?Sized>(center: Vec3, extents: Vec3, rng: &mut R) -> Vec3 {
    center + sample_velocity(extents, rng)
}

fn sample_life<R: Rng + ?Sized>(config: &EmitterConfig, rng: &mut R) -> f32 {
    sample_between(0.0, config.life_max, rng)
}

fn sample_rotation<R: Rng + ?Sized>(rng: &mut R) -> f32 {
    rng.gen_range(0.0..FULL_ROTATION_DEGREES)
}

fn sample_rotation_speed<R: Rng + ?Sized>(config: &EmitterConfig, rng: &mut R) -> f32 {
    if config.spins() {
        sample_between(0.0, config.rotation_speed_max, rng)
    } else {
        0.0
    }
}

fn sample_between<R: Rng + ?Sized>(min: f32, max: f32, rng: &mut R) -> f32 {
    if min < max {
        rng.gen_range(min..=max)
    } else {
        min
    }
}

/// Fields every reinitializing branch resamples
fn reset_common<R: Rng + ?Sized>(particle: &mut Particle, ctx: &SpawnContext<'_>, rng: &mut R) {
    let config = ctx.config;

    particle.life = sample_life(config, rng);
    particle.color = config.start_color;
    particle.rotation = sample_rotation(rng);
    if config.spins() {
        particle.rotation_speed = sample_rotation_speed(config, rng);
    }
    particle.direction = sample_direction(config, rng);
    particle.velocity_scale = sample_velocity(config.velocity_bounds, rng);
}

fn respawn_at_origin<R: Rng + ?Sized>(
    particle: &mut Particle,
    ctx: &SpawnContext<'_>,
    rng: &mut R,
) -> Expiry {
    reset_common(particle, ctx, rng);
    particle.position = ctx.origin;
    particle.hidden = false;
    particle.dead = false;
    Expiry::Respawned
}

fn respawn_in_volume<R: Rng + ?Sized>(
    particle: &mut Particle,
    ctx: &SpawnContext<'_>,
    rng: &mut R,
) -> Expiry {
    reset_common(particle, ctx, rng);
    particle.position = sample_in_volume(ctx.origin, ctx.config.spawn_volume, rng);
    particle.hidden = false;
    particle.dead = false;
    Expiry::Respawned
}

fn rearm<R: Rng + ?Sized>(particle: &mut Particle, ctx: &SpawnContext<'_>, rng: &mut R) {
    reset_common(particle, ctx, rng);
    particle.position = ctx.origin;
    particle.hidden = false;
    particle.dead = false;
}

fn expire_explosion<R: Rng + ?Sized>(
    particle: &mut Particle,
    ctx: &SpawnContext<'_>,
    burst: &BurstState,
    rng: &mut R,
) -> Expiry {
    let dead_count = burst.dead_count();

    if dead_count == ctx.pool_size {
        burst.set_active(false);
        Expiry::Exhausted
    } else if !particle.dead {
        particle.dead = true;
        particle.hidden = true;
        particle.life = 0.0;
        burst.retire();
        Expiry::Retired
    } else if dead_count == 0 {
        rearm(particle, ctx, rng);
        Expiry::ReArmed
    } else {
        Expiry::Waiting
    }
}
