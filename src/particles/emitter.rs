use std::fmt;
use std::sync::Arc;

use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{configuration_locked, EmitterError, EmitterResult};
use crate::particles::emission::{spawn_particle, BurstState, SpawnContext};
use crate::particles::emitter_config::{
    validate_angle_range, validate_extents, validate_finite, validate_life_max,
    validate_non_negative, validate_size, validate_workers,
};
use crate::particles::scheduler::{FrameContext, SchedulerStats, UpdateScheduler};
use crate::particles::{
    AngleRange, EmissionPolicy, EmitterConfig, EmitterId, IntegrationStep, Particle,
    ParticleInstance, ParticlePool, ParticleRenderData, RenderRegistry, RenderSettings,
    StaticTransform, TransformSource,
};
use crate::thread_pool::WorkerPool;

/// Result of one emitter update
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmitterUpdate {
    /// Particles advanced this frame
    pub updated: usize,
    pub respawned: usize,
    pub retired: usize,
    pub re_armed: usize,
    /// Retired particles in the current burst after the update
    pub dead_count: usize,
    /// Whether the emitter is still active after the update
    pub active: bool,
}

/// Particle emitter owning a fixed pool of particles
///
/// Constructed with a default configuration, configured, then activated to
/// allocate its pool. `update` advances every particle once per call and only
/// returns once all worker blocks have joined, so the pool can be read for
/// rendering between calls.
pub struct Emitter {
    id: EmitterId,
    config: EmitterConfig,
    transform: Arc<dyn TransformSource>,
    registry: Option<Arc<dyn RenderRegistry>>,
    worker_pool: Option<Arc<WorkerPool>>,
    scheduler: Option<UpdateScheduler>,
    pool: ParticlePool,
    color_delta: Vec3,
    burst: BurstState,
    rng: StdRng,
}

impl Emitter {
    /// Create an emitter with the default configuration
    pub fn new(transform: Arc<dyn TransformSource>) -> Self {
        let config = EmitterConfig::default();
        let rng = seeded_rng(config.seed);

        Self {
            id: EmitterId::next(),
            config,
            transform,
            registry: None,
            worker_pool: None,
            scheduler: None,
            pool: ParticlePool::default(),
            color_delta: Vec3::ZERO,
            burst: BurstState::default(),
            rng,
        }
    }

    /// Create an emitter fixed at a world position
    pub fn at(position: Vec3) -> Self {
        Self::new(Arc::new(StaticTransform(position)))
    }

    /// Create an emitter from a full configuration
    pub fn with_config(
        config: EmitterConfig,
        transform: Arc<dyn TransformSource>,
    ) -> EmitterResult<Self> {
        config.validate()?;
        let mut emitter = Self::new(transform);
        emitter.rng = seeded_rng(config.seed);
        emitter.config = config;
        Ok(emitter)
    }

    /// Register with `registry` on activation
    pub fn with_registry(mut self, registry: Arc<dyn RenderRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Run updates on `pool` instead of the global worker pool
    pub fn with_worker_pool(mut self, pool: Arc<WorkerPool>) -> Self {
        self.worker_pool = Some(pool);
        self
    }

    pub fn id(&self) -> EmitterId {
        self.id
    }

    pub fn config(&self) -> &EmitterConfig {
        &self.config
    }

    pub fn render_settings(&self) -> &RenderSettings {
        &self.config.render
    }

    /// Whether the pool has been allocated
    pub fn is_activated(&self) -> bool {
        !self.pool.is_empty()
    }

    /// Whether the emitter should be updated and drawn this frame
    pub fn is_active(&self) -> bool {
        self.is_activated() && self.burst.is_active()
    }

    /// Retired particles in the current explosion burst
    pub fn dead_count(&self) -> usize {
        self.burst.dead_count()
    }

    pub fn color_delta(&self) -> Vec3 {
        self.color_delta
    }

    pub fn pool(&self) -> &ParticlePool {
        &self.pool
    }

    pub fn particles(&self) -> &[Particle] {
        self.pool.as_slice()
    }

    /// Render view of every particle, hidden ones included
    pub fn render_data(&self) -> impl Iterator<Item = ParticleRenderData> + '_ {
        self.pool.iter().map(Particle::render_data)
    }

    /// GPU instances for the particles that should be drawn
    pub fn instances(&self) -> Vec<ParticleInstance> {
        self.pool
            .iter()
            .filter(|p| p.is_visible())
            .map(|p| ParticleInstance::from(&p.render_data()))
            .collect()
    }

    pub fn scheduler_stats(&self) -> Option<SchedulerStats> {
        self.scheduler.as_ref().map(UpdateScheduler::stats)
    }

    /// Allocate the pool and register with the render subsystem
    ///
    /// Calling this on an emitter that already has a pool logs a warning and
    /// leaves it untouched.
    pub fn activate(&mut self) -> EmitterResult<()> {
        if self.is_activated() {
            log::warn!("[Emitter] {} already allocated, ignoring activate", self.id);
            return Ok(());
        }

        self.config.validate()?;

        let scheduler = match &self.worker_pool {
            Some(pool) => UpdateScheduler::with_pool(self.config.workers, pool.clone())?,
            None => UpdateScheduler::new(self.config.workers)?,
        };

        let ctx = SpawnContext {
            config: &self.config,
            origin: self.transform.position(),
            pool_size: self.config.size,
        };
        let rng = &mut self.rng;
        self.pool = ParticlePool::fill_with(ctx.pool_size, |_| spawn_particle(&ctx, &mut *rng));

        self.color_delta = self.config.color_delta();
        self.burst.reset();
        self.burst.set_active(true);
        self.scheduler = Some(scheduler);

        if let Some(registry) = &self.registry {
            registry.register(self.id);
        }

        log::debug!(
            "[Emitter] {} activated: {} particles, {:?} policy, {} workers",
            self.id,
            self.pool.len(),
            self.config.policy,
            self.config.workers
        );

        Ok(())
    }

    /// Unregister from the render subsystem and release the pool
    pub fn deactivate(&mut self) {
        if let Some(registry) = &self.registry {
            registry.unregister(self.id);
        }

        if self.is_activated() {
            log::debug!("[Emitter] {} deactivated", self.id);
        }

        self.pool = ParticlePool::default();
        self.scheduler = None;
    }

    /// Advance the simulation by `dt` seconds
    ///
    /// A no-op for emitters that are not activated, are inactive, or are
    /// given a negative or non-finite `dt`.
    pub fn update(&mut self, dt: f32) -> EmitterUpdate {
        if !self.is_activated() {
            log::warn!("[Emitter] {} updated before activate", self.id);
            return self.idle_update();
        }

        if !self.burst.is_active() {
            return self.idle_update();
        }

        if !dt.is_finite() || dt < 0.0 {
            log::warn!("[Emitter] {} ignoring invalid time step {}", self.id, dt);
            return self.idle_update();
        }

        let Some(scheduler) = self.scheduler.as_ref() else {
            return self.idle_update();
        };

        let frame = FrameContext {
            spawn: SpawnContext {
                config: &self.config,
                origin: self.transform.position(),
                pool_size: self.pool.len(),
            },
            step: IntegrationStep {
                dt,
                speed: self.config.speed,
                spin: self.config.spins(),
                color_delta: self.color_delta,
                color_speed: self.config.color_speed,
            },
            seed: self.rng.gen(),
        };

        let report = scheduler.step(&mut self.pool, &frame, &self.burst);

        if self.burst.settle(self.pool.len()) {
            log::debug!("[Emitter] {} burst exhausted", self.id);
        }

        EmitterUpdate {
            updated: report.updated,
            respawned: report.respawned,
            retired: report.retired,
            re_armed: report.re_armed,
            dead_count: self.burst.dead_count(),
            active: self.burst.is_active(),
        }
    }

    /// Re-trigger the emitter
    ///
    /// Resets the burst counter and reinitializes every particle through the
    /// configured policy right away, then re-enables the emitter.
    pub fn refresh_particles(&mut self) -> EmitterResult<()> {
        if !self.is_activated() {
            log::warn!("[Emitter] {} refreshed before activate", self.id);
            return Err(EmitterError::NotActivated);
        }

        self.burst.reset();

        let policy = self.config.policy;
        let ctx = SpawnContext {
            config: &self.config,
            origin: self.transform.position(),
            pool_size: self.pool.len(),
        };

        for particle in self.pool.as_mut_slice() {
            policy.refresh(particle, &ctx, &self.burst, &mut self.rng);
        }

        self.burst.set_active(true);
        log::debug!("[Emitter] {} refreshed {} particles", self.id, self.pool.len());

        Ok(())
    }

    /// Turn updates and drawing on or off without touching the pool
    pub fn set_active(&mut self, active: bool) {
        self.burst.set_active(active);
    }

    pub fn set_pool_size(&mut self, size: usize) -> EmitterResult<()> {
        self.ensure_unlocked("size")?;
        validate_size(size)?;
        self.config.size = size;
        Ok(())
    }

    pub fn set_workers(&mut self, workers: usize) -> EmitterResult<()> {
        self.ensure_unlocked("workers")?;
        validate_workers(workers)?;
        self.config.workers = workers;
        Ok(())
    }

    pub fn set_life_max(&mut self, life_max: f32) -> EmitterResult<()> {
        validate_life_max(life_max)?;
        self.config.life_max = life_max;
        self.clamp_lives();
        self.refresh_color_delta();
        Ok(())
    }

    pub fn set_colors(&mut self, start: Vec3, end: Vec3) -> EmitterResult<()> {
        validate_finite("start_color", start)?;
        validate_finite("end_color", end)?;
        self.config.start_color = start;
        self.config.end_color = end;
        self.refresh_color_delta();
        Ok(())
    }

    pub fn set_color_speed(&mut self, color_speed: f32) -> EmitterResult<()> {
        validate_non_negative("color_speed", color_speed)?;
        self.config.color_speed = color_speed;
        Ok(())
    }

    pub fn set_velocity_bounds(&mut self, bounds: Vec3) -> EmitterResult<()> {
        validate_extents("velocity_bounds", bounds)?;
        self.config.velocity_bounds = bounds;
        Ok(())
    }

    pub fn set_speed(&mut self, speed: f32) -> EmitterResult<()> {
        validate_non_negative("speed", speed)?;
        self.config.speed = speed;
        Ok(())
    }

    pub fn set_spawn_angle_range(&mut self, range: Option<AngleRange>) -> EmitterResult<()> {
        if let Some(range) = range {
            validate_angle_range(range)?;
        }
        self.config.spawn_angle_range = range;
        Ok(())
    }

    pub fn set_spawn_volume(&mut self, volume: Vec3) -> EmitterResult<()> {
        validate_extents("spawn_volume", volume)?;
        self.config.spawn_volume = volume;
        Ok(())
    }

    pub fn set_rotation_speed_max(&mut self, rotation_speed_max: f32) -> EmitterResult<()> {
        validate_non_negative("rotation_speed_max", rotation_speed_max)?;
        self.config.rotation_speed_max = rotation_speed_max;
        Ok(())
    }

    /// Switch emission policy; starts a fresh burst count
    pub fn set_policy(&mut self, policy: EmissionPolicy) {
        if self.config.policy != policy {
            self.config.policy = policy;
            self.burst.reset();
            self.burst.set_active(true);
        }
    }

    /// Reseed the random source
    pub fn set_seed(&mut self, seed: u64) {
        self.config.seed = Some(seed);
        self.rng = StdRng::seed_from_u64(seed);
    }

    pub fn set_texture(&mut self, texture: u32) {
        self.config.render.texture = texture;
    }

    pub fn set_point_size(&mut self, point_size: f32) -> EmitterResult<()> {
        validate_non_negative("render.point_size", point_size)?;
        self.config.render.point_size = point_size;
        Ok(())
    }

    pub fn set_render_settings(&mut self, render: RenderSettings) -> EmitterResult<()> {
        validate_non_negative("render.point_size", render.point_size)?;
        self.config.render = render;
        Ok(())
    }

    /// Replace the whole configuration
    ///
    /// Pool size and worker count must match the current ones once the
    /// emitter is activated.
    pub fn set_config(&mut self, config: EmitterConfig) -> EmitterResult<()> {
        config.validate()?;

        if self.is_activated() {
            if config.size != self.config.size {
                return Err(self.locked("size"));
            }
            if config.workers != self.config.workers {
                return Err(self.locked("workers"));
            }
        }

        if config.seed != self.config.seed {
            self.rng = seeded_rng(config.seed);
        }

        let policy = config.policy;
        self.config = EmitterConfig {
            policy: self.config.policy,
            ..config
        };
        self.set_policy(policy);
        self.clamp_lives();
        self.refresh_color_delta();
        Ok(())
    }

    fn ensure_unlocked(&self, setting: &'static str) -> EmitterResult<()> {
        if self.is_activated() {
            return Err(self.locked(setting));
        }
        Ok(())
    }

    fn locked(&self, setting: &'static str) -> EmitterError {
        log::warn!(
            "[Emitter] {} `{}` is fixed after activation, ignoring change",
            self.id,
            setting
        );
        configuration_locked(setting)
    }

    /// Keep live particles within a lowered `life_max`
    fn clamp_lives(&mut self) {
        let life_max = self.config.life_max;
        for particle in self.pool.as_mut_slice() {
            particle.life = particle.life.min(life_max);
        }
    }

    fn refresh_color_delta(&mut self) {
        if self.is_activated() {
            self.color_delta = self.config.color_delta();
        }
    }

    fn idle_update(&self) -> EmitterUpdate {
        EmitterUpdate {
            dead_count: self.burst.dead_count(),
            active: self.is_active(),
            ..EmitterUpdate::default()
        }
    }
}

impl Drop for Emitter {
    fn drop(&mut self) {
        if let Some(registry) = &self.registry {
            registry.unregister(self.id);
        }
    }
}

impl fmt::Debug for Emitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Emitter")
            .field("id", &self.id)
            .field("config", &self.config)
            .field("particles", &self.pool.len())
            .field("color_delta", &self.color_delta)
            .field("burst", &self.burst)
            .finish()
    }
}

fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}
