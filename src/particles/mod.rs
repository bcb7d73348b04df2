pub mod particle;
pub mod particle_pool;
pub mod emission;
pub mod emitter_config;
pub mod interfaces;
pub mod render;
pub mod scheduler;
pub mod emitter;

pub use particle::{IntegrationStep, Particle, ParticleInstance, ParticleRenderData};
pub use particle_pool::{partition, ParticlePool, PoolBlock};
pub use emission::{spawn_particle, BurstState, EmissionPolicy, Expiry, SpawnContext};
pub use emitter_config::{AngleRange, ConfigFormat, EmitterConfig};
pub use interfaces::{
    EmitterId, EmitterRegistry, RenderRegistry, SharedTransform, StaticTransform,
    TransformSource,
};
pub use render::{BlendFactor, DrawMode, RenderSettings};
pub use scheduler::{update_block, BlockReport, FrameContext, SchedulerStats, UpdateScheduler};
pub use emitter::{Emitter, EmitterUpdate};
