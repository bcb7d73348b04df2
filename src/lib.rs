pub mod constants;
pub mod error;
pub mod particles;
pub mod thread_pool;

pub use error::{EmitterError, EmitterResult};
pub use particles::{
    AngleRange, EmissionPolicy, Emitter, EmitterConfig, EmitterId, EmitterRegistry,
    EmitterUpdate, Particle, ParticleInstance, RenderRegistry, RenderSettings, SharedTransform,
    StaticTransform, TransformSource,
};
pub use thread_pool::{ThreadPoolConfig, WorkerPool};
