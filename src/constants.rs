// Particle Emitter Constants
//
// Shared numeric defaults for emitters, the update scheduler and the worker
// pool. Define new tunables here rather than inline.

/// Emitter defaults
pub mod emitter {
    /// Pool capacity used when no size is configured
    pub const DEFAULT_POOL_SIZE: usize = 100;

    /// Maximum particle life in seconds
    pub const DEFAULT_LIFE_MAX: f32 = 1.0;

    /// Color interpolation speed multiplier
    pub const DEFAULT_COLOR_SPEED: f32 = 1.0;

    /// Emitter-level speed multiplier
    pub const DEFAULT_SPEED: f32 = 1.0;

    /// Spawn rotation is sampled in [0, FULL_ROTATION_DEGREES)
    pub const FULL_ROTATION_DEGREES: f32 = 360.0;
}

/// Update scheduler constants
pub mod scheduler {
    /// Number of contiguous blocks an update is split into
    pub const DEFAULT_WORKER_COUNT: usize = 12;
}

/// Worker pool constants
pub mod workers {
    /// Stack size for worker threads (in bytes)
    pub const WORKER_STACK_SIZE: usize = 2 * 1024 * 1024;

    /// Cores left free for the OS and main thread
    pub const RESERVED_CORES: usize = 2;

    /// Lower bound on worker threads regardless of core count
    pub const MIN_WORKER_THREADS: usize = 4;
}

/// Floating point tolerances
pub mod tolerance {
    /// Allowed deviation from unit length for spawn directions
    pub const UNIT_LENGTH_EPSILON: f32 = 1e-4;
}
