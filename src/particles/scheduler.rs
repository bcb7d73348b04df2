//! Update Scheduler
//!
//! Splits a particle pool into a fixed number of contiguous blocks, runs the
//! per-block kernel on the worker pool and joins before returning. Blocks
//! never overlap, so particle data needs no locking; the only shared mutable
//! state is the emitter's [`BurstState`].

use std::ops::{Add, AddAssign, Range};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;

use crate::error::EmitterResult;
use crate::particles::emission::{BurstState, Expiry, SpawnContext};
use crate::particles::emitter_config::validate_workers;
use crate::particles::particle_pool::{partition, PoolBlock};
use crate::particles::{IntegrationStep, ParticlePool};
use crate::thread_pool::WorkerPool;

/// Totals reported by one or more blocks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlockReport {
    /// Particles visited
    pub updated: usize,
    /// Stream particles reinitialized after expiring
    pub respawned: usize,
    /// Explosion particles retired
    pub retired: usize,
    /// Explosion particles brought back for a new burst
    pub re_armed: usize,
    /// Expiries that found the burst already exhausted
    pub exhausted: usize,
}

impl BlockReport {
    pub fn record(&mut self, expiry: Expiry) {
        match expiry {
            Expiry::Respawned => self.respawned += 1,
            Expiry::Retired => self.retired += 1,
            Expiry::ReArmed => self.re_armed += 1,
            Expiry::Exhausted => self.exhausted += 1,
            Expiry::Waiting => {}
        }
    }
}

impl Add for BlockReport {
    type Output = BlockReport;

    fn add(self, other: BlockReport) -> BlockReport {
        BlockReport {
            updated: self.updated + other.updated,
            respawned: self.respawned + other.respawned,
            retired: self.retired + other.retired,
            re_armed: self.re_armed + other.re_armed,
            exhausted: self.exhausted + other.exhausted,
        }
    }
}

impl AddAssign for BlockReport {
    fn add_assign(&mut self, other: BlockReport) {
        *self = *self + other;
    }
}

/// Everything a block needs for one frame, shared read-only by all blocks
#[derive(Debug, Clone, Copy)]
pub struct FrameContext<'a> {
    pub spawn: SpawnContext<'a>,
    pub step: IntegrationStep,
    /// Base seed; each block derives its own random stream from it
    pub seed: u64,
}

impl FrameContext<'_> {
    fn block_rng(&self, block_index: usize) -> StdRng {
        StdRng::seed_from_u64(self.seed.wrapping_add(block_index as u64))
    }
}

/// Advance every particle of a block by one step
///
/// Live particles are integrated first; any particle whose life is then used
/// up goes through the emission policy in the same visit.
pub fn update_block(
    block: &mut PoolBlock<'_>,
    frame: &FrameContext<'_>,
    burst: &BurstState,
) -> BlockReport {
    let policy = frame.spawn.config.policy;
    let mut rng = frame.block_rng(block.index);
    let mut report = BlockReport::default();

    for particle in block.particles.iter_mut() {
        if !particle.is_expired() {
            particle.integrate(&frame.step);
        }

        if particle.is_expired() {
            let expiry = policy.reinitialize(particle, &frame.spawn, burst, &mut rng);
            report.record(expiry);
        }

        report.updated += 1;
    }

    report
}

/// Lock-free scheduler counters
#[derive(Debug, Default)]
struct SchedulerCounters {
    frames: AtomicU64,
    particles_updated: AtomicU64,
    total_time_ns: AtomicU64,
}

/// Snapshot of scheduler activity
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SchedulerStats {
    pub frames: u64,
    pub particles_updated: u64,
    pub average_frame_time_ms: f64,
}

/// Fan-out/join driver for per-frame particle updates
#[derive(Debug)]
pub struct UpdateScheduler {
    workers: usize,
    pool: Arc<WorkerPool>,
    counters: SchedulerCounters,
}

impl UpdateScheduler {
    /// Create a scheduler on the global worker pool
    pub fn new(workers: usize) -> EmitterResult<Self> {
        Self::with_pool(workers, WorkerPool::global()?)
    }

    /// Create a scheduler on a specific worker pool
    pub fn with_pool(workers: usize, pool: Arc<WorkerPool>) -> EmitterResult<Self> {
        validate_workers(workers)?;
        Ok(Self {
            workers,
            pool,
            counters: SchedulerCounters::default(),
        })
    }

    /// Number of blocks each update is split into
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Index ranges assigned to each block for a pool of `len` particles
    pub fn partition(&self, len: usize) -> Vec<Range<usize>> {
        partition(len, self.workers)
    }

    /// Run `kernel` once per non-empty block and wait for all of them
    pub fn run<F>(&self, particles: &mut ParticlePool, kernel: F) -> BlockReport
    where
        F: Fn(&mut PoolBlock<'_>) -> BlockReport + Sync,
    {
        let start = Instant::now();
        let blocks = particles.blocks_mut(self.workers);

        let report = self.pool.execute(|| {
            blocks
                .into_par_iter()
                .filter(|block| !block.particles.is_empty())
                .map(|mut block| kernel(&mut block))
                .reduce(BlockReport::default, |a, b| a + b)
        });

        let elapsed = start.elapsed();
        self.counters.frames.fetch_add(1, Ordering::Relaxed);
        self.counters
            .particles_updated
            .fetch_add(report.updated as u64, Ordering::Relaxed);
        self.counters
            .total_time_ns
            .fetch_add(elapsed.as_nanos() as u64, Ordering::Relaxed);

        log::trace!(
            "[UpdateScheduler] {} particles across {} blocks in {:?}",
            report.updated,
            self.workers,
            elapsed
        );

        report
    }

    /// Advance every particle of `particles` by one frame
    pub fn step(
        &self,
        particles: &mut ParticlePool,
        frame: &FrameContext<'_>,
        burst: &BurstState,
    ) -> BlockReport {
        self.run(particles, |block| update_block(block, frame, burst))
    }

    pub fn stats(&self) -> SchedulerStats {
        let frames = self.counters.frames.load(Ordering::Relaxed);
        let total_ns = self.counters.total_time_ns.load(Ordering::Relaxed);

        SchedulerStats {
            frames,
            particles_updated: self.counters.particles_updated.load(Ordering::Relaxed),
            average_frame_time_ms: if frames > 0 {
                (total_ns as f64) / (frames as f64) / 1_000_000.0
            } else {
                0.0
            },
        }
    }
}
