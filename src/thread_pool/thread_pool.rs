/// Worker Pool
///
/// Owns the rayon pool that emitter updates are installed on. Emitters share
/// one process-wide pool by default so that many emitters updating in the
/// same frame do not each spawn their own threads.
///
/// - Named worker threads with a bounded stack size
/// - Lock-free task counters for diagnostics
/// - Lazily created global pool, or an explicitly initialized one

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Instant;

use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::constants::workers::{MIN_WORKER_THREADS, RESERVED_CORES, WORKER_STACK_SIZE};
use crate::error::{thread_pool_error, EmitterError, EmitterResult};

/// Configuration for the worker pool
#[derive(Debug, Clone)]
pub struct ThreadPoolConfig {
    /// Number of OS threads backing the pool
    pub worker_threads: usize,
    /// Enable thread naming
    pub enable_thread_names: bool,
    /// Prefix used for worker thread names
    pub thread_name_prefix: String,
    /// Stack size for worker threads (in bytes)
    pub stack_size: Option<usize>,
}

impl Default for ThreadPoolConfig {
    fn default() -> Self {
        let cpu_count = num_cpus::get();
        let worker_threads = cpu_count
            .saturating_sub(RESERVED_CORES)
            .max(MIN_WORKER_THREADS);

        Self {
            worker_threads,
            enable_thread_names: true,
            thread_name_prefix: "particle-worker".to_string(),
            stack_size: Some(WORKER_STACK_SIZE),
        }
    }
}

/// Lock-free statistics counters for the pool
#[derive(Debug, Default)]
pub struct PoolCounters {
    pub tasks_submitted: AtomicU64,
    pub tasks_completed: AtomicU64,
    pub total_execution_time_ns: AtomicU64,
    pub active_tasks: AtomicUsize,
}

/// Snapshot of the pool counters
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WorkerPoolStats {
    pub worker_threads: usize,
    pub tasks_submitted: u64,
    pub tasks_completed: u64,
    pub active_tasks: usize,
    pub average_task_time_ms: f64,
}

/// Thread pool that particle updates run on
pub struct WorkerPool {
    pool: ThreadPool,
    config: ThreadPoolConfig,
    counters: PoolCounters,
}

/// Global worker pool instance
static WORKER_POOL: OnceLock<Arc<WorkerPool>> = OnceLock::new();

impl WorkerPool {
    /// Build a new worker pool
    pub fn new(config: ThreadPoolConfig) -> EmitterResult<Self> {
        if config.worker_threads == 0 {
            return Err(EmitterError::ThreadPool {
                message: "Thread count must be greater than 0".to_string(),
            });
        }

        let mut builder = ThreadPoolBuilder::new().num_threads(config.worker_threads);

        if config.enable_thread_names {
            let prefix = config.thread_name_prefix.clone();
            builder = builder.thread_name(move |idx| format!("{}-{}", prefix, idx));
        }

        if let Some(stack_size) = config.stack_size {
            builder = builder.stack_size(stack_size);
        }

        let pool = builder.build().map_err(thread_pool_error)?;

        log::debug!(
            "[WorkerPool] Created pool with {} threads",
            config.worker_threads
        );

        Ok(Self {
            pool,
            config,
            counters: PoolCounters::default(),
        })
    }

    /// Initialize the global worker pool with an explicit configuration
    pub fn initialize(config: ThreadPoolConfig) -> EmitterResult<()> {
        if WORKER_POOL.get().is_some() {
            return Err(EmitterError::ThreadPool {
                message: "Worker pool already initialized".to_string(),
            });
        }

        let pool = Arc::new(Self::new(config)?);
        WORKER_POOL.set(pool).map_err(|_| EmitterError::ThreadPool {
            message: "Failed to set worker pool".to_string(),
        })
    }

    /// Get the global worker pool, creating a default one on first use
    pub fn global() -> EmitterResult<Arc<WorkerPool>> {
        if let Some(pool) = WORKER_POOL.get() {
            return Ok(pool.clone());
        }

        let pool = Arc::new(Self::new(ThreadPoolConfig::default())?);
        Ok(WORKER_POOL.get_or_init(|| pool).clone())
    }

    /// Run a task inside the pool and wait for its result
    pub fn execute<F, R>(&self, task: F) -> R
    where
        F: FnOnce() -> R + Send,
        R: Send,
    {
        self.counters.tasks_submitted.fetch_add(1, Ordering::Relaxed);
        self.counters.active_tasks.fetch_add(1, Ordering::Relaxed);

        let start = Instant::now();
        let result = self.pool.install(task);

        let elapsed_ns = start.elapsed().as_nanos() as u64;
        self.counters.tasks_completed.fetch_add(1, Ordering::Relaxed);
        self.counters
            .total_execution_time_ns
            .fetch_add(elapsed_ns, Ordering::Relaxed);
        self.counters.active_tasks.fetch_sub(1, Ordering::Relaxed);

        result
    }

    /// Number of OS threads in the pool
    pub fn thread_count(&self) -> usize {
        self.pool.current_num_threads()
    }

    pub fn config(&self) -> &ThreadPoolConfig {
        &self.config
    }

    /// Get usage statistics
    pub fn stats(&self) -> WorkerPoolStats {
        let completed = self.counters.tasks_completed.load(Ordering::Relaxed);
        let total_ns = self.counters.total_execution_time_ns.load(Ordering::Relaxed);

        WorkerPoolStats {
            worker_threads: self.thread_count(),
            tasks_submitted: self.counters.tasks_submitted.load(Ordering::Relaxed),
            tasks_completed: completed,
            active_tasks: self.counters.active_tasks.load(Ordering::Relaxed),
            average_task_time_ms: if completed > 0 {
                (total_ns as f64) / (completed as f64) / 1_000_000.0
            } else {
                0.0
            },
        }
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("config", &self.config)
            .field("counters", &self.counters)
            .finish()
    }
}
