//! Runs each emitter preset for a fixed number of frames and prints timings.
//!
//! Usage: `emitter_stress [frames] [config.toml|config.json]`

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use glam::Vec3;
use particle_emitter::{
    Emitter, EmitterConfig, EmitterRegistry, SharedTransform, ThreadPoolConfig, WorkerPool,
};

const DEFAULT_FRAMES: usize = 600;
const FRAME_DT: f32 = 1.0 / 60.0;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let frames = match args.next() {
        Some(raw) => raw
            .parse::<usize>()
            .with_context(|| format!("invalid frame count `{}`", raw))?,
        None => DEFAULT_FRAMES,
    };

    let mut presets = vec![
        ("stream", EmitterConfig::stream()),
        ("explosion", EmitterConfig::explosion()),
        ("wide", EmitterConfig::wide()),
    ];
    if let Some(path) = args.next() {
        let config = EmitterConfig::load(&path)
            .with_context(|| format!("failed to load emitter config {}", path))?;
        presets.push(("custom", config));
    }

    println!("Particle Emitter Stress Run");
    println!("===========================");
    println!("  Frames: {}", frames);
    println!("  CPU cores: {}", num_cpus::get());

    WorkerPool::initialize(ThreadPoolConfig {
        thread_name_prefix: "emitter-stress".to_string(),
        ..ThreadPoolConfig::default()
    })?;
    let workers = WorkerPool::global()?;
    println!("  Worker threads: {}", workers.thread_count());
    println!();

    let registry = Arc::new(EmitterRegistry::new());

    for (name, config) in presets {
        run_preset(name, config, frames, registry.clone())?;
    }

    let stats = workers.stats();
    println!(
        "Worker pool: {} tasks, {:.3}ms average",
        stats.tasks_completed, stats.average_task_time_ms
    );
    println!("Registered emitters after run: {}", registry.len());
    Ok(())
}

fn run_preset(
    name: &str,
    config: EmitterConfig,
    frames: usize,
    registry: Arc<EmitterRegistry>,
) -> Result<()> {
    let transform = SharedTransform::new(Vec3::ZERO);
    let mut emitter = Emitter::with_config(config, Arc::new(transform.clone()))?
        .with_registry(registry);
    emitter.activate()?;

    let mut bursts = 0;
    let mut respawned = 0;
    let mut peak_visible = 0;
    let start = Instant::now();

    for frame in 0..frames {
        // Drift the emitter so respawns follow a moving origin
        transform.set_position(Vec3::new((frame as f32 * FRAME_DT).sin(), 0.0, 0.0));

        let update = emitter.update(FRAME_DT);
        respawned += update.respawned;

        if !update.active {
            bursts += 1;
            emitter.refresh_particles()?;
        }

        peak_visible = peak_visible.max(emitter.instances().len());
    }

    let elapsed = start.elapsed();

    println!("Preset: {}", name);
    println!("  Particles: {}", emitter.particles().len());
    println!("  Policy: {:?}", emitter.config().policy);
    println!("  Total time: {:.2}ms", elapsed.as_secs_f64() * 1000.0);
    println!(
        "  Per frame: {:.3}ms",
        elapsed.as_secs_f64() * 1000.0 / frames.max(1) as f64
    );
    println!("  Respawned: {}", respawned);
    println!("  Completed bursts: {}", bursts);
    println!("  Peak visible: {}", peak_visible);
    if let Some(stats) = emitter.scheduler_stats() {
        println!(
            "  Scheduler: {} frames, {:.3}ms average",
            stats.frames, stats.average_frame_time_ms
        );
    }
    println!();

    emitter.deactivate();
    Ok(())
}
