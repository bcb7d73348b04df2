// Simulation properties that must hold across whole update cycles

use std::sync::Arc;

use glam::Vec3;
use particle_emitter::particles::{partition, IntegrationStep};
use particle_emitter::{
    AngleRange, EmissionPolicy, Emitter, EmitterConfig, Particle, StaticTransform,
    ThreadPoolConfig, WorkerPool,
};

const UNIT_TOLERANCE: f32 = 1e-4;

fn worker_pool() -> Arc<WorkerPool> {
    Arc::new(
        WorkerPool::new(ThreadPoolConfig {
            worker_threads: 4,
            ..ThreadPoolConfig::default()
        })
        .expect("Failed to create WorkerPool for test"),
    )
}

fn activated(config: EmitterConfig) -> Emitter {
    let mut emitter = Emitter::with_config(
        EmitterConfig {
            seed: Some(2024),
            ..config
        },
        Arc::new(StaticTransform(Vec3::ZERO)),
    )
    .expect("valid config")
    .with_worker_pool(worker_pool());
    emitter.activate().expect("activate");
    emitter
}

#[test]
fn test_life_stays_in_range() {
    for policy in [EmissionPolicy::Normal, EmissionPolicy::Wide, EmissionPolicy::Explosion] {
        let mut emitter = activated(EmitterConfig {
            size: 500,
            life_max: 0.8,
            velocity_bounds: Vec3::splat(2.0),
            spawn_volume: Vec3::ONE,
            policy,
            workers: 7,
            ..EmitterConfig::default()
        });

        for frame in 0..60 {
            let dt = 0.01 + (frame % 7) as f32 * 0.05;
            emitter.update(dt);

            for p in emitter.particles() {
                assert!(
                    (0.0..=0.8).contains(&p.life),
                    "{:?} frame {}: life {} out of range",
                    policy,
                    frame,
                    p.life
                );
            }
        }
    }
}

#[test]
fn test_directions_are_unit_length() {
    let configs = [
        EmitterConfig {
            size: 300,
            ..EmitterConfig::default()
        },
        EmitterConfig {
            size: 300,
            spawn_angle_range: Some(AngleRange { min: -30.0, max: 210.0 }),
            ..EmitterConfig::default()
        },
    ];

    for config in configs {
        let mut emitter = activated(config);
        for _ in 0..10 {
            emitter.update(0.3);
            assert!(emitter
                .particles()
                .iter()
                .all(|p| (p.direction.length() - 1.0).abs() < UNIT_TOLERANCE));
        }
    }
}

#[test]
fn test_explosion_single_frame_exhausts_small_pool() {
    let mut emitter = activated(EmitterConfig {
        size: 4,
        life_max: 1.0,
        policy: EmissionPolicy::Explosion,
        ..EmitterConfig::default()
    });

    let update = emitter.update(1.1);

    assert_eq!(update.retired, 4);
    assert_eq!(update.dead_count, 4);
    assert!(!update.active);
    assert_eq!(emitter.dead_count(), 4);
    assert!(!emitter.is_active());
    assert!(emitter.instances().is_empty());
}

#[test]
fn test_explosion_saturation_freezes_pool() {
    let mut emitter = activated(EmitterConfig {
        size: 1000,
        life_max: 1.0,
        velocity_bounds: Vec3::ONE,
        policy: EmissionPolicy::Explosion,
        workers: 12,
        ..EmitterConfig::default()
    });

    let mut frames = 0;
    while emitter.is_active() {
        emitter.update(0.1);
        frames += 1;
        assert!(frames <= 20, "burst never finished");
    }

    assert_eq!(emitter.dead_count(), 1000);
    assert!(emitter.particles().iter().all(|p| p.dead && p.hidden));

    let frozen = emitter.particles().to_vec();
    for _ in 0..5 {
        let update = emitter.update(0.5);
        assert_eq!(update.updated, 0);
        assert!(!update.active);
    }
    assert_eq!(emitter.particles(), frozen.as_slice());
    assert_eq!(emitter.dead_count(), 1000);
}

#[test]
fn test_refresh_rearms_burst() {
    let mut emitter = activated(EmitterConfig {
        size: 64,
        life_max: 0.5,
        policy: EmissionPolicy::Explosion,
        ..EmitterConfig::default()
    });

    for cycle in 0..3 {
        emitter.update(1.0);
        assert!(!emitter.is_active(), "cycle {} did not finish", cycle);
        assert_eq!(emitter.dead_count(), 64);

        emitter.refresh_particles().expect("refresh");

        assert_eq!(emitter.dead_count(), 0);
        assert!(emitter.is_active());
        assert!(emitter
            .particles()
            .iter()
            .all(|p| !p.dead && !p.hidden && p.position == Vec3::ZERO));
        assert_eq!(emitter.instances().len(), 64);
    }

    // Refreshing a running burst restarts it too
    emitter.update(0.01);
    emitter.refresh_particles().expect("refresh");
    assert_eq!(emitter.dead_count(), 0);
}

#[test]
fn test_partition_covers_pool_exactly_once() {
    for len in [0, 1, 5, 11, 12, 13, 100, 1001] {
        for workers in 1..=16 {
            let blocks = partition(len, workers);
            assert_eq!(blocks.len(), workers);

            let mut seen = vec![0u8; len];
            for block in &blocks {
                for i in block.clone() {
                    seen[i] += 1;
                }
            }
            assert!(
                seen.iter().all(|&n| n == 1),
                "len {} workers {}: {:?}",
                len,
                workers,
                blocks
            );
        }
    }
}

#[test]
fn test_color_reaches_end_color_over_life() {
    let config = EmitterConfig {
        life_max: 2.0,
        start_color: Vec3::new(1.0, 0.5, 0.0),
        end_color: Vec3::new(0.0, 0.5, 1.0),
        ..EmitterConfig::default()
    };
    let step = IntegrationStep {
        dt: 0.01,
        speed: config.speed,
        spin: config.spins(),
        color_delta: config.color_delta(),
        color_speed: 1.0,
    };

    let mut particle = Particle {
        color: config.start_color,
        life: config.life_max + step.dt,
        hidden: false,
        ..Particle::default()
    };

    for _ in 0..200 {
        particle.integrate(&step);
    }

    assert!(!particle.is_expired());
    let shift = particle.color - config.start_color;
    let expected = config.end_color - config.start_color;
    assert!(
        (shift - expected).abs().max_element() < 1e-3,
        "shift {} expected {}",
        shift,
        expected
    );
}

#[test]
fn test_wide_respawns_inside_volume() {
    let mut emitter = activated(EmitterConfig {
        size: 100,
        life_max: 1.0,
        spawn_volume: Vec3::splat(2.0),
        policy: EmissionPolicy::Wide,
        ..EmitterConfig::default()
    });

    let mut respawned = 0;
    for _ in 0..20 {
        respawned += emitter.update(0.4).respawned;
        for p in emitter.particles() {
            assert!(
                p.position.abs().max_element() <= 2.0,
                "particle escaped volume at {}",
                p.position
            );
        }
    }

    assert!(respawned >= 100);
    assert!(emitter.particles().iter().any(|p| p.position != Vec3::ZERO));
}

#[test]
fn test_stream_particles_move_along_direction() {
    let mut emitter = activated(EmitterConfig {
        size: 50,
        life_max: 10.0,
        velocity_bounds: Vec3::splat(1.0),
        speed: 2.0,
        ..EmitterConfig::default()
    });

    let before = emitter.particles().to_vec();
    emitter.update(0.1);

    for (old, new) in before.iter().zip(emitter.particles()) {
        if old.life > 0.1 {
            let expected = old.position + old.direction * old.velocity_scale.abs() * 2.0 * 0.1;
            assert!((new.position - expected).length() < 1e-5);
        }
    }
}
