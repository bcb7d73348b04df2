// Activation, registration and configuration behaviour of a single emitter

use std::sync::Arc;

use glam::Vec3;
use parking_lot::Mutex;
use particle_emitter::{
    EmissionPolicy, Emitter, EmitterConfig, EmitterError, EmitterId, EmitterRegistry,
    RenderRegistry, SharedTransform, StaticTransform,
};

/// Registry that records every call in order
#[derive(Default)]
struct RecordingRegistry {
    calls: Mutex<Vec<(&'static str, EmitterId)>>,
}

impl RenderRegistry for RecordingRegistry {
    fn register(&self, id: EmitterId) {
        self.calls.lock().push(("register", id));
    }

    fn unregister(&self, id: EmitterId) {
        self.calls.lock().push(("unregister", id));
    }
}

fn seeded(config: EmitterConfig) -> EmitterConfig {
    EmitterConfig {
        seed: Some(77),
        ..config
    }
}

#[test]
fn test_activate_registers_once() {
    let registry = Arc::new(RecordingRegistry::default());
    let mut emitter = Emitter::at(Vec3::ZERO).with_registry(registry.clone());
    let id = emitter.id();

    emitter.set_pool_size(10).expect("size before activation");
    emitter.activate().expect("activate");
    emitter.activate().expect("second activate is a no-op");

    assert_eq!(*registry.calls.lock(), vec![("register", id)]);

    emitter.deactivate();
    assert_eq!(registry.calls.lock().last(), Some(&("unregister", id)));
    assert!(emitter.particles().is_empty());
}

#[test]
fn test_double_activate_keeps_pool() {
    let mut emitter =
        Emitter::with_config(seeded(EmitterConfig::stream()), Arc::new(StaticTransform(Vec3::ONE)))
            .expect("valid config");
    emitter.activate().expect("activate");
    emitter.update(0.5);
    let snapshot = emitter.particles().to_vec();

    emitter.activate().expect("activate again");

    assert_eq!(emitter.particles(), snapshot.as_slice());
}

#[test]
fn test_registry_tracks_many_emitters() {
    let registry = Arc::new(EmitterRegistry::new());
    let mut emitters: Vec<_> = (0..5)
        .map(|i| {
            let mut emitter = Emitter::at(Vec3::new(i as f32, 0.0, 0.0))
                .with_registry(registry.clone());
            emitter.set_pool_size(8).expect("size");
            emitter
        })
        .collect();

    for emitter in &mut emitters {
        emitter.activate().expect("activate");
    }
    assert_eq!(registry.len(), 5);

    emitters[2].deactivate();
    assert_eq!(registry.len(), 4);
    assert!(!registry.is_registered(emitters[2].id()));

    let mut expected: Vec<EmitterId> = emitters
        .iter()
        .filter(|e| e.is_activated())
        .map(Emitter::id)
        .collect();
    expected.sort();
    assert_eq!(registry.ids(), expected);

    drop(emitters);
    assert!(registry.is_empty());
}

#[test]
fn test_locked_settings_leave_pool_untouched() {
    let mut emitter = Emitter::at(Vec3::ZERO);
    emitter.set_pool_size(20).expect("size");
    emitter.activate().expect("activate");

    assert!(matches!(
        emitter.set_pool_size(40),
        Err(EmitterError::ConfigurationLocked { setting: "size" })
    ));
    assert!(matches!(
        emitter.set_workers(3),
        Err(EmitterError::ConfigurationLocked { setting: "workers" })
    ));
    assert!(matches!(
        emitter.set_config(EmitterConfig {
            size: 21,
            ..emitter.config().clone()
        }),
        Err(EmitterError::ConfigurationLocked { .. })
    ));

    assert_eq!(emitter.particles().len(), 20);
    assert_eq!(emitter.config().size, 20);
}

#[test]
fn test_invalid_configuration_rejected_up_front() {
    let transform = Arc::new(StaticTransform(Vec3::ZERO));

    let result = Emitter::with_config(
        EmitterConfig {
            life_max: 0.0,
            ..EmitterConfig::default()
        },
        transform.clone(),
    );
    assert!(matches!(
        result,
        Err(EmitterError::InvalidConfig { field: "life_max", .. })
    ));

    let result = Emitter::with_config(
        EmitterConfig {
            size: 0,
            ..EmitterConfig::default()
        },
        transform,
    );
    assert!(matches!(
        result,
        Err(EmitterError::InvalidConfig { field: "size", .. })
    ));
}

#[test]
fn test_setters_between_frames() {
    let mut emitter = Emitter::with_config(
        seeded(EmitterConfig {
            size: 32,
            life_max: 1.0,
            ..EmitterConfig::default()
        }),
        Arc::new(StaticTransform(Vec3::ZERO)),
    )
    .expect("valid config");
    emitter.activate().expect("activate");
    emitter.update(0.2);

    emitter
        .set_colors(Vec3::ZERO, Vec3::new(0.0, 2.0, 0.0))
        .expect("colors");
    assert_eq!(emitter.color_delta(), Vec3::new(0.0, 2.0, 0.0));

    emitter.set_life_max(4.0).expect("life_max");
    assert_eq!(emitter.color_delta(), Vec3::new(0.0, 0.5, 0.0));

    assert!(emitter.set_speed(-1.0).is_err());
    assert!(emitter.set_velocity_bounds(Vec3::new(0.0, f32::NAN, 0.0)).is_err());

    emitter.set_texture(3);
    emitter.set_point_size(6.0).expect("point size");
    assert_eq!(emitter.render_settings().texture, 3);
    assert_eq!(emitter.render_settings().point_size, 6.0);
}

#[test]
fn test_shrinking_life_max_clamps_live_particles() {
    let mut emitter = Emitter::with_config(
        seeded(EmitterConfig {
            size: 200,
            life_max: 10.0,
            ..EmitterConfig::default()
        }),
        Arc::new(StaticTransform(Vec3::ZERO)),
    )
    .expect("valid config");
    emitter.activate().expect("activate");
    emitter.update(0.01);
    assert!(emitter.particles().iter().any(|p| p.life > 0.5));

    emitter.set_life_max(0.5).expect("life_max");
    assert!(emitter.particles().iter().all(|p| p.life <= 0.5));

    for _ in 0..5 {
        emitter.update(0.01);
        assert!(emitter
            .particles()
            .iter()
            .all(|p| (0.0..=0.5).contains(&p.life)));
    }

    // Same through a whole-config replacement
    emitter
        .set_config(EmitterConfig {
            life_max: 0.2,
            ..emitter.config().clone()
        })
        .expect("config");
    emitter.update(0.01);
    assert!(emitter
        .particles()
        .iter()
        .all(|p| (0.0..=0.2).contains(&p.life)));
}

#[test]
fn test_non_finite_colors_rejected() {
    let mut emitter = Emitter::at(Vec3::ZERO);
    emitter.set_pool_size(8).expect("size");
    emitter.activate().expect("activate");

    assert!(matches!(
        emitter.set_colors(Vec3::new(f32::NAN, 0.0, 0.0), Vec3::ONE),
        Err(EmitterError::InvalidConfig { field: "start_color", .. })
    ));
    assert_eq!(emitter.config().start_color, EmitterConfig::default().start_color);
    assert!(emitter.color_delta().is_finite());

    emitter.update(0.1);
    assert!(emitter.particles().iter().all(|p| p.color.is_finite()));
}

#[test]
fn test_policy_switch_after_explosion() {
    let mut emitter = Emitter::with_config(
        seeded(EmitterConfig {
            size: 16,
            policy: EmissionPolicy::Explosion,
            ..EmitterConfig::default()
        }),
        Arc::new(StaticTransform(Vec3::ZERO)),
    )
    .expect("valid config");
    emitter.activate().expect("activate");
    emitter.update(2.0);
    assert!(!emitter.is_active());

    emitter.set_policy(EmissionPolicy::Normal);
    assert!(emitter.is_active());
    assert_eq!(emitter.dead_count(), 0);

    let update = emitter.update(0.1);
    assert_eq!(update.respawned, 16);
    assert!(emitter.particles().iter().all(|p| !p.dead && !p.hidden));
}

#[test]
fn test_respawns_follow_moving_transform() {
    let transform = SharedTransform::new(Vec3::ZERO);
    let mut emitter = Emitter::with_config(
        seeded(EmitterConfig {
            size: 25,
            life_max: 0.5,
            ..EmitterConfig::default()
        }),
        Arc::new(transform.clone()),
    )
    .expect("valid config");
    emitter.activate().expect("activate");

    let target = Vec3::new(10.0, -3.0, 4.0);
    transform.set_position(target);
    emitter.update(1.0);

    assert!(emitter.particles().iter().all(|p| p.position == target));
}

#[test]
fn test_update_ignores_invalid_time_step() {
    let mut emitter = Emitter::with_config(
        seeded(EmitterConfig {
            size: 10,
            velocity_bounds: Vec3::ONE,
            ..EmitterConfig::default()
        }),
        Arc::new(StaticTransform(Vec3::ZERO)),
    )
    .expect("valid config");
    emitter.activate().expect("activate");
    let before = emitter.particles().to_vec();

    for dt in [f32::NAN, f32::INFINITY, -0.5] {
        assert_eq!(emitter.update(dt).updated, 0);
    }
    assert_eq!(emitter.particles(), before.as_slice());
}

#[test]
fn test_set_active_pauses_updates() {
    let mut emitter = Emitter::with_config(
        seeded(EmitterConfig {
            size: 10,
            ..EmitterConfig::default()
        }),
        Arc::new(StaticTransform(Vec3::ZERO)),
    )
    .expect("valid config");
    emitter.activate().expect("activate");

    emitter.set_active(false);
    assert_eq!(emitter.update(0.1).updated, 0);

    emitter.set_active(true);
    assert_eq!(emitter.update(0.1).updated, 10);
}
