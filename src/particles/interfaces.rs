use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashSet;
use glam::Vec3;
use parking_lot::RwLock;

/// Process-unique emitter identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EmitterId(pub u64);

static NEXT_EMITTER_ID: AtomicU64 = AtomicU64::new(1);

impl EmitterId {
    pub fn next() -> Self {
        Self(NEXT_EMITTER_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for EmitterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "emitter#{}", self.0)
    }
}

/// World position of the object an emitter is attached to
pub trait TransformSource: Send + Sync {
    fn position(&self) -> Vec3;
}

/// Render subsystem hook for emitters that should be drawn
pub trait RenderRegistry: Send + Sync {
    fn register(&self, id: EmitterId);
    fn unregister(&self, id: EmitterId);
}

/// Transform that never moves
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StaticTransform(pub Vec3);

impl TransformSource for StaticTransform {
    fn position(&self) -> Vec3 {
        self.0
    }
}

/// Transform that game code can move between frames
#[derive(Debug, Clone, Default)]
pub struct SharedTransform {
    position: Arc<RwLock<Vec3>>,
}

impl SharedTransform {
    pub fn new(position: Vec3) -> Self {
        Self {
            position: Arc::new(RwLock::new(position)),
        }
    }

    pub fn set_position(&self, position: Vec3) {
        *self.position.write() = position;
    }
}

impl TransformSource for SharedTransform {
    fn position(&self) -> Vec3 {
        *self.position.read()
    }
}

/// In-process registry of emitters that are currently drawable
#[derive(Debug, Default)]
pub struct EmitterRegistry {
    registered: DashSet<EmitterId>,
}

impl EmitterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_registered(&self, id: EmitterId) -> bool {
        self.registered.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.registered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registered.is_empty()
    }

    /// Registered ids in ascending order
    pub fn ids(&self) -> Vec<EmitterId> {
        let mut ids: Vec<_> = self.registered.iter().map(|id| *id).collect();
        ids.sort();
        ids
    }
}

impl RenderRegistry for EmitterRegistry {
    fn register(&self, id: EmitterId) {
        if !self.registered.insert(id) {
            log::debug!("[EmitterRegistry] {} already registered", id);
        }
    }

    fn unregister(&self, id: EmitterId) {
        self.registered.remove(&id);
    }
}
