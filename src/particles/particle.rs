use bytemuck::{Pod, Zeroable};
use glam::{Vec3, Vec4};

/// Individual particle slot in an emitter pool
///
/// Plain state only. Particles are recycled in place by the emission policy
/// and never handed out mutably beyond the owning pool.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    /// Position in world space
    pub position: Vec3,
    /// Unit-length travel direction sampled at spawn
    pub direction: Vec3,
    /// Per-axis speed sampled at spawn
    pub velocity_scale: Vec3,
    /// Rotation in degrees
    pub rotation: f32,
    /// Rotation speed in degrees per second
    pub rotation_speed: f32,
    /// RGB color
    pub color: Vec3,
    /// Seconds of life remaining
    pub life: f32,
    /// Retired for the current burst (explosion policy only)
    pub dead: bool,
    /// Excluded from rendering while still occupying its slot
    pub hidden: bool,
}

/// Per-frame integration inputs shared by every particle of an emitter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntegrationStep {
    pub dt: f32,
    pub speed: f32,
    pub spin: bool,
    pub color_delta: Vec3,
    pub color_speed: f32,
}

impl Particle {
    /// Check if the particle's life has run out
    pub fn is_expired(&self) -> bool {
        self.life <= 0.0
    }

    /// Check if the particle should be drawn
    pub fn is_visible(&self) -> bool {
        !self.hidden
    }

    /// Advance a live particle by one step
    pub fn integrate(&mut self, step: &IntegrationStep) {
        self.life -= step.dt;
        self.position += self.direction * self.velocity_scale.abs() * step.speed * step.dt;

        if step.spin {
            self.rotation += self.rotation_speed * step.dt;
        }

        if step.color_delta != Vec3::ZERO {
            self.color += step.color_delta * step.dt * step.color_speed;
        }
    }

    /// Data needed for rendering this particle
    pub fn render_data(&self) -> ParticleRenderData {
        ParticleRenderData {
            position: self.position,
            rotation: self.rotation,
            color: self.color.extend(self.life),
            life: self.life,
            hidden: self.hidden,
        }
    }
}

impl Default for Particle {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            direction: Vec3::X,
            velocity_scale: Vec3::ZERO,
            rotation: 0.0,
            rotation_speed: 0.0,
            color: Vec3::ZERO,
            life: 0.0,
            dead: false,
            hidden: true,
        }
    }
}

/// Data needed for rendering a particle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleRenderData {
    pub position: Vec3,
    /// Rotation in degrees around the view axis
    pub rotation: f32,
    /// RGB color with remaining life in alpha
    pub color: Vec4,
    pub life: f32,
    pub hidden: bool,
}

/// GPU instance layout for visible particles
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ParticleInstance {
    pub position: [f32; 3],
    pub rotation: f32,
    pub color: [f32; 4],
}

impl From<&ParticleRenderData> for ParticleInstance {
    fn from(data: &ParticleRenderData) -> Self {
        Self {
            position: data.position.to_array(),
            rotation: data.rotation,
            color: data.color.to_array(),
        }
    }
}
