use serde::{Deserialize, Serialize};

/// Blend factor handed to the graphics backend, opaque to the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlendFactor {
    Zero,
    One,
    SrcAlpha,
    OneMinusSrcAlpha,
    SrcColor,
    OneMinusSrcColor,
    DstAlpha,
    OneMinusDstAlpha,
}

/// How the renderer should rasterize each particle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DrawMode {
    /// Textured camera-facing quad
    Quads,
    /// Hardware point sprite of `point_size` pixels
    Points,
}

/// Settings only the render subsystem reads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Texture handle owned by the asset manager
    pub texture: u32,
    pub src_factor: BlendFactor,
    pub dst_factor: BlendFactor,
    /// Point sprite size; 0 draws quads instead
    pub point_size: f32,
    /// Rotate quads to face the camera
    pub billboard: bool,
}

impl Default for RenderSettings {
    fn default() -> Self {
        // Additive blending
        Self {
            texture: 0,
            src_factor: BlendFactor::SrcAlpha,
            dst_factor: BlendFactor::One,
            point_size: 0.0,
            billboard: true,
        }
    }
}

impl RenderSettings {
    pub fn draw_mode(&self) -> DrawMode {
        if self.point_size > 0.0 {
            DrawMode::Points
        } else {
            DrawMode::Quads
        }
    }

    pub fn blend_factors(&self) -> (BlendFactor, BlendFactor) {
        (self.src_factor, self.dst_factor)
    }
}
