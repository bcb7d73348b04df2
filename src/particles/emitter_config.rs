use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::constants::emitter::{
    DEFAULT_COLOR_SPEED, DEFAULT_LIFE_MAX, DEFAULT_POOL_SIZE, DEFAULT_SPEED,
};
use crate::constants::scheduler::DEFAULT_WORKER_COUNT;
use crate::error::{config_load_error, config_parse_error, invalid_config, EmitterResult};
use crate::particles::{EmissionPolicy, RenderSettings};

/// Spawn angle range in degrees, measured in the XY plane from +X
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AngleRange {
    pub min: f32,
    pub max: f32,
}

/// Emitter configuration
///
/// Fixed while an update runs. Missing fields in a config file fall back to
/// [`EmitterConfig::default`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmitterConfig {
    /// Pool capacity, fixed once the emitter is activated
    pub size: usize,
    /// Upper bound of sampled particle life, in seconds
    pub life_max: f32,
    /// Per-axis bound of sampled particle speed
    pub velocity_bounds: Vec3,
    /// Restrict spawn directions to an XY-plane angle range
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spawn_angle_range: Option<AngleRange>,
    /// Half extents of the wide policy spawn volume
    pub spawn_volume: Vec3,
    /// Upper bound of sampled rotation speed; 0 disables rotation
    pub rotation_speed_max: f32,
    pub start_color: Vec3,
    pub end_color: Vec3,
    /// Multiplier on the per-second color shift
    pub color_speed: f32,
    /// Emitter-level multiplier on particle travel speed
    pub speed: f32,
    pub policy: EmissionPolicy,
    /// Number of blocks an update is split into
    pub workers: usize,
    /// Seed for the random source; entropy when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    pub render: RenderSettings,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            size: DEFAULT_POOL_SIZE,
            life_max: DEFAULT_LIFE_MAX,
            velocity_bounds: Vec3::ZERO,
            spawn_angle_range: None,
            spawn_volume: Vec3::ZERO,
            rotation_speed_max: 0.0,
            start_color: Vec3::ZERO,
            end_color: Vec3::ZERO,
            color_speed: DEFAULT_COLOR_SPEED,
            speed: DEFAULT_SPEED,
            policy: EmissionPolicy::Normal,
            workers: DEFAULT_WORKER_COUNT,
            seed: None,
            render: RenderSettings::default(),
        }
    }
}

/// Configuration file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Toml,
}

impl ConfigFormat {
    /// Detect format from file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Some(ConfigFormat::Json),
            Some("toml") => Some(ConfigFormat::Toml),
            _ => None,
        }
    }
}

impl EmitterConfig {
    /// Continuous fountain from a single point
    pub fn stream() -> Self {
        Self {
            size: 500,
            life_max: 2.0,
            velocity_bounds: Vec3::new(1.0, 3.0, 0.0),
            spawn_angle_range: Some(AngleRange { min: 60.0, max: 120.0 }),
            rotation_speed_max: 90.0,
            start_color: Vec3::new(1.0, 0.8, 0.2),
            end_color: Vec3::new(1.0, 0.1, 0.0),
            ..Self::default()
        }
    }

    /// One-shot burst in every direction
    pub fn explosion() -> Self {
        Self {
            size: 300,
            life_max: 1.0,
            velocity_bounds: Vec3::splat(5.0),
            rotation_speed_max: 180.0,
            start_color: Vec3::new(1.0, 1.0, 0.6),
            end_color: Vec3::new(0.6, 0.1, 0.0),
            color_speed: 2.0,
            policy: EmissionPolicy::Explosion,
            ..Self::default()
        }
    }

    /// Ambient particles spread over a volume
    pub fn wide() -> Self {
        Self {
            size: 1000,
            life_max: 4.0,
            velocity_bounds: Vec3::new(0.2, 0.5, 0.0),
            spawn_volume: Vec3::new(20.0, 10.0, 0.0),
            start_color: Vec3::ONE,
            end_color: Vec3::splat(0.5),
            policy: EmissionPolicy::Wide,
            ..Self::default()
        }
    }

    /// Parse a TOML config and validate it
    pub fn from_toml_str(raw: &str) -> EmitterResult<Self> {
        let config: Self = toml::from_str(raw).map_err(|e| config_parse_error("TOML", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a JSON config and validate it
    pub fn from_json_str(raw: &str) -> EmitterResult<Self> {
        let config: Self =
            serde_json::from_str(raw).map_err(|e| config_parse_error("JSON", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file, choosing the parser from its extension
    pub fn load(path: impl AsRef<Path>) -> EmitterResult<Self> {
        let path = path.as_ref();
        let format = ConfigFormat::from_path(path)
            .ok_or_else(|| config_load_error(path, "unknown config extension"))?;
        let raw = std::fs::read_to_string(path).map_err(|e| config_load_error(path, e))?;

        log::debug!("[EmitterConfig] Loading {:?} config from {}", format, path.display());

        match format {
            ConfigFormat::Toml => Self::from_toml_str(&raw),
            ConfigFormat::Json => Self::from_json_str(&raw),
        }
    }

    /// Serialize to TOML
    pub fn to_toml_string(&self) -> EmitterResult<String> {
        toml::to_string_pretty(self).map_err(|e| config_parse_error("TOML", e))
    }

    /// Check every field against the values an emitter can run with
    pub fn validate(&self) -> EmitterResult<()> {
        validate_size(self.size)?;
        validate_life_max(self.life_max)?;
        validate_workers(self.workers)?;
        validate_extents("velocity_bounds", self.velocity_bounds)?;
        validate_extents("spawn_volume", self.spawn_volume)?;
        validate_finite("start_color", self.start_color)?;
        validate_finite("end_color", self.end_color)?;
        validate_non_negative("rotation_speed_max", self.rotation_speed_max)?;
        validate_non_negative("color_speed", self.color_speed)?;
        validate_non_negative("speed", self.speed)?;
        validate_non_negative("render.point_size", self.render.point_size)?;
        if let Some(range) = self.spawn_angle_range {
            validate_angle_range(range)?;
        }
        Ok(())
    }

    /// Per-second color shift that takes `start_color` to `end_color` over `life_max`
    pub fn color_delta(&self) -> Vec3 {
        (self.end_color - self.start_color) / self.life_max
    }

    /// Whether particles rotate over time
    pub fn spins(&self) -> bool {
        self.rotation_speed_max > 0.0
    }
}

pub(crate) fn validate_size(size: usize) -> EmitterResult<()> {
    if size == 0 {
        return Err(invalid_config("size", "pool size must be greater than 0"));
    }
    Ok(())
}

pub(crate) fn validate_life_max(life_max: f32) -> EmitterResult<()> {
    if !life_max.is_finite() || life_max <= 0.0 {
        return Err(invalid_config(
            "life_max",
            format!("must be a positive number of seconds, got {}", life_max),
        ));
    }
    Ok(())
}

pub(crate) fn validate_workers(workers: usize) -> EmitterResult<()> {
    if workers == 0 {
        return Err(invalid_config("workers", "worker count must be greater than 0"));
    }
    Ok(())
}

pub(crate) fn validate_extents(field: &'static str, extents: Vec3) -> EmitterResult<()> {
    if !extents.is_finite() || extents.min_element() < 0.0 {
        return Err(invalid_config(
            field,
            format!("components must be finite and non-negative, got {}", extents),
        ));
    }
    Ok(())
}

pub(crate) fn validate_finite(field: &'static str, value: Vec3) -> EmitterResult<()> {
    if !value.is_finite() {
        return Err(invalid_config(
            field,
            format!("components must be finite, got {}", value),
        ));
    }
    Ok(())
}

pub(crate) fn validate_non_negative(field: &'static str, value: f32) -> EmitterResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(invalid_config(
            field,
            format!("must be finite and non-negative, got {}", value),
        ));
    }
    Ok(())
}

pub(crate) fn validate_angle_range(range: AngleRange) -> EmitterResult<()> {
    if !range.min.is_finite() || !range.max.is_finite() || range.min > range.max {
        return Err(invalid_config(
            "spawn_angle_range",
            format!("min ({}) must not exceed max ({})", range.min, range.max),
        ));
    }
    Ok(())
}
