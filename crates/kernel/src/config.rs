use crate::animation::TravelRange;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use umbra_common::WORLD_UP;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Scene and pipeline settings. Every field is optional in the YAML
/// document; missing values keep their defaults.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub camera: CameraConfig,
    pub light: LightConfig,
    pub animation: AnimationConfig,
    pub shadow: ShadowConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub position: Vec3,
    pub target: Vec3,
    /// Must point along +Y; scene rotation and the light view assume it.
    pub world_up: Vec3,
    /// Units per move action.
    pub speed: f32,
    /// Degrees of look per pixel of mouse motion.
    pub mouse_sensitivity: f32,
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: Vec3::new(100.0, 25.0, 40.0),
            target: Vec3::new(10.0, 8.0, 20.0),
            world_up: Vec3::Y,
            speed: 1.0,
            mouse_sensitivity: 0.1,
            fov_degrees: 45.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightConfig {
    /// Direction towards the light before orbiting; need not be unit length.
    pub direction: Vec3,
    /// Multiplied with `direction` to place the light eye.
    pub scale: f32,
    pub color: Vec3,
    /// Degrees per orbit action.
    pub angle_step: f32,
    pub point_light_position: Vec3,
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            direction: Vec3::new(0.0, 2.5, 0.5),
            scale: 20.0,
            color: Vec3::ONE,
            angle_step: 0.5,
            point_light_position: Vec3::ZERO,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    /// Degrees per scene rotation action.
    pub scene_angle_step: f32,
    /// Degrees the bird orbits each frame.
    pub bird_step: f32,
    pub wind_amplitude: f32,
    pub fog_step: f32,
    pub tank_step: f32,
    pub tank_x: TravelRange,
    pub tank_z: TravelRange,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            scene_angle_step: 0.5,
            bird_step: 0.3,
            wind_amplitude: 0.1,
            fog_step: 0.0001,
            tank_step: 0.25,
            tank_x: TravelRange::new(-8.0, 8.0),
            tank_z: TravelRange::new(-17.0, 43.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadowConfig {
    pub width: u32,
    pub height: u32,
    /// Half size of the orthographic light box.
    pub half_extent: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for ShadowConfig {
    fn default() -> Self {
        Self {
            width: 4096,
            height: 2048,
            half_extent: 100.0,
            near: 35.0,
            far: 200.0,
        }
    }
}

impl SceneConfig {
    /// Parse and validate a YAML document.
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        // An empty document deserializes to unit; treat it as all defaults.
        let config: Self = if text.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(text)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_yaml_str(&text)?;
        tracing::info!("loaded scene config from {}", path.display());
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Reject settings the renderer cannot honor.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));

        if self.shadow.width == 0 || self.shadow.height == 0 {
            return invalid(format!(
                "shadow map must be non-empty, got {}x{}",
                self.shadow.width, self.shadow.height
            ));
        }
        if !(self.shadow.near < self.shadow.far) || self.shadow.half_extent <= 0.0 {
            return invalid("shadow box needs near < far and a positive half extent".into());
        }
        if !(self.camera.near > 0.0 && self.camera.near < self.camera.far) {
            return invalid(format!(
                "camera clip planes out of order: near={} far={}",
                self.camera.near, self.camera.far
            ));
        }
        if !(self.camera.fov_degrees > 0.0 && self.camera.fov_degrees < 180.0) {
            return invalid(format!("fov {} outside (0, 180)", self.camera.fov_degrees));
        }
        let up = self.camera.world_up;
        if !up.is_finite() || !up.normalize_or_zero().abs_diff_eq(WORLD_UP, 1e-6) {
            return invalid(format!("camera.world_up must point along +Y, got {up}"));
        }
        let light_offset = self.light.direction * self.light.scale;
        if !light_offset.is_finite() || light_offset.length_squared() == 0.0 {
            return invalid(format!(
                "light.direction * light.scale must be a non-zero vector, got {light_offset}"
            ));
        }
        for (name, range) in [
            ("tank_x", self.animation.tank_x),
            ("tank_z", self.animation.tank_z),
        ] {
            if !range.is_ordered() {
                return invalid(format!("{name} range min {} > max {}", range.min, range.max));
            }
        }
        let steps = [
            ("camera.speed", self.camera.speed),
            ("light.angle_step", self.light.angle_step),
            ("animation.scene_angle_step", self.animation.scene_angle_step),
            ("animation.bird_step", self.animation.bird_step),
            ("animation.fog_step", self.animation.fog_step),
            ("animation.tank_step", self.animation.tank_step),
        ];
        for (name, step) in steps {
            if !step.is_finite() || step < 0.0 {
                return invalid(format!("{name} must be a non-negative number, got {step}"));
            }
        }
        Ok(())
    }
}
