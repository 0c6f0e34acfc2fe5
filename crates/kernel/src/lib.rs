//! Scene kernel: camera, light and animation state, mutated only by actions.
//!
//! # Invariants
//! - All state changes flow through `Scene::apply` and `Scene::advance`.
//! - Camera front/right stay unit length and orthogonal to world up.
//! - Angles live in `[0, 360)`; fog density lives in `[0, 1]`.

pub mod animation;
pub mod camera;
pub mod config;
pub mod light;
pub mod scene;

pub use animation::{AnimationState, TravelRange};
pub use camera::{Camera, CameraError, Projection};
pub use config::{AnimationConfig, CameraConfig, ConfigError, LightConfig, SceneConfig, ShadowConfig};
pub use light::{Light, PointLight};
pub use scene::Scene;

pub fn crate_info() -> &'static str {
    "umbra-kernel v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("kernel"));
    }
}
