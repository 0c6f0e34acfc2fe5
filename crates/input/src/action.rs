use serde::{Deserialize, Serialize};
use umbra_common::{MoveDirection, RasterMode};

/// A discrete delta the scene applies between frames.
///
/// Held keys are turned into one action per frame by the input collaborator,
/// so each variant describes a single step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Action {
    /// Translate the camera along its front or right axis.
    Move { direction: MoveDirection, speed: f32 },
    /// Set absolute camera orientation in degrees.
    Look { pitch: f32, yaw: f32 },
    /// Add degrees to the shared scene rotation.
    RotateScene(f32),
    /// Add degrees to the light's orbit angle.
    OrbitLight(f32),
    /// Add to the fog density.
    AdjustFog(f32),
    /// Nudge the tank along x (sideways) and z (forward).
    MoveTank { dx: f32, dz: f32 },
    /// Switch the point light on or off.
    SetPointLight(bool),
    /// Change polygon rasterization for the lit pass.
    SetRasterMode(RasterMode),
}

impl Action {
    /// Short label for logs.
    pub fn label(&self) -> &'static str {
        match self {
            Action::Move { .. } => "move",
            Action::Look { .. } => "look",
            Action::RotateScene(_) => "rotate-scene",
            Action::OrbitLight(_) => "orbit-light",
            Action::AdjustFog(_) => "adjust-fog",
            Action::MoveTank { .. } => "move-tank",
            Action::SetPointLight(_) => "point-light",
            Action::SetRasterMode(_) => "raster-mode",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn move_carries_direction_and_speed() {
        let a = Action::Move {
            direction: MoveDirection::Forward,
            speed: 1.0,
        };
        assert!(matches!(
            a,
            Action::Move {
                direction: MoveDirection::Forward,
                ..
            }
        ));
        assert_eq!(a.label(), "move");
    }

    #[test]
    fn toggles_are_constructible() {
        assert_eq!(Action::SetPointLight(true).label(), "point-light");
        assert_eq!(
            Action::SetRasterMode(RasterMode::Wireframe).label(),
            "raster-mode"
        );
    }
}
