use crate::Action;

/// Largest pitch magnitude handed to the camera. Looking straight up or down
/// would make the camera's right axis degenerate.
pub const PITCH_LIMIT: f32 = 89.0;

/// Accumulates mouse motion into clamped pitch/yaw angles.
///
/// The camera performs no clamping of its own, so every look action the
/// scene receives comes through here.
#[derive(Debug, Clone)]
pub struct LookController {
    pitch: f32,
    yaw: f32,
    /// Degrees per pixel.
    sensitivity: f32,
}

impl Default for LookController {
    fn default() -> Self {
        Self {
            pitch: 0.0,
            yaw: -90.0,
            sensitivity: 0.1,
        }
    }
}

impl LookController {
    pub fn new(sensitivity: f32) -> Self {
        Self {
            sensitivity,
            ..Self::default()
        }
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    /// Feed a mouse delta in pixels (screen y grows downward) and get the
    /// resulting look action.
    pub fn on_mouse_delta(&mut self, dx: f32, dy: f32) -> Action {
        self.yaw += dx * self.sensitivity;
        self.pitch = (self.pitch - dy * self.sensitivity).clamp(-PITCH_LIMIT, PITCH_LIMIT);
        tracing::trace!(pitch = self.pitch, yaw = self.yaw, "look");
        Action::Look {
            pitch: self.pitch,
            yaw: self.yaw,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_facing_negative_z() {
        let look = LookController::default();
        assert_eq!(look.yaw(), -90.0);
        assert_eq!(look.pitch(), 0.0);
    }

    #[test]
    fn moving_mouse_up_pitches_up() {
        let mut look = LookController::default();
        let action = look.on_mouse_delta(0.0, -100.0);
        assert_eq!(
            action,
            Action::Look {
                pitch: 10.0,
                yaw: -90.0
            }
        );
    }

    #[test]
    fn pitch_is_clamped() {
        let mut look = LookController::new(1.0);
        look.on_mouse_delta(0.0, -10_000.0);
        assert_eq!(look.pitch(), PITCH_LIMIT);
        look.on_mouse_delta(0.0, 20_000.0);
        assert_eq!(look.pitch(), -PITCH_LIMIT);
    }

    #[test]
    fn yaw_accumulates_unclamped() {
        let mut look = LookController::new(1.0);
        for _ in 0..4 {
            look.on_mouse_delta(180.0, 0.0);
        }
        assert_eq!(look.yaw(), -90.0 + 720.0);
    }
}
