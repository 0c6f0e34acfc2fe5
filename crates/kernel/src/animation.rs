use glam::Vec2;
use serde::{Deserialize, Serialize};
use umbra_common::wrap_degrees;

/// Closed interval an offset may travel in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TravelRange {
    pub min: f32,
    pub max: f32,
}

impl TravelRange {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Clamp `value` into `[min, max]`.
    pub fn clamp(&self, value: f32) -> f32 {
        value.clamp(self.min, self.max)
    }

    /// True when `min <= max`.
    pub fn is_ordered(&self) -> bool {
        self.min <= self.max
    }
}

/// Per-frame scalars that drive object transforms, fog and phases.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AnimationState {
    /// Shared rotation of every scene object about world up, degrees.
    pub scene_angle: f32,
    /// Bird orbit phase, degrees.
    pub bird_rotation: f32,
    /// Sideways leaf offset from the wind.
    pub wind_sway: f32,
    pub fog_density: f32,
    /// Tank offset: x sideways, y forward (drawn at `-y` on the z axis).
    pub tank: Vec2,
    /// Seconds since start, as of the last `advance`.
    pub elapsed: f32,
}

impl AnimationState {
    /// Spin the scene about world up; the angle wraps into `[0, 360)`.
    pub fn rotate_scene(&mut self, degrees: f32) {
        self.scene_angle = wrap_degrees(self.scene_angle + degrees);
    }

    /// Change fog density, clamped to `[0, 1]`.
    pub fn adjust_fog(&mut self, delta: f32) {
        self.fog_density = (self.fog_density + delta).clamp(0.0, 1.0);
    }

    /// Offset the tank, clamped per axis to its travel ranges.
    pub fn move_tank(&mut self, dx: f32, dz: f32, x_range: TravelRange, z_range: TravelRange) {
        self.tank.x = x_range.clamp(self.tank.x + dx);
        self.tank.y = z_range.clamp(self.tank.y + dz);
    }

    /// Advance time-driven phases once. `elapsed` is absolute seconds.
    pub fn advance(&mut self, elapsed: f32, bird_step: f32, wind_amplitude: f32) {
        self.elapsed = elapsed;
        self.wind_sway = wind_amplitude * elapsed.sin();
        self.bird_rotation = wrap_degrees(self.bird_rotation + bird_step);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const X: TravelRange = TravelRange::new(-8.0, 8.0);
    const Z: TravelRange = TravelRange::new(-17.0, 43.0);

    #[test]
    fn rotate_right_720_times_wraps_to_zero() {
        let mut anim = AnimationState::default();
        for _ in 0..720 {
            anim.rotate_scene(0.5);
        }
        assert_eq!(anim.scene_angle, 0.0);
    }

    #[test]
    fn rotate_left_from_zero_wraps() {
        let mut anim = AnimationState::default();
        anim.rotate_scene(-0.5);
        assert_eq!(anim.scene_angle, 359.5);
    }

    #[test]
    fn fog_stays_in_unit_interval() {
        let mut anim = AnimationState::default();
        for _ in 0..50 {
            anim.adjust_fog(-0.0001);
        }
        assert_eq!(anim.fog_density, 0.0);
        for _ in 0..30_000 {
            anim.adjust_fog(0.0001);
            assert!((0.0..=1.0).contains(&anim.fog_density));
        }
        anim.adjust_fog(5.0);
        assert_eq!(anim.fog_density, 1.0);
    }

    #[test]
    fn tank_offsets_clamp_to_travel_range() {
        let mut anim = AnimationState::default();
        for _ in 0..100 {
            anim.move_tank(-0.25, 0.25, X, Z);
        }
        assert_eq!(anim.tank.x, -8.0);
        assert_eq!(anim.tank.y, 25.0);
        for _ in 0..200 {
            anim.move_tank(0.25, 0.25, X, Z);
        }
        assert_eq!(anim.tank.x, 8.0);
        assert_eq!(anim.tank.y, 43.0);
        for _ in 0..400 {
            anim.move_tank(0.0, -0.25, X, Z);
        }
        assert_eq!(anim.tank.y, -17.0);
    }

    #[test]
    fn advance_moves_phases_once() {
        let mut anim = AnimationState::default();
        anim.advance(std::f32::consts::FRAC_PI_2, 0.3, 0.1);
        assert!((anim.wind_sway - 0.1).abs() < 1e-6);
        assert!((anim.bird_rotation - 0.3).abs() < 1e-6);
        assert_eq!(anim.elapsed, std::f32::consts::FRAC_PI_2);
    }

    #[test]
    fn bird_phase_wraps() {
        let mut anim = AnimationState {
            bird_rotation: 359.9,
            ..AnimationState::default()
        };
        anim.advance(0.0, 0.3, 0.1);
        assert!(anim.bird_rotation < 1.0);
    }
}
