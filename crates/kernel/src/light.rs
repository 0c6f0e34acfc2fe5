use glam::{Mat4, Vec3};
use umbra_common::wrap_degrees;

/// Directional light that orbits the world-up axis.
///
/// Its un-rotated eye position is `direction * distance`; rotating by `angle`
/// about world up gives the point the shadow map is rendered from and where
/// the light marker is drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct Light {
    direction: Vec3,
    distance: f32,
    angle: f32,
    color: Vec3,
}

impl Light {
    /// `offset` is the un-rotated eye position; its direction becomes the
    /// light direction and its length the orbit distance.
    pub fn new(offset: Vec3, color: Vec3) -> Self {
        let distance = offset.length();
        Self {
            direction: offset.try_normalize().unwrap_or(Vec3::Y),
            distance: if distance > 0.0 { distance } else { 1.0 },
            angle: 0.0,
            color,
        }
    }

    /// Unit direction before rotation.
    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    /// Distance of the eye from the orbit center.
    pub fn distance(&self) -> f32 {
        self.distance
    }

    /// Orbit angle in degrees, in `[0, 360)`.
    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn color(&self) -> Vec3 {
        self.color
    }

    /// Advance the orbit angle, wrapping into `[0, 360)`.
    pub fn orbit(&mut self, degrees: f32) {
        self.angle = wrap_degrees(self.angle + degrees);
    }

    /// Rotation about world up by the current orbit angle.
    pub fn orbit_rotation(&self) -> Mat4 {
        Mat4::from_rotation_y(self.angle.to_radians())
    }

    /// Un-rotated eye position.
    pub fn offset(&self) -> Vec3 {
        self.direction * self.distance
    }

    /// Eye position after the orbit rotation.
    pub fn position(&self) -> Vec3 {
        self.orbit_rotation().transform_point3(self.offset())
    }

    /// Unit direction towards the light after the orbit rotation.
    pub fn rotated_direction(&self) -> Vec3 {
        self.orbit_rotation().transform_vector3(self.direction)
    }
}

/// Optional point light. No falloff: it is either contributing or not.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointLight {
    pub position: Vec3,
    pub enabled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scene_light() -> Light {
        Light::new(Vec3::new(0.0, 2.5, 0.5) * 20.0, Vec3::ONE)
    }

    #[test]
    fn splits_offset_into_direction_and_distance() {
        let light = scene_light();
        assert!((light.direction().length() - 1.0).abs() < 1e-6);
        assert!(light.offset().abs_diff_eq(Vec3::new(0.0, 50.0, 10.0), 1e-4));
        assert_eq!(light.position(), light.offset());
    }

    #[test]
    fn orbit_wraps_both_ways() {
        let mut light = scene_light();
        light.orbit(-0.5);
        assert_eq!(light.angle(), 359.5);
        light.orbit(1.0);
        assert_eq!(light.angle(), 0.5);
    }

    #[test]
    fn half_orbit_mirrors_position() {
        let mut light = scene_light();
        light.orbit(180.0);
        assert!(light.position().abs_diff_eq(Vec3::new(0.0, 50.0, -10.0), 1e-4));
        assert!(
            light
                .rotated_direction()
                .abs_diff_eq(light.position().normalize(), 1e-5)
        );
    }

    #[test]
    fn zero_offset_falls_back_to_up() {
        let light = Light::new(Vec3::ZERO, Vec3::ONE);
        assert_eq!(light.direction(), Vec3::Y);
        assert_eq!(light.distance(), 1.0);
    }

    #[test]
    fn point_light_starts_off() {
        assert!(!PointLight::default().enabled);
    }
}
