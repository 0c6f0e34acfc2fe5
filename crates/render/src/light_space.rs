use glam::{Mat4, Vec3};
use umbra_common::WORLD_UP;
use umbra_kernel::{Light, ShadowConfig};

/// Orthographic box the shadow map covers, in light view space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightFrustum {
    pub half_extent: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for LightFrustum {
    fn default() -> Self {
        Self {
            half_extent: 100.0,
            near: 35.0,
            far: 200.0,
        }
    }
}

impl From<&ShadowConfig> for LightFrustum {
    fn from(config: &ShadowConfig) -> Self {
        Self {
            half_extent: config.half_extent,
            near: config.near,
            far: config.far,
        }
    }
}

impl LightFrustum {
    pub fn projection(&self) -> Mat4 {
        let h = self.half_extent;
        Mat4::orthographic_rh(-h, h, -h, h, self.near, self.far)
    }
}

/// Projection times view for rendering and sampling the shadow map: the
/// light looks from its orbit position at `target`.
pub fn light_space_transform(light: &Light, target: Vec3, frustum: &LightFrustum) -> Mat4 {
    let view = Mat4::look_at_rh(light.position(), target, WORLD_UP);
    frustum.projection() * view
}

#[cfg(test)]
mod tests {
    use super::*;

    fn light() -> Light {
        Light::new(Vec3::new(0.0, 50.0, 10.0), Vec3::ONE)
    }

    const TARGET: Vec3 = Vec3::new(10.0, 8.0, 20.0);

    #[test]
    fn derivation_is_bit_for_bit_repeatable() {
        let mut l = light();
        l.orbit(123.5);
        let frustum = LightFrustum::default();
        let a = light_space_transform(&l, TARGET, &frustum).to_cols_array();
        let b = light_space_transform(&l, TARGET, &frustum).to_cols_array();
        assert!(a.iter().zip(b.iter()).all(|(x, y)| x.to_bits() == y.to_bits()));
    }

    #[test]
    fn target_lands_in_the_middle_of_the_map() {
        let m = light_space_transform(&light(), TARGET, &LightFrustum::default());
        let clip = m.project_point3(TARGET);
        assert!(clip.x.abs() < 1e-4);
        assert!(clip.y.abs() < 1e-4);
        assert!(clip.z > 0.0 && clip.z < 1.0);
    }

    #[test]
    fn orbit_changes_the_transform() {
        let frustum = LightFrustum::default();
        let before = light_space_transform(&light(), TARGET, &frustum);
        let mut l = light();
        l.orbit(90.0);
        assert_ne!(light_space_transform(&l, TARGET, &frustum), before);
    }

    #[test]
    fn frustum_comes_from_config() {
        let config = ShadowConfig {
            half_extent: 50.0,
            near: 1.0,
            far: 80.0,
            ..ShadowConfig::default()
        };
        let frustum = LightFrustum::from(&config);
        assert_eq!(frustum.half_extent, 50.0);
        assert_eq!(frustum.far, 80.0);
    }
}
