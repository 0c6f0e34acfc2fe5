use glam::Vec3;
use serde::{Deserialize, Serialize};

/// The fixed world-up axis shared by the camera, the light and every
/// rotation in the scene.
pub const WORLD_UP: Vec3 = Vec3::Y;

/// Wrap an angle in degrees into `[0, 360)`.
///
/// Values past 360 keep the remainder; negative values wrap to 360 plus the
/// (negative) remainder.
pub fn wrap_degrees(degrees: f32) -> f32 {
    let wrapped = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs.
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

/// Direction of a discrete camera translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoveDirection {
    Forward,
    Backward,
    Left,
    Right,
}

/// Polygon rasterization mode for the lit pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RasterMode {
    #[default]
    Fill,
    Wireframe,
    Points,
}

/// Every renderable in the scene. The first five are drawn in both passes,
/// in this order; the light marker only appears in the forward pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ObjectKind {
    Bird,
    Tank,
    Tree,
    Leaves,
    BackgroundScene,
    LightMarker,
}

impl ObjectKind {
    pub const ALL: [ObjectKind; 6] = [
        ObjectKind::Bird,
        ObjectKind::Tank,
        ObjectKind::Tree,
        ObjectKind::Leaves,
        ObjectKind::BackgroundScene,
        ObjectKind::LightMarker,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ObjectKind::Bird => "bird",
            ObjectKind::Tank => "tank",
            ObjectKind::Tree => "tree",
            ObjectKind::Leaves => "leaves",
            ObjectKind::BackgroundScene => "background",
            ObjectKind::LightMarker => "light-marker",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_keeps_remainder_above_360() {
        assert_eq!(wrap_degrees(360.5), 0.5);
        assert_eq!(wrap_degrees(720.0), 0.0);
    }

    #[test]
    fn wrap_negative_adds_360() {
        assert_eq!(wrap_degrees(-0.5), 359.5);
        assert_eq!(wrap_degrees(-370.0), 350.0);
    }

    #[test]
    fn wrap_never_returns_360() {
        let w = wrap_degrees(-1e-6);
        assert!((0.0..360.0).contains(&w));
    }

    #[test]
    fn raster_mode_defaults_to_fill() {
        assert_eq!(RasterMode::default(), RasterMode::Fill);
    }

    #[test]
    fn object_names_are_unique() {
        let mut names: Vec<_> = ObjectKind::ALL.iter().map(|o| o.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), ObjectKind::ALL.len());
    }
}
