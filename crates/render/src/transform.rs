use glam::{Mat3, Mat4, Vec3};
use umbra_common::ObjectKind;
use umbra_kernel::Scene;

/// One factor of an object's model matrix. Steps are right-multiplied in
/// order starting from identity, so the last step is applied to the mesh
/// first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Step {
    /// Uniform base scale.
    Scale(f32),
    /// Shared scene rotation about world up.
    SceneRotation,
    /// Bird orbit phase about world up.
    BirdOrbit,
    /// Tank offset, forward travel along -z.
    TankOffset,
    /// Wind sway along x.
    WindSway,
    /// Light orbit angle about world up.
    LightOrbit,
    /// Un-rotated light eye position.
    LightOffset,
}

impl Step {
    pub fn matrix(&self, scene: &Scene) -> Mat4 {
        let anim = scene.animation();
        match *self {
            Step::Scale(s) => Mat4::from_scale(Vec3::splat(s)),
            Step::SceneRotation => Mat4::from_rotation_y(anim.scene_angle.to_radians()),
            Step::BirdOrbit => Mat4::from_rotation_y(anim.bird_rotation.to_radians()),
            Step::TankOffset => Mat4::from_translation(Vec3::new(anim.tank.x, 0.0, -anim.tank.y)),
            Step::WindSway => Mat4::from_translation(Vec3::new(anim.wind_sway, 0.0, 0.0)),
            Step::LightOrbit => scene.light().orbit_rotation(),
            Step::LightOffset => Mat4::from_translation(scene.light().offset()),
        }
    }
}

/// How one object's model matrix is composed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformRule {
    pub object: ObjectKind,
    pub steps: &'static [Step],
}

/// Objects drawn by both passes, in draw order.
pub const SCENE_OBJECTS: [TransformRule; 5] = [
    TransformRule {
        object: ObjectKind::Bird,
        steps: &[Step::Scale(0.5), Step::SceneRotation, Step::BirdOrbit],
    },
    TransformRule {
        object: ObjectKind::Tank,
        steps: &[Step::SceneRotation, Step::TankOffset],
    },
    TransformRule {
        object: ObjectKind::Tree,
        steps: &[Step::SceneRotation],
    },
    TransformRule {
        object: ObjectKind::Leaves,
        steps: &[Step::SceneRotation, Step::WindSway],
    },
    TransformRule {
        object: ObjectKind::BackgroundScene,
        steps: &[Step::SceneRotation],
    },
];

/// The light marker sits at the light's orbit position.
pub const LIGHT_MARKER: TransformRule = TransformRule {
    object: ObjectKind::LightMarker,
    steps: &[Step::LightOrbit, Step::LightOffset],
};

pub fn rule_for(object: ObjectKind) -> &'static TransformRule {
    match object {
        ObjectKind::LightMarker => &LIGHT_MARKER,
        ObjectKind::Bird => &SCENE_OBJECTS[0],
        ObjectKind::Tank => &SCENE_OBJECTS[1],
        ObjectKind::Tree => &SCENE_OBJECTS[2],
        ObjectKind::Leaves => &SCENE_OBJECTS[3],
        ObjectKind::BackgroundScene => &SCENE_OBJECTS[4],
    }
}

/// Model matrix for `object` given the current scene. Pure.
pub fn compute_transform(object: ObjectKind, scene: &Scene) -> Mat4 {
    rule_for(object)
        .steps
        .iter()
        .fold(Mat4::IDENTITY, |model, step| model * step.matrix(scene))
}

/// Inverse-transpose of the upper 3x3 of `view * model`.
pub fn normal_matrix(view: Mat4, model: Mat4) -> Mat3 {
    Mat3::from_mat4(view * model).inverse().transpose()
}

/// Keep the rotation of `view` and drop its translation, so the skybox
/// never moves with the camera.
pub fn skybox_view(view: Mat4) -> Mat4 {
    Mat4::from_mat3(Mat3::from_mat4(view))
}

#[cfg(test)]
mod tests {
    use super::*;
    use umbra_input::Action;
    use umbra_kernel::SceneConfig;

    fn scene() -> Scene {
        Scene::from_config(&SceneConfig::default()).unwrap()
    }

    #[test]
    fn table_follows_draw_order() {
        let order: Vec<_> = SCENE_OBJECTS.iter().map(|r| r.object).collect();
        assert_eq!(
            order,
            [
                ObjectKind::Bird,
                ObjectKind::Tank,
                ObjectKind::Tree,
                ObjectKind::Leaves,
                ObjectKind::BackgroundScene
            ]
        );
        for kind in ObjectKind::ALL {
            assert_eq!(rule_for(kind).object, kind);
        }
    }

    #[test]
    fn rotate_only_objects_follow_scene_angle() {
        let mut s = scene();
        s.apply(&Action::RotateScene(30.0));
        let expected = Mat4::from_rotation_y(30.0_f32.to_radians());
        assert_eq!(compute_transform(ObjectKind::Tree, &s), expected);
        assert_eq!(compute_transform(ObjectKind::BackgroundScene, &s), expected);
    }

    #[test]
    fn tank_offset_is_rotated_with_the_scene() {
        let mut s = scene();
        s.apply(&Action::RotateScene(90.0));
        s.apply(&Action::MoveTank { dx: 1.0, dz: 0.0 });
        let origin = compute_transform(ObjectKind::Tank, &s).transform_point3(Vec3::ZERO);
        assert!(origin.abs_diff_eq(Vec3::new(0.0, 0.0, -1.0), 1e-6));
    }

    #[test]
    fn tank_forward_travel_is_negative_z() {
        let mut s = scene();
        s.apply(&Action::MoveTank { dx: 0.0, dz: 2.0 });
        let origin = compute_transform(ObjectKind::Tank, &s).transform_point3(Vec3::ZERO);
        assert!(origin.abs_diff_eq(Vec3::new(0.0, 0.0, -2.0), 1e-6));
    }

    #[test]
    fn leaves_sway_with_the_wind() {
        let mut s = scene();
        s.advance(std::f32::consts::FRAC_PI_2);
        let origin = compute_transform(ObjectKind::Leaves, &s).transform_point3(Vec3::ZERO);
        assert!(origin.abs_diff_eq(Vec3::new(0.1, 0.0, 0.0), 1e-6));
        // The trunk stays put.
        let trunk = compute_transform(ObjectKind::Tree, &s).transform_point3(Vec3::ZERO);
        assert_eq!(trunk, Vec3::ZERO);
    }

    #[test]
    fn bird_is_scaled_then_orbits() {
        let mut s = scene();
        let p = compute_transform(ObjectKind::Bird, &s).transform_point3(Vec3::new(2.0, 0.0, 0.0));
        assert!(p.abs_diff_eq(Vec3::new(1.0, 0.0, 0.0), 1e-6));

        // Scene angle and bird phase add up.
        s.apply(&Action::RotateScene(45.0));
        for _ in 0..150 {
            s.advance(0.0);
        }
        let p = compute_transform(ObjectKind::Bird, &s).transform_point3(Vec3::new(2.0, 0.0, 0.0));
        assert!(p.abs_diff_eq(Vec3::new(0.0, 0.0, -1.0), 1e-4));
    }

    #[test]
    fn marker_sits_at_light_position() {
        let mut s = scene();
        s.apply(&Action::OrbitLight(73.5));
        let marker = compute_transform(ObjectKind::LightMarker, &s).transform_point3(Vec3::ZERO);
        assert!(marker.abs_diff_eq(s.light().position(), 1e-4));
    }

    #[test]
    fn transforms_do_not_depend_on_draw_history() {
        let mut s = scene();
        s.apply(&Action::RotateScene(12.0));
        s.apply(&Action::MoveTank { dx: 3.0, dz: 5.0 });
        let first = compute_transform(ObjectKind::BackgroundScene, &s);
        for rule in &SCENE_OBJECTS {
            let _ = compute_transform(rule.object, &s);
        }
        assert_eq!(compute_transform(ObjectKind::BackgroundScene, &s), first);
    }

    #[test]
    fn normal_matrix_inverts_non_uniform_scale() {
        let model = Mat4::from_scale(Vec3::new(2.0, 1.0, 4.0));
        let n = normal_matrix(Mat4::IDENTITY, model);
        assert!(
            n.abs_diff_eq(Mat3::from_diagonal(Vec3::new(0.5, 1.0, 0.25)), 1e-6)
        );
    }

    #[test]
    fn normal_matrix_of_rigid_view_model_is_its_rotation() {
        let s = scene();
        let view = s.camera().view_matrix();
        let model = Mat4::from_rotation_y(0.7);
        let n = normal_matrix(view, model);
        assert!(n.abs_diff_eq(Mat3::from_mat4(view * model), 1e-5));
    }

    #[test]
    fn skybox_view_drops_translation() {
        let s = scene();
        let view = s.camera().view_matrix();
        let sky = skybox_view(view);
        assert_eq!(sky.w_axis.truncate(), Vec3::ZERO);
        assert_eq!(Mat3::from_mat4(sky), Mat3::from_mat4(view));
    }
}
