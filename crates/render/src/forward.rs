use crate::device::{Clear, RenderDevice, RenderTarget, ShaderId, ShaderProgram, Viewport};
use crate::shadow::ShadowOutput;
use crate::transform::{LIGHT_MARKER, SCENE_OBJECTS, compute_transform, normal_matrix, skybox_view};
use crate::uniforms;
use glam::Mat4;
use umbra_common::RasterMode;
use umbra_kernel::Scene;

/// Texture unit the lit shader samples the shadow map from.
pub const SHADOW_MAP_UNIT: u32 = 3;

/// Final lit pass into the screen target.
#[derive(Debug, Default)]
pub struct ForwardPass {
    draws: usize,
}

impl ForwardPass {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mesh draws issued by the last `render`.
    pub fn last_draws(&self) -> usize {
        self.draws
    }

    /// Draw the lit objects, the light marker, then the skybox. `shadow` must
    /// come from this frame's shadow pass. Returns the number of mesh draws.
    pub fn render<D: RenderDevice>(
        &mut self,
        device: &mut D,
        scene: &Scene,
        shadow: &ShadowOutput,
        viewport: Viewport,
    ) -> usize {
        let view = scene.camera().view_matrix();
        let projection = scene.projection().matrix();
        let light = scene.light();
        let point = scene.point_light();

        device.bind_target(RenderTarget::Screen);
        device.set_viewport(viewport);
        device.clear(Clear::ColorAndDepth);

        let lit = device.bind_shader(ShaderId::Lit);
        lit.set_mat4(uniforms::LIGHT_SPACE, shadow.light_space);
        lit.set_mat4(uniforms::VIEW, view);
        lit.set_mat4(uniforms::PROJECTION, projection);
        lit.set_mat3(uniforms::LIGHT_DIR_MATRIX, normal_matrix(view, Mat4::IDENTITY));
        lit.set_vec3(uniforms::LIGHT_DIR, light.rotated_direction());
        lit.set_vec3(uniforms::LIGHT_COLOR, light.color());
        lit.set_float(uniforms::FOG_DENSITY, scene.animation().fog_density);
        lit.set_int(uniforms::POINT_LIGHT_ENABLED, i32::from(point.enabled));
        lit.set_vec3(uniforms::POINT_LIGHT_POSITION, point.position);
        lit.set_int(uniforms::SHADOW_MAP, SHADOW_MAP_UNIT as i32);
        device.bind_depth_texture(shadow.depth, SHADOW_MAP_UNIT);

        device.set_raster_mode(scene.raster_mode());
        let mut draws = 0;
        for rule in &SCENE_OBJECTS {
            let model = compute_transform(rule.object, scene);
            let lit = device.bind_shader(ShaderId::Lit);
            lit.set_mat4(uniforms::MODEL, model);
            lit.set_mat3(uniforms::NORMAL_MATRIX, normal_matrix(view, model));
            device.draw_mesh(rule.object, ShaderId::Lit);
            tracing::trace!(object = rule.object.name(), "lit draw");
            draws += 1;
        }
        device.set_raster_mode(RasterMode::Fill);

        let marker = device.bind_shader(ShaderId::LightMarker);
        marker.set_mat4(uniforms::VIEW, view);
        marker.set_mat4(uniforms::PROJECTION, projection);
        marker.set_mat4(uniforms::MODEL, compute_transform(LIGHT_MARKER.object, scene));
        device.draw_mesh(LIGHT_MARKER.object, ShaderId::LightMarker);
        draws += 1;

        device.draw_skybox(skybox_view(view), projection);

        self.draws = draws;
        draws
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::{DeviceCommand, RecordingDevice, UniformValue};
    use crate::shadow::ShadowPass;
    use umbra_common::ObjectKind;
    use umbra_input::Action;
    use umbra_kernel::{SceneConfig, ShadowConfig};

    const MAIN: Viewport = Viewport {
        x: 0,
        y: 0,
        width: 1280,
        height: 720,
    };

    fn scene() -> Scene {
        Scene::from_config(&SceneConfig::default()).unwrap()
    }

    fn run(scene: &Scene) -> (RecordingDevice, ShadowOutput) {
        let mut device = RecordingDevice::new();
        let mut shadow = ShadowPass::new(&ShadowConfig::default());
        shadow.allocate(&mut device).unwrap();
        let output = shadow.render(&mut device, scene, MAIN).unwrap();
        ForwardPass::new().render(&mut device, scene, &output, MAIN);
        (device, output)
    }

    fn lit_draws(device: &RecordingDevice) -> Vec<(ObjectKind, &std::collections::BTreeMap<String, UniformValue>)> {
        device
            .draws()
            .filter(|(_, shader, _)| *shader == ShaderId::Lit)
            .map(|(object, _, values)| (object, values))
            .collect()
    }

    #[test]
    fn draws_objects_then_marker_then_skybox() {
        let (device, _) = run(&scene());
        let order: Vec<_> = device
            .draws()
            .filter(|(_, shader, _)| *shader != ShaderId::Depth)
            .map(|(object, _, _)| object)
            .collect();
        assert_eq!(
            order,
            [
                ObjectKind::Bird,
                ObjectKind::Tank,
                ObjectKind::Tree,
                ObjectKind::Leaves,
                ObjectKind::BackgroundScene,
                ObjectKind::LightMarker
            ]
        );
        assert!(matches!(
            device.commands().last(),
            Some(DeviceCommand::DrawSkybox { .. })
        ));
    }

    #[test]
    fn light_space_matches_shadow_pass_exactly() {
        let mut s = scene();
        s.apply(&Action::OrbitLight(77.5));
        let (device, output) = run(&s);
        for (_, shader, values) in device.draws() {
            if matches!(shader, ShaderId::Lit | ShaderId::Depth) {
                assert_eq!(
                    values.get(uniforms::LIGHT_SPACE),
                    Some(&UniformValue::Mat4(output.light_space))
                );
            }
        }
    }

    #[test]
    fn shadow_map_bound_before_first_lit_draw() {
        let (device, output) = run(&scene());
        let commands = device.commands();
        let bind = commands
            .iter()
            .position(|c| {
                *c == DeviceCommand::BindDepthTexture {
                    target: output.depth,
                    unit: SHADOW_MAP_UNIT,
                }
            })
            .unwrap();
        let first_lit = commands
            .iter()
            .position(|c| matches!(c, DeviceCommand::DrawMesh { shader: ShaderId::Lit, .. }))
            .unwrap();
        assert!(bind < first_lit);
        let (_, values) = lit_draws(&device)[0];
        assert_eq!(values.get(uniforms::SHADOW_MAP), Some(&UniformValue::Int(3)));
    }

    #[test]
    fn toggles_reach_lit_uniforms() {
        let mut s = scene();
        s.apply(&Action::SetPointLight(true));
        s.apply(&Action::AdjustFog(0.25));
        let (device, _) = run(&s);
        for (_, values) in lit_draws(&device) {
            assert_eq!(values.get(uniforms::POINT_LIGHT_ENABLED), Some(&UniformValue::Int(1)));
            assert_eq!(values.get(uniforms::FOG_DENSITY), Some(&UniformValue::Float(0.25)));
        }

        s.apply(&Action::SetPointLight(false));
        let (device, _) = run(&s);
        let (_, values) = lit_draws(&device)[0];
        assert_eq!(values.get(uniforms::POINT_LIGHT_ENABLED), Some(&UniformValue::Int(0)));
    }

    #[test]
    fn per_object_normal_matrix_uses_camera_view() {
        let mut s = scene();
        s.apply(&Action::RotateScene(40.0));
        let (device, _) = run(&s);
        let view = s.camera().view_matrix();
        for (object, values) in lit_draws(&device) {
            let model = compute_transform(object, &s);
            assert_eq!(values.get(uniforms::MODEL), Some(&UniformValue::Mat4(model)));
            assert_eq!(
                values.get(uniforms::NORMAL_MATRIX),
                Some(&UniformValue::Mat3(normal_matrix(view, model)))
            );
        }
    }

    #[test]
    fn raster_mode_applies_to_lit_draws_only() {
        let mut s = scene();
        s.apply(&Action::SetRasterMode(RasterMode::Wireframe));
        let (device, _) = run(&s);
        let modes: Vec<_> = device
            .commands()
            .iter()
            .filter_map(|c| match c {
                DeviceCommand::SetRasterMode(m) => Some(*m),
                _ => None,
            })
            .collect();
        // shadow pass, lit objects, marker and skybox
        assert_eq!(modes, [RasterMode::Fill, RasterMode::Wireframe, RasterMode::Fill]);
    }

    #[test]
    fn skybox_view_has_no_translation() {
        let (device, _) = run(&scene());
        let Some(DeviceCommand::DrawSkybox { view, .. }) = device.commands().last() else {
            panic!("skybox not drawn last");
        };
        assert_eq!(view.w_axis.truncate(), glam::Vec3::ZERO);
    }

    #[test]
    fn screen_cleared_before_lit_draws() {
        let (device, _) = run(&scene());
        let commands = device.commands();
        let clear = commands
            .iter()
            .position(|c| *c == DeviceCommand::Clear(Clear::ColorAndDepth))
            .unwrap();
        let first_lit = commands
            .iter()
            .position(|c| matches!(c, DeviceCommand::DrawMesh { shader: ShaderId::Lit, .. }))
            .unwrap();
        assert!(clear < first_lit);
    }
}
