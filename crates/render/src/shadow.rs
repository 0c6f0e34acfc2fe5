use crate::device::{Clear, DepthTargetId, RenderDevice, RenderTarget, ShaderId, Viewport};
use crate::light_space::{LightFrustum, light_space_transform};
use crate::transform::{SCENE_OBJECTS, compute_transform};
use crate::{RenderError, ShaderProgram, uniforms};
use glam::Mat4;
use umbra_common::RasterMode;
use umbra_kernel::{Scene, ShadowConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassState {
    Idle,
    Rendering,
}

/// Fixed-resolution depth target the shadow pass renders into.
#[derive(Debug, Clone, PartialEq)]
pub struct ShadowMap {
    width: u32,
    height: u32,
    target: Option<DepthTargetId>,
}

impl ShadowMap {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            target: None,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Depth target, once allocated.
    pub fn target(&self) -> Option<DepthTargetId> {
        self.target
    }

    pub fn is_allocated(&self) -> bool {
        self.target.is_some()
    }

    /// Viewport covering the whole map.
    pub fn viewport(&self) -> Viewport {
        Viewport::sized(self.width, self.height)
    }
}

/// What the forward pass needs from a completed shadow pass. Only
/// `ShadowPass::render` hands these out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowOutput {
    pub(crate) depth: DepthTargetId,
    pub(crate) light_space: Mat4,
    pub(crate) draws: usize,
}

impl ShadowOutput {
    /// Depth target the shadow pass rendered into.
    pub fn depth(&self) -> DepthTargetId {
        self.depth
    }

    /// Light projection times light view for this frame.
    pub fn light_space(&self) -> Mat4 {
        self.light_space
    }

    /// Meshes drawn into the depth target.
    pub fn draws(&self) -> usize {
        self.draws
    }
}

/// Renders scene depth from the light. Sole writer of the shadow map.
#[derive(Debug)]
pub struct ShadowPass {
    map: ShadowMap,
    frustum: LightFrustum,
    state: PassState,
}

impl ShadowPass {
    pub fn new(config: &ShadowConfig) -> Self {
        Self {
            map: ShadowMap::new(config.width, config.height),
            frustum: LightFrustum::from(config),
            state: PassState::Idle,
        }
    }

    pub fn map(&self) -> &ShadowMap {
        &self.map
    }

    pub fn frustum(&self) -> &LightFrustum {
        &self.frustum
    }

    /// Whether a shadow pass is in progress.
    pub fn state(&self) -> PassState {
        self.state
    }

    /// Create the depth target. Calling again returns the existing one.
    pub fn allocate<D: RenderDevice>(&mut self, device: &mut D) -> Result<DepthTargetId, RenderError> {
        if let Some(target) = self.map.target {
            return Ok(target);
        }
        let target = device.allocate_depth_target(self.map.width, self.map.height)?;
        tracing::info!(
            width = self.map.width,
            height = self.map.height,
            "shadow map allocated"
        );
        self.map.target = Some(target);
        Ok(target)
    }

    /// Draw every scene object depth-only from the light, then hand the screen
    /// back with `main_viewport` restored.
    pub fn render<D: RenderDevice>(
        &mut self,
        device: &mut D,
        scene: &Scene,
        main_viewport: Viewport,
    ) -> Result<ShadowOutput, RenderError> {
        let depth = self.map.target.ok_or(RenderError::ShadowTargetUnallocated)?;
        debug_assert_eq!(self.state, PassState::Idle);
        self.state = PassState::Rendering;

        let light_space = light_space_transform(
            scene.light(),
            scene.camera().target_point(),
            &self.frustum,
        );

        device.bind_target(RenderTarget::Depth(depth));
        device.set_viewport(self.map.viewport());
        device.clear(Clear::DepthOnly);
        device.set_raster_mode(RasterMode::Fill);
        device
            .bind_shader(ShaderId::Depth)
            .set_mat4(uniforms::LIGHT_SPACE, light_space);

        for rule in &SCENE_OBJECTS {
            let model = compute_transform(rule.object, scene);
            device
                .bind_shader(ShaderId::Depth)
                .set_mat4(uniforms::MODEL, model);
            device.draw_mesh(rule.object, ShaderId::Depth);
        }

        device.bind_target(RenderTarget::Screen);
        device.set_viewport(main_viewport);
        self.state = PassState::Idle;

        tracing::trace!(draws = SCENE_OBJECTS.len(), "shadow pass done");
        Ok(ShadowOutput {
            depth,
            light_space,
            draws: SCENE_OBJECTS.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::{DeviceCommand, RecordingDevice, UniformValue};
    use umbra_common::ObjectKind;
    use umbra_kernel::SceneConfig;

    fn scene() -> Scene {
        Scene::from_config(&SceneConfig::default()).unwrap()
    }

    const MAIN: Viewport = Viewport {
        x: 0,
        y: 0,
        width: 1920,
        height: 1080,
    };

    #[test]
    fn unallocated_target_fails_fast() {
        let mut pass = ShadowPass::new(&ShadowConfig::default());
        let mut device = RecordingDevice::new();
        let err = pass.render(&mut device, &scene(), MAIN).unwrap_err();
        assert_eq!(err, RenderError::ShadowTargetUnallocated);
        assert!(device.commands().is_empty());
        assert_eq!(pass.state(), PassState::Idle);
    }

    #[test]
    fn allocation_is_idempotent() {
        let mut pass = ShadowPass::new(&ShadowConfig::default());
        let mut device = RecordingDevice::new();
        let a = pass.allocate(&mut device).unwrap();
        let b = pass.allocate(&mut device).unwrap();
        assert_eq!(a, b);
        assert_eq!(device.depth_target_count(), 1);
        assert!(pass.map().is_allocated());
    }

    #[test]
    fn oversized_map_fails_to_allocate() {
        let mut pass = ShadowPass::new(&ShadowConfig::default());
        let mut device = RecordingDevice::with_max_texture_size(2048);
        let err = pass.allocate(&mut device).unwrap_err();
        assert!(matches!(err, RenderError::DepthTargetAllocation { width: 4096, .. }));
        assert!(!pass.map().is_allocated());
    }

    #[test]
    fn renders_depth_then_restores_screen() {
        let mut pass = ShadowPass::new(&ShadowConfig::default());
        let mut device = RecordingDevice::new();
        let depth = pass.allocate(&mut device).unwrap();
        device.take_commands();

        let out = pass.render(&mut device, &scene(), MAIN).unwrap();
        let cmds = device.commands();

        assert_eq!(cmds[0], DeviceCommand::BindTarget(RenderTarget::Depth(depth)));
        assert_eq!(cmds[1], DeviceCommand::SetViewport(Viewport::sized(4096, 2048)));
        assert_eq!(cmds[2], DeviceCommand::Clear(Clear::DepthOnly));
        let n = cmds.len();
        assert_eq!(cmds[n - 2], DeviceCommand::BindTarget(RenderTarget::Screen));
        assert_eq!(cmds[n - 1], DeviceCommand::SetViewport(MAIN));

        assert_eq!(out.depth, depth);
        assert_eq!(out.draws, 5);
        assert_eq!(pass.state(), PassState::Idle);
    }

    #[test]
    fn draws_every_object_depth_only_with_its_model() {
        let s = scene();
        let mut pass = ShadowPass::new(&ShadowConfig::default());
        let mut device = RecordingDevice::new();
        pass.allocate(&mut device).unwrap();
        let out = pass.render(&mut device, &s, MAIN).unwrap();

        let draws: Vec<_> = device.draws().collect();
        let objects: Vec<_> = draws.iter().map(|d| d.0).collect();
        assert_eq!(
            objects,
            [
                ObjectKind::Bird,
                ObjectKind::Tank,
                ObjectKind::Tree,
                ObjectKind::Leaves,
                ObjectKind::BackgroundScene
            ]
        );
        for (object, shader, values) in draws {
            assert_eq!(shader, ShaderId::Depth);
            assert_eq!(
                values.get(uniforms::MODEL),
                Some(&UniformValue::Mat4(compute_transform(object, &s)))
            );
            assert_eq!(
                values.get(uniforms::LIGHT_SPACE),
                Some(&UniformValue::Mat4(out.light_space))
            );
            assert!(values.get(uniforms::NORMAL_MATRIX).is_none());
        }
    }
}
