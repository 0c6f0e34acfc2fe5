use crate::device::{
    Clear, DepthTargetId, DeviceError, RenderDevice, RenderTarget, ShaderId, ShaderProgram,
    Viewport,
};
use crate::RenderError;
use glam::{Mat3, Mat4, Vec3};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use umbra_common::{ObjectKind, RasterMode};

/// A uniform as uploaded by a pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum UniformValue {
    Mat4(Mat4),
    Mat3(Mat3),
    Vec3(Vec3),
    Float(f32),
    Int(i32),
}

/// Program that keeps the latest value of every uniform it was given.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordingProgram {
    values: BTreeMap<String, UniformValue>,
}

impl RecordingProgram {
    pub fn get(&self, name: &str) -> Option<&UniformValue> {
        self.values.get(name)
    }

    pub fn values(&self) -> &BTreeMap<String, UniformValue> {
        &self.values
    }

    fn set(&mut self, name: &str, value: UniformValue) {
        self.values.insert(name.to_owned(), value);
    }
}

impl ShaderProgram for RecordingProgram {
    fn set_mat4(&mut self, name: &str, value: Mat4) {
        self.set(name, UniformValue::Mat4(value));
    }

    fn set_mat3(&mut self, name: &str, value: Mat3) {
        self.set(name, UniformValue::Mat3(value));
    }

    fn set_vec3(&mut self, name: &str, value: Vec3) {
        self.set(name, UniformValue::Vec3(value));
    }

    fn set_float(&mut self, name: &str, value: f32) {
        self.set(name, UniformValue::Float(value));
    }

    fn set_int(&mut self, name: &str, value: i32) {
        self.set(name, UniformValue::Int(value));
    }
}

/// One device call, in issue order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DeviceCommand {
    AllocateDepthTarget {
        id: DepthTargetId,
        width: u32,
        height: u32,
    },
    BindTarget(RenderTarget),
    SetViewport(Viewport),
    Clear(Clear),
    BindShader(ShaderId),
    BindDepthTexture {
        target: DepthTargetId,
        unit: u32,
    },
    SetRasterMode(RasterMode),
    /// Carries a snapshot of the program's uniforms at draw time.
    DrawMesh {
        object: ObjectKind,
        shader: ShaderId,
        uniforms: BTreeMap<String, UniformValue>,
    },
    DrawSkybox {
        view: Mat4,
        projection: Mat4,
    },
}

/// Device that records every call instead of talking to a GPU.
///
/// Used by tests and by the headless CLI to inspect what a frame issues.
#[derive(Debug)]
pub struct RecordingDevice {
    commands: Vec<DeviceCommand>,
    programs: [RecordingProgram; 4],
    depth_targets: Vec<(u32, u32)>,
    max_texture_size: u32,
    errors: Vec<DeviceError>,
}

impl Default for RecordingDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingDevice {
    pub fn new() -> Self {
        Self::with_max_texture_size(8192)
    }

    /// Reject depth targets larger than `max` on either side.
    pub fn with_max_texture_size(max: u32) -> Self {
        Self {
            commands: Vec::new(),
            programs: Default::default(),
            depth_targets: Vec::new(),
            max_texture_size: max,
            errors: Vec::new(),
        }
    }

    /// Commands recorded since the last `take_commands`.
    pub fn commands(&self) -> &[DeviceCommand] {
        &self.commands
    }

    /// Drain the recorded commands.
    pub fn take_commands(&mut self) -> Vec<DeviceCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Current uniform values of `shader`.
    pub fn program(&self, shader: ShaderId) -> &RecordingProgram {
        &self.programs[shader.index()]
    }

    pub fn depth_target_count(&self) -> usize {
        self.depth_targets.len()
    }

    /// Mesh draws in order as (object, shader, uniforms).
    pub fn draws(
        &self,
    ) -> impl Iterator<Item = (ObjectKind, ShaderId, &BTreeMap<String, UniformValue>)> {
        self.commands.iter().filter_map(|cmd| match cmd {
            DeviceCommand::DrawMesh {
                object,
                shader,
                uniforms,
            } => Some((*object, *shader, uniforms)),
            _ => None,
        })
    }

    /// Queue an error as if the graphics API had reported it.
    pub fn report_error(&mut self, message: impl Into<String>) {
        self.errors.push(DeviceError::new(message));
    }

    /// Human-readable listing of the recorded commands.
    pub fn describe(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "=== {} device commands ===", self.commands.len());
        for cmd in &self.commands {
            let line = match cmd {
                DeviceCommand::AllocateDepthTarget { id, width, height } => {
                    format!("allocate depth#{} {width}x{height}", id.0)
                }
                DeviceCommand::BindTarget(RenderTarget::Screen) => "bind screen".to_owned(),
                DeviceCommand::BindTarget(RenderTarget::Depth(id)) => {
                    format!("bind depth#{}", id.0)
                }
                DeviceCommand::SetViewport(v) => {
                    format!("viewport {},{} {}x{}", v.x, v.y, v.width, v.height)
                }
                DeviceCommand::Clear(c) => format!("clear {c:?}"),
                DeviceCommand::BindShader(s) => format!("use {s:?}"),
                DeviceCommand::BindDepthTexture { target, unit } => {
                    format!("sample depth#{} at unit {unit}", target.0)
                }
                DeviceCommand::SetRasterMode(m) => format!("raster {m:?}"),
                DeviceCommand::DrawMesh {
                    object,
                    shader,
                    uniforms,
                } => format!(
                    "draw {} with {shader:?} ({} uniforms)",
                    object.name(),
                    uniforms.len()
                ),
                DeviceCommand::DrawSkybox { .. } => "draw skybox".to_owned(),
            };
            let _ = writeln!(out, "  {line}");
        }
        out
    }
}

impl RenderDevice for RecordingDevice {
    type Program = RecordingProgram;

    fn allocate_depth_target(
        &mut self,
        width: u32,
        height: u32,
    ) -> Result<DepthTargetId, RenderError> {
        if width == 0 || height == 0 || width > self.max_texture_size || height > self.max_texture_size
        {
            return Err(RenderError::DepthTargetAllocation {
                width,
                height,
                reason: format!("limit is {0}x{0}", self.max_texture_size),
            });
        }
        let id = DepthTargetId(self.depth_targets.len() as u32);
        self.depth_targets.push((width, height));
        self.commands
            .push(DeviceCommand::AllocateDepthTarget { id, width, height });
        Ok(id)
    }

    fn bind_target(&mut self, target: RenderTarget) {
        self.commands.push(DeviceCommand::BindTarget(target));
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.commands.push(DeviceCommand::SetViewport(viewport));
    }

    fn clear(&mut self, clear: Clear) {
        self.commands.push(DeviceCommand::Clear(clear));
    }

    fn bind_shader(&mut self, shader: ShaderId) -> &mut RecordingProgram {
        self.commands.push(DeviceCommand::BindShader(shader));
        &mut self.programs[shader.index()]
    }

    fn bind_depth_texture(&mut self, target: DepthTargetId, unit: u32) {
        self.commands
            .push(DeviceCommand::BindDepthTexture { target, unit });
    }

    fn set_raster_mode(&mut self, mode: RasterMode) {
        self.commands.push(DeviceCommand::SetRasterMode(mode));
    }

    fn draw_mesh(&mut self, object: ObjectKind, shader: ShaderId) {
        let uniforms = self.programs[shader.index()].values.clone();
        self.commands.push(DeviceCommand::DrawMesh {
            object,
            shader,
            uniforms,
        });
    }

    fn draw_skybox(&mut self, view: Mat4, projection: Mat4) {
        self.commands
            .push(DeviceCommand::DrawSkybox { view, projection });
    }

    fn drain_errors(&mut self) -> Vec<DeviceError> {
        std::mem::take(&mut self.errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_device_describes_nothing() {
        let device = RecordingDevice::new();
        assert!(device.describe().contains("0 device commands"));
    }

    #[test]
    fn draw_snapshots_current_uniforms() {
        let mut device = RecordingDevice::new();
        device
            .bind_shader(ShaderId::Lit)
            .set_float("fogDensity", 0.25);
        device.draw_mesh(ObjectKind::Tree, ShaderId::Lit);
        device
            .bind_shader(ShaderId::Lit)
            .set_float("fogDensity", 0.5);
        device.draw_mesh(ObjectKind::Tree, ShaderId::Lit);

        let fogs: Vec<_> = device
            .draws()
            .map(|(_, _, u)| u.get("fogDensity").copied())
            .collect();
        assert_eq!(
            fogs,
            [
                Some(UniformValue::Float(0.25)),
                Some(UniformValue::Float(0.5))
            ]
        );
    }

    #[test]
    fn programs_keep_separate_uniforms() {
        let mut device = RecordingDevice::new();
        device.bind_shader(ShaderId::Depth).set_int("x", 1);
        assert!(device.program(ShaderId::Lit).get("x").is_none());
        assert_eq!(
            device.program(ShaderId::Depth).get("x"),
            Some(&UniformValue::Int(1))
        );
    }

    #[test]
    fn reported_errors_drain_once() {
        let mut device = RecordingDevice::new();
        device.report_error("INVALID_ENUM");
        assert_eq!(device.drain_errors().len(), 1);
        assert!(device.drain_errors().is_empty());
    }

    #[test]
    fn describe_lists_draws() {
        let mut device = RecordingDevice::new();
        device.bind_target(RenderTarget::Screen);
        device.draw_mesh(ObjectKind::Tank, ShaderId::Lit);
        let text = device.describe();
        assert!(text.contains("bind screen"));
        assert!(text.contains("draw tank with Lit"));
    }

    #[test]
    fn rejects_zero_sized_target() {
        let mut device = RecordingDevice::new();
        assert!(device.allocate_depth_target(0, 16).is_err());
        assert_eq!(device.depth_target_count(), 0);
    }
}
