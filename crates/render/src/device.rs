use crate::RenderError;
use glam::{Mat3, Mat4, Vec3};
use serde::Serialize;
use thiserror::Error;
use umbra_common::{ObjectKind, RasterMode};

/// The four shader programs the pipeline uploads uniforms to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ShaderId {
    /// Full shading with shadows, fog and the optional point light.
    Lit,
    /// Depth-only, used to fill the shadow map.
    Depth,
    /// Unlit marker at the light position.
    LightMarker,
    Skybox,
}

impl ShaderId {
    pub const ALL: [ShaderId; 4] = [
        ShaderId::Lit,
        ShaderId::Depth,
        ShaderId::LightMarker,
        ShaderId::Skybox,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Handle to an offscreen depth texture owned by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct DepthTargetId(pub u32);

/// Where draws land.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RenderTarget {
    /// The window's framebuffer.
    Screen,
    Depth(DepthTargetId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Viewport {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    /// Viewport anchored at the origin.
    pub fn sized(width: u32, height: u32) -> Self {
        Self {
            x: 0,
            y: 0,
            width,
            height,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Clear {
    DepthOnly,
    ColorAndDepth,
}

/// An error reported by the graphics API. Logged, never used for control flow.
#[derive(Debug, Clone, Error, PartialEq, Serialize)]
#[error("{message}")]
pub struct DeviceError {
    pub message: String,
}

impl DeviceError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Uniform upload keyed by name. Unknown names are ignored, as a GL program
/// ignores uniforms it does not declare.
pub trait ShaderProgram {
    fn set_mat4(&mut self, name: &str, value: Mat4);
    fn set_mat3(&mut self, name: &str, value: Mat3);
    fn set_vec3(&mut self, name: &str, value: Vec3);
    fn set_float(&mut self, name: &str, value: f32);
    fn set_int(&mut self, name: &str, value: i32);
}

/// Immediate-mode view of a graphics backend.
///
/// Calls are issued in program order; a backend may defer the GPU work but
/// must preserve that order, in particular a depth target written by one
/// pass must be complete before a later pass samples it.
pub trait RenderDevice {
    type Program: ShaderProgram;

    fn allocate_depth_target(&mut self, width: u32, height: u32)
    -> Result<DepthTargetId, RenderError>;

    fn bind_target(&mut self, target: RenderTarget);

    fn set_viewport(&mut self, viewport: Viewport);

    fn clear(&mut self, clear: Clear);

    /// Make `shader` current and return it for uniform upload.
    fn bind_shader(&mut self, shader: ShaderId) -> &mut Self::Program;

    /// Expose a depth target as a sampled texture at `unit`.
    fn bind_depth_texture(&mut self, target: DepthTargetId, unit: u32);

    fn set_raster_mode(&mut self, mode: RasterMode);

    /// Draw the mesh registered for `object` with the current uniforms of
    /// `shader`.
    fn draw_mesh(&mut self, object: ObjectKind, shader: ShaderId);

    /// Draw the skybox cube. `view` should carry no translation.
    fn draw_skybox(&mut self, view: Mat4, projection: Mat4);

    /// Errors the API reported since the last call.
    fn drain_errors(&mut self) -> Vec<DeviceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shader_indices_are_dense() {
        for (i, shader) in ShaderId::ALL.iter().enumerate() {
            assert_eq!(shader.index(), i);
        }
    }

    #[test]
    fn device_error_displays_message() {
        assert_eq!(DeviceError::new("INVALID_OPERATION").to_string(), "INVALID_OPERATION");
    }
}
