//! Rendering pipeline: renderer-agnostic shadow mapping and forward shading.
//!
//! # Invariants
//! - The renderer reads scene state; only the frame driver mutates it, and
//!   only between frames.
//! - The shadow pass is the single writer of the shadow map; the forward pass
//!   can only sample it through the `ShadowOutput` the shadow pass returns.
//! - Both passes use the same light-space matrix value.
//!
//! # Backends
//! Passes talk to a `RenderDevice`. `RecordingDevice` captures commands for
//! tests and headless runs; the wgpu backend lives in `umbra-render-wgpu`.

mod device;
mod error;
mod forward;
mod frame;
mod light_space;
mod recording;
mod shadow;
mod transform;

pub mod uniforms;

pub use device::{
    Clear, DepthTargetId, DeviceError, RenderDevice, RenderTarget, ShaderId, ShaderProgram,
    Viewport,
};
pub use error::RenderError;
pub use forward::{ForwardPass, SHADOW_MAP_UNIT};
pub use frame::{FrameDriver, FrameReport};
pub use light_space::{LightFrustum, light_space_transform};
pub use recording::{DeviceCommand, RecordingDevice, RecordingProgram, UniformValue};
pub use shadow::{PassState, ShadowMap, ShadowOutput, ShadowPass};
pub use transform::{
    LIGHT_MARKER, SCENE_OBJECTS, Step, TransformRule, compute_transform, normal_matrix, rule_for,
    skybox_view,
};

pub fn crate_info() -> &'static str {
    "umbra-render v0.1.0"
}
