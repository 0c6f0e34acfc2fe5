//! wgpu render backend.
//!
//! `WgpuRenderer` implements `umbra_render::RenderDevice`: passes record
//! targets, uniforms and draws through the trait, and `submit` encodes them
//! into one command buffer in issue order.
//!
//! # Invariants
//! - Renderer never mutates scene state.
//! - A depth target is written by an earlier render pass than any pass that
//!   samples it.

mod gpu;
mod mesh;
mod shaders;

pub use gpu::{GpuProgram, ShaderUniforms, WgpuRenderer};
pub use mesh::{MeshData, Vertex};
