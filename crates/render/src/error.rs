use thiserror::Error;

/// Pipeline failures. All of them abort the frame.
#[derive(Debug, Error, PartialEq)]
pub enum RenderError {
    /// The shadow pass ran before its depth target existed.
    #[error("shadow map depth target has not been allocated")]
    ShadowTargetUnallocated,
    #[error("failed to allocate {width}x{height} depth target: {reason}")]
    DepthTargetAllocation {
        width: u32,
        height: u32,
        reason: String,
    },
}
