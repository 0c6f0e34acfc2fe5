use crate::device::{RenderDevice, Viewport};
use crate::forward::ForwardPass;
use crate::shadow::ShadowPass;
use crate::RenderError;
use umbra_input::Action;
use umbra_kernel::{Scene, ShadowConfig};

/// What one frame did.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    pub index: u64,
    pub shadow_draws: usize,
    pub forward_draws: usize,
    pub device_errors: usize,
}

/// Runs the per-frame sequence: apply input, advance animation, shadow pass,
/// forward pass, drain device errors.
#[derive(Debug)]
pub struct FrameDriver {
    shadow: ShadowPass,
    forward: ForwardPass,
    viewport: Viewport,
    frames: u64,
}

impl FrameDriver {
    /// Driver for a `width` x `height` framebuffer. Call `initialize` before
    /// the first frame.
    pub fn new(shadow: &ShadowConfig, width: u32, height: u32) -> Self {
        Self {
            shadow: ShadowPass::new(shadow),
            forward: ForwardPass::new(),
            viewport: Viewport::sized(width, height),
            frames: 0,
        }
    }

    /// Allocate the shadow map. Must succeed before the first frame.
    pub fn initialize<D: RenderDevice>(&mut self, device: &mut D) -> Result<(), RenderError> {
        self.shadow.allocate(device)?;
        tracing::info!(
            width = self.viewport.width,
            height = self.viewport.height,
            "frame driver ready"
        );
        Ok(())
    }

    /// Screen viewport used by the forward pass.
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn shadow_pass(&self) -> &ShadowPass {
        &self.shadow
    }

    /// Frames completed since construction.
    pub fn frames_rendered(&self) -> u64 {
        self.frames
    }

    /// Framebuffer resize. Zero sizes (minimized window) are ignored.
    pub fn resize(&mut self, scene: &mut Scene, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.viewport = Viewport::sized(width, height);
        scene.resize(width, height);
    }

    /// Render one frame. `elapsed` is seconds since start.
    pub fn frame<D: RenderDevice>(
        &mut self,
        device: &mut D,
        scene: &mut Scene,
        actions: &[Action],
        elapsed: f32,
    ) -> Result<FrameReport, RenderError> {
        if !self.shadow.map().is_allocated() {
            return Err(RenderError::ShadowTargetUnallocated);
        }
        let index = self.frames;
        let span = tracing::debug_span!("frame", index);
        let _enter = span.enter();

        for action in actions {
            scene.apply(action);
        }
        scene.advance(elapsed);

        let shadow = self.shadow.render(device, scene, self.viewport)?;
        let forward_draws = self.forward.render(device, scene, &shadow, self.viewport);

        let errors = device.drain_errors();
        for error in &errors {
            tracing::warn!(%error, "graphics API error");
        }

        self.frames += 1;
        Ok(FrameReport {
            index,
            shadow_draws: shadow.draws,
            forward_draws,
            device_errors: errors.len(),
        })
    }
}
