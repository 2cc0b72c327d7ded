//! Render pass trait
//!
//! Every stage of the forward pipeline implements [`RenderPass`]. The
//! orchestrator only relies on the trait: priority for ordering and two
//! capability queries for target handling, never on pass identity.

use super::context::RenderContext;
use super::frame::FrameEncoder;
use super::stage::PassPriority;
use crate::renderer::core::GpuContext;
use crate::scene::RenderObject;

/// Summary of one pass execution, collected into the frame report.
#[derive(Debug, Clone, PartialEq)]
pub struct PassResult {
    pub name: String,
    pub objects_rendered: u32,
    /// CPU time spent recording, in milliseconds.
    pub time_ms: f32,
    pub note: Option<String>,
}

impl PassResult {
    #[must_use]
    pub fn new(name: &str, objects_rendered: u32, time_ms: f32) -> Self {
        Self {
            name: name.to_string(),
            objects_rendered,
            time_ms,
            note: None,
        }
    }

    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

pub trait RenderPass {
    /// Unique key within a pipeline.
    fn name(&self) -> &str;

    fn priority(&self) -> PassPriority;

    fn enabled(&self) -> bool;

    fn set_enabled(&mut self, enabled: bool);

    /// Records this pass. Returns `None` when the pass had nothing to do.
    fn execute(
        &mut self,
        gpu: &GpuContext,
        frame: &mut FrameEncoder,
        ctx: &mut RenderContext,
        objects: &[RenderObject],
    ) -> Option<PassResult>;

    /// Viewport size changed.
    fn resize(&mut self, _gpu: &GpuContext, _width: u32, _height: u32) {}

    /// Releases GPU resources. Called before removal and on pipeline destroy.
    fn destroy(&mut self) {}

    /// The pass leaves its own offscreen target bound; the orchestrator
    /// re-binds the frame target afterwards.
    fn binds_offscreen_target(&self) -> bool {
        false
    }

    /// The pass consumes the finished scene color and runs after the main
    /// pass loop, followed by [`composite`](Self::composite).
    fn reads_scene_color(&self) -> bool {
        false
    }

    /// Writes the final image for `target` from `scene_color`. Returns
    /// whether anything was drawn; if no reader composites, the orchestrator
    /// copies `scene_color` through unchanged.
    fn composite(
        &mut self,
        _gpu: &GpuContext,
        _frame: &mut FrameEncoder,
        _ctx: &RenderContext,
        _scene_color: &wgpu::TextureView,
        _target: &wgpu::TextureView,
    ) -> bool {
        false
    }
}
