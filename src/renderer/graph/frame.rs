//! Frame encoder
//!
//! [`FrameEncoder`] owns the command encoder of one frame and tracks which
//! target is bound for subsequent passes: the host's target, a ping-pong
//! buffer or a pass-owned offscreen texture. Passes that draw onto "the
//! frame" open their render pass through [`FrameEncoder::begin_pass`], which
//! uses whatever is currently bound.
//!
//! A small table of texture units records which tracked textures passes
//! sample. Binding a texture as an attachment while it still occupies a unit
//! is reported as a feedback loop.

use std::borrow::Cow;

use crate::renderer::core::Tracked;

/// Number of sampled-texture units tracked per frame.
pub const TEXTURE_UNITS: usize = 4;

/// What the frame is currently rendering into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetKind {
    /// The host's target passed to `render`.
    Screen,
    /// One of the two ping-pong buffers.
    PingPong(usize),
    /// A pass-owned texture (shadow map, pre-pass depth, ...).
    Offscreen(Cow<'static, str>),
}

/// A view to attach, optionally with the id of its tracked wrapper.
#[derive(Clone, Copy)]
pub struct AttachmentView<'a> {
    pub view: &'a wgpu::TextureView,
    pub id: Option<u64>,
}

impl<'a> From<&'a Tracked<wgpu::TextureView>> for AttachmentView<'a> {
    fn from(view: &'a Tracked<wgpu::TextureView>) -> Self {
        Self {
            view,
            id: Some(view.id()),
        }
    }
}

impl<'a> From<&'a wgpu::TextureView> for AttachmentView<'a> {
    fn from(view: &'a wgpu::TextureView) -> Self {
        Self { view, id: None }
    }
}

/// Load behavior for [`FrameEncoder::begin_pass`]. `None` keeps contents.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClearValues {
    pub color: Option<wgpu::Color>,
    pub depth: Option<f32>,
}

impl ClearValues {
    pub const LOAD: Self = Self {
        color: None,
        depth: None,
    };

    #[must_use]
    pub fn all(color: wgpu::Color) -> Self {
        Self {
            color: Some(color),
            depth: Some(1.0),
        }
    }

    #[must_use]
    pub fn depth_only() -> Self {
        Self {
            color: None,
            depth: Some(1.0),
        }
    }
}

struct BoundTarget {
    kind: TargetKind,
    color: Option<wgpu::TextureView>,
    depth: Option<wgpu::TextureView>,
    size: (u32, u32),
}

pub struct FrameEncoder {
    encoder: wgpu::CommandEncoder,
    target: Option<BoundTarget>,
    units: [Option<u64>; TEXTURE_UNITS],
    next_unit: usize,
}

impl FrameEncoder {
    #[must_use]
    pub fn new(device: &wgpu::Device, label: &str) -> Self {
        Self {
            encoder: device.create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some(label) }),
            target: None,
            units: [None; TEXTURE_UNITS],
            next_unit: 0,
        }
    }

    /// Makes `color` / `depth` the target of subsequent [`begin_pass`](Self::begin_pass) calls.
    pub fn bind_target(
        &mut self,
        kind: TargetKind,
        color: Option<AttachmentView<'_>>,
        depth: Option<AttachmentView<'_>>,
        size: (u32, u32),
    ) {
        for attachment in color.iter().chain(depth.iter()) {
            if let Some(unit) = attachment.id.and_then(|id| self.unit_of(id)) {
                log::warn!("Feedback loop: binding {kind:?} as render target while it is sampled on unit {unit}");
            }
        }
        self.target = Some(BoundTarget {
            kind,
            color: color.map(|c| c.view.clone()),
            depth: depth.map(|d| d.view.clone()),
            size,
        });
    }

    pub fn unbind_target(&mut self) {
        self.target = None;
    }

    #[must_use]
    pub fn bound_kind(&self) -> Option<&TargetKind> {
        self.target.as_ref().map(|t| &t.kind)
    }

    #[must_use]
    pub fn viewport(&self) -> Option<(u32, u32)> {
        self.target.as_ref().map(|t| t.size)
    }

    /// Opens a render pass on the bound target with the viewport set to the
    /// full target. Returns `None` when nothing is bound.
    pub fn begin_pass(&mut self, label: &str, clear: ClearValues) -> Option<wgpu::RenderPass<'_>> {
        let target = self.target.as_ref()?;

        let color_attachment = target.color.as_ref().map(|view| wgpu::RenderPassColorAttachment {
            view,
            depth_slice: None,
            resolve_target: None,
            ops: wgpu::Operations {
                load: clear.color.map_or(wgpu::LoadOp::Load, wgpu::LoadOp::Clear),
                store: wgpu::StoreOp::Store,
            },
        });
        let depth_attachment = target.depth.as_ref().map(|view| wgpu::RenderPassDepthStencilAttachment {
            view,
            depth_ops: Some(wgpu::Operations {
                load: clear.depth.map_or(wgpu::LoadOp::Load, wgpu::LoadOp::Clear),
                store: wgpu::StoreOp::Store,
            }),
            stencil_ops: None,
        });

        // Depth-only targets attach no color slot at all.
        let colors = [color_attachment];
        let color_attachments: &[_] = if colors[0].is_some() { &colors } else { &[] };

        let (width, height) = target.size;
        let mut pass = self.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(label),
            color_attachments,
            depth_stencil_attachment: depth_attachment,
            ..Default::default()
        });
        pass.set_viewport(0.0, 0.0, width.max(1) as f32, height.max(1) as f32, 0.0, 1.0);
        Some(pass)
    }

    /// Clears the bound target without drawing.
    pub fn clear(&mut self, color: wgpu::Color) {
        drop(self.begin_pass("Clear Frame Target", ClearValues::all(color)));
    }

    /// Records that a pass samples `texture`; returns the unit it occupies.
    pub fn use_texture(&mut self, texture: &Tracked<wgpu::TextureView>) -> usize {
        if let Some(unit) = self.unit_of(texture.id()) {
            return unit;
        }
        let unit = self.next_unit % TEXTURE_UNITS;
        self.units[unit] = Some(texture.id());
        self.next_unit += 1;
        unit
    }

    #[must_use]
    pub fn unit_of(&self, id: u64) -> Option<usize> {
        self.units.iter().position(|u| *u == Some(id))
    }

    #[must_use]
    pub fn bound_texture_count(&self) -> usize {
        self.units.iter().filter(|u| u.is_some()).count()
    }

    /// Releases every texture unit.
    pub fn release_textures(&mut self) {
        self.units = [None; TEXTURE_UNITS];
        self.next_unit = 0;
    }

    pub fn encoder(&mut self) -> &mut wgpu::CommandEncoder {
        &mut self.encoder
    }

    #[must_use]
    pub fn finish(self) -> wgpu::CommandBuffer {
        self.encoder.finish()
    }
}
