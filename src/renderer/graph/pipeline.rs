//! Forward pipeline
//!
//! [`ForwardPipeline`] owns the pass list, the long-lived [`RenderContext`]
//! and the frame targets, and drives one frame per [`render`](ForwardPipeline::render):
//!
//! 1. Decide whether the frame is composited (contact shadows on, directional
//!    light, at least one object). Composited frames render into the
//!    ping-pong write target, others straight into the host target.
//! 2. Clear, then run every enabled pass that does not read scene color in
//!    priority order, re-binding the frame target after passes that bind
//!    their own offscreen target.
//! 3. When composited: release texture units, run the scene-color readers
//!    and their composite onto the host target (or copy the scene color
//!    through unchanged), release units again and flip the ping-pong index.
//!
//! Everything is recorded into one command encoder and submitted once.

use std::sync::Arc;

use glam::Vec3;
use smallvec::SmallVec;

use crate::renderer::core::{GpuContext, TargetTexture};
use crate::renderer::settings::{RenderSettings, SettingsPatch};
use crate::scene::{Camera, CameraState, RenderObject, SceneLightingParams, WindParams};

use super::context::{RenderContext, TextureHandle, TextureSlot, TextureSlots};
use super::frame::{FrameEncoder, TargetKind};
use super::graph::PassList;
use super::node::{PassResult, RenderPass};
use super::passes::{ContactShadowPass, DepthPrepass, OpaquePass, OverlayPass, ShadowPass, SkyPass};
use super::targets::{BlitProgram, PingPongTargets};

/// What the last [`ForwardPipeline::render`] did.
#[derive(Debug, Clone)]
pub struct FrameReport {
    /// Target the main pass loop rendered into.
    pub target: TargetKind,
    /// A scene-color reader composited onto the host target.
    pub composited: bool,
    /// One entry per pass that did work, in execution order.
    pub results: SmallVec<[PassResult; 8]>,
}

impl FrameReport {
    #[must_use]
    pub fn pass(&self, name: &str) -> Option<&PassResult> {
        self.results.iter().find(|r| r.name == name)
    }

    #[must_use]
    pub fn ran(&self, name: &str) -> bool {
        self.pass(name).is_some()
    }
}

pub struct ForwardPipeline {
    gpu: Arc<GpuContext>,
    passes: PassList,
    context: RenderContext,
    width: u32,
    height: u32,
    ping_pong: PingPongTargets,
    screen_depth: TargetTexture,
    blit: BlitProgram,
    clear_color: wgpu::Color,
    last_frame: Option<FrameReport>,
}

/// Binds the frame target for `kind` with the viewport covering it.
fn bind_frame_target(
    frame: &mut FrameEncoder,
    kind: &TargetKind,
    ping_pong: &PingPongTargets,
    screen_depth: &TargetTexture,
    host: &wgpu::TextureView,
    size: (u32, u32),
) {
    match kind {
        TargetKind::PingPong(_) => {
            let target = ping_pong.write_target();
            frame.bind_target(
                kind.clone(),
                Some((&target.color.view).into()),
                Some((&target.depth.view).into()),
                size,
            );
        }
        _ => frame.bind_target(TargetKind::Screen, Some(host.into()), Some((&screen_depth.view).into()), size),
    }
}

fn create_screen_depth(gpu: &GpuContext, width: u32, height: u32) -> TargetTexture {
    TargetTexture::new(
        &gpu.device,
        "Screen Depth",
        width,
        height,
        gpu.depth_format,
        wgpu::TextureUsages::empty(),
    )
}

impl ForwardPipeline {
    /// An empty pipeline; see [`with_default_passes`](Self::with_default_passes).
    #[must_use]
    pub fn new(gpu: Arc<GpuContext>, width: u32, height: u32) -> Self {
        let (width, height) = (width.max(1), height.max(1));
        Self {
            passes: PassList::new(),
            context: RenderContext::new(width, height),
            ping_pong: PingPongTargets::new(&gpu, width, height),
            screen_depth: create_screen_depth(&gpu, width, height),
            blit: BlitProgram::new(&gpu),
            clear_color: wgpu::Color::BLACK,
            last_frame: None,
            width,
            height,
            gpu,
        }
    }

    /// Shadow, depth pre-pass, sky, opaque, contact shadow and overlay.
    #[must_use]
    pub fn with_default_passes(gpu: Arc<GpuContext>, width: u32, height: u32) -> Self {
        let mut pipeline = Self::new(gpu, width, height);
        let gpu = Arc::clone(&pipeline.gpu);
        pipeline.add_pass(Box::new(ShadowPass::new(&gpu)));
        pipeline.add_pass(Box::new(DepthPrepass::new(&gpu)));
        pipeline.add_pass(Box::new(SkyPass::new(&gpu)));
        pipeline.add_pass(Box::new(OpaquePass::new(&gpu)));
        pipeline.add_pass(Box::new(ContactShadowPass::new(&gpu)));
        pipeline.add_pass(Box::new(OverlayPass::new(&gpu)));
        pipeline
    }

    // === Passes ===

    pub fn add_pass(&mut self, pass: Box<dyn RenderPass>) {
        log::debug!("Adding pass '{}' ({})", pass.name(), pass.priority().band());
        self.passes.add(pass);
    }

    /// Destroys and removes the pass named `name`. Returns whether it existed.
    pub fn remove_pass(&mut self, name: &str) -> bool {
        match self.passes.remove(name) {
            Some(mut pass) => {
                pass.destroy();
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn get_pass(&self, name: &str) -> Option<&dyn RenderPass> {
        self.passes.get(name)
    }

    pub fn get_pass_mut(&mut self, name: &str) -> Option<&mut dyn RenderPass> {
        self.passes.get_mut(name)
    }

    /// Returns `false` when no pass is named `name`.
    pub fn set_pass_enabled(&mut self, name: &str, enabled: bool) -> bool {
        let Some(pass) = self.passes.get_mut(name) else {
            log::warn!("set_pass_enabled: no pass named '{name}'");
            return false;
        };
        pass.set_enabled(enabled);
        true
    }

    /// Pass names in execution order.
    #[must_use]
    pub fn pass_names(&self) -> Vec<&str> {
        self.passes.names()
    }

    // === Context ===

    /// Copies camera data, assigns lighting and wind, accumulates time.
    pub fn update_context(
        &mut self,
        camera: &dyn Camera,
        lighting: SceneLightingParams,
        wind: WindParams,
        delta_time: f32,
    ) {
        let ctx = &mut self.context;
        ctx.camera = CameraState::from_camera(camera);
        ctx.lighting = lighting;
        ctx.wind = wind;
        ctx.delta_time = delta_time;
        ctx.time += delta_time;
    }

    pub fn update_settings(&mut self, patch: &SettingsPatch) {
        self.context.settings.apply(patch);
    }

    #[must_use]
    pub fn settings(&self) -> &RenderSettings {
        &self.context.settings
    }

    #[must_use]
    pub fn context(&self) -> &RenderContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut RenderContext {
        &mut self.context
    }

    /// Host-provided inputs such as [`TextureSlot::Hdr`].
    pub fn set_texture(&mut self, slot: TextureSlot, value: Option<TextureHandle>) {
        self.context.textures.set(slot, value);
    }

    pub fn set_origin_position(&mut self, position: Vec3) {
        self.context.origin_position = position;
    }

    pub fn set_shadow_resolution(&mut self, resolution: u32) {
        self.context.settings.shadow_resolution = resolution.max(1);
    }

    pub fn set_clear_color(&mut self, color: wgpu::Color) {
        self.clear_color = color;
    }

    #[must_use]
    pub fn shadow_texture(&self) -> Option<&TextureHandle> {
        self.context.textures.shadow_map.as_ref()
    }

    #[must_use]
    pub fn depth_texture(&self) -> Option<&TextureHandle> {
        self.context.textures.depth.as_ref()
    }

    // === Frame ===

    #[must_use]
    pub fn gpu(&self) -> &Arc<GpuContext> {
        &self.gpu
    }

    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    #[must_use]
    pub fn last_frame(&self) -> Option<&FrameReport> {
        self.last_frame.as_ref()
    }

    /// Ids of every size-dependent target the pipeline owns.
    #[must_use]
    pub fn target_ids(&self) -> [u64; 5] {
        let [a, b, c, d] = self.ping_pong.ids();
        [a, b, c, d, self.screen_depth.view.id()]
    }

    /// Scene color of the last composited frame (the element that was
    /// written before the flip).
    #[must_use]
    pub fn last_scene_color(&self) -> &TargetTexture {
        &self.ping_pong.read_target().color
    }

    /// Renders one frame of `objects` into `target`, which must match the
    /// pipeline size and the context's color format.
    pub fn render(&mut self, target: &wgpu::TextureView, objects: &[RenderObject]) {
        let composite = self.context.settings.contact_shadow_enabled
            && self.context.lighting.is_directional()
            && !objects.is_empty();
        let size = (self.width, self.height);
        let frame_kind = if composite {
            TargetKind::PingPong(self.ping_pong.write_index())
        } else {
            TargetKind::Screen
        };

        self.context.textures.contact_shadow = None;
        self.context.textures.scene_color = None;

        let mut frame = FrameEncoder::new(&self.gpu.device, "Forward Frame");
        bind_frame_target(&mut frame, &frame_kind, &self.ping_pong, &self.screen_depth, target, size);
        frame.clear(self.clear_color);

        let mut results = SmallVec::new();
        for pass in self.passes.iter_mut() {
            if !pass.enabled() || pass.reads_scene_color() {
                continue;
            }
            if let Some(result) = pass.execute(&self.gpu, &mut frame, &mut self.context, objects) {
                results.push(result);
            }
            if pass.binds_offscreen_target() {
                bind_frame_target(&mut frame, &frame_kind, &self.ping_pong, &self.screen_depth, target, size);
            }
        }

        let mut composited = false;
        if composite {
            frame.unbind_target();
            frame.release_textures();

            let scene_color = self.ping_pong.write_target().color.view.clone();
            self.context.textures.scene_color = Some(scene_color.clone());

            for pass in self.passes.iter_mut() {
                if !pass.enabled() || !pass.reads_scene_color() {
                    continue;
                }
                if let Some(result) = pass.execute(&self.gpu, &mut frame, &mut self.context, objects) {
                    results.push(result);
                }
                if !composited {
                    composited = pass.composite(&self.gpu, &mut frame, &self.context, &scene_color, target);
                }
            }

            if !composited {
                log::trace!("No composite this frame; copying scene color through");
                self.blit.copy(&self.gpu, &mut frame, &scene_color, target, size);
            }
            frame.release_textures();
            self.ping_pong.flip();
        }

        self.gpu.queue.submit(std::iter::once(frame.finish()));

        self.last_frame = Some(FrameReport {
            target: frame_kind,
            composited,
            results,
        });
    }

    /// No-op when the size is unchanged; otherwise recreates the frame
    /// targets and forwards the new size to every pass.
    pub fn resize(&mut self, width: u32, height: u32) {
        let (width, height) = (width.max(1), height.max(1));
        if (width, height) == (self.width, self.height) {
            return;
        }
        log::debug!("Resizing forward pipeline {}x{} -> {width}x{height}", self.width, self.height);

        self.width = width;
        self.height = height;
        self.context.width = width;
        self.context.height = height;

        self.ping_pong.destroy();
        self.screen_depth.destroy();
        self.ping_pong = PingPongTargets::new(&self.gpu, width, height);
        self.screen_depth = create_screen_depth(&self.gpu, width, height);

        for pass in self.passes.iter_mut() {
            pass.resize(&self.gpu, width, height);
        }
    }

    /// Destroys every pass, then the frame targets.
    pub fn destroy(&mut self) {
        self.passes.clear();
        self.ping_pong.destroy();
        self.screen_depth.destroy();
        self.context.textures = TextureSlots::default();
        self.last_frame = None;
    }
}
