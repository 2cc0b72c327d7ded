use crate::renderer::core::{GpuContext, TargetTexture};
use crate::renderer::graph::{
    ClearValues, FrameEncoder, PassPriority, PassResult, RenderContext, RenderPass, TargetKind,
};
use crate::scene::RenderObject;
use crate::utils::PassTimer;

use super::depth_draw::{DepthDrawer, DepthView};

/// Camera depth for terrain blending and contact shadows.
///
/// Runs only when an object wants terrain blending or contact shadows are on;
/// otherwise both depth slots are cleared. Every renderable object is drawn.
/// Surfaces go first; when terrain-blend targets are present the surface-only
/// depth is snapshotted into `terrain_depth` before they are drawn on top, so
/// blend shading can tell its own depth from the surface behind it. Without
/// blend targets one texture is published in both slots.
pub struct DepthPrepass {
    enabled: bool,
    surfaces: DepthDrawer,
    blend_targets: DepthDrawer,
    target: Option<TargetTexture>,
    surface_copy: Option<TargetTexture>,
}

impl DepthPrepass {
    pub const NAME: &'static str = "DepthPrepass";

    #[must_use]
    pub fn new(gpu: &GpuContext) -> Self {
        Self {
            enabled: true,
            surfaces: DepthDrawer::new(gpu, "Depth Prepass", wgpu::DepthBiasState::default()),
            blend_targets: DepthDrawer::new(gpu, "Depth Prepass (Blend Targets)", wgpu::DepthBiasState::default()),
            target: None,
            surface_copy: None,
        }
    }

    /// Whether the pass has work this frame.
    #[must_use]
    pub fn is_needed(ctx: &RenderContext, objects: &[RenderObject]) -> bool {
        ctx.settings.contact_shadow_enabled || objects.iter().any(RenderObject::wants_terrain_blend)
    }

    /// The full depth target and the surface-only snapshot, once allocated.
    #[must_use]
    pub fn targets(&self) -> Option<(&TargetTexture, &TargetTexture)> {
        self.target.as_ref().zip(self.surface_copy.as_ref())
    }

    fn release_targets(&mut self) {
        for target in [self.target.take(), self.surface_copy.take()].into_iter().flatten() {
            target.destroy();
        }
    }

    fn ensure_targets(&mut self, gpu: &GpuContext, width: u32, height: u32) {
        let size = (width.max(1), height.max(1));
        if self.target.as_ref().is_some_and(|t| t.size() != size) {
            self.release_targets();
        }
        if self.target.is_none() {
            log::debug!("{}: allocating {width}x{height} depth targets", Self::NAME);
        }
        let allocate = |label: &str, usage: wgpu::TextureUsages| {
            TargetTexture::new(&gpu.device, label, width, height, gpu.depth_format, usage)
        };
        self.target
            .get_or_insert_with(|| allocate("Depth Prepass", wgpu::TextureUsages::COPY_SRC));
        self.surface_copy.get_or_insert_with(|| {
            allocate("Depth Prepass (Surfaces)", wgpu::TextureUsages::COPY_DST | wgpu::TextureUsages::COPY_SRC)
        });
    }
}

fn whole_texture(texture: &wgpu::Texture) -> wgpu::TexelCopyTextureInfo<'_> {
    wgpu::TexelCopyTextureInfo {
        texture,
        mip_level: 0,
        origin: wgpu::Origin3d::ZERO,
        aspect: wgpu::TextureAspect::All,
    }
}

/// Copies the whole depth texture `src` into `dst` (same size and format).
fn snapshot_depth(encoder: &mut wgpu::CommandEncoder, src: &wgpu::Texture, dst: &wgpu::Texture) {
    encoder.copy_texture_to_texture(whole_texture(src), whole_texture(dst), src.size());
}

impl RenderPass for DepthPrepass {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn priority(&self) -> PassPriority {
        PassPriority::DEPTH_PREPASS
    }

    fn enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn execute(
        &mut self,
        gpu: &GpuContext,
        frame: &mut FrameEncoder,
        ctx: &mut RenderContext,
        objects: &[RenderObject],
    ) -> Option<PassResult> {
        if !Self::is_needed(ctx, objects) || !self.surfaces.is_ready() || !self.blend_targets.is_ready() {
            ctx.textures.set_depth(None);
            return None;
        }

        let timer = PassTimer::start();
        let eye = DepthView {
            view_projection: ctx.camera.view_projection,
            camera_position: ctx.camera.position,
            far: ctx.camera.far,
        };
        let surfaces = self
            .surfaces
            .prepare(gpu, &eye, &ctx.wind, objects, |object| !object.wants_terrain_blend());
        let blend_targets = self
            .blend_targets
            .prepare(gpu, &eye, &ctx.wind, objects, RenderObject::wants_terrain_blend);

        let (width, height) = ctx.viewport();
        self.ensure_targets(gpu, width, height);
        let (Some(target), Some(surface_copy)) = (&self.target, &self.surface_copy) else {
            ctx.textures.set_depth(None);
            return None;
        };

        frame.bind_target(
            TargetKind::Offscreen("depth_prepass".into()),
            None,
            Some((&target.view).into()),
            (width, height),
        );
        if let Some(mut pass) = frame.begin_pass("Depth Prepass", ClearValues::depth_only()) {
            self.surfaces.record(&mut pass);
        }

        let result = PassResult::new(Self::NAME, surfaces + blend_targets, timer.elapsed_ms());
        if blend_targets == 0 {
            ctx.textures.set_depth(Some(target.view.clone()));
            return Some(result);
        }

        snapshot_depth(frame.encoder(), &target.texture, &surface_copy.texture);
        if let Some(mut pass) = frame.begin_pass("Depth Prepass (Blend Targets)", ClearValues::LOAD) {
            self.blend_targets.record(&mut pass);
        }

        ctx.textures.set_depth_split(target.view.clone(), surface_copy.view.clone());
        Some(result.with_note(format!("{blend_targets} terrain-blend target(s) marked")))
    }

    fn resize(&mut self, gpu: &GpuContext, width: u32, height: u32) {
        self.release_targets();
        self.ensure_targets(gpu, width, height);
    }

    fn destroy(&mut self) {
        self.surfaces.destroy();
        self.blend_targets.destroy();
        self.release_targets();
    }

    fn binds_offscreen_target(&self) -> bool {
        true
    }
}
