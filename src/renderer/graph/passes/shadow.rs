use crate::renderer::core::{GpuContext, TargetTexture};
use crate::renderer::graph::shadow_utils::compute_light_space_matrix;
use crate::renderer::graph::{
    ClearValues, FrameEncoder, PassPriority, PassResult, RenderContext, RenderPass, TargetKind,
};
use crate::scene::{RenderObject, SceneLightingParams};
use crate::utils::PassTimer;

use super::depth_draw::{DepthDrawer, DepthView};

/// Depth-only shadow map of the directional light.
///
/// Publishes `shadow_map` and `light_space_matrix`; clears both whenever it
/// does not render (shadows off, HDR lighting, no objects, resource failure).
pub struct ShadowPass {
    enabled: bool,
    drawer: DepthDrawer,
    target: Option<TargetTexture>,
}

impl ShadowPass {
    pub const NAME: &'static str = "Shadow";

    #[must_use]
    pub fn new(gpu: &GpuContext) -> Self {
        Self {
            enabled: true,
            drawer: DepthDrawer::new(
                gpu,
                "Shadow Depth",
                wgpu::DepthBiasState {
                    constant: 2,
                    slope_scale: 2.0,
                    clamp: 0.0,
                },
            ),
            target: None,
        }
    }

    /// Returns the shadow target at `resolution`, reallocating on change.
    fn ensure_target(&mut self, gpu: &GpuContext, resolution: u32) -> Option<&TargetTexture> {
        let limit = gpu.device.limits().max_texture_dimension_2d;
        if resolution > limit {
            log::error!("{}: shadow resolution {resolution} exceeds device limit {limit}", Self::NAME);
            return None;
        }

        if self.target.as_ref().is_none_or(|t| t.size() != (resolution, resolution)) {
            if let Some(old) = self.target.take() {
                old.destroy();
            }
            log::debug!("{}: allocating {resolution}x{resolution} shadow map", Self::NAME);
            self.target = Some(TargetTexture::new(
                &gpu.device,
                "Shadow Map",
                resolution,
                resolution,
                gpu.depth_format,
                wgpu::TextureUsages::empty(),
            ));
        }
        self.target.as_ref()
    }
}

impl RenderPass for ShadowPass {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn priority(&self) -> PassPriority {
        PassPriority::SHADOW
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
        let light = match &ctx.lighting {
            SceneLightingParams::Directional(light) => light,
            SceneLightingParams::Hdr(_) => {
                ctx.textures.set_shadow(None);
                return None;
            }
        };
        if !ctx.settings.shadow_enabled || !light.wants_shadow() || objects.is_empty() {
            ctx.textures.set_shadow(None);
            return None;
        }
        if !self.drawer.is_ready() {
            log::warn!("{}: depth pipeline unavailable", Self::NAME);
            ctx.textures.set_shadow(None);
            return None;
        }

        let timer = PassTimer::start();
        let light_space = compute_light_space_matrix(light.direction, glam::Vec3::ZERO, ctx.settings.shadow_coverage);
        let eye = DepthView {
            view_projection: light_space,
            camera_position: ctx.camera.position,
            far: ctx.camera.far,
        };
        let wind = ctx.wind;
        let resolution = ctx.settings.shadow_resolution;

        let drawn = self.drawer.prepare(gpu, &eye, &wind, objects, |_| true);

        let Some(target) = self.ensure_target(gpu, resolution) else {
            ctx.textures.set_shadow(None);
            return None;
        };
        let view = target.view.clone();

        frame.bind_target(
            TargetKind::Offscreen("shadow".into()),
            None,
            Some((&view).into()),
            (resolution, resolution),
        );
        if let Some(mut pass) = frame.begin_pass("Shadow Depth Pass", ClearValues::depth_only()) {
            self.drawer.record(&mut pass);
        }

        ctx.textures.set_shadow(Some((view, light_space)));
        Some(PassResult::new(Self::NAME, drawn, timer.elapsed_ms()))
    }

    fn destroy(&mut self) {
        self.drawer.destroy();
        if let Some(target) = self.target.take() {
            target.destroy();
        }
    }

    fn binds_offscreen_target(&self) -> bool {
        true
    }
}
