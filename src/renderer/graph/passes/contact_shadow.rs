use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec4};

use crate::renderer::core::{GpuContext, TargetTexture, Tracked, UniformBuffer, uniform_entry};
use crate::renderer::graph::{
    ClearValues, FrameEncoder, PassPriority, PassResult, RenderContext, RenderPass, TargetKind,
};
use crate::scene::{RenderObject, SceneLightingParams};
use crate::utils::PassTimer;

/// Upper bound of the ray-march loop compiled into the shader.
pub const MAX_STEPS: u32 = 64;

pub const CONTACT_SHADOW_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::R8Unorm;

/// Mirrors `ContactUniforms` in `passes/contact_shadow.wgsl`.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct ContactUniforms {
    pub projection: Mat4,
    pub inverse_projection: Mat4,
    /// View-space direction toward the light.
    pub light_direction: Vec4,
    /// Max distance, thickness, steps, intensity.
    pub params: Vec4,
    /// Viewport size, near, far.
    pub screen: Vec4,
}

impl ContactUniforms {
    /// `None` unless the light is directional.
    #[must_use]
    pub fn from_context(ctx: &RenderContext) -> Option<Self> {
        let light = ctx.lighting.directional()?;
        let settings = &ctx.settings.contact_shadow;
        let camera = &ctx.camera;
        let to_light = camera.view * light.direction.normalize_or(glam::Vec3::Y).extend(0.0);

        Some(Self {
            projection: camera.projection,
            inverse_projection: camera.projection.inverse(),
            light_direction: to_light.truncate().normalize_or_zero().extend(0.0),
            params: Vec4::new(
                settings.max_distance,
                settings.thickness,
                settings.steps.clamp(1, MAX_STEPS) as f32,
                settings.intensity.clamp(0.0, 1.0),
            ),
            screen: Vec4::new(ctx.width as f32, ctx.height as f32, camera.near, camera.far),
        })
    }
}

fn texture_entry(binding: u32, sample_type: wgpu::TextureSampleType) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type,
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

/// Screen-space contact shadows.
///
/// Ray-marches the pre-pass depth toward the sun into an `R8Unorm` term,
/// then multiplies the finished scene color by it onto the host target.
pub struct ContactShadowPass {
    enabled: bool,
    uniforms: UniformBuffer<ContactUniforms>,
    march_layout: wgpu::BindGroupLayout,
    march_pipeline: Option<wgpu::RenderPipeline>,
    march_group: Option<(u64, wgpu::BindGroup)>,
    composite_layout: wgpu::BindGroupLayout,
    composite_pipeline: Option<wgpu::RenderPipeline>,
    target: Option<TargetTexture>,
}

impl ContactShadowPass {
    pub const NAME: &'static str = "ContactShadow";

    #[must_use]
    pub fn new(gpu: &GpuContext) -> Self {
        let march_layout = gpu.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Contact Shadow Layout"),
            entries: &[
                uniform_entry(0, wgpu::ShaderStages::FRAGMENT, false),
                texture_entry(1, wgpu::TextureSampleType::Depth),
            ],
        });
        let unfilterable = wgpu::TextureSampleType::Float { filterable: false };
        let composite_layout = gpu.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Contact Composite Layout"),
            entries: &[texture_entry(0, unfilterable), texture_entry(1, unfilterable)],
        });

        let march_pipeline = Self::build_pipeline(
            gpu,
            "passes/contact_shadow",
            minijinja::context! { MAX_STEPS => MAX_STEPS },
            &march_layout,
            CONTACT_SHADOW_FORMAT,
        );
        let composite_pipeline = Self::build_pipeline(
            gpu,
            "passes/contact_composite",
            minijinja::context! {},
            &composite_layout,
            gpu.color_format,
        );

        Self {
            enabled: true,
            uniforms: UniformBuffer::new(&gpu.device, "Contact Shadow Uniforms"),
            march_layout,
            march_pipeline,
            march_group: None,
            composite_layout,
            composite_pipeline,
            target: None,
        }
    }

    fn build_pipeline(
        gpu: &GpuContext,
        template: &str,
        ctx: minijinja::Value,
        layout: &wgpu::BindGroupLayout,
        format: wgpu::TextureFormat,
    ) -> Option<wgpu::RenderPipeline> {
        let module = match gpu.shaders.module(&gpu.device, template, &ctx) {
            Ok(module) => module,
            Err(e) => {
                log::error!("{}: {template} failed: {e}", Self::NAME);
                return None;
            }
        };
        let pipeline_layout = gpu.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(template),
            bind_group_layouts: &[Some::<&wgpu::BindGroupLayout>(layout)],
            immediate_size: 0,
        });

        Some(gpu.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(template),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &module,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &module,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        }))
    }

    fn ensure_target(&mut self, gpu: &GpuContext, width: u32, height: u32) -> &TargetTexture {
        if self.target.as_ref().is_some_and(|t| t.size() != (width.max(1), height.max(1)))
            && let Some(old) = self.target.take()
        {
            old.destroy();
        }
        self.target.get_or_insert_with(|| {
            log::debug!("{}: allocating {width}x{height} contact shadow target", Self::NAME);
            TargetTexture::new(
                &gpu.device,
                "Contact Shadow",
                width,
                height,
                CONTACT_SHADOW_FORMAT,
                wgpu::TextureUsages::empty(),
            )
        })
    }

    fn march_bind_group(&mut self, gpu: &GpuContext, depth: &Tracked<wgpu::TextureView>) -> wgpu::BindGroup {
        if let Some((id, group)) = &self.march_group
            && *id == depth.id()
        {
            return group.clone();
        }
        let group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Contact Shadow"),
            layout: &self.march_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.uniforms.buffer().as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(depth),
                },
            ],
        });
        self.march_group = Some((depth.id(), group.clone()));
        group
    }
}

impl RenderPass for ContactShadowPass {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn priority(&self) -> PassPriority {
        PassPriority::POST_PROCESS
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
        ctx.textures.contact_shadow = None;
        if !ctx.settings.contact_shadow_enabled || objects.is_empty() {
            return None;
        }
        let SceneLightingParams::Directional(_) = ctx.lighting else {
            return None;
        };
        let depth = ctx.textures.depth.clone()?;
        let pipeline = self.march_pipeline.clone()?;
        let uniforms = ContactUniforms::from_context(ctx)?;

        let timer = PassTimer::start();
        self.uniforms.write(&gpu.queue, &uniforms);
        let group = self.march_bind_group(gpu, &depth);

        let (width, height) = ctx.viewport();
        let view = self.ensure_target(gpu, width, height).view.clone();

        frame.use_texture(&depth);
        frame.bind_target(
            TargetKind::Offscreen("contact_shadow".into()),
            Some((&view).into()),
            None,
            (width, height),
        );
        let mut pass = frame.begin_pass("Contact Shadow Pass", ClearValues::all(wgpu::Color::WHITE))?;
        pass.set_pipeline(&pipeline);
        pass.set_bind_group(0, &group, &[]);
        pass.draw(0..3, 0..1);
        drop(pass);

        ctx.textures.contact_shadow = Some(view);
        Some(
            PassResult::new(Self::NAME, 0, timer.elapsed_ms())
                .with_note(format!("{} steps", uniforms.params.z as u32)),
        )
    }

    fn composite(
        &mut self,
        gpu: &GpuContext,
        frame: &mut FrameEncoder,
        ctx: &RenderContext,
        scene_color: &wgpu::TextureView,
        target: &wgpu::TextureView,
    ) -> bool {
        let (Some(contact), Some(pipeline)) = (&ctx.textures.contact_shadow, &self.composite_pipeline) else {
            return false;
        };

        // Scene color changes every frame with the ping-pong flip.
        let group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Contact Composite"),
            layout: &self.composite_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(scene_color),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(contact),
                },
            ],
        });

        if let Some(scene) = &ctx.textures.scene_color {
            frame.use_texture(scene);
        }
        frame.use_texture(contact);
        frame.bind_target(TargetKind::Screen, Some(target.into()), None, ctx.viewport());
        let Some(mut pass) = frame.begin_pass("Contact Shadow Composite", ClearValues::LOAD) else {
            return false;
        };
        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, &group, &[]);
        pass.draw(0..3, 0..1);
        true
    }

    fn resize(&mut self, gpu: &GpuContext, width: u32, height: u32) {
        if self.target.is_some() {
            self.ensure_target(gpu, width, height);
        }
    }

    fn destroy(&mut self) {
        self.uniforms.destroy();
        self.march_group = None;
        if let Some(target) = self.target.take() {
            target.destroy();
        }
    }

    fn binds_offscreen_target(&self) -> bool {
        true
    }

    fn reads_scene_color(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{DirectionalLightParams, HdrLightParams};

    #[test]
    fn contact_uniforms_match_wgsl_layout() {
        assert_eq!(std::mem::size_of::<ContactUniforms>(), 176);
    }

    #[test]
    fn uniforms_clamp_settings() {
        let mut ctx = RenderContext::new(800, 600);
        ctx.lighting = SceneLightingParams::Directional(DirectionalLightParams::from_angles(60.0, 90.0));
        ctx.settings.contact_shadow.steps = 500;
        ctx.settings.contact_shadow.intensity = 3.0;

        let u = ContactUniforms::from_context(&ctx).unwrap();
        assert_eq!(u.params.z, MAX_STEPS as f32);
        assert_eq!(u.params.w, 1.0);
        assert!((u.light_direction.truncate().length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn hdr_lighting_has_no_contact_uniforms() {
        let mut ctx = RenderContext::new(800, 600);
        ctx.lighting = SceneLightingParams::Hdr(HdrLightParams::default());
        assert!(ContactUniforms::from_context(&ctx).is_none());
    }
}
