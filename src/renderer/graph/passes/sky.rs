use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec4};

use crate::renderer::atmosphere;
use crate::renderer::core::{GpuContext, Tracked, UniformBuffer, uniform_entry};
use crate::renderer::graph::{ClearValues, FrameEncoder, PassPriority, PassResult, RenderContext, RenderPass};
use crate::scene::{RenderObject, SceneLightingParams};
use crate::utils::PassTimer;

/// Mirrors `SkyUniforms` in `passes/sky.wgsl`.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct SkyUniforms {
    pub inverse_view_projection: Mat4,
    pub camera_position: Vec4,
    /// Direction toward the sun, intensity.
    pub sun: Vec4,
    /// White point, HDR exposure.
    pub params: Vec4,
}

/// Full-screen background: atmospheric scattering under a directional
/// light, the equirectangular environment under HDR lighting.
pub struct SkyPass {
    enabled: bool,
    uniforms: UniformBuffer<SkyUniforms>,
    atmosphere_pipeline: Option<wgpu::RenderPipeline>,
    atmosphere_group: wgpu::BindGroup,
    hdr_pipeline: Option<wgpu::RenderPipeline>,
    hdr_layout: wgpu::BindGroupLayout,
    hdr_group: Option<(u64, wgpu::BindGroup)>,
}

impl SkyPass {
    pub const NAME: &'static str = "Sky";

    #[must_use]
    pub fn new(gpu: &GpuContext) -> Self {
        let uniforms = UniformBuffer::new(&gpu.device, "Sky Uniforms");
        let sky_entry = uniform_entry(0, wgpu::ShaderStages::FRAGMENT, false);

        let atmosphere_layout = gpu.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Sky Atmosphere Layout"),
            entries: &[sky_entry],
        });
        let hdr_layout = gpu.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Sky HDR Layout"),
            entries: &[
                sky_entry,
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let atmosphere_group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Sky Atmosphere"),
            layout: &atmosphere_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniforms.buffer().as_entire_binding(),
            }],
        });

        Self {
            enabled: true,
            atmosphere_pipeline: Self::build_pipeline(gpu, &atmosphere_layout, false),
            hdr_pipeline: Self::build_pipeline(gpu, &hdr_layout, true),
            uniforms,
            atmosphere_group,
            hdr_layout,
            hdr_group: None,
        }
    }

    fn build_pipeline(gpu: &GpuContext, layout: &wgpu::BindGroupLayout, hdr: bool) -> Option<wgpu::RenderPipeline> {
        let module = match gpu
            .shaders
            .module(&gpu.device, "passes/sky", &atmosphere::template_context(hdr))
        {
            Ok(module) => module,
            Err(e) => {
                log::error!("{}: shader failed (hdr: {hdr}): {e}", Self::NAME);
                return None;
            }
        };

        let pipeline_layout = gpu.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Sky Pipeline Layout"),
            bind_group_layouts: &[Some::<&wgpu::BindGroupLayout>(layout)],
            immediate_size: 0,
        });

        Some(gpu.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(if hdr { "Sky Pipeline (HDR)" } else { "Sky Pipeline (Atmosphere)" }),
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
                    format: gpu.color_format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: Some(wgpu::DepthStencilState {
                format: gpu.depth_format,
                depth_write_enabled: Some(false),
                depth_compare: Some(wgpu::CompareFunction::Always),
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        }))
    }

    fn hdr_bind_group(&mut self, gpu: &GpuContext, texture: &Tracked<wgpu::TextureView>) -> Option<wgpu::BindGroup> {
        if self.hdr_group.as_ref().is_none_or(|(id, _)| *id != texture.id()) {
            log::debug!("{}: binding HDR environment {}", Self::NAME, texture.id());
            let group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Sky HDR"),
                layout: &self.hdr_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: self.uniforms.buffer().as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(texture),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: wgpu::BindingResource::Sampler(&gpu.fallback.linear_sampler),
                    },
                ],
            });
            self.hdr_group = Some((texture.id(), group));
        }
        self.hdr_group.as_ref().map(|(_, group)| group.clone())
    }
}

impl RenderPass for SkyPass {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn priority(&self) -> PassPriority {
        PassPriority::SKY
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
        _objects: &[RenderObject],
    ) -> Option<PassResult> {
        let timer = PassTimer::start();
        let camera = &ctx.camera;

        let (sun, params) = match &ctx.lighting {
            SceneLightingParams::Directional(light) => (
                light.direction.normalize_or(glam::Vec3::Y).extend(light.sun_intensity),
                Vec4::new(ctx.settings.sky_white_point, 1.0, 0.0, 0.0),
            ),
            SceneLightingParams::Hdr(hdr) => (Vec4::Y, Vec4::new(ctx.settings.sky_white_point, hdr.exposure, 0.0, 0.0)),
        };
        self.uniforms.write(
            &gpu.queue,
            &SkyUniforms {
                inverse_view_projection: camera.view_projection.inverse(),
                camera_position: camera.position.extend(1.0),
                sun,
                params,
            },
        );

        let (pipeline, group, note) = match &ctx.lighting {
            SceneLightingParams::Directional(_) => {
                let pipeline = self.atmosphere_pipeline.clone()?;
                (pipeline, self.atmosphere_group.clone(), "atmosphere")
            }
            SceneLightingParams::Hdr(_) => {
                let Some(texture) = ctx.textures.hdr.clone() else {
                    log::warn!("{}: HDR lighting without an HDR texture; sky skipped", Self::NAME);
                    return None;
                };
                let pipeline = self.hdr_pipeline.clone()?;
                frame.use_texture(&texture);
                (pipeline, self.hdr_bind_group(gpu, &texture)?, "hdr")
            }
        };

        let mut pass = frame.begin_pass("Sky Pass", ClearValues::LOAD)?;
        pass.set_pipeline(&pipeline);
        pass.set_bind_group(0, &group, &[]);
        pass.draw(0..3, 0..1);
        drop(pass);

        Some(PassResult::new(Self::NAME, 0, timer.elapsed_ms()).with_note(note))
    }

    fn destroy(&mut self) {
        self.uniforms.destroy();
        self.hdr_group = None;
    }
}
