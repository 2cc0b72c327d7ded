//! Depth-only drawing shared by the shadow pass and the depth pre-pass.
//!
//! Meshes (with wind displacement) and baked terrain go through the
//! `depth_mesh` pipeline; clipmap terrain goes through a depth-only
//! [`ClipmapRenderer`]. Each owner gets its own uniform buffers.

use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3, Vec4};

use crate::renderer::core::{DynamicUniforms, GpuContext, UniformBuffer};
use crate::renderer::mesh::{DrawFlags, GpuMesh, ObjectUniforms};
use crate::resources::MeshVertex;
use crate::scene::{RenderObject, WindParams};
use crate::terrain::{ClipmapRenderer, TerrainShading};

/// Mirrors `DepthFrameUniforms` in `chunks/depth_frame.wgsl`.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct DepthFrameUniforms {
    pub view_projection: Mat4,
    pub wind_motion: Vec4,
    pub wind_state: Vec4,
}

/// Where depth is rendered from, and which camera the clipmap follows.
#[derive(Debug, Clone, Copy)]
pub struct DepthView {
    pub view_projection: Mat4,
    pub camera_position: Vec3,
    /// Camera far plane; clipmap rings past it are skipped.
    pub far: f32,
}

pub struct DepthDrawer {
    label: &'static str,
    mesh_pipeline: Option<wgpu::RenderPipeline>,
    frame_uniforms: UniformBuffer<DepthFrameUniforms>,
    frame_group: wgpu::BindGroup,
    objects: DynamicUniforms<ObjectUniforms>,
    terrain: ClipmapRenderer,
    queued: Vec<(Arc<GpuMesh>, u32)>,
}

impl DepthDrawer {
    #[must_use]
    pub fn new(gpu: &GpuContext, label: &'static str, bias: wgpu::DepthBiasState) -> Self {
        let frame_uniforms = UniformBuffer::new(&gpu.device, label);
        let frame_group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: &gpu.layouts.depth_frame,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: frame_uniforms.buffer().as_entire_binding(),
            }],
        });

        Self {
            label,
            mesh_pipeline: Self::build_mesh_pipeline(gpu, label, bias),
            frame_uniforms,
            frame_group,
            objects: DynamicUniforms::new(&gpu.device, &gpu.layouts.object, "Depth Object Uniforms"),
            terrain: ClipmapRenderer::new(gpu, label, TerrainShading::DepthOnly { bias }),
            queued: Vec::new(),
        }
    }

    fn build_mesh_pipeline(gpu: &GpuContext, label: &str, bias: wgpu::DepthBiasState) -> Option<wgpu::RenderPipeline> {
        let module = match gpu.shaders.module(&gpu.device, "passes/depth_mesh", &minijinja::context! {}) {
            Ok(module) => module,
            Err(e) => {
                log::error!("{label}: depth shader failed: {e}");
                return None;
            }
        };

        let layout = gpu.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(label),
            bind_group_layouts: &[Some::<&wgpu::BindGroupLayout>(&gpu.layouts.depth_frame), Some::<&wgpu::BindGroupLayout>(&gpu.layouts.object)],
            immediate_size: 0,
        });

        Some(gpu.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(label),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &module,
                entry_point: Some("vs_main"),
                buffers: &[MeshVertex::position_only_layout()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: None,
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: gpu.depth_format,
                depth_write_enabled: Some(true),
                depth_compare: Some(wgpu::CompareFunction::Less),
                stencil: wgpu::StencilState::default(),
                bias,
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        }))
    }

    #[inline]
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.mesh_pipeline.is_some()
    }

    /// Stages every renderable object accepted by `include`. Returns the
    /// number of objects staged.
    pub fn prepare(
        &mut self,
        gpu: &GpuContext,
        view: &DepthView,
        wind: &WindParams,
        objects: &[RenderObject],
        include: impl Fn(&RenderObject) -> bool,
    ) -> u32 {
        let (wind_motion, wind_state) = wind.uniform_vectors();
        self.frame_uniforms.write(
            &gpu.queue,
            &DepthFrameUniforms {
                view_projection: view.view_projection,
                wind_motion,
                wind_state,
            },
        );

        self.objects.clear();
        self.queued.clear();
        self.terrain.begin_frame();

        let mut staged = 0;
        for object in objects.iter().filter(|o| o.is_renderable() && include(o)) {
            if let Some(terrain) = &object.terrain {
                if terrain.use_clipmap {
                    if self.terrain.queue(gpu, terrain, object.model_matrix, view.camera_position, view.far, false) {
                        staged += 1;
                    }
                } else if let Some(baked) = &terrain.baked_mesh {
                    let offset = self.objects.push(&ObjectUniforms::new(object.model_matrix, terrain.base_color));
                    self.queued.push((Arc::clone(baked), offset));
                    staged += 1;
                }
                continue;
            }

            for mesh in &object.gpu_meshes {
                let mut uniforms = ObjectUniforms::new(object.model_matrix, mesh.base_color);
                if let Some(settings) = object.active_wind() {
                    uniforms.wind = settings.uniform_vector();
                    uniforms.flags = DrawFlags::WIND.bits();
                }
                let offset = self.objects.push(&uniforms);
                self.queued.push((Arc::clone(mesh), offset));
            }
            staged += 1;
        }

        self.objects.upload(&gpu.device, &gpu.queue);
        self.terrain.upload(gpu);
        staged
    }

    /// Records the staged draws into a pass whose depth target is bound.
    pub fn record(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_bind_group(0, &self.frame_group, &[]);

        if let Some(pipeline) = &self.mesh_pipeline
            && !self.queued.is_empty()
        {
            pass.set_pipeline(pipeline);
            for (mesh, offset) in &self.queued {
                pass.set_bind_group(1, &**self.objects.bind_group(), &[*offset]);
                mesh.draw(pass);
            }
        }

        self.terrain.record(pass);
    }

    pub fn destroy(&mut self) {
        log::debug!("{}: releasing depth draw resources", self.label);
        self.frame_uniforms.destroy();
        self.objects.destroy();
        self.terrain.destroy();
        self.queued.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_frame_uniforms_match_wgsl_layout() {
        assert_eq!(std::mem::size_of::<DepthFrameUniforms>(), 96);
    }
}
