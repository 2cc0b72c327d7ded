//! Clipmap terrain renderer
//!
//! Used in two flavors: lit (opaque pass, frame group 0) and depth-only
//! (shadow and depth pre-passes, depth-frame group 0). Each instance owns its
//! ring uniforms, so passes that draw the same terrain never overwrite each
//! other's data within a frame.
//!
//! Per frame: [`begin_frame`](ClipmapRenderer::begin_frame), one
//! [`queue`](ClipmapRenderer::queue) per terrain object,
//! [`upload`](ClipmapRenderer::upload), then
//! [`record`](ClipmapRenderer::record) inside the render pass.

use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3, Vec4};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use super::TerrainDescriptor;
use super::clipmap::{ClipmapGeometry, RingVertex, snap_to_grid};
use crate::renderer::core::{DynamicUniforms, GpuContext};

/// Group 1 uniforms of a ring draw. Mirrors `TerrainRing` in `chunks/terrain.wgsl`.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct TerrainRingUniforms {
    pub model: Mat4,
    pub normal_matrix: Mat4,
    pub base_color: Vec4,
    /// Snapped ring origin (x, z) in terrain space, ring scale, ring index.
    pub placement: Vec4,
    /// World size, height scale, selected.
    pub terrain: Vec4,
}

impl TerrainRingUniforms {
    /// Uniforms of the rings of `geometry` visible from a camera at
    /// `camera_position` (world space) that sees up to `far` world units.
    #[must_use]
    pub fn for_rings(
        terrain: &TerrainDescriptor,
        geometry: &ClipmapGeometry,
        model: Mat4,
        camera_position: Vec3,
        far: f32,
        selected: bool,
    ) -> Vec<Self> {
        let local = model.inverse().transform_point3(camera_position);
        // Smallest axis scale turns a world distance into the largest local one.
        let min_scale = model.to_scale_rotation_translation().0.abs().min_element();
        let reach = if min_scale > f32::EPSILON { far / min_scale } else { f32::INFINITY };
        let normal_matrix = model.inverse().transpose();
        let terrain_params = Vec4::new(
            terrain.world_size,
            terrain.height_scale,
            if selected { 1.0 } else { 0.0 },
            0.0,
        );

        geometry
            .visible_rings(reach)
            .iter()
            .map(|ring| {
                let origin = snap_to_grid(local.x, local.z, ring.scale);
                Self {
                    model,
                    normal_matrix,
                    base_color: terrain.base_color,
                    placement: Vec4::new(origin.x, origin.y, ring.scale, ring.level as f32),
                    terrain: terrain_params,
                }
            })
            .collect()
    }
}

/// Which group-0 layout and attachments the pipeline is built for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TerrainShading {
    Lit,
    DepthOnly { bias: wgpu::DepthBiasState },
}

struct QueuedTerrain {
    geometry: Arc<ClipmapGeometry>,
    heightmap_id: u64,
    offsets: SmallVec<[u32; 8]>,
}

pub struct ClipmapRenderer {
    label: &'static str,
    pipeline: Option<wgpu::RenderPipeline>,
    rings: DynamicUniforms<TerrainRingUniforms>,
    heightmap_groups: FxHashMap<u64, wgpu::BindGroup>,
    queued: Vec<QueuedTerrain>,
}

impl ClipmapRenderer {
    #[must_use]
    pub fn new(gpu: &GpuContext, label: &'static str, shading: TerrainShading) -> Self {
        Self {
            label,
            pipeline: Self::build_pipeline(gpu, label, shading),
            rings: DynamicUniforms::new(&gpu.device, &gpu.layouts.terrain_ring, "Terrain Ring Uniforms"),
            heightmap_groups: FxHashMap::default(),
            queued: Vec::new(),
        }
    }

    fn build_pipeline(gpu: &GpuContext, label: &str, shading: TerrainShading) -> Option<wgpu::RenderPipeline> {
        let template = match shading {
            TerrainShading::Lit => "passes/terrain",
            TerrainShading::DepthOnly { .. } => "passes/depth_terrain",
        };
        let module = match gpu.shaders.module(&gpu.device, template, &minijinja::context! {}) {
            Ok(module) => module,
            Err(e) => {
                log::error!("{label}: terrain shader failed: {e}");
                return None;
            }
        };

        let frame_layout = match shading {
            TerrainShading::Lit => &gpu.layouts.frame,
            TerrainShading::DepthOnly { .. } => &gpu.layouts.depth_frame,
        };
        let layout = gpu.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(label),
            bind_group_layouts: &[Some::<&wgpu::BindGroupLayout>(frame_layout), Some::<&wgpu::BindGroupLayout>(&gpu.layouts.terrain_ring), Some::<&wgpu::BindGroupLayout>(&gpu.layouts.heightmap)],
            immediate_size: 0,
        });

        let (fragment_targets, bias, cull_mode, buffers) = match shading {
            TerrainShading::Lit => (
                vec![Some(wgpu::ColorTargetState {
                    format: gpu.color_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                wgpu::DepthBiasState::default(),
                Some(wgpu::Face::Back),
                RingVertex::layout(),
            ),
            TerrainShading::DepthOnly { bias } => (
                Vec::new(),
                bias,
                None,
                RingVertex::position_only_layout(),
            ),
        };

        let fragment = (!fragment_targets.is_empty()).then(|| wgpu::FragmentState {
            module: &module,
            entry_point: Some("fs_main"),
            targets: &fragment_targets,
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        });

        Some(gpu.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(label),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &module,
                entry_point: Some("vs_main"),
                buffers: &[buffers],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment,
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode,
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
        self.pipeline.is_some()
    }

    pub fn begin_frame(&mut self) {
        self.rings.clear();
        self.queued.clear();
    }

    /// Stages the rings of one terrain. Returns `false` when the terrain has
    /// no active clipmap geometry or this renderer has no pipeline.
    pub fn queue(
        &mut self,
        gpu: &GpuContext,
        terrain: &TerrainDescriptor,
        model: Mat4,
        camera_position: Vec3,
        far: f32,
        selected: bool,
    ) -> bool {
        if self.pipeline.is_none() {
            return false;
        }
        let Some(geometry) = terrain.active_clipmap() else {
            return false;
        };
        if geometry.rings().is_empty() {
            return false;
        }

        let view = terrain.heightmap.view();
        self.heightmap_groups.entry(view.id()).or_insert_with(|| {
            log::debug!("{}: heightmap bind group for view {}", self.label, view.id());
            gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Terrain Heightmap"),
                layout: &gpu.layouts.heightmap,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(view),
                }],
            })
        });

        let offsets = TerrainRingUniforms::for_rings(terrain, geometry, model, camera_position, far, selected)
            .iter()
            .map(|ring| self.rings.push(ring))
            .collect();

        self.queued.push(QueuedTerrain {
            geometry: Arc::clone(geometry),
            heightmap_id: view.id(),
            offsets,
        });
        true
    }

    /// Writes staged ring uniforms and drops bind groups of heightmaps that
    /// were not queued this frame.
    pub fn upload(&mut self, gpu: &GpuContext) {
        let queued = &self.queued;
        self.heightmap_groups
            .retain(|id, _| queued.iter().any(|q| q.heightmap_id == *id));
        self.rings.upload(&gpu.device, &gpu.queue);
    }

    /// Draws every queued visible ring. Group 0 must already be bound. Returns the
    /// number of terrains drawn.
    pub fn record(&self, pass: &mut wgpu::RenderPass<'_>) -> u32 {
        let Some(pipeline) = &self.pipeline else {
            return 0;
        };
        if self.queued.is_empty() {
            return 0;
        }
        pass.set_pipeline(pipeline);

        let mut drawn = 0;
        for terrain in &self.queued {
            let Some(heightmap) = self.heightmap_groups.get(&terrain.heightmap_id) else {
                continue;
            };
            pass.set_bind_group(2, heightmap, &[]);
            for (ring, offset) in terrain.geometry.rings().iter().zip(&terrain.offsets) {
                pass.set_bind_group(1, &**self.rings.bind_group(), &[*offset]);
                ring.draw(pass);
            }
            drawn += 1;
        }
        drawn
    }

    pub fn destroy(&mut self) {
        self.queued.clear();
        self.heightmap_groups.clear();
        self.rings.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ring_uniforms_match_wgsl_layout() {
        assert_eq!(std::mem::size_of::<TerrainRingUniforms>(), 176);
    }
}
