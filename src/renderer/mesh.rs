//! Meshes and mesh renderers
//!
//! [`GpuMesh`] owns the uploaded buffers of one [`MeshData`]. A
//! [`MeshRenderer`] turns a list of meshes into draw calls inside the opaque
//! pass; the pass has already bound the frame group (0) and hands the
//! renderer the per-mesh object uniform offsets for group 1.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use bitflags::bitflags;
use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec4};
use wgpu::util::DeviceExt;

use crate::renderer::core::GpuContext;
use crate::resources::{MeshData, MeshVertex};

bitflags! {
    /// Per-draw switches read by the mesh shader (`object.flags`).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct DrawFlags: u32 {
        const SELECTED = 1;
        const WIND = 1 << 1;
        const TERRAIN_BLEND = 1 << 2;
        const WIREFRAME = 1 << 3;
    }
}

/// Group 1 uniforms of mesh draws. Mirrors `ObjectUniforms` in `chunks/object.wgsl`.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct ObjectUniforms {
    pub model: Mat4,
    pub normal_matrix: Mat4,
    pub base_color: Vec4,
    /// influence, stiffness, anchor height, enabled
    pub wind: Vec4,
    pub flags: u32,
    pub blend_distance: f32,
    pub _pad0: f32,
    pub _pad1: f32,
}

impl ObjectUniforms {
    #[must_use]
    pub fn new(model: Mat4, base_color: Vec4) -> Self {
        Self {
            model,
            normal_matrix: model.inverse().transpose(),
            base_color,
            wind: Vec4::ZERO,
            flags: 0,
            blend_distance: 0.0,
            _pad0: 0.0,
            _pad1: 0.0,
        }
    }
}

/// Uploaded mesh: interleaved vertices, `u32` indices and optional
/// normal-debug line segments.
pub struct GpuMesh {
    pub label: String,
    pub base_color: Vec4,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    normal_lines: Option<(wgpu::Buffer, u32)>,
}

impl GpuMesh {
    #[must_use]
    pub fn from_data(gpu: &GpuContext, label: &str, data: &MeshData, base_color: Vec4) -> Self {
        let vertex_buffer = gpu.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} Vertices")),
            contents: bytemuck::cast_slice(&data.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = gpu.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} Indices")),
            contents: bytemuck::cast_slice(&data.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        Self {
            label: label.to_string(),
            base_color,
            vertex_buffer,
            index_buffer,
            index_count: data.indices.len() as u32,
            normal_lines: None,
        }
    }

    /// Also uploads debug lines of `length` along every vertex normal.
    #[must_use]
    pub fn with_normal_lines(mut self, gpu: &GpuContext, data: &MeshData, length: f32) -> Self {
        let lines = data.normal_lines(length);
        if !lines.is_empty() {
            let buffer = gpu.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{} Normal Lines", self.label)),
                contents: bytemuck::cast_slice(&lines),
                usage: wgpu::BufferUsages::VERTEX,
            });
            self.normal_lines = Some((buffer, lines.len() as u32));
        }
        self
    }

    #[inline]
    #[must_use]
    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    #[inline]
    #[must_use]
    pub fn has_normal_lines(&self) -> bool {
        self.normal_lines.is_some()
    }

    /// Binds vertex/index buffers and issues the indexed draw.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..self.index_count, 0, 0..1);
    }

    /// Draws the normal-debug lines, if uploaded. Returns whether a draw was issued.
    pub fn draw_normal_lines(&self, pass: &mut wgpu::RenderPass<'_>) -> bool {
        let Some((buffer, count)) = &self.normal_lines else {
            return false;
        };
        pass.set_vertex_buffer(0, buffer.slice(..));
        pass.draw(0..*count, 0..1);
        true
    }

    pub fn destroy(&self) {
        self.vertex_buffer.destroy();
        self.index_buffer.destroy();
        if let Some((buffer, _)) = &self.normal_lines {
            buffer.destroy();
        }
    }
}

/// Depth-aware fade parameters handed to a renderer when the object opted
/// in and a scene depth texture is bound in the frame group.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TerrainBlendParams {
    pub distance: f32,
    pub screen_size: (u32, u32),
    pub near: f32,
    pub far: f32,
}

/// One object's draw request inside the opaque pass.
pub struct MeshDraw<'a> {
    pub meshes: &'a [Arc<GpuMesh>],
    pub object_bind_group: &'a wgpu::BindGroup,
    /// Dynamic offset of each mesh's [`ObjectUniforms`], parallel to `meshes`.
    pub offsets: &'a [u32],
    pub wireframe: bool,
    pub blend: Option<TerrainBlendParams>,
}

pub trait MeshRenderer: Send + Sync {
    fn name(&self) -> &str;

    /// Records the lit draws. Returns the number of meshes drawn.
    fn draw(&self, pass: &mut wgpu::RenderPass<'_>, draw: &MeshDraw<'_>) -> u32;

    /// Records vertex-normal debug lines. Returns the number of meshes drawn.
    fn draw_normals(&self, _pass: &mut wgpu::RenderPass<'_>, _draw: &MeshDraw<'_>) -> u32 {
        0
    }
}

/// Forward-lit mesh renderer: Lambert + ambient, PCF shadows, HDR ambient,
/// selection highlight, wind sway and terrain blend.
pub struct StandardMeshRenderer {
    opaque: Option<wgpu::RenderPipeline>,
    blend: Option<wgpu::RenderPipeline>,
    wireframe: Option<wgpu::RenderPipeline>,
    normals: Option<wgpu::RenderPipeline>,
    warned_wireframe: AtomicBool,
}

impl StandardMeshRenderer {
    #[must_use]
    pub fn new(gpu: &GpuContext) -> Self {
        let ctx = minijinja::context! {};
        let (mesh_module, normals_module) = match (
            gpu.shaders.module(&gpu.device, "passes/mesh", &ctx),
            gpu.shaders.module(&gpu.device, "passes/normals", &ctx),
        ) {
            (Ok(m), Ok(n)) => (m, n),
            (Err(e), _) | (_, Err(e)) => {
                log::error!("StandardMeshRenderer: shader build failed: {e}");
                return Self {
                    opaque: None,
                    blend: None,
                    wireframe: None,
                    normals: None,
                    warned_wireframe: AtomicBool::new(false),
                };
            }
        };

        let layout = gpu.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Mesh Pipeline Layout"),
            bind_group_layouts: &[Some::<&wgpu::BindGroupLayout>(&gpu.layouts.frame), Some::<&wgpu::BindGroupLayout>(&gpu.layouts.object)],
            immediate_size: 0,
        });

        let build = |label: &str, blend: Option<wgpu::BlendState>, depth_write: bool, polygon_mode: wgpu::PolygonMode| {
            gpu.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&layout),
                vertex: wgpu::VertexState {
                    module: &mesh_module,
                    entry_point: Some("vs_main"),
                    buffers: &[MeshVertex::layout()],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &mesh_module,
                    entry_point: Some("fs_main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: gpu.color_format,
                        blend,
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: Some(wgpu::Face::Back),
                    polygon_mode,
                    ..Default::default()
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: gpu.depth_format,
                    depth_write_enabled: Some(depth_write),
                    depth_compare: Some(wgpu::CompareFunction::Less),
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState::default(),
                multiview_mask: None,
                cache: None,
            })
        };

        let opaque = build("Mesh Pipeline (Opaque)", Some(wgpu::BlendState::REPLACE), true, wgpu::PolygonMode::Fill);
        let blend = build(
            "Mesh Pipeline (Terrain Blend)",
            Some(wgpu::BlendState::ALPHA_BLENDING),
            false,
            wgpu::PolygonMode::Fill,
        );
        let wireframe = gpu
            .supports_wireframe
            .then(|| build("Mesh Pipeline (Wireframe)", Some(wgpu::BlendState::REPLACE), true, wgpu::PolygonMode::Line));

        let normals = gpu.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Mesh Normals Pipeline"),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &normals_module,
                entry_point: Some("vs_main"),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: 12,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![0 => Float32x3],
                }],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &normals_module,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: gpu.color_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::LineList,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: gpu.depth_format,
                depth_write_enabled: Some(false),
                depth_compare: Some(wgpu::CompareFunction::LessEqual),
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        Self {
            opaque: Some(opaque),
            blend: Some(blend),
            wireframe,
            normals: Some(normals),
            warned_wireframe: AtomicBool::new(false),
        }
    }

    fn pipeline_for(&self, draw: &MeshDraw<'_>) -> Option<&wgpu::RenderPipeline> {
        if draw.wireframe {
            if self.wireframe.is_some() {
                return self.wireframe.as_ref();
            }
            if !self.warned_wireframe.swap(true, Ordering::Relaxed) {
                log::warn!("Wireframe mode requested but POLYGON_MODE_LINE is unavailable; drawing filled");
            }
        }
        if draw.blend.is_some() {
            self.blend.as_ref()
        } else {
            self.opaque.as_ref()
        }
    }
}

impl MeshRenderer for StandardMeshRenderer {
    fn name(&self) -> &str {
        "StandardMeshRenderer"
    }

    fn draw(&self, pass: &mut wgpu::RenderPass<'_>, draw: &MeshDraw<'_>) -> u32 {
        let Some(pipeline) = self.pipeline_for(draw) else {
            return 0;
        };
        pass.set_pipeline(pipeline);

        let mut drawn = 0;
        for (mesh, offset) in draw.meshes.iter().zip(draw.offsets) {
            pass.set_bind_group(1, draw.object_bind_group, &[*offset]);
            mesh.draw(pass);
            drawn += 1;
        }
        drawn
    }

    fn draw_normals(&self, pass: &mut wgpu::RenderPass<'_>, draw: &MeshDraw<'_>) -> u32 {
        let Some(pipeline) = &self.normals else {
            return 0;
        };
        pass.set_pipeline(pipeline);

        let mut drawn = 0;
        for (mesh, offset) in draw.meshes.iter().zip(draw.offsets) {
            pass.set_bind_group(1, draw.object_bind_group, &[*offset]);
            if mesh.draw_normal_lines(pass) {
                drawn += 1;
            }
        }
        drawn
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_uniforms_match_wgsl_layout() {
        assert_eq!(std::mem::size_of::<ObjectUniforms>(), 176);
    }

    #[test]
    fn draw_flags_match_shader_constants() {
        assert_eq!(DrawFlags::SELECTED.bits(), 1);
        assert_eq!(DrawFlags::WIND.bits(), 2);
        assert_eq!(DrawFlags::TERRAIN_BLEND.bits(), 4);
        assert_eq!(DrawFlags::WIREFRAME.bits(), 8);
    }
}
