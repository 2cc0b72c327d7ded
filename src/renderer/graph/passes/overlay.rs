use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3, Vec4};
use wgpu::util::DeviceExt;

use crate::renderer::core::{GpuContext, UniformBuffer, uniform_entry};
use crate::renderer::graph::{ClearValues, FrameEncoder, PassPriority, PassResult, RenderContext, RenderPass};
use crate::renderer::settings::RenderSettings;
use crate::scene::RenderObject;
use crate::utils::PassTimer;

/// Grid lines run from `-GRID_HALF_EXTENT` to `GRID_HALF_EXTENT` on both axes.
pub const GRID_HALF_EXTENT: i32 = 20;
pub const GRID_SPACING: f32 = 1.0;
/// Distance from the camera at which the grid has fully faded.
pub const GRID_FADE_DISTANCE: f32 = 30.0;
pub const AXIS_LENGTH: f32 = 5.0;
pub const ORIGIN_MARKER_SIZE: f32 = 0.25;

const GRID_COLOR: [f32; 4] = [0.5, 0.5, 0.5, 0.5];
const GRID_MAJOR_COLOR: [f32; 4] = [0.6, 0.6, 0.6, 0.8];
const ORIGIN_COLOR: [f32; 4] = [1.0, 0.85, 0.1, 1.0];

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct OverlayVertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
}

impl OverlayVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x4];

    #[must_use]
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Mirrors `OverlayUniforms` in `passes/overlay.wgsl`.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct OverlayUniforms {
    pub view_projection: Mat4,
    /// Camera position, grid fade distance.
    pub camera: Vec4,
}

fn line(out: &mut Vec<OverlayVertex>, a: Vec3, b: Vec3, color: [f32; 4]) {
    out.push(OverlayVertex {
        position: a.to_array(),
        color,
    });
    out.push(OverlayVertex {
        position: b.to_array(),
        color,
    });
}

/// Line-list vertices for the current overlay flags.
///
/// Grid on the XZ plane when `show_grid`, RGB axes along +X/+Y/+Z when
/// `show_axes`, and a cross at `origin` unless the camera is in FPS mode.
#[must_use]
pub fn overlay_lines(settings: &RenderSettings, origin: Vec3) -> Vec<OverlayVertex> {
    let mut out = Vec::new();

    if settings.show_grid {
        let extent = GRID_HALF_EXTENT as f32 * GRID_SPACING;
        for i in -GRID_HALF_EXTENT..=GRID_HALF_EXTENT {
            // Axis lines replace the center grid lines.
            if i == 0 && settings.show_axes {
                continue;
            }
            let color = if i % 5 == 0 { GRID_MAJOR_COLOR } else { GRID_COLOR };
            let t = i as f32 * GRID_SPACING;
            line(&mut out, Vec3::new(t, 0.0, -extent), Vec3::new(t, 0.0, extent), color);
            line(&mut out, Vec3::new(-extent, 0.0, t), Vec3::new(extent, 0.0, t), color);
        }
    }

    if settings.show_axes {
        line(&mut out, Vec3::ZERO, Vec3::X * AXIS_LENGTH, [1.0, 0.2, 0.2, 1.0]);
        line(&mut out, Vec3::ZERO, Vec3::Y * AXIS_LENGTH, [0.2, 1.0, 0.2, 1.0]);
        line(&mut out, Vec3::ZERO, Vec3::Z * AXIS_LENGTH, [0.2, 0.4, 1.0, 1.0]);
    }

    if !settings.fps_mode {
        let s = ORIGIN_MARKER_SIZE;
        for axis in [Vec3::X, Vec3::Y, Vec3::Z] {
            line(&mut out, origin - axis * s, origin + axis * s, ORIGIN_COLOR);
        }
    }

    out
}

/// The flags and origin the cached vertex buffer was built from.
#[derive(Debug, Clone, Copy, PartialEq)]
struct OverlayKey {
    show_grid: bool,
    show_axes: bool,
    fps_mode: bool,
    origin: Vec3,
}

impl OverlayKey {
    fn of(ctx: &RenderContext) -> Self {
        Self {
            show_grid: ctx.settings.show_grid,
            show_axes: ctx.settings.show_axes,
            fps_mode: ctx.settings.fps_mode,
            origin: ctx.origin_position,
        }
    }
}

/// Editor helpers drawn over the lit scene: grid, axes and the origin marker.
pub struct OverlayPass {
    enabled: bool,
    uniforms: UniformBuffer<OverlayUniforms>,
    group: wgpu::BindGroup,
    pipeline: Option<wgpu::RenderPipeline>,
    lines: Option<(OverlayKey, wgpu::Buffer, u32)>,
}

impl OverlayPass {
    pub const NAME: &'static str = "Overlay";

    #[must_use]
    pub fn new(gpu: &GpuContext) -> Self {
        let uniforms = UniformBuffer::new(&gpu.device, "Overlay Uniforms");
        let layout = gpu.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Overlay Layout"),
            entries: &[uniform_entry(0, wgpu::ShaderStages::VERTEX_FRAGMENT, false)],
        });
        let group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Overlay"),
            layout: &layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniforms.buffer().as_entire_binding(),
            }],
        });

        Self {
            enabled: true,
            pipeline: Self::build_pipeline(gpu, &layout),
            uniforms,
            group,
            lines: None,
        }
    }

    fn build_pipeline(gpu: &GpuContext, layout: &wgpu::BindGroupLayout) -> Option<wgpu::RenderPipeline> {
        let module = gpu
            .shaders
            .module(&gpu.device, "passes/overlay", &minijinja::context! {})
            .inspect_err(|e| log::error!("{}: shader failed: {e}", Self::NAME))
            .ok()?;

        let pipeline_layout = gpu.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Overlay Pipeline Layout"),
            bind_group_layouts: &[Some::<&wgpu::BindGroupLayout>(layout)],
            immediate_size: 0,
        });

        Some(gpu.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Overlay Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &module,
                entry_point: Some("vs_main"),
                buffers: &[OverlayVertex::layout()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &module,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: gpu.color_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
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
        }))
    }

    /// Rebuilds the line buffer when the flags or origin changed.
    fn ensure_lines(&mut self, gpu: &GpuContext, ctx: &RenderContext) -> Option<(&wgpu::Buffer, u32)> {
        let key = OverlayKey::of(ctx);
        if self.lines.as_ref().is_none_or(|(cached, _, _)| *cached != key) {
            if let Some((_, old, _)) = self.lines.take() {
                old.destroy();
            }
            let vertices = overlay_lines(&ctx.settings, ctx.origin_position);
            if vertices.is_empty() {
                return None;
            }
            log::debug!("{}: rebuilding {} line vertices", Self::NAME, vertices.len());
            let buffer = gpu.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Overlay Lines"),
                contents: bytemuck::cast_slice(&vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
            self.lines = Some((key, buffer, vertices.len() as u32));
        }
        self.lines.as_ref().map(|(_, buffer, count)| (buffer, *count))
    }
}

impl RenderPass for OverlayPass {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn priority(&self) -> PassPriority {
        PassPriority::OVERLAY
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
        let pipeline = self.pipeline.clone()?;
        let timer = PassTimer::start();

        self.uniforms.write(
            &gpu.queue,
            &OverlayUniforms {
                view_projection: ctx.camera.view_projection,
                camera: ctx.camera.position.extend(GRID_FADE_DISTANCE),
            },
        );
        let group = self.group.clone();
        let (buffer, count) = self.ensure_lines(gpu, ctx)?;

        let mut pass = frame.begin_pass("Overlay Pass", ClearValues::LOAD)?;
        pass.set_pipeline(&pipeline);
        pass.set_bind_group(0, &group, &[]);
        pass.set_vertex_buffer(0, buffer.slice(..));
        pass.draw(0..count, 0..1);
        drop(pass);

        Some(PassResult::new(Self::NAME, 0, timer.elapsed_ms()).with_note(format!("{} lines", count / 2)))
    }

    fn destroy(&mut self) {
        self.uniforms.destroy();
        if let Some((_, buffer, _)) = self.lines.take() {
            buffer.destroy();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(show_grid: bool, show_axes: bool, fps_mode: bool) -> RenderSettings {
        RenderSettings {
            show_grid,
            show_axes,
            fps_mode,
            ..Default::default()
        }
    }

    #[test]
    fn flags_gate_each_group() {
        assert!(overlay_lines(&settings(false, false, true), Vec3::ZERO).is_empty());

        let marker = overlay_lines(&settings(false, false, false), Vec3::new(2.0, 0.0, 3.0));
        assert_eq!(marker.len(), 6);
        assert!(marker.iter().all(|v| v.color == ORIGIN_COLOR));
        assert_eq!(marker[0].position, [2.0 - ORIGIN_MARKER_SIZE, 0.0, 3.0]);

        let axes = overlay_lines(&settings(false, true, true), Vec3::ZERO);
        assert_eq!(axes.len(), 6);
        assert_eq!(axes[1].position, [AXIS_LENGTH, 0.0, 0.0]);
    }

    #[test]
    fn grid_skips_center_lines_under_axes() {
        let lines_per_side = (2 * GRID_HALF_EXTENT + 1) as usize;
        let grid_only = overlay_lines(&settings(true, false, true), Vec3::ZERO);
        assert_eq!(grid_only.len(), lines_per_side * 4);

        let with_axes = overlay_lines(&settings(true, true, true), Vec3::ZERO);
        assert_eq!(with_axes.len(), (lines_per_side - 1) * 4 + 6);
        assert!(with_axes.iter().all(|v| v.position[1] == 0.0 || v.color[1] == 1.0));
    }

    #[test]
    fn overlay_vertex_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<OverlayVertex>(), 28);
        assert_eq!(std::mem::size_of::<OverlayUniforms>(), 80);
    }
}
