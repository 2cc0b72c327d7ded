//! Frame targets
//!
//! [`PingPongTargets`] is a fixed two-element arena of color + depth
//! targets. When the frame is composited, passes render into the write
//! element and the compositor samples it while writing to the host target;
//! the index flips after every composited frame.
//!
//! [`BlitProgram`] is the pass-through copy used when no pass composited.

use crate::renderer::core::{GpuContext, TargetTexture, Tracked};

use super::frame::{ClearValues, FrameEncoder, TargetKind};

pub struct PingPongTarget {
    pub color: TargetTexture,
    pub depth: TargetTexture,
}

pub struct PingPongTargets {
    targets: [PingPongTarget; 2],
    write: usize,
}

impl PingPongTargets {
    #[must_use]
    pub fn new(gpu: &GpuContext, width: u32, height: u32) -> Self {
        log::debug!("Allocating ping-pong targets {width}x{height}");
        let make = |i: usize| PingPongTarget {
            color: TargetTexture::new(
                &gpu.device,
                &format!("Ping-Pong Color {i}"),
                width,
                height,
                gpu.color_format,
                wgpu::TextureUsages::COPY_SRC,
            ),
            depth: TargetTexture::new(
                &gpu.device,
                &format!("Ping-Pong Depth {i}"),
                width,
                height,
                gpu.depth_format,
                wgpu::TextureUsages::empty(),
            ),
        };
        Self {
            targets: [make(0), make(1)],
            write: 0,
        }
    }

    #[inline]
    #[must_use]
    pub fn write_index(&self) -> usize {
        self.write
    }

    #[must_use]
    pub fn write_target(&self) -> &PingPongTarget {
        &self.targets[self.write]
    }

    /// The element written by the previous composited frame.
    #[must_use]
    pub fn read_target(&self) -> &PingPongTarget {
        &self.targets[1 - self.write]
    }

    pub fn flip(&mut self) {
        self.write = 1 - self.write;
    }

    /// Ids of every view, for recreation checks.
    #[must_use]
    pub fn ids(&self) -> [u64; 4] {
        [
            self.targets[0].color.view.id(),
            self.targets[0].depth.view.id(),
            self.targets[1].color.view.id(),
            self.targets[1].depth.view.id(),
        ]
    }

    pub fn destroy(&self) {
        for target in &self.targets {
            target.color.destroy();
            target.depth.destroy();
        }
    }
}

/// Texel-exact copy of one color texture onto the host target.
pub struct BlitProgram {
    pipeline: Option<wgpu::RenderPipeline>,
    layout: wgpu::BindGroupLayout,
    cached: Option<(u64, wgpu::BindGroup)>,
}

impl BlitProgram {
    #[must_use]
    pub fn new(gpu: &GpuContext) -> Self {
        let layout = gpu.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Blit Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: false },
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            }],
        });

        let pipeline = match gpu.shaders.module(&gpu.device, "passes/blit", &minijinja::context! {}) {
            Ok(module) => {
                let pipeline_layout = gpu.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                    label: Some("Blit Pipeline Layout"),
                    bind_group_layouts: &[Some::<&wgpu::BindGroupLayout>(&layout)],
                    immediate_size: 0,
                });
                Some(gpu.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                    label: Some("Blit Pipeline"),
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
                    depth_stencil: None,
                    multisample: wgpu::MultisampleState::default(),
                    multiview_mask: None,
                    cache: None,
                }))
            }
            Err(e) => {
                log::error!("Blit: shader failed: {e}");
                None
            }
        };

        Self {
            pipeline,
            layout,
            cached: None,
        }
    }

    /// Copies `source` onto `target` (same size and format).
    pub fn copy(
        &mut self,
        gpu: &GpuContext,
        frame: &mut FrameEncoder,
        source: &Tracked<wgpu::TextureView>,
        target: &wgpu::TextureView,
        size: (u32, u32),
    ) {
        let Some(pipeline) = &self.pipeline else {
            return;
        };

        if self.cached.as_ref().is_none_or(|(id, _)| *id != source.id()) {
            let group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Blit Source"),
                layout: &self.layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(source),
                }],
            });
            self.cached = Some((source.id(), group));
        }
        let Some((_, group)) = &self.cached else {
            return;
        };

        frame.use_texture(source);
        frame.bind_target(TargetKind::Screen, Some(target.into()), None, size);
        let Some(mut pass) = frame.begin_pass("Pass-Through Copy", ClearValues::LOAD) else {
            return;
        };
        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, group, &[]);
        pass.draw(0..3, 0..1);
    }
}
