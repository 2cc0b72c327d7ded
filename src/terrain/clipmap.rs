//! Clipmap ring geometry
//!
//! Concentric square rings centered on the camera. Every ring has the same
//! vertex count per side; ring `i` is spaced `base_scale * 2^i`, so each
//! ring covers twice the extent of the previous one. Rings past the first
//! have a square hole of half their extent, which the previous ring fills.
//!
//! Vertex positions are baked in world units relative to the ring center;
//! the renderer adds the snapped camera position and samples height.

use bytemuck::{Pod, Zeroable};
use glam::Vec2;
use rustc_hash::FxHashMap;
use wgpu::util::DeviceExt;

use crate::renderer::core::GpuContext;

/// Position + uv (20 bytes).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct RingVertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
}

impl RingVertex {
    pub const ATTRIBUTES: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x2];
    pub const POSITION_ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x3];

    #[must_use]
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }

    /// Same stride, position only; used by depth-only pipelines.
    #[must_use]
    pub fn position_only_layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            attributes: &Self::POSITION_ATTRIBUTES,
            ..Self::layout()
        }
    }
}

/// Upper bound on [`ClipmapConfig::ring_count`]; ring scales double per level.
pub const MAX_RING_COUNT: u32 = 16;

/// Ring layout parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipmapConfig {
    pub ring_count: u32,
    /// Vertices per side, identical for every ring.
    pub grid_size: u32,
    /// Vertex spacing of ring 0 in world units.
    pub base_scale: f32,
}

impl Default for ClipmapConfig {
    fn default() -> Self {
        Self {
            ring_count: 5,
            grid_size: 65,
            base_scale: 1.0,
        }
    }
}

impl ClipmapConfig {
    #[inline]
    #[must_use]
    pub fn ring_scale(&self, level: u32) -> f32 {
        self.base_scale * 2f32.powi(level.min(MAX_RING_COUNT) as i32)
    }

    /// This config with `ring_count` limited to [`MAX_RING_COUNT`].
    #[must_use]
    pub fn clamped(self) -> Self {
        Self {
            ring_count: self.ring_count.min(MAX_RING_COUNT),
            ..self
        }
    }

    /// Outer half-extent of every ring in grid cells.
    #[inline]
    #[must_use]
    pub fn half_extent(&self) -> f32 {
        self.grid_size.saturating_sub(1) as f32 * 0.5
    }

    /// World half-extent of the outermost ring.
    #[must_use]
    pub fn coverage_radius(&self) -> f32 {
        if self.ring_count == 0 {
            return 0.0;
        }
        self.half_extent() * self.ring_scale(self.ring_count - 1)
    }

    /// Index of the first ring whose outer half-extent reaches `distance`, or
    /// `None` beyond the coverage radius.
    #[must_use]
    pub fn ring_for_distance(&self, distance: f32) -> Option<u32> {
        let distance = distance.abs();
        (0..self.ring_count).find(|&level| distance <= self.half_extent() * self.ring_scale(level))
    }

    /// The hole of ring `i` lines up with the outer edge of ring `i - 1`
    /// only when the cell count is a multiple of 4.
    #[must_use]
    pub fn has_aligned_holes(&self) -> bool {
        self.grid_size > 1 && (self.grid_size - 1) % 4 == 0
    }
}

/// CPU mesh of one ring.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RingMesh {
    pub vertices: Vec<RingVertex>,
    pub indices: Vec<u32>,
}

impl RingMesh {
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Builds one ring. `with_hole` skips every cell fully inside the central
/// square of half the ring's half-extent.
#[must_use]
pub fn build_ring_mesh(grid_size: u32, scale: f32, with_hole: bool) -> RingMesh {
    let n = grid_size.max(2);
    let cells = n - 1;
    let half = cells as f32 * 0.5;
    let hole_half = half * 0.5;

    let vertex = |ix: u32, iz: u32| RingVertex {
        position: [(ix as f32 - half) * scale, 0.0, (iz as f32 - half) * scale],
        uv: [ix as f32 / cells as f32, iz as f32 / cells as f32],
    };

    let mut mesh = RingMesh::default();

    if !with_hole {
        mesh.vertices.reserve((n * n) as usize);
        for iz in 0..n {
            for ix in 0..n {
                mesh.vertices.push(vertex(ix, iz));
            }
        }
        mesh.indices.reserve((cells * cells * 6) as usize);
        for iz in 0..cells {
            for ix in 0..cells {
                let tl = iz * n + ix;
                let tr = tl + 1;
                let bl = tl + n;
                let br = bl + 1;
                mesh.indices.extend_from_slice(&[tl, bl, tr, tr, bl, br]);
            }
        }
        return mesh;
    }

    let mut lookup: FxHashMap<(i32, i32), u32> = FxHashMap::default();
    let mut index_of = |ix: u32, iz: u32, vertices: &mut Vec<RingVertex>| -> u32 {
        *lookup.entry((ix as i32, iz as i32)).or_insert_with(|| {
            vertices.push(vertex(ix, iz));
            (vertices.len() - 1) as u32
        })
    };

    for iz in 0..cells {
        for ix in 0..cells {
            if cell_in_hole(ix, iz, half, hole_half) {
                continue;
            }
            let tl = index_of(ix, iz, &mut mesh.vertices);
            let bl = index_of(ix, iz + 1, &mut mesh.vertices);
            let tr = index_of(ix + 1, iz, &mut mesh.vertices);
            let br = index_of(ix + 1, iz + 1, &mut mesh.vertices);
            mesh.indices.extend_from_slice(&[tl, bl, tr, tr, bl, br]);
        }
    }
    mesh
}

/// Whether cell `(ix, iz)` lies fully inside the central square.
#[inline]
#[must_use]
pub fn cell_in_hole(ix: u32, iz: u32, half: f32, hole_half: f32) -> bool {
    let inside = |i: u32| {
        let lo = i as f32 - half;
        let hi = lo + 1.0;
        lo >= -hole_half && hi <= hole_half
    };
    inside(ix) && inside(iz)
}

/// Floors `(x, z)` to the nearest lower multiples of `scale`.
#[inline]
#[must_use]
pub fn snap_to_grid(x: f32, z: f32, scale: f32) -> Vec2 {
    Vec2::new((x / scale).floor() * scale, (z / scale).floor() * scale)
}

/// Number of leading rings of `config` to draw when nothing beyond
/// `distance` is visible. See [`ClipmapGeometry::visible_rings`].
#[must_use]
pub fn visible_ring_count(config: &ClipmapConfig, distance: f32) -> usize {
    let ring_count = config.ring_count as usize;
    config
        .ring_for_distance(distance)
        .map_or(ring_count, |band| (band as usize + 2).min(ring_count))
}

/// Uploaded ring.
pub struct ClipmapRing {
    pub level: u32,
    pub scale: f32,
    pub grid_size: u32,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    vertex_count: u32,
}

impl ClipmapRing {
    #[inline]
    #[must_use]
    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    #[inline]
    #[must_use]
    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    /// Outer half-extent in world units.
    #[must_use]
    pub fn half_extent(&self) -> f32 {
        (self.grid_size - 1) as f32 * 0.5 * self.scale
    }

    /// Half-extent of the hole in world units (0 for ring 0).
    #[must_use]
    pub fn inner_half_extent(&self) -> f32 {
        if self.level == 0 { 0.0 } else { self.half_extent() * 0.5 }
    }

    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..self.index_count, 0, 0..1);
    }

    fn destroy(&self) {
        self.vertex_buffer.destroy();
        self.index_buffer.destroy();
    }
}

/// The full ring set, generated once and kept until [`destroy`](Self::destroy).
pub struct ClipmapGeometry {
    config: ClipmapConfig,
    rings: Vec<ClipmapRing>,
}

impl ClipmapGeometry {
    /// Builds the rings of `config`, with the ring count clamped to
    /// [`MAX_RING_COUNT`].
    #[must_use]
    pub fn new(gpu: &GpuContext, config: ClipmapConfig) -> Self {
        let config = Self::checked(config);
        Self {
            config,
            rings: Self::build_rings(gpu, &config),
        }
    }

    fn checked(config: ClipmapConfig) -> ClipmapConfig {
        if config.ring_count > MAX_RING_COUNT {
            log::warn!(
                "Clipmap ring count {} exceeds {MAX_RING_COUNT}; clamping",
                config.ring_count
            );
        }
        config.clamped()
    }

    fn build_rings(gpu: &GpuContext, config: &ClipmapConfig) -> Vec<ClipmapRing> {
        if !config.has_aligned_holes() {
            log::warn!(
                "Clipmap grid size {} has a cell count not divisible by 4; ring holes will not align",
                config.grid_size
            );
        }

        (0..config.ring_count)
            .map(|level| {
                let scale = config.ring_scale(level);
                let mesh = build_ring_mesh(config.grid_size, scale, level > 0);

                let vertex_buffer = gpu.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&format!("Clipmap Ring {level} Vertices")),
                    contents: bytemuck::cast_slice(&mesh.vertices),
                    usage: wgpu::BufferUsages::VERTEX,
                });
                let index_buffer = gpu.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&format!("Clipmap Ring {level} Indices")),
                    contents: bytemuck::cast_slice(&mesh.indices),
                    usage: wgpu::BufferUsages::INDEX,
                });

                ClipmapRing {
                    level,
                    scale,
                    grid_size: config.grid_size,
                    vertex_buffer,
                    index_buffer,
                    index_count: mesh.indices.len() as u32,
                    vertex_count: mesh.vertices.len() as u32,
                }
            })
            .collect()
    }

    #[must_use]
    pub fn config(&self) -> &ClipmapConfig {
        &self.config
    }

    #[must_use]
    pub fn rings(&self) -> &[ClipmapRing] {
        &self.rings
    }

    #[must_use]
    pub fn ring(&self, level: usize) -> Option<&ClipmapRing> {
        self.rings.get(level)
    }

    /// Outermost half-extent times outermost scale.
    #[must_use]
    pub fn coverage_radius(&self) -> f32 {
        self.rings.last().map_or(0.0, ClipmapRing::half_extent)
    }

    #[must_use]
    pub fn ring_for_distance(&self, distance: f32) -> Option<u32> {
        if self.rings.is_empty() {
            return None;
        }
        self.config.ring_for_distance(distance)
    }

    /// Rings worth drawing when nothing beyond `distance` is visible: the
    /// band covering `distance` plus one more, since snapping can pull the
    /// next ring's inner edge up to one of its cells closer.
    #[must_use]
    pub fn visible_rings(&self, distance: f32) -> &[ClipmapRing] {
        let count = visible_ring_count(&self.config, distance).min(self.rings.len());
        &self.rings[..count]
    }

    /// Replaces every ring with a set built from `config`.
    pub fn reconfigure(&mut self, gpu: &GpuContext, config: ClipmapConfig) {
        self.destroy();
        let config = Self::checked(config);
        self.config = config;
        self.rings = Self::build_rings(gpu, &config);
    }

    pub fn destroy(&mut self) {
        for ring in &self.rings {
            ring.destroy();
        }
        self.rings.clear();
    }
}
