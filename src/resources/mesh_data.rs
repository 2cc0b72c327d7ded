use bytemuck::{Pod, Zeroable};
use glam::Vec3;

/// Interleaved vertex used by every lit mesh: position, normal, uv (32 bytes).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl MeshVertex {
    pub const ATTRIBUTES: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2];
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
            array_stride: std::mem::size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::POSITION_ATTRIBUTES,
        }
    }
}

/// CPU-side triangle mesh ready for upload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Line segments from each vertex along its normal, for debug display.
    #[must_use]
    pub fn normal_lines(&self, length: f32) -> Vec<[f32; 3]> {
        self.vertices
            .iter()
            .flat_map(|v| {
                let p = Vec3::from(v.position);
                let n = Vec3::from(v.normal).normalize_or_zero();
                [v.position, (p + n * length).to_array()]
            })
            .collect()
    }

    /// Recomputes smooth vertex normals from the triangle list.
    pub fn recompute_normals(&mut self) {
        let mut accum = vec![Vec3::ZERO; self.vertices.len()];
        for tri in self.indices.chunks_exact(3) {
            let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            let pa = Vec3::from(self.vertices[a].position);
            let pb = Vec3::from(self.vertices[b].position);
            let pc = Vec3::from(self.vertices[c].position);
            let face = (pb - pa).cross(pc - pa);
            accum[a] += face;
            accum[b] += face;
            accum[c] += face;
        }
        for (vertex, n) in self.vertices.iter_mut().zip(accum) {
            vertex.normal = n.normalize_or(Vec3::Y).to_array();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_is_32_bytes() {
        assert_eq!(std::mem::size_of::<MeshVertex>(), 32);
    }

    #[test]
    fn normal_lines_pair_every_vertex() {
        let mut data = MeshData {
            vertices: vec![
                MeshVertex {
                    position: [0.0, 0.0, 0.0],
                    normal: [0.0; 3],
                    uv: [0.0; 2],
                },
                MeshVertex {
                    position: [1.0, 0.0, 0.0],
                    normal: [0.0; 3],
                    uv: [1.0, 0.0],
                },
                MeshVertex {
                    position: [0.0, 0.0, -1.0],
                    normal: [0.0; 3],
                    uv: [0.0, 1.0],
                },
            ],
            indices: vec![0, 1, 2],
        };
        data.recompute_normals();

        let lines = data.normal_lines(0.5);
        assert_eq!(lines.len(), 6);
        assert!((lines[1][1] - 0.5).abs() < 1e-6);
    }
}
