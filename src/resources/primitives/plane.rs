use crate::resources::mesh_data::{MeshData, MeshVertex};

pub struct PlaneOptions {
    pub width: f32,
    pub depth: f32,
    pub width_segments: u32,
    pub depth_segments: u32,
}

impl Default for PlaneOptions {
    fn default() -> Self {
        Self {
            width: 1.0,
            depth: 1.0,
            width_segments: 1,
            depth_segments: 1,
        }
    }
}

/// Horizontal grid on the XZ plane facing +Y, centered at the origin.
#[must_use]
pub fn create_plane(options: &PlaneOptions) -> MeshData {
    let grid_x = options.width_segments.max(1);
    let grid_z = options.depth_segments.max(1);
    let columns = grid_x + 1;

    let mut data = MeshData::default();
    for iz in 0..=grid_z {
        let v = iz as f32 / grid_z as f32;
        for ix in 0..=grid_x {
            let u = ix as f32 / grid_x as f32;
            data.vertices.push(MeshVertex {
                position: [(u - 0.5) * options.width, 0.0, (v - 0.5) * options.depth],
                normal: [0.0, 1.0, 0.0],
                uv: [u, v],
            });
        }
    }

    for iz in 0..grid_z {
        for ix in 0..grid_x {
            let a = ix + columns * iz;
            let b = ix + columns * (iz + 1);
            let c = (ix + 1) + columns * (iz + 1);
            let d = (ix + 1) + columns * iz;
            data.indices.extend_from_slice(&[a, b, d, d, b, c]);
        }
    }
    data
}
