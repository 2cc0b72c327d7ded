//! Terrain
//!
//! A [`TerrainDescriptor`] describes one heightmapped terrain. It is drawn
//! either through the clipmap rings ([`ClipmapGeometry`]), recentered on the
//! camera each frame, or as a static mesh baked from the heightmap.

pub mod clipmap;
pub mod renderer;

use std::sync::Arc;

use glam::{Vec3, Vec4};

use crate::renderer::core::{GpuContext, Heightmap};
use crate::renderer::mesh::GpuMesh;
use crate::resources::{MeshData, PlaneOptions, create_plane};

pub use clipmap::{
    ClipmapConfig, ClipmapGeometry, ClipmapRing, MAX_RING_COUNT, RingMesh, RingVertex, build_ring_mesh, snap_to_grid,
    visible_ring_count,
};
pub use renderer::{ClipmapRenderer, TerrainRingUniforms, TerrainShading};

pub struct TerrainDescriptor {
    pub heightmap: Arc<Heightmap>,
    /// Edge length of the square the heightmap spans, in terrain-local units.
    pub world_size: f32,
    /// World height of a heightmap sample of 1.0.
    pub height_scale: f32,
    pub base_color: Vec4,
    /// Draw through `clipmap` when set, otherwise through `baked_mesh`.
    pub use_clipmap: bool,
    pub clipmap: Option<Arc<ClipmapGeometry>>,
    pub baked_mesh: Option<Arc<GpuMesh>>,
}

impl TerrainDescriptor {
    #[must_use]
    pub fn new(heightmap: Arc<Heightmap>, world_size: f32, height_scale: f32) -> Self {
        Self {
            heightmap,
            world_size,
            height_scale,
            base_color: Vec4::new(0.36, 0.48, 0.25, 1.0),
            use_clipmap: false,
            clipmap: None,
            baked_mesh: None,
        }
    }

    #[must_use]
    pub fn with_clipmap(mut self, clipmap: Arc<ClipmapGeometry>) -> Self {
        self.clipmap = Some(clipmap);
        self.use_clipmap = true;
        self
    }

    #[must_use]
    pub fn with_base_color(mut self, color: Vec4) -> Self {
        self.base_color = color;
        self
    }

    /// Uploads a mesh baked at `segments` cells per side as the static path.
    #[must_use]
    pub fn with_baked_mesh(mut self, gpu: &GpuContext, segments: u32) -> Self {
        let data = self.bake_mesh_data(segments);
        self.baked_mesh = Some(Arc::new(GpuMesh::from_data(gpu, "Baked Terrain", &data, self.base_color)));
        self
    }

    /// Terrain-local height at `(x, z)`, matching the shader lookup.
    #[must_use]
    pub fn height_at(&self, x: f32, z: f32) -> f32 {
        let size = self.world_size.max(f32::EPSILON);
        self.heightmap.sample_nearest(x / size + 0.5, z / size + 0.5) * self.height_scale
    }

    /// Grid over the full heightmap with heights and smooth normals applied.
    #[must_use]
    pub fn bake_mesh_data(&self, segments: u32) -> MeshData {
        let mut data = create_plane(&PlaneOptions {
            width: self.world_size,
            depth: self.world_size,
            width_segments: segments,
            depth_segments: segments,
        });
        for vertex in &mut data.vertices {
            let [x, _, z] = vertex.position;
            vertex.position = Vec3::new(x, self.height_at(x, z), z).to_array();
        }
        data.recompute_normals();
        data
    }

    /// Releases the clipmap rings and the baked mesh. GPU buffers are
    /// destroyed only when this descriptor holds the last reference; shared
    /// resources are just dropped from it. Returns the number of resources
    /// whose buffers were destroyed.
    pub fn destroy(&mut self) -> usize {
        let mut destroyed = 0;
        if let Some(mut clipmap) = self.clipmap.take() {
            match Arc::get_mut(&mut clipmap) {
                Some(geometry) => {
                    geometry.destroy();
                    destroyed += 1;
                }
                None => log::debug!("Clipmap geometry still shared; dropping this reference only"),
            }
        }
        if let Some(mesh) = self.baked_mesh.take() {
            if Arc::strong_count(&mesh) == 1 {
                mesh.destroy();
                destroyed += 1;
            } else {
                log::debug!("Baked terrain mesh still shared; dropping this reference only");
            }
        }
        self.use_clipmap = false;
        destroyed
    }

    /// The geometry to draw with, if the clipmap path is active and available.
    #[must_use]
    pub fn active_clipmap(&self) -> Option<&Arc<ClipmapGeometry>> {
        if self.use_clipmap { self.clipmap.as_ref() } else { None }
    }
}

impl std::fmt::Debug for TerrainDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerrainDescriptor")
            .field("heightmap", &self.heightmap.size())
            .field("world_size", &self.world_size)
            .field("height_scale", &self.height_scale)
            .field("use_clipmap", &self.use_clipmap)
            .field("clipmap_rings", &self.clipmap.as_ref().map(|c| c.rings().len()))
            .field("baked", &self.baked_mesh.is_some())
            .finish()
    }
}
