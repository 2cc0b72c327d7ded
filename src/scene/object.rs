use std::sync::Arc;

use glam::Mat4;

use crate::renderer::mesh::{GpuMesh, MeshRenderer};
use crate::scene::wind::WindSettings;
use crate::terrain::TerrainDescriptor;

/// Depth-aware fade of an object into the terrain behind it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TerrainBlendSettings {
    pub enabled: bool,
    /// View-space distance over which the object fades into the surface
    /// behind it.
    pub blend_distance: f32,
}

impl Default for TerrainBlendSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            blend_distance: 0.3,
        }
    }
}

/// One drawable entity for one frame.
///
/// The pipeline never keeps these past the `render` call that receives them.
#[derive(Clone)]
pub struct RenderObject {
    pub id: u64,
    pub model_matrix: Mat4,
    pub renderer: Option<Arc<dyn MeshRenderer>>,
    pub gpu_meshes: Vec<Arc<GpuMesh>>,
    pub selected: bool,
    pub wind: Option<WindSettings>,
    pub terrain_blend: Option<TerrainBlendSettings>,
    pub show_normals: bool,
    pub terrain: Option<Arc<TerrainDescriptor>>,
}

impl std::fmt::Debug for RenderObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderObject")
            .field("id", &self.id)
            .field("has_renderer", &self.renderer.is_some())
            .field("gpu_meshes", &self.gpu_meshes.len())
            .field("selected", &self.selected)
            .field("terrain", &self.terrain.is_some())
            .finish_non_exhaustive()
    }
}

impl RenderObject {
    #[must_use]
    pub fn mesh(id: u64, model_matrix: Mat4, renderer: Arc<dyn MeshRenderer>, gpu_meshes: Vec<Arc<GpuMesh>>) -> Self {
        Self {
            id,
            model_matrix,
            renderer: Some(renderer),
            gpu_meshes,
            selected: false,
            wind: None,
            terrain_blend: None,
            show_normals: false,
            terrain: None,
        }
    }

    #[must_use]
    pub fn terrain(id: u64, model_matrix: Mat4, terrain: Arc<TerrainDescriptor>) -> Self {
        Self {
            id,
            model_matrix,
            renderer: None,
            gpu_meshes: Vec::new(),
            selected: false,
            wind: None,
            terrain_blend: None,
            show_normals: false,
            terrain: Some(terrain),
        }
    }

    #[must_use]
    pub fn with_wind(mut self, wind: WindSettings) -> Self {
        self.wind = Some(wind);
        self
    }

    #[must_use]
    pub fn with_terrain_blend(mut self, blend: TerrainBlendSettings) -> Self {
        self.terrain_blend = Some(blend);
        self
    }

    /// Mesh path: a renderer and at least one GPU mesh.
    #[inline]
    #[must_use]
    pub fn has_meshes(&self) -> bool {
        self.renderer.is_some() && !self.gpu_meshes.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn is_terrain(&self) -> bool {
        self.terrain.is_some()
    }

    /// Objects that are neither meshes nor terrain are skipped by every pass.
    #[inline]
    #[must_use]
    pub fn is_renderable(&self) -> bool {
        self.is_terrain() || self.has_meshes()
    }

    #[must_use]
    pub fn wants_terrain_blend(&self) -> bool {
        self.terrain_blend.is_some_and(|b| b.enabled)
    }

    #[must_use]
    pub fn active_wind(&self) -> Option<&WindSettings> {
        self.wind.as_ref().filter(|w| w.enabled)
    }
}
