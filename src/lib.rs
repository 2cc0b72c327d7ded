#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

//! Verdant: a wgpu forward rendering pipeline with clipmap terrain.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use verdant::{ForwardPipeline, GpuContext};
//!
//! let gpu = Arc::new(pollster::block_on(GpuContext::headless(wgpu::TextureFormat::Rgba8Unorm))?);
//! let mut pipeline = ForwardPipeline::with_default_passes(gpu, 1280, 720);
//! pipeline.update_context(&camera, lighting, wind, dt);
//! pipeline.render(&surface_view, &objects);
//! ```

pub mod errors;
pub mod renderer;
pub mod resources;
pub mod scene;
pub mod terrain;
pub mod utils;

pub use errors::{Result, VerdantError};
pub use renderer::{
    ForwardPipeline, FrameReport, GpuContext, GpuMesh, MeshRenderer, PassPriority, RenderContext, RenderPass,
    RenderSettings, SettingsPatch, StandardMeshRenderer, TextureSlot,
};
pub use resources::{MeshData, create_box, create_plane};
pub use scene::{
    Camera, DirectionalLightParams, HdrLightParams, PerspectiveCamera, RenderObject, SceneLightingParams,
    TerrainBlendSettings, WindParams, WindSettings,
};
pub use terrain::{ClipmapConfig, ClipmapGeometry, TerrainDescriptor};
