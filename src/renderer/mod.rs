//! Renderer
//!
//! - [`core`]: device wrapper, shared layouts, uniform and texture helpers
//! - [`pipeline`]: WGSL templating and the shader module cache
//! - [`graph`]: the pass abstraction, the built-in passes and [`ForwardPipeline`]
//! - [`mesh`]: GPU meshes and the [`MeshRenderer`] seam
//! - [`atmosphere`]: sky model constants and its CPU reference
//! - [`settings`]: [`RenderSettings`] and [`SettingsPatch`]

pub mod atmosphere;
pub mod core;
pub mod graph;
pub mod mesh;
pub mod pipeline;
pub mod settings;

pub use atmosphere::Atmosphere;
pub use core::{GpuContext, Heightmap, TargetTexture, Tracked, upload_hdr_texture};
pub use graph::{
    ForwardPipeline, FrameReport, PassPriority, PassResult, RenderContext, RenderPass, TargetKind, TextureSlot,
    TextureSlots,
};
pub use mesh::{GpuMesh, MeshRenderer, StandardMeshRenderer};
pub use settings::{ContactShadowSettings, RenderSettings, SettingsPatch};
