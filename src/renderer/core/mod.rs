//! GPU core
//!
//! - [`GpuContext`]: device, queue, formats, shared layouts, fallbacks, shaders
//! - [`Tracked`]: resources with a process-unique id
//! - [`UniformBuffer`] / [`DynamicUniforms`]: uniform upload helpers
//! - [`Heightmap`], [`upload_hdr_texture`]: texture uploads

pub mod context;
pub mod texture;
pub mod tracked;
pub mod uniforms;

pub use context::{FallbackTextures, GpuContext, SharedLayouts, uniform_entry};
pub use texture::{HDR_FORMAT, Heightmap, TargetTexture, upload_hdr_texture};
pub use tracked::Tracked;
pub use uniforms::{DynamicUniforms, UniformBuffer, align_to};
