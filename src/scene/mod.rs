//! Scene-side inputs to the renderer
//!
//! The scene graph, lighting manager and wind simulation live in the host;
//! this module holds the shapes they hand to the pipeline each frame:
//! - [`Camera`]: view/projection provider, with [`PerspectiveCamera`]
//! - [`SceneLightingParams`]: sun or HDR environment lighting
//! - [`WindParams`] / [`WindSettings`]: global wind and per-object response
//! - [`RenderObject`]: one drawable entity for one frame

pub mod camera;
pub mod light;
pub mod object;
pub mod wind;

pub use camera::{Camera, CameraState, PerspectiveCamera};
pub use light::{DirectionalLightParams, HdrLightParams, SceneLightingParams};
pub use object::{RenderObject, TerrainBlendSettings};
pub use wind::{WindParams, WindSettings, wind_displacement};
