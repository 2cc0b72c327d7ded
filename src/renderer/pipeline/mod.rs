//! Shader templating and module cache.

pub mod shader_manager;

pub use shader_manager::{ShaderLibrary, render_template, wgsl_f32};
