//! Error Types
//!
//! This module defines the error types used by the fallible setup paths of the
//! renderer.
//!
//! # Overview
//!
//! The per-frame path never returns errors: passes degrade (log and skip) instead.
//! [`VerdantError`] covers the operations a host performs around the frame loop:
//! - GPU adapter / device acquisition
//! - Shader template rendering
//! - Settings parsing
//! - Texture uploads and texture-slot lookups
//!
//! # Usage
//!
//! ```rust,ignore
//! use verdant::errors::{VerdantError, Result};
//!
//! fn load_settings(json: &str) -> Result<RenderSettings> {
//!     RenderSettings::from_json(json)
//! }
//! ```

use thiserror::Error;

/// The main error type for the renderer.
#[derive(Error, Debug)]
pub enum VerdantError {
    // ========================================================================
    // GPU & Rendering Errors
    // ========================================================================
    /// Failed to request a compatible GPU adapter.
    #[error("Failed to request WGPU adapter: {0}")]
    AdapterRequestFailed(String),

    /// Failed to create the GPU device.
    #[error("Failed to create WGPU device: {0}")]
    DeviceCreateFailed(#[from] wgpu::RequestDeviceError),

    /// A WGSL template could not be found or rendered.
    #[error("Shader template '{name}' failed: {message}")]
    ShaderTemplate {
        /// Template name relative to the shader folder
        name: String,
        /// Rendering error reported by the template engine
        message: String,
    },

    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Settings JSON could not be parsed.
    #[error("Settings parse error: {0}")]
    SettingsParse(#[from] serde_json::Error),

    // ========================================================================
    // Texture Errors
    // ========================================================================
    /// Pixel data does not match the declared texture size.
    #[error("Texture '{label}' expects {expected} values, got {actual}")]
    TextureSizeMismatch {
        /// Debug label of the texture being uploaded
        label: String,
        /// Number of values implied by the dimensions
        expected: usize,
        /// Number of values supplied
        actual: usize,
    },

    /// The requested texture exceeds the device limit.
    #[error("Texture '{label}' size {size} exceeds device limit {limit}")]
    TextureTooLarge {
        /// Debug label of the texture
        label: String,
        /// Requested edge length
        size: u32,
        /// `max_texture_dimension_2d` of the device
        limit: u32,
    },

    /// A texture slot name did not match any slot of the context.
    #[error("Unknown texture slot: {0}")]
    UnknownTextureSlot(String),
}

impl From<minijinja::Error> for VerdantError {
    fn from(err: minijinja::Error) -> Self {
        VerdantError::ShaderTemplate {
            name: err.name().unwrap_or("<unknown>").to_string(),
            message: err.to_string(),
        }
    }
}

/// Alias for `Result<T, VerdantError>`.
pub type Result<T> = std::result::Result<T, VerdantError>;
