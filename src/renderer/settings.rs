//! Renderer Settings
//!
//! The settings bag read by every pass each frame, plus the partial patch type
//! used by [`ForwardPipeline::update_settings`](crate::renderer::ForwardPipeline::update_settings).
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use verdant::renderer::{RenderSettings, SettingsPatch};
//!
//! let mut settings = RenderSettings::from_json(r#"{ "shadowResolution": 4096 }"#)?;
//! settings.apply(&SettingsPatch {
//!     contact_shadow_enabled: Some(true),
//!     ..Default::default()
//! });
//! ```
//!
//! # Fields
//!
//! | Field                  | Description                              | Default |
//! |------------------------|------------------------------------------|---------|
//! | `shadow_enabled`       | Directional shadow map generation        | `true`  |
//! | `shadow_resolution`    | Shadow map edge length in texels         | `2048`  |
//! | `shadow_coverage`      | Half-extent of the shadow frustum (m)    | `40.0`  |
//! | `contact_shadow_enabled` | Screen-space contact shadows           | `false` |
//! | `contact_shadow`       | Ray-march parameters                     | see [`ContactShadowSettings`] |
//! | `wireframe_mode`       | Draw meshes as lines (if supported)      | `false` |
//! | `show_grid`            | Overlay world grid                       | `true`  |
//! | `show_axes`            | Overlay coordinate axes                  | `true`  |
//! | `fps_mode`             | First-person navigation (hides the origin marker) | `false` |
//! | `sky_white_point`      | Extended-Reinhard white point of the sky | `4.0`   |

use serde::{Deserialize, Serialize};

use crate::errors::Result;

/// Default shadow map edge length.
pub const DEFAULT_SHADOW_RESOLUTION: u32 = 2048;

/// Screen-space contact shadow parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContactShadowSettings {
    /// Maximum ray length in view-space units.
    pub max_distance: f32,
    /// Depth difference below which a sample counts as an occluder.
    pub thickness: f32,
    /// Number of ray-march steps.
    pub steps: u32,
    /// Darkening strength in `[0, 1]`.
    pub intensity: f32,
}

impl Default for ContactShadowSettings {
    fn default() -> Self {
        Self {
            max_distance: 0.5,
            thickness: 0.05,
            steps: 16,
            intensity: 0.6,
        }
    }
}

/// Per-frame settings bag shared by all passes through the render context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RenderSettings {
    pub shadow_enabled: bool,
    pub shadow_resolution: u32,
    pub shadow_coverage: f32,
    pub contact_shadow_enabled: bool,
    pub contact_shadow: ContactShadowSettings,
    pub wireframe_mode: bool,
    pub show_grid: bool,
    pub show_axes: bool,
    pub fps_mode: bool,
    pub sky_white_point: f32,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            shadow_enabled: true,
            shadow_resolution: DEFAULT_SHADOW_RESOLUTION,
            shadow_coverage: 40.0,
            contact_shadow_enabled: false,
            contact_shadow: ContactShadowSettings::default(),
            wireframe_mode: false,
            show_grid: true,
            show_axes: true,
            fps_mode: false,
            sky_white_point: 4.0,
        }
    }
}

impl RenderSettings {
    /// Parses settings from JSON; missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Applies every field present in `patch`.
    pub fn apply(&mut self, patch: &SettingsPatch) {
        if let Some(v) = patch.shadow_enabled {
            self.shadow_enabled = v;
        }
        if let Some(v) = patch.shadow_resolution {
            self.shadow_resolution = v.max(1);
        }
        if let Some(v) = patch.shadow_coverage {
            self.shadow_coverage = v;
        }
        if let Some(v) = patch.contact_shadow_enabled {
            self.contact_shadow_enabled = v;
        }
        if let Some(v) = patch.contact_shadow_max_distance {
            self.contact_shadow.max_distance = v;
        }
        if let Some(v) = patch.contact_shadow_thickness {
            self.contact_shadow.thickness = v;
        }
        if let Some(v) = patch.contact_shadow_steps {
            self.contact_shadow.steps = v.max(1);
        }
        if let Some(v) = patch.contact_shadow_intensity {
            self.contact_shadow.intensity = v.clamp(0.0, 1.0);
        }
        if let Some(v) = patch.wireframe_mode {
            self.wireframe_mode = v;
        }
        if let Some(v) = patch.show_grid {
            self.show_grid = v;
        }
        if let Some(v) = patch.show_axes {
            self.show_axes = v;
        }
        if let Some(v) = patch.fps_mode {
            self.fps_mode = v;
        }
        if let Some(v) = patch.sky_white_point {
            self.sky_white_point = v;
        }
    }
}

/// Partial update over [`RenderSettings`]. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SettingsPatch {
    pub shadow_enabled: Option<bool>,
    pub shadow_resolution: Option<u32>,
    pub shadow_coverage: Option<f32>,
    pub contact_shadow_enabled: Option<bool>,
    pub contact_shadow_max_distance: Option<f32>,
    pub contact_shadow_thickness: Option<f32>,
    pub contact_shadow_steps: Option<u32>,
    pub contact_shadow_intensity: Option<f32>,
    pub wireframe_mode: Option<bool>,
    pub show_grid: Option<bool>,
    pub show_axes: Option<bool>,
    pub fps_mode: Option<bool>,
    pub sky_white_point: Option<f32>,
}

impl SettingsPatch {
    /// Parses a patch from JSON, e.g. `{"showGrid": false}`.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_only_touches_present_fields() {
        let mut settings = RenderSettings::default();
        settings.apply(&SettingsPatch {
            show_grid: Some(false),
            contact_shadow_steps: Some(32),
            ..Default::default()
        });

        assert!(!settings.show_grid);
        assert!(settings.show_axes);
        assert_eq!(settings.contact_shadow.steps, 32);
        assert_eq!(settings.shadow_resolution, DEFAULT_SHADOW_RESOLUTION);
    }

    #[test]
    fn patch_clamps_degenerate_values() {
        let mut settings = RenderSettings::default();
        settings.apply(&SettingsPatch {
            shadow_resolution: Some(0),
            contact_shadow_steps: Some(0),
            contact_shadow_intensity: Some(3.0),
            ..Default::default()
        });

        assert_eq!(settings.shadow_resolution, 1);
        assert_eq!(settings.contact_shadow.steps, 1);
        assert!((settings.contact_shadow.intensity - 1.0).abs() < f32::EPSILON);
    }
}
