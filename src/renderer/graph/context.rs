//! Render Context
//!
//! [`RenderContext`] is the per-frame blackboard shared by every pass:
//! camera, lighting, wind, viewport, timing, settings and the texture table.
//!
//! Texture slots are written once per frame by their producer and read by any
//! later pass. A producer that skips its work resets its slots to `None`, so
//! every consumer treats a slot as optional.

use std::str::FromStr;

use glam::{Mat4, Vec3};

use crate::errors::VerdantError;
use crate::renderer::core::Tracked;
use crate::renderer::settings::RenderSettings;
use crate::scene::{CameraState, SceneLightingParams, WindParams};

pub type TextureHandle = Tracked<wgpu::TextureView>;

/// Named entries of [`TextureSlots`], parseable from their camelCase or
/// snake_case names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureSlot {
    Depth,
    TerrainDepth,
    ShadowMap,
    ContactShadow,
    Hdr,
    SceneColor,
}

impl TextureSlot {
    pub const ALL: [Self; 6] = [
        Self::Depth,
        Self::TerrainDepth,
        Self::ShadowMap,
        Self::ContactShadow,
        Self::Hdr,
        Self::SceneColor,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Depth => "depth",
            Self::TerrainDepth => "terrainDepth",
            Self::ShadowMap => "shadowMap",
            Self::ContactShadow => "contactShadow",
            Self::Hdr => "hdr",
            Self::SceneColor => "sceneColor",
        }
    }
}

impl FromStr for TextureSlot {
    type Err = VerdantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "depth" | "depthTexture" => Ok(Self::Depth),
            "terrainDepth" | "terrain_depth" | "terrainDepthTexture" => Ok(Self::TerrainDepth),
            "shadowMap" | "shadow_map" => Ok(Self::ShadowMap),
            "contactShadow" | "contact_shadow" | "contactShadowTexture" => Ok(Self::ContactShadow),
            "hdr" | "hdrTexture" | "hdr_texture" => Ok(Self::Hdr),
            "sceneColor" | "scene_color" => Ok(Self::SceneColor),
            other => Err(VerdantError::UnknownTextureSlot(other.to_string())),
        }
    }
}

impl std::fmt::Display for TextureSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Textures exchanged between passes.
#[derive(Debug, Clone, Default)]
pub struct TextureSlots {
    /// Depth of every renderable object.
    pub depth: Option<TextureHandle>,
    /// Depth without terrain-blend targets; the same texture as `depth` when
    /// no object blends.
    pub terrain_depth: Option<TextureHandle>,
    pub shadow_map: Option<TextureHandle>,
    /// Published together with `shadow_map`.
    pub light_space_matrix: Option<Mat4>,
    pub contact_shadow: Option<TextureHandle>,
    pub hdr: Option<TextureHandle>,
    pub scene_color: Option<TextureHandle>,
}

impl TextureSlots {
    #[must_use]
    pub fn get(&self, slot: TextureSlot) -> Option<&TextureHandle> {
        match slot {
            TextureSlot::Depth => self.depth.as_ref(),
            TextureSlot::TerrainDepth => self.terrain_depth.as_ref(),
            TextureSlot::ShadowMap => self.shadow_map.as_ref(),
            TextureSlot::ContactShadow => self.contact_shadow.as_ref(),
            TextureSlot::Hdr => self.hdr.as_ref(),
            TextureSlot::SceneColor => self.scene_color.as_ref(),
        }
    }

    pub fn set(&mut self, slot: TextureSlot, value: Option<TextureHandle>) {
        match slot {
            TextureSlot::Depth => self.depth = value,
            TextureSlot::TerrainDepth => self.terrain_depth = value,
            TextureSlot::ShadowMap => self.shadow_map = value,
            TextureSlot::ContactShadow => self.contact_shadow = value,
            TextureSlot::Hdr => self.hdr = value,
            TextureSlot::SceneColor => self.scene_color = value,
        }
    }

    /// Publishes or clears the shadow map and its light-space matrix together.
    pub fn set_shadow(&mut self, shadow: Option<(TextureHandle, Mat4)>) {
        match shadow {
            Some((view, matrix)) => {
                self.shadow_map = Some(view);
                self.light_space_matrix = Some(matrix);
            }
            None => {
                self.shadow_map = None;
                self.light_space_matrix = None;
            }
        }
    }

    /// Publishes or clears the pre-pass depth in both depth slots.
    pub fn set_depth(&mut self, depth: Option<TextureHandle>) {
        self.terrain_depth.clone_from(&depth);
        self.depth = depth;
    }

    /// Publishes the full scene depth and, separately, the depth of the
    /// surfaces behind terrain-blend targets.
    pub fn set_depth_split(&mut self, depth: TextureHandle, terrain_depth: TextureHandle) {
        self.depth = Some(depth);
        self.terrain_depth = Some(terrain_depth);
    }
}

/// Per-frame state shared by all passes. One long-lived instance per pipeline.
#[derive(Debug, Clone)]
pub struct RenderContext {
    pub camera: CameraState,
    pub lighting: SceneLightingParams,
    pub wind: WindParams,
    pub width: u32,
    pub height: u32,
    pub settings: RenderSettings,
    pub textures: TextureSlots,
    /// Seconds since the previous `update_context`.
    pub delta_time: f32,
    /// Accumulated `delta_time`.
    pub time: f32,
    pub origin_position: Vec3,
}

impl RenderContext {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            camera: CameraState::default(),
            lighting: SceneLightingParams::default(),
            wind: WindParams::default(),
            width,
            height,
            settings: RenderSettings::default(),
            textures: TextureSlots::default(),
            delta_time: 0.0,
            time: 0.0,
            origin_position: Vec3::ZERO,
        }
    }

    #[inline]
    #[must_use]
    pub fn viewport(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
