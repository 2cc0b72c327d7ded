//! Pass Priorities
//!
//! `PassPriority` defines the execution order of the forward pipeline.
//! Lower values run first; passes with equal priority keep insertion order.
//!
//! | Priority | Value | Typical Content |
//! |----------|-------|-----------------|
//! | `SHADOW` | 100 | Directional shadow map |
//! | `DEPTH_PREPASS` | 150 | Scene depth for blending and contact shadows |
//! | `SKY` | 200 | Atmosphere or HDR background |
//! | `OPAQUE` | 300 | Meshes and terrain |
//! | `TRANSPARENT` | 400 | Alpha-blended geometry |
//! | `POST_PROCESS` | 500 | Contact shadows and other scene-color consumers |
//! | `OVERLAY` | 600 | Grid, axes, origin marker |
//! | `UI` | 700 | Host user interface |

/// Ordering key of a pass. Fixed when the pass is constructed.
#[derive(Debug, Hash, PartialEq, Eq, Clone, Copy, PartialOrd, Ord)]
pub struct PassPriority(pub u32);

impl PassPriority {
    pub const SHADOW: Self = Self(100);
    pub const DEPTH_PREPASS: Self = Self(150);
    pub const SKY: Self = Self(200);
    pub const OPAQUE: Self = Self(300);
    pub const TRANSPARENT: Self = Self(400);
    pub const POST_PROCESS: Self = Self(500);
    pub const OVERLAY: Self = Self(600);
    pub const UI: Self = Self(700);

    #[inline]
    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }

    /// Name of the standard band this priority falls in (for logging).
    #[must_use]
    pub const fn band(self) -> &'static str {
        match self.0 {
            0..150 => "Shadow",
            150..200 => "DepthPrepass",
            200..300 => "Sky",
            300..400 => "Opaque",
            400..500 => "Transparent",
            500..600 => "PostProcess",
            600..700 => "Overlay",
            _ => "UI",
        }
    }
}

impl From<u32> for PassPriority {
    fn from(value: u32) -> Self {
        Self(value)
    }
}
