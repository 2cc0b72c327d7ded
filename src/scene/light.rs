use glam::Vec3;

/// Lighting parameters supplied by the lighting manager.
///
/// Exactly one of the two modes is active; every pass that depends on the
/// light type matches on this enum exhaustively.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneLightingParams {
    /// Sun light with shadows and the atmospheric sky.
    Directional(DirectionalLightParams),
    /// Image-based environment lighting with an HDR background.
    Hdr(HdrLightParams),
}

impl Default for SceneLightingParams {
    fn default() -> Self {
        Self::Directional(DirectionalLightParams::default())
    }
}

impl SceneLightingParams {
    #[must_use]
    pub fn directional(&self) -> Option<&DirectionalLightParams> {
        match self {
            Self::Directional(light) => Some(light),
            Self::Hdr(_) => None,
        }
    }

    #[must_use]
    pub fn is_directional(&self) -> bool {
        matches!(self, Self::Directional(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DirectionalLightParams {
    /// Unit vector pointing from the scene toward the sun.
    pub direction: Vec3,
    /// Light color already multiplied by intensity.
    pub effective_color: Vec3,
    pub ambient: f32,
    pub casts_shadow: bool,
    pub shadow_enabled: bool,
    /// Sun elevation in degrees, when the light was built from angles.
    pub elevation: Option<f32>,
    /// Radiance scale of the atmospheric sky.
    pub sun_intensity: f32,
}

/// Default sun radiance used by the atmosphere model.
pub const DEFAULT_SUN_INTENSITY: f32 = 20.0;

impl Default for DirectionalLightParams {
    fn default() -> Self {
        Self::from_angles(45.0, 180.0)
    }
}

impl DirectionalLightParams {
    /// Builds a sun light from elevation above the horizon and azimuth around
    /// +Y (0° = +Z, 90° = +X), both in degrees.
    #[must_use]
    pub fn from_angles(elevation: f32, azimuth: f32) -> Self {
        Self {
            direction: sun_direction(elevation, azimuth),
            effective_color: Vec3::ONE,
            ambient: 0.25,
            casts_shadow: true,
            shadow_enabled: true,
            elevation: Some(elevation),
            sun_intensity: DEFAULT_SUN_INTENSITY,
        }
    }

    #[must_use]
    pub fn with_color(mut self, color: Vec3, intensity: f32) -> Self {
        self.effective_color = color * intensity;
        self
    }

    /// Whether this light should produce a shadow map this frame.
    #[must_use]
    pub fn wants_shadow(&self) -> bool {
        self.casts_shadow && self.shadow_enabled
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HdrLightParams {
    pub exposure: f32,
    pub ambient: f32,
}

impl Default for HdrLightParams {
    fn default() -> Self {
        Self {
            exposure: 1.0,
            ambient: 1.0,
        }
    }
}

/// Unit vector toward the sun for the given elevation / azimuth in degrees.
#[must_use]
pub fn sun_direction(elevation: f32, azimuth: f32) -> Vec3 {
    let (el, az) = (elevation.to_radians(), azimuth.to_radians());
    Vec3::new(el.cos() * az.sin(), el.sin(), el.cos() * az.cos()).normalize()
}
