//! Wind
//!
//! Global wind state from the wind simulation plus the per-object response
//! settings. [`wind_displacement`] is mirrored line for line by the WGSL
//! `wind` chunk so CPU tests describe what the GPU does.

use glam::{Vec2, Vec3, Vec4};

/// Per-frame wind state supplied by the wind simulation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindParams {
    pub enabled: bool,
    /// Simulation time in seconds.
    pub time: f32,
    pub strength: f32,
    /// Horizontal direction on the XZ plane; need not be normalized.
    pub direction: Vec2,
    /// Amount of high-frequency flutter mixed into the sway, `[0, 1]`.
    pub turbulence: f32,
    pub gust_strength: f32,
    /// Tints displaced vertices by their sway amount.
    pub debug: bool,
}

impl Default for WindParams {
    fn default() -> Self {
        Self {
            enabled: false,
            time: 0.0,
            strength: 0.0,
            direction: Vec2::X,
            turbulence: 0.0,
            gust_strength: 0.0,
            debug: false,
        }
    }
}

impl WindParams {
    /// `(motion, state)` as laid out in the frame uniforms: motion is
    /// direction, strength, turbulence; state is time, gust, enabled, debug.
    #[must_use]
    pub fn uniform_vectors(&self) -> (Vec4, Vec4) {
        let flag = |b: bool| if b { 1.0 } else { 0.0 };
        (
            Vec4::new(self.direction.x, self.direction.y, self.strength, self.turbulence),
            Vec4::new(self.time, self.gust_strength, flag(self.enabled), flag(self.debug)),
        )
    }
}

/// How one object responds to the global wind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindSettings {
    pub enabled: bool,
    pub influence: f32,
    /// Height (local units above the anchor) at which the sway reaches half
    /// its amplitude. Larger values make the object bend less.
    pub stiffness: f32,
    /// Local height below which vertices stay fixed.
    pub anchor_height: f32,
}

impl Default for WindSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            influence: 1.0,
            stiffness: 1.0,
            anchor_height: 0.0,
        }
    }
}

impl WindSettings {
    /// influence, stiffness, anchor height, enabled
    #[must_use]
    pub fn uniform_vector(&self) -> Vec4 {
        Vec4::new(
            self.influence,
            self.stiffness,
            self.anchor_height,
            if self.enabled { 1.0 } else { 0.0 },
        )
    }
}

const SWAY_FREQUENCY: f32 = 1.3;
const FLUTTER_FREQUENCY: f32 = 3.7;
const GUST_FREQUENCY: f32 = 0.35;
const PHASE_SCALE: f32 = 0.5;

/// World-space offset applied to a vertex at `world_pos` whose height above
/// the object's local origin is `local_height`.
///
/// The result is zero at or below `anchor_height` and its length never
/// exceeds `strength * influence * (1 + gust_strength)`.
#[must_use]
pub fn wind_displacement(
    params: &WindParams,
    settings: &WindSettings,
    world_pos: Vec3,
    local_height: f32,
) -> Vec3 {
    if !params.enabled || !settings.enabled {
        return Vec3::ZERO;
    }
    let height = local_height - settings.anchor_height;
    if height <= 0.0 || params.direction.length_squared() < 1e-8 {
        return Vec3::ZERO;
    }

    let dir = params.direction.normalize();
    let bend = height / (height + settings.stiffness.max(1e-3));

    let phase = (world_pos.x * dir.x + world_pos.z * dir.y) * PHASE_SCALE;
    let flutter_mix = params.turbulence.clamp(0.0, 1.0) * 0.5;
    let sway = (params.time * SWAY_FREQUENCY + phase).sin();
    let flutter = (params.time * FLUTTER_FREQUENCY + world_pos.x * 1.1 + world_pos.z * 0.7).sin();
    let base = sway * (1.0 - flutter_mix) + flutter * flutter_mix;

    let gust = params.gust_strength.max(0.0)
        * (0.5 + 0.5 * (params.time * GUST_FREQUENCY + phase * 0.2).sin());

    let amount = params.strength * settings.influence * bend * (base + gust);
    Vec3::new(dir.x, 0.0, dir.y) * amount
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breezy() -> WindParams {
        WindParams {
            enabled: true,
            time: 2.5,
            strength: 0.8,
            direction: Vec2::new(1.0, 1.0),
            turbulence: 0.4,
            gust_strength: 0.5,
            debug: false,
        }
    }

    #[test]
    fn anchored_vertices_do_not_move() {
        let settings = WindSettings {
            anchor_height: 0.5,
            ..Default::default()
        };
        let d = wind_displacement(&breezy(), &settings, Vec3::new(3.0, 0.2, -1.0), 0.4);
        assert_eq!(d, Vec3::ZERO);
    }

    #[test]
    fn displacement_is_bounded_and_horizontal() {
        let params = breezy();
        let settings = WindSettings {
            influence: 0.7,
            ..Default::default()
        };
        let bound = params.strength * settings.influence * (1.0 + params.gust_strength);

        for i in 0..64 {
            let t = i as f32 * 0.37;
            let p = WindParams { time: t, ..params };
            let d = wind_displacement(&p, &settings, Vec3::new(t, 0.0, -t * 0.5), 4.0 + t);
            assert!(d.length() <= bound + 1e-5, "{d:?} exceeds {bound}");
            assert_eq!(d.y, 0.0);
        }
    }

    #[test]
    fn disabled_wind_is_zero() {
        let params = WindParams {
            enabled: false,
            ..breezy()
        };
        let d = wind_displacement(&params, &WindSettings::default(), Vec3::ONE, 5.0);
        assert_eq!(d, Vec3::ZERO);
    }
}
