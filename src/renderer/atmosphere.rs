//! Single-scattering atmosphere
//!
//! Physical constants shared by the sky shader (injected as template
//! variables) and a CPU evaluation of the same model. The CPU path backs
//! the sky tests and lets hosts derive a sun color that matches the sky.

use glam::Vec3;
use minijinja::Value;

use crate::renderer::pipeline::wgsl_f32;

pub const PLANET_RADIUS: f32 = 6_371e3;
pub const ATMOSPHERE_RADIUS: f32 = 6_471e3;
/// Fixed observer height above the surface.
pub const CAMERA_HEIGHT: f32 = 1e3;
pub const BETA_RAYLEIGH: Vec3 = Vec3::new(5.5e-6, 13.0e-6, 22.4e-6);
pub const BETA_MIE: f32 = 21e-6;
/// Mie extinction is scattering plus absorption.
pub const MIE_EXTINCTION: f32 = 1.1;
pub const SCALE_HEIGHT_RAYLEIGH: f32 = 8e3;
pub const SCALE_HEIGHT_MIE: f32 = 1.2e3;
pub const MIE_G: f32 = 0.758;
pub const VIEW_SAMPLES: u32 = 16;
pub const SUN_SAMPLES: u32 = 8;
/// View directions with `y` below this are shaded as ground.
pub const GROUND_THRESHOLD: f32 = -0.02;
pub const SUN_DISK_INNER: f32 = 0.9995;
pub const SUN_DISK_OUTER: f32 = 0.9999;
pub const SUN_GLOW_EXPONENT: f32 = 64.0;
pub const DEFAULT_WHITE_POINT: f32 = 4.0;

const GROUND_COLOR: Vec3 = Vec3::new(0.28, 0.25, 0.2);
const SUNSET_TINT: Vec3 = Vec3::new(0.9, 0.45, 0.2);
const AMBIENT_TINT: Vec3 = Vec3::new(0.35, 0.45, 0.6);

/// Template variables for `passes/sky`.
#[must_use]
pub fn template_context(hdr: bool) -> Value {
    minijinja::context! {
        HDR => hdr,
        PLANET_RADIUS => wgsl_f32(PLANET_RADIUS),
        ATMOSPHERE_RADIUS => wgsl_f32(ATMOSPHERE_RADIUS),
        CAMERA_HEIGHT => wgsl_f32(CAMERA_HEIGHT),
        BETA_RAYLEIGH_R => wgsl_f32(BETA_RAYLEIGH.x),
        BETA_RAYLEIGH_G => wgsl_f32(BETA_RAYLEIGH.y),
        BETA_RAYLEIGH_B => wgsl_f32(BETA_RAYLEIGH.z),
        BETA_MIE => wgsl_f32(BETA_MIE),
        MIE_EXTINCTION => wgsl_f32(MIE_EXTINCTION),
        SCALE_HEIGHT_RAYLEIGH => wgsl_f32(SCALE_HEIGHT_RAYLEIGH),
        SCALE_HEIGHT_MIE => wgsl_f32(SCALE_HEIGHT_MIE),
        MIE_G => wgsl_f32(MIE_G),
        VIEW_SAMPLES => VIEW_SAMPLES,
        SUN_SAMPLES => SUN_SAMPLES,
        GROUND_THRESHOLD => wgsl_f32(GROUND_THRESHOLD),
        SUN_DISK_INNER => wgsl_f32(SUN_DISK_INNER),
        SUN_DISK_OUTER => wgsl_f32(SUN_DISK_OUTER),
        SUN_GLOW_EXPONENT => wgsl_f32(SUN_GLOW_EXPONENT),
    }
}

fn sphere_exit(origin: Vec3, dir: Vec3, radius: f32) -> Option<f32> {
    let b = origin.dot(dir);
    let c = origin.length_squared() - radius * radius;
    let disc = b * b - c;
    (disc >= 0.0).then(|| -b + disc.sqrt())
}

fn hits_planet(origin: Vec3, dir: Vec3) -> bool {
    let b = origin.dot(dir);
    let c = origin.length_squared() - PLANET_RADIUS * PLANET_RADIUS;
    let disc = b * b - c;
    disc >= 0.0 && -b - disc.sqrt() > 0.0
}

fn rayleigh_phase(mu: f32) -> f32 {
    3.0 / (16.0 * std::f32::consts::PI) * (1.0 + mu * mu)
}

fn mie_phase(mu: f32) -> f32 {
    let g2 = MIE_G * MIE_G;
    let denom = (2.0 + g2) * (1.0 + g2 - 2.0 * MIE_G * mu).powf(1.5);
    3.0 / (8.0 * std::f32::consts::PI) * (1.0 - g2) * (1.0 + mu * mu) / denom
}

fn density(p: Vec3) -> (f32, f32) {
    let h = p.length() - PLANET_RADIUS;
    ((-h / SCALE_HEIGHT_RAYLEIGH).exp(), (-h / SCALE_HEIGHT_MIE).exp())
}

fn optical_depth_to_sun(p: Vec3, sun_dir: Vec3) -> (f32, f32) {
    let t = sphere_exit(p, sun_dir, ATMOSPHERE_RADIUS).unwrap_or(0.0).max(0.0);
    let ds = t / SUN_SAMPLES as f32;
    (0..SUN_SAMPLES).fold((0.0, 0.0), |(r, m), j| {
        let (dr, dm) = density(p + sun_dir * ((j as f32 + 0.5) * ds));
        (r + dr * ds, m + dm * ds)
    })
}

fn extinction(rayleigh_depth: f32, mie_depth: f32) -> Vec3 {
    let tau = BETA_RAYLEIGH * rayleigh_depth + Vec3::splat(BETA_MIE * MIE_EXTINCTION * mie_depth);
    Vec3::new((-tau.x).exp(), (-tau.y).exp(), (-tau.z).exp())
}

fn observer() -> Vec3 {
    Vec3::new(0.0, PLANET_RADIUS + CAMERA_HEIGHT, 0.0)
}

/// In-scattered radiance along `dir` (both directions unit length).
#[must_use]
pub fn scattering(dir: Vec3, sun_dir: Vec3, intensity: f32) -> Vec3 {
    let origin = observer();
    let t_max = sphere_exit(origin, dir, ATMOSPHERE_RADIUS).unwrap_or(0.0).max(0.0);
    let ds = t_max / VIEW_SAMPLES as f32;

    let mut rayleigh = Vec3::ZERO;
    let mut mie = Vec3::ZERO;
    let (mut view_r, mut view_m) = (0.0, 0.0);
    for i in 0..VIEW_SAMPLES {
        let p = origin + dir * ((i as f32 + 0.5) * ds);
        let (dr, dm) = density(p);
        view_r += dr * ds;
        view_m += dm * ds;
        if hits_planet(p, sun_dir) {
            continue;
        }
        let (sun_r, sun_m) = optical_depth_to_sun(p, sun_dir);
        let attenuation = extinction(view_r + sun_r, view_m + sun_m);
        rayleigh += attenuation * dr * ds;
        mie += attenuation * dm * ds;
    }

    let mu = dir.dot(sun_dir);
    intensity * (rayleigh * BETA_RAYLEIGH * rayleigh_phase(mu) + mie * BETA_MIE * mie_phase(mu))
}

/// Fraction of sunlight reaching the observer, per channel.
#[must_use]
pub fn sun_transmittance(sun_dir: Vec3) -> Vec3 {
    let origin = observer();
    if hits_planet(origin, sun_dir) {
        return Vec3::ZERO;
    }
    let (r, m) = optical_depth_to_sun(origin, sun_dir);
    extinction(r, m)
}

fn ground_radiance(dir: Vec3, sun_dir: Vec3, intensity: f32) -> Vec3 {
    let day = (sun_dir.y * 2.0 + 0.1).clamp(0.0, 1.0);
    let sunset = (1.0 - sun_dir.y.abs() * 4.0).clamp(0.0, 1.0);
    let mut albedo = GROUND_COLOR * (0.15 + 0.85 * day);
    albedo = albedo.lerp(albedo * SUNSET_TINT * 1.6, sunset * 0.5);
    albedo += AMBIENT_TINT * 0.08 * day;
    let surface = albedo * intensity * 0.08;

    let horizontal = Vec3::new(dir.x, 0.0, dir.z).try_normalize().unwrap_or(Vec3::X);
    let horizon = scattering(horizontal, sun_dir, intensity);
    surface.lerp(horizon, (dir.y * 12.0).exp())
}

fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// CPU evaluation of the directional-mode sky, before tone mapping.
#[derive(Debug, Clone, Copy)]
pub struct Atmosphere;

impl Atmosphere {
    #[must_use]
    pub fn is_ground(view_dir: Vec3) -> bool {
        view_dir.y < GROUND_THRESHOLD
    }

    /// Linear radiance of the pixel looking along `view_dir`.
    #[must_use]
    pub fn sky_radiance(view_dir: Vec3, sun_dir: Vec3, intensity: f32) -> Vec3 {
        let dir = view_dir.normalize();
        let sun = sun_dir.normalize();
        if Self::is_ground(dir) {
            return ground_radiance(dir, sun, intensity);
        }
        let cos_theta = dir.dot(sun);
        let disk = smoothstep(SUN_DISK_INNER, SUN_DISK_OUTER, cos_theta);
        let glow = cos_theta.max(0.0).powf(SUN_GLOW_EXPONENT);
        scattering(dir, sun, intensity) + sun_transmittance(sun) * intensity * (disk + glow * 0.02)
    }

    /// Sky pixel as written to the target (extended Reinhard, clamped).
    #[must_use]
    pub fn sky_color(view_dir: Vec3, sun_dir: Vec3, intensity: f32, white_point: f32) -> Vec3 {
        reinhard_extended(Self::sky_radiance(view_dir, sun_dir, intensity), white_point).clamp(Vec3::ZERO, Vec3::ONE)
    }

    /// Color of direct sunlight at the observer, normalized to max channel 1.
    #[must_use]
    pub fn sun_color(sun_dir: Vec3) -> Vec3 {
        let t = sun_transmittance(sun_dir.normalize());
        let peak = t.max_element();
        if peak > 0.0 { t / peak } else { Vec3::ZERO }
    }
}

#[must_use]
pub fn reinhard_extended(c: Vec3, white_point: f32) -> Vec3 {
    let w2 = (white_point * white_point).max(1e-4);
    c * (Vec3::ONE + c / w2) / (Vec3::ONE + c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_functions_are_normalized_at_right_angle() {
        assert!((rayleigh_phase(0.0) - 3.0 / (16.0 * std::f32::consts::PI)).abs() < 1e-6);
        assert!(mie_phase(1.0) > mie_phase(0.0));
    }

    #[test]
    fn observer_sits_inside_the_atmosphere() {
        let up = sphere_exit(observer(), Vec3::Y, ATMOSPHERE_RADIUS).unwrap();
        assert!((up - (ATMOSPHERE_RADIUS - PLANET_RADIUS - CAMERA_HEIGHT)).abs() < 1.0);
        assert!(hits_planet(observer(), -Vec3::Y));
        assert!(!hits_planet(observer(), Vec3::Y));
    }

    #[test]
    fn white_point_maps_to_one() {
        let c = reinhard_extended(Vec3::splat(4.0), 4.0);
        assert!((c.x - 1.0).abs() < 1e-5);
    }
}
