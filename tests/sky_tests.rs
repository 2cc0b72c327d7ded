//! Sky Model Tests
//!
//! Tests for the CPU evaluation of the directional-mode sky:
//! - Ground classification below the horizon threshold
//! - Brightness toward the sun and the sun disk
//! - Extended Reinhard tone mapping
//! - Sun color normalization across elevations

use glam::Vec3;

use verdant::renderer::Atmosphere;
use verdant::renderer::atmosphere::{GROUND_THRESHOLD, reinhard_extended, sun_transmittance};

const INTENSITY: f32 = 22.0;

fn sun_at(elevation_deg: f32) -> Vec3 {
    let e = elevation_deg.to_radians();
    Vec3::new(e.cos(), e.sin(), 0.0)
}

fn luminance(c: Vec3) -> f32 {
    c.dot(Vec3::new(0.2126, 0.7152, 0.0722))
}

// ============================================================================
// Ground / sky split
// ============================================================================

#[test]
fn ground_starts_just_below_the_horizon() {
    assert!(!Atmosphere::is_ground(Vec3::X));
    assert!(!Atmosphere::is_ground(Vec3::new(1.0, GROUND_THRESHOLD * 0.5, 0.0).normalize()));
    assert!(Atmosphere::is_ground(Vec3::new(0.0, -1.0, 0.0)));
    assert!(Atmosphere::is_ground(Vec3::new(1.0, GROUND_THRESHOLD * 2.0, 0.0).normalize()));
}

#[test]
fn ground_darkens_at_night() {
    let down = Vec3::new(0.0, -0.8, 1.0);
    let noon = Atmosphere::sky_radiance(down, sun_at(60.0), INTENSITY);
    let night = Atmosphere::sky_radiance(down, sun_at(-30.0), INTENSITY);
    assert!(luminance(night) < luminance(noon), "night {night:?} vs noon {noon:?}");
}

// ============================================================================
// Sun
// ============================================================================

#[test]
fn sky_brightens_toward_the_sun() {
    let sun = sun_at(20.0);
    let toward = Atmosphere::sky_radiance(sun_at(35.0), sun, INTENSITY);
    let away = Atmosphere::sky_radiance(Vec3::new(-1.0, 0.6, 0.0).normalize(), sun, INTENSITY);
    assert!(luminance(toward) > luminance(away));
}

#[test]
fn sun_disk_outshines_its_surroundings() {
    let sun = sun_at(30.0);
    let disk = Atmosphere::sky_radiance(sun, sun, INTENSITY);
    let near = Atmosphere::sky_radiance(sun_at(33.0), sun, INTENSITY);
    assert!(luminance(disk) > 2.0 * luminance(near));
}

#[test]
fn sunset_sky_is_warm_and_noon_sky_is_blue() {
    let noon = Atmosphere::sky_radiance(Vec3::Y, sun_at(80.0), INTENSITY);
    assert!(noon.z > noon.x, "noon zenith {noon:?} should be blue");

    let sunset_sun = Atmosphere::sun_color(sun_at(2.0));
    assert!(sunset_sun.x > sunset_sun.z, "low sun {sunset_sun:?} should be red-shifted");
}

#[test]
fn sun_color_is_normalized() {
    for elevation in [5.0, 30.0, 75.0] {
        let c = Atmosphere::sun_color(sun_at(elevation));
        assert!((c.max_element() - 1.0).abs() < 1e-5, "elevation {elevation}: {c:?}");
        assert!(c.min_element() >= 0.0);
    }
}

#[test]
fn sun_below_the_planet_is_black() {
    assert_eq!(sun_transmittance(sun_at(-30.0)), Vec3::ZERO);
    assert_eq!(Atmosphere::sun_color(sun_at(-30.0)), Vec3::ZERO);
}

// ============================================================================
// Tone mapping
// ============================================================================

#[test]
fn reinhard_is_monotonic_and_bounded_by_white_point() {
    let mut previous = 0.0;
    for step in 0..=40 {
        let x = step as f32 * 0.1;
        let y = reinhard_extended(Vec3::splat(x), 4.0).x;
        assert!(y >= previous, "not monotonic at {x}");
        assert!(y <= 1.0 + 1e-5);
        previous = y;
    }
    assert!(reinhard_extended(Vec3::ZERO, 4.0).abs_diff_eq(Vec3::ZERO, 1e-6));
}

#[test]
fn sky_color_stays_in_unit_range() {
    let sun = sun_at(10.0);
    for dir in [sun, Vec3::Y, Vec3::NEG_Y, Vec3::new(-1.0, 0.05, 0.3).normalize()] {
        let c = Atmosphere::sky_color(dir, sun, INTENSITY, 4.0);
        assert!(c.min_element() >= 0.0 && c.max_element() <= 1.0, "{dir:?} -> {c:?}");
    }
}
