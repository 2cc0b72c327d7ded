//! Shadow Utilities
//!
//! Pure math for the directional shadow map, kept out of the pass for
//! reuse and testability.

use glam::{Mat4, Vec3};

/// Distance from the coverage center to the light camera, in half-extents.
const EYE_DISTANCE: f32 = 2.0;

/// Light-space (orthographic view-projection) matrix of a directional light.
///
/// `direction` points from the scene toward the sun. The frustum is a box of
/// `half_extent` around `center` on the light's image plane, deep enough to
/// contain casters between the center and the light.
#[must_use]
pub fn compute_light_space_matrix(direction: Vec3, center: Vec3, half_extent: f32) -> Mat4 {
    let toward_sun = if direction.length_squared() > 1e-6 {
        direction.normalize()
    } else {
        Vec3::Y
    };

    let up = if toward_sun.y.abs() > 0.99 { Vec3::Z } else { Vec3::Y };
    let half_extent = half_extent.max(1e-3);
    let eye = center + toward_sun * (half_extent * EYE_DISTANCE);
    let view = Mat4::look_at_rh(eye, center, up);
    let proj = Mat4::orthographic_rh(
        -half_extent,
        half_extent,
        -half_extent,
        half_extent,
        0.1,
        half_extent * EYE_DISTANCE * 2.0,
    );
    proj * view
}

/// Size of one shadow texel in UV units, used by the PCF kernel.
#[inline]
#[must_use]
pub fn shadow_texel_size(resolution: u32) -> f32 {
    1.0 / resolution.max(1) as f32
}
