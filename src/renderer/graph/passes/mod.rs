//! Render passes
//!
//! The built-in passes of [`ForwardPipeline`](super::ForwardPipeline), in
//! priority order: shadow map, depth pre-pass, sky, opaque geometry, contact
//! shadows and the editor overlay.

mod contact_shadow;
mod depth_draw;
mod opaque;
mod overlay;
mod prepass;
mod shadow;
mod sky;

pub use contact_shadow::{CONTACT_SHADOW_FORMAT, ContactShadowPass, ContactUniforms, MAX_STEPS};
pub use depth_draw::{DepthDrawer, DepthFrameUniforms, DepthView};
pub use opaque::{FrameUniforms, OpaquePass};
pub use overlay::{OverlayPass, OverlayUniforms, OverlayVertex, overlay_lines};
pub use prepass::DepthPrepass;
pub use shadow::ShadowPass;
pub use sky::{SkyPass, SkyUniforms};

/// Every pass template with each variant of the variables it is built with.
#[cfg(test)]
pub(crate) fn template_contexts() -> Vec<(&'static str, minijinja::Value)> {
    use crate::renderer::atmosphere;

    let empty = || minijinja::context! {};
    vec![
        ("passes/blit", empty()),
        ("passes/contact_composite", empty()),
        ("passes/contact_shadow", minijinja::context! { MAX_STEPS => MAX_STEPS }),
        ("passes/depth_mesh", empty()),
        ("passes/depth_terrain", empty()),
        ("passes/mesh", empty()),
        ("passes/normals", empty()),
        ("passes/overlay", empty()),
        ("passes/sky", atmosphere::template_context(false)),
        ("passes/sky", atmosphere::template_context(true)),
        ("passes/terrain", empty()),
    ]
}
