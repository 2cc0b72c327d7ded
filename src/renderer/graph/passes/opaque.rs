use std::ops::Range;
use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3, Vec4};

use crate::renderer::core::{DynamicUniforms, GpuContext, UniformBuffer};
use crate::renderer::graph::shadow_utils::shadow_texel_size;
use crate::renderer::graph::{ClearValues, FrameEncoder, PassPriority, PassResult, RenderContext, RenderPass};
use crate::renderer::mesh::{
    DrawFlags, GpuMesh, MeshDraw, MeshRenderer, ObjectUniforms, StandardMeshRenderer, TerrainBlendParams,
};
use crate::scene::{RenderObject, SceneLightingParams};
use crate::terrain::{ClipmapRenderer, TerrainShading};
use crate::utils::PassTimer;

/// Group 0 uniforms of lit draws. Mirrors `FrameUniforms` in `chunks/frame.wgsl`.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct FrameUniforms {
    pub view_projection: Mat4,
    pub view: Mat4,
    pub light_space: Mat4,
    /// Camera position, accumulated time.
    pub camera_position: Vec4,
    /// Direction toward the sun, ambient.
    pub light_direction: Vec4,
    /// Effective sun color, 1 for directional lighting.
    pub light_color: Vec4,
    pub wind_motion: Vec4,
    pub wind_state: Vec4,
    /// Shadow map bound, shadow texel size, HDR exposure, HDR texture bound.
    pub shading: Vec4,
    /// Viewport size, near, far.
    pub screen: Vec4,
    /// Terrain depth bound.
    pub blend: Vec4,
}

impl FrameUniforms {
    #[must_use]
    pub fn from_context(ctx: &RenderContext) -> Self {
        let flag = |b: bool| if b { 1.0 } else { 0.0 };
        let camera = &ctx.camera;
        let textures = &ctx.textures;

        let (light_direction, light_color, exposure) = match &ctx.lighting {
            SceneLightingParams::Directional(light) => (
                light.direction.normalize_or(Vec3::Y).extend(light.ambient),
                light.effective_color.extend(1.0),
                1.0,
            ),
            SceneLightingParams::Hdr(hdr) => (Vec3::Y.extend(hdr.ambient), Vec4::new(1.0, 1.0, 1.0, 0.0), hdr.exposure),
        };
        let (wind_motion, wind_state) = ctx.wind.uniform_vectors();
        let shadow_bound = textures.shadow_map.is_some() && textures.light_space_matrix.is_some();

        Self {
            view_projection: camera.view_projection,
            view: camera.view,
            light_space: textures.light_space_matrix.unwrap_or(Mat4::IDENTITY),
            camera_position: camera.position.extend(ctx.time),
            light_direction,
            light_color,
            wind_motion,
            wind_state,
            shading: Vec4::new(
                flag(shadow_bound),
                shadow_texel_size(ctx.settings.shadow_resolution),
                exposure,
                flag(textures.hdr.is_some()),
            ),
            screen: Vec4::new(ctx.width as f32, ctx.height as f32, camera.near, camera.far),
            blend: Vec4::new(flag(textures.terrain_depth.is_some()), 0.0, 0.0, 0.0),
        }
    }
}

/// One object's staged mesh draw.
struct MeshItem<'a> {
    renderer: &'a dyn MeshRenderer,
    meshes: &'a [Arc<GpuMesh>],
    offsets: Range<usize>,
    blend: Option<TerrainBlendParams>,
    show_normals: bool,
}

/// Shades meshes and terrain onto the frame target.
pub struct OpaquePass {
    enabled: bool,
    frame_uniforms: UniformBuffer<FrameUniforms>,
    /// Keyed by the ids of the shadow, HDR and terrain depth views bound in it.
    frame_group: Option<([u64; 3], wgpu::BindGroup)>,
    objects: DynamicUniforms<ObjectUniforms>,
    offsets: Vec<u32>,
    clipmap: ClipmapRenderer,
    baked_terrain: StandardMeshRenderer,
}

impl OpaquePass {
    pub const NAME: &'static str = "Opaque";

    #[must_use]
    pub fn new(gpu: &GpuContext) -> Self {
        Self {
            enabled: true,
            frame_uniforms: UniformBuffer::new(&gpu.device, "Frame Uniforms"),
            frame_group: None,
            objects: DynamicUniforms::new(&gpu.device, &gpu.layouts.object, "Object Uniforms"),
            offsets: Vec::new(),
            clipmap: ClipmapRenderer::new(gpu, "Clipmap Terrain", TerrainShading::Lit),
            baked_terrain: StandardMeshRenderer::new(gpu),
        }
    }

    fn frame_bind_group(&mut self, gpu: &GpuContext, frame: &mut FrameEncoder, ctx: &RenderContext) -> wgpu::BindGroup {
        let fallback = &gpu.fallback;
        let shadow = ctx.textures.shadow_map.as_ref().unwrap_or(&fallback.depth);
        let hdr = ctx.textures.hdr.as_ref().unwrap_or(&fallback.hdr);
        let depth = ctx.textures.terrain_depth.as_ref().unwrap_or(&fallback.depth);

        for texture in [&ctx.textures.shadow_map, &ctx.textures.hdr, &ctx.textures.terrain_depth]
            .into_iter()
            .flatten()
        {
            frame.use_texture(texture);
        }

        let key = [shadow.id(), hdr.id(), depth.id()];
        if let Some((cached, group)) = &self.frame_group
            && *cached == key
        {
            return group.clone();
        }

        log::debug!("{}: rebuilding frame bind group {key:?}", Self::NAME);
        let group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Frame Bind Group"),
            layout: &gpu.layouts.frame,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.frame_uniforms.buffer().as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(shadow),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&fallback.shadow_sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(hdr),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: wgpu::BindingResource::Sampler(&fallback.linear_sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 5,
                    resource: wgpu::BindingResource::TextureView(depth),
                },
            ],
        });
        self.frame_group = Some((key, group.clone()));
        group
    }

    fn object_uniforms(
        object: &RenderObject,
        base_color: Vec4,
        wireframe: bool,
        blend: Option<TerrainBlendParams>,
    ) -> ObjectUniforms {
        let mut uniforms = ObjectUniforms::new(object.model_matrix, base_color);
        let mut flags = DrawFlags::empty();
        flags.set(DrawFlags::SELECTED, object.selected);
        flags.set(DrawFlags::WIREFRAME, wireframe);
        if let Some(wind) = object.active_wind() {
            flags |= DrawFlags::WIND;
            uniforms.wind = wind.uniform_vector();
        }
        if let Some(blend) = blend {
            flags |= DrawFlags::TERRAIN_BLEND;
            uniforms.blend_distance = blend.distance;
        }
        uniforms.flags = flags.bits();
        uniforms
    }
}

impl RenderPass for OpaquePass {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn priority(&self) -> PassPriority {
        PassPriority::OPAQUE
    }

    fn enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn execute(
        &mut self,
        gpu: &GpuContext,
        frame: &mut FrameEncoder,
        ctx: &mut RenderContext,
        objects: &[RenderObject],
    ) -> Option<PassResult> {
        let timer = PassTimer::start();

        self.frame_uniforms.write(&gpu.queue, &FrameUniforms::from_context(ctx));
        let frame_group = self.frame_bind_group(gpu, frame, ctx);

        self.objects.clear();
        self.offsets.clear();
        self.clipmap.begin_frame();

        let wireframe = ctx.settings.wireframe_mode;
        let depth_bound = ctx.textures.terrain_depth.is_some();
        let mut opaque_items: Vec<MeshItem<'_>> = Vec::new();
        let mut blend_items: Vec<MeshItem<'_>> = Vec::new();

        for object in objects {
            if let Some(terrain) = &object.terrain {
                if terrain.use_clipmap {
                    self.clipmap
                        .queue(gpu, terrain, object.model_matrix, ctx.camera.position, ctx.camera.far, object.selected);
                } else if let Some(baked) = &terrain.baked_mesh {
                    let start = self.offsets.len();
                    let uniforms = Self::object_uniforms(object, terrain.base_color, wireframe, None);
                    self.offsets.push(self.objects.push(&uniforms));
                    opaque_items.push(MeshItem {
                        renderer: &self.baked_terrain,
                        meshes: std::slice::from_ref(baked),
                        offsets: start..self.offsets.len(),
                        blend: None,
                        show_normals: object.show_normals,
                    });
                }
                continue;
            }

            let Some(renderer) = object.renderer.as_deref() else {
                continue;
            };
            if object.gpu_meshes.is_empty() {
                continue;
            }

            let blend = object
                .terrain_blend
                .filter(|b| b.enabled && depth_bound)
                .map(|b| TerrainBlendParams {
                    distance: b.blend_distance,
                    screen_size: ctx.viewport(),
                    near: ctx.camera.near,
                    far: ctx.camera.far,
                });

            let start = self.offsets.len();
            for mesh in &object.gpu_meshes {
                let uniforms = Self::object_uniforms(object, mesh.base_color, wireframe, blend);
                self.offsets.push(self.objects.push(&uniforms));
            }
            let item = MeshItem {
                renderer,
                meshes: &object.gpu_meshes,
                offsets: start..self.offsets.len(),
                blend,
                show_normals: object.show_normals,
            };
            if blend.is_some() {
                blend_items.push(item);
            } else {
                opaque_items.push(item);
            }
        }

        self.objects.upload(&gpu.device, &gpu.queue);
        self.clipmap.upload(gpu);

        let mut pass = frame.begin_pass("Opaque Pass", ClearValues::LOAD)?;
        pass.set_bind_group(0, &frame_group, &[]);
        let terrains = self.clipmap.record(&mut pass);

        let object_group = self.objects.bind_group();
        let mut drawn_objects = 0;
        let mut normals_drawn = 0;
        for item in opaque_items.iter().chain(&blend_items) {
            pass.set_bind_group(0, &frame_group, &[]);
            let draw = MeshDraw {
                meshes: item.meshes,
                object_bind_group: object_group,
                offsets: &self.offsets[item.offsets.clone()],
                wireframe,
                blend: item.blend,
            };
            if item.renderer.draw(&mut pass, &draw) > 0 {
                drawn_objects += 1;
            }
            if item.show_normals && item.renderer.draw_normals(&mut pass, &draw) > 0 {
                normals_drawn += 1;
            }
        }
        drop(pass);

        let result = PassResult::new(Self::NAME, drawn_objects + terrains, timer.elapsed_ms());
        let mut notes = Vec::new();
        if !blend_items.is_empty() {
            notes.push(format!("{} terrain-blended", blend_items.len()));
        }
        if normals_drawn > 0 {
            notes.push(format!("{normals_drawn} with normals"));
        }
        if wireframe {
            notes.push("wireframe".to_string());
        }
        Some(if notes.is_empty() { result } else { result.with_note(notes.join(", ")) })
    }

    fn destroy(&mut self) {
        self.frame_uniforms.destroy();
        self.objects.destroy();
        self.clipmap.destroy();
        self.frame_group = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::graph::TextureSlots;
    use crate::scene::{DirectionalLightParams, HdrLightParams};

    #[test]
    fn frame_uniforms_match_wgsl_layout() {
        assert_eq!(std::mem::size_of::<FrameUniforms>(), 320);
    }

    #[test]
    fn flags_follow_bound_textures() {
        let mut ctx = RenderContext::new(640, 480);
        ctx.lighting = SceneLightingParams::Directional(DirectionalLightParams::from_angles(45.0, 180.0));
        let u = FrameUniforms::from_context(&ctx);
        assert_eq!(u.shading.x, 0.0);
        assert_eq!(u.shading.w, 0.0);
        assert_eq!(u.blend.x, 0.0);
        assert_eq!(u.light_color.w, 1.0);
        assert_eq!(u.screen.x, 640.0);

        ctx.lighting = SceneLightingParams::Hdr(HdrLightParams {
            exposure: 2.0,
            ambient: 0.5,
        });
        ctx.textures = TextureSlots {
            light_space_matrix: Some(Mat4::IDENTITY),
            ..Default::default()
        };
        let u = FrameUniforms::from_context(&ctx);
        // A matrix without a shadow texture does not enable shadowing.
        assert_eq!(u.shading.x, 0.0);
        assert_eq!(u.shading.z, 2.0);
        assert_eq!(u.light_color.w, 0.0);
        assert_eq!(u.light_direction.w, 0.5);
    }
}
