//! Forward Pipeline Tests
//!
//! Tests for:
//! - Pass ordering by priority and pass management
//! - Frame scenarios: directional light with one mesh, HDR light without objects
//! - Shadow slots cleared when shadows are disabled
//! - Depth pre-pass: terrain-blend targets, depth slots cleared when skipped
//! - Terrain (clipmap and baked) through shadow, pre-pass and opaque
//! - Wind, wireframe and normals modes
//! - Compositing: contact shadows, pass-through copy without depth
//! - Resize stability

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use glam::{Mat4, Vec2, Vec3, Vec4};
use parking_lot::Mutex;

use verdant::renderer::core::{Heightmap, upload_hdr_texture};
use verdant::renderer::graph::passes::{
    ContactShadowPass, DepthPrepass, OpaquePass, OverlayPass, ShadowPass, SkyPass,
};
use verdant::renderer::graph::{FrameEncoder, TargetKind};
use verdant::renderer::{
    ForwardPipeline, GpuContext, GpuMesh, PassPriority, PassResult, RenderContext, RenderPass, SettingsPatch,
    StandardMeshRenderer, TextureSlot,
};
use verdant::resources::create_box;
use verdant::scene::{
    CameraState, DirectionalLightParams, HdrLightParams, PerspectiveCamera, RenderObject, SceneLightingParams,
    TerrainBlendSettings, WindParams, WindSettings, wind_displacement,
};
use verdant::terrain::{ClipmapConfig, ClipmapGeometry, TerrainDescriptor};
use verdant::utils::init_logging;

const SIZE: u32 = 64;
const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

// ============================================================================
// Helpers
// ============================================================================

fn headless() -> Option<Arc<GpuContext>> {
    let _ = init_logging(log::Level::Debug);
    match pollster::block_on(GpuContext::headless(FORMAT)) {
        Ok(gpu) => Some(Arc::new(gpu)),
        Err(e) => {
            eprintln!("skipping GPU test: {e}");
            None
        }
    }
}

fn host_target(gpu: &GpuContext) -> (wgpu::Texture, wgpu::TextureView) {
    let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Test Host Target"),
        size: wgpu::Extent3d {
            width: SIZE,
            height: SIZE,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    (texture, view)
}

/// Reads an `SIZE`x`SIZE` texture with 4-byte texels back to the CPU.
fn read_texture(gpu: &GpuContext, texture: &wgpu::Texture, aspect: wgpu::TextureAspect) -> Vec<u8> {
    let bytes_per_row = SIZE * 4;
    let buffer = gpu.device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Readback"),
        size: u64::from(bytes_per_row * SIZE),
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mut encoder = gpu
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("Readback") });
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &buffer,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(bytes_per_row),
                rows_per_image: Some(SIZE),
            },
        },
        texture.size(),
    );
    gpu.queue.submit(std::iter::once(encoder.finish()));

    let slice = buffer.slice(..);
    slice.map_async(wgpu::MapMode::Read, |_| {});
    let _ = gpu.device.poll(wgpu::PollType::wait_indefinitely());
    let bytes = slice.get_mapped_range().to_vec();
    buffer.unmap();
    bytes
}

fn read_pixels(gpu: &GpuContext, texture: &wgpu::Texture) -> Vec<u8> {
    read_texture(gpu, texture, wgpu::TextureAspect::All)
}

/// Depth value at the centre texel of a Depth32Float target.
fn center_depth(gpu: &GpuContext, texture: &wgpu::Texture) -> f32 {
    let bytes = read_texture(gpu, texture, wgpu::TextureAspect::DepthOnly);
    let at = ((SIZE / 2 * SIZE + SIZE / 2) * 4) as usize;
    f32::from_le_bytes(bytes[at..at + 4].try_into().expect("4 bytes"))
}

fn camera() -> PerspectiveCamera {
    PerspectiveCamera::new(60.0, 1.0, 0.1, 200.0).looking_at(Vec3::new(0.0, 4.0, 8.0), Vec3::ZERO)
}

fn sun() -> SceneLightingParams {
    SceneLightingParams::Directional(DirectionalLightParams::from_angles(45.0, 180.0))
}

fn cube(gpu: &GpuContext) -> RenderObject {
    let mesh = Arc::new(GpuMesh::from_data(
        gpu,
        "Test Cube",
        &create_box(1.0, 1.0, 1.0),
        Vec4::new(0.8, 0.3, 0.2, 1.0),
    ));
    RenderObject::mesh(1, Mat4::IDENTITY, Arc::new(StandardMeshRenderer::new(gpu)), vec![mesh])
}

/// A wide slab under the cube.
fn ground(gpu: &GpuContext) -> RenderObject {
    let mesh = Arc::new(GpuMesh::from_data(
        gpu,
        "Test Ground",
        &create_box(20.0, 0.2, 20.0),
        Vec4::new(0.4, 0.5, 0.3, 1.0),
    ));
    RenderObject::mesh(
        2,
        Mat4::from_translation(Vec3::new(0.0, -0.6, 0.0)),
        Arc::new(StandardMeshRenderer::new(gpu)),
        vec![mesh],
    )
}

/// A gently sloped 8x8 heightmap spanning 32 units.
fn terrain(gpu: &GpuContext) -> TerrainDescriptor {
    let heights = (0..64).map(|i| (i % 8) as f32 / 8.0).collect();
    let heightmap = Heightmap::from_heights(gpu, 8, 8, heights).expect("heightmap");
    TerrainDescriptor::new(Arc::new(heightmap), 32.0, 1.5)
}

fn terrain_object(descriptor: TerrainDescriptor) -> RenderObject {
    RenderObject::terrain(3, Mat4::from_translation(Vec3::new(0.0, -1.0, 0.0)), Arc::new(descriptor))
}

fn pipeline(gpu: &Arc<GpuContext>, lighting: SceneLightingParams) -> ForwardPipeline {
    let mut pipeline = ForwardPipeline::with_default_passes(Arc::clone(gpu), SIZE, SIZE);
    pipeline.update_context(&camera(), lighting, WindParams::default(), 1.0 / 60.0);
    pipeline
}

/// Records execution order and resize calls. Never composites.
struct Recorder {
    name: &'static str,
    priority: u32,
    enabled: bool,
    reader: bool,
    log: Arc<Mutex<Vec<&'static str>>>,
    resizes: Arc<AtomicU32>,
}

impl Recorder {
    fn new(name: &'static str, priority: u32, log: &Arc<Mutex<Vec<&'static str>>>) -> Self {
        Self {
            name,
            priority,
            enabled: true,
            reader: false,
            log: Arc::clone(log),
            resizes: Arc::new(AtomicU32::new(0)),
        }
    }
}

impl RenderPass for Recorder {
    fn name(&self) -> &str {
        self.name
    }

    fn priority(&self) -> PassPriority {
        PassPriority(self.priority)
    }

    fn enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn execute(
        &mut self,
        _gpu: &GpuContext,
        _frame: &mut FrameEncoder,
        _ctx: &mut RenderContext,
        _objects: &[RenderObject],
    ) -> Option<PassResult> {
        self.log.lock().push(self.name);
        Some(PassResult::new(self.name, 0, 0.0))
    }

    fn resize(&mut self, _gpu: &GpuContext, _width: u32, _height: u32) {
        self.resizes.fetch_add(1, Ordering::SeqCst);
    }

    fn reads_scene_color(&self) -> bool {
        self.reader
    }
}

// ============================================================================
// Pass management
// ============================================================================

#[test]
fn passes_run_in_priority_order() {
    let Some(gpu) = headless() else {
        return;
    };
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut pipeline = ForwardPipeline::new(Arc::clone(&gpu), SIZE, SIZE);
    pipeline.add_pass(Box::new(Recorder::new("ui", 700, &log)));
    pipeline.add_pass(Box::new(Recorder::new("shadow", 100, &log)));
    pipeline.add_pass(Box::new(Recorder::new("transparent", 400, &log)));
    assert_eq!(pipeline.pass_names(), ["shadow", "transparent", "ui"]);

    let (_texture, view) = host_target(&gpu);
    pipeline.render(&view, &[]);
    assert_eq!(*log.lock(), ["shadow", "transparent", "ui"]);

    assert!(pipeline.set_pass_enabled("transparent", false));
    assert!(!pipeline.set_pass_enabled("missing", false));
    log.lock().clear();
    pipeline.render(&view, &[]);
    assert_eq!(*log.lock(), ["shadow", "ui"]);

    assert!(pipeline.remove_pass("ui"));
    assert!(!pipeline.remove_pass("ui"));
    assert!(pipeline.get_pass("ui").is_none());
    assert_eq!(pipeline.get_pass("shadow").map(|p| p.priority()), Some(PassPriority(100)));
}

#[test]
fn default_passes_are_ordered() {
    let Some(gpu) = headless() else {
        return;
    };
    let pipeline = ForwardPipeline::with_default_passes(gpu, SIZE, SIZE);
    assert_eq!(
        pipeline.pass_names(),
        [
            ShadowPass::NAME,
            DepthPrepass::NAME,
            SkyPass::NAME,
            OpaquePass::NAME,
            ContactShadowPass::NAME,
            OverlayPass::NAME,
        ]
    );
}

// ============================================================================
// Frame scenarios
// ============================================================================

#[test]
fn directional_light_with_one_mesh() {
    let Some(gpu) = headless() else {
        return;
    };
    let mut pipeline = pipeline(&gpu, sun());
    let (_texture, view) = host_target(&gpu);
    let objects = [cube(&gpu)];

    pipeline.render(&view, &objects);
    let report = pipeline.last_frame().expect("frame report");

    assert_eq!(report.target, TargetKind::Screen);
    assert!(!report.composited);
    assert_eq!(report.pass(ShadowPass::NAME).map(|r| r.objects_rendered), Some(1));
    assert!(!report.ran(DepthPrepass::NAME));
    assert_eq!(
        report.pass(SkyPass::NAME).and_then(|r| r.note.as_deref()),
        Some("atmosphere")
    );
    assert_eq!(report.pass(OpaquePass::NAME).map(|r| r.objects_rendered), Some(1));
    assert!(!report.ran(ContactShadowPass::NAME));

    assert!(pipeline.shadow_texture().is_some());
    assert!(pipeline.context().textures.light_space_matrix.is_some());
    assert!(pipeline.depth_texture().is_none());
}

#[test]
fn hdr_light_without_objects() {
    let Some(gpu) = headless() else {
        return;
    };
    let mut pipeline = pipeline(
        &gpu,
        SceneLightingParams::Hdr(HdrLightParams {
            exposure: 2.0,
            ambient: 1.0,
        }),
    );
    let pixels = vec![0.5_f32; 8 * 4 * 4];
    let hdr = upload_hdr_texture(&gpu, 8, 4, &pixels).expect("hdr upload");
    pipeline.set_texture(TextureSlot::Hdr, Some(hdr));

    let (_texture, view) = host_target(&gpu);
    pipeline.render(&view, &[]);
    let report = pipeline.last_frame().expect("frame report");

    assert!(!report.ran(ShadowPass::NAME));
    assert!(!report.ran(DepthPrepass::NAME));
    assert_eq!(report.pass(SkyPass::NAME).and_then(|r| r.note.as_deref()), Some("hdr"));
    assert_eq!(report.pass(OpaquePass::NAME).map(|r| r.objects_rendered), Some(0));
    assert!(pipeline.shadow_texture().is_none());
    assert!(pipeline.context().textures.light_space_matrix.is_none());
    assert!(pipeline.depth_texture().is_none());
}

#[test]
fn disabling_shadows_clears_slots() {
    let Some(gpu) = headless() else {
        return;
    };
    let mut pipeline = pipeline(&gpu, sun());
    let (_texture, view) = host_target(&gpu);
    let objects = [cube(&gpu)];

    pipeline.render(&view, &objects);
    assert!(pipeline.shadow_texture().is_some());

    pipeline.update_settings(&SettingsPatch {
        shadow_enabled: Some(false),
        ..Default::default()
    });
    pipeline.render(&view, &objects);
    assert!(pipeline.shadow_texture().is_none());
    assert!(pipeline.context().textures.light_space_matrix.is_none());
}

// ============================================================================
// Compositing
// ============================================================================

fn with_contact_shadows(pipeline: &mut ForwardPipeline) {
    pipeline.update_settings(&SettingsPatch {
        contact_shadow_enabled: Some(true),
        ..Default::default()
    });
}

#[test]
fn contact_shadows_composite_through_ping_pong() {
    let Some(gpu) = headless() else {
        return;
    };
    let mut pipeline = pipeline(&gpu, sun());
    with_contact_shadows(&mut pipeline);
    let (_texture, view) = host_target(&gpu);
    let objects = [cube(&gpu)];

    pipeline.render(&view, &objects);
    let report = pipeline.last_frame().expect("frame report");
    assert_eq!(report.target, TargetKind::PingPong(0));
    assert!(report.ran(DepthPrepass::NAME));
    assert!(report.ran(ContactShadowPass::NAME));
    assert!(report.composited);
    assert!(pipeline.depth_texture().is_some());

    pipeline.render(&view, &objects);
    assert_eq!(pipeline.last_frame().map(|r| r.target.clone()), Some(TargetKind::PingPong(1)));
}

#[test]
fn missing_depth_passes_scene_color_through() {
    let Some(gpu) = headless() else {
        return;
    };
    let mut pipeline = pipeline(&gpu, sun());
    with_contact_shadows(&mut pipeline);
    assert!(pipeline.remove_pass(DepthPrepass::NAME));
    let (texture, view) = host_target(&gpu);
    let objects = [cube(&gpu)];

    pipeline.render(&view, &objects);
    let report = pipeline.last_frame().expect("frame report");
    assert!(matches!(report.target, TargetKind::PingPong(_)));
    assert!(!report.composited);
    assert!(!report.ran(ContactShadowPass::NAME));

    let scene = read_pixels(&gpu, &pipeline.last_scene_color().texture);
    let host = read_pixels(&gpu, &texture);
    assert_eq!(scene, host);
}

#[test]
fn scene_color_readers_run_after_the_main_loop() {
    let Some(gpu) = headless() else {
        return;
    };
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut pipeline = ForwardPipeline::new(Arc::clone(&gpu), SIZE, SIZE);
    pipeline.update_context(&camera(), sun(), WindParams::default(), 0.0);
    with_contact_shadows(&mut pipeline);

    let mut reader = Recorder::new("reader", 100, &log);
    reader.reader = true;
    pipeline.add_pass(Box::new(reader));
    pipeline.add_pass(Box::new(Recorder::new("overlay", 600, &log)));

    let (_texture, view) = host_target(&gpu);
    pipeline.render(&view, &[cube(&gpu)]);
    assert_eq!(*log.lock(), ["overlay", "reader"]);
    // The recorder never composites, so the frame is copied through.
    assert_eq!(pipeline.last_frame().map(|r| r.composited), Some(false));
}

// ============================================================================
// Depth pre-pass
// ============================================================================

#[test]
fn terrain_blend_targets_are_drawn_into_scene_depth() {
    let Some(gpu) = headless() else {
        return;
    };
    let mut pipeline = pipeline(&gpu, sun());
    let (_texture, view) = host_target(&gpu);
    let objects = [ground(&gpu), cube(&gpu).with_terrain_blend(TerrainBlendSettings::default())];

    pipeline.render(&view, &objects);
    let report = pipeline.last_frame().expect("frame report");

    let prepass = report.pass(DepthPrepass::NAME).expect("pre-pass ran");
    assert_eq!(prepass.objects_rendered, 2);
    assert_eq!(prepass.note.as_deref(), Some("1 terrain-blend target(s) marked"));
    let opaque = report.pass(OpaquePass::NAME).expect("opaque ran");
    assert_eq!(opaque.objects_rendered, 2);
    assert_eq!(opaque.note.as_deref(), Some("1 terrain-blended"));

    let slots = &pipeline.context().textures;
    let (depth, terrain_depth) = (slots.depth.as_ref(), slots.terrain_depth.as_ref());
    assert!(depth.is_some() && terrain_depth.is_some());
    assert_ne!(depth.map(|d| d.id()), terrain_depth.map(|d| d.id()));
}

#[test]
fn blend_target_depth_stays_out_of_terrain_depth() {
    let Some(gpu) = headless() else {
        return;
    };
    let mut prepass = DepthPrepass::new(&gpu);
    let mut ctx = RenderContext::new(SIZE, SIZE);
    ctx.camera = CameraState::from_camera(&camera());
    let objects = [cube(&gpu).with_terrain_blend(TerrainBlendSettings::default())];

    let mut frame = FrameEncoder::new(&gpu.device, "Test Frame");
    let result = prepass.execute(&gpu, &mut frame, &mut ctx, &objects).expect("pre-pass result");
    gpu.queue.submit(std::iter::once(frame.finish()));
    assert_eq!(result.objects_rendered, 1);

    let (depth, surfaces) = prepass.targets().expect("depth targets");
    let scene = center_depth(&gpu, &depth.texture);
    let behind = center_depth(&gpu, &surfaces.texture);
    assert!(scene < 1.0, "blend target missing from scene depth: {scene}");
    assert!((behind - 1.0).abs() < f32::EPSILON, "blend target leaked into terrain depth: {behind}");

    assert_eq!(ctx.textures.depth.as_ref().map(|d| d.id()), Some(depth.view.id()));
    assert_eq!(ctx.textures.terrain_depth.as_ref().map(|d| d.id()), Some(surfaces.view.id()));
}

#[test]
fn skipping_the_prepass_clears_depth() {
    let Some(gpu) = headless() else {
        return;
    };
    let mut pipeline = pipeline(&gpu, sun());
    with_contact_shadows(&mut pipeline);
    let (_texture, view) = host_target(&gpu);
    let objects = [cube(&gpu)];

    pipeline.render(&view, &objects);
    let slots = &pipeline.context().textures;
    assert!(pipeline.depth_texture().is_some());
    // Without blend targets both slots share one texture.
    assert_eq!(slots.depth.as_ref().map(|d| d.id()), slots.terrain_depth.as_ref().map(|d| d.id()));

    pipeline.update_settings(&SettingsPatch {
        contact_shadow_enabled: Some(false),
        ..Default::default()
    });
    pipeline.render(&view, &objects);
    let report = pipeline.last_frame().expect("frame report");
    assert!(!report.ran(DepthPrepass::NAME));
    assert!(!report.ran(ContactShadowPass::NAME));
    assert!(pipeline.depth_texture().is_none());
    assert!(pipeline.context().textures.terrain_depth.is_none());
}

// ============================================================================
// Terrain
// ============================================================================

/// Renders `objects` with shadows and contact shadows on and returns the
/// object counts of the shadow, pre-pass and opaque passes.
fn depth_path_counts(gpu: &Arc<GpuContext>, objects: &[RenderObject]) -> [Option<u32>; 3] {
    let mut pipeline = pipeline(gpu, sun());
    with_contact_shadows(&mut pipeline);
    let (_texture, view) = host_target(gpu);
    pipeline.render(&view, objects);
    let report = pipeline.last_frame().expect("frame report");
    [ShadowPass::NAME, DepthPrepass::NAME, OpaquePass::NAME]
        .map(|name| report.pass(name).map(|r| r.objects_rendered))
}

#[test]
fn clipmap_terrain_through_every_depth_path() {
    let Some(gpu) = headless() else {
        return;
    };
    let clipmap = ClipmapGeometry::new(
        &gpu,
        ClipmapConfig {
            ring_count: 3,
            grid_size: 17,
            base_scale: 1.0,
        },
    );
    let descriptor = terrain(&gpu).with_clipmap(Arc::new(clipmap));
    let objects = [terrain_object(descriptor), cube(&gpu)];

    assert_eq!(depth_path_counts(&gpu, &objects), [Some(2); 3]);
}

#[test]
fn baked_terrain_through_every_depth_path() {
    let Some(gpu) = headless() else {
        return;
    };
    let descriptor = terrain(&gpu).with_baked_mesh(&gpu, 8);
    assert!(!descriptor.use_clipmap);
    let objects = [terrain_object(descriptor), cube(&gpu)];

    assert_eq!(depth_path_counts(&gpu, &objects), [Some(2); 3]);
}

#[test]
fn terrain_without_geometry_is_skipped() {
    let Some(gpu) = headless() else {
        return;
    };
    let objects = [terrain_object(terrain(&gpu)), cube(&gpu)];

    assert_eq!(depth_path_counts(&gpu, &objects), [Some(1); 3]);
}

// ============================================================================
// Wind, wireframe and normals
// ============================================================================

#[test]
fn wind_sways_objects_in_every_pass() {
    let Some(gpu) = headless() else {
        return;
    };
    let wind = WindParams {
        enabled: true,
        time: 0.5,
        strength: 0.8,
        direction: Vec2::new(1.0, 0.5),
        turbulence: 0.3,
        gust_strength: 0.2,
        debug: false,
    };
    let settings = WindSettings::default();
    let top = wind_displacement(&wind, &settings, Vec3::new(0.0, 0.5, 0.0), 1.0);
    let base = wind_displacement(&wind, &settings, Vec3::new(0.0, -0.5, 0.0), 0.0);
    assert!(top.length() > 0.0);
    assert_eq!(base, Vec3::ZERO);

    let mut pipeline = pipeline(&gpu, sun());
    pipeline.update_context(&camera(), sun(), wind, 1.0 / 60.0);
    with_contact_shadows(&mut pipeline);
    let (_texture, view) = host_target(&gpu);
    let objects = [cube(&gpu).with_wind(settings)];

    pipeline.render(&view, &objects);
    assert_eq!(pipeline.context().wind, wind);
    let report = pipeline.last_frame().expect("frame report");
    for name in [ShadowPass::NAME, DepthPrepass::NAME, OpaquePass::NAME] {
        assert_eq!(report.pass(name).map(|r| r.objects_rendered), Some(1), "{name}");
    }
}

#[test]
fn wireframe_mode_draws_every_object() {
    let Some(gpu) = headless() else {
        return;
    };
    let mut pipeline = pipeline(&gpu, sun());
    pipeline.update_settings(&SettingsPatch {
        wireframe_mode: Some(true),
        ..Default::default()
    });
    let (_texture, view) = host_target(&gpu);

    // Falls back to filled drawing when the adapter lacks line polygons.
    pipeline.render(&view, &[cube(&gpu), ground(&gpu)]);
    let opaque = pipeline.last_frame().and_then(|r| r.pass(OpaquePass::NAME).cloned()).expect("opaque ran");
    assert_eq!(opaque.objects_rendered, 2);
    assert_eq!(opaque.note.as_deref(), Some("wireframe"));
}

#[test]
fn normal_lines_draw_when_shown() {
    let Some(gpu) = headless() else {
        return;
    };
    let data = create_box(1.0, 1.0, 1.0);
    let mesh = GpuMesh::from_data(&gpu, "Normals Cube", &data, Vec4::ONE).with_normal_lines(&gpu, &data, 0.25);
    assert!(mesh.has_normal_lines());
    let renderer = Arc::new(StandardMeshRenderer::new(&gpu));
    let mut shown = RenderObject::mesh(4, Mat4::IDENTITY, renderer, vec![Arc::new(mesh)]);
    shown.show_normals = true;

    let mut pipeline = pipeline(&gpu, sun());
    let (_texture, view) = host_target(&gpu);
    pipeline.render(&view, &[shown, cube(&gpu)]);
    let opaque = pipeline.last_frame().and_then(|r| r.pass(OpaquePass::NAME).cloned()).expect("opaque ran");
    assert_eq!(opaque.objects_rendered, 2);
    assert_eq!(opaque.note.as_deref(), Some("1 with normals"));
}

// ============================================================================
// Resize
// ============================================================================

#[test]
fn resize_to_current_size_is_a_no_op() {
    let Some(gpu) = headless() else {
        return;
    };
    let log = Arc::new(Mutex::new(Vec::new()));
    let recorder = Recorder::new("recorder", 300, &log);
    let resizes = Arc::clone(&recorder.resizes);

    let mut pipeline = ForwardPipeline::new(gpu, SIZE, SIZE);
    pipeline.add_pass(Box::new(recorder));
    let ids = pipeline.target_ids();

    pipeline.resize(SIZE, SIZE);
    assert_eq!(pipeline.target_ids(), ids);
    assert_eq!(resizes.load(Ordering::SeqCst), 0);

    pipeline.resize(SIZE * 2, SIZE);
    assert_eq!(pipeline.size(), (SIZE * 2, SIZE));
    assert_eq!(pipeline.context().viewport(), (SIZE * 2, SIZE));
    assert!(pipeline.target_ids().iter().all(|id| !ids.contains(id)));
    assert_eq!(resizes.load(Ordering::SeqCst), 1);
}

#[test]
fn destroy_releases_passes_and_slots() {
    let Some(gpu) = headless() else {
        return;
    };
    let mut pipeline = pipeline(&gpu, sun());
    let (_texture, view) = host_target(&gpu);
    pipeline.render(&view, &[cube(&gpu)]);

    pipeline.destroy();
    assert!(pipeline.pass_names().is_empty());
    assert!(pipeline.shadow_texture().is_none());
    assert!(pipeline.last_frame().is_none());
}
