//! GPU Context
//!
//! [`GpuContext`] holds the device and queue, the formats every pipeline is
//! compiled against, the bind-group layouts shared between passes and mesh
//! renderers, fallback textures and the shader library.

use crate::errors::{Result, VerdantError};
use crate::renderer::pipeline::ShaderLibrary;

use super::texture::HDR_FORMAT;
use super::tracked::Tracked;

/// Bind-group layouts shared across passes.
///
/// | Layout | Group | Contents |
/// |--------|-------|----------|
/// | `frame` | 0 (lit) | frame uniforms, shadow map + comparison sampler, HDR environment + sampler, scene depth |
/// | `depth_frame` | 0 (depth-only) | light or camera view-projection and wind |
/// | `object` | 1 | per-draw object uniforms (dynamic offset) |
/// | `terrain_ring` | 1 (terrain) | per-ring terrain uniforms (dynamic offset) |
/// | `heightmap` | 2 (terrain) | `R32Float` height texture |
pub struct SharedLayouts {
    pub frame: Tracked<wgpu::BindGroupLayout>,
    pub depth_frame: Tracked<wgpu::BindGroupLayout>,
    pub object: Tracked<wgpu::BindGroupLayout>,
    pub terrain_ring: Tracked<wgpu::BindGroupLayout>,
    pub heightmap: Tracked<wgpu::BindGroupLayout>,
}

impl SharedLayouts {
    fn new(device: &wgpu::Device) -> Self {
        let depth_texture = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Depth,
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        };

        let frame = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Frame Layout"),
            entries: &[
                uniform_entry(0, wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT, false),
                depth_texture(1),
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Comparison),
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 4,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                depth_texture(5),
            ],
        });

        let depth_frame = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Depth Frame Layout"),
            entries: &[uniform_entry(0, wgpu::ShaderStages::VERTEX, false)],
        });

        let object = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Object Layout"),
            entries: &[uniform_entry(0, wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT, true)],
        });

        let terrain_ring = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Terrain Ring Layout"),
            entries: &[uniform_entry(0, wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT, true)],
        });

        let heightmap = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Heightmap Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: false },
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            }],
        });

        Self {
            frame: Tracked::new(frame),
            depth_frame: Tracked::new(depth_frame),
            object: Tracked::new(object),
            terrain_ring: Tracked::new(terrain_ring),
            heightmap: Tracked::new(heightmap),
        }
    }
}

/// Uniform buffer layout entry, optionally with a dynamic offset.
#[must_use]
pub fn uniform_entry(binding: u32, visibility: wgpu::ShaderStages, dynamic: bool) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: dynamic,
            min_binding_size: None,
        },
        count: None,
    }
}

/// Stand-ins bound when an optional texture slot is empty. Shaders gate
/// their use with flags, so the (zero-initialized) contents are never read
/// meaningfully.
pub struct FallbackTextures {
    pub depth: Tracked<wgpu::TextureView>,
    pub hdr: Tracked<wgpu::TextureView>,
    pub shadow_sampler: Tracked<wgpu::Sampler>,
    pub linear_sampler: Tracked<wgpu::Sampler>,
    pub nearest_sampler: Tracked<wgpu::Sampler>,
}

impl FallbackTextures {
    fn new(device: &wgpu::Device) -> Self {
        let one = wgpu::Extent3d {
            width: 1,
            height: 1,
            depth_or_array_layers: 1,
        };
        let make = |label, format| {
            device
                .create_texture(&wgpu::TextureDescriptor {
                    label: Some(label),
                    size: one,
                    mip_level_count: 1,
                    sample_count: 1,
                    dimension: wgpu::TextureDimension::D2,
                    format,
                    usage: wgpu::TextureUsages::TEXTURE_BINDING,
                    view_formats: &[],
                })
                .create_view(&wgpu::TextureViewDescriptor::default())
        };

        let shadow_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Shadow Comparison Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            compare: Some(wgpu::CompareFunction::LessEqual),
            ..Default::default()
        });
        let linear_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Linear Sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });
        let nearest_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Nearest Sampler"),
            ..Default::default()
        });

        Self {
            depth: Tracked::new(make("Fallback Depth", wgpu::TextureFormat::Depth32Float)),
            hdr: Tracked::new(make("Fallback HDR", HDR_FORMAT)),
            shadow_sampler: Tracked::new(shadow_sampler),
            linear_sampler: Tracked::new(linear_sampler),
            nearest_sampler: Tracked::new(nearest_sampler),
        }
    }
}

/// Device-level state shared by the pipeline, its passes and mesh renderers.
pub struct GpuContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    /// Format of the host target passed to `render`.
    pub color_format: wgpu::TextureFormat,
    pub depth_format: wgpu::TextureFormat,
    /// Whether `PolygonMode::Line` pipelines can be built.
    pub supports_wireframe: bool,
    pub layouts: SharedLayouts,
    pub fallback: FallbackTextures,
    pub shaders: ShaderLibrary,
}

impl GpuContext {
    /// Wraps a device created by the host (which typically owns the surface).
    #[must_use]
    pub fn new(device: wgpu::Device, queue: wgpu::Queue, color_format: wgpu::TextureFormat) -> Self {
        let supports_wireframe = device.features().contains(wgpu::Features::POLYGON_MODE_LINE);
        let layouts = SharedLayouts::new(&device);
        let fallback = FallbackTextures::new(&device);

        Self {
            device,
            queue,
            color_format,
            depth_format: wgpu::TextureFormat::Depth32Float,
            supports_wireframe,
            layouts,
            fallback,
            shaders: ShaderLibrary::new(),
        }
    }

    /// Creates a device without a surface, for offscreen rendering and tests.
    pub async fn headless(color_format: wgpu::TextureFormat) -> Result<Self> {
        let instance = wgpu::Instance::default();
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| VerdantError::AdapterRequestFailed(e.to_string()))?;

        let required_features = adapter.features() & wgpu::Features::POLYGON_MODE_LINE;
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Verdant Headless Device"),
                required_features,
                required_limits: adapter.limits(),
                ..Default::default()
            })
            .await?;

        log::debug!(
            "Headless device on {:?} (wireframe: {})",
            adapter.get_info().backend,
            !required_features.is_empty()
        );

        Ok(Self::new(device, queue, color_format))
    }
}
