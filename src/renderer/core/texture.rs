use half::f16;

use super::context::GpuContext;
use super::tracked::Tracked;
use crate::errors::{Result, VerdantError};

/// Format used for HDR environment textures.
pub const HDR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;

/// Creates a sampled render target of `format`.
#[must_use]
pub fn create_render_target(
    device: &wgpu::Device,
    label: &str,
    width: u32,
    height: u32,
    format: wgpu::TextureFormat,
    extra_usage: wgpu::TextureUsages,
) -> wgpu::Texture {
    device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING | extra_usage,
        view_formats: &[],
    })
}

/// Texture plus its default view, tracked for bind-group caching.
pub struct TargetTexture {
    pub texture: wgpu::Texture,
    pub view: Tracked<wgpu::TextureView>,
}

impl TargetTexture {
    #[must_use]
    pub fn new(
        device: &wgpu::Device,
        label: &str,
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
        extra_usage: wgpu::TextureUsages,
    ) -> Self {
        let texture = create_render_target(device, label, width, height, format, extra_usage);
        let view = Tracked::new(texture.create_view(&wgpu::TextureViewDescriptor::default()));
        Self { texture, view }
    }

    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        (self.texture.width(), self.texture.height())
    }

    pub fn destroy(&self) {
        self.texture.destroy();
    }
}

/// Uploads linear RGBA32F pixels as an `Rgba16Float` texture for the HDR slot.
pub fn upload_hdr_texture(
    gpu: &GpuContext,
    width: u32,
    height: u32,
    rgba: &[f32],
) -> Result<Tracked<wgpu::TextureView>> {
    let expected = width as usize * height as usize * 4;
    if rgba.len() != expected || expected == 0 {
        return Err(VerdantError::TextureSizeMismatch {
            label: "hdr environment".to_string(),
            expected,
            actual: rgba.len(),
        });
    }
    check_dimension(gpu, "hdr environment", width.max(height))?;

    let texels: Vec<f16> = rgba.iter().map(|&v| f16::from_f32(v)).collect();

    let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
        label: Some("HDR Environment"),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: HDR_FORMAT,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });

    gpu.queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        bytemuck::cast_slice(&texels),
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(width * 8),
            rows_per_image: Some(height),
        },
        texture.size(),
    );

    Ok(Tracked::new(texture.create_view(&wgpu::TextureViewDescriptor::default())))
}

pub(crate) fn check_dimension(gpu: &GpuContext, label: &str, size: u32) -> Result<()> {
    let limit = gpu.device.limits().max_texture_dimension_2d;
    if size > limit {
        return Err(VerdantError::TextureTooLarge {
            label: label.to_string(),
            size,
            limit,
        });
    }
    Ok(())
}

/// Terrain height field, kept on the CPU for baking and uploaded as `R32Float`.
///
/// Heights are normalized samples; the terrain's `height_scale` turns them
/// into world units. Sampled with `textureLoad`, so no filtering support for
/// 32-bit float textures is required.
pub struct Heightmap {
    width: u32,
    height: u32,
    heights: Vec<f32>,
    texture: wgpu::Texture,
    view: Tracked<wgpu::TextureView>,
}

impl Heightmap {
    pub fn from_heights(gpu: &GpuContext, width: u32, height: u32, heights: Vec<f32>) -> Result<Self> {
        let expected = width as usize * height as usize;
        if heights.len() != expected || expected == 0 {
            return Err(VerdantError::TextureSizeMismatch {
                label: "heightmap".to_string(),
                expected,
                actual: heights.len(),
            });
        }
        check_dimension(gpu, "heightmap", width.max(height))?;

        let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Terrain Heightmap"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::R32Float,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        gpu.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            bytemuck::cast_slice(&heights),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(width * 4),
                rows_per_image: Some(height),
            },
            texture.size(),
        );

        let view = Tracked::new(texture.create_view(&wgpu::TextureViewDescriptor::default()));
        Ok(Self {
            width,
            height,
            heights,
            texture,
            view,
        })
    }

    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    #[must_use]
    pub fn view(&self) -> &Tracked<wgpu::TextureView> {
        &self.view
    }

    /// Nearest texel lookup with clamped coordinates, as the shaders do it.
    #[must_use]
    pub fn sample_nearest(&self, u: f32, v: f32) -> f32 {
        let x = ((u.clamp(0.0, 1.0) * (self.width - 1) as f32).round() as u32).min(self.width - 1);
        let y = ((v.clamp(0.0, 1.0) * (self.height - 1) as f32).round() as u32).min(self.height - 1);
        self.heights[(y * self.width + x) as usize]
    }

    pub fn destroy(&self) {
        self.texture.destroy();
    }
}
