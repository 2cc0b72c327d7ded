//! Uniform buffers
//!
//! [`UniformBuffer`] holds one fixed struct; [`DynamicUniforms`] packs one
//! struct per draw at aligned offsets and grows on demand, recreating its
//! bind group when the buffer is replaced.

use std::marker::PhantomData;

use bytemuck::Pod;

use super::tracked::Tracked;

/// Rounds `value` up to a multiple of `alignment`.
#[inline]
#[must_use]
pub fn align_to(value: u32, alignment: u32) -> u32 {
    value.div_ceil(alignment) * alignment
}

pub struct UniformBuffer<T: Pod> {
    buffer: wgpu::Buffer,
    _marker: PhantomData<T>,
}

impl<T: Pod> UniformBuffer<T> {
    #[must_use]
    pub fn new(device: &wgpu::Device, label: &str) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: std::mem::size_of::<T>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        Self {
            buffer,
            _marker: PhantomData,
        }
    }

    pub fn write(&self, queue: &wgpu::Queue, value: &T) {
        queue.write_buffer(&self.buffer, 0, bytemuck::bytes_of(value));
    }

    #[inline]
    #[must_use]
    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    pub fn destroy(&self) {
        self.buffer.destroy();
    }
}

/// Per-draw uniforms addressed with a dynamic offset (binding 0 of `layout`).
pub struct DynamicUniforms<T: Pod> {
    label: &'static str,
    layout: Tracked<wgpu::BindGroupLayout>,
    stride: u32,
    capacity: u32,
    staging: Vec<u8>,
    count: u32,
    buffer: wgpu::Buffer,
    bind_group: Tracked<wgpu::BindGroup>,
    _marker: PhantomData<T>,
}

impl<T: Pod> DynamicUniforms<T> {
    const INITIAL_CAPACITY: u32 = 64;

    #[must_use]
    pub fn new(device: &wgpu::Device, layout: &Tracked<wgpu::BindGroupLayout>, label: &'static str) -> Self {
        let min_alignment = device.limits().min_uniform_buffer_offset_alignment.max(1);
        let stride = align_to(std::mem::size_of::<T>() as u32, min_alignment);
        let capacity = Self::INITIAL_CAPACITY;
        let buffer = Self::create_buffer(device, label, stride, capacity);
        let bind_group = Self::create_bind_group(device, layout, &buffer, label);

        Self {
            label,
            layout: layout.clone(),
            stride,
            capacity,
            staging: Vec::with_capacity((stride * capacity) as usize),
            count: 0,
            buffer,
            bind_group,
            _marker: PhantomData,
        }
    }

    fn create_buffer(device: &wgpu::Device, label: &str, stride: u32, capacity: u32) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: u64::from(stride) * u64::from(capacity),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    fn create_bind_group(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        buffer: &wgpu::Buffer,
        label: &str,
    ) -> Tracked<wgpu::BindGroup> {
        Tracked::new(device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer,
                    offset: 0,
                    size: wgpu::BufferSize::new(std::mem::size_of::<T>() as u64),
                }),
            }],
        }))
    }

    /// Starts a new frame; previously returned offsets become invalid.
    pub fn clear(&mut self) {
        self.staging.clear();
        self.count = 0;
    }

    /// Stages `value` and returns its dynamic offset.
    pub fn push(&mut self, value: &T) -> u32 {
        let offset = self.count * self.stride;
        let bytes = bytemuck::bytes_of(value);
        self.staging.extend_from_slice(bytes);
        self.staging
            .resize(self.staging.len() + (self.stride as usize - bytes.len()), 0);
        self.count += 1;
        offset
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> u32 {
        self.count
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Writes the staged values, growing the buffer first if needed.
    pub fn upload(&mut self, device: &wgpu::Device, queue: &wgpu::Queue) {
        if self.count == 0 {
            return;
        }
        if self.count > self.capacity {
            let mut capacity = self.capacity.max(1);
            while capacity < self.count {
                capacity = capacity.saturating_mul(2);
            }
            log::debug!("Growing {} to {} entries", self.label, capacity);
            self.buffer.destroy();
            self.buffer = Self::create_buffer(device, self.label, self.stride, capacity);
            self.bind_group = Self::create_bind_group(device, &self.layout, &self.buffer, self.label);
            self.capacity = capacity;
        }
        queue.write_buffer(&self.buffer, 0, &self.staging);
    }

    #[inline]
    #[must_use]
    pub fn bind_group(&self) -> &Tracked<wgpu::BindGroup> {
        &self.bind_group
    }

    #[inline]
    #[must_use]
    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    pub fn destroy(&self) {
        self.buffer.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::align_to;

    #[test]
    fn align_rounds_up() {
        assert_eq!(align_to(176, 256), 256);
        assert_eq!(align_to(256, 256), 256);
        assert_eq!(align_to(257, 256), 512);
        assert_eq!(align_to(0, 256), 0);
    }
}
