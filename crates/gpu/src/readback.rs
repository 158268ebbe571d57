//! GPU buffer and texture readback.
//!
//! `read_buffer` and `read_texture_rgba8` block until the copy is mapped.
//! [`ParticleReadback`] is a non-blocking staging slot: schedule a copy after
//! a batch of ticks and poll it later so the host never stalls the queue.

use std::sync::mpsc;

use bytemuck::Pod;
use sph2d::Particle;

use crate::{await_buffer_map, GpuError};

/// Copy the first `count` elements of `src` into a new vector.
pub(crate) fn read_buffer<T: Pod>(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    src: &wgpu::Buffer,
    count: usize,
    label: &str,
) -> Result<Vec<T>, GpuError> {
    if count == 0 {
        return Ok(Vec::new());
    }

    let bytes_to_copy = (count * std::mem::size_of::<T>()) as u64;
    let staging = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size: bytes_to_copy,
        usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("Readback Copy Encoder"),
    });
    encoder.copy_buffer_to_buffer(src, 0, &staging, 0, bytes_to_copy);
    queue.submit(std::iter::once(encoder.finish()));

    let slice = staging.slice(..);
    let (tx, rx) = mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = tx.send(result);
    });
    device.poll(wgpu::Maintain::Wait);
    await_buffer_map(rx)?;

    let data = slice.get_mapped_range();
    let values = bytemuck::cast_slice::<u8, T>(&data).to_vec();
    drop(data);
    staging.unmap();

    Ok(values)
}

/// Read an `rgba8unorm` texture, removing the row padding wgpu requires
/// for texture-to-buffer copies.
pub(crate) fn read_texture_rgba8(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    texture: &wgpu::Texture,
    width: u32,
    height: u32,
) -> Result<Vec<[u8; 4]>, GpuError> {
    let bytes_per_pixel = 4;
    let unpadded_bytes_per_row = width * bytes_per_pixel;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    let padded_bytes_per_row = unpadded_bytes_per_row.div_ceil(align) * align;
    let buffer_size = (padded_bytes_per_row * height) as u64;

    let staging = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Distance Field Staging"),
        size: buffer_size,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("Distance Field Readback Encoder"),
    });
    encoder.copy_texture_to_buffer(
        wgpu::ImageCopyTexture {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::ImageCopyBuffer {
            buffer: &staging,
            layout: wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(padded_bytes_per_row),
                rows_per_image: Some(height),
            },
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
    queue.submit(std::iter::once(encoder.finish()));

    let slice = staging.slice(..);
    let (tx, rx) = mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = tx.send(result);
    });
    device.poll(wgpu::Maintain::Wait);
    await_buffer_map(rx)?;

    let data = slice.get_mapped_range();
    let mut pixels = Vec::with_capacity((width * height) as usize);
    for row in 0..height {
        let row_start = (row * padded_bytes_per_row) as usize;
        let row_end = row_start + unpadded_bytes_per_row as usize;
        pixels.extend(
            data[row_start..row_end]
                .chunks_exact(4)
                .map(|px| [px[0], px[1], px[2], px[3]]),
        );
    }
    drop(data);
    staging.unmap();

    Ok(pixels)
}

#[derive(Debug, PartialEq)]
enum ReadyState {
    Ready,
    Pending,
    Failed,
}

/// Single staging slot for asynchronous particle readback.
pub struct ParticleReadback {
    staging: wgpu::Buffer,
    rx: Option<mpsc::Receiver<Result<(), wgpu::BufferAsyncError>>>,
    capacity: usize,
    count: usize,
    pending: bool,
}

impl ParticleReadback {
    pub fn new(device: &wgpu::Device, max_particles: usize) -> Self {
        let size = (max_particles.max(1) * std::mem::size_of::<Particle>()) as u64;
        Self {
            staging: device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("Readback Particles Staging"),
                size,
                usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            }),
            rx: None,
            capacity: max_particles,
            count: 0,
            pending: false,
        }
    }

    /// Schedule a copy of `count` particles from `src` and start mapping.
    ///
    /// Returns false if a readback is already pending or count is 0.
    pub fn schedule(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        src: &wgpu::Buffer,
        count: usize,
    ) -> bool {
        if self.pending {
            return false;
        }
        let count = count.min(self.capacity);
        if count == 0 {
            return false;
        }

        let byte_size = (count * std::mem::size_of::<Particle>()) as u64;
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Readback Copy Encoder"),
        });
        encoder.copy_buffer_to_buffer(src, 0, &self.staging, 0, byte_size);
        queue.submit(std::iter::once(encoder.finish()));

        let (tx, rx) = mpsc::channel();
        self.staging
            .slice(..byte_size)
            .map_async(wgpu::MapMode::Read, move |result| {
                let _ = tx.send(result);
            });
        self.rx = Some(rx);
        self.count = count;
        self.pending = true;
        true
    }

    fn check_ready(&mut self) -> ReadyState {
        let Some(receiver) = &self.rx else {
            return ReadyState::Ready;
        };
        match receiver.try_recv() {
            Ok(Ok(())) => {
                self.rx = None;
                ReadyState::Ready
            }
            Ok(Err(e)) => {
                log::warn!("Particle readback map failed: {:?}", e);
                self.rx = None;
                ReadyState::Failed
            }
            Err(mpsc::TryRecvError::Empty) => ReadyState::Pending,
            Err(mpsc::TryRecvError::Disconnected) => {
                self.rx = None;
                ReadyState::Failed
            }
        }
    }

    /// Copy out the staged particles if the map has completed.
    ///
    /// Returns None while pending or after a failed map (the slot is then
    /// free to schedule again).
    pub fn try_read(&mut self, out: &mut Vec<Particle>) -> Option<usize> {
        if !self.pending {
            return None;
        }
        match self.check_ready() {
            ReadyState::Pending => None,
            ReadyState::Failed => {
                self.pending = false;
                self.staging.unmap();
                None
            }
            ReadyState::Ready => {
                let byte_size = (self.count * std::mem::size_of::<Particle>()) as u64;
                {
                    let data = self.staging.slice(..byte_size).get_mapped_range();
                    out.clear();
                    out.extend_from_slice(bytemuck::cast_slice(&data));
                }
                self.staging.unmap();

                let count = self.count;
                self.pending = false;
                self.count = 0;
                Some(count)
            }
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }
}
