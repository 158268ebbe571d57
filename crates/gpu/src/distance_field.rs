//! GPU distance-field visualization pass.
//!
//! Writes an `rgba8unorm` storage texture from the current particle buffer.
//! Pixel mapping and colors are those of [`sph2d::DistanceField`].

use std::borrow::Cow;

use sph2d::DistanceField;
use wgpu::util::DeviceExt;

use crate::params::FieldParams;
use crate::readback::read_texture_rgba8;
use crate::sph_2d::{GpuSph2D, WORKGROUP_SIZE};
use crate::GpuError;

pub const TEXTURE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

pub struct GpuDistanceField {
    field: DistanceField,
    params_buffer: wgpu::Buffer,
    texture: wgpu::Texture,
    texture_view: wgpu::TextureView,
    bind_group_layout: wgpu::BindGroupLayout,
    pipeline: wgpu::ComputePipeline,
}

impl GpuDistanceField {
    pub fn new(device: &wgpu::Device, field: DistanceField) -> Result<Self, GpuError> {
        let max_dim = device.limits().max_texture_dimension_2d;
        if field.width == 0 || field.height == 0 || field.width > max_dim || field.height > max_dim {
            return Err(GpuError::InvalidImageSize {
                width: field.width,
                height: field.height,
            });
        }

        let params = FieldParams::from(&field);
        let params_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Distance Field Params"),
            contents: bytemuck::bytes_of(&params),
            usage: wgpu::BufferUsages::UNIFORM,
        });

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Distance Field Texture"),
            size: wgpu::Extent3d {
                width: field.width,
                height: field.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: TEXTURE_FORMAT,
            usage: wgpu::TextureUsages::STORAGE_BINDING
                | wgpu::TextureUsages::COPY_SRC
                | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let texture_view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Distance Field Bind Group Layout"),
            entries: &[
                // 0: Params (uniform)
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                // 1: Particles (read-only)
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: true },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                // 2: Output image
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::StorageTexture {
                        access: wgpu::StorageTextureAccess::WriteOnly,
                        format: TEXTURE_FORMAT,
                        view_dimension: wgpu::TextureViewDimension::D2,
                    },
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Distance Field Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Distance Field Shader"),
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(include_str!("shaders/distance_field.wgsl"))),
        });
        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("Distance Field"),
            layout: Some(&pipeline_layout),
            module: &shader,
            entry_point: Some("render_distance"),
            compilation_options: Default::default(),
            cache: None,
        });

        Ok(Self {
            field,
            params_buffer,
            texture,
            texture_view,
            bind_group_layout,
            pipeline,
        })
    }

    pub fn field(&self) -> &DistanceField {
        &self.field
    }

    pub fn texture(&self) -> &wgpu::Texture {
        &self.texture
    }

    /// Encode the pass against `particles`. The bind group is rebuilt each
    /// call because the current buffer alternates between ticks.
    pub fn encode(&self, device: &wgpu::Device, encoder: &mut wgpu::CommandEncoder, particles: &wgpu::Buffer) {
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Distance Field Bind Group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry { binding: 0, resource: self.params_buffer.as_entire_binding() },
                wgpu::BindGroupEntry { binding: 1, resource: particles.as_entire_binding() },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(&self.texture_view),
                },
            ],
        });

        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("Distance Field"),
            timestamp_writes: None,
        });
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &bind_group, &[]);
        pass.dispatch_workgroups(
            self.field.width.div_ceil(WORKGROUP_SIZE),
            self.field.height.div_ceil(WORKGROUP_SIZE),
            1,
        );
    }

    /// Render the latest state of `sph` and read the image back
    /// (row-major, row 0 at the top).
    pub fn render(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        sph: &GpuSph2D,
    ) -> Result<Vec<[u8; 4]>, GpuError> {
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Distance Field Encoder"),
        });
        self.encode(device, &mut encoder, sph.current_buffer());
        queue.submit(std::iter::once(encoder.finish()));

        read_texture_rgba8(device, queue, &self.texture, self.field.width, self.field.height)
    }
}
