//! GPU 2D SPH tick with ping-pong particle buffers.
//!
//! Buffers A and B hold the particle array. Bind group `k` reads buffer `k`
//! (density written in place) and writes buffer `1 - k`. After each tick the
//! role flag flips, so the next tick reads what this one wrote.

use std::borrow::Cow;

use sph2d::{DispatchGrid, FrameMetrics, Particle, SimError, SimulationParams, SphConfig};
use wgpu::util::DeviceExt;

use crate::params::{GpuSimParams, SphConstants};
use crate::readback::read_buffer;
use crate::GpuError;

/// Workgroup edge length; must match `@workgroup_size` in `sph_2d.wgsl`.
pub const WORKGROUP_SIZE: u32 = 8;

/// Workgroup counts `[x, y]` covering `grid`, or an error if either exceeds
/// the device's per-dimension limit.
pub fn workgroup_counts(grid: DispatchGrid, limit: u32) -> Result<[u32; 2], GpuError> {
    let x = grid.columns.div_ceil(WORKGROUP_SIZE);
    let y = grid.rows.div_ceil(WORKGROUP_SIZE);
    if x > limit || y > limit {
        return Err(GpuError::DispatchTooLarge {
            columns: grid.columns,
            rows: grid.rows,
            limit,
        });
    }
    Ok([x, y])
}

/// GPU SPH simulation state
pub struct GpuSph2D {
    params: SimulationParams,
    params_buffer: wgpu::Buffer,
    constants: SphConstants,
    _constants_buffer: wgpu::Buffer,

    particle_buffers: [wgpu::Buffer; 2],
    tension_buffer: wgpu::Buffer,
    bind_groups: [wgpu::BindGroup; 2],

    density_pipeline: wgpu::ComputePipeline,
    step_pipeline: wgpu::ComputePipeline,

    particle_count: usize,
    workgroups: [u32; 2],
    max_workgroups: u32,
    current: usize,
    ticks: u64,
}

impl GpuSph2D {
    pub fn new(
        device: &wgpu::Device,
        config: &SphConfig,
        params: SimulationParams,
        particles: &[Particle],
    ) -> Result<Self, GpuError> {
        config.validate()?;
        params.validate()?;
        if particles.is_empty() {
            return Err(GpuError::EmptyParticleSet);
        }

        let max_workgroups = device.limits().max_compute_workgroups_per_dimension;
        let workgroups = workgroup_counts(params.dispatch_grid(particles.len())?, max_workgroups)?;

        let gpu_params = GpuSimParams::from(params);
        let params_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("SPH Params"),
            contents: bytemuck::bytes_of(&gpu_params),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let constants = SphConstants::new(config);
        let constants_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("SPH Constants"),
            contents: bytemuck::bytes_of(&constants),
            usage: wgpu::BufferUsages::UNIFORM,
        });

        let create_particle_buffer = |label: &str| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::cast_slice(particles),
                usage: wgpu::BufferUsages::STORAGE
                    | wgpu::BufferUsages::COPY_DST
                    | wgpu::BufferUsages::COPY_SRC,
            })
        };
        let particle_buffers = [
            create_particle_buffer("SPH Particles A"),
            create_particle_buffer("SPH Particles B"),
        ];

        let tension_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("SPH Surface Tension"),
            contents: bytemuck::cast_slice(&vec![0.0f32; particles.len()]),
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
        });

        let uniform_entry = |binding: u32| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };
        let storage_entry = |binding: u32| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Storage { read_only: false },
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("SPH Bind Group Layout"),
            entries: &[
                // 0: Params (uniform)
                uniform_entry(0),
                // 1: Constants (uniform)
                uniform_entry(1),
                // 2: Particles in (density written in place)
                storage_entry(2),
                // 3: Particles out
                storage_entry(3),
                // 4: Surface tension magnitude
                storage_entry(4),
            ],
        });

        let create_bind_group = |label: &str, input: &wgpu::Buffer, output: &wgpu::Buffer| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(label),
                layout: &bind_group_layout,
                entries: &[
                    wgpu::BindGroupEntry { binding: 0, resource: params_buffer.as_entire_binding() },
                    wgpu::BindGroupEntry { binding: 1, resource: constants_buffer.as_entire_binding() },
                    wgpu::BindGroupEntry { binding: 2, resource: input.as_entire_binding() },
                    wgpu::BindGroupEntry { binding: 3, resource: output.as_entire_binding() },
                    wgpu::BindGroupEntry { binding: 4, resource: tension_buffer.as_entire_binding() },
                ],
            })
        };
        let [a, b] = &particle_buffers;
        let bind_groups = [
            create_bind_group("SPH Bind Group A->B", a, b),
            create_bind_group("SPH Bind Group B->A", b, a),
        ];

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("SPH Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("SPH 2D Shader"),
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(include_str!("shaders/sph_2d.wgsl"))),
        });
        let create_pipeline = |label: &str, entry: &str| {
            device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some(label),
                layout: Some(&pipeline_layout),
                module: &shader,
                entry_point: Some(entry),
                compilation_options: Default::default(),
                cache: None,
            })
        };
        let density_pipeline = create_pipeline("SPH Density", "compute_density");
        let step_pipeline = create_pipeline("SPH Step", "step_particles");

        log::info!(
            "GPU SPH: {} particles, width {}, {}x{} workgroups",
            particles.len(),
            params.width,
            workgroups[0],
            workgroups[1]
        );

        Ok(Self {
            params,
            params_buffer,
            constants,
            _constants_buffer: constants_buffer,
            particle_buffers,
            tension_buffer,
            bind_groups,
            density_pipeline,
            step_pipeline,
            particle_count: particles.len(),
            workgroups,
            max_workgroups,
            current: 0,
            ticks: 0,
        })
    }

    pub fn particle_count(&self) -> usize {
        self.particle_count
    }

    pub fn params(&self) -> SimulationParams {
        self.params
    }

    pub fn constants(&self) -> &SphConstants {
        &self.constants
    }

    /// Which buffer (0 = A, 1 = B) the next tick reads.
    pub fn current_index(&self) -> usize {
        self.current
    }

    /// Buffer holding the latest particle state.
    pub fn current_buffer(&self) -> &wgpu::Buffer {
        &self.particle_buffers[self.current]
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Update the per-tick record; takes effect from the next submitted tick.
    pub fn set_params(&mut self, queue: &wgpu::Queue, params: SimulationParams) -> Result<(), GpuError> {
        params.validate()?;
        let workgroups = workgroup_counts(params.dispatch_grid(self.particle_count)?, self.max_workgroups)?;
        self.params = params;
        self.workgroups = workgroups;
        queue.write_buffer(&self.params_buffer, 0, bytemuck::bytes_of(&GpuSimParams::from(params)));
        Ok(())
    }

    /// Overwrite the current buffer. The particle count is fixed.
    pub fn upload_particles(&mut self, queue: &wgpu::Queue, particles: &[Particle]) -> Result<(), GpuError> {
        if particles.len() != self.particle_count {
            return Err(SimError::ParticleCountMismatch {
                expected: self.particle_count,
                found: particles.len(),
            }
            .into());
        }
        queue.write_buffer(self.current_buffer(), 0, bytemuck::cast_slice(particles));
        Ok(())
    }

    /// Phase 1 pass only.
    pub fn encode_density(&self, encoder: &mut wgpu::CommandEncoder) {
        let [x, y] = self.workgroups;
        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("SPH: Density"),
            timestamp_writes: None,
        });
        pass.set_pipeline(&self.density_pipeline);
        pass.set_bind_group(0, &self.bind_groups[self.current], &[]);
        pass.dispatch_workgroups(x, y, 1);
    }

    /// Encode one tick: density pass, step pass, then flip roles.
    pub fn encode_tick(&mut self, encoder: &mut wgpu::CommandEncoder) {
        let [x, y] = self.workgroups;

        // 1. Density (in place in the current buffer)
        self.encode_density(encoder);

        // 2. Forces + integration + collisions (current -> next)
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("SPH: Step"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.step_pipeline);
            pass.set_bind_group(0, &self.bind_groups[self.current], &[]);
            pass.dispatch_workgroups(x, y, 1);
        }

        self.current ^= 1;
        self.ticks += 1;
    }

    /// Submit `ticks` ticks in one command buffer.
    pub fn run(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, ticks: usize) {
        if ticks == 0 {
            return;
        }
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("SPH Tick Encoder"),
        });
        for _ in 0..ticks {
            self.encode_tick(&mut encoder);
        }
        queue.submit(std::iter::once(encoder.finish()));
        log::debug!("GPU ticks submitted: {} (total {})", ticks, self.ticks);
    }

    pub fn step(&mut self, device: &wgpu::Device, queue: &wgpu::Queue) {
        self.run(device, queue, 1);
    }

    pub fn read_particles(&self, device: &wgpu::Device, queue: &wgpu::Queue) -> Result<Vec<Particle>, GpuError> {
        read_buffer(device, queue, self.current_buffer(), self.particle_count, "Particle Staging")
    }

    /// Tension magnitudes from the last step pass.
    pub fn read_surface_tension(&self, device: &wgpu::Device, queue: &wgpu::Queue) -> Result<Vec<f32>, GpuError> {
        read_buffer(device, queue, &self.tension_buffer, self.particle_count, "Tension Staging")
    }

    pub fn compute_metrics(&self, device: &wgpu::Device, queue: &wgpu::Queue) -> Result<FrameMetrics, GpuError> {
        let particles = self.read_particles(device, queue)?;
        let tension = self.read_surface_tension(device, queue)?;
        Ok(FrameMetrics::compute(&particles, &tension))
    }
}
