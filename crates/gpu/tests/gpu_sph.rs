//! GPU SPH tick tests against the CPU solver.
//! Run with: cargo test -p sph2d_gpu --test gpu_sph
//!
//! Every test skips when no adapter is available.

use sph2d::{spawn_block, DistanceField, Particle, SimError, SimulationParams, SphConfig, SphSolver, Vec2};
use sph2d_gpu::{GpuDistanceField, GpuError, GpuSph2D, ParticleReadback};

fn init_device_queue() -> Option<(wgpu::Device, wgpu::Queue)> {
    let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
        backends: wgpu::Backends::all(),
        ..Default::default()
    });

    let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
        power_preference: wgpu::PowerPreference::HighPerformance,
        compatible_surface: None,
        force_fallback_adapter: false,
    }))?;

    pollster::block_on(adapter.request_device(
        &wgpu::DeviceDescriptor {
            label: Some("SPH Test Device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::downlevel_defaults().using_resolution(adapter.limits()),
            memory_hints: wgpu::MemoryHints::Performance,
        },
        None,
    ))
    .ok()
}

macro_rules! require_gpu {
    () => {
        match init_device_queue() {
            Some(pair) => pair,
            None => {
                println!("Skipping test: No GPU available");
                return;
            }
        }
    };
}

fn close(a: f32, b: f32, tol: f32) -> bool {
    (a - b).abs() <= tol * (1.0 + b.abs())
}

#[test]
fn test_gpu_single_particle_falls() {
    let (device, queue) = require_gpu!();

    let particles = [Particle::new(Vec2::new(12.0, 10.0), 1.0)];
    let mut sph = GpuSph2D::new(&device, &SphConfig::default(), SimulationParams::new(0.1, 1), &particles)
        .expect("gpu sph");
    sph.step(&device, &queue);

    let p = sph.read_particles(&device, &queue).expect("readback")[0];
    println!("after one tick: {:?}", p);
    assert_eq!(p.density, 0.0);
    assert_eq!(p.velocity.x, 0.0);
    assert!((p.velocity.y + 0.01).abs() < 1e-6, "velocity {:?}", p.velocity);
    assert_eq!(p.position.x, 12.0);
    assert!((p.position.y - 9.999).abs() < 1e-5, "position {:?}", p.position);
}

#[test]
fn test_gpu_matches_cpu_reference() {
    let (device, queue) = require_gpu!();

    // Spacing above the collision radius keeps both backends on the same branches
    let particles = spawn_block(Vec2::new(8.0, 4.0), 4, 3, 1.0, 1.0);
    let config = SphConfig::default();
    // Width 5 leaves padding lanes in the last row
    let params = SimulationParams::new(0.05, 5);

    let mut cpu = SphSolver::new(config.clone(), params, particles.clone()).expect("cpu solver");
    let mut gpu = GpuSph2D::new(&device, &config, params, &particles).expect("gpu sph");

    cpu.run(2);
    gpu.run(&device, &queue, 2);

    let gpu_particles = gpu.read_particles(&device, &queue).expect("readback");
    assert_eq!(gpu_particles.len(), cpu.particles().len());
    for (i, (g, c)) in gpu_particles.iter().zip(cpu.particles()).enumerate() {
        assert!(close(g.density, c.density, 1e-3), "particle {} density {} vs {}", i, g.density, c.density);
        assert!(close(g.position.x, c.position.x, 1e-3), "particle {} x {:?} vs {:?}", i, g, c);
        assert!(close(g.position.y, c.position.y, 1e-3), "particle {} y {:?} vs {:?}", i, g, c);
        assert!(close(g.velocity.x, c.velocity.x, 1e-2), "particle {} vx {:?} vs {:?}", i, g, c);
        assert!(close(g.velocity.y, c.velocity.y, 1e-2), "particle {} vy {:?} vs {:?}", i, g, c);
        assert_eq!(g.mass, c.mass);
    }

    let tension = gpu.read_surface_tension(&device, &queue).expect("tension readback");
    assert_eq!(tension.len(), particles.len());
    assert!(tension.iter().all(|t| t.is_finite() && *t >= 0.0));
}

#[test]
fn test_gpu_buffers_alternate() {
    let (device, queue) = require_gpu!();

    let particles = spawn_block(Vec2::new(5.0, 5.0), 3, 3, 1.0, 1.0);
    let mut sph = GpuSph2D::new(&device, &SphConfig::default(), SimulationParams::new(0.1, 3), &particles)
        .expect("gpu sph");

    assert_eq!(sph.current_index(), 0);
    sph.step(&device, &queue);
    assert_eq!(sph.current_index(), 1);
    sph.run(&device, &queue, 3);
    assert_eq!(sph.current_index(), 0);
    assert_eq!(sph.ticks(), 4);

    // Zero ticks submits nothing
    sph.run(&device, &queue, 0);
    assert_eq!(sph.ticks(), 4);
}

#[test]
fn test_gpu_upload_and_params() {
    let (device, queue) = require_gpu!();

    let particles = spawn_block(Vec2::new(5.0, 5.0), 4, 2, 1.0, 1.0);
    let mut sph = GpuSph2D::new(&device, &SphConfig::default(), SimulationParams::new(0.1, 8), &particles)
        .expect("gpu sph");

    let err = sph.upload_particles(&queue, &particles[..3]).unwrap_err();
    assert!(matches!(
        err,
        GpuError::Sim(SimError::ParticleCountMismatch { expected: 8, found: 3 })
    ));

    let err = sph.set_params(&queue, SimulationParams::new(0.1, 0)).unwrap_err();
    assert!(matches!(err, GpuError::Sim(SimError::ZeroWidth)));
    assert_eq!(sph.params().width, 8);

    sph.set_params(&queue, SimulationParams::new(0.1, 3)).expect("narrower grid");
    assert_eq!(sph.params().width, 3);

    let moved: Vec<Particle> = particles
        .iter()
        .map(|p| Particle::new(p.position + Vec2::new(1.0, 0.0), p.mass))
        .collect();
    sph.upload_particles(&queue, &moved).expect("upload");
    let read = sph.read_particles(&device, &queue).expect("readback");
    assert_eq!(read, moved);

    // Every particle is still advanced with the narrower grid
    sph.step(&device, &queue);
    let stepped = sph.read_particles(&device, &queue).expect("readback");
    for (before, after) in moved.iter().zip(&stepped) {
        assert_ne!(before.velocity, after.velocity);
    }
}

#[test]
fn test_gpu_rejects_empty_particle_set() {
    let (device, _queue) = require_gpu!();

    let result = GpuSph2D::new(&device, &SphConfig::default(), SimulationParams::default(), &[]);
    assert!(matches!(result, Err(GpuError::EmptyParticleSet)));
}

#[test]
fn test_gpu_distance_field_matches_cpu() {
    let (device, queue) = require_gpu!();

    // Whole-unit positions on a unit-scale image: each pixel is either exactly
    // on a particle or at least 1 away from all of them.
    let particles = vec![
        Particle::new(Vec2::new(2.0, 3.0), 1.0),
        Particle::new(Vec2::new(7.0, 1.0), 1.0),
        Particle::new(Vec2::new(12.0, 8.0), 1.0),
    ];
    let field = DistanceField {
        scale: 1.0,
        threshold: 0.5,
        ..DistanceField::new(20, 10)
    };

    let sph = GpuSph2D::new(&device, &SphConfig::default(), SimulationParams::new(0.1, 3), &particles)
        .expect("gpu sph");
    let gpu_field = GpuDistanceField::new(&device, field).expect("distance field");
    let gpu_pixels = gpu_field.render(&device, &queue, &sph).expect("render");
    let cpu_pixels = field.render(&particles);

    assert_eq!(gpu_pixels.len(), 200);
    assert_eq!(gpu_pixels, cpu_pixels);
    let fluid = gpu_pixels.iter().filter(|px| **px == field.fluid_color).count();
    assert_eq!(fluid, particles.len());
}

#[test]
fn test_gpu_distance_field_rejects_zero_size() {
    let (device, _queue) = require_gpu!();

    let result = GpuDistanceField::new(&device, DistanceField::new(0, 10));
    assert!(matches!(result, Err(GpuError::InvalidImageSize { width: 0, height: 10 })));
}

#[test]
fn test_async_particle_readback() {
    let (device, queue) = require_gpu!();

    let particles = spawn_block(Vec2::new(5.0, 5.0), 3, 2, 1.0, 1.0);
    let mut sph = GpuSph2D::new(&device, &SphConfig::default(), SimulationParams::new(0.1, 3), &particles)
        .expect("gpu sph");
    sph.run(&device, &queue, 2);

    let mut readback = ParticleReadback::new(&device, particles.len());
    let mut out = Vec::new();
    assert_eq!(readback.try_read(&mut out), None, "nothing scheduled yet");

    assert!(readback.schedule(&device, &queue, sph.current_buffer(), sph.particle_count()));
    assert!(readback.is_pending());
    assert!(
        !readback.schedule(&device, &queue, sph.current_buffer(), sph.particle_count()),
        "only one readback in flight"
    );

    device.poll(wgpu::Maintain::Wait);
    assert_eq!(readback.try_read(&mut out), Some(particles.len()));
    assert!(!readback.is_pending());
    assert_eq!(out, sph.read_particles(&device, &queue).expect("blocking readback"));
}
