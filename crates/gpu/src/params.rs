//! GPU uniform records for the SPH and distance-field shaders.
//!
//! These are `#[repr(C)]` structs uploaded to uniform buffers. Field order
//! and padding match the WGSL declarations exactly.

use bytemuck::{Pod, Zeroable};
use sph2d::{DistanceField, Kernels, SimulationParams, SphConfig};

/// Per-tick parameters (16 bytes).
///
/// `width` maps a dispatch coordinate to `id = row * width + column`.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct GpuSimParams {
    pub time_step: f32,
    pub width: u32,
    pub _pad0: u32,
    pub _pad1: u32,
}

impl From<SimulationParams> for GpuSimParams {
    fn from(params: SimulationParams) -> Self {
        Self {
            time_step: params.time_step,
            width: params.width,
            _pad0: 0,
            _pad1: 0,
        }
    }
}

/// Kernel and physics constants (80 bytes).
///
/// Scalars only, so the uniform layout needs no vector alignment padding.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct SphConstants {
    pub h: f32,
    pub gas_constant: f32,
    pub rest_density: f32,
    pub viscosity: f32,
    pub surface_tension: f32,
    pub tension_threshold: f32,
    pub collision_radius: f32,
    pub collision_separation: f32,
    pub gravity_x: f32,
    pub gravity_y: f32,
    pub bounds_min_x: f32,
    pub bounds_min_y: f32,
    pub bounds_max_x: f32,
    pub bounds_max_y: f32,
    pub poly6_coef: f32,
    pub grad_poly6_coef: f32,
    pub lap_poly6_coef: f32,
    pub spiky_coef: f32,
    pub grad_spiky_coef: f32,
    pub visc_lap_coef: f32,
}

impl SphConstants {
    pub fn new(config: &SphConfig) -> Self {
        let kernels = Kernels::new(config.smoothing_radius);
        let [poly6, grad_poly6, lap_poly6, spiky, grad_spiky, visc_lap] = kernels.coefficients();

        Self {
            h: config.smoothing_radius,
            gas_constant: config.gas_constant,
            rest_density: config.rest_density,
            viscosity: config.viscosity,
            surface_tension: config.surface_tension,
            tension_threshold: config.tension_threshold,
            collision_radius: config.collision_radius,
            collision_separation: config.collision_separation,
            gravity_x: config.gravity.x,
            gravity_y: config.gravity.y,
            bounds_min_x: config.bounds.min.x,
            bounds_min_y: config.bounds.min.y,
            bounds_max_x: config.bounds.max.x,
            bounds_max_y: config.bounds.max.y,
            poly6_coef: poly6,
            grad_poly6_coef: grad_poly6,
            lap_poly6_coef: lap_poly6,
            spiky_coef: spiky,
            grad_spiky_coef: grad_spiky,
            visc_lap_coef: visc_lap,
        }
    }
}

/// Distance-field pass parameters (48 bytes). Colors are normalized RGBA.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub(crate) struct FieldParams {
    pub width: u32,
    pub height: u32,
    pub scale: f32,
    pub threshold: f32,
    pub fluid_color: [f32; 4],
    pub background_color: [f32; 4],
}

fn unorm(color: [u8; 4]) -> [f32; 4] {
    color.map(|c| c as f32 / 255.0)
}

impl From<&DistanceField> for FieldParams {
    fn from(field: &DistanceField) -> Self {
        Self {
            width: field.width,
            height: field.height,
            scale: field.scale,
            threshold: field.threshold,
            fluid_color: unorm(field.fluid_color),
            background_color: unorm(field.background_color),
        }
    }
}
