//! Simulation configuration.
//!
//! [`SphConfig`] holds the immutable kernel and physics constants that every
//! phase closes over. [`SimulationParams`] is the small per-tick record the
//! host owns and may change between ticks.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::SimError;
use crate::physics;
use crate::serde_utils::{deserialize_vec2, serialize_vec2};

/// Axis-aligned wall box.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    #[serde(serialize_with = "serialize_vec2", deserialize_with = "deserialize_vec2")]
    pub min: Vec2,
    #[serde(serialize_with = "serialize_vec2", deserialize_with = "deserialize_vec2")]
    pub max: Vec2,
}

impl Bounds {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            min: Vec2::from_array(physics::DOMAIN_MIN),
            max: Vec2::from_array(physics::DOMAIN_MAX),
        }
    }
}

/// Kernel and physics constants.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SphConfig {
    /// Kernel support radius (H).
    pub smoothing_radius: f32,
    /// Pressure is `gas_constant * density`.
    pub gas_constant: f32,
    /// Unused by the proportional pressure model; kept for tuning tools.
    pub rest_density: f32,
    /// Multiplies the summed viscous term once.
    pub viscosity: f32,
    /// Surface tension coefficient.
    pub surface_tension: f32,
    /// Color-field gradient magnitude required for tension to apply.
    pub tension_threshold: f32,
    #[serde(serialize_with = "serialize_vec2", deserialize_with = "deserialize_vec2")]
    pub gravity: Vec2,
    pub collision_radius: f32,
    pub collision_separation: f32,
    pub bounds: Bounds,
}

impl Default for SphConfig {
    fn default() -> Self {
        Self {
            smoothing_radius: physics::SMOOTHING_RADIUS,
            gas_constant: physics::GAS_CONSTANT,
            rest_density: physics::REST_DENSITY,
            viscosity: physics::VISCOSITY,
            surface_tension: physics::SURFACE_TENSION,
            tension_threshold: physics::TENSION_THRESHOLD,
            gravity: Vec2::from_array(physics::GRAVITY),
            collision_radius: physics::COLLISION_RADIUS,
            collision_separation: physics::COLLISION_SEPARATION,
            bounds: Bounds::default(),
        }
    }
}

impl SphConfig {
    pub fn validate(&self) -> Result<(), SimError> {
        if !(self.smoothing_radius > 0.0 && self.smoothing_radius.is_finite()) {
            return Err(SimError::InvalidConfig("smoothing radius must be positive"));
        }
        if !(self.collision_separation > 0.0) {
            return Err(SimError::InvalidConfig("collision separation must be positive"));
        }
        if self.collision_radius < 0.0 {
            return Err(SimError::InvalidConfig("collision radius must not be negative"));
        }
        let size = self.bounds.size();
        if !(size.x > 0.0 && size.y > 0.0) {
            return Err(SimError::InvalidConfig("bounds must have positive extent"));
        }
        Ok(())
    }
}

/// Per-tick parameter record.
///
/// `width` only maps a 2D dispatch coordinate to a flat particle index
/// (`id = row * width + column`).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimulationParams {
    pub time_step: f32,
    pub width: u32,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            time_step: 0.1,
            width: 64,
        }
    }
}

/// 2D lane grid covering a particle set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DispatchGrid {
    pub columns: u32,
    pub rows: u32,
}

impl DispatchGrid {
    pub fn lanes(&self) -> u64 {
        self.columns as u64 * self.rows as u64
    }
}

impl SimulationParams {
    pub fn new(time_step: f32, width: u32) -> Self {
        Self { time_step, width }
    }

    pub fn validate(&self) -> Result<(), SimError> {
        if self.width == 0 {
            return Err(SimError::ZeroWidth);
        }
        if !(self.time_step > 0.0 && self.time_step.is_finite()) {
            return Err(SimError::InvalidTimeStep(self.time_step));
        }
        Ok(())
    }

    /// Lane grid for `particle_count` particles: `width` columns and enough
    /// rows to give every particle exactly one lane.
    pub fn dispatch_grid(&self, particle_count: usize) -> Result<DispatchGrid, SimError> {
        if self.width == 0 {
            return Err(SimError::ZeroWidth);
        }
        let rows = (particle_count as u64).div_ceil(self.width as u64);
        Ok(DispatchGrid {
            columns: self.width,
            rows: rows as u32,
        })
    }

    /// Flat particle index of lane `(row, column)`, or `None` for padding lanes.
    #[inline]
    pub fn lane_index(&self, row: u32, column: u32, particle_count: usize) -> Option<usize> {
        if column >= self.width {
            return None;
        }
        let id = row as usize * self.width as usize + column as usize;
        (id < particle_count).then_some(id)
    }
}
