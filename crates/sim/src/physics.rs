//! Default physics constants for the 2D SPH step.
//!
//! These seed [`SphConfig::default`](crate::SphConfig). Simulation code reads the
//! values from a config instance, never from these constants directly, so a
//! tuned config can replace any of them.

/// Smoothing kernel support radius (H).
pub const SMOOTHING_RADIUS: f32 = 6.0;

/// Proportional pressure model constant: `pressure = k * density`.
pub const GAS_CONSTANT: f32 = 1.0;

/// Reference density. Carried in the config but not used by the
/// proportional pressure model.
pub const REST_DENSITY: f32 = 1.0;

/// Viscosity coefficient, applied once to the summed viscous term.
pub const VISCOSITY: f32 = 0.7;

/// Surface tension coefficient (sigma).
pub const SURFACE_TENSION: f32 = 1.0;

/// Color-field gradient magnitude below which no tension is applied.
pub const TENSION_THRESHOLD: f32 = 0.3;

/// Gravity acceleration, domain units per second squared.
pub const GRAVITY: [f32; 2] = [0.0, -0.1];

/// Neighbor distance at or below which a collision is resolved.
pub const COLLISION_RADIUS: f32 = 0.2;

/// Separation a colliding particle is pushed out to.
pub const COLLISION_SEPARATION: f32 = 0.4;

/// Lower-left corner of the wall box.
pub const DOMAIN_MIN: [f32; 2] = [-0.1, 0.0];

/// Upper-right corner of the wall box.
pub const DOMAIN_MAX: [f32; 2] = [25.0, 20.0];
