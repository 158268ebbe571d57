//! 2D SPH fluid step - CPU reference implementation
//!
//! Each tick runs two data-parallel phases over every particle:
//! - density (in place in the current buffer)
//! - forces, integration and collisions (current buffer into the next)
//!
//! followed by a swap of the ping-pong buffers. The `sph2d_gpu` crate runs
//! the same tick in WGSL and uses this crate as its numerical reference.

pub mod config;
pub mod density;
pub mod error;
pub mod forces;
pub mod integrate;
pub mod kernels;
pub mod metrics;
pub mod particle;
pub mod physics;
pub mod scenario;
pub mod serde_utils;
pub mod solver;
pub mod store;
pub mod visualize;

pub use config::{Bounds, DispatchGrid, SimulationParams, SphConfig};
pub use density::{calc_density, density_phase};
pub use error::SimError;
pub use forces::{accumulate_forces, ForceSample};
pub use integrate::{integrate, resolve_particle_collisions, resolve_wall_collisions};
pub use kernels::Kernels;
pub use metrics::FrameMetrics;
pub use particle::{jitter, spawn_block, Particle};
pub use scenario::Scenario;
pub use solver::SphSolver;
pub use store::{ParticleStore, SurfaceDiagnostics};
pub use visualize::DistanceField;

pub use glam::Vec2;
