//! SPH particle record and spawning helpers.
//!
//! The record layout is shared with the GPU: position (2 x f32), velocity
//! (2 x f32), mass, density. 24 bytes, no padding.

use bytemuck::{Pod, Zeroable};
use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::serde_utils::{deserialize_vec2, serialize_vec2};

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Particle {
    #[serde(serialize_with = "serialize_vec2", deserialize_with = "deserialize_vec2")]
    pub position: Vec2,
    #[serde(serialize_with = "serialize_vec2", deserialize_with = "deserialize_vec2")]
    pub velocity: Vec2,
    pub mass: f32,
    /// Recomputed every tick by the density phase; stale until it runs.
    #[serde(default)]
    pub density: f32,
}

impl Particle {
    pub fn new(position: Vec2, mass: f32) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            mass,
            density: 0.0,
        }
    }

    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self
    }

    #[inline]
    pub fn kinetic_energy(&self) -> f32 {
        0.5 * self.mass * self.velocity.length_squared()
    }
}

/// Rectangular block of `columns x rows` resting particles, row-major from
/// `origin` upward and rightward.
pub fn spawn_block(origin: Vec2, columns: usize, rows: usize, spacing: f32, mass: f32) -> Vec<Particle> {
    let mut particles = Vec::with_capacity(columns * rows);
    for row in 0..rows {
        for column in 0..columns {
            let position = origin + Vec2::new(column as f32 * spacing, row as f32 * spacing);
            particles.push(Particle::new(position, mass));
        }
    }
    particles
}

/// Offset every particle by a uniform random amount in `[-amount/2, amount/2]`
/// per axis. Breaks the lattice symmetry of [`spawn_block`].
pub fn jitter<R: Rng>(particles: &mut [Particle], amount: f32, rng: &mut R) {
    if amount <= 0.0 {
        return;
    }
    for p in particles.iter_mut() {
        p.position += Vec2::new(
            (rng.gen::<f32>() - 0.5) * amount,
            (rng.gen::<f32>() - 0.5) * amount,
        );
    }
}
