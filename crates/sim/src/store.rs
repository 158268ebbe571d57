//! Ping-pong particle storage.
//!
//! Two equal-length arrays plus a role flag. During a tick the density phase
//! mutates `current` in place; the force/integration phase reads `current` and
//! writes `next` at the same index. [`ParticleStore::swap`] flips the roles.

use crate::error::SimError;
use crate::particle::Particle;

#[derive(Clone, Debug)]
pub struct ParticleStore {
    buffers: [Vec<Particle>; 2],
    /// Index of the buffer read this tick.
    current: usize,
}

impl ParticleStore {
    /// Allocate both buffers sized to `particles.len()`. The count is fixed
    /// from here on.
    pub fn new(particles: Vec<Particle>) -> Self {
        let next = particles.clone();
        Self {
            buffers: [particles, next],
            current: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.buffers[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffers[0].is_empty()
    }

    /// Which buffer (0 = A, 1 = B) is the read source this tick.
    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current(&self) -> &[Particle] {
        &self.buffers[self.current]
    }

    /// Density phase only: the same buffer is read and written.
    pub fn current_mut(&mut self) -> &mut [Particle] {
        &mut self.buffers[self.current]
    }

    /// Read source and write target of the force/integration phase.
    pub fn split(&mut self) -> (&[Particle], &mut [Particle]) {
        let [a, b] = &mut self.buffers;
        if self.current == 0 {
            (a.as_slice(), b.as_mut_slice())
        } else {
            (b.as_slice(), a.as_mut_slice())
        }
    }

    pub fn swap(&mut self) {
        self.current ^= 1;
    }

    /// Overwrite the current buffer, e.g. after a scenario reload.
    pub fn replace(&mut self, particles: &[Particle]) -> Result<(), SimError> {
        if particles.len() != self.len() {
            return Err(SimError::ParticleCountMismatch {
                expected: self.len(),
                found: particles.len(),
            });
        }
        self.buffers[self.current].copy_from_slice(particles);
        Ok(())
    }
}

/// Per-particle magnitude of the last computed surface-tension force.
#[derive(Clone, Debug, Default)]
pub struct SurfaceDiagnostics {
    tension: Vec<f32>,
}

impl SurfaceDiagnostics {
    pub fn new(len: usize) -> Self {
        Self {
            tension: vec![0.0; len],
        }
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.tension
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.tension
    }

    pub fn max(&self) -> f32 {
        self.tension.iter().copied().fold(0.0, f32::max)
    }
}
