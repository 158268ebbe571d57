//! CPU tick driver.
//!
//! Runs the two phases as separate rayon passes. The end of the density pass
//! is the phase boundary: every density is written before any lane of the
//! force pass starts reading them.

use rayon::prelude::*;

use crate::config::{SimulationParams, SphConfig};
use crate::density::density_phase;
use crate::error::SimError;
use crate::forces::accumulate_forces;
use crate::integrate::integrate;
use crate::kernels::Kernels;
use crate::metrics::FrameMetrics;
use crate::particle::Particle;
use crate::store::{ParticleStore, SurfaceDiagnostics};

pub struct SphSolver {
    config: SphConfig,
    kernels: Kernels,
    params: SimulationParams,
    store: ParticleStore,
    diagnostics: SurfaceDiagnostics,
    tick: u64,
}

impl SphSolver {
    pub fn new(
        config: SphConfig,
        params: SimulationParams,
        particles: Vec<Particle>,
    ) -> Result<Self, SimError> {
        config.validate()?;
        params.validate()?;

        let kernels = Kernels::new(config.smoothing_radius);
        let diagnostics = SurfaceDiagnostics::new(particles.len());
        log::info!(
            "CPU SPH solver: {} particles, h={}, dt={}",
            particles.len(),
            config.smoothing_radius,
            params.time_step
        );

        Ok(Self {
            config,
            kernels,
            params,
            store: ParticleStore::new(particles),
            diagnostics,
            tick: 0,
        })
    }

    /// Phase 1: recompute densities in place in the current buffer.
    pub fn density_pass(&mut self) {
        density_phase(self.store.current_mut(), &self.kernels);
    }

    /// Phase 2: forces, integration and collisions from the current buffer
    /// into the next one. Does not swap.
    pub fn force_pass(&mut self) {
        let kernels = &self.kernels;
        let config = &self.config;
        let params = &self.params;
        let (input, output) = self.store.split();

        output
            .par_iter_mut()
            .zip(self.diagnostics.as_mut_slice().par_iter_mut())
            .enumerate()
            .for_each(|(i, (out, tension))| {
                let forces = accumulate_forces(i, input, kernels, config);
                *tension = forces.tension_magnitude;
                *out = integrate(i, input, forces.total(config.viscosity), params, config);
            });
    }

    /// One full tick: density, barrier, forces + integration, swap.
    pub fn step(&mut self) {
        if self.store.is_empty() {
            return;
        }
        self.density_pass();
        self.force_pass();
        self.store.swap();
        self.tick += 1;
        log::debug!("CPU tick {} complete", self.tick);
    }

    pub fn run(&mut self, ticks: usize) {
        for _ in 0..ticks {
            self.step();
        }
    }

    pub fn particles(&self) -> &[Particle] {
        self.store.current()
    }

    pub fn store(&self) -> &ParticleStore {
        &self.store
    }

    pub fn surface_tension(&self) -> &[f32] {
        self.diagnostics.as_slice()
    }

    pub fn config(&self) -> &SphConfig {
        &self.config
    }

    pub fn kernels(&self) -> &Kernels {
        &self.kernels
    }

    pub fn params(&self) -> SimulationParams {
        self.params
    }

    /// Takes effect from the next tick.
    pub fn set_params(&mut self, params: SimulationParams) -> Result<(), SimError> {
        params.validate()?;
        self.params = params;
        Ok(())
    }

    /// Overwrite particle state; the count must not change.
    pub fn upload_particles(&mut self, particles: &[Particle]) -> Result<(), SimError> {
        self.store.replace(particles)
    }

    pub fn ticks(&self) -> u64 {
        self.tick
    }

    pub fn metrics(&self) -> FrameMetrics {
        FrameMetrics::compute(self.particles(), self.surface_tension())
    }
}
