//! Force accumulation: pressure, viscosity and surface tension.
//!
//! Reads densities written by the density phase of the same tick. Neighbors
//! with zero density contribute nothing to any term.

use glam::Vec2;

use crate::config::SphConfig;
use crate::kernels::Kernels;
use crate::particle::Particle;

/// Per-particle force terms for one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ForceSample {
    pub pressure: Vec2,
    /// Viscous sum before the viscosity coefficient is applied.
    pub viscosity: Vec2,
    pub tension: Vec2,
    /// Magnitude of `tension`; zero when the color gradient is below threshold.
    pub tension_magnitude: f32,
}

impl ForceSample {
    /// `pressure + viscosity_coefficient * viscosity + tension`.
    #[inline]
    pub fn total(&self, viscosity_coefficient: f32) -> Vec2 {
        self.pressure + viscosity_coefficient * self.viscosity + self.tension
    }
}

/// Proportional equation of state.
#[inline]
pub fn pressure(density: f32, config: &SphConfig) -> f32 {
    config.gas_constant * density
}

pub fn accumulate_forces(
    index: usize,
    particles: &[Particle],
    kernels: &Kernels,
    config: &SphConfig,
) -> ForceSample {
    let p = &particles[index];

    let mut pressure_force = Vec2::ZERO;
    let mut viscosity = Vec2::ZERO;
    let mut color_grad = Vec2::ZERO;
    let mut color_lap = 0.0f32;

    for (j, other) in particles.iter().enumerate() {
        if j == index || other.density == 0.0 {
            continue;
        }

        let toward = (other.position - p.position).normalize_or_zero();
        let volume = other.mass / other.density;

        pressure_force += volume
            * pressure(other.density, config)
            * kernels.grad_spiky(p.position, other.position)
            * toward;

        viscosity += (other.velocity - p.velocity) / other.density
            * kernels.viscosity_lap(p.position, other.position);

        // Gradient of the color field w.r.t. x_i points toward the fluid
        color_grad -= volume * kernels.grad_poly6(p.position, other.position) * toward;
        color_lap += volume * kernels.lap_poly6(p.position, other.position);
    }

    let tension = if color_grad.length() > config.tension_threshold {
        -config.surface_tension * color_lap * color_grad.normalize_or_zero()
    } else {
        Vec2::ZERO
    };

    ForceSample {
        pressure: pressure_force,
        viscosity,
        tension,
        tension_magnitude: tension.length(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::density::density_phase;

    fn pair(distance: f32) -> Vec<Particle> {
        vec![
            Particle::new(Vec2::new(10.0, 10.0), 1.0),
            Particle::new(Vec2::new(10.0 + distance, 10.0), 1.0),
        ]
    }

    #[test]
    fn test_pair_pressure_is_mutually_repulsive() {
        let config = SphConfig::default();
        let kernels = Kernels::new(config.smoothing_radius);
        let mut particles = pair(1.0);
        density_phase(&mut particles, &kernels);
        assert!(particles[0].density > 0.0 && particles[1].density > 0.0);

        let f0 = accumulate_forces(0, &particles, &kernels, &config);
        let f1 = accumulate_forces(1, &particles, &kernels, &config);

        assert!(f0.pressure.x < 0.0, "left particle pushed left: {:?}", f0.pressure);
        assert!(f1.pressure.x > 0.0, "right particle pushed right: {:?}", f1.pressure);
        assert!((f0.pressure.x + f1.pressure.x).abs() < 1e-6);
        assert_eq!(f0.pressure.y, 0.0);
    }

    #[test]
    fn test_zero_density_neighbors_contribute_nothing() {
        let config = SphConfig::default();
        let kernels = Kernels::new(config.smoothing_radius);
        let particles = pair(1.0);
        let sample = accumulate_forces(0, &particles, &kernels, &config);
        assert_eq!(sample, ForceSample::default());
    }

    #[test]
    fn test_viscosity_drags_toward_neighbor_velocity() {
        let config = SphConfig::default();
        let kernels = Kernels::new(config.smoothing_radius);
        let mut particles = pair(1.0);
        particles[1].velocity = Vec2::new(0.0, 2.0);
        density_phase(&mut particles, &kernels);

        let f0 = accumulate_forces(0, &particles, &kernels, &config);
        assert!(f0.viscosity.y > 0.0);
        assert_eq!(f0.viscosity.x, 0.0);

        let total = f0.total(config.viscosity);
        let expected = f0.pressure + 0.7 * f0.viscosity + f0.tension;
        assert_eq!(total, expected);
    }

    #[test]
    fn test_tension_below_threshold_is_zero() {
        let config = SphConfig::default();
        let kernels = Kernels::new(config.smoothing_radius);
        let mut particles = pair(1.0);
        density_phase(&mut particles, &kernels);
        let sample = accumulate_forces(0, &particles, &kernels, &config);
        assert_eq!(sample.tension, Vec2::ZERO);
        assert_eq!(sample.tension_magnitude, 0.0);
    }

    #[test]
    fn test_tension_applies_at_free_surface() {
        // Lower threshold so a small cluster edge crosses it
        let config = SphConfig {
            tension_threshold: 1e-4,
            ..SphConfig::default()
        };
        let kernels = Kernels::new(config.smoothing_radius);
        let mut particles = crate::particle::spawn_block(Vec2::new(5.0, 5.0), 5, 5, 0.5, 1.0);
        density_phase(&mut particles, &kernels);

        let corner = accumulate_forces(0, &particles, &kernels, &config);
        assert!(corner.tension_magnitude > 0.0);
        assert!((corner.tension.length() - corner.tension_magnitude).abs() < 1e-6);
    }

    #[test]
    fn test_pressure_is_proportional_to_density() {
        let config = SphConfig {
            gas_constant: 2.5,
            ..SphConfig::default()
        };
        assert_eq!(pressure(4.0, &config), 10.0);
        assert_eq!(pressure(0.0, &config), 0.0);
    }
}
