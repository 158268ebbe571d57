//! Density phase.

use rayon::prelude::*;

use crate::kernels::Kernels;
use crate::particle::Particle;

/// `sum over j != i of mass_j * poly6(x_i, x_j)`.
///
/// Self is skipped by index, not by relying on poly6(0) == 0.
pub fn calc_density(index: usize, particles: &[Particle], kernels: &Kernels) -> f32 {
    let position = particles[index].position;
    particles
        .iter()
        .enumerate()
        .filter(|&(j, _)| j != index)
        .map(|(_, other)| other.mass * kernels.poly6(position, other.position))
        .sum()
}

/// Recompute every particle's density in place.
///
/// All lanes read positions and masses only, so evaluating every lane
/// against an unmodified view and writing afterwards gives the same result
/// as any concurrent schedule.
pub fn density_phase(particles: &mut [Particle], kernels: &Kernels) {
    let snapshot: &[Particle] = particles;
    let densities: Vec<f32> = (0..snapshot.len())
        .into_par_iter()
        .map(|i| calc_density(i, snapshot, kernels))
        .collect();

    particles
        .par_iter_mut()
        .zip(densities.par_iter())
        .for_each(|(p, &density)| p.density = density);
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    #[test]
    fn test_isolated_particle_has_zero_density() {
        let kernels = Kernels::new(6.0);
        let particles = vec![
            Particle::new(Vec2::new(1.0, 1.0), 1.0),
            Particle::new(Vec2::new(20.0, 15.0), 1.0),
        ];
        assert_eq!(calc_density(0, &particles, &kernels), 0.0);
        assert_eq!(calc_density(1, &particles, &kernels), 0.0);
    }

    #[test]
    fn test_single_particle_has_zero_density() {
        let kernels = Kernels::new(6.0);
        let mut particles = vec![Particle::new(Vec2::new(12.0, 10.0), 1.0)];
        density_phase(&mut particles, &kernels);
        assert_eq!(particles[0].density, 0.0);
    }

    #[test]
    fn test_equal_mass_pair_is_symmetric() {
        let kernels = Kernels::new(6.0);
        let particles = vec![
            Particle::new(Vec2::new(3.0, 4.0), 2.0),
            Particle::new(Vec2::new(4.5, 3.2), 2.0),
        ];
        let rho0 = calc_density(0, &particles, &kernels);
        let rho1 = calc_density(1, &particles, &kernels);
        assert!(rho0 > 0.0);
        assert_eq!(rho0, rho1);
        assert_eq!(rho0, 2.0 * kernels.poly6(particles[0].position, particles[1].position));
    }

    #[test]
    fn test_density_weights_by_neighbor_mass() {
        let kernels = Kernels::new(6.0);
        let particles = vec![
            Particle::new(Vec2::new(5.0, 5.0), 1.0),
            Particle::new(Vec2::new(6.0, 5.0), 3.0),
        ];
        let w = kernels.poly6(particles[0].position, particles[1].position);
        assert_eq!(calc_density(0, &particles, &kernels), 3.0 * w);
        assert_eq!(calc_density(1, &particles, &kernels), 1.0 * w);
    }

    #[test]
    fn test_density_phase_is_idempotent() {
        let kernels = Kernels::new(6.0);
        let mut particles = crate::particle::spawn_block(Vec2::new(2.0, 2.0), 6, 5, 0.5, 1.0);
        density_phase(&mut particles, &kernels);
        let first: Vec<f32> = particles.iter().map(|p| p.density).collect();
        density_phase(&mut particles, &kernels);
        let second: Vec<f32> = particles.iter().map(|p| p.density).collect();
        assert_eq!(first, second);
        assert!(first.iter().all(|&rho| rho > 0.0));
    }
}
