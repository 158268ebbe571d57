use crate::particle::Particle;

/// Per-frame diagnostics shared by the CPU and GPU solvers.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameMetrics {
    pub particle_count: u32,
    pub avg_density: f32,
    pub min_density: f32,
    pub max_density: f32,
    pub max_speed: f32,
    pub kinetic_energy: f32,
    /// Y position diagnostics (to detect collapse)
    pub min_y: f32,
    pub max_y: f32,
    pub avg_y: f32,
    pub max_surface_tension: f32,
}

impl FrameMetrics {
    /// `tension` may be shorter than `particles` (or empty) when no force
    /// pass has run yet.
    pub fn compute(particles: &[Particle], tension: &[f32]) -> Self {
        let n = particles.len();
        if n == 0 {
            return Self::default();
        }

        let mut sum_density = 0.0f32;
        let mut min_density = f32::MAX;
        let mut max_density = f32::MIN;
        let mut max_speed = 0.0f32;
        let mut kinetic_energy = 0.0f32;
        let mut min_y = f32::MAX;
        let mut max_y = f32::MIN;
        let mut sum_y = 0.0f32;

        for p in particles {
            sum_density += p.density;
            min_density = min_density.min(p.density);
            max_density = max_density.max(p.density);
            max_speed = max_speed.max(p.velocity.length());
            kinetic_energy += p.kinetic_energy();
            min_y = min_y.min(p.position.y);
            max_y = max_y.max(p.position.y);
            sum_y += p.position.y;
        }

        let max_surface_tension = tension.iter().copied().fold(0.0, f32::max);

        Self {
            particle_count: n as u32,
            avg_density: sum_density / n as f32,
            min_density,
            max_density,
            max_speed,
            kinetic_energy,
            min_y,
            max_y,
            avg_y: sum_y / n as f32,
            max_surface_tension,
        }
    }

    /// Y spread = max_y - min_y
    pub fn y_spread(&self) -> f32 {
        self.max_y - self.min_y
    }
}

impl std::fmt::Display for FrameMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "n={} rho avg={:.4} [{:.4}, {:.4}] |v|max={:.4} KE={:.4} y=[{:.2}, {:.2}] avg {:.2} tension max={:.4}",
            self.particle_count,
            self.avg_density,
            self.min_density,
            self.max_density,
            self.max_speed,
            self.kinetic_energy,
            self.min_y,
            self.max_y,
            self.avg_y,
            self.max_surface_tension
        )
    }
}
