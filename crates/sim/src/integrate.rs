//! Integration and collision resolution for one particle.
//!
//! Semi-implicit Euler, then a single sequential pass over neighbors in
//! index order, then the four walls. Overlaps are not solved to a fixed
//! point: a later push can reintroduce an overlap with an earlier neighbor.

use glam::Vec2;

use crate::config::{Bounds, SimulationParams, SphConfig};
use crate::particle::Particle;

/// `force / density` plus gravity. Zero density yields gravity alone.
#[inline]
pub fn acceleration(force: Vec2, density: f32, gravity: Vec2) -> Vec2 {
    let a = if density != 0.0 { force / density } else { Vec2::ZERO };
    a + gravity
}

/// Push `position` out of every neighbor within the collision radius,
/// reflecting `velocity` about each contact normal.
///
/// Coincident points have no normal and are skipped.
pub fn resolve_particle_collisions(
    index: usize,
    particles: &[Particle],
    position: &mut Vec2,
    velocity: &mut Vec2,
    config: &SphConfig,
) {
    for (j, other) in particles.iter().enumerate() {
        if j == index {
            continue;
        }
        let offset = *position - other.position;
        if offset.length() > config.collision_radius {
            continue;
        }
        let normal = offset.normalize_or_zero();
        if normal == Vec2::ZERO {
            continue;
        }
        *velocity -= 2.0 * velocity.dot(normal) * normal;
        *position = other.position + normal * config.collision_separation;
    }
}

/// Reflect and clamp against the wall box.
pub fn resolve_wall_collisions(position: &mut Vec2, velocity: &mut Vec2, bounds: &Bounds) {
    if position.x < bounds.min.x {
        position.x = bounds.min.x;
        velocity.x = -velocity.x;
    } else if position.x > bounds.max.x {
        position.x = bounds.max.x;
        velocity.x = -velocity.x;
    }

    if position.y < bounds.min.y {
        position.y = bounds.min.y;
        velocity.y = -velocity.y;
    } else if position.y > bounds.max.y {
        position.y = bounds.max.y;
        velocity.y = -velocity.y;
    }
}

/// Advance particle `index` by one tick. The result belongs at the same
/// index of the opposite buffer.
pub fn integrate(
    index: usize,
    particles: &[Particle],
    force: Vec2,
    params: &SimulationParams,
    config: &SphConfig,
) -> Particle {
    let p = particles[index];
    let dt = params.time_step;

    let a = acceleration(force, p.density, config.gravity);
    let mut velocity = p.velocity + a * dt;
    let mut position = p.position + velocity * dt;

    resolve_particle_collisions(index, particles, &mut position, &mut velocity, config);
    resolve_wall_collisions(&mut position, &mut velocity, &config.bounds);

    Particle {
        position,
        velocity,
        mass: p.mass,
        density: p.density,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_isolated_particle_falls_under_gravity() {
        let config = SphConfig::default();
        let params = SimulationParams::new(0.1, 1);
        let particles = vec![Particle::new(Vec2::new(12.0, 10.0), 1.0)];

        let next = integrate(0, &particles, Vec2::ZERO, &params, &config);
        assert_eq!(next.density, 0.0);
        assert!((next.velocity - Vec2::new(0.0, -0.01)).length() < 1e-7);
        assert!((next.position - Vec2::new(12.0, 9.999)).length() < 1e-5);
        assert_eq!(next.mass, 1.0);
    }

    #[test]
    fn test_zero_density_ignores_force() {
        let gravity = Vec2::new(0.0, -0.1);
        assert_eq!(acceleration(Vec2::new(100.0, 5.0), 0.0, gravity), gravity);
        assert_eq!(
            acceleration(Vec2::new(4.0, 2.0), 2.0, gravity),
            Vec2::new(2.0, 1.0) + gravity
        );
    }

    #[test]
    fn test_floor_reflects_and_clamps() {
        let config = SphConfig::default();
        let params = SimulationParams::new(0.1, 1);
        let particles = vec![Particle::new(Vec2::new(12.0, 0.05), 1.0).with_velocity(Vec2::new(0.0, -1.0))];

        let next = integrate(0, &particles, Vec2::ZERO, &params, &config);
        // -1.0 plus one tick of gravity, reflected
        assert!((next.velocity - Vec2::new(0.0, 1.01)).length() < 1e-6);
        assert_eq!(next.position.y, 0.0);
        assert_eq!(next.position.x, 12.0);
    }

    #[test]
    fn test_each_wall_reflects_its_axis() {
        let bounds = Bounds::default();
        let cases = [
            (Vec2::new(-0.5, 5.0), Vec2::new(-2.0, 1.0), Vec2::new(-0.1, 5.0), Vec2::new(2.0, 1.0)),
            (Vec2::new(25.3, 5.0), Vec2::new(3.0, 1.0), Vec2::new(25.0, 5.0), Vec2::new(-3.0, 1.0)),
            (Vec2::new(4.0, -1.0), Vec2::new(1.0, -4.0), Vec2::new(4.0, 0.0), Vec2::new(1.0, 4.0)),
            (Vec2::new(4.0, 20.5), Vec2::new(1.0, 4.0), Vec2::new(4.0, 20.0), Vec2::new(1.0, -4.0)),
        ];
        for (mut position, mut velocity, want_position, want_velocity) in cases {
            resolve_wall_collisions(&mut position, &mut velocity, &bounds);
            assert_eq!(position, want_position);
            assert_eq!(velocity, want_velocity);
        }
    }

    #[test]
    fn test_inside_walls_untouched() {
        let bounds = Bounds::default();
        let mut position = Vec2::new(3.0, 3.0);
        let mut velocity = Vec2::new(-1.0, -1.0);
        resolve_wall_collisions(&mut position, &mut velocity, &bounds);
        assert_eq!(position, Vec2::new(3.0, 3.0));
        assert_eq!(velocity, Vec2::new(-1.0, -1.0));
    }

    #[test]
    fn test_collision_pushes_to_separation_and_reflects() {
        let config = SphConfig::default();
        let particles = vec![
            Particle::new(Vec2::new(10.0, 10.0), 1.0),
            Particle::new(Vec2::new(10.1, 10.0), 1.0),
        ];
        let mut position = Vec2::new(10.0, 10.0);
        let mut velocity = Vec2::new(1.0, 0.5);
        resolve_particle_collisions(0, &particles, &mut position, &mut velocity, &config);

        assert!((position.distance(particles[1].position) - 0.4).abs() < 1e-5);
        assert!((position - Vec2::new(9.7, 10.0)).length() < 1e-5);
        assert!((velocity - Vec2::new(-1.0, 0.5)).length() < 1e-6);
    }

    #[test]
    fn test_collision_outside_radius_ignored() {
        let config = SphConfig::default();
        let particles = vec![
            Particle::new(Vec2::new(10.0, 10.0), 1.0),
            Particle::new(Vec2::new(10.25, 10.0), 1.0),
        ];
        let mut position = particles[0].position;
        let mut velocity = Vec2::new(1.0, 0.0);
        resolve_particle_collisions(0, &particles, &mut position, &mut velocity, &config);
        assert_eq!(position, particles[0].position);
        assert_eq!(velocity, Vec2::new(1.0, 0.0));
    }

    #[test]
    fn test_coincident_neighbor_is_skipped() {
        let config = SphConfig::default();
        let particles = vec![
            Particle::new(Vec2::new(5.0, 5.0), 1.0),
            Particle::new(Vec2::new(5.0, 5.0), 1.0),
        ];
        let mut position = particles[0].position;
        let mut velocity = Vec2::new(0.3, -0.2);
        resolve_particle_collisions(0, &particles, &mut position, &mut velocity, &config);
        assert_eq!(position, Vec2::new(5.0, 5.0));
        assert_eq!(velocity, Vec2::new(0.3, -0.2));
    }

    #[test]
    fn test_collisions_resolve_in_index_order() {
        // Neighbor 2 is only reached because neighbor 1 pushed us next to it
        let config = SphConfig::default();
        let particles = vec![
            Particle::new(Vec2::new(10.0, 10.0), 1.0),
            Particle::new(Vec2::new(9.9, 10.0), 1.0),
            Particle::new(Vec2::new(10.3, 10.1), 1.0),
        ];
        let mut position = particles[0].position;
        let mut velocity = Vec2::new(-1.0, 1.0);
        resolve_particle_collisions(0, &particles, &mut position, &mut velocity, &config);

        // Neighbor 1 moves us to (10.3, 10.0), neighbor 2 then to (10.3, 9.7)
        assert!((position - Vec2::new(10.3, 9.7)).length() < 1e-4);
        assert!((velocity - Vec2::new(1.0, -1.0)).length() < 1e-4);
    }
}
