//! Nearest-particle distance field rendered to an RGBA image.
//!
//! Pixel `(col, row)` samples the domain point
//! `(col * scale, (height - 1 - row) * scale)`, so row 0 is the top of the
//! domain. A pixel is fluid when its nearest particle is closer than
//! `threshold`.

use glam::Vec2;
use rayon::prelude::*;

use crate::particle::Particle;

pub const DEFAULT_SCALE: f32 = 0.05;
pub const DEFAULT_THRESHOLD: f32 = 0.5;
pub const FLUID_COLOR: [u8; 4] = [40, 110, 230, 255];
pub const BACKGROUND_COLOR: [u8; 4] = [12, 12, 16, 255];

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DistanceField {
    pub width: u32,
    pub height: u32,
    /// Domain units per pixel.
    pub scale: f32,
    pub threshold: f32,
    pub fluid_color: [u8; 4],
    pub background_color: [u8; 4],
}

impl DistanceField {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            scale: DEFAULT_SCALE,
            threshold: DEFAULT_THRESHOLD,
            fluid_color: FLUID_COLOR,
            background_color: BACKGROUND_COLOR,
        }
    }

    /// Domain point sampled by a pixel.
    #[inline]
    pub fn sample_point(&self, column: u32, row: u32) -> Vec2 {
        let flipped = self.height.saturating_sub(1).saturating_sub(row);
        Vec2::new(column as f32 * self.scale, flipped as f32 * self.scale)
    }

    /// Infinite when there are no particles.
    pub fn nearest_distance(point: Vec2, particles: &[Particle]) -> f32 {
        particles
            .iter()
            .map(|p| p.position.distance(point))
            .fold(f32::INFINITY, f32::min)
    }

    /// Row-major RGBA pixels, `width * height` entries.
    pub fn render(&self, particles: &[Particle]) -> Vec<[u8; 4]> {
        let width = self.width as usize;
        let mut pixels = vec![self.background_color; width * self.height as usize];
        if width == 0 {
            return pixels;
        }

        pixels
            .par_chunks_mut(width)
            .enumerate()
            .for_each(|(row, line)| {
                for (column, pixel) in line.iter_mut().enumerate() {
                    let point = self.sample_point(column as u32, row as u32);
                    if Self::nearest_distance(point, particles) < self.threshold {
                        *pixel = self.fluid_color;
                    }
                }
            });
        pixels
    }
}

impl Default for DistanceField {
    /// 500x400 at the default scale covers the default wall box.
    fn default() -> Self {
        Self::new(500, 400)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_zero_is_top_of_domain() {
        let field = DistanceField::new(10, 10);
        assert_eq!(field.sample_point(0, 9), Vec2::ZERO);
        assert_eq!(field.sample_point(0, 0), Vec2::new(0.0, 9.0 * DEFAULT_SCALE));
        assert_eq!(field.sample_point(4, 9), Vec2::new(4.0 * DEFAULT_SCALE, 0.0));
    }

    #[test]
    fn test_two_tone_mapping() {
        let field = DistanceField {
            scale: 1.0,
            ..DistanceField::new(4, 4)
        };
        // Particle at domain (1, 1) = pixel (col 1, row 2)
        let particles = [Particle::new(Vec2::new(1.0, 1.0), 1.0)];
        let image = field.render(&particles);
        assert_eq!(image.len(), 16);
        for (i, pixel) in image.iter().enumerate() {
            let (row, col) = (i / 4, i % 4);
            if (row, col) == (2, 1) {
                assert_eq!(*pixel, FLUID_COLOR);
            } else {
                // Every other pixel center is at least 1.0 away
                assert_eq!(*pixel, BACKGROUND_COLOR, "pixel ({}, {})", row, col);
            }
        }
    }

    #[test]
    fn test_no_particles_is_all_background() {
        let field = DistanceField::new(8, 3);
        let image = field.render(&[]);
        assert!(image.iter().all(|&p| p == BACKGROUND_COLOR));
    }
}
