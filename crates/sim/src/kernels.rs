//! 2D SPH smoothing kernels with compact support radius H.
//!
//! Every kernel takes two points and returns exactly 0 when the distance is
//! outside `(0, H]`. The lower cutoff removes the r = 0 singularity of the
//! gradient forms; the derivative is not continuous at r = H.

use glam::Vec2;
use std::f32::consts::PI;

/// Kernel set for a fixed support radius, with precomputed 2D normalization
/// coefficients.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Kernels {
    h: f32,
    h2: f32,
    poly6_coef: f32,      // 4 / (pi h^8)
    grad_poly6_coef: f32, // -24 / (pi h^8)
    lap_poly6_coef: f32,  // -48 / (pi h^8)
    spiky_coef: f32,      // 10 / (pi h^5)
    grad_spiky_coef: f32, // -30 / (pi h^5)
    visc_lap_coef: f32,   // 40 / (pi h^5)
}

impl Kernels {
    pub fn new(h: f32) -> Self {
        let h2 = h * h;
        let h5 = h2 * h2 * h;
        let h8 = h5 * h2 * h;

        Self {
            h,
            h2,
            poly6_coef: 4.0 / (PI * h8),
            grad_poly6_coef: -24.0 / (PI * h8),
            lap_poly6_coef: -48.0 / (PI * h8),
            spiky_coef: 10.0 / (PI * h5),
            grad_spiky_coef: -30.0 / (PI * h5),
            visc_lap_coef: 40.0 / (PI * h5),
        }
    }

    #[inline]
    pub fn support_radius(&self) -> f32 {
        self.h
    }

    /// Coefficients in shader upload order: poly6, grad poly6, lap poly6,
    /// spiky, grad spiky, viscosity laplacian.
    pub fn coefficients(&self) -> [f32; 6] {
        [
            self.poly6_coef,
            self.grad_poly6_coef,
            self.lap_poly6_coef,
            self.spiky_coef,
            self.grad_spiky_coef,
            self.visc_lap_coef,
        ]
    }

    /// Distance if it lies inside the support, `None` otherwise.
    #[inline]
    fn support(&self, a: Vec2, b: Vec2) -> Option<f32> {
        let r = a.distance(b);
        (r > 0.0 && r <= self.h).then_some(r)
    }

    /// Density kernel.
    #[inline]
    pub fn poly6(&self, a: Vec2, b: Vec2) -> f32 {
        self.support(a, b).map_or(0.0, |r| {
            let d = self.h2 - r * r;
            self.poly6_coef * d * d * d
        })
    }

    /// Signed radial derivative of poly6 (dW/dr, never positive).
    #[inline]
    pub fn grad_poly6(&self, a: Vec2, b: Vec2) -> f32 {
        self.support(a, b).map_or(0.0, |r| {
            let d = self.h2 - r * r;
            self.grad_poly6_coef * r * d * d
        })
    }

    /// 2D Laplacian of poly6, `W'' + W'/r`. Changes sign at r = H / sqrt(3).
    #[inline]
    pub fn lap_poly6(&self, a: Vec2, b: Vec2) -> f32 {
        self.support(a, b).map_or(0.0, |r| {
            let r2 = r * r;
            self.lap_poly6_coef * (self.h2 - r2) * (self.h2 - 3.0 * r2)
        })
    }

    #[inline]
    pub fn spiky(&self, a: Vec2, b: Vec2) -> f32 {
        self.support(a, b).map_or(0.0, |r| {
            let d = self.h - r;
            self.spiky_coef * d * d * d
        })
    }

    /// Signed radial derivative of spiky (dW/dr, never positive).
    #[inline]
    pub fn grad_spiky(&self, a: Vec2, b: Vec2) -> f32 {
        self.support(a, b).map_or(0.0, |r| {
            let d = self.h - r;
            self.grad_spiky_coef * d * d
        })
    }

    #[inline]
    pub fn viscosity_lap(&self, a: Vec2, b: Vec2) -> f32 {
        self.support(a, b)
            .map_or(0.0, |r| self.visc_lap_coef * (self.h - r))
    }
}
