//! Smoothing kernels with compact support `h`.
//!
//! ```text
//! W_poly6(r)        = 315 / (64 π h⁹) (h² - r²)³
//! ∇W_spiky(r)       = -45 / (π h⁶) (h - r)² r̂
//! ∇²W_viscosity(r)  =  45 / (π h⁶) (h - r)
//! ```
//!
//! All three vanish for `r >= h`.

use std::f64::consts::PI;

/// Precomputed kernel coefficients for one support radius.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Kernels {
    h: f64,
    h2: f64,
    poly6: f64,
    spiky: f64,
    viscosity: f64,
}

impl Kernels {
    /// Coefficients for support radius `h`.
    pub fn new(h: f64) -> Self {
        Self {
            h,
            h2: h * h,
            poly6: 315.0 / (64.0 * PI * h.powi(9)),
            spiky: -45.0 / (PI * h.powi(6)),
            viscosity: 45.0 / (PI * h.powi(6)),
        }
    }

    /// Support radius.
    #[inline]
    pub fn radius(&self) -> f64 {
        self.h
    }

    /// Squared support radius.
    #[inline]
    pub fn radius_squared(&self) -> f64 {
        self.h2
    }

    /// Density kernel from the squared distance.
    #[inline]
    pub fn poly6(&self, r2: f64) -> f64 {
        if r2 >= self.h2 {
            return 0.0;
        }
        let d = self.h2 - r2;
        self.poly6 * d * d * d
    }

    /// Pressure-kernel gradient for the separation `r_vec = x_i - x_j`
    /// of length `r > 0`.
    #[inline]
    pub fn spiky_gradient(&self, r_vec: [f64; 3], r: f64) -> [f64; 3] {
        if r >= self.h || r <= 0.0 {
            return [0.0; 3];
        }
        let d = self.h - r;
        let s = self.spiky * d * d / r;
        [s * r_vec[0], s * r_vec[1], s * r_vec[2]]
    }

    /// Viscosity-kernel Laplacian at distance `r`.
    #[inline]
    pub fn viscosity_laplacian(&self, r: f64) -> f64 {
        if r >= self.h {
            return 0.0;
        }
        self.viscosity * (self.h - r)
    }
}
