//! Standard two-equation k-ε turbulence closure on a uniform grid.
//!
//! The model keeps turbulent kinetic energy `k` and its dissipation rate
//! `ε` per cell, and derives the eddy viscosity `νT = Cμ k² / ε`. Each
//! [`KEpsilonModel::step`] consumes a [`VelocityGradients`] tensor from
//! the base flow solver:
//!
//! ```text
//! νT = Cμ k² / ε
//! Pk = νT S²,   S² = 2 (s11² + s22² + 2 s12²)
//! k' = k + dt (Pk - ε)
//! ε' = ε + dt (Cε1 (ε/k) Pk - Cε2 ε²/k)
//! ```
//!
//! Only interior cells are integrated; the one-cell halo keeps whatever
//! boundary values it was given. `k` and `ε` are clamped to their floors
//! after every mutation, so `νT` is always finite for finite input.

use eddy_core::{scan_non_finite, ConfigError, Instability};
use eddy_grid::{EdgeBehavior, Grid2D, VelocityGradients};

/// Model constants and positivity floors.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct KEpsilonConstants {
    /// `Cμ`, eddy-viscosity coefficient.
    pub c_mu: f64,
    /// `Cε1`, production coefficient of the ε equation.
    pub c_eps1: f64,
    /// `Cε2`, destruction coefficient of the ε equation.
    pub c_eps2: f64,
    /// `σk`, turbulent Prandtl number for k.
    pub sigma_k: f64,
    /// `σε`, turbulent Prandtl number for ε.
    pub sigma_eps: f64,
    /// Lower bound on k.
    pub k_min: f64,
    /// Lower bound on ε.
    pub eps_min: f64,
}

impl Default for KEpsilonConstants {
    fn default() -> Self {
        Self {
            c_mu: 0.09,
            c_eps1: 1.44,
            c_eps2: 1.92,
            sigma_k: 1.0,
            sigma_eps: 1.3,
            k_min: 1e-10,
            eps_min: 1e-12,
        }
    }
}

impl KEpsilonConstants {
    /// Check that every constant is finite and positive.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("c_mu", self.c_mu),
            ("c_eps1", self.c_eps1),
            ("c_eps2", self.c_eps2),
            ("sigma_k", self.sigma_k),
            ("sigma_eps", self.sigma_eps),
            ("k_min", self.k_min),
            ("eps_min", self.eps_min),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::InvalidParameter {
                    name,
                    value,
                    expected: "finite and > 0",
                });
            }
        }
        Ok(())
    }
}

/// Per-cell k-ε state.
#[derive(Clone, Debug)]
pub struct KEpsilonModel {
    grid: Grid2D,
    constants: KEpsilonConstants,
    molecular_viscosity: f64,
    diffusion: bool,
    k: Vec<f64>,
    epsilon: Vec<f64>,
    nu_t: Vec<f64>,
    production: Vec<f64>,
    k_prev: Vec<f64>,
    eps_prev: Vec<f64>,
}

/// Builder for [`KEpsilonModel`].
///
/// Required: the grid size. Defaults: standard constants, molecular
/// viscosity `1/6`, uniform `k = 1e-4`, `ε = 1e-6`, diffusion off.
#[derive(Clone, Debug)]
pub struct KEpsilonBuilder {
    width: usize,
    height: usize,
    constants: KEpsilonConstants,
    molecular_viscosity: f64,
    initial_k: f64,
    initial_epsilon: f64,
    diffusion: bool,
}

impl KEpsilonModel {
    /// Create a new builder.
    pub fn builder() -> KEpsilonBuilder {
        KEpsilonBuilder {
            width: 0,
            height: 0,
            constants: KEpsilonConstants::default(),
            molecular_viscosity: 1.0 / 6.0,
            initial_k: 1e-4,
            initial_epsilon: 1e-6,
            diffusion: false,
        }
    }

    /// Advance one step driven by the base flow's velocity gradients.
    ///
    /// Fails only if `gradients` was computed on a different grid or `dt`
    /// is not a finite non-negative number.
    pub fn step(&mut self, gradients: &VelocityGradients, dt: f64) -> Result<(), ConfigError> {
        if gradients.grid() != self.grid {
            return Err(ConfigError::LengthMismatch {
                what: "velocity gradients",
                expected: self.grid.cell_count(),
                actual: gradients.grid().cell_count(),
            });
        }
        self.update_turbulent_viscosity();
        let mut production = std::mem::take(&mut self.production);
        for (i, p) in production.iter_mut().enumerate() {
            *p = self.nu_t[i] * gradients.strain_rate_squared(i);
        }
        let result = self.advance_with_production(&production, dt);
        self.production = production;
        result
    }

    /// Integrate k and ε one step from an externally supplied production
    /// field, then refresh `νT`.
    ///
    /// `production` may take any sign; the floors still hold afterwards.
    pub fn advance_with_production(
        &mut self,
        production: &[f64],
        dt: f64,
    ) -> Result<(), ConfigError> {
        let n = self.grid.cell_count();
        if production.len() != n {
            return Err(ConfigError::LengthMismatch {
                what: "production",
                expected: n,
                actual: production.len(),
            });
        }
        if !dt.is_finite() || dt < 0.0 {
            return Err(ConfigError::InvalidDt { dt });
        }

        let c = self.constants;
        self.k_prev.copy_from_slice(&self.k);
        self.eps_prev.copy_from_slice(&self.epsilon);

        let mut clamped = 0usize;
        let (w, h) = (self.grid.width(), self.grid.height());
        for y in 1..h.saturating_sub(1) {
            for x in 1..w.saturating_sub(1) {
                let i = self.grid.index(x, y);
                let k = self.k_prev[i];
                let eps = self.eps_prev[i];
                let pk = production[i];

                let mut dk = pk - eps;
                let mut de = c.c_eps1 * (eps / k) * pk - c.c_eps2 * eps * eps / k;
                if self.diffusion {
                    dk += self.diffuse(&self.k_prev, x, y, c.sigma_k);
                    de += self.diffuse(&self.eps_prev, x, y, c.sigma_eps);
                }

                let k_new = k + dt * dk;
                let eps_new = eps + dt * de;
                if k_new.is_nan() || k_new < c.k_min {
                    clamped += 1;
                }
                if eps_new.is_nan() || eps_new < c.eps_min {
                    clamped += 1;
                }
                self.k[i] = k_new.max(c.k_min);
                self.epsilon[i] = eps_new.max(c.eps_min);
            }
        }
        if clamped > 0 {
            tracing::trace!(clamped, "k-epsilon floors applied");
        }

        self.update_turbulent_viscosity();
        Ok(())
    }

    /// `∇·((ν + νT/σ) ∇φ)` at an interior cell, unit spacing, using the
    /// face-averaged diffusivity.
    fn diffuse(&self, phi: &[f64], x: usize, y: usize, sigma: f64) -> f64 {
        let i = self.grid.index(x, y);
        let d = |j: usize| self.molecular_viscosity + self.nu_t[j] / sigma;
        let di = d(i);
        self.grid
            .neighbours4(x, y, EdgeBehavior::Clamp)
            .into_iter()
            .map(|j| 0.5 * (di + d(j)) * (phi[j] - phi[i]))
            .sum()
    }

    fn update_turbulent_viscosity(&mut self) {
        let c_mu = self.constants.c_mu;
        for ((nu, &k), &eps) in self.nu_t.iter_mut().zip(&self.k).zip(&self.epsilon) {
            *nu = c_mu * k * k / eps;
        }
    }

    /// Overwrite the leftmost column with inflow turbulence.
    ///
    /// Values below the floors are raised to them.
    pub fn set_inlet_conditions(&mut self, k: f64, epsilon: f64) -> Result<(), ConfigError> {
        for (name, value) in [("inlet k", k), ("inlet epsilon", epsilon)] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidParameter {
                    name,
                    value,
                    expected: "finite and >= 0",
                });
            }
        }
        let k = k.max(self.constants.k_min);
        let epsilon = epsilon.max(self.constants.eps_min);
        for y in 0..self.grid.height() {
            let i = self.grid.index(0, y);
            self.k[i] = k;
            self.epsilon[i] = epsilon;
            self.nu_t[i] = self.constants.c_mu * k * k / epsilon;
        }
        Ok(())
    }

    /// Inflow `(k, ε)` from mean speed `u`, turbulence intensity and
    /// mixing length: `k = 1.5 (u I)²`, `ε = Cμ^¾ k^1.5 / L`.
    pub fn estimate_inlet_conditions(
        &self,
        u: f64,
        intensity: f64,
        length_scale: f64,
    ) -> Result<(f64, f64), ConfigError> {
        if !u.is_finite() {
            return Err(ConfigError::InvalidParameter {
                name: "inlet speed",
                value: u,
                expected: "finite",
            });
        }
        if !intensity.is_finite() || intensity < 0.0 {
            return Err(ConfigError::InvalidParameter {
                name: "turbulence intensity",
                value: intensity,
                expected: "finite and >= 0",
            });
        }
        if !length_scale.is_finite() || length_scale <= 0.0 {
            return Err(ConfigError::InvalidParameter {
                name: "length scale",
                value: length_scale,
                expected: "finite and > 0",
            });
        }
        let ui = u * intensity;
        let k = 1.5 * ui * ui;
        let eps = self.constants.c_mu.powf(0.75) * k.powf(1.5) / length_scale;
        Ok((k, eps))
    }

    /// `ν + νT` per cell.
    pub fn effective_viscosity(&self) -> Vec<f64> {
        self.nu_t
            .iter()
            .map(|nu_t| self.molecular_viscosity + nu_t)
            .collect()
    }

    /// Turbulent time scale `k / ε` at cell `i`, `None` past the grid.
    pub fn time_scale(&self, i: usize) -> Option<f64> {
        Some(self.k.get(i)? / self.epsilon.get(i)?)
    }

    /// Turbulent length scale `Cμ^¾ k^1.5 / ε` at cell `i`, `None` past
    /// the grid. Inverts [`estimate_inlet_conditions`](Self::estimate_inlet_conditions).
    pub fn length_scale(&self, i: usize) -> Option<f64> {
        let (k, eps) = (*self.k.get(i)?, *self.epsilon.get(i)?);
        Some(self.constants.c_mu.powf(0.75) * k.powf(1.5) / eps)
    }

    /// Turbulent kinetic energy per cell.
    pub fn k(&self) -> &[f64] {
        &self.k
    }

    /// Dissipation rate per cell.
    pub fn epsilon(&self) -> &[f64] {
        &self.epsilon
    }

    /// Eddy viscosity `νT` per cell.
    pub fn turbulent_viscosity(&self) -> &[f64] {
        &self.nu_t
    }

    /// Production `Pk` from the last [`step`](Self::step).
    pub fn production(&self) -> &[f64] {
        &self.production
    }

    /// Model constants.
    pub fn constants(&self) -> &KEpsilonConstants {
        &self.constants
    }

    /// Molecular kinematic viscosity `ν`.
    pub fn molecular_viscosity(&self) -> f64 {
        self.molecular_viscosity
    }

    /// Grid the model is defined on.
    pub fn grid(&self) -> Grid2D {
        self.grid
    }

    /// Whether gradient diffusion is part of the update.
    pub fn diffusion_enabled(&self) -> bool {
        self.diffusion
    }

    /// First non-finite value in k, ε or νT.
    pub fn check_finite(&self) -> Option<Instability> {
        scan_non_finite("k", &self.k)
            .or_else(|| scan_non_finite("epsilon", &self.epsilon))
            .or_else(|| scan_non_finite("turbulent_viscosity", &self.nu_t))
    }
}

impl KEpsilonBuilder {
    /// Grid dimensions (required).
    pub fn size(mut self, width: usize, height: usize) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Model constants.
    pub fn constants(mut self, constants: KEpsilonConstants) -> Self {
        self.constants = constants;
        self
    }

    /// Molecular kinematic viscosity added to `νT` for the effective value.
    pub fn molecular_viscosity(mut self, nu: f64) -> Self {
        self.molecular_viscosity = nu;
        self
    }

    /// Uniform initial k and ε.
    pub fn initial(mut self, k: f64, epsilon: f64) -> Self {
        self.initial_k = k;
        self.initial_epsilon = epsilon;
        self
    }

    /// Include gradient diffusion of k and ε in the update.
    pub fn with_diffusion(mut self, enabled: bool) -> Self {
        self.diffusion = enabled;
        self
    }

    /// Validate and construct the model.
    pub fn build(self) -> Result<KEpsilonModel, ConfigError> {
        let grid = Grid2D::new(self.width, self.height)?;
        self.constants.validate()?;
        if !self.molecular_viscosity.is_finite() || self.molecular_viscosity < 0.0 {
            return Err(ConfigError::InvalidParameter {
                name: "molecular_viscosity",
                value: self.molecular_viscosity,
                expected: "finite and >= 0",
            });
        }
        for (name, value) in [
            ("initial k", self.initial_k),
            ("initial epsilon", self.initial_epsilon),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::InvalidParameter {
                    name,
                    value,
                    expected: "finite and > 0",
                });
            }
        }

        let n = grid.cell_count();
        let k0 = self.initial_k.max(self.constants.k_min);
        let e0 = self.initial_epsilon.max(self.constants.eps_min);
        let mut model = KEpsilonModel {
            grid,
            constants: self.constants,
            molecular_viscosity: self.molecular_viscosity,
            diffusion: self.diffusion,
            k: vec![k0; n],
            epsilon: vec![e0; n],
            nu_t: vec![0.0; n],
            production: vec![0.0; n],
            k_prev: vec![k0; n],
            eps_prev: vec![e0; n],
        };
        model.update_turbulent_viscosity();
        tracing::debug!(
            width = grid.width(),
            height = grid.height(),
            diffusion = self.diffusion,
            "k-epsilon model constructed"
        );
        Ok(model)
    }
}
