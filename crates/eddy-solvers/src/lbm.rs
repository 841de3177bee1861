//! D2Q9 lattice-Boltzmann solver with BGK collision.
//!
//! Populations are stored cell-major: direction `i` of cell `idx` lives
//! at `9 * idx + i`. Each [`step`](Solver::step) runs, in order:
//!
//! 1. **Inlet**: the leftmost column is reset to equilibrium at the
//!    profile velocity and the cell's current density.
//! 2. **Collision**: `f += ω (f_eq - f)` on every fluid cell.
//! 3. **Streaming**: `f` is copied to `f_temp`, then scattered to the
//!    neighbour along each lattice velocity (periodic in x).
//! 4. **Bounce-back**: populations that left a fluid cell towards an
//!    obstacle or a wall are reflected into the opposite direction.
//! 5. **Recovery**: density and velocity are recomputed as moments of `f`.
//!
//! Everything is in lattice units. `dt` is validated but one step always
//! advances one lattice time unit.

use eddy_core::{
    scan_non_finite, validate_dt, ConfigError, Instability, Observables, Solver, SolverKind,
    StepError,
};
use eddy_grid::{
    resolve_axis, EdgeBehavior, Grid2D, InletProfile, ObstacleMask, VelocityGradients,
};

use crate::lattice::{equilibrium, tau_for, E, OPP, Q};

/// Boundary treatment along the y axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AxisBoundary {
    /// Populations leaving one side re-enter on the other.
    Periodic,
    /// No-slip walls just outside rows `0` and `height - 1`.
    #[default]
    BounceBack,
}

impl AxisBoundary {
    fn edge(self) -> EdgeBehavior {
        match self {
            Self::Periodic => EdgeBehavior::Wrap,
            Self::BounceBack => EdgeBehavior::Absorb,
        }
    }
}

/// A D2Q9 BGK lattice-Boltzmann fluid.
///
/// # Examples
///
/// ```
/// use eddy_core::Solver;
/// use eddy_grid::InletProfile;
/// use eddy_solvers::LatticeBoltzmann;
///
/// let mut lbm = LatticeBoltzmann::builder()
///     .size(16, 8)
///     .viscosity(0.02)
///     .inlet(InletProfile::Uniform(0.05))
///     .build()
///     .unwrap();
/// assert!((lbm.tau() - 0.56).abs() < 1e-12);
/// lbm.step(1.0).unwrap();
/// ```
#[derive(Debug)]
pub struct LatticeBoltzmann {
    grid: Grid2D,
    viscosity: f64,
    tau: f64,
    omega: f64,
    omega_field: Option<Vec<f64>>,
    y_boundary: AxisBoundary,
    inlet: Option<Vec<f64>>,
    f: Vec<f64>,
    f_eq: Vec<f64>,
    f_temp: Vec<f64>,
    density: Vec<f64>,
    ux: Vec<f64>,
    uy: Vec<f64>,
    obstacles: Vec<bool>,
}

/// Builder for [`LatticeBoltzmann`].
///
/// Only the size is required. Defaults: `ν = 1/6` (`τ = 1`), bounce-back
/// walls in y, no obstacles, no inlet, fluid at rest with `ρ = 1`.
#[derive(Clone, Debug)]
pub struct LatticeBoltzmannBuilder {
    width: usize,
    height: usize,
    viscosity: f64,
    y_boundary: AxisBoundary,
    obstacles: Option<ObstacleMask>,
    inlet: Option<InletProfile>,
    initial_density: f64,
    initial_velocity: [f64; 2],
}

impl LatticeBoltzmann {
    /// Create a new builder.
    pub fn builder() -> LatticeBoltzmannBuilder {
        LatticeBoltzmannBuilder {
            width: 0,
            height: 0,
            viscosity: 1.0 / 6.0,
            y_boundary: AxisBoundary::default(),
            obstacles: None,
            inlet: None,
            initial_density: 1.0,
            initial_velocity: [0.0, 0.0],
        }
    }

    /// Reset every fluid cell to equilibrium at `rho` and `velocity`.
    ///
    /// Obstacle cells stay empty. Clears nothing else (inlet and viscosity
    /// overrides are kept).
    pub fn initialize_uniform(&mut self, rho: f64, velocity: [f64; 2]) -> Result<(), ConfigError> {
        if !rho.is_finite() || rho <= 0.0 {
            return Err(ConfigError::InvalidParameter {
                name: "initial_density",
                value: rho,
                expected: "finite and > 0",
            });
        }
        for (name, v) in [
            ("initial_velocity.x", velocity[0]),
            ("initial_velocity.y", velocity[1]),
        ] {
            if !v.is_finite() {
                return Err(ConfigError::InvalidParameter {
                    name,
                    value: v,
                    expected: "finite",
                });
            }
        }

        let feq = equilibrium(rho, velocity[0], velocity[1]);
        for idx in 0..self.grid.cell_count() {
            let cell = &mut self.f[Q * idx..Q * idx + Q];
            if self.obstacles[idx] {
                cell.fill(0.0);
            } else {
                cell.copy_from_slice(&feq);
            }
        }
        self.f_eq.copy_from_slice(&self.f);
        self.f_temp.copy_from_slice(&self.f);
        self.recover_macroscopic();
        Ok(())
    }

    /// Impose `profile` on the leftmost column from the next step on.
    pub fn set_inlet_velocity(&mut self, profile: InletProfile) -> Result<(), ConfigError> {
        self.inlet = Some(profile.sample(self.grid.height())?);
        Ok(())
    }

    /// Stop imposing an inlet profile.
    pub fn clear_inlet(&mut self) {
        self.inlet = None;
    }

    /// Replace the uniform relaxation rate by a per-cell one derived from
    /// the effective kinematic viscosity `nu_eff` (one value per cell).
    ///
    /// Entries that are not finite and positive fall back to the base
    /// viscosity for that cell.
    pub fn set_effective_viscosity(&mut self, nu_eff: &[f64]) -> Result<(), ConfigError> {
        let n = self.grid.cell_count();
        if nu_eff.len() != n {
            return Err(ConfigError::LengthMismatch {
                what: "effective viscosity",
                expected: n,
                actual: nu_eff.len(),
            });
        }
        let base = self.omega;
        let field = self.omega_field.get_or_insert_with(|| vec![base; n]);
        for (w, &nu) in field.iter_mut().zip(nu_eff) {
            *w = if nu.is_finite() && nu > 0.0 {
                1.0 / tau_for(nu)
            } else {
                base
            };
        }
        Ok(())
    }

    /// Return to the uniform relaxation rate `1 / τ`.
    pub fn clear_effective_viscosity(&mut self) {
        self.omega_field = None;
    }

    /// The lattice this solver runs on.
    pub fn grid(&self) -> Grid2D {
        self.grid
    }

    /// Base kinematic viscosity (lattice units).
    pub fn viscosity(&self) -> f64 {
        self.viscosity
    }

    /// Base relaxation time `3ν + 0.5`.
    pub fn tau(&self) -> f64 {
        self.tau
    }

    /// Base relaxation rate `1 / τ`.
    pub fn omega(&self) -> f64 {
        self.omega
    }

    /// Boundary treatment along y.
    pub fn y_boundary(&self) -> AxisBoundary {
        self.y_boundary
    }

    /// Per-cell density.
    pub fn density(&self) -> &[f64] {
        &self.density
    }

    /// Per-cell x velocity.
    pub fn velocity_x(&self) -> &[f64] {
        &self.ux
    }

    /// Per-cell y velocity.
    pub fn velocity_y(&self) -> &[f64] {
        &self.uy
    }

    /// Per-cell obstacle flags.
    pub fn obstacles(&self) -> &[bool] {
        &self.obstacles
    }

    /// All populations, cell-major (`9 * idx + i`).
    pub fn populations(&self) -> &[f64] {
        &self.f
    }

    /// Equilibrium populations from the last collision.
    pub fn equilibrium_populations(&self) -> &[f64] {
        &self.f_eq
    }

    /// Sum of density over all cells.
    pub fn total_mass(&self) -> f64 {
        self.density.iter().sum()
    }

    /// `Σ ½ ρ |u|²` over all cells.
    pub fn kinetic_energy(&self) -> f64 {
        self.density
            .iter()
            .zip(self.ux.iter().zip(&self.uy))
            .map(|(rho, (ux, uy))| 0.5 * rho * (ux * ux + uy * uy))
            .sum()
    }

    /// Velocity magnitude at `(x, y)`, or `None` outside the grid.
    pub fn speed_at(&self, x: usize, y: usize) -> Option<f64> {
        let i = self.grid.try_index(x, y).ok()?;
        Some(self.ux[i].hypot(self.uy[i]))
    }

    /// Write the velocity-gradient tensor of the current flow into `out`.
    pub fn velocity_gradients_into(&self, out: &mut VelocityGradients) -> Result<(), ConfigError> {
        out.compute_into(&self.ux, &self.uy, EdgeBehavior::Clamp)?;
        Ok(())
    }

    /// Scalar vorticity `∂v/∂x - ∂u/∂y` per cell.
    pub fn vorticity(&self) -> Result<Vec<f64>, ConfigError> {
        let g = VelocityGradients::compute(self.grid, &self.ux, &self.uy, EdgeBehavior::Clamp)?;
        Ok(g.dv_dx.iter().zip(&g.du_dy).map(|(a, b)| a - b).collect())
    }

    fn apply_inlet(&mut self) {
        let Some(profile) = &self.inlet else {
            return;
        };
        for (y, &u_in) in profile.iter().enumerate() {
            let idx = self.grid.index(0, y);
            if self.obstacles[idx] {
                continue;
            }
            let rho = self.density[idx];
            self.ux[idx] = u_in;
            self.uy[idx] = 0.0;
            self.f[Q * idx..Q * idx + Q].copy_from_slice(&equilibrium(rho, u_in, 0.0));
        }
    }

    fn collide(&mut self) {
        for idx in 0..self.grid.cell_count() {
            if self.obstacles[idx] {
                continue;
            }
            let (rho, ux, uy) = moments(&self.f[Q * idx..Q * idx + Q]);
            let feq = equilibrium(rho, ux, uy);
            let omega = self.omega_field.as_ref().map_or(self.omega, |w| w[idx]);
            for i in 0..Q {
                let k = Q * idx + i;
                self.f_eq[k] = feq[i];
                self.f[k] += omega * (feq[i] - self.f[k]);
            }
        }
    }

    /// Target cell of direction `i` from `(x, y)`, `None` past a wall.
    #[inline]
    fn target(&self, x: usize, y: usize, i: usize) -> Option<usize> {
        let tx = resolve_axis(x as i64 + E[i][0] as i64, self.grid.width(), EdgeBehavior::Wrap)?;
        let ty = resolve_axis(
            y as i64 + E[i][1] as i64,
            self.grid.height(),
            self.y_boundary.edge(),
        )?;
        Some(self.grid.index(tx, ty))
    }

    fn stream(&mut self) {
        self.f_temp.copy_from_slice(&self.f);
        for idx in 0..self.grid.cell_count() {
            let (x, y) = self.grid.coords(idx);
            for i in 0..Q {
                if let Some(t) = self.target(x, y, i) {
                    self.f[Q * t + i] = self.f_temp[Q * idx + i];
                }
            }
        }
    }

    fn bounce_back(&mut self) {
        for idx in 0..self.grid.cell_count() {
            if self.obstacles[idx] {
                continue;
            }
            let (x, y) = self.grid.coords(idx);
            for i in 1..Q {
                let blocked = match self.target(x, y, i) {
                    Some(t) => self.obstacles[t],
                    None => true,
                };
                if blocked {
                    self.f[Q * idx + OPP[i]] = self.f_temp[Q * idx + i];
                }
            }
        }
    }

    fn recover_macroscopic(&mut self) {
        for idx in 0..self.grid.cell_count() {
            let cell = &mut self.f[Q * idx..Q * idx + Q];
            if self.obstacles[idx] {
                cell.fill(0.0);
                self.density[idx] = 0.0;
                self.ux[idx] = 0.0;
                self.uy[idx] = 0.0;
                continue;
            }
            let (rho, ux, uy) = moments(cell);
            self.density[idx] = rho;
            self.ux[idx] = ux;
            self.uy[idx] = uy;
        }
    }
}

/// Density and velocity of one cell's populations. Zero velocity for an
/// empty cell.
#[inline]
fn moments(cell: &[f64]) -> (f64, f64, f64) {
    let mut rho = 0.0;
    let mut mx = 0.0;
    let mut my = 0.0;
    for (i, &fi) in cell.iter().enumerate() {
        rho += fi;
        mx += fi * E[i][0] as f64;
        my += fi * E[i][1] as f64;
    }
    if rho > 0.0 {
        (rho, mx / rho, my / rho)
    } else {
        (rho, 0.0, 0.0)
    }
}

impl Solver for LatticeBoltzmann {
    fn name(&self) -> &str {
        "lattice_boltzmann"
    }

    fn kind(&self) -> SolverKind {
        SolverKind::LatticeBoltzmann
    }

    fn step(&mut self, dt: f64) -> Result<(), StepError> {
        validate_dt(dt)?;
        self.apply_inlet();
        self.collide();
        self.stream();
        self.bounce_back();
        self.recover_macroscopic();
        Ok(())
    }

    fn check_finite(&self) -> Option<Instability> {
        scan_non_finite("density", &self.density)
            .or_else(|| scan_non_finite("velocity_x", &self.ux))
            .or_else(|| scan_non_finite("velocity_y", &self.uy))
    }

    fn observe(&self, out: &mut Observables) {
        out.record("total_mass", self.total_mass());
        out.record("kinetic_energy", self.kinetic_energy());
        let max_speed = self
            .ux
            .iter()
            .zip(&self.uy)
            .map(|(ux, uy)| ux.hypot(*uy))
            .fold(0.0, f64::max);
        out.record("max_speed", max_speed);
    }
}

impl LatticeBoltzmannBuilder {
    /// Lattice dimensions (required).
    pub fn size(mut self, width: usize, height: usize) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Kinematic viscosity in lattice units. Must be finite and > 0.
    pub fn viscosity(mut self, nu: f64) -> Self {
        self.viscosity = nu;
        self
    }

    /// Boundary treatment along y.
    pub fn y_boundary(mut self, boundary: AxisBoundary) -> Self {
        self.y_boundary = boundary;
        self
    }

    /// Static solid cells. The mask must cover the same grid.
    pub fn obstacles(mut self, mask: ObstacleMask) -> Self {
        self.obstacles = Some(mask);
        self
    }

    /// Inlet profile imposed on the leftmost column.
    pub fn inlet(mut self, profile: InletProfile) -> Self {
        self.inlet = Some(profile);
        self
    }

    /// Initial density of every fluid cell.
    pub fn initial_density(mut self, rho: f64) -> Self {
        self.initial_density = rho;
        self
    }

    /// Initial velocity of every fluid cell.
    pub fn initial_velocity(mut self, velocity: [f64; 2]) -> Self {
        self.initial_velocity = velocity;
        self
    }

    /// Validate and construct the solver.
    pub fn build(self) -> Result<LatticeBoltzmann, ConfigError> {
        let grid = Grid2D::new(self.width, self.height)?;

        let tau = tau_for(self.viscosity);
        if !self.viscosity.is_finite() || tau <= 0.5 {
            return Err(ConfigError::UnstableRelaxation {
                viscosity: self.viscosity,
                tau,
            });
        }

        let obstacles = match self.obstacles {
            Some(mask) => {
                if mask.grid() != grid {
                    return Err(ConfigError::InvalidGrid {
                        reason: format!(
                            "obstacle mask is {}x{}, lattice is {}x{}",
                            mask.grid().width(),
                            mask.grid().height(),
                            grid.width(),
                            grid.height()
                        ),
                    });
                }
                mask.as_slice().to_vec()
            }
            None => vec![false; grid.cell_count()],
        };

        let inlet = match &self.inlet {
            Some(profile) => Some(profile.sample(grid.height())?),
            None => None,
        };

        let n = grid.cell_count();
        let mut lbm = LatticeBoltzmann {
            grid,
            viscosity: self.viscosity,
            tau,
            omega: 1.0 / tau,
            omega_field: None,
            y_boundary: self.y_boundary,
            inlet,
            f: vec![0.0; Q * n],
            f_eq: vec![0.0; Q * n],
            f_temp: vec![0.0; Q * n],
            density: vec![0.0; n],
            ux: vec![0.0; n],
            uy: vec![0.0; n],
            obstacles,
        };
        lbm.initialize_uniform(self.initial_density, self.initial_velocity)?;

        tracing::debug!(
            width = grid.width(),
            height = grid.height(),
            tau,
            solids = lbm.obstacles.iter().filter(|&&s| s).count(),
            "lattice-Boltzmann solver constructed"
        );
        Ok(lbm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn periodic(w: usize, h: usize) -> LatticeBoltzmann {
        LatticeBoltzmann::builder()
            .size(w, h)
            .viscosity(0.05)
            .y_boundary(AxisBoundary::Periodic)
            .build()
            .unwrap()
    }

    /// Smooth, non-trivial initial state: equilibrium with a sine shear.
    fn perturb(lbm: &mut LatticeBoltzmann) {
        let grid = lbm.grid();
        for idx in 0..grid.cell_count() {
            if lbm.obstacles[idx] {
                continue;
            }
            let (x, y) = grid.coords(idx);
            let ux = 0.05 * (y as f64 * 0.7).sin();
            let uy = 0.03 * (x as f64 * 0.4).cos();
            let rho = 1.0 + 0.01 * ((x + 2 * y) as f64).sin();
            lbm.f[Q * idx..Q * idx + Q].copy_from_slice(&equilibrium(rho, ux, uy));
        }
        lbm.recover_macroscopic();
    }

    #[test]
    fn rest_state_is_a_fixed_point() {
        let mut lbm = periodic(8, 6);
        let before = lbm.populations().to_vec();
        for _ in 0..100 {
            lbm.step(1.0).unwrap();
        }
        for (a, b) in before.iter().zip(lbm.populations()) {
            assert!((a - b).abs() < 1e-12);
        }
        assert!(lbm.velocity_x().iter().all(|u| u.abs() < 1e-12));
        for (f, feq) in lbm.populations().iter().zip(lbm.equilibrium_populations()) {
            assert!((f - feq).abs() < 1e-12);
        }
    }

    #[test]
    fn mass_is_conserved_with_periodic_boundaries() {
        let mut lbm = periodic(12, 10);
        perturb(&mut lbm);
        let m0 = lbm.total_mass();
        for _ in 0..50 {
            lbm.step(1.0).unwrap();
        }
        assert!((lbm.total_mass() - m0).abs() / m0 < 1e-9);
    }

    #[test]
    fn mass_is_conserved_with_walls_and_obstacle() {
        let grid = Grid2D::new(12, 10).unwrap();
        let mut mask = ObstacleMask::new(grid);
        mask.fill_rect(5, 4, 2, 2);
        let mut lbm = LatticeBoltzmann::builder()
            .size(12, 10)
            .viscosity(0.05)
            .obstacles(mask)
            .build()
            .unwrap();
        perturb(&mut lbm);
        let m0 = lbm.total_mass();
        for _ in 0..50 {
            lbm.step(1.0).unwrap();
        }
        assert!((lbm.total_mass() - m0).abs() / m0 < 1e-9);
    }

    #[test]
    fn obstacle_cells_report_zero_state() {
        let grid = Grid2D::new(10, 8).unwrap();
        let mut mask = ObstacleMask::new(grid);
        mask.fill_rect(4, 3, 2, 2);
        let mut lbm = LatticeBoltzmann::builder()
            .size(10, 8)
            .viscosity(0.05)
            .obstacles(mask)
            .inlet(InletProfile::Uniform(0.05))
            .build()
            .unwrap();
        for _ in 0..20 {
            lbm.step(1.0).unwrap();
        }
        let idx = grid.index(4, 3);
        assert_eq!(lbm.density()[idx], 0.0);
        assert_eq!(lbm.velocity_x()[idx], 0.0);
        assert_eq!(lbm.velocity_y()[idx], 0.0);
        assert_eq!(lbm.speed_at(5, 4), Some(0.0));
    }

    #[test]
    fn inlet_drives_flow_from_rest() {
        let mut lbm = LatticeBoltzmann::builder()
            .size(16, 8)
            .viscosity(0.05)
            .inlet(InletProfile::Uniform(0.05))
            .build()
            .unwrap();
        for _ in 0..30 {
            lbm.step(1.0).unwrap();
        }
        let mean_ux: f64 = lbm.velocity_x().iter().sum::<f64>() / 128.0;
        assert!(mean_ux > 0.0);
    }

    #[test]
    fn rejects_non_positive_viscosity() {
        for nu in [0.0, -0.1, f64::NAN] {
            let err = LatticeBoltzmann::builder().size(4, 4).viscosity(nu).build();
            assert!(
                matches!(err, Err(ConfigError::UnstableRelaxation { .. })),
                "nu = {nu}"
            );
        }
    }

    #[test]
    fn rejects_empty_grid() {
        let err = LatticeBoltzmann::builder().size(0, 4).build();
        assert!(matches!(err, Err(ConfigError::EmptyGrid)));
    }

    #[test]
    fn rejects_mask_of_wrong_size() {
        let mask = ObstacleMask::new(Grid2D::new(3, 3).unwrap());
        let err = LatticeBoltzmann::builder().size(4, 4).obstacles(mask).build();
        assert!(err.is_err());
    }

    #[test]
    fn effective_viscosity_length_is_checked() {
        let mut lbm = periodic(4, 4);
        let err = lbm.set_effective_viscosity(&[0.1; 3]);
        assert!(matches!(err, Err(ConfigError::LengthMismatch { expected: 16, .. })));
        assert!(lbm.set_effective_viscosity(&[0.1; 16]).is_ok());
    }

    #[test]
    fn invalid_dt_is_rejected() {
        let mut lbm = periodic(4, 4);
        assert!(matches!(lbm.step(-1.0), Err(StepError::InvalidDt { .. })));
    }

    #[test]
    fn observe_reports_mass() {
        let lbm = periodic(4, 4);
        let mut obs = Observables::new();
        lbm.observe(&mut obs);
        assert!((obs.get("total_mass").unwrap() - 16.0).abs() < 1e-12);
        assert_eq!(obs.get("kinetic_energy"), Some(0.0));
    }

    #[test]
    fn uniform_flow_has_no_vorticity() {
        let mut lbm = periodic(6, 6);
        lbm.initialize_uniform(1.0, [0.05, 0.0]).unwrap();
        let w = lbm.vorticity().unwrap();
        assert!(w.iter().all(|v| v.abs() < 1e-12));
    }
}
