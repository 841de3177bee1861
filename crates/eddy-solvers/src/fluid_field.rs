//! Eulerian finite-difference fluid on a marker-and-cell grid.
//!
//! Velocities live on cell faces: `u` on the `(w + 1) × h` vertical
//! faces, `v` on the `w × (h + 1)` horizontal faces. Pressure and the
//! advected density scalar live at cell centres. Positions below are in
//! cell units; velocities and forces are physical and scaled by the cell
//! size `h`.
//!
//! One [`step`](Solver::step) runs, in order:
//!
//! 1. **advect**: semi-Lagrangian back-trace with bilinear sampling for
//!    both face velocities and the density scalar;
//! 2. **forces**: uniform body force plus forces accumulated through
//!    [`FluidField::add_force`] (cleared afterwards);
//! 3. **project**: SOR relaxation of the pressure Poisson equation until
//!    the post-correction divergence is below `tolerance`;
//! 4. **correct**: subtract `dt/ρ ∇p` from every open face.
//!
//! Domain edges and masked cells are solid: faces touching them carry no
//! normal velocity.

use eddy_core::{
    scan_non_finite, validate_dt, ConfigError, Instability, Observables, Solver, SolverKind,
    StepError,
};
use eddy_grid::{Grid2D, GridError, ObstacleMask};

/// Outcome of the most recent pressure solve.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PressureSolve {
    /// SOR sweeps performed.
    pub iterations: usize,
    /// Largest post-correction divergence when the solve stopped.
    pub residual: f64,
    /// Whether `residual < tolerance`.
    pub converged: bool,
}

impl Default for PressureSolve {
    fn default() -> Self {
        Self {
            iterations: 0,
            residual: 0.0,
            converged: true,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Mac {
    w: usize,
    h: usize,
}

impl Mac {
    #[inline]
    fn u(self, i: usize, j: usize) -> usize {
        i + j * (self.w + 1)
    }

    #[inline]
    fn v(self, i: usize, j: usize) -> usize {
        i + j * self.w
    }

    #[inline]
    fn c(self, i: usize, j: usize) -> usize {
        i + j * self.w
    }

    fn sample_u(self, u: &[f64], x: f64, y: f64) -> f64 {
        bilinear(u, self.w + 1, self.h, x, y - 0.5)
    }

    fn sample_v(self, v: &[f64], x: f64, y: f64) -> f64 {
        bilinear(v, self.w, self.h + 1, x - 0.5, y)
    }

    fn sample_c(self, c: &[f64], x: f64, y: f64) -> f64 {
        bilinear(c, self.w, self.h, x - 0.5, y - 0.5)
    }
}

/// Bilinear interpolation on an `nx × ny` lattice, clamped at its edges.
fn bilinear(data: &[f64], nx: usize, ny: usize, gx: f64, gy: f64) -> f64 {
    let gx = gx.clamp(0.0, (nx - 1) as f64);
    let gy = gy.clamp(0.0, (ny - 1) as f64);
    let x0 = gx.floor() as usize;
    let y0 = gy.floor() as usize;
    let x1 = (x0 + 1).min(nx - 1);
    let y1 = (y0 + 1).min(ny - 1);
    let tx = gx - x0 as f64;
    let ty = gy - y0 as f64;
    let lo = data[x0 + y0 * nx] * (1.0 - tx) + data[x1 + y0 * nx] * tx;
    let hi = data[x0 + y1 * nx] * (1.0 - tx) + data[x1 + y1 * nx] * tx;
    lo * (1.0 - ty) + hi * ty
}

/// Incompressible fluid advanced by advection and pressure projection.
///
/// A `FluidField::default()` has no cells; stepping it does nothing until
/// [`initialize`](Self::initialize) allocates a grid.
///
/// ```
/// use eddy_core::Solver;
/// use eddy_solvers::FluidField;
///
/// let mut idle = FluidField::default();
/// idle.step(0.1).unwrap();
///
/// let mut field = FluidField::builder().size(8, 8).body_force([0.0, -9.81]).build().unwrap();
/// field.step(0.05).unwrap();
/// assert!(field.last_solve().converged);
/// ```
#[derive(Clone, Debug)]
pub struct FluidField {
    grid: Option<Grid2D>,
    cell_size: f64,
    fluid_density: f64,
    body_force: [f64; 2],
    tolerance: f64,
    max_iterations: usize,
    sor_omega: f64,
    u: Vec<f64>,
    v: Vec<f64>,
    u_tmp: Vec<f64>,
    v_tmp: Vec<f64>,
    density: Vec<f64>,
    density_tmp: Vec<f64>,
    pressure: Vec<f64>,
    divergence: Vec<f64>,
    force_x: Vec<f64>,
    force_y: Vec<f64>,
    vx: Vec<f64>,
    vy: Vec<f64>,
    solid: Vec<bool>,
    last_solve: PressureSolve,
}

impl Default for FluidField {
    fn default() -> Self {
        Self {
            grid: None,
            cell_size: 1.0,
            fluid_density: 1.0,
            body_force: [0.0, 0.0],
            tolerance: 1e-6,
            max_iterations: 1000,
            sor_omega: 1.7,
            u: Vec::new(),
            v: Vec::new(),
            u_tmp: Vec::new(),
            v_tmp: Vec::new(),
            density: Vec::new(),
            density_tmp: Vec::new(),
            pressure: Vec::new(),
            divergence: Vec::new(),
            force_x: Vec::new(),
            force_y: Vec::new(),
            vx: Vec::new(),
            vy: Vec::new(),
            solid: Vec::new(),
            last_solve: PressureSolve::default(),
        }
    }
}

/// Builder for [`FluidField`].
///
/// Defaults: unit cell size and fluid density, no body force,
/// `tolerance = 1e-6`, `max_iterations = 1000`, SOR factor `1.7`.
#[derive(Clone, Debug)]
pub struct FluidFieldBuilder {
    width: usize,
    height: usize,
    cell_size: f64,
    fluid_density: f64,
    body_force: [f64; 2],
    tolerance: f64,
    max_iterations: usize,
    sor_omega: f64,
    obstacles: Option<ObstacleMask>,
}

impl FluidField {
    /// Create a new builder.
    pub fn builder() -> FluidFieldBuilder {
        let d = Self::default();
        FluidFieldBuilder {
            width: 0,
            height: 0,
            cell_size: d.cell_size,
            fluid_density: d.fluid_density,
            body_force: d.body_force,
            tolerance: d.tolerance,
            max_iterations: d.max_iterations,
            sor_omega: d.sor_omega,
            obstacles: None,
        }
    }

    /// (Re)allocate a fluid at rest on a `width × height` grid.
    ///
    /// Clears any obstacle mask and accumulated forces; solver parameters
    /// are kept.
    pub fn initialize(&mut self, width: usize, height: usize) -> Result<(), ConfigError> {
        let grid = Grid2D::new(width, height)?;
        let n = grid.cell_count();
        let nu = (width + 1) * height;
        let nv = width * (height + 1);
        self.grid = Some(grid);
        self.u = vec![0.0; nu];
        self.u_tmp = vec![0.0; nu];
        self.v = vec![0.0; nv];
        self.v_tmp = vec![0.0; nv];
        for buf in [
            &mut self.density,
            &mut self.density_tmp,
            &mut self.pressure,
            &mut self.divergence,
            &mut self.force_x,
            &mut self.force_y,
            &mut self.vx,
            &mut self.vy,
        ] {
            *buf = vec![0.0; n];
        }
        self.solid = vec![false; n];
        self.last_solve = PressureSolve::default();
        tracing::debug!(width, height, "fluid field initialized");
        Ok(())
    }

    /// Whether a grid has been allocated.
    pub fn is_initialized(&self) -> bool {
        self.grid.is_some()
    }

    /// Columns (0 when uninitialised).
    pub fn width(&self) -> usize {
        self.grid.map_or(0, |g| g.width())
    }

    /// Rows (0 when uninitialised).
    pub fn height(&self) -> usize {
        self.grid.map_or(0, |g| g.height())
    }

    /// Mark masked cells as solid. The mask must cover the current grid.
    pub fn set_obstacles(&mut self, mask: &ObstacleMask) -> Result<(), ConfigError> {
        let grid = self.grid.ok_or(ConfigError::EmptyGrid)?;
        if mask.grid() != grid {
            return Err(ConfigError::LengthMismatch {
                what: "obstacle mask",
                expected: grid.cell_count(),
                actual: mask.grid().cell_count(),
            });
        }
        self.solid.copy_from_slice(mask.as_slice());
        for (i, &s) in self.solid.iter().enumerate() {
            if s {
                self.density[i] = 0.0;
                self.pressure[i] = 0.0;
            }
        }
        let m = self.mac(grid);
        self.enforce_solid_faces(m);
        self.refresh_cell_velocity(m);
        Ok(())
    }

    /// Overwrite the face velocities.
    pub fn set_face_velocities(&mut self, u: &[f64], v: &[f64]) -> Result<(), ConfigError> {
        let grid = self.grid.ok_or(ConfigError::EmptyGrid)?;
        for (what, expected, actual) in [
            ("u faces", self.u.len(), u.len()),
            ("v faces", self.v.len(), v.len()),
        ] {
            if expected != actual {
                return Err(ConfigError::LengthMismatch {
                    what,
                    expected,
                    actual,
                });
            }
        }
        self.u.copy_from_slice(u);
        self.v.copy_from_slice(v);
        let m = self.mac(grid);
        self.enforce_solid_faces(m);
        self.refresh_cell_velocity(m);
        Ok(())
    }

    /// Accumulate an acceleration at cell `(x, y)` for the next step.
    pub fn add_force(&mut self, x: usize, y: usize, force: [f64; 2]) -> Result<(), GridError> {
        let i = self.cell_index(x, y)?;
        self.force_x[i] += force[0];
        self.force_y[i] += force[1];
        Ok(())
    }

    /// Add `amount` of the advected scalar at cell `(x, y)`.
    pub fn add_density(&mut self, x: usize, y: usize, amount: f64) -> Result<(), GridError> {
        let i = self.cell_index(x, y)?;
        if !self.solid[i] {
            self.density[i] += amount;
        }
        Ok(())
    }

    fn cell_index(&self, x: usize, y: usize) -> Result<usize, GridError> {
        self.grid.ok_or(GridError::EmptyGrid)?.try_index(x, y)
    }

    /// Cell-centred x velocity (average of the two vertical faces).
    pub fn velocity_x(&self) -> &[f64] {
        &self.vx
    }

    /// Cell-centred y velocity (average of the two horizontal faces).
    pub fn velocity_y(&self) -> &[f64] {
        &self.vy
    }

    /// Velocities on vertical faces, `(width + 1) × height`.
    pub fn face_velocity_x(&self) -> &[f64] {
        &self.u
    }

    /// Velocities on horizontal faces, `width × (height + 1)`.
    pub fn face_velocity_y(&self) -> &[f64] {
        &self.v
    }

    /// Advected scalar per cell.
    pub fn density(&self) -> &[f64] {
        &self.density
    }

    /// Pressure per cell from the last projection.
    pub fn pressure(&self) -> &[f64] {
        &self.pressure
    }

    /// Solid flags per cell.
    pub fn obstacles(&self) -> &[bool] {
        &self.solid
    }

    /// Statistics of the last pressure solve.
    pub fn last_solve(&self) -> PressureSolve {
        self.last_solve
    }

    /// Discrete divergence of the current face velocities per cell
    /// (zero in solid cells).
    pub fn divergence(&self) -> Vec<f64> {
        let Some(grid) = self.grid else {
            return Vec::new();
        };
        let m = self.mac(grid);
        let mut out = vec![0.0; grid.cell_count()];
        self.divergence_into(m, &mut out);
        out
    }

    /// Largest `|∇·u|` over fluid cells.
    pub fn max_divergence(&self) -> f64 {
        self.divergence().iter().fold(0.0, |acc, d| acc.max(d.abs()))
    }

    /// Interpolated velocity at the point `(x, y)`, in the same length
    /// units as the cell size. Points outside the domain sample its edge.
    /// `None` before [`initialize`](Self::initialize) or for non-finite
    /// coordinates.
    pub fn flow_at(&self, x: f64, y: f64) -> Option<[f64; 2]> {
        let grid = self.grid?;
        if !x.is_finite() || !y.is_finite() {
            return None;
        }
        let m = self.mac(grid);
        let (gx, gy) = (x / self.cell_size, y / self.cell_size);
        Some([m.sample_u(&self.u, gx, gy), m.sample_v(&self.v, gx, gy)])
    }

    fn mac(&self, grid: Grid2D) -> Mac {
        Mac {
            w: grid.width(),
            h: grid.height(),
        }
    }

    fn divergence_into(&self, m: Mac, out: &mut [f64]) {
        let inv_h = 1.0 / self.cell_size;
        for j in 0..m.h {
            for i in 0..m.w {
                let c = m.c(i, j);
                out[c] = if self.solid[c] {
                    0.0
                } else {
                    (self.u[m.u(i + 1, j)] - self.u[m.u(i, j)] + self.v[m.v(i, j + 1)]
                        - self.v[m.v(i, j)])
                        * inv_h
                };
            }
        }
    }

    #[inline]
    fn u_open(&self, m: Mac, i: usize, j: usize) -> bool {
        i > 0 && i < m.w && !self.solid[m.c(i - 1, j)] && !self.solid[m.c(i, j)]
    }

    #[inline]
    fn v_open(&self, m: Mac, i: usize, j: usize) -> bool {
        j > 0 && j < m.h && !self.solid[m.c(i, j - 1)] && !self.solid[m.c(i, j)]
    }

    fn enforce_solid_faces(&mut self, m: Mac) {
        for j in 0..m.h {
            for i in 0..=m.w {
                if !self.u_open(m, i, j) {
                    self.u[m.u(i, j)] = 0.0;
                }
            }
        }
        for j in 0..=m.h {
            for i in 0..m.w {
                if !self.v_open(m, i, j) {
                    self.v[m.v(i, j)] = 0.0;
                }
            }
        }
    }

    fn advect(&mut self, m: Mac, dt: f64) {
        let scale = dt / self.cell_size;

        for j in 0..m.h {
            for i in 0..=m.w {
                let (x, y) = (i as f64, j as f64 + 0.5);
                let vel_x = self.u[m.u(i, j)];
                let vel_y = m.sample_v(&self.v, x, y);
                let (px, py) = (x - scale * vel_x, y - scale * vel_y);
                self.u_tmp[m.u(i, j)] = m.sample_u(&self.u, px, py);
            }
        }
        for j in 0..=m.h {
            for i in 0..m.w {
                let (x, y) = (i as f64 + 0.5, j as f64);
                let vel_x = m.sample_u(&self.u, x, y);
                let vel_y = self.v[m.v(i, j)];
                let (px, py) = (x - scale * vel_x, y - scale * vel_y);
                self.v_tmp[m.v(i, j)] = m.sample_v(&self.v, px, py);
            }
        }
        for j in 0..m.h {
            for i in 0..m.w {
                let c = m.c(i, j);
                if self.solid[c] {
                    self.density_tmp[c] = self.density[c];
                    continue;
                }
                let (x, y) = (i as f64 + 0.5, j as f64 + 0.5);
                let vel_x = m.sample_u(&self.u, x, y);
                let vel_y = m.sample_v(&self.v, x, y);
                let (px, py) = (x - scale * vel_x, y - scale * vel_y);
                self.density_tmp[c] = m.sample_c(&self.density, px, py);
            }
        }

        std::mem::swap(&mut self.u, &mut self.u_tmp);
        std::mem::swap(&mut self.v, &mut self.v_tmp);
        std::mem::swap(&mut self.density, &mut self.density_tmp);
        self.enforce_solid_faces(m);
    }

    fn apply_forces(&mut self, m: Mac, dt: f64) {
        for j in 0..m.h {
            for i in 1..m.w {
                if self.u_open(m, i, j) {
                    let local = 0.5 * (self.force_x[m.c(i - 1, j)] + self.force_x[m.c(i, j)]);
                    self.u[m.u(i, j)] += dt * (self.body_force[0] + local);
                }
            }
        }
        for j in 1..m.h {
            for i in 0..m.w {
                if self.v_open(m, i, j) {
                    let local = 0.5 * (self.force_y[m.c(i, j - 1)] + self.force_y[m.c(i, j)]);
                    self.v[m.v(i, j)] += dt * (self.body_force[1] + local);
                }
            }
        }
        self.force_x.fill(0.0);
        self.force_y.fill(0.0);
    }

    /// Sum of open-neighbour pressures and their count.
    #[inline]
    fn neighbour_pressure(&self, m: Mac, i: usize, j: usize) -> (f64, usize) {
        let mut sum = 0.0;
        let mut n = 0;
        if self.u_open(m, i, j) {
            sum += self.pressure[m.c(i - 1, j)];
            n += 1;
        }
        if self.u_open(m, i + 1, j) {
            sum += self.pressure[m.c(i + 1, j)];
            n += 1;
        }
        if self.v_open(m, i, j) {
            sum += self.pressure[m.c(i, j - 1)];
            n += 1;
        }
        if self.v_open(m, i, j + 1) {
            sum += self.pressure[m.c(i, j + 1)];
            n += 1;
        }
        (sum, n)
    }

    /// Largest divergence that would remain after correcting with the
    /// current pressure.
    fn projected_residual(&self, m: Mac, s: f64) -> f64 {
        let mut max = 0.0f64;
        for j in 0..m.h {
            for i in 0..m.w {
                let c = m.c(i, j);
                if self.solid[c] {
                    continue;
                }
                let (sum, n) = self.neighbour_pressure(m, i, j);
                let r = self.divergence[c] - (sum - n as f64 * self.pressure[c]) / s;
                max = max.max(r.abs());
            }
        }
        max
    }

    fn project(&mut self, m: Mac, dt: f64) {
        let s = self.fluid_density * self.cell_size * self.cell_size / dt;
        let mut divergence = std::mem::take(&mut self.divergence);
        self.divergence_into(m, &mut divergence);
        self.divergence = divergence;

        let mut residual = self.projected_residual(m, s);
        let mut iterations = 0;
        while (residual.is_nan() || residual >= self.tolerance) && iterations < self.max_iterations
        {
            for j in 0..m.h {
                for i in 0..m.w {
                    let c = m.c(i, j);
                    if self.solid[c] {
                        continue;
                    }
                    let (sum, n) = self.neighbour_pressure(m, i, j);
                    if n == 0 {
                        continue;
                    }
                    let gs = (sum - s * self.divergence[c]) / n as f64;
                    self.pressure[c] += self.sor_omega * (gs - self.pressure[c]);
                }
            }
            iterations += 1;
            residual = self.projected_residual(m, s);
        }

        let converged = residual < self.tolerance;
        if !converged {
            tracing::warn!(
                iterations,
                residual,
                tolerance = self.tolerance,
                "pressure solve did not converge"
            );
        }
        self.last_solve = PressureSolve {
            iterations,
            residual,
            converged,
        };
    }

    fn correct(&mut self, m: Mac, dt: f64) {
        let k = dt / (self.fluid_density * self.cell_size);
        for j in 0..m.h {
            for i in 0..=m.w {
                let f = m.u(i, j);
                self.u[f] = if self.u_open(m, i, j) {
                    self.u[f] - k * (self.pressure[m.c(i, j)] - self.pressure[m.c(i - 1, j)])
                } else {
                    0.0
                };
            }
        }
        for j in 0..=m.h {
            for i in 0..m.w {
                let f = m.v(i, j);
                self.v[f] = if self.v_open(m, i, j) {
                    self.v[f] - k * (self.pressure[m.c(i, j)] - self.pressure[m.c(i, j - 1)])
                } else {
                    0.0
                };
            }
        }
    }

    fn refresh_cell_velocity(&mut self, m: Mac) {
        for j in 0..m.h {
            for i in 0..m.w {
                let c = m.c(i, j);
                if self.solid[c] {
                    self.vx[c] = 0.0;
                    self.vy[c] = 0.0;
                } else {
                    self.vx[c] = 0.5 * (self.u[m.u(i, j)] + self.u[m.u(i + 1, j)]);
                    self.vy[c] = 0.5 * (self.v[m.v(i, j)] + self.v[m.v(i, j + 1)]);
                }
            }
        }
    }
}

impl Solver for FluidField {
    fn name(&self) -> &str {
        "fluid_field"
    }

    fn kind(&self) -> SolverKind {
        SolverKind::FiniteDifferenceProjection
    }

    /// A zero `dt` and an uninitialised field are both no-ops.
    fn step(&mut self, dt: f64) -> Result<(), StepError> {
        validate_dt(dt)?;
        let Some(grid) = self.grid else {
            tracing::trace!("step on uninitialised fluid field ignored");
            return Ok(());
        };
        if dt == 0.0 {
            return Ok(());
        }
        let m = self.mac(grid);
        self.advect(m, dt);
        self.apply_forces(m, dt);
        self.project(m, dt);
        self.correct(m, dt);
        self.refresh_cell_velocity(m);
        Ok(())
    }

    fn check_finite(&self) -> Option<Instability> {
        scan_non_finite("face_velocity_x", &self.u)
            .or_else(|| scan_non_finite("face_velocity_y", &self.v))
            .or_else(|| scan_non_finite("pressure", &self.pressure))
            .or_else(|| scan_non_finite("density", &self.density))
    }

    fn observe(&self, out: &mut Observables) {
        if self.grid.is_none() {
            return;
        }
        let energy: f64 = self
            .vx
            .iter()
            .zip(&self.vy)
            .map(|(u, v)| 0.5 * self.fluid_density * (u * u + v * v))
            .sum();
        out.record("kinetic_energy", energy);
        out.record("total_density", self.density.iter().sum());
        out.record("max_divergence", self.max_divergence());
        out.record("pressure_iterations", self.last_solve.iterations as f64);
    }
}

impl FluidFieldBuilder {
    /// Grid dimensions (required).
    pub fn size(mut self, width: usize, height: usize) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Physical edge length of a cell.
    pub fn cell_size(mut self, h: f64) -> Self {
        self.cell_size = h;
        self
    }

    /// Fluid density `ρ` in the pressure equation.
    pub fn fluid_density(mut self, rho: f64) -> Self {
        self.fluid_density = rho;
        self
    }

    /// Uniform acceleration applied every step (e.g. gravity).
    pub fn body_force(mut self, force: [f64; 2]) -> Self {
        self.body_force = force;
        self
    }

    /// Divergence threshold of the pressure solve.
    pub fn tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Sweep cap of the pressure solve.
    pub fn max_iterations(mut self, n: usize) -> Self {
        self.max_iterations = n;
        self
    }

    /// Over-relaxation factor in `(0, 2)`; `1` is plain Gauss-Seidel.
    pub fn sor_omega(mut self, omega: f64) -> Self {
        self.sor_omega = omega;
        self
    }

    /// Solid cells.
    pub fn obstacles(mut self, mask: ObstacleMask) -> Self {
        self.obstacles = Some(mask);
        self
    }

    /// Validate and construct an initialised field at rest.
    pub fn build(self) -> Result<FluidField, ConfigError> {
        for (name, value) in [
            ("cell_size", self.cell_size),
            ("fluid_density", self.fluid_density),
            ("tolerance", self.tolerance),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::InvalidParameter {
                    name,
                    value,
                    expected: "finite and > 0",
                });
            }
        }
        if self.max_iterations == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "max_iterations",
                value: 0.0,
                expected: ">= 1",
            });
        }
        if self.sor_omega.is_nan() || self.sor_omega <= 0.0 || self.sor_omega >= 2.0 {
            return Err(ConfigError::InvalidParameter {
                name: "sor_omega",
                value: self.sor_omega,
                expected: "in (0, 2)",
            });
        }
        for (name, value) in [
            ("body_force.x", self.body_force[0]),
            ("body_force.y", self.body_force[1]),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::InvalidParameter {
                    name,
                    value,
                    expected: "finite",
                });
            }
        }

        let mut field = FluidField {
            cell_size: self.cell_size,
            fluid_density: self.fluid_density,
            body_force: self.body_force,
            tolerance: self.tolerance,
            max_iterations: self.max_iterations,
            sor_omega: self.sor_omega,
            ..FluidField::default()
        };
        field.initialize(self.width, self.height)?;
        if let Some(mask) = &self.obstacles {
            field.set_obstacles(mask)?;
        }
        Ok(field)
    }
}
