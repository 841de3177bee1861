//! The SPH solver: particles, parameters and a swappable provider.

use std::sync::Arc;

use eddy_core::{
    scan_non_finite, scan_non_finite_vec3, validate_dt, ConfigError, Instability, Observables,
    Solver, SolverKind, StepError,
};

use crate::boundary::BoundaryBox;
use crate::parallel::ParallelGridProvider;
use crate::params::SphParams;
use crate::particles::ParticleSet;
use crate::provider::ComputeProvider;

/// CFL factor applied to `h / c` in [`Solver::max_dt`].
const CFL: f64 = 0.4;

/// A weakly compressible SPH fluid.
///
/// ```
/// use eddy_core::Solver;
/// use eddy_sph::{BoundaryBox, SphFluid, SphParams};
///
/// let mut fluid = SphFluid::new(SphParams::default()).unwrap();
/// fluid.create_block(4, 4, 4, 0.02, [0.0, 0.0, 0.0]).unwrap();
/// fluid.set_boundary(Some(BoundaryBox::new([0.0; 3], [0.2; 3], 0.5).unwrap()));
/// fluid.step(0.001).unwrap();
/// assert_eq!(fluid.particles().len(), 64);
/// ```
#[derive(Debug)]
pub struct SphFluid {
    particles: ParticleSet,
    params: SphParams,
    provider: Arc<dyn ComputeProvider>,
    boundary: Option<BoundaryBox>,
}

impl SphFluid {
    /// An empty fluid using the [`ParallelGridProvider`].
    pub fn new(params: SphParams) -> Result<Self, ConfigError> {
        Self::with_provider(params, Arc::new(ParallelGridProvider::default()))
    }

    /// An empty fluid using `provider`.
    pub fn with_provider(
        params: SphParams,
        provider: Arc<dyn ComputeProvider>,
    ) -> Result<Self, ConfigError> {
        params.validate()?;
        tracing::debug!(provider = provider.name(), "SPH fluid constructed");
        Ok(Self {
            particles: ParticleSet::new(),
            params,
            provider,
            boundary: None,
        })
    }

    /// Replace the compute strategy. Particle state is untouched.
    pub fn set_provider(&mut self, provider: Arc<dyn ComputeProvider>) {
        tracing::debug!(
            from = self.provider.name(),
            to = provider.name(),
            "SPH compute provider swapped"
        );
        self.provider = provider;
    }

    /// The current compute strategy.
    pub fn provider(&self) -> &Arc<dyn ComputeProvider> {
        &self.provider
    }

    /// Clamp every particle into the box and reflect crossing velocity
    /// components, scaled by `restitution`.
    #[allow(clippy::too_many_arguments)]
    pub fn enforce_boundary(
        &mut self,
        min_x: f64,
        max_x: f64,
        min_y: f64,
        max_y: f64,
        min_z: f64,
        max_z: f64,
        restitution: f64,
    ) -> Result<usize, ConfigError> {
        let b = BoundaryBox::new([min_x, min_y, min_z], [max_x, max_y, max_z], restitution)?;
        let state = self.particles.state();
        Ok(b.apply(state.positions, state.velocities))
    }

    /// Walls applied automatically after every step (`None` for none).
    pub fn set_boundary(&mut self, boundary: Option<BoundaryBox>) {
        self.boundary = boundary;
    }

    /// The walls applied after every step.
    pub fn boundary(&self) -> Option<&BoundaryBox> {
        self.boundary.as_ref()
    }

    /// Append an `nx × ny × nz` lattice of particles at rest with the
    /// given spacing, first particle at `start`. Returns the number added.
    pub fn create_block(
        &mut self,
        nx: usize,
        ny: usize,
        nz: usize,
        spacing: f64,
        start: [f64; 3],
    ) -> Result<usize, ConfigError> {
        if !spacing.is_finite() || spacing <= 0.0 {
            return Err(ConfigError::InvalidParameter {
                name: "spacing",
                value: spacing,
                expected: "finite and > 0",
            });
        }
        if let Some(&s) = start.iter().find(|s| !s.is_finite()) {
            return Err(ConfigError::InvalidParameter {
                name: "start",
                value: s,
                expected: "finite",
            });
        }
        self.particles.extend_block(nx, ny, nz, spacing, start);
        Ok(nx * ny * nz)
    }

    /// Replace all particles.
    pub fn set_particles(&mut self, particles: ParticleSet) {
        self.particles = particles;
    }

    /// The particles.
    pub fn particles(&self) -> &ParticleSet {
        &self.particles
    }

    /// Mutable particles.
    pub fn particles_mut(&mut self) -> &mut ParticleSet {
        &mut self.particles
    }

    /// Simulation parameters.
    pub fn params(&self) -> &SphParams {
        &self.params
    }

    /// Replace the parameters after validating them.
    pub fn set_params(&mut self, params: SphParams) -> Result<(), ConfigError> {
        params.validate()?;
        self.params = params;
        Ok(())
    }

    /// `Σ ½ m |v|²`.
    pub fn kinetic_energy(&self) -> f64 {
        let m = self.params.mass;
        self.particles
            .velocities()
            .iter()
            .map(|v| 0.5 * m * (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]))
            .sum()
    }
}

impl Solver for SphFluid {
    fn name(&self) -> &str {
        "sph"
    }

    fn kind(&self) -> SolverKind {
        SolverKind::Sph
    }

    fn step(&mut self, dt: f64) -> Result<(), StepError> {
        validate_dt(dt)?;
        if self.particles.is_empty() {
            return Ok(());
        }
        let mut state = self.particles.state();
        self.provider.compute(&mut state, &self.params, dt)?;
        if let Some(b) = &self.boundary {
            b.apply(state.positions, state.velocities);
        }
        Ok(())
    }

    fn max_dt(&self) -> Option<f64> {
        let c = self.params.sound_speed();
        (c > 0.0).then(|| CFL * self.params.smoothing_radius / c)
    }

    fn check_finite(&self) -> Option<Instability> {
        scan_non_finite_vec3("positions", self.particles.positions())
            .or_else(|| scan_non_finite_vec3("velocities", self.particles.velocities()))
            .or_else(|| scan_non_finite("densities", self.particles.densities()))
    }

    fn observe(&self, out: &mut Observables) {
        let n = self.particles.len();
        out.record("particle_count", n as f64);
        out.record("kinetic_energy", self.kinetic_energy());
        if n > 0 {
            let mean = self.particles.densities().iter().sum::<f64>() / n as f64;
            out.record("mean_density", mean);
        }
    }
}
