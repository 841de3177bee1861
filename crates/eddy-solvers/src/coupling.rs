//! Lattice-Boltzmann flow closed by the k-ε model.
//!
//! Per step: the LBM advances, the velocity-gradient tensor of its new
//! velocity field drives one k-ε step (`dt = 1` lattice unit), and the
//! resulting `ν + νT` becomes the LBM's per-cell viscosity for the
//! *following* step.

use eddy_core::{
    validate_dt, ConfigError, Instability, Observables, Solver, SolverKind, StepError,
};
use eddy_grid::VelocityGradients;

use crate::k_epsilon::KEpsilonModel;
use crate::lbm::LatticeBoltzmann;

/// An [`LatticeBoltzmann`] solver with a [`KEpsilonModel`] closure.
#[derive(Debug)]
pub struct TurbulentLbm {
    lbm: LatticeBoltzmann,
    model: KEpsilonModel,
    gradients: VelocityGradients,
}

impl TurbulentLbm {
    /// Couple `lbm` and `model`. Both must share a grid.
    pub fn new(lbm: LatticeBoltzmann, model: KEpsilonModel) -> Result<Self, ConfigError> {
        if lbm.grid() != model.grid() {
            return Err(ConfigError::LengthMismatch {
                what: "turbulence grid",
                expected: lbm.grid().cell_count(),
                actual: model.grid().cell_count(),
            });
        }
        let gradients = VelocityGradients::zeros(lbm.grid());
        Ok(Self {
            lbm,
            model,
            gradients,
        })
    }

    /// Couple `lbm` with a default k-ε model whose molecular viscosity is
    /// the LBM's base viscosity.
    pub fn with_default_closure(lbm: LatticeBoltzmann) -> Result<Self, ConfigError> {
        let grid = lbm.grid();
        let model = KEpsilonModel::builder()
            .size(grid.width(), grid.height())
            .molecular_viscosity(lbm.viscosity())
            .build()?;
        Self::new(lbm, model)
    }

    /// Overwrite the k-ε inflow column (see
    /// [`KEpsilonModel::set_inlet_conditions`]).
    pub fn set_inlet_turbulence(&mut self, k: f64, epsilon: f64) -> Result<(), ConfigError> {
        self.model.set_inlet_conditions(k, epsilon)
    }

    /// The base flow solver.
    pub fn lbm(&self) -> &LatticeBoltzmann {
        &self.lbm
    }

    /// Mutable access to the base flow solver.
    pub fn lbm_mut(&mut self) -> &mut LatticeBoltzmann {
        &mut self.lbm
    }

    /// The turbulence closure.
    pub fn model(&self) -> &KEpsilonModel {
        &self.model
    }

    /// Mutable access to the turbulence closure.
    pub fn model_mut(&mut self) -> &mut KEpsilonModel {
        &mut self.model
    }

    /// Velocity gradients from the last step.
    pub fn gradients(&self) -> &VelocityGradients {
        &self.gradients
    }

    fn couple(&mut self) -> Result<(), ConfigError> {
        self.lbm.velocity_gradients_into(&mut self.gradients)?;
        self.model.step(&self.gradients, 1.0)?;
        self.lbm
            .set_effective_viscosity(&self.model.effective_viscosity())
    }
}

impl Solver for TurbulentLbm {
    fn name(&self) -> &str {
        "turbulent_lattice_boltzmann"
    }

    fn kind(&self) -> SolverKind {
        SolverKind::LatticeBoltzmann
    }

    fn step(&mut self, dt: f64) -> Result<(), StepError> {
        validate_dt(dt)?;
        self.lbm.step(dt)?;
        self.couple().map_err(|e| StepError::ProviderFailed {
            name: "k_epsilon".into(),
            reason: e.to_string(),
        })
    }

    fn check_finite(&self) -> Option<Instability> {
        self.lbm
            .check_finite()
            .or_else(|| self.model.check_finite())
    }

    fn observe(&self, out: &mut Observables) {
        self.lbm.observe(out);
        let nu_t = self.model.turbulent_viscosity();
        let n = nu_t.len() as f64;
        out.record("mean_turbulent_viscosity", nu_t.iter().sum::<f64>() / n);
        out.record("max_turbulent_viscosity", nu_t.iter().copied().fold(0.0, f64::max));
        out.record("mean_k", self.model.k().iter().sum::<f64>() / n);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eddy_grid::InletProfile;

    fn channel() -> LatticeBoltzmann {
        LatticeBoltzmann::builder()
            .size(16, 10)
            .viscosity(0.05)
            .inlet(InletProfile::Parabolic { peak: 0.05 })
            .build()
            .unwrap()
    }

    #[test]
    fn grids_must_match() {
        let model = KEpsilonModel::builder().size(4, 4).build().unwrap();
        assert!(matches!(
            TurbulentLbm::new(channel(), model),
            Err(ConfigError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn default_closure_uses_lbm_viscosity() {
        let t = TurbulentLbm::with_default_closure(channel()).unwrap();
        assert_eq!(t.model().molecular_viscosity(), 0.05);
    }

    #[test]
    fn steps_stay_finite_and_positive() {
        let mut t = TurbulentLbm::with_default_closure(channel()).unwrap();
        for _ in 0..40 {
            t.step(1.0).unwrap();
        }
        assert!(t.check_finite().is_none());
        assert!(t.model().k().iter().all(|&k| k >= 1e-10));
        let mut obs = Observables::new();
        t.observe(&mut obs);
        assert!(obs.get("mean_turbulent_viscosity").unwrap() >= 0.0);
        assert!(obs.get("total_mass").is_some());
    }
}
