//! The [`Solver`] trait and [`SolverKind`] enum.
//!
//! Every simulation strategy in eddy (lattice Boltzmann, SPH, and the
//! finite-difference projection solver) advances its own state through
//! the same `step(dt)` entry point. Drivers depend only on this trait.

use crate::error::StepError;
use crate::instability::Instability;
use crate::observables::Observables;

/// The family a solver belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SolverKind {
    /// Mesoscopic D2Q9 lattice-Boltzmann scheme (optionally with a
    /// turbulence closure).
    LatticeBoltzmann,
    /// Lagrangian smoothed-particle hydrodynamics.
    Sph,
    /// Eulerian finite-difference advection and pressure projection.
    FiniteDifferenceProjection,
}

/// A simulation that owns its state and advances it one step at a time.
///
/// # Contract
///
/// - `step()` runs to completion synchronously; it never blocks.
/// - Numerically degenerate output (NaN, blow-up) is not an error. It is
///   reported by [`check_finite()`](Solver::check_finite) and the driver
///   decides what to do with it.
/// - `step()` returns `Err` only for an invalid `dt` or a failing
///   compute backend.
///
/// # Object safety
///
/// This trait is object-safe; drivers store solvers as `Box<dyn Solver>`.
///
/// # Examples
///
/// ```
/// use eddy_core::{validate_dt, Solver, SolverKind, StepError};
///
/// struct Decay {
///     value: f64,
/// }
///
/// impl Solver for Decay {
///     fn name(&self) -> &str { "decay" }
///     fn kind(&self) -> SolverKind { SolverKind::FiniteDifferenceProjection }
///     fn step(&mut self, dt: f64) -> Result<(), StepError> {
///         validate_dt(dt)?;
///         self.value *= (-dt).exp();
///         Ok(())
///     }
/// }
///
/// let mut s: Box<dyn Solver> = Box::new(Decay { value: 1.0 });
/// s.step(0.5).unwrap();
/// assert!(s.step(f64::NAN).is_err());
/// ```
pub trait Solver: Send + 'static {
    /// Human-readable name for logs and metrics.
    fn name(&self) -> &str;

    /// Which family this solver belongs to.
    fn kind(&self) -> SolverKind;

    /// Advance the owned state by one step of length `dt`.
    fn step(&mut self, dt: f64) -> Result<(), StepError>;

    /// Largest timestep for which the scheme is expected to be stable.
    ///
    /// Drivers validate their configured `dt` against this at startup.
    /// Return `None` to impose no constraint.
    fn max_dt(&self) -> Option<f64> {
        None
    }

    /// Scan owned state for the first NaN or infinite value.
    fn check_finite(&self) -> Option<Instability> {
        None
    }

    /// Record named scalar diagnostics of the current state.
    fn observe(&self, _out: &mut Observables) {}
}

/// Reject a `dt` that is NaN, infinite or negative.
///
/// A zero `dt` is accepted; solvers treat it as a step that leaves
/// time-integrated quantities unchanged.
pub fn validate_dt(dt: f64) -> Result<(), StepError> {
    if dt.is_finite() && dt >= 0.0 {
        Ok(())
    } else {
        Err(StepError::InvalidDt { dt })
    }
}
