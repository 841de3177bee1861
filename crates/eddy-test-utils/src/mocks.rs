//! Mock solvers for driver tests.
//!
//! - [`CountingSolver`]: counts steps, shares the counter.
//! - [`NanAfterSolver`]: reports a NaN once N steps have run.
//! - [`FailingSolver`]: returns a provider error after N steps.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use eddy_core::{validate_dt, Instability, Observables, Solver, SolverKind, StepError};

/// Counts successful steps. Clone the handle from
/// [`counter`](Self::counter) before boxing the solver.
#[derive(Debug, Default)]
pub struct CountingSolver {
    steps: Arc<AtomicU64>,
    pub max_dt: Option<f64>,
}

impl CountingSolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// A solver advertising a stability ceiling.
    pub fn with_max_dt(max_dt: f64) -> Self {
        Self {
            max_dt: Some(max_dt),
            ..Self::default()
        }
    }

    pub fn counter(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.steps)
    }
}

impl Solver for CountingSolver {
    fn name(&self) -> &str {
        "counting"
    }

    fn kind(&self) -> SolverKind {
        SolverKind::FiniteDifferenceProjection
    }

    fn step(&mut self, dt: f64) -> Result<(), StepError> {
        validate_dt(dt)?;
        self.steps.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn max_dt(&self) -> Option<f64> {
        self.max_dt
    }

    fn observe(&self, out: &mut Observables) {
        out.record("steps", self.steps.load(Ordering::Relaxed) as f64);
    }
}

/// Healthy for `healthy_steps` steps, then holds a NaN in its state.
#[derive(Debug)]
pub struct NanAfterSolver {
    pub healthy_steps: u64,
    steps: u64,
}

impl NanAfterSolver {
    pub fn new(healthy_steps: u64) -> Self {
        Self {
            healthy_steps,
            steps: 0,
        }
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }
}

impl Solver for NanAfterSolver {
    fn name(&self) -> &str {
        "nan_after"
    }

    fn kind(&self) -> SolverKind {
        SolverKind::LatticeBoltzmann
    }

    fn step(&mut self, dt: f64) -> Result<(), StepError> {
        validate_dt(dt)?;
        self.steps += 1;
        Ok(())
    }

    fn check_finite(&self) -> Option<Instability> {
        (self.steps > self.healthy_steps).then_some(Instability {
            field: "density",
            index: 0,
            value: f64::NAN,
        })
    }

    fn observe(&self, out: &mut Observables) {
        out.record("steps", self.steps as f64);
    }
}

/// Succeeds `succeed_count` times, then fails every step.
#[derive(Debug)]
pub struct FailingSolver {
    pub succeed_count: u64,
    calls: u64,
}

impl FailingSolver {
    pub fn new(succeed_count: u64) -> Self {
        Self {
            succeed_count,
            calls: 0,
        }
    }
}

impl Solver for FailingSolver {
    fn name(&self) -> &str {
        "failing"
    }

    fn kind(&self) -> SolverKind {
        SolverKind::Sph
    }

    fn step(&mut self, dt: f64) -> Result<(), StepError> {
        validate_dt(dt)?;
        let n = self.calls;
        self.calls += 1;
        if n >= self.succeed_count {
            return Err(StepError::ProviderFailed {
                name: "failing".into(),
                reason: format!(
                    "deliberate failure after {} successful calls",
                    self.succeed_count
                ),
            });
        }
        Ok(())
    }
}
