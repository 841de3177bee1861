//! Lockstep (synchronous) solver driver.
//!
//! [`LockstepRunner`] is the user-facing way to advance a solver with a
//! fixed timestep. Each [`step_sync()`](LockstepRunner::step_sync) call
//! runs one solver step, scans the new state for NaN/Inf according to
//! the configured [`InstabilityPolicy`], and returns the step's metrics.
//!
//! # Halting
//!
//! Under [`InstabilityPolicy::Halt`] the step that first produces
//! non-finite state still returns `Ok`, with the hit in
//! [`StepResult::instability`]. Every later call fails with
//! [`StepError::Halted`] until [`resume()`](LockstepRunner::resume), so
//! the solver's last frame stays inspectable.

use std::time::Instant;

use eddy_core::{ConfigError, Instability, Observables, Solver, StepError, StepId};

use crate::config::{InstabilityPolicy, RunConfig};
use crate::metrics::StepMetrics;

// Compile-time assertion: LockstepRunner can move between threads.
const _: () = {
    #[allow(dead_code)]
    fn assert_send<T: Send>() {}
    #[allow(dead_code)]
    fn check() {
        assert_send::<LockstepRunner>();
    }
};

// ── StepResult ──────────────────────────────────────────────────

/// Result of a successful [`LockstepRunner::step_sync()`] call.
#[derive(Clone, Debug)]
pub struct StepResult {
    /// Timing and observables for this step.
    pub metrics: StepMetrics,
    /// First non-finite value left by this step, if the policy scans.
    pub instability: Option<Instability>,
}

impl StepResult {
    /// The step this result describes.
    pub fn step(&self) -> StepId {
        self.metrics.step
    }
}

// ── LockstepRunner ──────────────────────────────────────────────

/// Single-threaded driver stepping one solver at a fixed `dt`.
///
/// # Example
///
/// ```
/// use eddy_core::Solver;
/// use eddy_engine::{LockstepRunner, RunConfig};
/// use eddy_solvers::LatticeBoltzmann;
///
/// let lbm = LatticeBoltzmann::builder().size(8, 8).build().unwrap();
/// let mut runner = LockstepRunner::new(Box::new(lbm), RunConfig::default()).unwrap();
/// let result = runner.step_sync().unwrap();
/// assert_eq!(result.step().0, 1);
/// assert!(result.metrics.observables.get("total_mass").is_some());
/// ```
pub struct LockstepRunner {
    solver: Box<dyn Solver>,
    config: RunConfig,
    current: StepId,
    halted: Option<Instability>,
    last_metrics: StepMetrics,
}

impl LockstepRunner {
    /// Wrap `solver`, validating `config.dt` against the solver's
    /// [`max_dt()`](Solver::max_dt).
    pub fn new(solver: Box<dyn Solver>, config: RunConfig) -> Result<Self, ConfigError> {
        config.validate(solver.max_dt())?;
        tracing::debug!(
            solver = solver.name(),
            kind = ?solver.kind(),
            dt = config.dt,
            policy = ?config.instability_policy,
            "lockstep runner constructed"
        );
        Ok(Self {
            solver,
            config,
            current: StepId::default(),
            halted: None,
            last_metrics: StepMetrics::default(),
        })
    }

    /// Execute one step synchronously.
    ///
    /// # Errors
    ///
    /// [`StepError::Halted`] while halted, otherwise whatever the solver's
    /// `step()` returns. A failed step does not advance the step counter.
    pub fn step_sync(&mut self) -> Result<StepResult, StepError> {
        if let Some(instability) = &self.halted {
            return Err(StepError::Halted {
                instability: instability.clone(),
            });
        }

        let step_start = Instant::now();
        self.solver.step(self.config.dt)?;
        let total_us = elapsed_us(step_start);
        self.current = self.current.next();

        let scan_start = Instant::now();
        let instability = match self.config.instability_policy {
            InstabilityPolicy::Ignore => None,
            InstabilityPolicy::Warn | InstabilityPolicy::Halt => self.solver.check_finite(),
        };
        let scan_us = match self.config.instability_policy {
            InstabilityPolicy::Ignore => 0,
            _ => elapsed_us(scan_start),
        };

        if let Some(hit) = &instability {
            tracing::warn!(
                solver = self.solver.name(),
                step = self.current.0,
                field = hit.field,
                index = hit.index,
                value = hit.value,
                "non-finite solver state"
            );
            if self.config.instability_policy == InstabilityPolicy::Halt {
                self.halted = Some(hit.clone());
            }
        }

        let mut observables = Observables::new();
        self.solver.observe(&mut observables);
        self.last_metrics = StepMetrics {
            step: self.current,
            total_us,
            scan_us,
            observables,
        };
        Ok(StepResult {
            metrics: self.last_metrics.clone(),
            instability,
        })
    }

    /// Step up to `steps` times, stopping at the first error.
    ///
    /// Returns the first instability reported along the way.
    pub fn run(&mut self, steps: u64) -> Result<Option<Instability>, StepError> {
        let mut first = None;
        for _ in 0..steps {
            let result = self.step_sync()?;
            if first.is_none() {
                first = result.instability;
            }
        }
        Ok(first)
    }

    /// Clear a halt so stepping can continue.
    pub fn resume(&mut self) {
        if let Some(hit) = self.halted.take() {
            tracing::debug!(solver = self.solver.name(), field = hit.field, "runner resumed");
        }
    }

    /// Whether stepping is halted.
    pub fn is_halted(&self) -> bool {
        self.halted.is_some()
    }

    /// The instability that halted the runner, if any.
    pub fn halted_by(&self) -> Option<&Instability> {
        self.halted.as_ref()
    }

    /// Number of completed steps (0 after construction).
    pub fn current_step(&self) -> StepId {
        self.current
    }

    /// Metrics from the most recent successful step.
    pub fn last_metrics(&self) -> &StepMetrics {
        &self.last_metrics
    }

    /// The run configuration.
    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// The driven solver.
    pub fn solver(&self) -> &dyn Solver {
        self.solver.as_ref()
    }

    /// Mutable access to the driven solver.
    pub fn solver_mut(&mut self) -> &mut dyn Solver {
        self.solver.as_mut()
    }

    /// Give the solver back.
    pub fn into_solver(self) -> Box<dyn Solver> {
        self.solver
    }
}

fn elapsed_us(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_micros()).unwrap_or(u64::MAX)
}

impl std::fmt::Debug for LockstepRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockstepRunner")
            .field("solver", &self.solver.name())
            .field("current_step", &self.current)
            .field("config", &self.config)
            .field("halted", &self.halted)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eddy_core::{validate_dt, SolverKind};

    struct Ticker {
        steps: u64,
        poison_at: Option<u64>,
    }

    impl Solver for Ticker {
        fn name(&self) -> &str {
            "ticker"
        }
        fn kind(&self) -> SolverKind {
            SolverKind::FiniteDifferenceProjection
        }
        fn step(&mut self, dt: f64) -> Result<(), StepError> {
            validate_dt(dt)?;
            self.steps += 1;
            Ok(())
        }
        fn max_dt(&self) -> Option<f64> {
            Some(1.0)
        }
        fn check_finite(&self) -> Option<Instability> {
            match self.poison_at {
                Some(n) if self.steps >= n => Some(Instability {
                    field: "value",
                    index: 3,
                    value: f64::INFINITY,
                }),
                _ => None,
            }
        }
        fn observe(&self, out: &mut Observables) {
            out.record("steps", self.steps as f64);
        }
    }

    fn ticker(poison_at: Option<u64>) -> Box<dyn Solver> {
        Box::new(Ticker {
            steps: 0,
            poison_at,
        })
    }

    #[test]
    fn new_validates_dt_against_solver() {
        let err = LockstepRunner::new(ticker(None), RunConfig::with_dt(2.0)).unwrap_err();
        assert!(matches!(err, ConfigError::DtOutOfRange { .. }));
        let err = LockstepRunner::new(ticker(None), RunConfig::with_dt(0.0)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidDt { .. }));
    }

    #[test]
    fn step_ids_and_observables() {
        let mut r = LockstepRunner::new(ticker(None), RunConfig::with_dt(0.5)).unwrap();
        assert_eq!(r.current_step(), StepId(0));
        let res = r.step_sync().unwrap();
        assert_eq!(res.step(), StepId(1));
        assert_eq!(res.metrics.observables.get("steps"), Some(1.0));
        assert!(res.instability.is_none());
        r.run(4).unwrap();
        assert_eq!(r.current_step(), StepId(5));
        assert_eq!(r.last_metrics().step, StepId(5));
    }

    #[test]
    fn halt_blocks_until_resume() {
        let config = RunConfig::with_dt(1.0).policy(InstabilityPolicy::Halt);
        let mut r = LockstepRunner::new(ticker(Some(2)), config).unwrap();
        assert!(r.step_sync().unwrap().instability.is_none());
        let hit = r.step_sync().unwrap().instability.unwrap();
        assert_eq!(hit.index, 3);
        assert!(r.is_halted());
        assert!(matches!(r.step_sync(), Err(StepError::Halted { .. })));
        assert_eq!(r.current_step(), StepId(2));

        r.resume();
        assert!(!r.is_halted());
        // Still poisoned, so the next step halts again.
        assert!(r.step_sync().unwrap().instability.is_some());
        assert!(r.halted_by().is_some());
    }

    #[test]
    fn ignore_skips_the_scan() {
        let config = RunConfig::with_dt(1.0).policy(InstabilityPolicy::Ignore);
        let mut r = LockstepRunner::new(ticker(Some(0)), config).unwrap();
        assert_eq!(r.run(3).unwrap(), None);
        assert_eq!(r.last_metrics().scan_us, 0);
    }

    #[test]
    fn debug_names_the_solver() {
        let r = LockstepRunner::new(ticker(None), RunConfig::default()).unwrap();
        assert!(format!("{r:?}").contains("ticker"));
    }

    #[test]
    fn into_solver_keeps_state() {
        let mut r = LockstepRunner::new(ticker(None), RunConfig::with_dt(0.5)).unwrap();
        r.run(3).unwrap();
        let solver = r.into_solver();
        let mut out = Observables::new();
        solver.observe(&mut out);
        assert_eq!(out.get("steps"), Some(3.0));
    }
}
