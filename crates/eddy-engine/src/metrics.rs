//! Per-step metrics reported by the runner.

use eddy_core::{Observables, StepId};

/// Timing and diagnostics collected during a single step.
#[derive(Clone, Debug, Default)]
pub struct StepMetrics {
    /// The step these metrics describe.
    pub step: StepId,
    /// Wall-clock time of `Solver::step`, in microseconds.
    pub total_us: u64,
    /// Wall-clock time of the instability scan, in microseconds (zero
    /// under [`InstabilityPolicy::Ignore`](crate::InstabilityPolicy::Ignore)).
    pub scan_us: u64,
    /// The solver's observables after the step.
    pub observables: Observables,
}
