//! Integration test: NaN detection under each instability policy.
//!
//! Verifies that non-finite solver state is surfaced on the step result
//! as a warning, that only `InstabilityPolicy::Halt` stops the run, and
//! that solver errors propagate unchanged through the runner.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use eddy_core::{ConfigError, Solver, StepError, StepId};
use eddy_engine::{InstabilityPolicy, LockstepRunner, RunConfig};
use eddy_sph::{DirectSumProvider, ParticleSet, SphFluid, SphParams};
use eddy_test_utils::fixtures::{resting_lattice, wake_channel};
use eddy_test_utils::mocks::{CountingSolver, FailingSolver, NanAfterSolver};

// ── Helpers ──────────────────────────────────────────────────────────

const DT: f64 = 1e-3;

fn runner(solver: impl Solver, policy: InstabilityPolicy) -> LockstepRunner {
    LockstepRunner::new(Box::new(solver), RunConfig::with_dt(DT).policy(policy)).unwrap()
}

/// Two SPH particles, one carrying a NaN velocity.
fn poisoned_fluid() -> SphFluid {
    let mut fluid =
        SphFluid::with_provider(SphParams::default(), Arc::new(DirectSumProvider)).unwrap();
    fluid.set_particles(ParticleSet::from_positions(vec![
        [0.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
    ]));
    fluid.particles_mut().velocities_mut()[1] = [f64::NAN, 0.0, 0.0];
    fluid
}

/// Default-provider fluid with one particle at infinity and one far away.
fn blown_up_fluid() -> SphFluid {
    let mut fluid = SphFluid::new(SphParams::default()).unwrap();
    fluid.set_particles(ParticleSet::from_positions(vec![
        [0.0, 0.0, 0.0],
        [f64::INFINITY, 0.0, 0.0],
        [1e20, 0.0, 0.0],
    ]));
    fluid
}

// ── Warn ─────────────────────────────────────────────────────────────

#[test]
fn warn_surfaces_nan_and_keeps_stepping() {
    let mut r = runner(NanAfterSolver::new(3), InstabilityPolicy::Warn);
    for step in 1..=3u64 {
        let res = r.step_sync().unwrap();
        assert!(res.instability.is_none(), "step {step} should be clean");
    }
    let res = r.step_sync().unwrap();
    let hit = res.instability.expect("step 4 reports NaN");
    assert_eq!(hit.field, "density");
    assert!(hit.value.is_nan());

    // Warn never halts.
    for _ in 0..5 {
        assert!(r.step_sync().unwrap().instability.is_some());
    }
    assert!(!r.is_halted());
    assert_eq!(r.current_step(), StepId(9));
}

#[test]
fn run_reports_first_instability() {
    let mut r = runner(NanAfterSolver::new(2), InstabilityPolicy::Warn);
    let first = r.run(6).unwrap().expect("instability during run");
    assert_eq!(first.index, 0);
    assert_eq!(r.current_step(), StepId(6));
}

#[test]
fn sph_nan_is_detected() {
    let mut r = runner(poisoned_fluid(), InstabilityPolicy::Warn);
    let hit = r.step_sync().unwrap().instability.expect("NaN detected");
    assert_eq!(hit.index, 1);
    assert!(hit.field == "positions" || hit.field == "velocities");
}

#[test]
fn blown_up_sph_is_reported_not_fatal() {
    let fluid = blown_up_fluid();
    assert_eq!(fluid.provider().name(), "parallel_grid");
    let mut r = runner(fluid, InstabilityPolicy::Warn);
    let hit = r.step_sync().unwrap().instability.expect("infinite position detected");
    assert_eq!(hit.field, "positions");
    assert_eq!(hit.index, 1);
    assert!(r.step_sync().unwrap().instability.is_some());
}

// ── Halt ─────────────────────────────────────────────────────────────

#[test]
fn halt_stops_after_the_offending_step() {
    let mut r = runner(NanAfterSolver::new(2), InstabilityPolicy::Halt);
    r.step_sync().unwrap();
    r.step_sync().unwrap();
    // The offending step itself succeeds and reports the hit.
    assert!(r.step_sync().unwrap().instability.is_some());
    assert!(r.is_halted());

    match r.step_sync() {
        Err(StepError::Halted { instability }) => {
            assert_eq!(instability.field, "density");
        }
        other => panic!("expected Halted, got {other:?}"),
    }
    // A halted runner does not advance.
    assert_eq!(r.current_step(), StepId(3));
    assert_eq!(r.last_metrics().observables.get("steps"), Some(3.0));
}

#[test]
fn run_stops_early_when_halted() {
    let mut r = runner(NanAfterSolver::new(1), InstabilityPolicy::Halt);
    let err = r.run(10).unwrap_err();
    assert!(matches!(err, StepError::Halted { .. }));
    assert_eq!(r.current_step(), StepId(2));
}

#[test]
fn resume_allows_stepping_again() {
    let mut r = runner(NanAfterSolver::new(0), InstabilityPolicy::Halt);
    assert!(r.step_sync().unwrap().instability.is_some());
    assert!(r.step_sync().is_err());
    r.resume();
    assert!(r.step_sync().is_ok());
    assert_eq!(r.current_step(), StepId(2));
}

// ── Ignore ───────────────────────────────────────────────────────────

#[test]
fn ignore_never_scans() {
    let mut r = runner(poisoned_fluid(), InstabilityPolicy::Ignore);
    assert_eq!(r.run(3).unwrap(), None);
    assert!(!r.is_halted());
    // The state is still poisoned; the solver itself can tell.
    assert!(r.solver().check_finite().is_some());
}

// ── Errors and configuration ─────────────────────────────────────────

#[test]
fn solver_errors_propagate() {
    let mut r = runner(FailingSolver::new(2), InstabilityPolicy::Halt);
    r.run(2).unwrap();
    let err = r.step_sync().unwrap_err();
    assert!(matches!(err, StepError::ProviderFailed { ref name, .. } if name == "failing"));
    assert_eq!(r.current_step(), StepId(2));
    assert!(!r.is_halted());
}

#[test]
fn dt_is_checked_against_max_dt() {
    let solver = CountingSolver::with_max_dt(0.05);
    let counter = solver.counter();
    let err = LockstepRunner::new(Box::new(solver), RunConfig::with_dt(0.1)).unwrap_err();
    assert_eq!(
        err,
        ConfigError::DtOutOfRange {
            dt: 0.1,
            max_dt: 0.05
        }
    );
    assert_eq!(counter.load(Ordering::Relaxed), 0);

    let sph = SphFluid::new(SphParams::default()).unwrap();
    let limit = sph.max_dt().unwrap();
    assert!(LockstepRunner::new(Box::new(sph), RunConfig::with_dt(limit * 2.0)).is_err());
}

#[test]
fn counting_solver_counts_through_the_runner() {
    let solver = CountingSolver::new();
    let counter = solver.counter();
    let mut r = runner(solver, InstabilityPolicy::Warn);
    r.run(7).unwrap();
    assert_eq!(counter.load(Ordering::Relaxed), 7);
    assert_eq!(r.last_metrics().observables.get("steps"), Some(7.0));
}

// ── Real solvers stay clean ──────────────────────────────────────────

#[test]
fn healthy_lattices_report_nothing() {
    let config = RunConfig::default().policy(InstabilityPolicy::Halt);
    let mut resting = LockstepRunner::new(Box::new(resting_lattice(8, 8)), config.clone()).unwrap();
    assert_eq!(resting.run(20).unwrap(), None);

    let mut wake = LockstepRunner::new(Box::new(wake_channel()), config).unwrap();
    assert_eq!(wake.run(50).unwrap(), None);
    let mass = wake.last_metrics().observables.get("total_mass").unwrap();
    assert!(mass > 0.0);
}
