//! Integration test: k-ε closure driven by a lattice-Boltzmann wake.

use eddy_core::{Observables, Solver, SolverKind};
use eddy_grid::{EdgeBehavior, VelocityGradients};
use eddy_solvers::{KEpsilonModel, TurbulentLbm};
use eddy_test_utils::fixtures::{wake_channel, WAKE_INLET, WAKE_VISCOSITY};

#[test]
fn coupled_wake_stays_bounded() {
    let mut solver = TurbulentLbm::with_default_closure(wake_channel()).unwrap();
    let model = solver.model();
    let (k_in, eps_in) = model
        .estimate_inlet_conditions(WAKE_INLET, 0.05, 3.0)
        .unwrap();
    solver.set_inlet_turbulence(k_in, eps_in).unwrap();
    assert_eq!(solver.kind(), SolverKind::LatticeBoltzmann);

    for _ in 0..100 {
        solver.step(1.0).unwrap();
    }
    assert!(solver.check_finite().is_none());

    let model = solver.model();
    let c = *model.constants();
    assert!(model.k().iter().all(|&k| k >= c.k_min));
    assert!(model.epsilon().iter().all(|&e| e >= c.eps_min));

    // The wake shears the flow, so somewhere the closure adds viscosity.
    let nu_eff = model.effective_viscosity();
    assert!(nu_eff.iter().all(|&nu| nu >= WAKE_VISCOSITY));

    let mut obs = Observables::new();
    solver.observe(&mut obs);
    assert!(obs.get("max_turbulent_viscosity").unwrap() > 0.0);
}

#[test]
fn production_peaks_where_the_flow_shears() {
    let mut lbm = wake_channel();
    for _ in 0..100 {
        lbm.step(1.0).unwrap();
    }
    let grid = lbm.grid();
    let g = VelocityGradients::compute(
        grid,
        lbm.velocity_x(),
        lbm.velocity_y(),
        EdgeBehavior::Clamp,
    )
    .unwrap();

    let mut model = KEpsilonModel::builder()
        .size(grid.width(), grid.height())
        .molecular_viscosity(WAKE_VISCOSITY)
        .initial(1e-4, 1e-6)
        .build()
        .unwrap();
    model.step(&g, 1.0).unwrap();

    let p = model.production();
    let edge_of_block = p[grid.index(16, 18)];
    let far_field = p[grid.index(6, 8)];
    assert!(
        edge_of_block > far_field,
        "shear layer {edge_of_block} vs far field {far_field}"
    );
}
