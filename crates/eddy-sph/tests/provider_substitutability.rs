//! Integration test: every compute provider produces the same physics.
//!
//! The parallel provider visits neighbours in spatial-hash order and the
//! direct provider in index order, so results differ only by rounding.

use std::sync::Arc;

use eddy_core::Solver;
use eddy_sph::{
    BoundaryBox, ComputeProvider, DirectSumProvider, ParallelGridProvider, ParticleSet, SphFluid,
    SphParams,
};
use eddy_test_utils::assert_slices_close;
use eddy_test_utils::fixtures::stirred_cloud;

fn flatten(v: &[[f64; 3]]) -> Vec<f64> {
    v.iter().flatten().copied().collect()
}

fn run(provider: Arc<dyn ComputeProvider>, particles: ParticleSet, steps: usize) -> SphFluid {
    let params = SphParams::default();
    let mut fluid = SphFluid::with_provider(params, provider).unwrap();
    fluid.set_particles(particles);
    fluid.set_boundary(Some(BoundaryBox::new([0.0; 3], [0.1; 3], 0.5).unwrap()));
    let dt = fluid.max_dt().unwrap().min(1e-3);
    for _ in 0..steps {
        fluid.step(dt).unwrap();
    }
    fluid
}

#[test]
fn direct_and_parallel_agree() {
    let cloud = stirred_cloud(300, 0.1, 0.05, 42);
    let a = run(Arc::new(DirectSumProvider), cloud.clone(), 5);
    let b = run(
        Arc::new(ParallelGridProvider::new().with_min_len(8)),
        cloud,
        5,
    );

    let (pa, pb) = (a.particles(), b.particles());
    assert_slices_close(pa.densities(), pb.densities(), 1e-9);
    assert_slices_close(&flatten(pa.positions()), &flatten(pb.positions()), 1e-9);
    assert_slices_close(&flatten(pa.velocities()), &flatten(pb.velocities()), 1e-9);
}

#[test]
fn block_settles_without_blowing_up() {
    let params = SphParams::default();
    let mut fluid = SphFluid::new(params).unwrap();
    let spacing = 0.5 * params.smoothing_radius;
    fluid.create_block(6, 6, 6, spacing, [0.02, 0.05, 0.02]).unwrap();
    fluid.set_boundary(Some(BoundaryBox::new([0.0; 3], [0.2, 0.3, 0.2], 0.3).unwrap()));

    let dt = fluid.max_dt().unwrap().min(1e-3);
    for _ in 0..50 {
        fluid.step(dt).unwrap();
    }
    assert!(fluid.check_finite().is_none());
    for x in fluid.particles().positions() {
        assert!((0.0..=0.2).contains(&x[0]));
        assert!((0.0..=0.3).contains(&x[1]));
        assert!((0.0..=0.2).contains(&x[2]));
    }
    // Gravity has pulled the block down.
    let mean_vy: f64 = fluid.particles().velocities().iter().map(|v| v[1]).sum::<f64>()
        / fluid.particles().len() as f64;
    assert!(mean_vy < 0.0);
}

#[test]
fn swapping_mid_run_continues_seamlessly() {
    let cloud = stirred_cloud(120, 0.08, 0.02, 3);
    let reference = run(Arc::new(DirectSumProvider), cloud.clone(), 4);

    let mut swapped = run(Arc::new(ParallelGridProvider::new()), cloud, 2);
    swapped.set_provider(Arc::new(DirectSumProvider));
    let dt = swapped.max_dt().unwrap().min(1e-3);
    for _ in 0..2 {
        swapped.step(dt).unwrap();
    }
    assert_slices_close(
        &flatten(reference.particles().positions()),
        &flatten(swapped.particles().positions()),
        1e-9,
    );
}
