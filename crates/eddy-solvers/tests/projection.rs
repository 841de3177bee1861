//! Integration test: the finite-difference projection contract.

use eddy_core::{Observables, Solver, SolverKind};
use eddy_grid::{Grid2D, ObstacleMask};
use eddy_solvers::FluidField;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

fn random_faces(field: &FluidField, seed: u64) -> (Vec<f64>, Vec<f64>) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let u = (0..field.face_velocity_x().len())
        .map(|_| rng.random_range(-1.0..1.0))
        .collect();
    let v = (0..field.face_velocity_y().len())
        .map(|_| rng.random_range(-1.0..1.0))
        .collect();
    (u, v)
}

#[test]
fn random_field_is_made_divergence_free() {
    for seed in 0..4 {
        let mut field = FluidField::builder()
            .size(12, 12)
            .tolerance(1e-6)
            .max_iterations(10_000)
            .build()
            .unwrap();
        let (u, v) = random_faces(&field, seed);
        field.set_face_velocities(&u, &v).unwrap();

        field.step(0.02).unwrap();
        assert!(field.last_solve().converged, "seed {seed}");
        assert!(field.max_divergence() < 1e-6, "seed {seed}");
    }
}

#[test]
fn projection_holds_around_obstacles() {
    let grid = Grid2D::new(16, 12).unwrap();
    let mut mask = ObstacleMask::new(grid);
    mask.fill_circle(8.0, 6.0, 2.5);
    let mut field = FluidField::builder()
        .size(16, 12)
        .obstacles(mask)
        .body_force([1.0, 0.0])
        .max_iterations(10_000)
        .build()
        .unwrap();
    let (u, v) = random_faces(&field, 99);
    field.set_face_velocities(&u, &v).unwrap();

    for _ in 0..5 {
        field.step(0.05).unwrap();
        assert!(field.last_solve().converged);
        assert!(field.max_divergence() < 1e-6);
    }
    assert!(field.check_finite().is_none());
    for (i, &solid) in field.obstacles().iter().enumerate() {
        if solid {
            assert_eq!(field.velocity_x()[i], 0.0);
            assert_eq!(field.velocity_y()[i], 0.0);
        }
    }
}

#[test]
fn boxed_as_a_solver() {
    let mut solver: Box<dyn Solver> = Box::new(FluidField::default());
    assert_eq!(solver.kind(), SolverKind::FiniteDifferenceProjection);
    solver.step(0.1).unwrap();

    let mut field = FluidField::default();
    field.initialize(6, 6).unwrap();
    field.add_density(3, 3, 1.0).unwrap();
    let mut solver: Box<dyn Solver> = Box::new(field);
    solver.step(0.1).unwrap();
    let mut obs = Observables::new();
    solver.observe(&mut obs);
    assert!((obs.get("total_density").unwrap() - 1.0).abs() < 1e-12);
}
