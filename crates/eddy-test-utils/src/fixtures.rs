//! Reusable solver fixtures.
//!
//! - [`resting_lattice`]: fully periodic LBM at `ρ = 1`, `u = 0`.
//! - [`wake_channel`]: 32×32 channel with a 3×3 block and a uniform inlet.
//! - [`random_cloud`]: seeded particle positions in a cube.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use eddy_grid::{Grid2D, InletProfile, ObstacleMask};
use eddy_solvers::{AxisBoundary, LatticeBoltzmann};
use eddy_sph::ParticleSet;

/// Inlet speed of [`wake_channel`].
pub const WAKE_INLET: f64 = 0.1;

/// Viscosity of [`wake_channel`] (`τ = 0.56`).
pub const WAKE_VISCOSITY: f64 = 0.02;

/// Periodic lattice at rest.
pub fn resting_lattice(width: usize, height: usize) -> LatticeBoltzmann {
    LatticeBoltzmann::builder()
        .size(width, height)
        .viscosity(0.05)
        .y_boundary(AxisBoundary::Periodic)
        .build()
        .expect("valid resting lattice")
}

/// The 32×32 obstacle-wake scenario: 3×3 block at `x, y ∈ 15..=17`,
/// uniform inlet [`WAKE_INLET`], bounce-back walls, fluid initialised to
/// the inlet velocity.
pub fn wake_channel() -> LatticeBoltzmann {
    let grid = Grid2D::new(32, 32).expect("32x32 grid");
    let mut mask = ObstacleMask::new(grid);
    mask.fill_rect(15, 15, 3, 3);
    LatticeBoltzmann::builder()
        .size(32, 32)
        .viscosity(WAKE_VISCOSITY)
        .obstacles(mask)
        .inlet(InletProfile::Uniform(WAKE_INLET))
        .initial_velocity([WAKE_INLET, 0.0])
        .build()
        .expect("valid wake channel")
}

/// `n` particles at rest, uniformly scattered in `[0, extent)³`.
pub fn random_cloud(n: usize, extent: f64, seed: u64) -> ParticleSet {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let positions = (0..n)
        .map(|_| {
            [
                rng.random::<f64>() * extent,
                rng.random::<f64>() * extent,
                rng.random::<f64>() * extent,
            ]
        })
        .collect();
    ParticleSet::from_positions(positions)
}

/// Like [`random_cloud`] with small random initial velocities in
/// `[-speed, speed)` per axis.
pub fn stirred_cloud(n: usize, extent: f64, speed: f64, seed: u64) -> ParticleSet {
    let mut set = random_cloud(n, extent, seed);
    let mut rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(1));
    for v in set.velocities_mut() {
        for c in v.iter_mut() {
            *c = rng.random_range(-speed..speed);
        }
    }
    set
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clouds_are_reproducible() {
        let a = random_cloud(16, 1.0, 7);
        let b = random_cloud(16, 1.0, 7);
        assert_eq!(a, b);
        assert!(a.positions().iter().flatten().all(|&c| (0.0..1.0).contains(&c)));
        assert_ne!(a, random_cloud(16, 1.0, 8));
    }

    #[test]
    fn wake_channel_has_nine_solids() {
        let lbm = wake_channel();
        assert_eq!(lbm.obstacles().iter().filter(|&&s| s).count(), 9);
        assert!((lbm.tau() - 0.56).abs() < 1e-12);
    }
}
