//! Benchmark profiles for the eddy CFD engine.
//!
//! Pre-built solvers shared by the benches and the `wake` example:
//!
//! - [`reference_channel`]: 128x64 channel, cylinder obstacle, uniform inlet
//! - [`turbulent_channel`]: [`reference_channel`] with the k-ε closure
//! - [`reference_dam_break`]: SPH water column in a closed tank
//! - [`reference_projection`]: 64x64 projection field with a buoyant plume

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::sync::Arc;

use eddy_core::ConfigError;
use eddy_grid::{Grid2D, InletProfile, ObstacleMask};
use eddy_solvers::{FluidField, LatticeBoltzmann, TurbulentLbm};
use eddy_sph::{BoundaryBox, ComputeProvider, SphFluid, SphParams};

/// Inlet speed of the reference channel (lattice units).
pub const CHANNEL_INLET: f64 = 0.08;

/// Build the reference LBM channel: 128x64 cells, `ν = 0.02`, a cylinder
/// of radius 6 a quarter of the way down the channel.
pub fn reference_channel() -> Result<LatticeBoltzmann, ConfigError> {
    let grid = Grid2D::new(128, 64)?;
    let mut mask = ObstacleMask::new(grid);
    mask.fill_circle(32.0, 32.0, 6.0);
    LatticeBoltzmann::builder()
        .size(128, 64)
        .viscosity(0.02)
        .obstacles(mask)
        .inlet(InletProfile::Uniform(CHANNEL_INLET))
        .initial_velocity([CHANNEL_INLET, 0.0])
        .build()
}

/// [`reference_channel`] closed by the default k-ε model with 5 %
/// inlet turbulence intensity.
pub fn turbulent_channel() -> Result<TurbulentLbm, ConfigError> {
    let mut coupled = TurbulentLbm::with_default_closure(reference_channel()?)?;
    let (k, eps) = coupled
        .model()
        .estimate_inlet_conditions(CHANNEL_INLET, 0.05, 12.0)?;
    coupled.set_inlet_turbulence(k, eps)?;
    Ok(coupled)
}

/// Build an SPH dam break: an `n x 2n x n` block of water in the corner
/// of a 0.4 x 0.4 x 0.2 m tank, stepped by `provider`.
pub fn reference_dam_break(
    n: usize,
    provider: Arc<dyn ComputeProvider>,
) -> Result<SphFluid, ConfigError> {
    let params = SphParams::default();
    let spacing = 0.5 * params.smoothing_radius;
    let mut fluid = SphFluid::with_provider(params, provider)?;
    fluid.create_block(n, 2 * n, n, spacing, [0.01, 0.01, 0.01])?;
    fluid.set_boundary(Some(BoundaryBox::new(
        [0.0, 0.0, 0.0],
        [0.4, 0.4, 0.2],
        0.3,
    )?));
    Ok(fluid)
}

/// Build a 64x64 projection field with a dense blob near the floor and
/// upward buoyancy.
pub fn reference_projection() -> Result<FluidField, ConfigError> {
    let mut field = FluidField::builder()
        .size(64, 64)
        .cell_size(1.0 / 64.0)
        .tolerance(1e-5)
        .build()?;
    for y in 4..12 {
        for x in 28..36 {
            field.add_density(x, y, 1.0)?;
            field.add_force(x, y, [0.0, 2.0])?;
        }
    }
    Ok(field)
}

#[cfg(test)]
mod tests {
    use super::*;
    use eddy_core::Solver;
    use eddy_sph::{DirectSumProvider, ParallelGridProvider};

    #[test]
    fn reference_channel_builds() {
        let lbm = reference_channel().unwrap();
        assert_eq!(lbm.grid().cell_count(), 128 * 64);
        assert!(lbm.obstacles().iter().any(|&s| s));
    }

    #[test]
    fn turbulent_channel_steps() {
        let mut t = turbulent_channel().unwrap();
        t.step(1.0).unwrap();
        assert!(t.check_finite().is_none());
    }

    #[test]
    fn dam_break_fits_the_tank() {
        for provider in [
            Arc::new(DirectSumProvider) as Arc<dyn ComputeProvider>,
            Arc::new(ParallelGridProvider::new()),
        ] {
            let fluid = reference_dam_break(4, provider).unwrap();
            assert_eq!(fluid.particles().len(), 4 * 8 * 4);
            let b = fluid.boundary().unwrap();
            for x in fluid.particles().positions() {
                for a in 0..3 {
                    assert!(x[a] >= b.min()[a] && x[a] <= b.max()[a]);
                }
            }
        }
    }

    #[test]
    fn projection_profile_has_density() {
        let field = reference_projection().unwrap();
        assert!(field.density().iter().sum::<f64>() > 0.0);
    }
}
