//! eddy: a small CFD engine with interchangeable simulation strategies.
//!
//! This is the top-level facade crate that re-exports the public API from
//! all eddy sub-crates. For most users, adding `eddy` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use eddy::prelude::*;
//!
//! // A 32x16 channel with a square obstacle and a parabolic inlet.
//! let grid = Grid2D::new(32, 16).unwrap();
//! let mut mask = ObstacleMask::new(grid);
//! mask.fill_rect(8, 6, 3, 3);
//! let lbm = LatticeBoltzmann::builder()
//!     .size(32, 16)
//!     .viscosity(0.05)
//!     .obstacles(mask)
//!     .inlet(InletProfile::Parabolic { peak: 0.05 })
//!     .build()
//!     .unwrap();
//!
//! // Close it with k-epsilon and drive it through the lockstep runner.
//! let coupled = TurbulentLbm::with_default_closure(lbm).unwrap();
//! let mut runner = LockstepRunner::new(Box::new(coupled), RunConfig::default()).unwrap();
//! assert_eq!(runner.run(10).unwrap(), None);
//! assert_eq!(runner.current_step(), StepId(10));
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `eddy-core` | `Solver` trait, errors, `StepId`, instability scan, observables |
//! | [`grid`] | `eddy-grid` | `Grid2D`, obstacle masks, inlet profiles, velocity gradients |
//! | [`solvers`] | `eddy-solvers` | Lattice Boltzmann, k-ε closure, projection field |
//! | [`sph`] | `eddy-sph` | SPH fluid and compute providers |
//! | [`engine`] | `eddy-engine` | Lockstep runner and instability policies |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types and the solver contract (`eddy-core`).
pub use eddy_core as types;

/// Structured grids and grid inputs (`eddy-grid`).
///
/// [`grid::ObstacleMask`] and [`grid::InletProfile`] configure the grid
/// solvers; [`grid::VelocityGradients`] carries the strain tensor into
/// the turbulence closure.
pub use eddy_grid as grid;

/// Grid solvers (`eddy-solvers`).
///
/// [`solvers::LatticeBoltzmann`], [`solvers::KEpsilonModel`],
/// [`solvers::TurbulentLbm`] and [`solvers::FluidField`].
pub use eddy_solvers as solvers;

/// Smoothed-particle hydrodynamics (`eddy-sph`).
///
/// [`sph::SphFluid`] steps through a swappable [`sph::ComputeProvider`].
pub use eddy_sph as sph;

/// Drivers (`eddy-engine`).
pub use eddy_engine as engine;

/// Common imports for typical eddy usage.
///
/// ```rust
/// use eddy::prelude::*;
/// ```
pub mod prelude {
    // Core contract
    pub use eddy_core::{Instability, Observables, Solver, SolverKind, StepId};

    // Errors
    pub use eddy_core::{ConfigError, StepError};
    pub use eddy_grid::GridError;

    // Grid inputs
    pub use eddy_grid::{EdgeBehavior, Grid2D, InletProfile, ObstacleMask};

    // Solvers
    pub use eddy_solvers::{
        AxisBoundary, FluidField, KEpsilonConstants, KEpsilonModel, LatticeBoltzmann,
        TurbulentLbm,
    };

    // SPH
    pub use eddy_sph::{
        BoundaryBox, ComputeProvider, DirectSumProvider, ParallelGridProvider, SphFluid,
        SphParams,
    };

    // Engine
    pub use eddy_engine::{InstabilityPolicy, LockstepRunner, RunConfig, StepMetrics, StepResult};
}
