//! Grid-based solvers for the eddy CFD engine.
//!
//! - [`LatticeBoltzmann`]: D2Q9 BGK lattice-Boltzmann with inlet and
//!   bounce-back boundaries.
//! - [`KEpsilonModel`]: standard two-equation RANS closure.
//! - [`TurbulentLbm`]: the two coupled through an effective viscosity.
//! - [`FluidField`]: staggered-grid advection and pressure projection.
//!
//! All of them implement [`eddy_core::Solver`].

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod coupling;
pub mod fluid_field;
pub mod k_epsilon;
pub mod lattice;
pub mod lbm;

pub use coupling::TurbulentLbm;
pub use fluid_field::{FluidField, FluidFieldBuilder, PressureSolve};
pub use k_epsilon::{KEpsilonBuilder, KEpsilonConstants, KEpsilonModel};
pub use lbm::{AxisBoundary, LatticeBoltzmann, LatticeBoltzmannBuilder};
