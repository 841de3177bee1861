//! Uniform Cartesian grid support for eddy's Eulerian solvers.
//!
//! # Contents
//!
//! - [`Grid2D`]: dimensions and flat `x + y·width` indexing
//! - [`EdgeBehavior`]: how neighbour lookups treat the domain edge
//! - [`ObstacleMask`]: static solid-cell masks painted before a run
//! - [`InletProfile`]: left-boundary velocity profiles
//! - [`VelocityGradients`]: the velocity-gradient tensor handed from a
//!   base flow solver to a turbulence closure

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod edge;
pub mod error;
pub mod gradient;
pub mod grid2d;
pub mod inlet;
pub mod mask;

pub use edge::{resolve_axis, EdgeBehavior};
pub use error::GridError;
pub use gradient::VelocityGradients;
pub use grid2d::Grid2D;
pub use inlet::InletProfile;
pub use mask::ObstacleMask;
