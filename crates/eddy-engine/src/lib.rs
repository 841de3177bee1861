//! Driver for eddy solvers.
//!
//! [`LockstepRunner`] owns one boxed [`Solver`](eddy_core::Solver) and
//! advances it with a fixed `dt`, timing each step, collecting the
//! solver's observables and applying an [`InstabilityPolicy`] to the
//! NaN/Inf scan.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod lockstep;
pub mod metrics;

pub use config::{InstabilityPolicy, RunConfig};
pub use lockstep::{LockstepRunner, StepResult};
pub use metrics::StepMetrics;
