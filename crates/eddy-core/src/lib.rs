//! Core types and traits for the eddy CFD engine.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the abstractions every solver shares: the [`Solver`] step contract,
//! step identifiers, error types, the NaN/Inf instability scan, and the
//! named-scalar [`Observables`] that solvers report after each step.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod id;
pub mod instability;
pub mod observables;
pub mod solver;

pub use error::{ConfigError, StepError};
pub use id::StepId;
pub use instability::{scan_non_finite, scan_non_finite_vec3, Instability};
pub use observables::Observables;
pub use solver::{validate_dt, Solver, SolverKind};
