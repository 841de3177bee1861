//! Smoothed-particle hydrodynamics for the eddy CFD engine.
//!
//! [`SphFluid`] owns a [`ParticleSet`] and delegates every step to a
//! [`ComputeProvider`]. Two providers ship with the crate:
//!
//! - [`DirectSumProvider`]: sequential all-pairs reference.
//! - [`ParallelGridProvider`]: rayon over a uniform-grid spatial hash.
//!
//! Both evaluate the same Müller-style kernels (see [`kernel`]) and must
//! agree to rounding.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod boundary;
pub mod direct;
pub mod fluid;
pub mod kernel;
pub mod parallel;
pub mod params;
pub mod particles;
pub mod provider;

pub use boundary::BoundaryBox;
pub use direct::DirectSumProvider;
pub use fluid::SphFluid;
pub use kernel::Kernels;
pub use parallel::ParallelGridProvider;
pub use params::SphParams;
pub use particles::{ParticleSet, ParticleState};
pub use provider::ComputeProvider;
