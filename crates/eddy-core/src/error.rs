//! Error types for the eddy CFD engine.
//!
//! Two families: [`ConfigError`] for invalid parameters rejected at
//! construction time, and [`StepError`] for the few conditions that stop
//! a single `step()` call. Numerical blow-up is deliberately not an error;
//! it is reported through [`Instability`](crate::Instability).

use std::error::Error;
use std::fmt;

use crate::instability::Instability;

/// Errors detected while validating solver or driver configuration.
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigError {
    /// Grid or particle count of zero.
    EmptyGrid,
    /// Grid construction failed for a reason reported by `eddy-grid`.
    InvalidGrid {
        /// Description of the grid failure.
        reason: String,
    },
    /// Kinematic viscosity yields a BGK relaxation time `tau <= 0.5`.
    UnstableRelaxation {
        /// The configured kinematic viscosity (lattice units).
        viscosity: f64,
        /// The resulting relaxation time `3ν + 0.5`.
        tau: f64,
    },
    /// A scalar parameter is NaN, infinite, or outside its valid range.
    InvalidParameter {
        /// Parameter name as exposed by the builder.
        name: &'static str,
        /// The offending value.
        value: f64,
        /// The constraint that was violated.
        expected: &'static str,
    },
    /// A caller-supplied buffer does not match the solver's dimensions.
    LengthMismatch {
        /// What the buffer represents.
        what: &'static str,
        /// Required length.
        expected: usize,
        /// Supplied length.
        actual: usize,
    },
    /// Restitution coefficient outside `[0, 1]`.
    InvalidRestitution {
        /// The offending value.
        value: f64,
    },
    /// A boundary box has `min > max` on some axis.
    InvertedBounds {
        /// Axis label (`'x'`, `'y'` or `'z'`).
        axis: char,
        /// Lower bound.
        min: f64,
        /// Upper bound.
        max: f64,
    },
    /// The configured timestep is NaN, infinite, zero or negative.
    InvalidDt {
        /// The offending timestep.
        dt: f64,
    },
    /// The configured timestep exceeds the solver's stability ceiling.
    DtOutOfRange {
        /// The configured timestep.
        dt: f64,
        /// The solver's `max_dt()`.
        max_dt: f64,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyGrid => write!(f, "grid must have at least one cell"),
            Self::InvalidGrid { reason } => write!(f, "invalid grid: {reason}"),
            Self::UnstableRelaxation { viscosity, tau } => write!(
                f,
                "viscosity {viscosity} gives relaxation time {tau}, which must exceed 0.5"
            ),
            Self::InvalidParameter {
                name,
                value,
                expected,
            } => write!(f, "parameter '{name}' = {value} is invalid: expected {expected}"),
            Self::LengthMismatch {
                what,
                expected,
                actual,
            } => write!(f, "{what} has {actual} elements, expected {expected}"),
            Self::InvalidRestitution { value } => {
                write!(f, "restitution {value} must lie in [0, 1]")
            }
            Self::InvertedBounds { axis, min, max } => {
                write!(f, "boundary on {axis} axis is inverted: min {min} > max {max}")
            }
            Self::InvalidDt { dt } => write!(f, "dt must be finite and positive, got {dt}"),
            Self::DtOutOfRange { dt, max_dt } => {
                write!(f, "dt {dt} exceeds the solver stability limit {max_dt}")
            }
        }
    }
}

impl Error for ConfigError {}

/// Errors returned by a single `step()` call.
#[derive(Clone, Debug, PartialEq)]
pub enum StepError {
    /// The timestep passed to `step()` is NaN, infinite or negative.
    InvalidDt {
        /// The offending timestep.
        dt: f64,
    },
    /// Stepping is halted after an instability under a halting policy.
    Halted {
        /// The instability that halted the run.
        instability: Instability,
    },
    /// A compute provider could not evaluate the step.
    ProviderFailed {
        /// Name of the failing provider.
        name: String,
        /// Human-readable description of the failure.
        reason: String,
    },
}

impl fmt::Display for StepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidDt { dt } => write!(f, "dt must be finite and non-negative, got {dt}"),
            Self::Halted { instability } => write!(f, "stepping halted: {instability}"),
            Self::ProviderFailed { name, reason } => {
                write!(f, "compute provider '{name}' failed: {reason}")
            }
        }
    }
}

impl Error for StepError {}
