//! NaN/Inf detection over solver state.
//!
//! An unstable configuration (e.g. a relaxation time close to 0.5 or an
//! SPH timestep far above the CFL limit) makes state grow without bound
//! and eventually turn non-finite. Solvers expose their buffers to these
//! scans through [`Solver::check_finite`](crate::Solver::check_finite);
//! the driver decides whether a hit is a warning or a halt.

use std::fmt;

/// First non-finite value found in a solver buffer.
#[derive(Clone, Debug, PartialEq)]
pub struct Instability {
    /// Name of the buffer that holds the bad value.
    pub field: &'static str,
    /// Index of the first bad cell or particle.
    pub index: usize,
    /// The bad value (NaN or ±Inf).
    pub value: f64,
}

impl fmt::Display for Instability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "non-finite value {} in '{}' at index {}",
            self.value, self.field, self.index
        )
    }
}

/// Scan a scalar buffer for the first NaN or infinite entry.
pub fn scan_non_finite(field: &'static str, data: &[f64]) -> Option<Instability> {
    data.iter()
        .position(|v| !v.is_finite())
        .map(|index| Instability {
            field,
            index,
            value: data[index],
        })
}

/// Scan a buffer of 3-vectors; `index` is the vector (particle) index.
pub fn scan_non_finite_vec3(field: &'static str, data: &[[f64; 3]]) -> Option<Instability> {
    data.iter().enumerate().find_map(|(index, v)| {
        v.iter().find(|c| !c.is_finite()).map(|&value| Instability {
            field,
            index,
            value,
        })
    })
}
