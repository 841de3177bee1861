//! Velocity profiles for the left (inflow) boundary.

use crate::error::GridError;

/// Streamwise velocity imposed on the leftmost column, one value per row.
#[derive(Clone, Debug, PartialEq)]
pub enum InletProfile {
    /// The same velocity on every row.
    Uniform(f64),
    /// Poiseuille profile, zero at the walls and `peak` mid-channel.
    Parabolic {
        /// Centre-line velocity.
        peak: f64,
    },
    /// Explicit per-row values (length must equal the grid height).
    Custom(Vec<f64>),
}

impl InletProfile {
    /// Evaluate the profile for a channel of `height` rows.
    ///
    /// Rows are sampled at their centres `y + 0.5`, so the parabolic
    /// profile is symmetric and never exactly zero inside the channel.
    pub fn sample(&self, height: usize) -> Result<Vec<f64>, GridError> {
        match self {
            Self::Uniform(u) => Ok(vec![*u; height]),
            Self::Parabolic { peak } => {
                let h = height as f64;
                Ok((0..height)
                    .map(|y| {
                        let s = y as f64 + 0.5;
                        4.0 * peak * s * (h - s) / (h * h)
                    })
                    .collect())
            }
            Self::Custom(values) => {
                if values.len() == height {
                    Ok(values.clone())
                } else {
                    Err(GridError::LengthMismatch {
                        what: "inlet profile",
                        expected: height,
                        actual: values.len(),
                    })
                }
            }
        }
    }
}
