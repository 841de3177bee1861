//! Simulation-wide SPH parameters.

use eddy_core::ConfigError;

/// Material and kernel parameters shared by every particle.
///
/// Defaults are the classic water setup of Müller et al. (2003) in SI
/// units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SphParams {
    /// Mass of each particle.
    pub mass: f64,
    /// Rest density `ρ0`.
    pub rest_density: f64,
    /// Gas stiffness `k` in `p = k (ρ - ρ0)`.
    pub stiffness: f64,
    /// Dynamic viscosity `μ`.
    pub viscosity: f64,
    /// Kernel support radius `h`.
    pub smoothing_radius: f64,
    /// Body acceleration.
    pub gravity: [f64; 3],
}

impl Default for SphParams {
    fn default() -> Self {
        Self {
            mass: 0.02,
            rest_density: 1000.0,
            stiffness: 3.0,
            viscosity: 3.5,
            smoothing_radius: 0.0457,
            gravity: [0.0, -9.81, 0.0],
        }
    }
}

impl SphParams {
    /// Check every parameter's range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("mass", self.mass),
            ("rest_density", self.rest_density),
            ("smoothing_radius", self.smoothing_radius),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::InvalidParameter {
                    name,
                    value,
                    expected: "finite and > 0",
                });
            }
        }
        for (name, value) in [("stiffness", self.stiffness), ("viscosity", self.viscosity)] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidParameter {
                    name,
                    value,
                    expected: "finite and >= 0",
                });
            }
        }
        if let Some(&g) = self.gravity.iter().find(|g| !g.is_finite()) {
            return Err(ConfigError::InvalidParameter {
                name: "gravity",
                value: g,
                expected: "finite",
            });
        }
        Ok(())
    }

    /// Speed of sound `√k` of the equation of state.
    pub fn sound_speed(&self) -> f64 {
        self.stiffness.sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(SphParams::default().validate().is_ok());
    }

    #[test]
    fn rejects_bad_values() {
        let p = SphParams {
            smoothing_radius: 0.0,
            ..SphParams::default()
        };
        assert!(matches!(
            p.validate(),
            Err(ConfigError::InvalidParameter { name: "smoothing_radius", .. })
        ));
        let p = SphParams {
            viscosity: -1.0,
            ..SphParams::default()
        };
        assert!(p.validate().is_err());
        let p = SphParams {
            gravity: [0.0, f64::NAN, 0.0],
            ..SphParams::default()
        };
        assert!(p.validate().is_err());
    }
}
