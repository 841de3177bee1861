//! Axis-aligned container walls.

use eddy_core::ConfigError;

/// An axis-aligned box that reflects particles crossing its faces.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundaryBox {
    min: [f64; 3],
    max: [f64; 3],
    restitution: f64,
}

impl BoundaryBox {
    /// A box spanning `min..=max` with the given restitution in `[0, 1]`.
    pub fn new(min: [f64; 3], max: [f64; 3], restitution: f64) -> Result<Self, ConfigError> {
        if !(0.0..=1.0).contains(&restitution) {
            return Err(ConfigError::InvalidRestitution { value: restitution });
        }
        for (a, axis) in ['x', 'y', 'z'].into_iter().enumerate() {
            if !min[a].is_finite() || !max[a].is_finite() {
                return Err(ConfigError::InvalidParameter {
                    name: "boundary",
                    value: if min[a].is_finite() { max[a] } else { min[a] },
                    expected: "finite",
                });
            }
            if min[a] > max[a] {
                return Err(ConfigError::InvertedBounds {
                    axis,
                    min: min[a],
                    max: max[a],
                });
            }
        }
        Ok(Self {
            min,
            max,
            restitution,
        })
    }

    /// Lower corner.
    pub fn min(&self) -> [f64; 3] {
        self.min
    }

    /// Upper corner.
    pub fn max(&self) -> [f64; 3] {
        self.max
    }

    /// Fraction of normal speed kept after a reflection.
    pub fn restitution(&self) -> f64 {
        self.restitution
    }

    /// Clamp particles outside the box onto its faces and reverse the
    /// crossing velocity component, scaled by the restitution.
    ///
    /// Returns how many axis reflections happened.
    pub fn apply(&self, positions: &mut [[f64; 3]], velocities: &mut [[f64; 3]]) -> usize {
        let mut reflections = 0;
        for (x, v) in positions.iter_mut().zip(velocities.iter_mut()) {
            for a in 0..3 {
                if x[a] < self.min[a] {
                    x[a] = self.min[a];
                } else if x[a] > self.max[a] {
                    x[a] = self.max[a];
                } else {
                    continue;
                }
                v[a] = -v[a] * self.restitution;
                reflections += 1;
            }
        }
        reflections
    }
}
