//! Structure-of-arrays particle storage.

/// Flat per-particle arrays. All five have the same length.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParticleSet {
    positions: Vec<[f64; 3]>,
    velocities: Vec<[f64; 3]>,
    forces: Vec<[f64; 3]>,
    densities: Vec<f64>,
    pressures: Vec<f64>,
}

/// Mutable view of a [`ParticleSet`] handed to a compute provider.
///
/// Fields are separate slices so a provider can read one array while
/// writing another.
#[derive(Debug)]
pub struct ParticleState<'a> {
    /// Positions.
    pub positions: &'a mut [[f64; 3]],
    /// Velocities.
    pub velocities: &'a mut [[f64; 3]],
    /// Net force density from the last evaluation.
    pub forces: &'a mut [[f64; 3]],
    /// Kernel-summed densities.
    pub densities: &'a mut [f64],
    /// Equation-of-state pressures.
    pub pressures: &'a mut [f64],
}

impl ParticleState<'_> {
    /// Number of particles, or `None` if the slices disagree.
    pub fn checked_len(&self) -> Option<usize> {
        let n = self.positions.len();
        (self.velocities.len() == n
            && self.forces.len() == n
            && self.densities.len() == n
            && self.pressures.len() == n)
            .then_some(n)
    }
}

impl ParticleSet {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Particles at rest at the given positions.
    pub fn from_positions(positions: Vec<[f64; 3]>) -> Self {
        let n = positions.len();
        Self {
            positions,
            velocities: vec![[0.0; 3]; n],
            forces: vec![[0.0; 3]; n],
            densities: vec![0.0; n],
            pressures: vec![0.0; n],
        }
    }

    /// A regular `nx × ny × nz` lattice with the given spacing, first
    /// particle at `start`, x varying fastest.
    pub fn block(nx: usize, ny: usize, nz: usize, spacing: f64, start: [f64; 3]) -> Self {
        let mut set = Self::new();
        set.extend_block(nx, ny, nz, spacing, start);
        set
    }

    /// Append a lattice block (see [`block`](Self::block)).
    pub fn extend_block(&mut self, nx: usize, ny: usize, nz: usize, spacing: f64, start: [f64; 3]) {
        self.reserve(nx * ny * nz);
        for k in 0..nz {
            for j in 0..ny {
                for i in 0..nx {
                    self.push(
                        [
                            start[0] + i as f64 * spacing,
                            start[1] + j as f64 * spacing,
                            start[2] + k as f64 * spacing,
                        ],
                        [0.0; 3],
                    );
                }
            }
        }
    }

    fn reserve(&mut self, additional: usize) {
        self.positions.reserve(additional);
        self.velocities.reserve(additional);
        self.forces.reserve(additional);
        self.densities.reserve(additional);
        self.pressures.reserve(additional);
    }

    /// Append one particle.
    pub fn push(&mut self, position: [f64; 3], velocity: [f64; 3]) {
        self.positions.push(position);
        self.velocities.push(velocity);
        self.forces.push([0.0; 3]);
        self.densities.push(0.0);
        self.pressures.push(0.0);
    }

    /// Number of particles.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Whether there are no particles.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Borrow every array mutably at once.
    pub fn state(&mut self) -> ParticleState<'_> {
        ParticleState {
            positions: &mut self.positions,
            velocities: &mut self.velocities,
            forces: &mut self.forces,
            densities: &mut self.densities,
            pressures: &mut self.pressures,
        }
    }

    /// Positions.
    pub fn positions(&self) -> &[[f64; 3]] {
        &self.positions
    }

    /// Velocities.
    pub fn velocities(&self) -> &[[f64; 3]] {
        &self.velocities
    }

    /// Mutable velocities, e.g. to seed an initial flow.
    pub fn velocities_mut(&mut self) -> &mut [[f64; 3]] {
        &mut self.velocities
    }

    /// Forces from the last step.
    pub fn forces(&self) -> &[[f64; 3]] {
        &self.forces
    }

    /// Densities from the last step.
    pub fn densities(&self) -> &[f64] {
        &self.densities
    }

    /// Pressures from the last step.
    pub fn pressures(&self) -> &[f64] {
        &self.pressures
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_layout_is_x_fastest() {
        let set = ParticleSet::block(2, 3, 1, 0.5, [1.0, 0.0, -1.0]);
        assert_eq!(set.len(), 6);
        assert_eq!(set.positions()[0], [1.0, 0.0, -1.0]);
        assert_eq!(set.positions()[1], [1.5, 0.0, -1.0]);
        assert_eq!(set.positions()[2], [1.0, 0.5, -1.0]);
        assert!(set.velocities().iter().all(|v| *v == [0.0; 3]));
    }

    #[test]
    fn state_views_share_length() {
        let mut set = ParticleSet::from_positions(vec![[0.0; 3]; 4]);
        assert_eq!(set.state().checked_len(), Some(4));
        let mut empty = ParticleSet::new();
        assert!(empty.is_empty());
        assert_eq!(empty.state().checked_len(), Some(0));
    }
}
