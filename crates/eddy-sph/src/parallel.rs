//! Data-parallel provider over a uniform-grid spatial hash.

use std::collections::HashMap;

use rayon::prelude::*;
use smallvec::SmallVec;

use eddy_core::StepError;

use crate::kernel::Kernels;
use crate::params::SphParams;
use crate::particles::ParticleState;
use crate::provider::{
    density_term, gravity_force, integrate, pair_force, particle_count, pressure, ComputeProvider,
    Sample,
};

type CellKey = (i64, i64, i64);

/// Particle indices bucketed by cubic cell of edge `h`.
///
/// Every neighbour within `h` of a particle lies in its own cell or one
/// of the 26 around it.
struct SpatialHash {
    inv_cell: f64,
    cells: HashMap<CellKey, SmallVec<[usize; 8]>>,
}

impl SpatialHash {
    fn build(positions: &[[f64; 3]], cell_size: f64) -> Self {
        let mut hash = Self {
            inv_cell: 1.0 / cell_size,
            cells: HashMap::with_capacity(positions.len()),
        };
        for (i, &x) in positions.iter().enumerate() {
            let key = hash.key(x);
            hash.cells.entry(key).or_default().push(i);
        }
        hash
    }

    #[inline]
    fn key(&self, x: [f64; 3]) -> CellKey {
        (
            (x[0] * self.inv_cell).floor() as i64,
            (x[1] * self.inv_cell).floor() as i64,
            (x[2] * self.inv_cell).floor() as i64,
        )
    }

    /// Call `f` with every candidate neighbour of `x` (including itself).
    ///
    /// Infinite or huge coordinates saturate to the outermost key; cells
    /// past it do not exist and are skipped.
    #[inline]
    fn for_each_candidate(&self, x: [f64; 3], mut f: impl FnMut(usize)) {
        let (cx, cy, cz) = self.key(x);
        for dz in -1..=1i64 {
            let Some(kz) = cz.checked_add(dz) else { continue };
            for dy in -1..=1i64 {
                let Some(ky) = cy.checked_add(dy) else { continue };
                for dx in -1..=1i64 {
                    let Some(kx) = cx.checked_add(dx) else { continue };
                    if let Some(bucket) = self.cells.get(&(kx, ky, kz)) {
                        bucket.iter().copied().for_each(&mut f);
                    }
                }
            }
        }
    }
}

/// Rayon-parallel provider with neighbour search by spatial hashing.
///
/// The three phases (density, force, integration) each run as a parallel
/// loop over particles; a phase starts only after the previous one has
/// finished for every particle.
#[derive(Clone, Copy, Debug)]
pub struct ParallelGridProvider {
    min_len: usize,
}

impl Default for ParallelGridProvider {
    fn default() -> Self {
        Self { min_len: 64 }
    }
}

impl ParallelGridProvider {
    /// Create the provider with default work splitting.
    pub fn new() -> Self {
        Self::default()
    }

    /// Smallest number of particles handed to one rayon task.
    pub fn with_min_len(mut self, min_len: usize) -> Self {
        self.min_len = min_len.max(1);
        self
    }
}

impl ComputeProvider for ParallelGridProvider {
    fn name(&self) -> &str {
        "parallel_grid"
    }

    fn compute(
        &self,
        state: &mut ParticleState<'_>,
        params: &SphParams,
        dt: f64,
    ) -> Result<(), StepError> {
        let n = particle_count(self, state)?;
        let kernels = Kernels::new(params.smoothing_radius);
        let hash = SpatialHash::build(state.positions, params.smoothing_radius);
        tracing::trace!(particles = n, cells = hash.cells.len(), "spatial hash built");

        // Density and pressure.
        let positions: &[[f64; 3]] = &*state.positions;
        state
            .densities
            .par_iter_mut()
            .zip(state.pressures.par_iter_mut())
            .enumerate()
            .with_min_len(self.min_len)
            .for_each(|(i, (rho, p))| {
                let xi = positions[i];
                let mut sum = 0.0;
                hash.for_each_candidate(xi, |j| {
                    sum += density_term(&kernels, params, xi, positions[j]);
                });
                *rho = sum;
                *p = pressure(params, sum);
            });

        // Forces.
        let (velocities, densities, pressures) =
            (&*state.velocities, &*state.densities, &*state.pressures);
        let sample = |k: usize| Sample {
            x: positions[k],
            v: velocities[k],
            rho: densities[k],
            p: pressures[k],
        };
        state
            .forces
            .par_iter_mut()
            .enumerate()
            .with_min_len(self.min_len)
            .for_each(|(i, f)| {
                let si = sample(i);
                let mut acc = gravity_force(params, si.rho);
                hash.for_each_candidate(si.x, |j| {
                    if j != i {
                        let pf = pair_force(&kernels, params, si, sample(j));
                        for a in 0..3 {
                            acc[a] += pf[a];
                        }
                    }
                });
                *f = acc;
            });

        // Integration.
        let (forces, densities) = (&*state.forces, &*state.densities);
        state
            .positions
            .par_iter_mut()
            .zip(state.velocities.par_iter_mut())
            .enumerate()
            .with_min_len(self.min_len)
            .for_each(|(i, (x, v))| integrate(x, v, forces[i], densities[i], dt));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_finds_all_neighbours_within_radius() {
        let h = 1.0;
        let positions = vec![
            [0.1, 0.1, 0.1],
            [0.95, 0.1, 0.1],
            [-0.5, 0.2, 0.3],
            [3.0, 0.0, 0.0],
        ];
        let hash = SpatialHash::build(&positions, h);
        let mut found = Vec::new();
        hash.for_each_candidate(positions[0], |j| found.push(j));
        found.sort_unstable();
        assert_eq!(found, vec![0, 1, 2]);
    }

    #[test]
    fn negative_coordinates_floor_correctly() {
        let hash = SpatialHash::build(&[], 0.5);
        assert_eq!(hash.key([-0.1, 0.0, 0.49]), (-1, 0, 0));
    }

    #[test]
    fn extreme_coordinates_share_the_outermost_cell() {
        let positions = vec![
            [0.0, 0.0, 0.0],
            [f64::INFINITY, 0.0, 0.0],
            [1e20, 0.0, 0.0],
            [f64::NEG_INFINITY, -1e300, 0.0],
        ];
        let hash = SpatialHash::build(&positions, 0.05);
        assert_eq!(hash.key(positions[1]).0, i64::MAX);

        let mut found = Vec::new();
        hash.for_each_candidate(positions[1], |j| found.push(j));
        found.sort_unstable();
        assert_eq!(found, vec![1, 2]);

        found.clear();
        hash.for_each_candidate(positions[3], |j| found.push(j));
        assert_eq!(found, vec![3]);
    }

    #[test]
    fn blown_up_particles_step_without_panicking() {
        let mut positions = vec![[0.0, 0.0, 0.0], [f64::INFINITY, 0.0, 0.0], [1e20, 0.0, 0.0]];
        let mut velocities = vec![[0.0; 3]; 3];
        let mut densities = vec![0.0; 3];
        let mut pressures = vec![0.0; 3];
        let mut forces = vec![[0.0; 3]; 3];
        let mut state = ParticleState {
            positions: &mut positions,
            velocities: &mut velocities,
            densities: &mut densities,
            pressures: &mut pressures,
            forces: &mut forces,
        };
        ParallelGridProvider::default()
            .compute(&mut state, &SphParams::default(), 1e-3)
            .unwrap();
        assert!(densities[0].is_finite());
        assert!(densities[2].is_finite());
    }
}
