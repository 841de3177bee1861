//! Sequential all-pairs reference provider.

use eddy_core::StepError;

use crate::kernel::Kernels;
use crate::params::SphParams;
use crate::particles::ParticleState;
use crate::provider::{
    density_term, gravity_force, integrate, pair_force, particle_count, pressure, ComputeProvider,
    Sample,
};

/// Evaluates every particle pair in index order: O(N²), single thread.
///
/// Slow but obviously correct; other providers are checked against it.
#[derive(Clone, Copy, Debug, Default)]
pub struct DirectSumProvider;

impl DirectSumProvider {
    /// Create the provider.
    pub fn new() -> Self {
        Self
    }
}

impl ComputeProvider for DirectSumProvider {
    fn name(&self) -> &str {
        "direct_sum"
    }

    fn compute(
        &self,
        state: &mut ParticleState<'_>,
        params: &SphParams,
        dt: f64,
    ) -> Result<(), StepError> {
        let n = particle_count(self, state)?;
        let kernels = Kernels::new(params.smoothing_radius);

        for i in 0..n {
            let xi = state.positions[i];
            let rho: f64 = state
                .positions
                .iter()
                .map(|&xj| density_term(&kernels, params, xi, xj))
                .sum();
            state.densities[i] = rho;
            state.pressures[i] = pressure(params, rho);
        }

        let sample = |s: &ParticleState<'_>, k: usize| Sample {
            x: s.positions[k],
            v: s.velocities[k],
            rho: s.densities[k],
            p: s.pressures[k],
        };
        for i in 0..n {
            let si = sample(state, i);
            let mut f = gravity_force(params, si.rho);
            for j in 0..n {
                if j == i {
                    continue;
                }
                let pf = pair_force(&kernels, params, si, sample(state, j));
                for a in 0..3 {
                    f[a] += pf[a];
                }
            }
            state.forces[i] = f;
        }

        for i in 0..n {
            let (f, rho) = (state.forces[i], state.densities[i]);
            integrate(&mut state.positions[i], &mut state.velocities[i], f, rho, dt);
        }
        Ok(())
    }
}
