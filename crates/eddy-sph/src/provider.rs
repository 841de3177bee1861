//! The compute-provider seam and the physics shared by every provider.
//!
//! A provider evaluates one full SPH step on a [`ParticleState`]:
//!
//! 1. density `ρ_i = Σ_j m W_poly6(|x_i - x_j|)` (self included) and
//!    pressure `p_i = k (ρ_i - ρ0)`;
//! 2. force density from pressure, viscosity and gravity;
//! 3. symplectic Euler: `v += dt F/ρ`, then `x += dt v`.
//!
//! Each phase reads only the output of the previous one, so providers
//! are free to evaluate particles in any order or in parallel within a
//! phase.

use std::fmt;

use eddy_core::StepError;

use crate::kernel::Kernels;
use crate::params::SphParams;
use crate::particles::ParticleState;

/// A strategy for evaluating SPH steps.
///
/// Providers are stateless and shared between fluids through `Arc`.
pub trait ComputeProvider: fmt::Debug + Send + Sync {
    /// Name used in logs and errors.
    fn name(&self) -> &str;

    /// Advance `state` by one step of `dt`.
    fn compute(
        &self,
        state: &mut ParticleState<'_>,
        params: &SphParams,
        dt: f64,
    ) -> Result<(), StepError>;
}

/// Particle count, or a provider error naming `provider`.
pub(crate) fn particle_count(
    provider: &dyn ComputeProvider,
    state: &ParticleState<'_>,
) -> Result<usize, StepError> {
    state
        .checked_len()
        .ok_or_else(|| StepError::ProviderFailed {
            name: provider.name().to_string(),
            reason: "particle arrays have different lengths".to_string(),
        })
}

#[inline]
pub(crate) fn sub(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

#[inline]
pub(crate) fn norm2(a: [f64; 3]) -> f64 {
    a[0] * a[0] + a[1] * a[1] + a[2] * a[2]
}

/// Equation of state.
#[inline]
pub(crate) fn pressure(params: &SphParams, density: f64) -> f64 {
    params.stiffness * (density - params.rest_density)
}

/// Contribution of neighbour `j` to the density of a particle at `xi`.
#[inline]
pub(crate) fn density_term(kernels: &Kernels, params: &SphParams, xi: [f64; 3], xj: [f64; 3]) -> f64 {
    params.mass * kernels.poly6(norm2(sub(xi, xj)))
}

/// Read-only per-particle inputs of the force phase.
#[derive(Clone, Copy)]
pub(crate) struct Sample {
    pub x: [f64; 3],
    pub v: [f64; 3],
    pub rho: f64,
    pub p: f64,
}

/// Pressure and viscosity force density on `i` from neighbour `j != i`.
#[inline]
pub(crate) fn pair_force(kernels: &Kernels, params: &SphParams, i: Sample, j: Sample) -> [f64; 3] {
    let r_vec = sub(i.x, j.x);
    let r2 = norm2(r_vec);
    if r2 >= kernels.radius_squared() {
        return [0.0; 3];
    }
    let r = r2.sqrt();
    let grad = kernels.spiky_gradient(r_vec, r);
    let p_scale = -params.mass * (i.p + j.p) / (2.0 * j.rho);
    let v_scale = params.viscosity * params.mass * kernels.viscosity_laplacian(r) / j.rho;
    [
        p_scale * grad[0] + v_scale * (j.v[0] - i.v[0]),
        p_scale * grad[1] + v_scale * (j.v[1] - i.v[1]),
        p_scale * grad[2] + v_scale * (j.v[2] - i.v[2]),
    ]
}

/// Gravity force density on a particle of density `rho`.
#[inline]
pub(crate) fn gravity_force(params: &SphParams, rho: f64) -> [f64; 3] {
    [
        rho * params.gravity[0],
        rho * params.gravity[1],
        rho * params.gravity[2],
    ]
}

/// Symplectic Euler update of one particle.
#[inline]
pub(crate) fn integrate(x: &mut [f64; 3], v: &mut [f64; 3], f: [f64; 3], rho: f64, dt: f64) {
    for a in 0..3 {
        v[a] += dt * f[a] / rho;
        x[a] += dt * v[a];
    }
}
