//! D2Q9 velocity set.
//!
//! ```text
//!   6   2   5
//!     \ | /
//!   3 - 0 - 1
//!     / | \
//!   7   4   8
//! ```

/// Number of discrete velocities.
pub const Q: usize = 9;

/// Lattice velocities `(cx, cy)`; `+y` points north.
pub const E: [[i32; 2]; Q] = [
    [0, 0],
    [1, 0],
    [0, 1],
    [-1, 0],
    [0, -1],
    [1, 1],
    [-1, 1],
    [-1, -1],
    [1, -1],
];

/// Quadrature weights.
pub const W: [f64; Q] = [
    4.0 / 9.0,
    1.0 / 9.0,
    1.0 / 9.0,
    1.0 / 9.0,
    1.0 / 9.0,
    1.0 / 36.0,
    1.0 / 36.0,
    1.0 / 36.0,
    1.0 / 36.0,
];

/// Index of the opposite direction, used by bounce-back.
pub const OPP: [usize; Q] = [0, 3, 4, 1, 2, 7, 8, 5, 6];

/// BGK relaxation time for a lattice kinematic viscosity.
#[inline]
pub fn tau_for(viscosity: f64) -> f64 {
    3.0 * viscosity + 0.5
}

/// Second-order equilibrium populations for density `rho` and velocity `(ux, uy)`.
#[inline]
pub fn equilibrium(rho: f64, ux: f64, uy: f64) -> [f64; Q] {
    let usq = ux * ux + uy * uy;
    let mut feq = [0.0; Q];
    for i in 0..Q {
        let cu = E[i][0] as f64 * ux + E[i][1] as f64 * uy;
        feq[i] = W[i] * rho * (1.0 + 3.0 * cu + 4.5 * cu * cu - 1.5 * usq);
    }
    feq
}
