//! Velocity-gradient tensor on a uniform grid.
//!
//! This is the coupling currency between a base flow solver and a
//! turbulence closure: the flow solver produces velocity components,
//! [`VelocityGradients::compute_into`] turns them into the four partial
//! derivatives, and the closure consumes the tensor.
//!
//! Derivatives use central differences with unit spacing:
//!
//! ```text
//! du/dx[i] = (u_east - u_west) / 2
//! du/dy[i] = (u_north - u_south) / 2     (north = y + 1)
//! ```
//!
//! When a neighbour is dropped by [`EdgeBehavior::Absorb`], the cell's own
//! value stands in for it, producing a one-sided difference.

use crate::edge::{resolve_axis, EdgeBehavior};
use crate::error::GridError;
use crate::grid2d::Grid2D;

/// The four partial derivatives of a 2D velocity field, one per cell.
#[derive(Clone, Debug, PartialEq)]
pub struct VelocityGradients {
    grid: Grid2D,
    /// `∂u/∂x`
    pub du_dx: Vec<f64>,
    /// `∂u/∂y`
    pub du_dy: Vec<f64>,
    /// `∂v/∂x`
    pub dv_dx: Vec<f64>,
    /// `∂v/∂y`
    pub dv_dy: Vec<f64>,
}

impl VelocityGradients {
    /// A zero tensor for `grid`.
    pub fn zeros(grid: Grid2D) -> Self {
        let n = grid.cell_count();
        Self {
            grid,
            du_dx: vec![0.0; n],
            du_dy: vec![0.0; n],
            dv_dx: vec![0.0; n],
            dv_dy: vec![0.0; n],
        }
    }

    /// The same tensor `[du_dx, du_dy, dv_dx, dv_dy]` in every cell.
    pub fn uniform(grid: Grid2D, tensor: [f64; 4]) -> Self {
        let n = grid.cell_count();
        Self {
            grid,
            du_dx: vec![tensor[0]; n],
            du_dy: vec![tensor[1]; n],
            dv_dx: vec![tensor[2]; n],
            dv_dy: vec![tensor[3]; n],
        }
    }

    /// Compute the gradients of `(ux, uy)` on `grid`.
    pub fn compute(
        grid: Grid2D,
        ux: &[f64],
        uy: &[f64],
        edge: EdgeBehavior,
    ) -> Result<Self, GridError> {
        let mut g = Self::zeros(grid);
        g.compute_into(ux, uy, edge)?;
        Ok(g)
    }

    /// Recompute in place from `(ux, uy)`, reusing the allocation.
    pub fn compute_into(
        &mut self,
        ux: &[f64],
        uy: &[f64],
        edge: EdgeBehavior,
    ) -> Result<(), GridError> {
        let grid = self.grid;
        grid.check_len("velocity x", ux.len())?;
        grid.check_len("velocity y", uy.len())?;

        let w = grid.width();
        let h = grid.height();
        for y in 0..h {
            for x in 0..w {
                let i = grid.index(x, y);
                let east = resolve_axis(x as i64 + 1, w, edge).map(|nx| grid.index(nx, y));
                let west = resolve_axis(x as i64 - 1, w, edge).map(|nx| grid.index(nx, y));
                let north = resolve_axis(y as i64 + 1, h, edge).map(|ny| grid.index(x, ny));
                let south = resolve_axis(y as i64 - 1, h, edge).map(|ny| grid.index(x, ny));

                let e = east.unwrap_or(i);
                let wst = west.unwrap_or(i);
                let n = north.unwrap_or(i);
                let s = south.unwrap_or(i);

                self.du_dx[i] = (ux[e] - ux[wst]) / 2.0;
                self.dv_dx[i] = (uy[e] - uy[wst]) / 2.0;
                self.du_dy[i] = (ux[n] - ux[s]) / 2.0;
                self.dv_dy[i] = (uy[n] - uy[s]) / 2.0;
            }
        }
        Ok(())
    }

    /// The grid the tensor is defined on.
    pub fn grid(&self) -> Grid2D {
        self.grid
    }

    /// Strain-rate invariant `S² = 2(s11² + s22² + 2·s12²)` at cell `i`,
    /// with `s12 = ½(∂u/∂y + ∂v/∂x)`.
    #[inline]
    pub fn strain_rate_squared(&self, i: usize) -> f64 {
        let s11 = self.du_dx[i];
        let s22 = self.dv_dy[i];
        let s12 = 0.5 * (self.du_dy[i] + self.dv_dx[i]);
        2.0 * (s11 * s11 + s22 * s22 + 2.0 * s12 * s12)
    }
}
