//! Static obstacle masks.

use crate::error::GridError;
use crate::grid2d::Grid2D;

/// Per-cell solid flags, painted once before a simulation starts.
///
/// Solvers copy the mask at construction; changing a mask afterwards has
/// no effect on a running solver.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObstacleMask {
    grid: Grid2D,
    solid: Vec<bool>,
}

impl ObstacleMask {
    /// An all-fluid mask.
    pub fn new(grid: Grid2D) -> Self {
        Self {
            grid,
            solid: vec![false; grid.cell_count()],
        }
    }

    /// Build a mask from a predicate over `(x, y)`.
    pub fn from_fn(grid: Grid2D, mut is_solid: impl FnMut(usize, usize) -> bool) -> Self {
        let solid = (0..grid.cell_count())
            .map(|i| {
                let (x, y) = grid.coords(i);
                is_solid(x, y)
            })
            .collect();
        Self { grid, solid }
    }

    /// Wrap an existing flag buffer.
    pub fn from_vec(grid: Grid2D, solid: Vec<bool>) -> Result<Self, GridError> {
        grid.check_len("obstacle mask", solid.len())?;
        Ok(Self { grid, solid })
    }

    /// The grid this mask covers.
    pub fn grid(&self) -> Grid2D {
        self.grid
    }

    /// Mark or clear a single cell.
    pub fn set(&mut self, x: usize, y: usize, solid: bool) -> Result<(), GridError> {
        let i = self.grid.try_index(x, y)?;
        self.solid[i] = solid;
        Ok(())
    }

    /// Mark the rectangle `[x0, x0+w) x [y0, y0+h)`, clipped to the grid.
    pub fn fill_rect(&mut self, x0: usize, y0: usize, w: usize, h: usize) {
        let x1 = x0.saturating_add(w).min(self.grid.width());
        let y1 = y0.saturating_add(h).min(self.grid.height());
        for y in y0..y1 {
            for x in x0..x1 {
                let i = self.grid.index(x, y);
                self.solid[i] = true;
            }
        }
    }

    /// Mark every cell whose centre lies within `radius` of `(cx, cy)`.
    ///
    /// Centres are at `(x + 0.5, y + 0.5)` in cell units.
    pub fn fill_circle(&mut self, cx: f64, cy: f64, radius: f64) {
        let r2 = radius * radius;
        for i in 0..self.solid.len() {
            let (x, y) = self.grid.coords(i);
            let dx = x as f64 + 0.5 - cx;
            let dy = y as f64 + 0.5 - cy;
            if dx * dx + dy * dy <= r2 {
                self.solid[i] = true;
            }
        }
    }

    /// Whether `(x, y)` is solid. The caller guarantees the cell is in range.
    #[inline]
    pub fn is_solid(&self, x: usize, y: usize) -> bool {
        self.solid[self.grid.index(x, y)]
    }

    /// Whether the cell at flat index `i` is solid.
    #[inline]
    pub fn is_solid_index(&self, i: usize) -> bool {
        self.solid[i]
    }

    /// Number of solid cells.
    pub fn solid_count(&self) -> usize {
        self.solid.iter().filter(|&&s| s).count()
    }

    /// Per-cell flags in flat grid order.
    pub fn as_slice(&self) -> &[bool] {
        &self.solid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_is_clipped_to_grid() {
        let grid = Grid2D::new(4, 4).unwrap();
        let mut mask = ObstacleMask::new(grid);
        mask.fill_rect(2, 2, 5, 5);
        assert_eq!(mask.solid_count(), 4);
        assert!(mask.is_solid(3, 3));
        assert!(!mask.is_solid(1, 1));
    }

    #[test]
    fn huge_rect_saturates() {
        let grid = Grid2D::new(4, 3).unwrap();
        let mut mask = ObstacleMask::new(grid);
        mask.fill_rect(1, 1, usize::MAX, usize::MAX);
        assert_eq!(mask.solid_count(), 6);
        mask.fill_rect(usize::MAX, 0, 2, 2);
        assert_eq!(mask.solid_count(), 6);
    }

    #[test]
    fn circle_marks_cells_by_centre() {
        let grid = Grid2D::new(9, 9).unwrap();
        let mut mask = ObstacleMask::new(grid);
        mask.fill_circle(4.5, 4.5, 1.0);
        // centre plus its four cardinal neighbours
        assert_eq!(mask.solid_count(), 5);
        assert!(mask.is_solid(4, 4));
        assert!(mask.is_solid(4, 5));
        assert!(!mask.is_solid(5, 5));
    }

    #[test]
    fn from_vec_checks_length() {
        let grid = Grid2D::new(2, 2).unwrap();
        assert!(ObstacleMask::from_vec(grid, vec![false; 3]).is_err());
        let mask = ObstacleMask::from_vec(grid, vec![true, false, false, true]).unwrap();
        assert!(mask.is_solid_index(3));
    }

    #[test]
    fn from_fn_and_set() {
        let grid = Grid2D::new(3, 3).unwrap();
        let mut mask = ObstacleMask::from_fn(grid, |x, _| x == 0);
        assert_eq!(mask.solid_count(), 3);
        mask.set(0, 1, false).unwrap();
        assert_eq!(mask.solid_count(), 2);
        assert!(mask.set(3, 0, true).is_err());
    }
}
