//! Uniform 2D Cartesian grid with flat row-major indexing.

use crate::edge::{resolve_axis, EdgeBehavior};
use crate::error::GridError;
use smallvec::SmallVec;

/// Dimensions of a uniform 2D grid.
///
/// Cell `(x, y)` lives at flat index `x + y * width`, with `x` the column
/// (`0 <= x < width`) and `y` the row (`0 <= y < height`). Every per-cell
/// buffer in eddy uses this layout.
///
/// # Examples
///
/// ```
/// use eddy_grid::Grid2D;
///
/// let grid = Grid2D::new(4, 3).unwrap();
/// assert_eq!(grid.cell_count(), 12);
/// assert_eq!(grid.index(1, 2), 9);
/// assert_eq!(grid.coords(9), (1, 2));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Grid2D {
    width: usize,
    height: usize,
}

impl Grid2D {
    /// Maximum size of either dimension: coordinates must fit `i32`.
    pub const MAX_DIM: usize = i32::MAX as usize;

    /// Create a `width x height` grid.
    ///
    /// Returns `Err(GridError::EmptyGrid)` if either dimension is 0, or
    /// `Err(GridError::DimensionTooLarge)` if either exceeds [`Self::MAX_DIM`].
    pub fn new(width: usize, height: usize) -> Result<Self, GridError> {
        if width == 0 || height == 0 {
            return Err(GridError::EmptyGrid);
        }
        if width > Self::MAX_DIM {
            return Err(GridError::DimensionTooLarge {
                name: "width",
                value: width,
                max: Self::MAX_DIM,
            });
        }
        if height > Self::MAX_DIM {
            return Err(GridError::DimensionTooLarge {
                name: "height",
                value: height,
                max: Self::MAX_DIM,
            });
        }
        Ok(Self { width, height })
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Total number of cells.
    pub fn cell_count(&self) -> usize {
        self.width * self.height
    }

    /// Flat index of `(x, y)`. The caller guarantees the cell is in range.
    #[inline]
    pub fn index(&self, x: usize, y: usize) -> usize {
        debug_assert!(x < self.width && y < self.height);
        x + y * self.width
    }

    /// Flat index of `(x, y)`, or `OutOfBounds`.
    pub fn try_index(&self, x: usize, y: usize) -> Result<usize, GridError> {
        if x < self.width && y < self.height {
            Ok(self.index(x, y))
        } else {
            Err(GridError::OutOfBounds {
                x,
                y,
                width: self.width,
                height: self.height,
            })
        }
    }

    /// Inverse of [`index`](Self::index).
    #[inline]
    pub fn coords(&self, i: usize) -> (usize, usize) {
        (i % self.width, i / self.width)
    }

    /// Whether a signed coordinate lies inside the grid.
    pub fn contains(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    /// Check that a per-cell buffer has exactly one entry per cell.
    pub fn check_len(&self, what: &'static str, len: usize) -> Result<(), GridError> {
        if len == self.cell_count() {
            Ok(())
        } else {
            Err(GridError::LengthMismatch {
                what,
                expected: self.cell_count(),
                actual: len,
            })
        }
    }

    /// Flat indices of the 4-connected neighbours of `(x, y)`.
    pub fn neighbours4(&self, x: usize, y: usize, edge: EdgeBehavior) -> SmallVec<[usize; 4]> {
        const OFFSETS: [(i64, i64); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];
        let mut result = SmallVec::new();
        for (dx, dy) in OFFSETS {
            let nx = resolve_axis(x as i64 + dx, self.width, edge);
            let ny = resolve_axis(y as i64 + dy, self.height, edge);
            if let (Some(nx), Some(ny)) = (nx, ny) {
                result.push(self.index(nx, ny));
            }
        }
        result
    }

    /// Whether `(x, y)` is more than one cell away from every edge.
    pub fn is_interior(&self, x: usize, y: usize) -> bool {
        x > 0 && y > 0 && x + 1 < self.width && y + 1 < self.height
    }
}
