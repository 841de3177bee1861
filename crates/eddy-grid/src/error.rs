//! Error types for grid construction and indexing.

use eddy_core::ConfigError;
use std::fmt;

/// Errors arising from grid construction or coordinate queries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GridError {
    /// Attempted to construct a grid with zero cells.
    EmptyGrid,
    /// A dimension does not fit the signed coordinate range.
    DimensionTooLarge {
        /// Which dimension (`"width"` or `"height"`).
        name: &'static str,
        /// The requested size.
        value: usize,
        /// The maximum allowed size.
        max: usize,
    },
    /// A coordinate lies outside the grid.
    OutOfBounds {
        /// Requested column.
        x: usize,
        /// Requested row.
        y: usize,
        /// Grid width.
        width: usize,
        /// Grid height.
        height: usize,
    },
    /// A per-cell buffer does not match the grid size.
    LengthMismatch {
        /// What the buffer represents.
        what: &'static str,
        /// Required length.
        expected: usize,
        /// Supplied length.
        actual: usize,
    },
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyGrid => write!(f, "grid must have at least one cell"),
            Self::DimensionTooLarge { name, value, max } => {
                write!(f, "{name} {value} exceeds maximum {max}")
            }
            Self::OutOfBounds {
                x,
                y,
                width,
                height,
            } => write!(f, "cell ({x}, {y}) outside {width}x{height} grid"),
            Self::LengthMismatch {
                what,
                expected,
                actual,
            } => write!(f, "{what} has {actual} elements, expected {expected}"),
        }
    }
}

impl std::error::Error for GridError {}

impl From<GridError> for ConfigError {
    fn from(e: GridError) -> Self {
        match e {
            GridError::EmptyGrid => ConfigError::EmptyGrid,
            GridError::LengthMismatch {
                what,
                expected,
                actual,
            } => ConfigError::LengthMismatch {
                what,
                expected,
                actual,
            },
            other => ConfigError::InvalidGrid {
                reason: other.to_string(),
            },
        }
    }
}
