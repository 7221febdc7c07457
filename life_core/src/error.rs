// error.rs - Error types for grid operations

use std::fmt;

/// Errors produced by grid mutations.
///
/// Interval adjustments are clamped to their configured bounds rather
/// than rejected, so there is no interval variant here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridError {
    /// Coordinates outside the grid bounds
    OutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GridError::OutOfBounds {
                row,
                col,
                rows,
                cols,
            } => {
                write!(
                    f,
                    "cell ({}, {}) is outside the {}x{} grid",
                    row, col, rows, cols
                )
            }
        }
    }
}

impl std::error::Error for GridError {}

/// Result type alias for grid operations
pub type GridResult<T> = Result<T, GridError>;
