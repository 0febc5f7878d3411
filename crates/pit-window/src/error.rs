use std::fmt;

/// Window construction and traversal errors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WindowError {
    /// Requested row cannot anchor a full window (`row < window_length - 1`
    /// or `row >= nrows`).
    OutOfBounds {
        row: usize,
        nrows: usize,
        window_length: usize,
    },
    /// Requested row is behind the cursor. Windows only move forward.
    Rewind { requested: usize, cursor: usize },
    /// Window length or buffer shape cannot produce any window.
    InvalidShape(String),
    /// A scheduled adjustment reaches outside the buffer.
    AdjustmentOutOfBounds {
        anchor: usize,
        last_row: usize,
        last_col: usize,
        nrows: usize,
        ncols: usize,
    },
}

impl fmt::Display for WindowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WindowError::OutOfBounds {
                row,
                nrows,
                window_length,
            } => write!(
                f,
                "lookup: row {} cannot anchor a window of length {} over {} rows",
                row, window_length, nrows
            ),
            WindowError::Rewind { requested, cursor } => write!(
                f,
                "ordering: cannot move window back to row {} (cursor at {})",
                requested, cursor
            ),
            WindowError::InvalidShape(msg) => write!(f, "invalid shape: {}", msg),
            WindowError::AdjustmentOutOfBounds {
                anchor,
                last_row,
                last_col,
                nrows,
                ncols,
            } => write!(
                f,
                "adjustment anchored at row {} reaches ({}, {}) outside a {}x{} buffer",
                anchor, last_row, last_col, nrows, ncols
            ),
        }
    }
}

impl std::error::Error for WindowError {}
