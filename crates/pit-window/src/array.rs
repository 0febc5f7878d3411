use ndarray::{Array2, ArrayView2};
use pit_schemas::{CorrectionSchedule, Element};

use crate::error::WindowError;
use crate::window::{validate_schedule, validate_window_length, AdjustedArrayWindow};

/// Unadjusted baseline buffer plus the schedule that adjusts it over time.
///
/// Never mutated. Windows get their own copy of the buffer.
#[derive(Clone, Debug)]
pub struct AdjustedArray<E: Element> {
    data: Array2<E>,
    adjustments: CorrectionSchedule<E>,
}

impl<E: Element> AdjustedArray<E> {
    pub fn new(data: Array2<E>, adjustments: CorrectionSchedule<E>) -> Result<Self, WindowError> {
        if data.nrows() == 0 {
            return Err(WindowError::InvalidShape("buffer has no rows".to_string()));
        }
        validate_schedule(data.nrows(), data.ncols(), &adjustments)?;
        Ok(Self { data, adjustments })
    }

    pub fn data(&self) -> ArrayView2<'_, E> {
        self.data.view()
    }

    pub fn adjustments(&self) -> &CorrectionSchedule<E> {
        &self.adjustments
    }

    /// `(rows, columns)`.
    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }

    /// A fresh window over a private copy of the buffer.
    pub fn traverse(&self, window_length: usize) -> Result<AdjustedArrayWindow<E>, WindowError> {
        validate_window_length(self.data.nrows(), window_length)?;
        AdjustedArrayWindow::new(self.data.clone(), self.adjustments.clone(), window_length)
    }

    /// Hand the buffer itself to a single window (no copy).
    pub fn into_window(self, window_length: usize) -> Result<AdjustedArrayWindow<E>, WindowError> {
        AdjustedArrayWindow::new(self.data, self.adjustments, window_length)
    }
}
