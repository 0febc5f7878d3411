use std::collections::BTreeSet;
use std::mem;

use ndarray::{s, Array2, ArrayView2};
use pit_schemas::{Adjustment, CorrectionSchedule, Element};
use tracing::debug;

use crate::error::WindowError;

/// Rows of the last materialized view: `[start, anchor]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct CachedView {
    start: usize,
    anchor: usize,
}

/// A fixed-length window sliding forward over an owned buffer.
///
/// The window ending at row `r` covers rows `[r - window_length + 1, r]` and
/// reflects every scheduled adjustment anchored at a row `<= r`.
#[derive(Debug)]
pub struct AdjustedArrayWindow<E: Element> {
    data: Array2<E>,
    pending: CorrectionSchedule<E>,
    applied_rows: BTreeSet<usize>,
    window_length: usize,
    cached: Option<CachedView>,
}

impl<E: Element> AdjustedArrayWindow<E> {
    /// Take ownership of `data` and the schedule that adjusts it.
    pub fn new(
        data: Array2<E>,
        schedule: CorrectionSchedule<E>,
        window_length: usize,
    ) -> Result<Self, WindowError> {
        validate_window_length(data.nrows(), window_length)?;
        validate_schedule(data.nrows(), data.ncols(), &schedule)?;
        Ok(Self {
            data,
            pending: schedule,
            applied_rows: BTreeSet::new(),
            window_length,
            cached: None,
        })
    }

    /// Move the window so it ends at `row`.
    ///
    /// Same row as last time: the cached view, nothing reapplied. Later row:
    /// adjustments anchored in `(cursor, row]` are applied in place first.
    pub fn advance_to(&mut self, row: usize) -> Result<ArrayView2<'_, E>, WindowError> {
        if let Some(cached) = self.cached {
            if row < cached.anchor {
                return Err(WindowError::Rewind {
                    requested: row,
                    cursor: cached.anchor,
                });
            }
            if row == cached.anchor {
                return Ok(self.slice(cached));
            }
        }

        let nrows = self.data.nrows();
        if row >= nrows || row + 1 < self.window_length {
            return Err(WindowError::OutOfBounds {
                row,
                nrows,
                window_length: self.window_length,
            });
        }

        self.apply_through(row);

        let view = CachedView {
            start: row + 1 - self.window_length,
            anchor: row,
        };
        self.cached = Some(view);
        Ok(self.slice(view))
    }

    /// Advance by one row. The first call lands on the first full window.
    pub fn advance(&mut self) -> Result<ArrayView2<'_, E>, WindowError> {
        let next = match self.cached {
            Some(c) => c.anchor + 1,
            None => self.window_length - 1,
        };
        self.advance_to(next)
    }

    /// Row the current view ends at, if any view has been materialized.
    pub fn cursor(&self) -> Option<usize> {
        self.cached.map(|c| c.anchor)
    }

    pub fn window_length(&self) -> usize {
        self.window_length
    }

    pub fn num_columns(&self) -> usize {
        self.data.ncols()
    }

    /// Current view without moving.
    pub fn view(&self) -> Option<ArrayView2<'_, E>> {
        self.cached.map(|c| self.slice(c))
    }

    /// Owned copy of the current view.
    pub fn snapshot(&self) -> Option<Array2<E>> {
        self.view().map(|v| v.to_owned())
    }

    /// Anchor rows whose adjustments have been applied.
    pub fn applied_rows(&self) -> &BTreeSet<usize> {
        &self.applied_rows
    }

    /// Anchor rows still waiting for the cursor.
    pub fn pending_rows(&self) -> impl Iterator<Item = usize> + '_ {
        self.pending.keys().copied()
    }

    /// Give the (partially adjusted) buffer back.
    pub fn into_data(self) -> Array2<E> {
        self.data
    }

    fn slice(&self, view: CachedView) -> ArrayView2<'_, E> {
        self.data.slice(s![view.start..=view.anchor, ..])
    }

    /// Apply and retire every pending bucket anchored at or before `row`.
    fn apply_through(&mut self, row: usize) {
        let later = self.pending.split_off(&(row + 1));
        let due = mem::replace(&mut self.pending, later);
        if due.is_empty() {
            return;
        }

        let mut cells = 0usize;
        for (anchor, adjustments) in due {
            for adj in &adjustments {
                cells += apply_adjustment(&mut self.data, adj);
            }
            self.applied_rows.insert(anchor);
        }
        debug!(
            dtype = E::DTYPE.as_str(),
            through_row = row,
            applied_rows = self.applied_rows.len(),
            cells,
            "window/apply"
        );
    }
}

fn apply_adjustment<E: Element>(data: &mut Array2<E>, adj: &Adjustment<E>) -> usize {
    let mut region = data.slice_mut(s![
        adj.first_row()..=adj.last_row(),
        adj.first_col()..=adj.last_col()
    ]);
    // Multiply / Add can only be built for Arithmetic elements, which always yield a value.
    for cell in region.iter_mut() {
        if let Some(v) = adj.apply(*cell) {
            *cell = v;
        }
    }
    adj.cell_count()
}

pub(crate) fn validate_window_length(nrows: usize, window_length: usize) -> Result<(), WindowError> {
    if window_length == 0 {
        return Err(WindowError::InvalidShape(
            "window_length must be >= 1".to_string(),
        ));
    }
    if window_length > nrows {
        return Err(WindowError::InvalidShape(format!(
            "window_length {} exceeds {} rows",
            window_length, nrows
        )));
    }
    Ok(())
}

/// Every adjustment fits the buffer.
pub(crate) fn validate_schedule<E: Element>(
    nrows: usize,
    ncols: usize,
    schedule: &CorrectionSchedule<E>,
) -> Result<(), WindowError> {
    for (&anchor, adjustments) in schedule {
        for adj in adjustments {
            let fits = anchor < nrows
                && adj.first_row() <= adj.last_row()
                && adj.first_col() <= adj.last_col()
                && adj.last_row() < nrows
                && adj.last_col() < ncols;
            if !fits {
                return Err(WindowError::AdjustmentOutOfBounds {
                    anchor,
                    last_row: adj.last_row(),
                    last_col: adj.last_col(),
                    nrows,
                    ncols,
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use std::collections::BTreeMap;
    use pit_schemas::PendingCorrection;

    fn schedule<E: Element>(items: Vec<(usize, Adjustment<E>)>) -> CorrectionSchedule<E> {
        let mut out = BTreeMap::new();
        for (anchor, adj) in items {
            out.entry(anchor).or_insert_with(Vec::new).push(adj);
        }
        out
    }

    #[test]
    fn split_becomes_visible_only_at_its_row() {
        let data = array![[10.0], [10.0], [20.0], [20.0]];
        let sched = schedule(vec![(2, PendingCorrection::multiply_cell(2, 0, 2.0))]);
        let mut w = AdjustedArrayWindow::new(data, sched, 2).unwrap();

        let v = w.advance_to(1).unwrap();
        assert_eq!(v, array![[10.0], [10.0]]);
        assert!(w.applied_rows().is_empty());

        let v = w.advance_to(2).unwrap();
        assert_eq!(v, array![[10.0], [40.0]]);
        assert_eq!(w.applied_rows().iter().copied().collect::<Vec<_>>(), vec![2]);

        let v = w.advance_to(3).unwrap();
        assert_eq!(v, array![[40.0], [20.0]]);
    }

    #[test]
    fn same_row_returns_cached_view_without_reapplying() {
        let data = array![[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]];
        let sched = schedule(vec![(1, PendingCorrection::multiply_cell(1, 1, 10.0))]);
        let mut w = AdjustedArrayWindow::new(data, sched, 2).unwrap();

        let first = w.advance_to(1).unwrap().to_owned();
        let second = w.advance_to(1).unwrap().to_owned();
        assert_eq!(first, array![[1.0, 2.0], [3.0, 40.0]]);
        assert_eq!(
            first.iter().map(|x| x.to_bits()).collect::<Vec<_>>(),
            second.iter().map(|x| x.to_bits()).collect::<Vec<_>>()
        );
        assert_eq!(w.snapshot().unwrap(), first);
    }

    #[test]
    fn rewinding_is_an_ordering_error() {
        let data = Array2::<f64>::zeros((5, 1));
        let mut w = AdjustedArrayWindow::new(data, BTreeMap::new(), 1).unwrap();
        w.advance_to(3).unwrap();
        assert_eq!(
            w.advance_to(2).unwrap_err(),
            WindowError::Rewind {
                requested: 2,
                cursor: 3
            }
        );
        // Still usable afterwards.
        assert_eq!(w.cursor(), Some(3));
        assert!(w.advance_to(4).is_ok());
    }

    #[test]
    fn rows_that_cannot_anchor_a_full_window_fail() {
        let data = Array2::<f64>::zeros((4, 2));
        let mut w = AdjustedArrayWindow::new(data, BTreeMap::new(), 3).unwrap();
        assert_eq!(
            w.advance_to(1).unwrap_err(),
            WindowError::OutOfBounds {
                row: 1,
                nrows: 4,
                window_length: 3
            }
        );
        assert!(matches!(
            w.advance_to(4),
            Err(WindowError::OutOfBounds { row: 4, .. })
        ));
        assert_eq!(w.cursor(), None);
    }

    #[test]
    fn first_advance_applies_everything_up_to_the_row() {
        let data = array![[1.0], [1.0], [1.0], [1.0], [1.0]];
        let sched = schedule(vec![
            (0, PendingCorrection::multiply_cell(0, 0, 2.0)),
            (1, PendingCorrection::multiply_cell(1, 0, 3.0)),
            (4, PendingCorrection::multiply_cell(4, 0, 5.0)),
        ]);
        let mut w = AdjustedArrayWindow::new(data, sched, 2).unwrap();

        let v = w.advance_to(3).unwrap();
        assert_eq!(v, array![[1.0], [1.0]]);
        assert_eq!(
            w.applied_rows().iter().copied().collect::<Vec<_>>(),
            vec![0, 1]
        );
        assert_eq!(w.pending_rows().collect::<Vec<_>>(), vec![4]);

        let data = w.into_data();
        assert_eq!(data, array![[2.0], [3.0], [1.0], [1.0], [1.0]]);
    }

    #[test]
    fn rectangular_adjustment_covers_every_cell() {
        let data = Array2::<f64>::from_elem((3, 3), 4.0);
        let sched = schedule(vec![
            (2, Adjustment::multiply(0, 1, 1, 2, 0.5)),
            (2, Adjustment::add(2, 2, 0, 0, -1.0)),
        ]);
        let mut w = AdjustedArrayWindow::new(data, sched, 3).unwrap();
        let v = w.advance_to(2).unwrap();
        assert_eq!(
            v,
            array![[4.0, 2.0, 2.0], [4.0, 2.0, 2.0], [3.0, 4.0, 4.0]]
        );
    }

    #[test]
    fn advance_steps_one_row_at_a_time() {
        let data = array![[0_i64], [1], [2], [3]];
        let mut w = AdjustedArrayWindow::new(data, BTreeMap::new(), 3).unwrap();
        assert_eq!(w.advance().unwrap(), array![[0_i64], [1], [2]]);
        assert_eq!(w.advance().unwrap(), array![[1_i64], [2], [3]]);
        assert!(w.advance().is_err());
    }

    #[test]
    fn timestamp_and_bool_buffers_window_and_overwrite() {
        let ts = array![[100_i64, 200], [101, 201], [102, 202]];
        let sched = schedule(vec![(2, Adjustment::overwrite(0, 1, 0, 0, 0_i64))]);
        let mut w = AdjustedArrayWindow::new(ts, sched, 2).unwrap();
        assert_eq!(w.advance_to(1).unwrap(), array![[100_i64, 200], [101, 201]]);
        assert_eq!(w.advance_to(2).unwrap(), array![[0_i64, 201], [102, 202]]);

        let flags = array![[true], [false], [true]];
        let mut w = AdjustedArrayWindow::new(flags, BTreeMap::new(), 1).unwrap();
        assert_eq!(w.advance_to(1).unwrap(), array![[false]]);
        assert_eq!(w.advance_to(2).unwrap(), array![[true]]);
    }

    #[test]
    fn construction_rejects_bad_shapes_and_adjustments() {
        assert!(matches!(
            AdjustedArrayWindow::new(Array2::<f64>::zeros((3, 1)), BTreeMap::new(), 0),
            Err(WindowError::InvalidShape(_))
        ));
        assert!(matches!(
            AdjustedArrayWindow::new(Array2::<f64>::zeros((3, 1)), BTreeMap::new(), 4),
            Err(WindowError::InvalidShape(_))
        ));

        let sched = schedule(vec![(1, PendingCorrection::multiply_cell(1, 1, 2.0))]);
        assert!(matches!(
            AdjustedArrayWindow::new(Array2::<f64>::zeros((3, 1)), sched, 1),
            Err(WindowError::AdjustmentOutOfBounds { last_col: 1, ncols: 1, .. })
        ));

        let sched = schedule(vec![(3, PendingCorrection::multiply_cell(0, 0, 2.0))]);
        assert!(matches!(
            AdjustedArrayWindow::new(Array2::<f64>::zeros((3, 1)), sched, 1),
            Err(WindowError::AdjustmentOutOfBounds { anchor: 3, .. })
        ));
    }
}
