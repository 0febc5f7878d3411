//! Adjustments over rectangular regions of a 2-D buffer.
//!
//! Buffers are `rows = sessions`, `columns = assets`. An [`Adjustment`] names an
//! inclusive rectangle `[first_row, last_row] x [first_col, last_col]` and an
//! [`Operation`] applied to every cell in it.
//!
//! # Capabilities
//!
//! Every [`Element`] supports windowing and `Overwrite`. Only [`Arithmetic`]
//! elements (floats) can be constructed with `Multiply` / `Add`; timestamp and
//! boolean buffers share the windowing machinery but never carry arithmetic.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

// ---------------------------------------------------------------------------
// Element capability
// ---------------------------------------------------------------------------

/// Binary layout of a buffer element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Dtype {
    Float64,
    /// Integers and timestamps (epoch-based).
    Int64,
    Bool,
}

impl Dtype {
    pub fn as_str(&self) -> &'static str {
        match self {
            Dtype::Float64 => "float64",
            Dtype::Int64 => "int64",
            Dtype::Bool => "bool",
        }
    }
}

impl fmt::Display for Dtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A value that can live in an adjusted buffer.
///
/// The arithmetic hooks default to `None`; only [`Arithmetic`] types override them.
pub trait Element: Copy + PartialEq + fmt::Debug + Send + Sync + 'static {
    const DTYPE: Dtype;

    fn scaled(self, _factor: f64) -> Option<Self> {
        None
    }

    fn shifted(self, _delta: f64) -> Option<Self> {
        None
    }
}

/// Marker for element types that accept multiplicative and additive corrections.
pub trait Arithmetic: Element {}

impl Element for f64 {
    const DTYPE: Dtype = Dtype::Float64;

    fn scaled(self, factor: f64) -> Option<Self> {
        Some(self * factor)
    }

    fn shifted(self, delta: f64) -> Option<Self> {
        Some(self + delta)
    }
}

impl Arithmetic for f64 {}

impl Element for i64 {
    const DTYPE: Dtype = Dtype::Int64;
}

impl Element for bool {
    const DTYPE: Dtype = Dtype::Bool;
}

// ---------------------------------------------------------------------------
// Operation / Adjustment
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub enum Operation<E> {
    Multiply(f64),
    Add(f64),
    Overwrite(E),
}

impl<E> Operation<E> {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Multiply(_) => "multiply",
            Operation::Add(_) => "add",
            Operation::Overwrite(_) => "overwrite",
        }
    }
}

/// An operation applied to an inclusive rectangle of a buffer.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Adjustment<E> {
    first_row: usize,
    last_row: usize,
    first_col: usize,
    last_col: usize,
    op: Operation<E>,
}

/// Correction emitted by adjustment loading: a single-cell multiply.
pub type PendingCorrection = Adjustment<f64>;

/// Row index -> corrections that become visible once the cursor reaches that row.
///
/// Within a bucket, corrections keep the order they were discovered in.
pub type CorrectionSchedule<E = f64> = BTreeMap<usize, Vec<Adjustment<E>>>;

impl<E: Element> Adjustment<E> {
    fn region(
        first_row: usize,
        last_row: usize,
        first_col: usize,
        last_col: usize,
        op: Operation<E>,
    ) -> Self {
        debug_assert!(first_row <= last_row, "first_row must be <= last_row");
        debug_assert!(first_col <= last_col, "first_col must be <= last_col");
        Self {
            first_row,
            last_row,
            first_col,
            last_col,
            op,
        }
    }

    pub fn overwrite(
        first_row: usize,
        last_row: usize,
        first_col: usize,
        last_col: usize,
        value: E,
    ) -> Self {
        Self::region(first_row, last_row, first_col, last_col, Operation::Overwrite(value))
    }

    pub fn first_row(&self) -> usize {
        self.first_row
    }

    pub fn last_row(&self) -> usize {
        self.last_row
    }

    pub fn first_col(&self) -> usize {
        self.first_col
    }

    pub fn last_col(&self) -> usize {
        self.last_col
    }

    pub fn op(&self) -> &Operation<E> {
        &self.op
    }

    /// Anchor row (the last row the adjustment touches).
    pub fn row(&self) -> usize {
        self.last_row
    }

    /// Anchor column (the first column the adjustment touches).
    pub fn column(&self) -> usize {
        self.first_col
    }

    /// Scalar of an arithmetic operation.
    pub fn value(&self) -> Option<f64> {
        match self.op {
            Operation::Multiply(v) | Operation::Add(v) => Some(v),
            Operation::Overwrite(_) => None,
        }
    }

    /// Number of cells in the rectangle.
    pub fn cell_count(&self) -> usize {
        (self.last_row - self.first_row + 1) * (self.last_col - self.first_col + 1)
    }

    /// New value for `cell`. `None` if the element type cannot carry the operation.
    pub fn apply(&self, cell: E) -> Option<E> {
        match self.op {
            Operation::Multiply(factor) => cell.scaled(factor),
            Operation::Add(delta) => cell.shifted(delta),
            Operation::Overwrite(value) => Some(value),
        }
    }
}

impl<E: Arithmetic> Adjustment<E> {
    pub fn multiply(
        first_row: usize,
        last_row: usize,
        first_col: usize,
        last_col: usize,
        factor: f64,
    ) -> Self {
        Self::region(first_row, last_row, first_col, last_col, Operation::Multiply(factor))
    }

    pub fn add(
        first_row: usize,
        last_row: usize,
        first_col: usize,
        last_col: usize,
        delta: f64,
    ) -> Self {
        Self::region(first_row, last_row, first_col, last_col, Operation::Add(delta))
    }

    /// Multiply the single cell `(row, column)`.
    pub fn multiply_cell(row: usize, column: usize, factor: f64) -> Self {
        Self::multiply(row, row, column, column, factor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_cell_multiply_exposes_row_column_value() {
        let c = PendingCorrection::multiply_cell(2, 0, 2.0);
        assert_eq!(c.row(), 2);
        assert_eq!(c.column(), 0);
        assert_eq!(c.value(), Some(2.0));
        assert_eq!(c.op(), &Operation::Multiply(2.0));
        assert_eq!(c.cell_count(), 1);
    }

    #[test]
    fn float_cells_accept_every_operation() {
        assert_eq!(Adjustment::<f64>::multiply(0, 1, 0, 0, 0.5).apply(4.0), Some(2.0));
        assert_eq!(Adjustment::<f64>::add(0, 0, 0, 0, 1.5).apply(4.0), Some(5.5));
        assert_eq!(Adjustment::overwrite(0, 0, 0, 0, 9.0).apply(4.0), Some(9.0));
    }

    #[test]
    fn non_arithmetic_cells_only_overwrite() {
        let ts = Adjustment::overwrite(1, 3, 0, 1, 1_600_000_000_i64);
        assert_eq!(ts.apply(0), Some(1_600_000_000));
        assert_eq!(ts.cell_count(), 6);
        assert_eq!(ts.op().name(), "overwrite");

        let flag = Adjustment::overwrite(0, 0, 2, 2, true);
        assert_eq!(flag.apply(false), Some(true));

        assert_eq!(i64::DTYPE, Dtype::Int64);
        assert_eq!(bool::DTYPE, Dtype::Bool);
        assert_eq!(7_i64.scaled(2.0), None);
        assert_eq!(true.shifted(1.0), None);
    }

    #[test]
    fn corrections_serialize_for_replay_dumps() {
        let c = PendingCorrection::multiply_cell(3, 1, 0.98);
        let v = serde_json::to_value(c).unwrap();
        assert_eq!(v["last_row"], 3);
        assert_eq!(v["first_col"], 1);
        assert_eq!(v["op"]["Multiply"], 0.98);
    }
}
