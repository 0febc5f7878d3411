//! pit-schemas
//!
//! Shared data model for point-in-time adjustment loading and windowed reads.
//!
//! - Raw corporate-action rows as they come out of the adjustment store
//! - Request axes (date axis in epoch seconds, asset axis in sids)
//! - Adjustments over rectangular regions of a 2-D buffer, typed by element
//! - Row-indexed correction schedules
//!
//! Pure data. No IO, no wall-clock.

pub mod adjustment;
pub mod types;

pub use adjustment::{
    Adjustment, Arithmetic, CorrectionSchedule, Dtype, Element, Operation, PendingCorrection,
};
pub use types::{
    AdjustmentCategory, AdjustmentScope, AxesError, ParseScopeError, RawAdjustmentRecord,
    RequestAxes, Sid,
};
