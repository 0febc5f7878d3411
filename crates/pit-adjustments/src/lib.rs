//! pit-adjustments
//!
//! Turns raw corporate-action rows into row-indexed correction schedules.
//!
//! Pipeline per load: RESOLVE SIDS -> CHUNKED FETCH -> INDEX (date, asset) -> CLASSIFY
//!
//! - Splits scale price by `ratio` and volume by `1 / ratio`.
//! - Mergers and dividends scale price only; a volume-only load skips them.
//! - A correction lands on the first session strictly after its effective date,
//!   so no view sees it before it was knowable.
//! - Rows dated before the first requested session are dropped: the baseline
//!   buffer already reflects them.

mod assembler;
mod error;
mod indexer;

pub use assembler::{load_adjustments, AdjustmentAssembler, LoadFlags, LoadedAdjustments};
pub use error::AdjustmentError;
pub use indexer::{AssetIndexer, DateIndexer};
