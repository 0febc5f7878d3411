//! pit-db
//!
//! Read side of the adjustment store.
//!
//! - [`AdjustmentStore`]: the two queries the loader needs (distinct sids in a
//!   date range, bounded IN-list range fetch).
//! - [`SqliteAdjustmentStore`]: rusqlite-backed implementation over the
//!   `splits` / `mergers` / `dividends` tables.
//! - [`SidResolver`] / [`ChunkedAdjustmentFetcher`]: per-category query
//!   drivers. The fetcher never binds more parameters than the store allows.
//!
//! Synchronous and read-only. One connection per store; callers serialize access.

mod error;
mod fetch;
mod store;

#[cfg(any(test, feature = "testkit"))]
pub mod fixtures;

pub use error::StoreError;
pub use fetch::{chunk, ChunkedAdjustmentFetcher, SidResolver};
pub use store::{AdjustmentStore, SqliteAdjustmentStore, RANGE_PARAMS, SQLITE_MAX_VARIABLE_NUMBER};
