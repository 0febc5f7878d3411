//! pit-window
//!
//! Forward-only sliding windows over a dense `sessions x assets` buffer that
//! apply scheduled adjustments as simulated time reaches them.
//!
//! - One generic engine for every element type ([`pit_schemas::Element`]):
//!   floats take multiplicative/additive corrections, timestamps and booleans
//!   only window (and overwrite).
//! - Each window owns its buffer exclusively and mutates it in place.
//! - A correction anchored at row `r` is applied exactly once, when the cursor
//!   first reaches a row `>= r`. Never earlier.

mod array;
mod error;
mod window;

pub use array::AdjustedArray;
pub use error::WindowError;
pub use window::AdjustedArrayWindow;
