use std::collections::BTreeSet;
use std::num::NonZeroUsize;
use std::slice::Chunks;

use pit_schemas::{AdjustmentCategory, RawAdjustmentRecord, Sid};
use tracing::debug;

use crate::error::StoreError;
use crate::store::{AdjustmentStore, RANGE_PARAMS};

/// Consecutive sub-slices of `items`, each at most `limit` long, in order.
///
/// Empty input yields no chunks.
pub fn chunk<T>(items: &[T], limit: NonZeroUsize) -> Chunks<'_, T> {
    items.chunks(limit.get())
}

// ---------------------------------------------------------------------------
// SidResolver
// ---------------------------------------------------------------------------

/// Which sids have any rows of a category inside a date range.
pub struct SidResolver<'a, S: ?Sized> {
    store: &'a S,
}

impl<'a, S: AdjustmentStore + ?Sized> SidResolver<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// One distinct-sid query over `[start_date, end_date]`.
    pub fn resolve(
        &self,
        category: AdjustmentCategory,
        start_date: i64,
        end_date: i64,
    ) -> Result<BTreeSet<Sid>, StoreError> {
        let sids = self.store.distinct_sids(category, start_date, end_date)?;
        debug!(
            category = category.as_str(),
            start_date,
            end_date,
            sids = sids.len(),
            "adjustments/resolve_sids"
        );
        Ok(sids)
    }
}

// ---------------------------------------------------------------------------
// ChunkedAdjustmentFetcher
// ---------------------------------------------------------------------------

/// Range fetch split into IN-lists that fit the store's parameter limit.
pub struct ChunkedAdjustmentFetcher<'a, S: ?Sized> {
    store: &'a S,
}

impl<'a, S: AdjustmentStore + ?Sized> ChunkedAdjustmentFetcher<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Largest number of sids one query may bind.
    pub fn chunk_limit(&self) -> Result<NonZeroUsize, StoreError> {
        let max_bound_params = self.store.max_bound_params();
        max_bound_params
            .checked_sub(RANGE_PARAMS)
            .and_then(NonZeroUsize::new)
            .ok_or(StoreError::ParameterLimit {
                max_bound_params,
                reserved: RANGE_PARAMS,
            })
    }

    /// All rows of `category` for `candidates` within `[start_date, end_date]`.
    ///
    /// Candidates are sorted and deduplicated first, so the concatenated chunks come
    /// back in the same `(sid, effective_date)` order as one unchunked query. The
    /// first failing chunk aborts the fetch; rows from earlier chunks are dropped with it.
    pub fn fetch(
        &self,
        category: AdjustmentCategory,
        candidates: &[Sid],
        start_date: i64,
        end_date: i64,
    ) -> Result<Vec<RawAdjustmentRecord>, StoreError> {
        let limit = self.chunk_limit()?;

        let mut sorted = candidates.to_vec();
        sorted.sort_unstable();
        sorted.dedup();

        let mut out = Vec::new();
        for (chunk_ix, sids) in chunk(&sorted, limit).enumerate() {
            let rows = self
                .store
                .fetch_range(category, sids, start_date, end_date)?;
            debug!(
                category = category.as_str(),
                chunk = chunk_ix,
                bound_params = sids.len() + RANGE_PARAMS,
                rows = rows.len(),
                "adjustments/fetch_chunk"
            );
            out.extend(rows);
        }
        Ok(out)
    }
}
