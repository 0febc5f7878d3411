use pit_db::{AdjustmentStore, ChunkedAdjustmentFetcher, SidResolver};
use pit_schemas::{
    AdjustmentCategory, AdjustmentScope, CorrectionSchedule, PendingCorrection,
    RawAdjustmentRecord, RequestAxes, Sid,
};
use tracing::{debug, info};

use crate::error::AdjustmentError;
use crate::indexer::{AssetIndexer, DateIndexer};

// ---------------------------------------------------------------------------
// Request / result
// ---------------------------------------------------------------------------

/// Which categories to load and which schedules to produce.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoadFlags {
    pub include_splits: bool,
    pub include_mergers: bool,
    pub include_dividends: bool,
    pub scope: AdjustmentScope,
}

impl LoadFlags {
    /// Every category, for the given scope.
    pub fn all(scope: AdjustmentScope) -> Self {
        Self {
            include_splits: true,
            include_mergers: true,
            include_dividends: true,
            scope,
        }
    }

    /// Categories that can contribute to the requested schedules.
    ///
    /// Mergers and dividends only ever move price, so they drop out of a
    /// volume-only load regardless of their flags.
    pub fn effective_categories(&self) -> Vec<AdjustmentCategory> {
        let price = self.scope.includes_price();
        AdjustmentCategory::ALL
            .into_iter()
            .filter(|&c| self.includes(c))
            .filter(|c| price || c.affects_volume())
            .collect()
    }

    fn includes(&self, category: AdjustmentCategory) -> bool {
        match category {
            AdjustmentCategory::Split => self.include_splits,
            AdjustmentCategory::Merger => self.include_mergers,
            AdjustmentCategory::Dividend => self.include_dividends,
        }
    }
}

/// Output of one load. A schedule is present iff the scope asked for it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LoadedAdjustments {
    pub price: Option<CorrectionSchedule>,
    pub volume: Option<CorrectionSchedule>,
}

// ---------------------------------------------------------------------------
// AdjustmentAssembler
// ---------------------------------------------------------------------------

/// Builds price and volume schedules for a request from an adjustment store.
pub struct AdjustmentAssembler<'a, S: ?Sized> {
    store: &'a S,
}

#[derive(Default)]
struct DropCounts {
    before_start: usize,
    after_last_session: usize,
}

impl<'a, S: AdjustmentStore + ?Sized> AdjustmentAssembler<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    pub fn assemble(
        &self,
        axes: &RequestAxes,
        flags: &LoadFlags,
    ) -> Result<LoadedAdjustments, AdjustmentError> {
        let categories = flags.effective_categories();
        let assets = AssetIndexer::new(axes.assets());

        let mut splits = Vec::new();
        let mut others = Vec::new();
        for &category in &categories {
            let rows = self.fetch_category(category, axes, &assets)?;
            debug!(category = category.as_str(), rows = rows.len(), "adjustments/fetched");
            match category {
                AdjustmentCategory::Split => splits = rows,
                AdjustmentCategory::Merger | AdjustmentCategory::Dividend => others.extend(rows),
            }
        }

        let price_on = flags.scope.includes_price();
        let volume_on = flags.scope.includes_volume();
        let mut price = CorrectionSchedule::new();
        let mut volume = CorrectionSchedule::new();
        let mut dates = DateIndexer::new(axes.dates());
        let mut dropped = DropCounts::default();

        // Pass 1: splits. Price by ratio, volume by its inverse.
        for r in &splits {
            let Some((row, col)) = locate(r, axes, &mut dates, &assets, &mut dropped)? else {
                continue;
            };
            if price_on {
                price
                    .entry(row)
                    .or_default()
                    .push(PendingCorrection::multiply_cell(row, col, r.ratio));
            }
            if volume_on {
                volume
                    .entry(row)
                    .or_default()
                    .push(PendingCorrection::multiply_cell(row, col, 1.0 / r.ratio));
            }
        }

        // Pass 2: mergers then dividends. Price only.
        for r in &others {
            let Some((row, col)) = locate(r, axes, &mut dates, &assets, &mut dropped)? else {
                continue;
            };
            price
                .entry(row)
                .or_default()
                .push(PendingCorrection::multiply_cell(row, col, r.ratio));
        }

        info!(
            scope = flags.scope.as_str(),
            splits = splits.len(),
            mergers_dividends = others.len(),
            price_rows = price.len(),
            volume_rows = volume.len(),
            dropped_before_start = dropped.before_start,
            dropped_after_last_session = dropped.after_last_session,
            "adjustments/load"
        );

        Ok(LoadedAdjustments {
            price: price_on.then_some(price),
            volume: volume_on.then_some(volume),
        })
    }

    /// Resolve sids, keep the ones on the axis, fetch their rows.
    fn fetch_category(
        &self,
        category: AdjustmentCategory,
        axes: &RequestAxes,
        assets: &AssetIndexer,
    ) -> Result<Vec<RawAdjustmentRecord>, AdjustmentError> {
        let (start, end) = (axes.start_date(), axes.end_date());
        let with_rows = SidResolver::new(self.store).resolve(category, start, end)?;

        // BTreeSet order: ascending sids, so chunk concatenation stays globally ordered.
        let candidates: Vec<Sid> = with_rows
            .into_iter()
            .filter(|&sid| assets.contains(sid))
            .collect();

        let rows = ChunkedAdjustmentFetcher::new(self.store).fetch(category, &candidates, start, end)?;
        Ok(rows)
    }
}

/// `(row, column)` for a record, or `None` when it falls outside the request.
fn locate(
    r: &RawAdjustmentRecord,
    axes: &RequestAxes,
    dates: &mut DateIndexer<'_>,
    assets: &AssetIndexer,
    dropped: &mut DropCounts,
) -> Result<Option<(usize, usize)>, AdjustmentError> {
    if r.effective_date < axes.start_date() {
        dropped.before_start += 1;
        debug!(sid = r.sid, effective_date = r.effective_date, "adjustments/drop_before_start");
        return Ok(None);
    }
    let row = dates.row_for(r.effective_date);
    if row >= axes.num_dates() {
        dropped.after_last_session += 1;
        debug!(sid = r.sid, effective_date = r.effective_date, "adjustments/drop_after_last_session");
        return Ok(None);
    }
    let col = assets.column_for(r.sid)?;
    Ok(Some((row, col)))
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Load price and/or volume schedules for `dates` x `assets`.
///
/// `dates` are epoch seconds (see [`RequestAxes::from_datetimes`] for converting
/// session instants). `adjustment_scope` is `"price"`, `"volume"` or `"all"`;
/// anything else fails before the store is touched.
pub fn load_adjustments<S: AdjustmentStore + ?Sized>(
    store: &S,
    dates: &[i64],
    assets: &[Sid],
    include_splits: bool,
    include_mergers: bool,
    include_dividends: bool,
    adjustment_scope: &str,
) -> Result<LoadedAdjustments, AdjustmentError> {
    let scope: AdjustmentScope = adjustment_scope.parse()?;
    let axes = RequestAxes::new(dates.to_vec(), assets.to_vec())?;
    let flags = LoadFlags {
        include_splits,
        include_mergers,
        include_dividends,
        scope,
    };
    AdjustmentAssembler::new(store).assemble(&axes, &flags)
}
