//! Date -> row and asset -> column lookups for one load.
//!
//! Both indexers borrow the request axes and own their memo tables, so the
//! tables live exactly as long as the load that built them.

use std::collections::HashMap;

use pit_schemas::Sid;

use crate::error::AdjustmentError;

// ---------------------------------------------------------------------------
// DateIndexer
// ---------------------------------------------------------------------------

/// Maps an effective date (epoch seconds) to the row where it takes effect.
///
/// The row is the index of the first session strictly after the effective date
/// (right-side binary search), i.e. the number of sessions `<= effective_date`.
/// May equal `dates.len()` when the date is on or after the last session.
#[derive(Debug)]
pub struct DateIndexer<'a> {
    dates: &'a [i64],
    memo: HashMap<i64, usize>,
}

impl<'a> DateIndexer<'a> {
    /// `dates` must be strictly increasing.
    pub fn new(dates: &'a [i64]) -> Self {
        Self {
            dates,
            memo: HashMap::new(),
        }
    }

    pub fn row_for(&mut self, effective_date: i64) -> usize {
        let dates = self.dates;
        *self
            .memo
            .entry(effective_date)
            .or_insert_with(|| dates.partition_point(|&d| d <= effective_date))
    }

    /// Distinct effective dates looked up so far.
    pub fn memoized(&self) -> usize {
        self.memo.len()
    }
}

// ---------------------------------------------------------------------------
// AssetIndexer
// ---------------------------------------------------------------------------

/// Maps a sid to its column on the request's asset axis.
#[derive(Debug)]
pub struct AssetIndexer {
    columns: HashMap<Sid, usize>,
}

impl AssetIndexer {
    pub fn new(assets: &[Sid]) -> Self {
        let columns = assets
            .iter()
            .enumerate()
            .map(|(col, &sid)| (sid, col))
            .collect();
        Self { columns }
    }

    pub fn column_for(&self, sid: Sid) -> Result<usize, AdjustmentError> {
        self.columns
            .get(&sid)
            .copied()
            .ok_or(AdjustmentError::UnknownAsset { sid })
    }

    pub fn contains(&self, sid: Sid) -> bool {
        self.columns.contains_key(&sid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const DAY: i64 = 86_400;

    #[test]
    fn right_side_search_lands_after_effective_date() {
        let dates = [0, DAY, 2 * DAY, 3 * DAY];
        let mut ix = DateIndexer::new(&dates);

        assert_eq!(ix.row_for(-1), 0);
        assert_eq!(ix.row_for(0), 1);
        assert_eq!(ix.row_for(DAY), 2);
        assert_eq!(ix.row_for(DAY + 1), 2);
        assert_eq!(ix.row_for(3 * DAY), 4, "on the last session -> past the axis");
    }

    #[test]
    fn repeated_lookups_hit_the_memo() {
        let dates = [10, 20, 30];
        let mut ix = DateIndexer::new(&dates);
        let first = ix.row_for(20);
        let second = ix.row_for(20);
        assert_eq!(first, second);
        assert_eq!(ix.memoized(), 1);
        ix.row_for(25);
        assert_eq!(ix.memoized(), 2);
    }

    #[test]
    fn asset_columns_follow_axis_order() {
        let ix = AssetIndexer::new(&[101, 7, 55]);
        assert_eq!(ix.column_for(101).unwrap(), 0);
        assert_eq!(ix.column_for(7).unwrap(), 1);
        assert_eq!(ix.column_for(55).unwrap(), 2);
        assert!(ix.contains(7));
        assert!(matches!(
            ix.column_for(8),
            Err(AdjustmentError::UnknownAsset { sid: 8 })
        ));
    }

    proptest! {
        #[test]
        fn row_counts_sessions_at_or_before_date(
            raw in prop::collection::btree_set(-1_000i64..1_000, 1..30),
            probe in -1_100i64..1_100,
        ) {
            let dates: Vec<i64> = raw.into_iter().collect();
            let mut ix = DateIndexer::new(&dates);
            let expected = dates.iter().filter(|&&d| d <= probe).count();
            prop_assert_eq!(ix.row_for(probe), expected);
            prop_assert_eq!(ix.row_for(probe), expected);
        }
    }
}
