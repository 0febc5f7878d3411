//! Only records inside the request reach a schedule.
//!
//! GREEN when:
//! - Records effective before the first session are dropped (the baseline
//!   already reflects them).
//! - Records effective on or after the last session are dropped (their row
//!   would be past the end of the axis).
//! - Records for assets off the axis are never fetched.
//! - Columns follow the caller's asset order, not sid order.

use pit_adjustments::{AdjustmentAssembler, LoadFlags};
use pit_schemas::{AdjustmentScope, PendingCorrection, RequestAxes};
use pit_testkit::{daily_sessions, init_tracing, memory_store, Seed, DAY};

#[test]
fn request_bounds_filter_records() {
    init_tracing();
    let seed = Seed::new()
        .split(7, 2.0, 9 * DAY) // before the axis
        .split(7, 4.0, 11 * DAY) // row 2
        .split(7, 8.0, 13 * DAY) // last session: row would be 4 == len
        .split(9, 5.0, 11 * DAY) // not requested
        .dividend(3, 0.5, 10 * DAY); // row 1
    let store = memory_store(&seed).unwrap();

    // Sessions are days 10..=13; assets in caller order [7, 3].
    let axes = RequestAxes::new(daily_sessions(10, 4), vec![7, 3]).unwrap();
    let loaded = AdjustmentAssembler::new(&store)
        .assemble(&axes, &LoadFlags::all(AdjustmentScope::Price))
        .unwrap();

    let price = loaded.price.unwrap();
    assert_eq!(price.keys().copied().collect::<Vec<_>>(), vec![1, 2]);
    assert_eq!(price[&1], vec![PendingCorrection::multiply_cell(1, 1, 0.5)]);
    assert_eq!(price[&2], vec![PendingCorrection::multiply_cell(2, 0, 4.0)]);
    assert_eq!(loaded.volume, None);
}

#[test]
fn disjoint_ranges_partition_the_records() {
    init_tracing();
    let seed = Seed::new()
        .split(1, 2.0, DAY)
        .split(1, 3.0, 5 * DAY)
        .merger(1, 0.5, 6 * DAY);
    let store = memory_store(&seed).unwrap();
    let flags = LoadFlags::all(AdjustmentScope::Price);

    let early = RequestAxes::new(daily_sessions(0, 4), vec![1]).unwrap();
    let late = RequestAxes::new(daily_sessions(4, 4), vec![1]).unwrap();
    let a = AdjustmentAssembler::new(&store).assemble(&early, &flags).unwrap();
    let b = AdjustmentAssembler::new(&store).assemble(&late, &flags).unwrap();

    let early_values: Vec<_> = a.price.unwrap().values().flatten().map(|c| c.value()).collect();
    let late_values: Vec<_> = b.price.unwrap().values().flatten().map(|c| c.value()).collect();
    assert_eq!(early_values, vec![Some(2.0)]);
    assert_eq!(late_values, vec![Some(3.0), Some(0.5)]);
}
