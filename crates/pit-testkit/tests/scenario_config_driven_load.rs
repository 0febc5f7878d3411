//! Config file to loaded window.
//!
//! GREEN when:
//! - A layered config naming a seeded store passes the unused-key guard under `Fail`.
//! - Typed settings drive the load (scope, category flags, parameter budget).
//! - The configured window length is what the window uses.

use ndarray::Array2;
use pit_config::{load_layered_yaml_from_strings, report_unused_keys, LoaderSettings, UnusedKeyPolicy};
use pit_testkit::{daily_axes, init_tracing, load_from_settings, price_window, Seed, SeededDb, DAY};

#[test]
fn layered_config_drives_load_and_window() {
    init_tracing();
    let db = SeededDb::create(
        &Seed::new()
            .split(5, 2.0, DAY)
            .merger(5, 0.25, DAY)
            .dividend(6, 0.5, 2 * DAY),
    )
    .unwrap();

    let base = format!(
        "store:\n  path: \"{}\"\n  max_bound_params: 3\nadjustments:\n  scope: \"all\"\n",
        db.path().display()
    );
    let overlay = "adjustments:\n  include_mergers: false\nwindow:\n  length: 3\n";
    let loaded_cfg = load_layered_yaml_from_strings(&[base.as_str(), overlay]).unwrap();
    report_unused_keys(&loaded_cfg.config_json, UnusedKeyPolicy::Fail).unwrap();

    let settings = LoaderSettings::from_config_json(&loaded_cfg.config_json).unwrap();
    let axes = daily_axes(4, &[5, 6]).unwrap();
    let loaded = load_from_settings(&settings, &axes).unwrap();

    let price = loaded.price.as_ref().unwrap();
    let values: Vec<_> = price.values().flatten().map(|c| c.value()).collect();
    assert_eq!(values, vec![Some(2.0), Some(0.5)], "merger excluded by overlay");
    assert_eq!(loaded.volume.as_ref().unwrap().len(), 1);

    let length = settings.window_length.unwrap();
    let mut w = price_window(Array2::from_elem((4, 2), 1.0), &loaded, length).unwrap();
    let view = w.advance_to(3).unwrap();
    assert_eq!(view.nrows(), 3);
    assert_eq!(view[[1, 0]], 2.0);
    assert_eq!(view[[2, 1]], 0.5);
}
