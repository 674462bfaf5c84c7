// Persistence and query contract tests against the public API surface.
use std::fs;

use pointbase::api::{Backup, Criteria, SaveOptions, Store, Style, filter, filter_indexed};
use pointbase::propnames;
use serde_json::json;

fn record(value: serde_json::Value) -> pointbase::api::Record {
    match value {
        serde_json::Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

#[test]
fn round_trip_preserves_values_and_key_order() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("results.json");

    let mut store = Store::open(&path).expect("open");
    store.append(record(json!({
        (propnames::CONFIGURATION): "ts1",
        (propnames::METHOD): "b3lyp",
        (propnames::COORDINATES): [["O", 0.0, 0.0, 0.0], ["H", 0.0, 0.0, 0.96]],
        (propnames::ELECTRON_ENERGY): -152.133,
        "notes": {"basis": "6-31g*", "converged": true, "warnings": null},
    })));
    store.append(record(json!({
        (propnames::CONFIGURATION): "reactant",
        (propnames::ELECTRON_ENERGY): -152.2,
    })));
    store.save(&SaveOptions::new().no_backup()).expect("save");

    let reopened = Store::open(&path).expect("reopen");
    assert_eq!(reopened.records(), store.records());

    let keys: Vec<_> = reopened.records()[0].keys().cloned().collect();
    assert_eq!(
        keys,
        [
            propnames::CONFIGURATION,
            propnames::METHOD,
            propnames::COORDINATES,
            propnames::ELECTRON_ENERGY,
            "notes",
        ]
    );
}

#[test]
fn style_controls_the_on_disk_indentation() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("results.json");

    let mut store = Store::open_with_style(&path, Style::new().with_indent(2)).expect("open");
    store.append(record(json!({"x": 1})));
    store.save(&SaveOptions::new().no_backup()).expect("save");

    let text = fs::read_to_string(&path).expect("read");
    // Two levels deep at two spaces per level.
    assert!(text.contains("\n    \"x\""));
    assert!(!text.contains("\n        \"x\""));
}

#[test]
fn the_filter_primitive_works_on_caller_owned_subsets() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("results.json");

    let mut store = Store::open(&path).expect("open");
    for (configuration, method) in [("r", "b3lyp"), ("ts", "b3lyp"), ("p", "mp2")] {
        store.append(record(json!({
            (propnames::CONFIGURATION): configuration,
            (propnames::METHOD): method,
        })));
    }

    // Narrow once through the store, then refine the subset without
    // rescanning the store itself.
    let subset: Vec<_> = store
        .filter(&Criteria::new().equals(propnames::METHOD, "b3lyp"))
        .into_iter()
        .cloned()
        .collect();
    assert_eq!(subset.len(), 2);

    let refined = filter(&subset, &Criteria::new().equals(propnames::CONFIGURATION, "ts"));
    assert_eq!(refined.len(), 1);

    // Indices are relative to the subset, not the original store.
    let indexed = filter_indexed(&subset, &Criteria::new().equals(propnames::CONFIGURATION, "ts"));
    assert_eq!(indexed[0].0, 1);
    assert_eq!(store.filter_indexed(&Criteria::new().equals(propnames::CONFIGURATION, "ts"))[0].0, 1);
}

#[test]
fn backup_policies_cover_the_fresh_file_case() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("fresh.json");

    let mut store = Store::open(&path).expect("open");
    store.append(record(json!({"x": 1})));

    // Default policy refuses to save when the backup source is missing.
    assert!(store.save(&SaveOptions::new()).is_err());

    // The opt-in policy skips the backup instead.
    store
        .save(&SaveOptions::new().backup(Backup::IfPresent(".bak".into())))
        .expect("save");
    assert!(path.exists());

    // Now that the file exists, the same policy takes the backup.
    store
        .save(&SaveOptions::new().backup(Backup::IfPresent(".bak".into())))
        .expect("save again");
    assert!(dir.path().join("fresh.json.bak").exists());
}
