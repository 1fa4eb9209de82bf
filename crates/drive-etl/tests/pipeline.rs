//! End-to-end tests for complete update runs (settings -> load ->
//! calculate -> dedup -> export)

use chrono::{TimeZone, Utc};
use drive_etl::prelude::*;
use drive_etl::{Error, MIME_JSON};
use pretty_assertions::assert_eq;
use serde_json::json;

fn grid(rows: &[&[&str]]) -> Vec<Vec<String>> {
    rows.iter()
        .map(|r| r.iter().map(|c| c.to_string()).collect())
        .collect()
}

fn object_settings(doc: serde_json::Value) -> SettingsLocation {
    SettingsLocation::Object { object: doc }
}

/// Keep-last dedup over `[(1,x),(2,y),(1,z)]` keyed on column A keeps
/// `[(2,y),(1,z)]`, order preserved.
#[test]
fn test_keep_last_dedup_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let drive = MemoryDrive::new(dir.path());
    drive.add_spreadsheet(
        "src",
        vec![(
            "Data".to_string(),
            grid(&[&["A", "B"], &["1", "x"], &["2", "y"], &["1", "z"]]),
        )],
    );
    drive.add_file("tmpl", "Out.csv", b"A,B\n".to_vec());

    let workbooks = CsvWorkbook::new();
    let mut manager = DatasetManager::new(&drive, &workbooks);
    let outcomes = manager
        .run_update(&object_settings(json!({
            "datasets": [{
                "inputs": {"type": "list", "list": [{"key": "src"}]},
                "exports": [{
                    "columns": [
                        {"name": "A", "source": "A"},
                        {"name": "B", "source": "B"}
                    ],
                    "dedup_column": {"name": "key", "function": "identity", "input": "A"},
                    "excel": {"key": "tmpl", "sheet": 0}
                }]
            }]
        })))
        .unwrap();

    let outcome = &outcomes[0].exports[0];
    assert_eq!(
        outcome.table.rows_to_strings(),
        vec![vec!["2", "y"], vec!["1", "z"]]
    );

    let written = std::fs::read_to_string(outcome.path.as_ref().unwrap()).unwrap();
    let lines: Vec<&str> = written.lines().collect();
    assert_eq!(lines, vec!["A,B", "2,y", "1,z"]);
}

/// Empty inputs short-circuit to `(empty table, no path)` for every
/// declared export, never an error.
#[test]
fn test_empty_input_yields_empty_outcomes() {
    let dir = tempfile::tempdir().unwrap();
    let drive = MemoryDrive::new(dir.path());
    drive.add_spreadsheet("src", vec![("Data".to_string(), grid(&[&["A", "B"]]))]);

    let workbooks = CsvWorkbook::new();
    let mut manager = DatasetManager::new(&drive, &workbooks);
    let outcomes = manager
        .run_update(&object_settings(json!({
            "datasets": [{
                "inputs": {"type": "list", "list": [{"key": "src"}]},
                "exports": [
                    {"columns": [{"name": "A", "source": "A"}], "excel": {"key": "t1", "sheet": 0}},
                    {"columns": [{"name": "B", "source": "B"}], "excel": {"key": "t2", "sheet": 0}}
                ]
            }]
        })))
        .unwrap();

    let exports = &outcomes[0].exports;
    assert_eq!(exports.len(), 2);
    for outcome in exports {
        assert!(outcome.table.is_empty());
        assert!(outcome.path.is_none());
    }
}

/// Required-value violations are reported exhaustively, with original
/// sheet row numbers offset by the source's start row.
#[test]
fn test_validation_reports_every_offending_row() {
    let dir = tempfile::tempdir().unwrap();
    let drive = MemoryDrive::new(dir.path());
    drive.add_spreadsheet(
        "src",
        vec![(
            "Data".to_string(),
            grid(&[&["STATUS"], &["ok"], &["bad1"], &["bad2"], &["ok"]]),
        )],
    );

    let workbooks = CsvWorkbook::new();
    let mut manager = DatasetManager::new(&drive, &workbooks);
    let err = manager
        .run_update(&object_settings(json!({
            "datasets": [{
                "inputs": {"type": "list", "list": [{"key": "src"}]},
                "calculations": [{
                    "name": "CHECKED",
                    "function": "identity",
                    "input": "STATUS",
                    "required_values": ["ok"]
                }],
                "exports": []
            }]
        })))
        .unwrap_err();

    match err {
        Error::Validation(violations) => {
            assert_eq!(violations.len(), 1);
            assert_eq!(violations[0].calculation, "CHECKED");
            // Data rows start at grid row 1, so sheet rows are 1-based + 1
            assert_eq!(violations[0].rows, vec![3, 4]);
        }
        other => panic!("expected validation error, got {:?}", other),
    }
}

/// Rows surviving deduplication append to the reference sheet; rows the
/// reference already knows do not.
#[test]
fn test_reference_sheet_receives_survivors_only() {
    let dir = tempfile::tempdir().unwrap();
    let drive = MemoryDrive::new(dir.path());
    drive.add_spreadsheet(
        "src",
        vec![(
            "Data".to_string(),
            grid(&[&["UPC", "TITLE"], &["1", "Known"], &["2", "Fresh"], &["2", "Fresher"]]),
        )],
    );
    drive.add_spreadsheet(
        "master",
        vec![(
            "Master".to_string(),
            grid(&[&["UPC", "TITLE"], &["1", "Known"]]),
        )],
    );
    drive.add_file("tmpl", "Report.csv", b"UPC,TITLE\n".to_vec());

    let workbooks = CsvWorkbook::new();
    let mut manager = DatasetManager::new(&drive, &workbooks);
    let outcomes = manager
        .run_update(&object_settings(json!({
            "datasets": [{
                "inputs": {"type": "list", "list": [{"key": "src"}]},
                "exports": [{
                    "columns": [
                        {"name": "UPC", "source": "UPC"},
                        {"name": "TITLE", "source": "TITLE"}
                    ],
                    "dedup_column": {"name": "key", "function": "identity", "input": "UPC"},
                    "reference_dataset": {"key": "master"},
                    "excel": {"key": "tmpl", "sheet": 0}
                }]
            }]
        })))
        .unwrap();

    // Keep-last resolved the internal duplicate in favor of "Fresher"
    let outcome = &outcomes[0].exports[0];
    assert_eq!(
        outcome.table.rows_to_strings(),
        vec![vec!["2", "Fresher"]]
    );

    let master = drive.sheet_rows("master", &SheetRef::Index(0)).unwrap();
    assert_eq!(master.len(), 3);
    assert_eq!(master[2], vec!["2".to_string(), "Fresher".to_string()]);
}

/// Settings resolve from the most recently modified JSON file in a folder.
#[test]
fn test_settings_from_folder_picks_newest() {
    let dir = tempfile::tempdir().unwrap();
    let drive = MemoryDrive::new(dir.path());
    drive.add_file("stale", "stale.json", br#"{"datasets": [{}]}"#.to_vec());
    drive.add_file("fresh", "fresh.json", br#"{"datasets": []}"#.to_vec());
    drive.place_in_folder(
        "conf",
        "stale",
        "stale.json",
        MIME_JSON,
        Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap(),
    );
    drive.place_in_folder(
        "conf",
        "fresh",
        "fresh.json",
        MIME_JSON,
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
    );

    let workbooks = CsvWorkbook::new();
    let mut manager = DatasetManager::new(&drive, &workbooks);
    // The stale document would fail to parse; resolving the fresh one
    // proves the newest file won.
    let outcomes = manager
        .run_update(&SettingsLocation::Folder {
            key: "conf".to_string(),
        })
        .unwrap();
    assert!(outcomes.is_empty());
}

/// A dataset-level function manifest can alias builtins with bound
/// arguments and drive calculations.
#[test]
fn test_manifest_functions_drive_calculations() {
    let dir = tempfile::tempdir().unwrap();
    let drive = MemoryDrive::new(dir.path());
    drive.add_spreadsheet(
        "src",
        vec![("Data".to_string(), grid(&[&["CODE"], &["7"], &["42"]]))],
    );
    drive.add_file("tmpl", "Out.csv", b"PADDED\n".to_vec());

    let workbooks = CsvWorkbook::new();
    let mut manager = DatasetManager::new(&drive, &workbooks);
    let outcomes = manager
        .run_update(&object_settings(json!({
            "functions": {"type": "object", "object": {
                "functions": {
                    "pad5": {"function": "zfill", "args": [5]}
                }
            }},
            "datasets": [{
                "inputs": {"type": "list", "list": [{"key": "src"}]},
                "calculations": [{"name": "PADDED", "function": "pad5", "input": "CODE"}],
                "exports": [{
                    "columns": [{"name": "PADDED", "source": "PADDED"}],
                    "excel": {"key": "tmpl", "sheet": 0}
                }]
            }]
        })))
        .unwrap();

    let outcome = &outcomes[0].exports[0];
    assert_eq!(
        outcome.table.rows_to_strings(),
        vec![vec!["00007"], vec!["00042"]]
    );
}

/// Two sources with annotated headers line up on normalized column names;
/// rows missing a column carry nulls that render empty in the export.
#[test]
fn test_header_normalization_aligns_sources() {
    let dir = tempfile::tempdir().unwrap();
    let drive = MemoryDrive::new(dir.path());
    drive.add_spreadsheet(
        "a",
        vec![(
            "S".to_string(),
            grid(&[&["Name (old)\n?", "UPC"], &["alpha", "1"]]),
        )],
    );
    drive.add_spreadsheet(
        "b",
        vec![("S".to_string(), grid(&[&["NAME"], &["beta"]]))],
    );
    drive.add_file("tmpl", "Out.csv", b"NAME,UPC\n".to_vec());

    let workbooks = CsvWorkbook::new();
    let mut manager = DatasetManager::new(&drive, &workbooks);
    let outcomes = manager
        .run_update(&object_settings(json!({
            "datasets": [{
                "inputs": {"type": "list", "list": [{"key": "a"}, {"key": "b"}]},
                "exports": [{
                    "columns": [
                        {"name": "NAME", "source": "NAME"},
                        {"name": "UPC", "source": "UPC"}
                    ],
                    "excel": {"key": "tmpl", "sheet": 0}
                }]
            }]
        })))
        .unwrap();

    let outcome = &outcomes[0].exports[0];
    assert_eq!(
        outcome.table.rows_to_strings(),
        vec![vec!["alpha", "1"], vec!["beta", ""]]
    );
}
