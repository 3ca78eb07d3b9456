//! Report file round trips and decoder robustness.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use gpglobals_core::config::{RunContext, report_path_for};
use gpglobals_core::report::{self, BackupReport, RestoreReportFields};
use proptest::prelude::*;
use std::collections::HashMap;
use std::io::Cursor;
use tempfile::TempDir;

fn run_context() -> RunContext {
    RunContext::new(
        "20240131235959",
        vec!["gpbackup".to_string(), "--dbname".to_string(), "prod".to_string()],
    )
    .unwrap()
}

#[tokio::test]
async fn test_save_and_load_report() {
    let temp_dir = TempDir::new().unwrap();
    let run = run_context();
    let path = report_path_for(temp_dir.path(), run.timestamp_key());

    let mut report = BackupReport::new("prod", "6.20.0", "1.30.0", "Unfiltered Full Backup");
    report.set_database_size("1234 MB");
    let counts = HashMap::from([("roles".to_string(), 4), ("tablespaces".to_string(), 1)]);

    report::save_report(&path, &report, &run, &counts).await.unwrap();

    let contents = std::fs::read_to_string(&path).unwrap();
    assert!(contents.starts_with("Greenplum Database Backup Report\n"));
    assert!(contents.contains("Command Line: gpbackup --dbname prod\n"));
    assert!(contents.contains("roles                    \t4\n"));

    let fields = report::load_report(&path).await.unwrap();
    assert_eq!(fields, report.restore_fields());
}

#[tokio::test]
async fn test_save_report_overwrites_existing_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("gpbackup_20240131235959_report");
    std::fs::write(&path, "stale contents that are much longer than a report header").unwrap();

    let report = BackupReport::new("prod", "7.1.0", "1.30.0", "Full");
    report::save_report(&path, &report, &run_context(), &HashMap::new())
        .await
        .unwrap();

    let contents = std::fs::read_to_string(&path).unwrap();
    assert!(!contents.contains("stale"));
}

#[tokio::test]
async fn test_load_missing_report_is_io_error() {
    let temp_dir = TempDir::new().unwrap();
    let result = report::load_report(&temp_dir.path().join("missing")).await;

    assert!(matches!(
        result,
        Err(gpglobals_core::GlobalsError::Io { .. })
    ));
}

#[tokio::test]
async fn test_save_into_missing_directory_is_io_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("no-such-dir").join("report");
    let report = BackupReport::new("prod", "7.1.0", "1.30.0", "Full");

    let error = report::save_report(&path, &report, &run_context(), &HashMap::new())
        .await
        .unwrap_err();
    assert!(error.to_string().contains("no-such-dir"));
}

#[tokio::test]
async fn test_load_truncated_report() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("report");
    std::fs::write(
        &path,
        "Greenplum Database Backup Report\n\nTimestamp Key: 20240131235959\nGPDB Version: 6.2",
    )
    .unwrap();

    let fields = report::load_report(&path).await.unwrap();
    assert_eq!(
        fields,
        RestoreReportFields {
            database_version: "6.2".to_string(),
            ..Default::default()
        }
    );
}

#[tokio::test]
async fn test_load_report_with_non_utf8_command_line() {
    let temp_dir = TempDir::new().unwrap();
    let run = run_context();
    let path = report_path_for(temp_dir.path(), run.timestamp_key());

    let report = BackupReport::new("prod", "6.20.0", "1.30.0", "Metadata Only");
    let text = report::render_report(&report, &run, &HashMap::new());
    let bytes = text
        .replace("Command Line: gpbackup --dbname prod", "Command Line: gpbackup --dbname \u{1}")
        .into_bytes()
        .into_iter()
        .map(|b| if b == 1 { 0xFF } else { b })
        .collect::<Vec<u8>>();
    std::fs::write(&path, bytes).unwrap();

    let fields = report::load_report(&path).await.unwrap();
    assert_eq!(fields, report.restore_fields());
}

proptest! {
    #[test]
    fn decode_never_panics(input in "\\PC*") {
        let _ = report::decode_report(Cursor::new(input));
    }

    #[test]
    fn decode_never_panics_on_raw_bytes(input in proptest::collection::vec(any::<u8>(), 0..512)) {
        let _ = report::decode_report(Cursor::new(input));
    }

    #[test]
    fn decode_recovers_encoded_fields(
        database_name in "[a-zA-Z_][a-zA-Z0-9_ :]{0,30}",
        database_version in "[0-9]{1,2}\\.[0-9]{1,2}\\.[0-9]{1,2}",
        backup_version in "[0-9]\\.[0-9]{1,2}\\.[0-9]",
        backup_type in "[A-Za-z ]{1,30}",
        error in proptest::option::of("[a-z ]{1,20}"),
        counts in proptest::collection::hash_map("[a-z ]{1,20}", 0usize..10_000, 0..8),
    ) {
        let mut report = BackupReport::new(
            database_name,
            database_version,
            backup_version,
            backup_type,
        );
        report.set_database_size("12 GB");
        if let Some(error) = error {
            report.record_error(error);
        }

        let text = report::render_report(&report, &run_context(), &counts);
        prop_assert_eq!(report::decode_report(Cursor::new(text)), report.restore_fields());
    }
}
