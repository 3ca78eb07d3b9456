//! Text encoding of the backup report.

use super::{BackupReport, RestoreReportFields};
use crate::config::RunContext;
use crate::{Result, error::GlobalsError};
use std::collections::HashMap;
use std::io::{BufRead, Write};

const HEADER: &str = "Greenplum Database Backup Report";
const LABEL_TIMESTAMP_KEY: &str = "Timestamp Key";
const LABEL_DATABASE_VERSION: &str = "GPDB Version";
const LABEL_BACKUP_VERSION: &str = "gpbackup Version";
const LABEL_DATABASE_NAME: &str = "Database Name";
const LABEL_COMMAND_LINE: &str = "Command Line";
const LABEL_BACKUP_TYPE: &str = "Backup Type";
const LABEL_BACKUP_STATUS: &str = "Backup Status";
const LABEL_BACKUP_ERROR: &str = "Backup Error";
const LABEL_DATABASE_SIZE: &str = "Database Size";
const COUNTS_HEADER: &str = "Count of Database Objects in Backup:";
const COUNT_NAME_WIDTH: usize = 25;

/// Report text borrowed from its parts, rendered through `Display`.
struct ReportText<'a> {
    report: &'a BackupReport,
    run: &'a RunContext,
    object_counts: &'a HashMap<String, usize>,
}

impl std::fmt::Display for ReportText<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (report, run) = (self.report, self.run);

        writeln!(f, "{}", HEADER)?;
        writeln!(f)?;
        writeln!(f, "{}: {}", LABEL_TIMESTAMP_KEY, run.timestamp_key())?;
        writeln!(f, "{}: {}", LABEL_DATABASE_VERSION, report.database_version)?;
        writeln!(f, "{}: {}", LABEL_BACKUP_VERSION, report.backup_version)?;
        writeln!(f)?;
        writeln!(f, "{}: {}", LABEL_DATABASE_NAME, report.database_name)?;
        writeln!(f, "{}: {}", LABEL_COMMAND_LINE, run.command_line_string())?;
        writeln!(f, "{}: {}", LABEL_BACKUP_TYPE, report.backup_type)?;
        writeln!(f, "{}: {}", LABEL_BACKUP_STATUS, report.status())?;
        if let Some(message) = report.error_message() {
            writeln!(f, "{}: {}", LABEL_BACKUP_ERROR, message)?;
        }
        writeln!(f, "{}: {}", LABEL_DATABASE_SIZE, report.database_size())?;
        writeln!(f)?;
        writeln!(f, "{}", COUNTS_HEADER)?;

        let mut counts: Vec<(&String, &usize)> = self.object_counts.iter().collect();
        counts.sort_unstable_by(|a, b| a.0.cmp(b.0));
        for (name, count) in counts {
            writeln!(f, "{:<width$}\t{}", name, count, width = COUNT_NAME_WIDTH)?;
        }
        Ok(())
    }
}

/// Writes the report text.
///
/// Object counts are listed in name order whatever the map's iteration order.
///
/// # Errors
/// Returns `GlobalsError::Io` when the writer fails.
pub fn encode_report<W: Write>(
    writer: &mut W,
    report: &BackupReport,
    run: &RunContext,
    object_counts: &HashMap<String, usize>,
) -> Result<()> {
    let text = ReportText {
        report,
        run,
        object_counts,
    };
    write!(writer, "{}", text)
        .and_then(|()| writer.flush())
        .map_err(|e| GlobalsError::io("Failed to write backup report", e))
}

/// Renders the report text into a string.
pub fn render_report(
    report: &BackupReport,
    run: &RunContext,
    object_counts: &HashMap<String, usize>,
) -> String {
    ReportText {
        report,
        run,
        object_counts,
    }
    .to_string()
}

/// Recovers the restore fields from report text.
///
/// Scanning stops at the backup type line; everything after it is ignored.
/// Malformed or truncated input never fails: missing fields stay empty,
/// invalid UTF-8 is replaced lossily, and a read error ends the scan with
/// whatever was found so far.
pub fn decode_report<R: BufRead>(mut reader: R) -> RestoreReportFields {
    let mut fields = RestoreReportFields::default();
    let mut buffer = Vec::new();

    loop {
        buffer.clear();
        match reader.read_until(b'\n', &mut buffer) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::debug!("Stopped reading backup report: {}", e);
                break;
            }
        }

        let line = String::from_utf8_lossy(&buffer);
        let line = line.trim_end_matches(['\r', '\n']);
        let Some((label, value)) = line.split_once(": ") else {
            continue;
        };

        match label {
            LABEL_DATABASE_VERSION => fields.database_version = value.to_string(),
            LABEL_BACKUP_VERSION => fields.backup_version = value.to_string(),
            LABEL_DATABASE_NAME => fields.database_name = value.to_string(),
            LABEL_BACKUP_TYPE => {
                fields.backup_type = value.to_string();
                break;
            }
            _ => {}
        }
    }

    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn run_context() -> RunContext {
        RunContext::new(
            "20240131235959",
            vec![
                "gpbackup".to_string(),
                "--dbname".to_string(),
                "prod".to_string(),
            ],
        )
        .unwrap()
    }

    fn counts() -> HashMap<String, usize> {
        HashMap::from([
            ("views".to_string(), 3),
            ("tables".to_string(), 42),
            ("sequences".to_string(), 7),
        ])
    }

    #[test]
    fn test_encode_success_report() {
        let mut report = BackupReport::new("prod", "6.20.0", "1.30.0", "Unfiltered Full Backup");
        report.set_database_size("1234 MB");

        let text = render_report(&report, &run_context(), &counts());
        let expected = "Greenplum Database Backup Report

Timestamp Key: 20240131235959
GPDB Version: 6.20.0
gpbackup Version: 1.30.0

Database Name: prod
Command Line: gpbackup --dbname prod
Backup Type: Unfiltered Full Backup
Backup Status: Success
Database Size: 1234 MB

Count of Database Objects in Backup:
sequences                \t7
tables                   \t42
views                    \t3
";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_encode_failure_report() {
        let mut report = BackupReport::new("prod", "6.20.0", "1.30.0", "Full");
        report.set_database_size("1234 MB");
        report.record_error("disk full");

        let text = render_report(&report, &run_context(), &HashMap::new());
        assert!(
            text.contains("Backup Status: Failure\nBackup Error: disk full\nDatabase Size: 1234 MB\n")
        );
        assert!(text.ends_with("Count of Database Objects in Backup:\n"));
    }

    #[test]
    fn test_encode_orders_counts_by_name() {
        let report = BackupReport::new("prod", "6.20.0", "1.30.0", "Full");
        let text = render_report(&report, &run_context(), &counts());

        let sequences = text.find("sequences").unwrap();
        let tables = text.find("tables").unwrap();
        let views = text.find("views").unwrap();
        assert!(sequences < tables && tables < views);
    }

    #[test]
    fn test_encode_to_writer() {
        let report = BackupReport::new("prod", "6.20.0", "1.30.0", "Full");
        let mut buffer = Vec::new();
        encode_report(&mut buffer, &report, &run_context(), &counts()).unwrap();
        assert_eq!(
            String::from_utf8(buffer).unwrap(),
            render_report(&report, &run_context(), &counts())
        );
    }

    #[test]
    fn test_decode_recovers_restore_fields() {
        let mut report = BackupReport::new("prod", "6.20.0", "1.30.0", "Incremental");
        report.record_error("disk full");
        let text = render_report(&report, &run_context(), &counts());

        let fields = decode_report(Cursor::new(text));
        assert_eq!(fields, report.restore_fields());
    }

    #[test]
    fn test_decode_stops_at_backup_type() {
        let text = "Backup Type: Full\nDatabase Name: later\nGPDB Version: 9.9.9\n";
        let fields = decode_report(Cursor::new(text));

        assert_eq!(fields.backup_type, "Full");
        assert_eq!(fields.database_name, "");
        assert_eq!(fields.database_version, "");
    }

    #[test]
    fn test_decode_skips_invalid_utf8_lines() {
        let mut bytes = b"GPDB Version: 6.20.0\ngpbackup Version: 1.30.0\n\nDatabase Name: prod\n".to_vec();
        bytes.extend_from_slice(b"Command Line: gpbackup --dbname \xFF\xFE\n");
        bytes.extend_from_slice(b"Backup Type: Full\r\nBackup Status: Success\n");

        let fields = decode_report(Cursor::new(bytes));
        assert_eq!(
            fields,
            RestoreReportFields {
                database_name: "prod".to_string(),
                database_version: "6.20.0".to_string(),
                backup_version: "1.30.0".to_string(),
                backup_type: "Full".to_string(),
            }
        );
    }

    #[test]
    fn test_decode_tolerates_malformed_input() {
        let text = "garbage\nDatabase Name:\nGPDB Version: 6.20.0\nDatabase Name: a: b\n";
        let fields = decode_report(Cursor::new(text));

        assert_eq!(fields.database_version, "6.20.0");
        assert_eq!(fields.database_name, "a: b");
        assert_eq!(fields.backup_version, "");
        assert_eq!(fields.backup_type, "");

        assert_eq!(decode_report(Cursor::new("")), RestoreReportFields::default());
    }
}
