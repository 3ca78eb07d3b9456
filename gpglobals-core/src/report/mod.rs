//! Backup report model.
//!
//! The report is written once at the end of a backup and read back at the
//! start of a restore. Restore only needs [`RestoreReportFields`], so the
//! decoder recovers that subset and nothing else.

mod codec;
mod file;

pub use codec::{decode_report, encode_report, render_report};
pub use file::{load_report, save_report};

use serde::{Deserialize, Serialize};

/// Log prefix that precedes the message of a fatal error.
pub const CRITICAL_PREFIX: &str = "[CRITICAL]:-";

/// Outcome of a backup run as printed in the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BackupStatus {
    /// No error was recorded
    Success,
    /// An error was recorded and is printed below the status line
    Failure,
}

impl std::fmt::Display for BackupStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => write!(f, "Success"),
            Self::Failure => write!(f, "Failure"),
        }
    }
}

/// Summary of one backup run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupReport {
    /// Database that was backed up
    pub database_name: String,
    /// Greenplum version of the source cluster
    pub database_version: String,
    /// Version of the backup tool
    pub backup_version: String,
    /// Backup category, e.g. `Unfiltered Full Backup`
    pub backup_type: String,
    database_size: String,
    error_message: Option<String>,
}

impl BackupReport {
    /// Starts a report for a successful run with no size recorded yet.
    pub fn new(
        database_name: impl Into<String>,
        database_version: impl Into<String>,
        backup_version: impl Into<String>,
        backup_type: impl Into<String>,
    ) -> Self {
        Self {
            database_name: database_name.into(),
            database_version: database_version.into(),
            backup_version: backup_version.into(),
            backup_type: backup_type.into(),
            database_size: String::new(),
            error_message: None,
        }
    }

    /// Records the estimated on-disk size, already formatted for display.
    pub fn set_database_size(&mut self, size: impl Into<String>) {
        self.database_size = size.into();
    }

    /// Marks the run as failed. An empty message leaves the report untouched.
    pub fn record_error(&mut self, message: impl Into<String>) {
        let message = message.into();
        if !message.is_empty() {
            self.error_message = Some(message);
        }
    }

    /// Estimated size, empty until set.
    pub fn database_size(&self) -> &str {
        &self.database_size
    }

    /// Recorded error, if the run failed.
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// `Failure` once an error has been recorded, else `Success`.
    pub fn status(&self) -> BackupStatus {
        if self.error_message.is_some() {
            BackupStatus::Failure
        } else {
            BackupStatus::Success
        }
    }

    /// The fields a restore reads back from this report.
    pub fn restore_fields(&self) -> RestoreReportFields {
        RestoreReportFields {
            database_name: self.database_name.clone(),
            database_version: self.database_version.clone(),
            backup_version: self.backup_version.clone(),
            backup_type: self.backup_type.clone(),
        }
    }
}

/// The subset of a report recovered by [`decode_report`].
///
/// Fields that were not found in the input stay empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestoreReportFields {
    /// `Database Name` line
    pub database_name: String,
    /// `GPDB Version` line
    pub database_version: String,
    /// `gpbackup Version` line
    pub backup_version: String,
    /// `Backup Type` line
    pub backup_type: String,
}

/// Splits a fatal log line into the message shown to the user and an exit
/// code.
///
/// Returns `("", 0)` when there is no error. Text after the `[CRITICAL]:-`
/// prefix is the message; a line without the prefix is used whole.
pub fn extract_error_message(raw: Option<&str>) -> (String, i32) {
    match raw {
        None => (String::new(), 0),
        Some(raw) => {
            let message = raw
                .find(CRITICAL_PREFIX)
                .map_or(raw, |index| &raw[index + CRITICAL_PREFIX.len()..]);
            (message.to_string(), 1)
        }
    }
}
