//! Report file persistence.

use super::{BackupReport, RestoreReportFields, codec};
use crate::config::RunContext;
use crate::{Result, error::GlobalsError};
use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;

/// Writes the report for `run` to `path`, replacing any existing file.
///
/// # Errors
/// Returns `GlobalsError::Io` when the file cannot be written.
pub async fn save_report(
    path: &Path,
    report: &BackupReport,
    run: &RunContext,
    object_counts: &HashMap<String, usize>,
) -> Result<()> {
    let mut buffer = Vec::new();
    codec::encode_report(&mut buffer, report, run, object_counts)?;

    tokio::fs::write(path, buffer).await.map_err(|e| {
        GlobalsError::io(
            format!("Failed to write backup report {}", path.display()),
            e,
        )
    })
}

/// Reads the restore fields from the report file at `path`.
///
/// # Errors
/// Returns `GlobalsError::Io` only when the file cannot be read. Its content
/// is never rejected.
pub async fn load_report(path: &Path) -> Result<RestoreReportFields> {
    let contents = tokio::fs::read(path).await.map_err(|e| {
        GlobalsError::io(
            format!("Failed to read backup report {}", path.display()),
            e,
        )
    })?;

    let fields = codec::decode_report(Cursor::new(contents));
    tracing::debug!(
        "Read backup report {}: database '{}', type '{}'",
        path.display(),
        fields.database_name,
        fields.backup_type
    );
    Ok(fields)
}
