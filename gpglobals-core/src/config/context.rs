//! Run-scoped context shared by every step of a backup.
//!
//! A [`BackupContext`] is assembled once at startup through
//! [`BackupContextBuilder`] and only read afterwards. Components that need the
//! connection, the timestamp key or the run options receive the context by
//! reference instead of reaching for process-wide state.

use crate::collector;
use crate::executor::QueryExecutor;
use crate::models::GlobalMetadata;
use crate::report::{self, BackupReport};
use crate::{Result, error::GlobalsError};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Format of a backup timestamp key, e.g. `20240131235959`.
pub const TIMESTAMP_KEY_FORMAT: &str = "%Y%m%d%H%M%S";

/// Identity of one backup run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunContext {
    timestamp_key: String,
    command_line: Vec<String>,
}

impl RunContext {
    /// Creates a run context from an explicit timestamp key and argv.
    ///
    /// # Errors
    /// Returns `GlobalsError::Configuration` when the key is not a
    /// `YYYYMMDDHHMMSS` timestamp.
    pub fn new(timestamp_key: impl Into<String>, command_line: Vec<String>) -> Result<Self> {
        let timestamp_key = timestamp_key.into();
        NaiveDateTime::parse_from_str(&timestamp_key, TIMESTAMP_KEY_FORMAT).map_err(|e| {
            GlobalsError::configuration(format!(
                "Invalid timestamp key '{}': {}",
                timestamp_key, e
            ))
        })?;

        Ok(Self {
            timestamp_key,
            command_line,
        })
    }

    /// Context for the current process: local time now and its own argv.
    ///
    /// Arguments that are not valid Unicode are converted lossily.
    pub fn from_env() -> Self {
        Self {
            timestamp_key: chrono::Local::now().format(TIMESTAMP_KEY_FORMAT).to_string(),
            command_line: lossy_command_line(std::env::args_os()),
        }
    }

    /// Backup timestamp key, `YYYYMMDDHHMMSS`.
    pub fn timestamp_key(&self) -> &str {
        &self.timestamp_key
    }

    /// Process arguments, program name first.
    pub fn command_line(&self) -> &[String] {
        &self.command_line
    }

    /// The argv joined by single spaces, as printed in the report.
    pub fn command_line_string(&self) -> String {
        self.command_line.join(" ")
    }
}

fn lossy_command_line(args: impl IntoIterator<Item = OsString>) -> Vec<String> {
    args.into_iter()
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect()
}

/// Options that shape a backup run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackupOptions {
    /// Verbosity level (0=INFO, 1=DEBUG, 2+=TRACE)
    pub verbose: u8,
    /// Only log errors
    pub quiet: bool,
    /// Directory that receives the report file
    pub backup_dir: PathBuf,
}

impl Default for BackupOptions {
    fn default() -> Self {
        Self {
            verbose: 0,
            quiet: false,
            backup_dir: PathBuf::from("."),
        }
    }
}

impl BackupOptions {
    /// Path of the report file for a given run.
    pub fn report_path(&self, timestamp_key: &str) -> PathBuf {
        self.backup_dir
            .join(format!("gpbackup_{}_report", timestamp_key))
    }

    /// Installs the tracing subscriber for these verbosity settings.
    pub fn init_logging(&self) -> Result<()> {
        crate::logging::init_logging(self.verbose, self.quiet)
    }

    fn validate(&self) -> Result<()> {
        if self.backup_dir.as_os_str().is_empty() {
            return Err(GlobalsError::configuration("backup_dir cannot be empty"));
        }
        Ok(())
    }
}

/// Everything a backup run needs, fixed at composition time.
#[derive(Debug)]
pub struct BackupContext<E> {
    executor: E,
    run: RunContext,
    options: BackupOptions,
}

impl<E: QueryExecutor> BackupContext<E> {
    /// Starts building a context.
    pub fn builder() -> BackupContextBuilder<E> {
        BackupContextBuilder::default()
    }

    /// Connection used for every catalog query.
    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Identity of this run.
    pub fn run(&self) -> &RunContext {
        &self.run
    }

    /// Options this run was built with.
    pub fn options(&self) -> &BackupOptions {
        &self.options
    }

    /// Collects all global metadata through this context's connection.
    pub async fn collect_globals(&self) -> Result<GlobalMetadata> {
        collector::collect_globals(&self.executor).await
    }

    /// Starts a report for this run, pre-filled from the connected cluster.
    pub fn new_report(
        &self,
        backup_version: impl Into<String>,
        backup_type: impl Into<String>,
    ) -> BackupReport {
        BackupReport::new(
            self.executor.database_name(),
            self.executor.version().to_string(),
            backup_version,
            backup_type,
        )
    }

    /// Writes the report file into the backup directory and returns its path.
    pub async fn write_report(
        &self,
        report: &BackupReport,
        object_counts: &HashMap<String, usize>,
    ) -> Result<PathBuf> {
        let path = self.options.report_path(self.run.timestamp_key());
        report::save_report(&path, report, &self.run, object_counts).await?;
        tracing::info!("Wrote backup report to {}", path.display());
        Ok(path)
    }
}

/// Builder for [`BackupContext`]. Dependencies are injected here and nowhere
/// else.
#[derive(Debug)]
pub struct BackupContextBuilder<E> {
    executor: Option<E>,
    run: Option<RunContext>,
    options: BackupOptions,
}

impl<E> Default for BackupContextBuilder<E> {
    fn default() -> Self {
        Self {
            executor: None,
            run: None,
            options: BackupOptions::default(),
        }
    }
}

impl<E: QueryExecutor> BackupContextBuilder<E> {
    /// Sets the connection used for every catalog query.
    pub fn executor(mut self, executor: E) -> Self {
        self.executor = Some(executor);
        self
    }

    /// Sets the run identity; defaults to [`RunContext::from_env`].
    pub fn run_context(mut self, run: RunContext) -> Self {
        self.run = Some(run);
        self
    }

    /// Sets the run options; defaults to [`BackupOptions::default`].
    pub fn options(mut self, options: BackupOptions) -> Self {
        self.options = options;
        self
    }

    /// Finishes the context.
    ///
    /// # Errors
    /// Fails when no executor was supplied or the options are invalid.
    pub fn build(self) -> Result<BackupContext<E>> {
        let executor = self
            .executor
            .ok_or_else(|| GlobalsError::configuration("a query executor is required"))?;
        self.options.validate()?;

        Ok(BackupContext {
            executor,
            run: self.run.unwrap_or_else(RunContext::from_env),
            options: self.options,
        })
    }
}

/// Resolves the report file that belongs to a backup, for restore.
pub fn report_path_for(backup_dir: &Path, timestamp_key: &str) -> PathBuf {
    BackupOptions {
        backup_dir: backup_dir.to_path_buf(),
        ..Default::default()
    }
    .report_path(timestamp_key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_context_validates_timestamp_key() {
        let run = RunContext::new(
            "20240131235959",
            vec!["gpbackup".to_string(), "--dbname".to_string(), "prod".to_string()],
        )
        .unwrap();
        assert_eq!(run.timestamp_key(), "20240131235959");
        assert_eq!(run.command_line_string(), "gpbackup --dbname prod");

        assert!(RunContext::new("2024-01-31", Vec::new()).is_err());
        assert!(RunContext::new("20241332000000", Vec::new()).is_err());
    }

    #[test]
    fn test_run_context_from_env_has_valid_key() {
        let run = RunContext::from_env();
        assert_eq!(run.timestamp_key().len(), 14);
        assert!(RunContext::new(run.timestamp_key(), Vec::new()).is_ok());
        assert!(!run.command_line().is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_command_line_tolerates_non_unicode_args() {
        use std::os::unix::ffi::OsStringExt;

        let args = vec![
            OsString::from("gpbackup"),
            OsString::from("--dbname"),
            OsString::from_vec(b"pr\xFFod".to_vec()),
        ];
        let command_line = lossy_command_line(args);

        assert_eq!(command_line.len(), 3);
        assert_eq!(command_line[2], "pr\u{FFFD}od");
        let run = RunContext::new("20240131235959", command_line).unwrap();
        assert_eq!(run.command_line_string(), "gpbackup --dbname pr\u{FFFD}od");
    }

    #[test]
    fn test_report_path() {
        let options = BackupOptions {
            backup_dir: PathBuf::from("/data/backups"),
            ..Default::default()
        };
        assert_eq!(
            options.report_path("20240131235959"),
            PathBuf::from("/data/backups/gpbackup_20240131235959_report")
        );
        assert_eq!(
            report_path_for(Path::new("/data/backups"), "20240131235959"),
            options.report_path("20240131235959")
        );
    }

    #[test]
    fn test_backup_options_deserialize_with_defaults() {
        let options: BackupOptions = serde_json::from_str(r#"{"verbose": 2}"#).unwrap();
        assert_eq!(options.verbose, 2);
        assert!(!options.quiet);
        assert_eq!(options.backup_dir, PathBuf::from("."));
    }
}
