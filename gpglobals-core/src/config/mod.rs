//! Configuration and run context.
//!
//! - `ConnectionConfig`: coordinator connection settings
//! - `RunContext`: timestamp key and command line of a backup run
//! - `BackupOptions`: verbosity and output directory
//! - `BackupContext`: the above plus the connection, built once per run
//!
//! # Security
//! These structs intentionally do NOT store passwords or credentials.

mod connection;
mod context;

pub use connection::{ConnectionConfig, DEFAULT_PORT};
pub use context::{
    BackupContext, BackupContextBuilder, BackupOptions, RunContext, TIMESTAMP_KEY_FORMAT,
    report_path_for,
};
