//! Global metadata collection and backup reports for Greenplum.
//!
//! This crate reads the cluster-wide objects a backup must carry alongside
//! the per-schema DDL (roles and their memberships, resource queues and
//! groups, tablespaces, database-level settings) and writes the text report
//! that summarizes a backup run. Restore reads part of that report back.
//!
//! # Security Guarantees
//! - No credentials stored or logged in any data structures
//! - Role password hashes are redacted from `Debug` output
//! - All catalog queries run in read-only sessions
//!
//! # Architecture
//! - [`executor::QueryExecutor`] abstracts the catalog connection; collectors
//!   only see name-keyed rows
//! - [`version::GpVersion`] decides which catalog shape a query targets
//! - [`config::BackupContext`] carries everything a run needs, built once
//!
//! # Example
//! ```rust,ignore
//! use gpglobals_core::{BackupContext, GpConnection, RunContext};
//!
//! let connection = GpConnection::connect("postgres://gpadmin@mdw:5432/prod").await?;
//! let context = BackupContext::builder()
//!     .executor(connection)
//!     .run_context(RunContext::from_env())
//!     .build()?;
//!
//! let globals = context.collect_globals().await?;
//! let mut report = context.new_report("1.30.0", "Unfiltered Full Backup");
//! report.set_database_size("1234 MB");
//! context.write_report(&report, &globals.object_counts()).await?;
//! ```

pub mod collector;
pub mod config;
#[cfg(feature = "postgresql")]
pub mod connection;
pub mod enrichment;
pub mod error;
pub mod executor;
pub mod logging;
pub mod models;
pub mod report;
pub mod version;

// Re-export commonly used types
pub use collector::collect_globals;
pub use config::{BackupContext, BackupContextBuilder, BackupOptions, ConnectionConfig, RunContext};
#[cfg(feature = "postgresql")]
pub use connection::GpConnection;
pub use error::{GlobalsError, Result};
pub use executor::{CatalogQuery, CatalogRow, QueryExecutor};
pub use models::{
    DatabaseIdentity, GlobalMetadata, Oid, ResourceGroup, ResourceQueue, Role, RoleMember,
    SessionSettings, Tablespace, TimeConstraint,
};
pub use report::{
    BackupReport, BackupStatus, RestoreReportFields, decode_report, encode_report,
    extract_error_message,
};
pub use version::GpVersion;
