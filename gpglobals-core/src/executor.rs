//! Query execution seam between the collectors and a live cluster.
//!
//! Collectors never talk to sqlx directly. They build a [`CatalogQuery`],
//! hand it to a [`QueryExecutor`], and map the returned rows into records
//! with [`get`] or [`select`]. Rows travel as JSON objects keyed by column
//! name, which lets tests serve canned catalog rows without a database.

use crate::version::GpVersion;
use crate::{Result, error::GlobalsError};
use async_trait::async_trait;
use serde::de::DeserializeOwned;

/// One result row, keyed by column name.
pub type CatalogRow = serde_json::Map<String, serde_json::Value>;

/// SQL text plus its bound text parameters.
///
/// Parameters are always bound (`$1`, `$2`, ...) and never interpolated into
/// the SQL, so database names with quotes cannot change the query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogQuery {
    context: &'static str,
    sql: String,
    params: Vec<String>,
}

impl CatalogQuery {
    /// Creates a query. `context` names the catalog read in error messages.
    pub fn new(context: &'static str, sql: impl Into<String>) -> Self {
        Self {
            context,
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    /// Binds the next positional text parameter.
    pub fn bind(mut self, value: impl Into<String>) -> Self {
        self.params.push(value.into());
        self
    }

    /// Name of the catalog read, used in logs and errors.
    pub fn context(&self) -> &'static str {
        self.context
    }

    /// Query text with positional placeholders.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Bound parameters in placeholder order.
    pub fn params(&self) -> &[String] {
        &self.params
    }
}

/// Executes catalog queries against one cluster session.
///
/// Implementations are not required to support concurrent calls on the same
/// handle; parallel collection needs one executor per caller.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Runs a query expected to return at most one row.
    ///
    /// # Errors
    /// Returns `GlobalsError::Collection` if the query fails to execute.
    async fn fetch_optional(&self, query: &CatalogQuery) -> Result<Option<CatalogRow>>;

    /// Runs a query returning zero or more rows, in server order.
    ///
    /// # Errors
    /// Returns `GlobalsError::Collection` if the query fails to execute.
    async fn fetch_all(&self, query: &CatalogQuery) -> Result<Vec<CatalogRow>>;

    /// Name of the database this session is connected to.
    fn database_name(&self) -> &str;

    /// Version of the connected cluster.
    fn version(&self) -> &GpVersion;
}

/// Maps exactly one row into `T`.
///
/// # Errors
/// Fails if the query fails, returns no rows, or the row does not decode.
pub async fn get<T, E>(executor: &E, query: &CatalogQuery) -> Result<T>
where
    T: DeserializeOwned,
    E: QueryExecutor + ?Sized,
{
    tracing::trace!("Executing {} query: {}", query.context(), query.sql());
    let row = executor
        .fetch_optional(query)
        .await?
        .ok_or_else(|| GlobalsError::missing_row(query.context()))?;
    decode_row(row, query.context())
}

/// Maps zero or more rows into `T`, preserving row order.
///
/// # Errors
/// Fails if the query fails or any row does not decode.
pub async fn select<T, E>(executor: &E, query: &CatalogQuery) -> Result<Vec<T>>
where
    T: DeserializeOwned,
    E: QueryExecutor + ?Sized,
{
    tracing::trace!("Executing {} query: {}", query.context(), query.sql());
    executor
        .fetch_all(query)
        .await?
        .into_iter()
        .map(|row| decode_row(row, query.context()))
        .collect()
}

/// Decodes a single row into a record.
pub fn decode_row<T: DeserializeOwned>(row: CatalogRow, context: &str) -> Result<T> {
    serde_json::from_value(serde_json::Value::Object(row))
        .map_err(|e| GlobalsError::row_decode(context, e))
}
