//! Live cluster connection backed by a sqlx PostgreSQL pool.
//!
//! A [`GpConnection`] wraps exactly one backend session. Collectors run
//! against it one at a time; callers that want to collect in parallel open
//! one connection each.

mod row;

use crate::config::ConnectionConfig;
use crate::executor::{CatalogQuery, CatalogRow, QueryExecutor};
use crate::version::GpVersion;
use crate::{Result, error::GlobalsError, error::redact_database_url};
use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::postgres::{PgArguments, Postgres};
use sqlx::query::Query;

/// Connection to a Greenplum coordinator.
pub struct GpConnection {
    pool: PgPool,
    config: ConnectionConfig,
    database_name: String,
    version: GpVersion,
}

impl std::fmt::Debug for GpConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GpConnection")
            .field("config", &self.config)
            .field("database_name", &self.database_name)
            .field("version", &self.version)
            .finish()
    }
}

impl GpConnection {
    /// Connects and detects the cluster version.
    ///
    /// # Errors
    /// Returns error if the URL is invalid, the server is unreachable, or the
    /// server does not identify itself as Greenplum.
    pub async fn connect(connection_string: &str) -> Result<Self> {
        let config = ConnectionConfig::from_url(connection_string)?;
        Self::with_config(connection_string, config).await
    }

    /// Connects with an explicit configuration and detects the cluster version.
    pub async fn with_config(connection_string: &str, config: ConnectionConfig) -> Result<Self> {
        config.validate()?;
        let pool = create_connection_pool(connection_string, &config)?;

        let server_version: String = sqlx::query_scalar("SELECT version()")
            .fetch_one(&pool)
            .await
            .map_err(|e| {
                GlobalsError::connection_failed(
                    format!(
                        "Failed to query server version from {}",
                        redact_database_url(connection_string)
                    ),
                    e,
                )
            })?;
        let version = GpVersion::from_server_version(&server_version)?;

        Self::finish(pool, config, version).await
    }

    /// Connects without version detection, trusting the supplied version.
    ///
    /// Catalog queries are shaped by `version`, so it must match the server.
    pub async fn with_version(
        connection_string: &str,
        config: ConnectionConfig,
        version: GpVersion,
    ) -> Result<Self> {
        config.validate()?;
        let pool = create_connection_pool(connection_string, &config)?;
        Self::finish(pool, config, version).await
    }

    async fn finish(pool: PgPool, config: ConnectionConfig, version: GpVersion) -> Result<Self> {
        let database_name: String = sqlx::query_scalar("SELECT current_database()::text")
            .fetch_one(&pool)
            .await
            .map_err(|e| {
                GlobalsError::connection_failed(
                    format!("Failed to resolve current database on {}", config),
                    e,
                )
            })?;

        tracing::info!(
            "Connected to database '{}' on Greenplum {} ({})",
            database_name,
            version,
            config
        );

        Ok(Self {
            pool,
            config,
            database_name,
            version,
        })
    }

    /// Connection settings (credentials excluded).
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Closes the underlying session.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl QueryExecutor for GpConnection {
    async fn fetch_optional(&self, query: &CatalogQuery) -> Result<Option<CatalogRow>> {
        let row = prepare(query)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| query_failed(query, e))?;
        row.map(|row| row::decode_pg_row(&row, query.context()))
            .transpose()
    }

    async fn fetch_all(&self, query: &CatalogQuery) -> Result<Vec<CatalogRow>> {
        let rows = prepare(query)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| query_failed(query, e))?;
        rows.iter()
            .map(|row| row::decode_pg_row(row, query.context()))
            .collect()
    }

    fn database_name(&self) -> &str {
        &self.database_name
    }

    fn version(&self) -> &GpVersion {
        &self.version
    }
}

fn prepare(query: &CatalogQuery) -> Query<'_, Postgres, PgArguments> {
    query
        .params()
        .iter()
        .fold(sqlx::query::<Postgres>(query.sql()), |prepared, param| {
            prepared.bind(param.as_str())
        })
}

fn query_failed(query: &CatalogQuery, error: sqlx::Error) -> GlobalsError {
    tracing::error!("Failed to query {}: {}", query.context(), error);
    GlobalsError::collection_failed(format!("Failed to query {}", query.context()), error)
}

/// Creates a single-session pool with the session settings applied on connect.
///
/// - Max connections: 1, so every query of a handle shares one session
/// - Acquire timeout: `connect_timeout`
/// - Session settings: statement timeout, application name, read-only
fn create_connection_pool(connection_string: &str, config: &ConnectionConfig) -> Result<PgPool> {
    use sqlx::Executor;

    let query_timeout_ms = config.query_timeout.as_millis();
    let read_only = config.read_only;

    sqlx::postgres::PgPoolOptions::new()
        .max_connections(1)
        .min_connections(0)
        .acquire_timeout(config.connect_timeout)
        .test_before_acquire(true)
        .after_connect(move |conn, _meta| {
            Box::pin(async move {
                conn.execute(format!("SET statement_timeout = {}", query_timeout_ms).as_str())
                    .await?;

                let app_name = format!("gpglobals-{}", env!("CARGO_PKG_VERSION"));
                conn.execute(format!("SET application_name = '{}'", app_name).as_str())
                    .await?;

                if read_only {
                    conn.execute("SET default_transaction_read_only = on")
                        .await?;
                }

                Ok(())
            })
        })
        .connect_lazy(connection_string)
        .map_err(|e| {
            GlobalsError::connection_failed(
                format!(
                    "Failed to create connection pool to {}",
                    redact_database_url(connection_string)
                ),
                e,
            )
        })
}
