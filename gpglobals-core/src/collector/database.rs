//! Session settings, database identity, and database-level configuration.

use crate::executor::{self, CatalogQuery, CatalogRow, QueryExecutor};
use crate::models::{DatabaseIdentity, SessionSettings};
use crate::version::{GatedFragment, render_fragments};
use crate::{Result, error::GlobalsError};
use serde::Deserialize;

/// List-typed settings whose values must be replayed verbatim. Quoting them
/// would turn `public, pg_catalog` into a single schema name.
const UNQUOTED_SETTINGS: [&str; 2] = ["search_path", "DateStyle"];

/// Where database-level settings live, by catalog version.
const DATABASE_CONFIG_SOURCE: &[GatedFragment] = &[
    GatedFragment::before(
        "6",
        "(SELECT datconfig FROM pg_database WHERE datname = $1)",
    ),
    GatedFragment::at_least(
        "6",
        "(SELECT setconfig FROM pg_db_role_setting WHERE setrole = 0 AND setdatabase = (SELECT oid FROM pg_database WHERE datname = $1))",
    ),
];

/// One `name=value` entry of a database's stored configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ConfigOption {
    /// Setting name
    pub option_name: String,
    /// Raw stored value
    pub option_value: String,
    /// `option_value` as quoted by the server's `quote_ident`
    pub quoted_value: String,
}

/// Reads the two session settings every restore has to reproduce.
///
/// Each lookup is checked before the next one runs.
pub async fn collect_session_settings<E>(executor: &E) -> Result<SessionSettings>
where
    E: QueryExecutor + ?Sized,
{
    tracing::debug!("Collecting session settings");
    let client_encoding = current_setting(executor, "client_encoding").await?;
    let default_with_oids = current_setting(executor, "default_with_oids").await?;

    Ok(SessionSettings {
        client_encoding,
        default_with_oids,
    })
}

async fn current_setting<E>(executor: &E, setting: &'static str) -> Result<String>
where
    E: QueryExecutor + ?Sized,
{
    let query = CatalogQuery::new(
        "session setting",
        format!("SELECT current_setting('{setting}') AS {setting}"),
    );
    let row: CatalogRow = executor::get(executor, &query).await?;

    row.get(setting)
        .and_then(serde_json::Value::as_str)
        .map(str::to_owned)
        .ok_or_else(|| GlobalsError::missing_row(format!("session setting '{}'", setting)))
}

/// Reads the identity of the connected database.
///
/// # Errors
/// A database that cannot be found in `pg_database` is a misconfiguration and
/// returns `GlobalsError::MissingRow`.
pub async fn collect_database_identity<E>(executor: &E) -> Result<DatabaseIdentity>
where
    E: QueryExecutor + ?Sized,
{
    tracing::debug!("Collecting identity of database '{}'", executor.database_name());
    let query = CatalogQuery::new(
        "database identity",
        r#"
SELECT
	d.oid,
	quote_ident(d.datname) AS name,
	quote_ident(t.spcname) AS tablespace
FROM pg_database d
JOIN pg_tablespace t
ON d.dattablespace = t.oid
WHERE d.datname = $1"#,
    )
    .bind(executor.database_name());

    executor::get(executor, &query).await.inspect_err(|e| {
        tracing::error!(
            "Could not resolve database '{}': {}",
            executor.database_name(),
            e
        );
    })
}

/// Builds the database config query for the cluster's catalog version.
pub(crate) fn database_config_query<E>(executor: &E) -> CatalogQuery
where
    E: QueryExecutor + ?Sized,
{
    let source = render_fragments(DATABASE_CONFIG_SOURCE, executor.version());
    CatalogQuery::new(
        "database config",
        format!(
            r#"
SELECT
	option_name,
	option_value,
	quote_ident(option_value) AS quoted_value
FROM pg_options_to_table(
	{source}
)"#
        ),
    )
    .bind(executor.database_name())
}

/// Returns the database's own configuration overrides as `SET` statements.
///
/// Statements are returned in catalog order, which must be kept: later
/// settings may depend on earlier ones.
pub async fn collect_database_config<E>(executor: &E) -> Result<Vec<String>>
where
    E: QueryExecutor + ?Sized,
{
    tracing::debug!("Collecting database configuration overrides");
    let options: Vec<ConfigOption> =
        executor::select(executor, &database_config_query(executor)).await?;

    let statements: Vec<String> = options.iter().map(config_statement).collect();
    tracing::info!("Collected {} database configuration overrides", statements.len());
    Ok(statements)
}

/// Renders one stored setting as a replayable `SET` statement.
///
/// `search_path` and `DateStyle` keep their raw value; every other value is
/// quoted.
pub fn config_statement(option: &ConfigOption) -> String {
    let is_list_setting = UNQUOTED_SETTINGS
        .iter()
        .any(|name| name.eq_ignore_ascii_case(&option.option_name));
    let value = if is_list_setting {
        &option.option_value
    } else {
        &option.quoted_value
    };
    format!("SET {} TO {}", option.option_name, value)
}
