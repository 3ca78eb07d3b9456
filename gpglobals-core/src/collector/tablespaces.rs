//! Tablespace collection.

use crate::Result;
use crate::executor::{self, CatalogQuery, QueryExecutor};
use crate::models::{DEFAULT_FILESPACE, Tablespace};
use crate::version::{GatedFragment, render_fragments};

/// Before 6 tablespaces live in filespaces; from 6 they point straight at a
/// directory and the built-in ones report an empty location.
const TABLESPACE_QUERY: &[GatedFragment] = &[
    GatedFragment::before(
        "6",
        r#"
SELECT
	t.oid,
	quote_ident(t.spcname) AS name,
	quote_ident(f.fsname) AS filespace
FROM pg_tablespace t
JOIN pg_filespace f
ON t.spcfsoid = f.oid"#,
    ),
    GatedFragment::at_least(
        "6",
        r#"
SELECT
	t.oid,
	quote_ident(t.spcname) AS name,
	pg_tablespace_location(t.oid) AS filespace
FROM pg_tablespace t"#,
    ),
];

/// True for locations that belong to the cluster itself rather than to a
/// user tablespace.
pub fn is_reserved_location(filespace: &str) -> bool {
    filespace.is_empty() || filespace == DEFAULT_FILESPACE
}

/// Collects user tablespaces, skipping those in the reserved default location.
pub async fn collect_tablespaces<E>(executor: &E) -> Result<Vec<Tablespace>>
where
    E: QueryExecutor + ?Sized,
{
    tracing::debug!("Collecting tablespaces");
    let query = CatalogQuery::new(
        "tablespaces",
        render_fragments(TABLESPACE_QUERY, executor.version()),
    );

    let mut tablespaces: Vec<Tablespace> = executor::select(executor, &query).await?;
    tablespaces.retain(|tablespace| !is_reserved_location(&tablespace.filespace));

    tracing::info!("Collected {} tablespaces", tablespaces.len());
    Ok(tablespaces)
}
