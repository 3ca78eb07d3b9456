//! Dynamic decoding of PostgreSQL rows into catalog rows.
//!
//! Catalog queries return a handful of scalar types. Each column is decoded
//! by its server-reported type and stored under its column name; anything
//! that is not a boolean, integer, oid or float is read as text, so numeric
//! values must be cast to text in the query.

use crate::executor::CatalogRow;
use crate::{Result, error::GlobalsError};
use serde_json::Value;
use sqlx::postgres::PgRow;
use sqlx::postgres::types::Oid;
use sqlx::{Column, Row, TypeInfo};

/// Converts one result row into a name-keyed catalog row.
pub(crate) fn decode_pg_row(row: &PgRow, context: &str) -> Result<CatalogRow> {
    let mut decoded = CatalogRow::new();
    for column in row.columns() {
        let value = decode_column(row, column.ordinal(), column.type_info().name()).map_err(
            |e| {
                GlobalsError::collection_failed(
                    format!(
                        "Failed to decode column '{}' of {} result",
                        column.name(),
                        context
                    ),
                    e,
                )
            },
        )?;
        decoded.insert(column.name().to_string(), value);
    }
    Ok(decoded)
}

fn decode_column(row: &PgRow, index: usize, type_name: &str) -> sqlx::Result<Value> {
    let value = match type_name {
        "BOOL" => row.try_get::<Option<bool>, _>(index)?.map(Value::from),
        "INT2" => row.try_get::<Option<i16>, _>(index)?.map(Value::from),
        "INT4" => row.try_get::<Option<i32>, _>(index)?.map(Value::from),
        "INT8" => row.try_get::<Option<i64>, _>(index)?.map(Value::from),
        "OID" => row
            .try_get::<Option<Oid>, _>(index)?
            .map(|oid| Value::from(oid.0)),
        "FLOAT4" => row
            .try_get::<Option<f32>, _>(index)?
            .map(|v| Value::from(f64::from(v))),
        "FLOAT8" => row.try_get::<Option<f64>, _>(index)?.map(Value::from),
        _ => row.try_get::<Option<String>, _>(index)?.map(Value::from),
    };
    Ok(value.unwrap_or(Value::Null))
}
