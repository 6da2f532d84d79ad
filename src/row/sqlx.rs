//! [`RowSource`] adapter for already-fetched sqlx Postgres rows.
//!
//! Fetching stays with the caller; this only decodes one `PgRow` into the
//! scanner's destination cells, dispatching on the reported column type.

use sqlx::postgres::PgRow;
use sqlx::{Column, Row, TypeInfo, ValueRef};

use crate::ast::Value;
use crate::error::{OrmError, OrmResult};
use crate::scan::pool::Scratch;

use super::RowSource;

/// Borrowed view over one fetched Postgres row.
pub struct PgRowSource<'a> {
    row: &'a PgRow,
}

impl<'a> PgRowSource<'a> {
    pub fn new(row: &'a PgRow) -> Self {
        Self { row }
    }
}

impl RowSource for PgRowSource<'_> {
    fn columns(&self) -> OrmResult<Vec<String>> {
        Ok(self
            .row
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect())
    }

    fn scan(&self, destinations: &mut [Scratch]) -> OrmResult<()> {
        let columns = self.row.columns();
        if destinations.len() != columns.len() {
            return Err(OrmError::row(format!(
                "expected {} destinations, got {}",
                columns.len(),
                destinations.len()
            )));
        }

        for (i, column) in columns.iter().enumerate() {
            let raw = self
                .row
                .try_get_raw(i)
                .map_err(|e| OrmError::row(e.to_string()))?;
            if raw.is_null() {
                destinations[i].put(Value::Null);
                continue;
            }

            let type_name = column.type_info().name();
            let value = decode_column(self.row, i, type_name)
                .map_err(|e| OrmError::row(format!("column `{}`: {}", column.name(), e)))?;
            destinations[i].put(value);
        }
        Ok(())
    }
}

fn decode_column(row: &PgRow, i: usize, type_name: &str) -> Result<Value, sqlx::Error> {
    let value = match type_name {
        "BOOL" => Value::Bool(row.try_get::<bool, _>(i)?),
        "INT2" | "INT4" => Value::Int(row.try_get::<i32, _>(i)? as i64),
        "INT8" => Value::Int(row.try_get::<i64, _>(i)?),
        "FLOAT4" => Value::Float(row.try_get::<f32, _>(i)? as f64),
        "FLOAT8" => Value::Float(row.try_get::<f64, _>(i)?),
        "NUMERIC" => Value::Decimal(row.try_get::<rust_decimal::Decimal, _>(i)?),
        "UUID" => Value::Uuid(row.try_get::<sqlx::types::Uuid, _>(i)?),
        "TIMESTAMPTZ" => Value::Timestamp(row.try_get::<chrono::DateTime<chrono::Utc>, _>(i)?),
        "TIMESTAMP" => Value::Timestamp(row.try_get::<chrono::NaiveDateTime, _>(i)?.and_utc()),
        "DATE" => Value::Text(row.try_get::<chrono::NaiveDate, _>(i)?.to_string()),
        "TEXT" | "VARCHAR" | "CHAR" | "BPCHAR" | "NAME" => {
            Value::Text(row.try_get::<String, _>(i)?)
        }
        "JSON" | "JSONB" => Value::Json(row.try_get::<serde_json::Value, _>(i)?),
        "BYTEA" => Value::Bytes(row.try_get::<Vec<u8>, _>(i)?),
        // Fallback: anything with a text representation.
        _ => Value::Text(row.try_get::<String, _>(i)?),
    };
    Ok(value)
}
