//! The row-source boundary.
//!
//! Execution lives outside this crate; whatever fetched the rows exposes
//! them through [`RowSource`] and the scanner does the rest.

pub mod sqlx;

use crate::ast::Value;
use crate::error::{OrmError, OrmResult};
use crate::scan::pool::Scratch;

/// One fetched row.
pub trait RowSource {
    /// Column names in result order.
    fn columns(&self) -> OrmResult<Vec<String>>;

    /// Write every column's value into its destination cell, one call per
    /// row. `destinations` has exactly one cell per reported column.
    fn scan(&self, destinations: &mut [Scratch]) -> OrmResult<()>;
}

/// An in-memory row: column names plus values. Useful in tests and for
/// adapters that already hold decoded values.
#[derive(Debug, Clone)]
pub struct ValueRow {
    columns: Vec<String>,
    values: Vec<Value>,
}

impl ValueRow {
    pub fn new<I, S>(columns: I, values: Vec<Value>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            values,
        }
    }
}

impl RowSource for ValueRow {
    fn columns(&self) -> OrmResult<Vec<String>> {
        Ok(self.columns.clone())
    }

    fn scan(&self, destinations: &mut [Scratch]) -> OrmResult<()> {
        if destinations.len() != self.values.len() {
            return Err(OrmError::row(format!(
                "expected {} destinations, got {}",
                self.values.len(),
                destinations.len()
            )));
        }
        for (cell, value) in destinations.iter_mut().zip(self.values.iter()) {
            cell.put(value.clone());
        }
        Ok(())
    }
}
