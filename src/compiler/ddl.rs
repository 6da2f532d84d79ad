//! CREATE TABLE emission. DDL carries no placeholder arguments.

use crate::ast::CreateTableStmt;
use crate::error::{OrmError, OrmResult};

use super::{SqlCompiler, SqlGenerator};

pub(crate) fn build_create_table(
    c: &mut SqlCompiler,
    stmt: &CreateTableStmt,
    g: &dyn SqlGenerator,
) -> OrmResult<()> {
    if stmt.table.is_empty() {
        return Err(OrmError::compile("empty table name"));
    }
    if stmt.columns.is_empty() {
        return Err(OrmError::compile("CREATE TABLE without columns"));
    }

    c.push("CREATE TABLE ");
    if stmt.if_not_exists {
        c.push("IF NOT EXISTS ");
    }
    let quoted = g.quote_identifier(&stmt.table);
    c.push(&quoted);
    c.push(" (\n");

    for (i, col) in stmt.columns.iter().enumerate() {
        if col.name.is_empty() {
            return Err(OrmError::compile("empty column name"));
        }
        if col.db_type.is_empty() {
            return Err(OrmError::compile(format!(
                "column `{}` has no type",
                col.name
            )));
        }
        if i > 0 {
            c.push(",\n");
        }
        c.push("    ");
        let quoted = g.quote_identifier(&col.name);
        c.push(&quoted);
        c.push(" ");
        c.push(&col.db_type);

        if col.not_null {
            c.push(" NOT NULL");
        }
        if let Some(default) = &col.default {
            c.push(" DEFAULT ");
            c.push(default);
        }
        if col.primary {
            c.push(" PRIMARY KEY");
        }
        if col.unique {
            c.push(" UNIQUE");
        }
        if !col.enum_values.is_empty() {
            c.push(" CHECK (");
            let quoted = g.quote_identifier(&col.name);
            c.push(&quoted);
            c.push(" IN (");
            for (j, v) in col.enum_values.iter().enumerate() {
                if j > 0 {
                    c.push(", ");
                }
                c.push(&format!("'{}'", v.replace('\'', "''")));
            }
            c.push("))");
        }
    }

    c.push("\n)");
    Ok(())
}
