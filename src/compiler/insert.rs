//! INSERT emission.

use crate::ast::InsertStmt;
use crate::error::{OrmError, OrmResult};

use super::expr::emit_expr;
use super::{SqlCompiler, SqlGenerator};

pub(crate) fn build_insert(
    c: &mut SqlCompiler,
    stmt: &InsertStmt,
    g: &dyn SqlGenerator,
) -> OrmResult<()> {
    if stmt.table.is_empty() {
        return Err(OrmError::compile("empty table name"));
    }
    if stmt.columns.is_empty() {
        return Err(OrmError::compile("INSERT without columns"));
    }
    if stmt.rows.is_empty() {
        return Err(OrmError::compile("INSERT without VALUES"));
    }

    c.push("INSERT INTO ");
    let quoted = g.quote_identifier(&stmt.table);
    c.push(&quoted);

    c.push(" (");
    for (i, col) in stmt.columns.iter().enumerate() {
        if i > 0 {
            c.push(", ");
        }
        let quoted = g.quote_identifier(col);
        c.push(&quoted);
    }
    c.push(")");

    c.push(" VALUES ");
    for (r, row) in stmt.rows.iter().enumerate() {
        if row.len() != stmt.columns.len() {
            return Err(OrmError::compile(format!(
                "VALUES row {} has {} expressions for {} columns",
                r,
                row.len(),
                stmt.columns.len()
            )));
        }
        if r > 0 {
            c.push(", ");
        }
        c.push("(");
        for (i, expr) in row.iter().enumerate() {
            if i > 0 {
                c.push(", ");
            }
            emit_expr(c, expr, g)?;
        }
        c.push(")");
    }

    emit_returning(c, &stmt.returning, g)
}

/// Shared RETURNING emission for DML statements.
pub(crate) fn emit_returning(
    c: &mut SqlCompiler,
    returning: &[crate::ast::Expr],
    g: &dyn SqlGenerator,
) -> OrmResult<()> {
    if returning.is_empty() {
        return Ok(());
    }
    c.push(" RETURNING ");
    for (i, expr) in returning.iter().enumerate() {
        if i > 0 {
            c.push(", ");
        }
        emit_expr(c, expr, g)?;
    }
    Ok(())
}
