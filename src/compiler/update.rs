//! UPDATE emission.

use crate::ast::UpdateStmt;
use crate::error::{OrmError, OrmResult};

use super::expr::emit_expr;
use super::insert::emit_returning;
use super::select::emit_condition_chain;
use super::{SqlCompiler, SqlGenerator};

pub(crate) fn build_update(
    c: &mut SqlCompiler,
    stmt: &UpdateStmt,
    g: &dyn SqlGenerator,
) -> OrmResult<()> {
    if stmt.table.is_empty() {
        return Err(OrmError::compile("empty table name"));
    }
    if stmt.assignments.is_empty() {
        return Err(OrmError::compile("UPDATE without assignments"));
    }

    c.push("UPDATE ");
    let quoted = g.quote_identifier(&stmt.table);
    c.push(&quoted);

    c.push(" SET ");
    for (i, (col, expr)) in stmt.assignments.iter().enumerate() {
        if col.is_empty() {
            return Err(OrmError::compile("empty assignment column"));
        }
        if i > 0 {
            c.push(", ");
        }
        let quoted = g.quote_identifier(col);
        c.push(&quoted);
        c.push(" = ");
        emit_expr(c, expr, g)?;
    }

    emit_condition_chain(c, &stmt.where_clause, " WHERE ", g)?;
    emit_returning(c, &stmt.returning, g)
}
