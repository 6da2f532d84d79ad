//! DELETE emission.

use crate::ast::DeleteStmt;
use crate::error::{OrmError, OrmResult};

use super::insert::emit_returning;
use super::select::emit_condition_chain;
use super::{SqlCompiler, SqlGenerator};

pub(crate) fn build_delete(
    c: &mut SqlCompiler,
    stmt: &DeleteStmt,
    g: &dyn SqlGenerator,
) -> OrmResult<()> {
    if stmt.table.is_empty() {
        return Err(OrmError::compile("empty table name"));
    }

    c.push("DELETE FROM ");
    let quoted = g.quote_identifier(&stmt.table);
    c.push(&quoted);

    emit_condition_chain(c, &stmt.where_clause, " WHERE ", g)?;
    emit_returning(c, &stmt.returning, g)
}
