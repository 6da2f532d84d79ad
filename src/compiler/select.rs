//! SELECT emission.
//!
//! Clause order is fixed: `SELECT [DISTINCT] cols FROM table [JOIN…] [WHERE]
//! [GROUP BY] [HAVING] [ORDER BY] [LIMIT/OFFSET] [FOR UPDATE]`.

use crate::ast::{SelectStmt, WhereClause};
use crate::error::{OrmError, OrmResult};

use super::expr::emit_expr;
use super::{SqlCompiler, SqlGenerator};

pub(crate) fn build_select(
    c: &mut SqlCompiler,
    stmt: &SelectStmt,
    g: &dyn SqlGenerator,
) -> OrmResult<()> {
    if stmt.columns.is_empty() && stmt.table.is_none() {
        return Err(OrmError::compile("SELECT with no columns and no table"));
    }
    if stmt.table.is_none() && !stmt.joins.is_empty() {
        return Err(OrmError::compile("JOIN requires a source table"));
    }

    c.push(if stmt.distinct {
        "SELECT DISTINCT "
    } else {
        "SELECT "
    });

    if stmt.columns.is_empty() {
        c.push("*");
    } else {
        for (i, col) in stmt.columns.iter().enumerate() {
            if i > 0 {
                c.push(", ");
            }
            emit_expr(c, col, g)?;
        }
    }

    if let Some(table) = &stmt.table {
        if table.is_empty() {
            return Err(OrmError::compile("empty table name"));
        }
        c.push(" FROM ");
        let quoted = g.quote_identifier(table);
        c.push(&quoted);
    }

    for join in &stmt.joins {
        if join.table.is_empty() {
            return Err(OrmError::compile("empty join table name"));
        }
        c.push(" ");
        c.push(&join.kind.to_string());
        c.push(" ");
        let quoted = g.quote_identifier(&join.table);
        c.push(&quoted);
        if let Some(alias) = &join.alias {
            c.push(" ");
            let quoted = g.quote_identifier(alias);
            c.push(&quoted);
        }
        if !join.conditions.is_empty() {
            c.push(" ON ");
            for (i, cond) in join.conditions.iter().enumerate() {
                if i > 0 {
                    c.push(" ");
                    c.push(&cond.op.to_string());
                    c.push(" ");
                }
                emit_expr(c, &cond.expr, g)?;
            }
        } else if !matches!(join.kind, crate::ast::JoinKind::Cross) {
            return Err(OrmError::compile("non-cross join without ON conditions"));
        }
    }

    emit_condition_chain(c, &stmt.where_clause, " WHERE ", g)?;

    if !stmt.group_by.is_empty() {
        c.push(" GROUP BY ");
        for (i, e) in stmt.group_by.iter().enumerate() {
            if i > 0 {
                c.push(", ");
            }
            emit_expr(c, e, g)?;
        }
    }

    emit_condition_chain(c, &stmt.having, " HAVING ", g)?;

    if !stmt.order_by.is_empty() {
        c.push(" ORDER BY ");
        for (i, o) in stmt.order_by.iter().enumerate() {
            if i > 0 {
                c.push(", ");
            }
            emit_expr(c, &o.expr, g)?;
            c.push(" ");
            c.push(&o.order.to_string());
        }
    }

    if let Some(limit) = stmt.limit.limit {
        c.push(&format!(" LIMIT {}", limit));
    }
    if let Some(offset) = stmt.limit.offset {
        c.push(&format!(" OFFSET {}", offset));
    }

    if stmt.for_update {
        c.push(" FOR UPDATE");
    }

    Ok(())
}

/// Shared WHERE/HAVING chain emission, connectives in append order.
pub(crate) fn emit_condition_chain(
    c: &mut SqlCompiler,
    chain: &WhereClause,
    keyword: &str,
    g: &dyn SqlGenerator,
) -> OrmResult<()> {
    if chain.is_empty() {
        return Ok(());
    }
    c.push(keyword);
    for (i, cond) in chain.iter().enumerate() {
        if i > 0 {
            c.push(" ");
            c.push(&cond.op.to_string());
            c.push(" ");
        }
        emit_expr(c, &cond.expr, g)?;
    }
    Ok(())
}
