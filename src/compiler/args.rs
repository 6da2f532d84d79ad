//! The cheap argument walk used on cache hits.
//!
//! Visits literal values in exactly the order the emit walk registers
//! placeholders, without touching the text buffer. The two walks must stay
//! in lockstep; `tests::test_hit_args_match_miss_args` guards the pairing.

use crate::ast::{Expr, SelectStmt, Stmt, Value, WhereClause};

pub(crate) fn collect_stmt_args(stmt: &Stmt, out: &mut Vec<Value>) {
    match stmt {
        Stmt::Select(s) => collect_select(s, out),
        Stmt::Insert(s) => {
            for row in &s.rows {
                for expr in row {
                    collect_expr(expr, out);
                }
            }
            for expr in &s.returning {
                collect_expr(expr, out);
            }
        }
        Stmt::Update(s) => {
            for (_, expr) in &s.assignments {
                collect_expr(expr, out);
            }
            collect_chain(&s.where_clause, out);
            for expr in &s.returning {
                collect_expr(expr, out);
            }
        }
        Stmt::Delete(s) => {
            collect_chain(&s.where_clause, out);
            for expr in &s.returning {
                collect_expr(expr, out);
            }
        }
        Stmt::CreateTable(_) => {}
    }
}

fn collect_select(stmt: &SelectStmt, out: &mut Vec<Value>) {
    for col in &stmt.columns {
        collect_expr(col, out);
    }
    for join in &stmt.joins {
        for cond in join.conditions.iter() {
            collect_expr(&cond.expr, out);
        }
    }
    collect_chain(&stmt.where_clause, out);
    for expr in &stmt.group_by {
        collect_expr(expr, out);
    }
    collect_chain(&stmt.having, out);
    for o in &stmt.order_by {
        collect_expr(&o.expr, out);
    }
    // LIMIT/OFFSET are inline, never placeholders.
}

fn collect_chain(chain: &WhereClause, out: &mut Vec<Value>) {
    for cond in chain.iter() {
        collect_expr(&cond.expr, out);
    }
}

fn collect_expr(expr: &Expr, out: &mut Vec<Value>) {
    match expr {
        Expr::Column(_) | Expr::Table(_) => {}
        Expr::Value(Value::Array(items)) => {
            for item in items {
                out.push(item.clone());
            }
        }
        Expr::Value(v) => out.push(v.clone()),
        Expr::Array(items) => {
            for item in items {
                collect_expr(item, out);
            }
        }
        Expr::Function { args, .. } => {
            for arg in args {
                collect_expr(arg, out);
            }
        }
        Expr::Binary { left, right, .. } => {
            collect_expr(left, out);
            collect_expr(right, out);
        }
        Expr::Unary { expr, .. } => collect_expr(expr, out),
        Expr::Grouped(inner) => collect_expr(inner, out),
        Expr::Subquery(stmt) => collect_select(stmt, out),
    }
}
