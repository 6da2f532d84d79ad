//! Expression emission shared by every statement kind.

use crate::ast::{BinaryOp, Expr, UnaryOp, Value};
use crate::error::{OrmError, OrmResult};

use super::{SqlCompiler, SqlGenerator};
use super::select::build_select;

/// Emit one expression node. Failure aborts the whole build.
pub(crate) fn emit_expr(c: &mut SqlCompiler, expr: &Expr, g: &dyn SqlGenerator) -> OrmResult<()> {
    match expr {
        Expr::Column(name) | Expr::Table(name) => {
            if name.is_empty() {
                return Err(OrmError::compile("empty identifier"));
            }
            let quoted = g.quote_identifier(name);
            c.push(&quoted);
            Ok(())
        }
        Expr::Value(Value::Array(items)) => {
            // An array literal expands to one placeholder per element.
            if items.is_empty() {
                return Err(OrmError::compile("empty array literal"));
            }
            c.push("(");
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    c.push(", ");
                }
                c.add_param(item.clone(), g);
            }
            c.push(")");
            Ok(())
        }
        Expr::Value(v) => {
            c.add_param(v.clone(), g);
            Ok(())
        }
        Expr::Array(items) => {
            if items.is_empty() {
                return Err(OrmError::compile("empty expression list"));
            }
            c.push("(");
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    c.push(", ");
                }
                emit_expr(c, item, g)?;
            }
            c.push(")");
            Ok(())
        }
        Expr::Function { name, args } => {
            if name.is_empty() {
                return Err(OrmError::compile("empty function name"));
            }
            c.push(name);
            c.push("(");
            for (i, arg) in args.iter().enumerate() {
                if i > 0 {
                    c.push(", ");
                }
                emit_expr(c, arg, g)?;
            }
            c.push(")");
            Ok(())
        }
        Expr::Binary { left, op, right } => {
            emit_expr(c, left, g)?;
            c.push(" ");
            c.push(&op.to_string());
            c.push(" ");
            if matches!(op, BinaryOp::In | BinaryOp::NotIn) {
                emit_in_rhs(c, right, g)
            } else {
                emit_expr(c, right, g)
            }
        }
        Expr::Unary { op, expr } => match op {
            UnaryOp::Not => {
                c.push("NOT ");
                emit_expr(c, expr, g)
            }
            UnaryOp::Neg => {
                c.push("-");
                emit_expr(c, expr, g)
            }
            UnaryOp::IsNull => {
                emit_expr(c, expr, g)?;
                c.push(" IS NULL");
                Ok(())
            }
            UnaryOp::IsNotNull => {
                emit_expr(c, expr, g)?;
                c.push(" IS NOT NULL");
                Ok(())
            }
        },
        Expr::Grouped(inner) => {
            c.push("(");
            emit_expr(c, inner, g)?;
            c.push(")");
            Ok(())
        }
        Expr::Subquery(stmt) => {
            c.push("(");
            build_select(c, stmt, g)?;
            c.push(")");
            Ok(())
        }
    }
}

/// The right-hand side of IN/NOT IN must expand to a parenthesized set.
fn emit_in_rhs(c: &mut SqlCompiler, rhs: &Expr, g: &dyn SqlGenerator) -> OrmResult<()> {
    match rhs {
        Expr::Array(_) | Expr::Value(Value::Array(_)) | Expr::Subquery(_) => emit_expr(c, rhs, g),
        _ => Err(OrmError::compile(
            "IN right-hand side must be a value list or subquery",
        )),
    }
}
