use serde::{Deserialize, Serialize};

use crate::ast::stmt::SelectStmt;
use crate::ast::{BinaryOp, UnaryOp, Value};

/// A query-tree expression node.
///
/// Nodes own their children; dropping a node releases its whole subtree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    /// A column reference, optionally qualified (`users.id`)
    Column(String),
    /// A table reference
    Table(String),
    /// A literal value, emitted as a placeholder and collected as an argument
    Value(Value),
    /// An ordered list of expressions (`IN (…)` right-hand sides)
    Array(Vec<Expr>),
    /// A function call (`lower(email)`)
    Function { name: String, args: Vec<Expr> },
    /// A binary expression (`left op right`)
    Binary {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
    },
    /// A unary expression (`NOT expr`, `expr IS NULL`)
    Unary { op: UnaryOp, expr: Box<Expr> },
    /// A parenthesized expression
    Grouped(Box<Expr>),
    /// A scalar or IN-list subquery
    Subquery(Box<SelectStmt>),
}

impl Expr {
    /// A column reference.
    pub fn col(name: impl Into<String>) -> Self {
        Expr::Column(name.into())
    }

    /// A literal value.
    pub fn val(value: impl Into<Value>) -> Self {
        Expr::Value(value.into())
    }

    /// A function call expression.
    pub fn func<I>(name: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = Expr>,
    {
        Expr::Function {
            name: name.into(),
            args: args.into_iter().collect(),
        }
    }

    /// `column op value` comparison.
    pub fn cmp(column: impl Into<String>, op: BinaryOp, value: impl Into<Value>) -> Self {
        Expr::Binary {
            left: Box::new(Expr::Column(column.into())),
            op,
            right: Box::new(Expr::Value(value.into())),
        }
    }

    /// `column = value`.
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::cmp(column, BinaryOp::Eq, value)
    }

    /// `column != value`.
    pub fn ne(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::cmp(column, BinaryOp::Ne, value)
    }

    /// `column > value`.
    pub fn gt(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::cmp(column, BinaryOp::Gt, value)
    }

    /// `column >= value`.
    pub fn gte(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::cmp(column, BinaryOp::Gte, value)
    }

    /// `column < value`.
    pub fn lt(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::cmp(column, BinaryOp::Lt, value)
    }

    /// `column <= value`.
    pub fn lte(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::cmp(column, BinaryOp::Lte, value)
    }

    /// `column LIKE value`.
    pub fn like(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::cmp(column, BinaryOp::Like, value)
    }

    /// `column IN (v1, v2, …)`.
    pub fn in_list<I, V>(column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Expr::Binary {
            left: Box::new(Expr::Column(column.into())),
            op: BinaryOp::In,
            right: Box::new(Expr::Array(
                values.into_iter().map(|v| Expr::Value(v.into())).collect(),
            )),
        }
    }

    /// `column IS NULL`.
    pub fn is_null(column: impl Into<String>) -> Self {
        Expr::Unary {
            op: UnaryOp::IsNull,
            expr: Box::new(Expr::Column(column.into())),
        }
    }

    /// `column IS NOT NULL`.
    pub fn is_not_null(column: impl Into<String>) -> Self {
        Expr::Unary {
            op: UnaryOp::IsNotNull,
            expr: Box::new(Expr::Column(column.into())),
        }
    }

    /// `column = other_column` (JOIN conditions).
    pub fn col_eq(left: impl Into<String>, right: impl Into<String>) -> Self {
        Expr::Binary {
            left: Box::new(Expr::Column(left.into())),
            op: BinaryOp::Eq,
            right: Box::new(Expr::Column(right.into())),
        }
    }

    /// Wrap this expression in parentheses.
    pub fn grouped(self) -> Self {
        Expr::Grouped(Box::new(self))
    }

    /// Combine with another expression via AND.
    pub fn and(self, other: Expr) -> Self {
        Expr::Binary {
            left: Box::new(self),
            op: BinaryOp::And,
            right: Box::new(other),
        }
    }

    /// Combine with another expression via OR.
    pub fn or(self, other: Expr) -> Self {
        Expr::Binary {
            left: Box::new(self),
            op: BinaryOp::Or,
            right: Box::new(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expr_builders() {
        let e = Expr::eq("id", 42i64);
        match e {
            Expr::Binary { left, op, right } => {
                assert_eq!(*left, Expr::Column("id".into()));
                assert_eq!(op, BinaryOp::Eq);
                assert_eq!(*right, Expr::Value(Value::Int(42)));
            }
            other => panic!("unexpected expr: {:?}", other),
        }
    }

    #[test]
    fn test_in_list() {
        let e = Expr::in_list("status", ["a", "b"]);
        match e {
            Expr::Binary { op, right, .. } => {
                assert_eq!(op, BinaryOp::In);
                assert!(matches!(*right, Expr::Array(ref items) if items.len() == 2));
            }
            other => panic!("unexpected expr: {:?}", other),
        }
    }
}
