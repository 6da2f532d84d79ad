pub mod conditions;
pub mod expr;
pub mod joins;
pub mod operators;
pub mod stmt;
pub mod values;

pub use self::conditions::{WhereClause, WhereCond};
pub use self::expr::Expr;
pub use self::joins::{JoinClause, JoinCond, JoinCondChain};
pub use self::operators::{BinaryOp, JoinKind, LogicalOp, SortOrder, UnaryOp};
pub use self::stmt::{
    ColumnSpec, CreateTableStmt, DeleteStmt, InsertStmt, LimitClause, OrderByClause, SelectStmt,
    Stmt, UpdateStmt,
};
pub use self::values::{Value, ValueKind};
