use serde::{Deserialize, Serialize};

use crate::ast::{BinaryOp, Expr, JoinClause, JoinKind, SortOrder, Value, WhereClause};

/// The compiler entry point: any statement kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Stmt {
    Select(SelectStmt),
    Insert(InsertStmt),
    Update(UpdateStmt),
    Delete(DeleteStmt),
    CreateTable(CreateTableStmt),
}

impl From<SelectStmt> for Stmt {
    fn from(s: SelectStmt) -> Self {
        Stmt::Select(s)
    }
}

impl From<InsertStmt> for Stmt {
    fn from(s: InsertStmt) -> Self {
        Stmt::Insert(s)
    }
}

impl From<UpdateStmt> for Stmt {
    fn from(s: UpdateStmt) -> Self {
        Stmt::Update(s)
    }
}

impl From<DeleteStmt> for Stmt {
    fn from(s: DeleteStmt) -> Self {
        Stmt::Delete(s)
    }
}

impl From<CreateTableStmt> for Stmt {
    fn from(s: CreateTableStmt) -> Self {
        Stmt::CreateTable(s)
    }
}

/// One ORDER BY entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderByClause {
    pub expr: Expr,
    pub order: SortOrder,
}

/// LIMIT/OFFSET pair. The numbers are emitted inline, so they are part of
/// the statement's structural shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct LimitClause {
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl LimitClause {
    pub fn is_empty(&self) -> bool {
        self.limit.is_none() && self.offset.is_none()
    }
}

/// A SELECT statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectStmt {
    /// Columns to project, in order; empty means `*`
    pub columns: Vec<Expr>,
    /// Source table
    pub table: Option<String>,
    /// Joins in append order
    #[serde(default)]
    pub joins: Vec<JoinClause>,
    /// WHERE condition chain
    #[serde(default)]
    pub where_clause: WhereClause,
    /// GROUP BY expressions
    #[serde(default)]
    pub group_by: Vec<Expr>,
    /// HAVING condition chain
    #[serde(default)]
    pub having: WhereClause,
    /// ORDER BY chain in append order
    #[serde(default)]
    pub order_by: Vec<OrderByClause>,
    /// LIMIT/OFFSET
    #[serde(default)]
    pub limit: LimitClause,
    /// Whether to emit SELECT DISTINCT
    #[serde(default)]
    pub distinct: bool,
    /// Whether to append FOR UPDATE
    #[serde(default)]
    pub for_update: bool,
}

impl SelectStmt {
    /// Create a new SELECT over the given table.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            columns: vec![],
            table: Some(table.into()),
            joins: vec![],
            where_clause: WhereClause::new(),
            group_by: vec![],
            having: WhereClause::new(),
            order_by: vec![],
            limit: LimitClause::default(),
            distinct: false,
            for_update: false,
        }
    }

    /// Select specific columns.
    pub fn columns<I, S>(mut self, cols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.columns
            .extend(cols.into_iter().map(|c| Expr::Column(c.as_ref().to_string())));
        self
    }

    /// Add a single column.
    pub fn column(mut self, col: impl AsRef<str>) -> Self {
        self.columns.push(Expr::Column(col.as_ref().to_string()));
        self
    }

    /// Add an expression column (functions, subqueries, …).
    pub fn column_expr(mut self, expr: Expr) -> Self {
        self.columns.push(expr);
        self
    }

    /// Add a filter condition with a specific operator, joined with AND.
    pub fn filter(mut self, column: impl AsRef<str>, op: BinaryOp, value: impl Into<Value>) -> Self {
        self.where_clause.and(Expr::cmp(column.as_ref(), op, value));
        self
    }

    /// Add a WHERE equals condition (shorthand for filter with Eq).
    pub fn where_eq(self, column: impl AsRef<str>, value: impl Into<Value>) -> Self {
        self.filter(column, BinaryOp::Eq, value)
    }

    /// Append an arbitrary condition expression joined with AND.
    pub fn and_where(mut self, expr: Expr) -> Self {
        self.where_clause.and(expr);
        self
    }

    /// Append an arbitrary condition expression joined with OR.
    pub fn or_where(mut self, expr: Expr) -> Self {
        self.where_clause.or(expr);
        self
    }

    /// Add a JOIN with a single equality condition.
    pub fn join(
        mut self,
        kind: JoinKind,
        table: impl AsRef<str>,
        left_col: impl AsRef<str>,
        right_col: impl AsRef<str>,
    ) -> Self {
        self.joins.push(
            JoinClause::new(kind, table.as_ref())
                .on(Expr::col_eq(left_col.as_ref(), right_col.as_ref())),
        );
        self
    }

    /// Inner join shorthand.
    pub fn inner_join(
        self,
        table: impl AsRef<str>,
        left_col: impl AsRef<str>,
        right_col: impl AsRef<str>,
    ) -> Self {
        self.join(JoinKind::Inner, table, left_col, right_col)
    }

    /// Left join shorthand.
    pub fn left_join(
        self,
        table: impl AsRef<str>,
        left_col: impl AsRef<str>,
        right_col: impl AsRef<str>,
    ) -> Self {
        self.join(JoinKind::Left, table, left_col, right_col)
    }

    /// Add a fully built join clause.
    pub fn join_clause(mut self, join: JoinClause) -> Self {
        self.joins.push(join);
        self
    }

    /// Add GROUP BY columns.
    pub fn group_by<I, S>(mut self, cols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.group_by
            .extend(cols.into_iter().map(|c| Expr::Column(c.as_ref().to_string())));
        self
    }

    /// Append a HAVING condition joined with AND.
    pub fn having(mut self, expr: Expr) -> Self {
        self.having.and(expr);
        self
    }

    /// Add an ORDER BY clause.
    pub fn order_by(mut self, column: impl AsRef<str>, order: SortOrder) -> Self {
        self.order_by.push(OrderByClause {
            expr: Expr::Column(column.as_ref().to_string()),
            order,
        });
        self
    }

    /// Order by expression (functions, CASE arms, …).
    pub fn order_by_expr(mut self, expr: Expr, order: SortOrder) -> Self {
        self.order_by.push(OrderByClause { expr, order });
        self
    }

    /// Set LIMIT.
    pub fn limit(mut self, n: u64) -> Self {
        self.limit.limit = Some(n);
        self
    }

    /// Set OFFSET.
    pub fn offset(mut self, n: u64) -> Self {
        self.limit.offset = Some(n);
        self
    }

    /// Enable DISTINCT.
    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    /// Append FOR UPDATE.
    pub fn for_update(mut self) -> Self {
        self.for_update = true;
        self
    }

    /// Wrap into the compiler entry enum.
    pub fn into_stmt(self) -> Stmt {
        Stmt::Select(self)
    }
}

/// An INSERT statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsertStmt {
    pub table: String,
    pub columns: Vec<String>,
    /// One entry per row; arity must match `columns`
    pub rows: Vec<Vec<Expr>>,
    #[serde(default)]
    pub returning: Vec<Expr>,
}

impl InsertStmt {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: vec![],
            rows: vec![],
            returning: vec![],
        }
    }

    pub fn columns<I, S>(mut self, cols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.columns
            .extend(cols.into_iter().map(|c| c.as_ref().to_string()));
        self
    }

    /// Append one VALUES row of literals.
    pub fn values<I, V>(mut self, vals: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.rows
            .push(vals.into_iter().map(|v| Expr::Value(v.into())).collect());
        self
    }

    /// Append one VALUES row of expressions.
    pub fn values_expr<I>(mut self, vals: I) -> Self
    where
        I: IntoIterator<Item = Expr>,
    {
        self.rows.push(vals.into_iter().collect());
        self
    }

    /// Set the RETURNING column list.
    pub fn returning<I, S>(mut self, cols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.returning
            .extend(cols.into_iter().map(|c| Expr::Column(c.as_ref().to_string())));
        self
    }

    pub fn into_stmt(self) -> Stmt {
        Stmt::Insert(self)
    }
}

/// An UPDATE statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateStmt {
    pub table: String,
    /// `SET column = expr` assignments in order
    pub assignments: Vec<(String, Expr)>,
    #[serde(default)]
    pub where_clause: WhereClause,
    #[serde(default)]
    pub returning: Vec<Expr>,
}

impl UpdateStmt {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            assignments: vec![],
            where_clause: WhereClause::new(),
            returning: vec![],
        }
    }

    /// Assign a literal value to a column.
    pub fn set(mut self, column: impl AsRef<str>, value: impl Into<Value>) -> Self {
        self.assignments
            .push((column.as_ref().to_string(), Expr::Value(value.into())));
        self
    }

    /// Assign an expression to a column.
    pub fn set_expr(mut self, column: impl AsRef<str>, expr: Expr) -> Self {
        self.assignments.push((column.as_ref().to_string(), expr));
        self
    }

    pub fn filter(mut self, column: impl AsRef<str>, op: BinaryOp, value: impl Into<Value>) -> Self {
        self.where_clause.and(Expr::cmp(column.as_ref(), op, value));
        self
    }

    pub fn where_eq(self, column: impl AsRef<str>, value: impl Into<Value>) -> Self {
        self.filter(column, BinaryOp::Eq, value)
    }

    pub fn and_where(mut self, expr: Expr) -> Self {
        self.where_clause.and(expr);
        self
    }

    pub fn or_where(mut self, expr: Expr) -> Self {
        self.where_clause.or(expr);
        self
    }

    pub fn returning<I, S>(mut self, cols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.returning
            .extend(cols.into_iter().map(|c| Expr::Column(c.as_ref().to_string())));
        self
    }

    pub fn into_stmt(self) -> Stmt {
        Stmt::Update(self)
    }
}

/// A DELETE statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteStmt {
    pub table: String,
    #[serde(default)]
    pub where_clause: WhereClause,
    #[serde(default)]
    pub returning: Vec<Expr>,
}

impl DeleteStmt {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            where_clause: WhereClause::new(),
            returning: vec![],
        }
    }

    pub fn filter(mut self, column: impl AsRef<str>, op: BinaryOp, value: impl Into<Value>) -> Self {
        self.where_clause.and(Expr::cmp(column.as_ref(), op, value));
        self
    }

    pub fn where_eq(self, column: impl AsRef<str>, value: impl Into<Value>) -> Self {
        self.filter(column, BinaryOp::Eq, value)
    }

    pub fn and_where(mut self, expr: Expr) -> Self {
        self.where_clause.and(expr);
        self
    }

    pub fn or_where(mut self, expr: Expr) -> Self {
        self.where_clause.or(expr);
        self
    }

    pub fn returning<I, S>(mut self, cols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.returning
            .extend(cols.into_iter().map(|c| Expr::Column(c.as_ref().to_string())));
        self
    }

    pub fn into_stmt(self) -> Stmt {
        Stmt::Delete(self)
    }
}

/// One column definition of a CREATE TABLE statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    pub db_type: String,
    #[serde(default)]
    pub not_null: bool,
    #[serde(default)]
    pub primary: bool,
    #[serde(default)]
    pub unique: bool,
    #[serde(default)]
    pub default: Option<String>,
    /// CHECK (col IN (…)) enumeration, empty for none
    #[serde(default)]
    pub enum_values: Vec<String>,
}

impl ColumnSpec {
    pub fn new(name: impl Into<String>, db_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            db_type: db_type.into(),
            not_null: false,
            primary: false,
            unique: false,
            default: None,
            enum_values: vec![],
        }
    }

    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    pub fn primary(mut self) -> Self {
        self.primary = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn default_expr(mut self, expr: impl Into<String>) -> Self {
        self.default = Some(expr.into());
        self
    }
}

/// A CREATE TABLE statement. DDL carries no placeholder arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateTableStmt {
    pub table: String,
    #[serde(default)]
    pub if_not_exists: bool,
    pub columns: Vec<ColumnSpec>,
}

impl CreateTableStmt {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            if_not_exists: false,
            columns: vec![],
        }
    }

    pub fn if_not_exists(mut self) -> Self {
        self.if_not_exists = true;
        self
    }

    pub fn column(mut self, spec: ColumnSpec) -> Self {
        self.columns.push(spec);
        self
    }

    pub fn into_stmt(self) -> Stmt {
        Stmt::CreateTable(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_builder() {
        let stmt = SelectStmt::new("users")
            .columns(["id", "email"])
            .where_eq("active", true)
            .order_by("created_at", SortOrder::Desc)
            .limit(10);

        assert_eq!(stmt.table.as_deref(), Some("users"));
        assert_eq!(stmt.columns.len(), 2);
        assert_eq!(stmt.where_clause.len(), 1);
        assert_eq!(stmt.order_by.len(), 1);
        assert_eq!(stmt.limit.limit, Some(10));
    }

    #[test]
    fn test_insert_builder_rows() {
        let stmt = InsertStmt::new("users")
            .columns(["email", "name"])
            .values(["a@example.com", "Alice"]);

        assert_eq!(stmt.columns, vec!["email", "name"]);
        assert_eq!(stmt.rows.len(), 1);
        assert_eq!(stmt.rows[0].len(), 2);
    }

    #[test]
    fn test_update_builder() {
        let stmt = UpdateStmt::new("users")
            .set("status", "active")
            .where_eq("id", 42i64);

        assert_eq!(stmt.assignments.len(), 1);
        assert_eq!(stmt.where_clause.len(), 1);
    }
}
