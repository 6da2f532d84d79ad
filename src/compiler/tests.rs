//! Compiler emission tests.

use pretty_assertions::assert_eq;

use crate::ast::*;
use crate::compiler::args::collect_stmt_args;
use crate::compiler::{Dialect, SqlCompiler};

fn compile(stmt: &Stmt, dialect: Dialect) -> (String, Vec<Value>) {
    let mut c = SqlCompiler::new();
    let generator = dialect.generator();
    c.emit(stmt, generator.as_ref()).expect("compile");
    (c.buf.clone(), c.args.clone())
}

fn compile_err(stmt: &Stmt) -> crate::error::OrmError {
    let mut c = SqlCompiler::new();
    let generator = Dialect::Postgres.generator();
    c.emit(stmt, generator.as_ref()).expect_err("should fail")
}

#[test]
fn test_simple_select() {
    let stmt = SelectStmt::new("users").into_stmt();
    let (sql, args) = compile(&stmt, Dialect::Postgres);
    assert_eq!(sql, "SELECT * FROM \"users\"");
    assert!(args.is_empty());
}

#[test]
fn test_select_columns_where_limit() {
    let stmt = SelectStmt::new("users")
        .columns(["id", "first_name"])
        .where_eq("id", 123i64)
        .limit(1)
        .into_stmt();
    let (sql, args) = compile(&stmt, Dialect::Postgres);
    assert_eq!(
        sql,
        "SELECT \"id\", \"first_name\" FROM \"users\" WHERE \"id\" = $1 LIMIT 1"
    );
    assert_eq!(args, vec![Value::Int(123)]);
}

#[test]
fn test_select_distinct_order_offset() {
    let stmt = SelectStmt::new("events")
        .columns(["kind"])
        .distinct()
        .order_by("created_at", SortOrder::Desc)
        .limit(10)
        .offset(20)
        .into_stmt();
    let (sql, _) = compile(&stmt, Dialect::Postgres);
    assert_eq!(
        sql,
        "SELECT DISTINCT \"kind\" FROM \"events\" ORDER BY \"created_at\" DESC LIMIT 10 OFFSET 20"
    );
}

#[test]
fn test_select_join() {
    let stmt = SelectStmt::new("users")
        .columns(["users.id", "posts.title"])
        .left_join("posts", "users.id", "posts.user_id")
        .into_stmt();
    let (sql, _) = compile(&stmt, Dialect::Postgres);
    assert_eq!(
        sql,
        "SELECT \"users\".\"id\", \"posts\".\"title\" FROM \"users\" \
         LEFT JOIN \"posts\" ON \"users\".\"id\" = \"posts\".\"user_id\""
    );
}

#[test]
fn test_select_where_chain_mixed_connectives() {
    let stmt = SelectStmt::new("users")
        .where_eq("active", true)
        .or_where(Expr::eq("role", "admin"))
        .into_stmt();
    let (sql, args) = compile(&stmt, Dialect::Postgres);
    assert_eq!(
        sql,
        "SELECT * FROM \"users\" WHERE \"active\" = $1 OR \"role\" = $2"
    );
    assert_eq!(args.len(), 2);
}

#[test]
fn test_select_group_by_having() {
    let stmt = SelectStmt::new("orders")
        .column("status")
        .column_expr(Expr::func("count", [Expr::col("*")]))
        .group_by(["status"])
        .having(Expr::Binary {
            left: Box::new(Expr::func("count", [Expr::col("*")])),
            op: BinaryOp::Gt,
            right: Box::new(Expr::val(10i64)),
        })
        .into_stmt();
    let (sql, _) = compile(&stmt, Dialect::Postgres);
    assert!(sql.contains("GROUP BY \"status\""));
    assert!(sql.contains("HAVING"));
}

#[test]
fn test_select_in_list() {
    let stmt = SelectStmt::new("users")
        .and_where(Expr::in_list("status", ["active", "pending"]))
        .into_stmt();
    let (sql, args) = compile(&stmt, Dialect::Postgres);
    assert_eq!(sql, "SELECT * FROM \"users\" WHERE \"status\" IN ($1, $2)");
    assert_eq!(args.len(), 2);
}

#[test]
fn test_select_for_update() {
    let stmt = SelectStmt::new("jobs")
        .where_eq("state", "queued")
        .for_update()
        .into_stmt();
    let (sql, _) = compile(&stmt, Dialect::Postgres);
    assert!(sql.ends_with("FOR UPDATE"));
}

#[test]
fn test_select_subquery() {
    let inner = SelectStmt::new("banned").columns(["user_id"]);
    let stmt = SelectStmt::new("users")
        .and_where(Expr::Binary {
            left: Box::new(Expr::col("id")),
            op: BinaryOp::NotIn,
            right: Box::new(Expr::Subquery(Box::new(inner))),
        })
        .into_stmt();
    let (sql, _) = compile(&stmt, Dialect::Postgres);
    assert_eq!(
        sql,
        "SELECT * FROM \"users\" WHERE \"id\" NOT IN (SELECT \"user_id\" FROM \"banned\")"
    );
}

#[test]
fn test_mysql_placeholders() {
    let stmt = SelectStmt::new("users").where_eq("id", 7i64).into_stmt();
    let (sql, _) = compile(&stmt, Dialect::MySql);
    assert_eq!(sql, "SELECT * FROM `users` WHERE `id` = ?");
}

#[test]
fn test_insert() {
    let stmt = InsertStmt::new("users")
        .columns(["email", "name"])
        .values(["a@example.com", "Alice"])
        .into_stmt();
    let (sql, args) = compile(&stmt, Dialect::Postgres);
    assert_eq!(
        sql,
        "INSERT INTO \"users\" (\"email\", \"name\") VALUES ($1, $2)"
    );
    assert_eq!(args.len(), 2);
}

#[test]
fn test_insert_multi_row_returning() {
    let stmt = InsertStmt::new("users")
        .columns(["email"])
        .values(["a@example.com"])
        .values(["b@example.com"])
        .returning(["id"])
        .into_stmt();
    let (sql, args) = compile(&stmt, Dialect::Postgres);
    assert_eq!(
        sql,
        "INSERT INTO \"users\" (\"email\") VALUES ($1), ($2) RETURNING \"id\""
    );
    assert_eq!(args.len(), 2);
}

#[test]
fn test_update() {
    let stmt = UpdateStmt::new("users")
        .set("verified", true)
        .where_eq("id", 9i64)
        .into_stmt();
    let (sql, args) = compile(&stmt, Dialect::Postgres);
    assert_eq!(
        sql,
        "UPDATE \"users\" SET \"verified\" = $1 WHERE \"id\" = $2"
    );
    assert_eq!(args, vec![Value::Bool(true), Value::Int(9)]);
}

#[test]
fn test_delete() {
    let stmt = DeleteStmt::new("sessions").where_eq("id", 4i64).into_stmt();
    let (sql, args) = compile(&stmt, Dialect::Postgres);
    assert_eq!(sql, "DELETE FROM \"sessions\" WHERE \"id\" = $1");
    assert_eq!(args.len(), 1);
}

#[test]
fn test_create_table() {
    let stmt = CreateTableStmt::new("users")
        .if_not_exists()
        .column(ColumnSpec::new("id", "UUID").primary().not_null())
        .column(
            ColumnSpec::new("email", "TEXT")
                .not_null()
                .unique()
                .default_expr("''"),
        )
        .into_stmt();
    let (sql, args) = compile(&stmt, Dialect::Postgres);
    assert_eq!(
        sql,
        "CREATE TABLE IF NOT EXISTS \"users\" (\n    \"id\" UUID NOT NULL PRIMARY KEY,\n    \"email\" TEXT NOT NULL DEFAULT '' UNIQUE\n)"
    );
    assert!(args.is_empty());
}

#[test]
fn test_insert_arity_mismatch_rejected() {
    let stmt = InsertStmt::new("users")
        .columns(["a", "b"])
        .values(["only-one"])
        .into_stmt();
    let err = compile_err(&stmt);
    assert!(err.to_string().contains("VALUES row"));
}

#[test]
fn test_update_without_assignments_rejected() {
    let stmt = UpdateStmt::new("users").where_eq("id", 1i64).into_stmt();
    let err = compile_err(&stmt);
    assert!(err.to_string().contains("UPDATE without assignments"));
}

#[test]
fn test_empty_in_list_rejected() {
    let stmt = SelectStmt::new("users")
        .and_where(Expr::in_list("id", Vec::<i64>::new()))
        .into_stmt();
    let err = compile_err(&stmt);
    assert!(err.to_string().contains("empty"));
}

#[test]
fn test_join_without_conditions_rejected() {
    let stmt = SelectStmt::new("users")
        .join_clause(JoinClause::new(JoinKind::Inner, "posts"))
        .into_stmt();
    let err = compile_err(&stmt);
    assert!(err.to_string().contains("without ON"));
}

#[test]
fn test_hit_args_match_miss_args() {
    // The cheap argument walk must visit literals in exactly the emit order.
    let stmt = SelectStmt::new("users")
        .column_expr(Expr::func("coalesce", [Expr::col("nick"), Expr::val("anon")]))
        .where_eq("active", true)
        .or_where(Expr::in_list("role", ["admin", "ops"]))
        .and_where(Expr::gt("age", 21i64))
        .order_by_expr(
            Expr::func("greatest", [Expr::col("a"), Expr::val(0i64)]),
            SortOrder::Asc,
        )
        .into_stmt();

    let (_, emitted) = compile(&stmt, Dialect::Postgres);
    let mut walked = Vec::new();
    collect_stmt_args(&stmt, &mut walked);
    assert_eq!(emitted, walked);
}
