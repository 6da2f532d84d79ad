//! Structural fingerprinting of query trees.
//!
//! Every node digests to 64 bits via FNV-1a: a fixed kind discriminator,
//! child fingerprints in order, and structural attributes (operators,
//! identifiers, clause presence). Literal values contribute only their kind
//! tag — never their content — so one cache entry serves every parameter
//! value of the same query shape. Both WHERE and JOIN chains mix
//! order-sensitively; condition order is observable once AND and OR are
//! mixed without explicit grouping.

use crate::ast::{
    ColumnSpec, CreateTableStmt, DeleteStmt, Expr, InsertStmt, JoinClause, LimitClause,
    OrderByClause, SelectStmt, Stmt, UpdateStmt, Value, WhereClause,
};

/// FNV-1a 64-bit offset basis.
pub const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
/// FNV-1a 64-bit prime.
pub const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Fold raw bytes into a running hash.
#[inline]
pub fn mix_bytes(mut h: u64, bytes: &[u8]) -> u64 {
    for &b in bytes {
        h ^= b as u64;
        h = h.wrapping_mul(FNV_PRIME);
    }
    h
}

/// Fold a 64-bit word into a running hash.
#[inline]
pub fn mix_u64(h: u64, v: u64) -> u64 {
    mix_bytes(h, &v.to_le_bytes())
}

/// Fold a string into a running hash, length-prefixed so adjacent
/// identifiers cannot alias each other.
#[inline]
pub fn mix_str(h: u64, s: &str) -> u64 {
    mix_bytes(mix_u64(h, s.len() as u64), s.as_bytes())
}

#[inline]
pub fn mix_bool(h: u64, b: bool) -> u64 {
    mix_u64(h, b as u64)
}

/// Node kind discriminators.
pub(crate) mod kind {
    pub const COLUMN: u64 = 0x01;
    pub const TABLE: u64 = 0x02;
    pub const VALUE: u64 = 0x03;
    pub const ARRAY: u64 = 0x04;
    pub const FUNCTION: u64 = 0x05;
    pub const BINARY: u64 = 0x06;
    pub const UNARY: u64 = 0x07;
    pub const GROUPED: u64 = 0x08;
    pub const SUBQUERY: u64 = 0x09;
    pub const WHERE_COND: u64 = 0x0a;
    pub const JOIN_CLAUSE: u64 = 0x0b;
    pub const JOIN_COND: u64 = 0x0c;
    pub const ORDER_BY: u64 = 0x0d;
    pub const GROUP_BY: u64 = 0x0e;
    pub const LIMIT: u64 = 0x0f;
    pub const SELECT: u64 = 0x10;
    pub const INSERT: u64 = 0x11;
    pub const UPDATE: u64 = 0x12;
    pub const DELETE: u64 = 0x13;
    pub const CREATE_TABLE: u64 = 0x14;
    pub const COLUMN_SPEC: u64 = 0x15;
}

/// A 64-bit structural digest usable as a cache key.
pub trait Fingerprint {
    fn fingerprint(&self) -> u64;
}

impl Fingerprint for Value {
    fn fingerprint(&self) -> u64 {
        let h = mix_u64(FNV_OFFSET_BASIS, kind::VALUE);
        let h = mix_u64(h, self.kind() as u64);
        // Array literals expand to one placeholder per element, so arity is
        // structural; element content still is not.
        match self {
            Value::Array(items) => mix_u64(h, items.len() as u64),
            _ => h,
        }
    }
}

impl Fingerprint for Expr {
    fn fingerprint(&self) -> u64 {
        match self {
            Expr::Column(name) => mix_str(mix_u64(FNV_OFFSET_BASIS, kind::COLUMN), name),
            Expr::Table(name) => mix_str(mix_u64(FNV_OFFSET_BASIS, kind::TABLE), name),
            Expr::Value(v) => v.fingerprint(),
            Expr::Array(items) => {
                let mut h = mix_u64(FNV_OFFSET_BASIS, kind::ARRAY);
                h = mix_u64(h, items.len() as u64);
                for item in items {
                    h = mix_u64(h, item.fingerprint());
                }
                h
            }
            Expr::Function { name, args } => {
                let mut h = mix_str(mix_u64(FNV_OFFSET_BASIS, kind::FUNCTION), name);
                h = mix_u64(h, args.len() as u64);
                for arg in args {
                    h = mix_u64(h, arg.fingerprint());
                }
                h
            }
            Expr::Binary { left, op, right } => {
                let h = mix_u64(FNV_OFFSET_BASIS, kind::BINARY);
                let h = mix_u64(h, *op as u64);
                let h = mix_u64(h, left.fingerprint());
                mix_u64(h, right.fingerprint())
            }
            Expr::Unary { op, expr } => {
                let h = mix_u64(FNV_OFFSET_BASIS, kind::UNARY);
                let h = mix_u64(h, *op as u64);
                mix_u64(h, expr.fingerprint())
            }
            Expr::Grouped(inner) => {
                mix_u64(mix_u64(FNV_OFFSET_BASIS, kind::GROUPED), inner.fingerprint())
            }
            Expr::Subquery(stmt) => {
                mix_u64(mix_u64(FNV_OFFSET_BASIS, kind::SUBQUERY), stmt.fingerprint())
            }
        }
    }
}

impl Fingerprint for WhereClause {
    /// Order-sensitive: conditions mix sequentially with their connectives.
    fn fingerprint(&self) -> u64 {
        let mut h = mix_u64(FNV_OFFSET_BASIS, kind::WHERE_COND);
        h = mix_u64(h, self.len() as u64);
        for cond in self.iter() {
            h = mix_u64(h, cond.op as u64);
            h = mix_u64(h, cond.expr.fingerprint());
        }
        h
    }
}

impl Fingerprint for JoinClause {
    fn fingerprint(&self) -> u64 {
        let mut h = mix_u64(FNV_OFFSET_BASIS, kind::JOIN_CLAUSE);
        h = mix_u64(h, self.kind as u64);
        h = mix_str(h, &self.table);
        h = mix_bool(h, self.alias.is_some());
        if let Some(alias) = &self.alias {
            h = mix_str(h, alias);
        }
        // O(1): the chain maintains its cumulative hash at append time.
        mix_u64(h, self.conditions.fingerprint())
    }
}

impl Fingerprint for OrderByClause {
    fn fingerprint(&self) -> u64 {
        let h = mix_u64(FNV_OFFSET_BASIS, kind::ORDER_BY);
        let h = mix_u64(h, self.order as u64);
        mix_u64(h, self.expr.fingerprint())
    }
}

impl Fingerprint for LimitClause {
    /// LIMIT/OFFSET are emitted inline rather than as placeholders, so the
    /// numbers themselves are structural.
    fn fingerprint(&self) -> u64 {
        let mut h = mix_u64(FNV_OFFSET_BASIS, kind::LIMIT);
        h = mix_bool(h, self.limit.is_some());
        h = mix_u64(h, self.limit.unwrap_or(0));
        h = mix_bool(h, self.offset.is_some());
        mix_u64(h, self.offset.unwrap_or(0))
    }
}

impl Fingerprint for SelectStmt {
    fn fingerprint(&self) -> u64 {
        let mut h = mix_u64(FNV_OFFSET_BASIS, kind::SELECT);
        h = mix_bool(h, self.distinct);
        h = mix_bool(h, self.for_update);
        h = mix_u64(h, self.columns.len() as u64);
        for col in &self.columns {
            h = mix_u64(h, col.fingerprint());
        }
        h = mix_bool(h, self.table.is_some());
        if let Some(table) = &self.table {
            h = mix_str(h, table);
        }
        h = mix_u64(h, self.joins.len() as u64);
        for join in &self.joins {
            h = mix_u64(h, join.fingerprint());
        }
        h = mix_u64(h, self.where_clause.fingerprint());
        h = mix_u64(h, kind::GROUP_BY);
        h = mix_u64(h, self.group_by.len() as u64);
        for g in &self.group_by {
            h = mix_u64(h, g.fingerprint());
        }
        h = mix_u64(h, self.having.fingerprint());
        h = mix_u64(h, self.order_by.len() as u64);
        for o in &self.order_by {
            h = mix_u64(h, o.fingerprint());
        }
        mix_u64(h, self.limit.fingerprint())
    }
}

impl Fingerprint for InsertStmt {
    fn fingerprint(&self) -> u64 {
        let mut h = mix_u64(FNV_OFFSET_BASIS, kind::INSERT);
        h = mix_str(h, &self.table);
        h = mix_u64(h, self.columns.len() as u64);
        for col in &self.columns {
            h = mix_str(h, col);
        }
        h = mix_u64(h, self.rows.len() as u64);
        for row in &self.rows {
            h = mix_u64(h, row.len() as u64);
            for expr in row {
                h = mix_u64(h, expr.fingerprint());
            }
        }
        h = mix_u64(h, self.returning.len() as u64);
        for r in &self.returning {
            h = mix_u64(h, r.fingerprint());
        }
        h
    }
}

impl Fingerprint for UpdateStmt {
    fn fingerprint(&self) -> u64 {
        let mut h = mix_u64(FNV_OFFSET_BASIS, kind::UPDATE);
        h = mix_str(h, &self.table);
        h = mix_u64(h, self.assignments.len() as u64);
        for (col, expr) in &self.assignments {
            h = mix_str(h, col);
            h = mix_u64(h, expr.fingerprint());
        }
        h = mix_u64(h, self.where_clause.fingerprint());
        h = mix_u64(h, self.returning.len() as u64);
        for r in &self.returning {
            h = mix_u64(h, r.fingerprint());
        }
        h
    }
}

impl Fingerprint for DeleteStmt {
    fn fingerprint(&self) -> u64 {
        let mut h = mix_u64(FNV_OFFSET_BASIS, kind::DELETE);
        h = mix_str(h, &self.table);
        h = mix_u64(h, self.where_clause.fingerprint());
        h = mix_u64(h, self.returning.len() as u64);
        for r in &self.returning {
            h = mix_u64(h, r.fingerprint());
        }
        h
    }
}

impl Fingerprint for ColumnSpec {
    fn fingerprint(&self) -> u64 {
        let mut h = mix_u64(FNV_OFFSET_BASIS, kind::COLUMN_SPEC);
        h = mix_str(h, &self.name);
        h = mix_str(h, &self.db_type);
        h = mix_bool(h, self.not_null);
        h = mix_bool(h, self.primary);
        h = mix_bool(h, self.unique);
        h = mix_bool(h, self.default.is_some());
        if let Some(d) = &self.default {
            h = mix_str(h, d);
        }
        h = mix_u64(h, self.enum_values.len() as u64);
        for v in &self.enum_values {
            h = mix_str(h, v);
        }
        h
    }
}

impl Fingerprint for CreateTableStmt {
    /// DDL has no placeholder arguments; the whole definition is structural.
    fn fingerprint(&self) -> u64 {
        let mut h = mix_u64(FNV_OFFSET_BASIS, kind::CREATE_TABLE);
        h = mix_str(h, &self.table);
        h = mix_bool(h, self.if_not_exists);
        h = mix_u64(h, self.columns.len() as u64);
        for col in &self.columns {
            h = mix_u64(h, col.fingerprint());
        }
        h
    }
}

impl Fingerprint for Stmt {
    fn fingerprint(&self) -> u64 {
        match self {
            Stmt::Select(s) => s.fingerprint(),
            Stmt::Insert(s) => s.fingerprint(),
            Stmt::Update(s) => s.fingerprint(),
            Stmt::Delete(s) => s.fingerprint(),
            Stmt::CreateTable(s) => s.fingerprint(),
        }
    }
}
