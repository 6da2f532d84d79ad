//! SQL compiler: one depth-first walk from AST to dialect SQL.
//!
//! `Mapper::compile` fingerprints the root first and only reaches the emit
//! walk on a cache miss; hits reuse the cached text and re-collect the
//! current tree's literal values with the cheap argument walk.

pub mod args;
pub mod ddl;
pub mod delete;
pub mod dialect;
pub mod expr;
pub mod insert;
pub mod select;
pub mod update;

#[cfg(test)]
mod tests;

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::ast::{Stmt, Value};
use crate::error::OrmResult;

pub use dialect::{Dialect, MySqlGenerator, PostgresGenerator, SqlGenerator, SqliteGenerator};

/// A compiled statement: SQL text and the arguments of the current tree in
/// canonical depth-first order.
#[derive(Debug, Clone, PartialEq)]
pub struct Compiled {
    pub sql: Arc<str>,
    pub args: Vec<Value>,
}

/// A reusable compile visitor. Holds the text buffer and argument list so
/// repeated builds do not reallocate; pooled via [`CompilerPool`].
#[derive(Debug, Default)]
pub struct SqlCompiler {
    pub(crate) buf: String,
    pub(crate) args: Vec<Value>,
    pub(crate) param_index: usize,
}

impl SqlCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear buffer, arguments and placeholder numbering for reuse.
    pub fn reset(&mut self) {
        self.buf.clear();
        self.args.clear();
        self.param_index = 0;
    }

    /// Emit the statement into the internal buffer, collecting arguments.
    /// Any visit failure aborts the build; the caller must not publish a
    /// partial buffer.
    pub(crate) fn emit(&mut self, stmt: &Stmt, g: &dyn SqlGenerator) -> OrmResult<()> {
        match stmt {
            Stmt::Select(s) => select::build_select(self, s, g),
            Stmt::Insert(s) => insert::build_insert(self, s, g),
            Stmt::Update(s) => update::build_update(self, s, g),
            Stmt::Delete(s) => delete::build_delete(self, s, g),
            Stmt::CreateTable(s) => ddl::build_create_table(self, s, g),
        }
    }

    /// Register a literal as the next placeholder and emit it.
    pub(crate) fn add_param(&mut self, value: Value, g: &dyn SqlGenerator) {
        self.param_index += 1;
        self.buf.push_str(&g.placeholder(self.param_index));
        self.args.push(value);
    }

    pub(crate) fn push(&mut self, s: &str) {
        self.buf.push_str(s);
    }
}

const POOL_CAP: usize = 16;

/// Free list of compiler instances. Each checkout is single-owner until
/// returned; the emit-traversal counter backs the cache-correctness tests.
#[derive(Debug, Default)]
pub struct CompilerPool {
    free: Mutex<Vec<SqlCompiler>>,
    traversals: AtomicU64,
}

impl CompilerPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check out a compiler, reusing a pooled instance when available.
    pub fn acquire(&self) -> SqlCompiler {
        self.free
            .lock()
            .ok()
            .and_then(|mut v| v.pop())
            .unwrap_or_default()
    }

    /// Return a compiler to the pool after resetting it.
    pub fn release(&self, mut compiler: SqlCompiler) {
        compiler.reset();
        if let Ok(mut v) = self.free.lock() {
            if v.len() < POOL_CAP {
                v.push(compiler);
            }
        }
    }

    /// Count one emit traversal.
    pub(crate) fn note_traversal(&self) {
        self.traversals.fetch_add(1, Ordering::Relaxed);
    }

    /// Total emit traversals performed so far.
    pub fn traversals(&self) -> u64 {
        self.traversals.load(Ordering::Relaxed)
    }
}
