//! # QORM core
//!
//! The compilation-and-materialization core of the QORM relational mapper:
//! typed query trees compile to dialect SQL text, cached by structural
//! fingerprint, and result rows materialize back into records through
//! per-field setters compiled once per type.
//!
//! ## Quick Example
//!
//! ```rust,ignore
//! use qorm::prelude::*;
//!
//! let mapper = Mapper::new(Dialect::Postgres);
//!
//! let stmt = SelectStmt::new("users")
//!     .columns(["id", "first_name"])
//!     .where_eq("id", 123i64)
//!     .limit(1)
//!     .into_stmt();
//!
//! let compiled = mapper.compile(&stmt)?;
//! // => SELECT "id", "first_name" FROM "users" WHERE "id" = $1 LIMIT 1
//! // compiled.args == [123]; the next same-shape compile is a cache hit.
//!
//! // rows arrive from the caller's executor…
//! let mut user = User::default();
//! mapper.bind(&mut user, &["id".into(), "first_name".into()])?.scan(&row)?;
//! ```
//!
//! Execution, pooling and DSN handling stay outside; rows cross back in
//! through the [`row::RowSource`] boundary.

pub mod ast;
pub mod cache;
pub mod compiler;
pub mod context;
pub mod convert;
pub mod error;
pub mod fingerprint;
pub mod generator;
pub mod meta;
pub mod row;
pub mod scan;

pub use context::{Mapper, MapperBuilder, global};

pub mod prelude {
    pub use crate::ast::*;
    pub use crate::compiler::{Compiled, Dialect, SqlGenerator};
    pub use crate::context::{Mapper, MapperBuilder, global};
    pub use crate::convert::{FromValue, Json};
    pub use crate::error::*;
    pub use crate::fingerprint::Fingerprint;
    pub use crate::generator::IdGenerator;
    pub use crate::meta::{Entity, EntityBuilder, EntityMeta, FieldMeta, NamingStrategy};
    pub use crate::row::{RowSource, ValueRow};
    pub use crate::scan::{FieldToken, RowBinder};
}
