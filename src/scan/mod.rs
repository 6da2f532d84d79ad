//! Field binding and row scanning.
//!
//! Binding resolves caller-supplied field tokens against entity metadata up
//! front; scanning then matches the row's columns to those bindings, pulls
//! pooled scratch destinations, scans once, and applies each bound value
//! through its compiled setter.

pub mod pool;
pub mod registry;

pub use pool::{Scratch, ScratchPools};
pub use registry::{ScanFn, ScannerRegistry};

use std::sync::Arc;

use crate::error::{OrmError, OrmResult};
use crate::meta::{Entity, EntityMeta};
use crate::row::RowSource;

/// A caller-supplied field selector: record field name, column name, or
/// positional index into the entity's field list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldToken<'a> {
    Name(&'a str),
    Index(usize),
}

impl<'a> From<&'a str> for FieldToken<'a> {
    fn from(name: &'a str) -> Self {
        FieldToken::Name(name)
    }
}

impl From<usize> for FieldToken<'_> {
    fn from(index: usize) -> Self {
        FieldToken::Index(index)
    }
}

impl std::fmt::Display for FieldToken<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldToken::Name(name) => write!(f, "{}", name),
            FieldToken::Index(index) => write!(f, "#{}", index),
        }
    }
}

/// A per-query binding of record fields to row columns.
pub struct RowBinder<'m, 'r, R: Entity> {
    record: &'r mut R,
    meta: Arc<EntityMeta<R>>,
    pools: &'m ScratchPools,
    scanner: Option<ScanFn<R>>,
    /// Bound field indices, in caller order
    bound: Vec<usize>,
}

impl<'m, 'r, R: Entity> std::fmt::Debug for RowBinder<'m, 'r, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RowBinder")
            .field("meta", &self.meta)
            .field("has_scanner", &self.scanner.is_some())
            .field("bound", &self.bound)
            .finish()
    }
}

impl<'m, 'r, R: Entity> RowBinder<'m, 'r, R> {
    pub(crate) fn new(
        record: &'r mut R,
        meta: Arc<EntityMeta<R>>,
        pools: &'m ScratchPools,
        scanner: Option<ScanFn<R>>,
        tokens: &[FieldToken<'_>],
    ) -> OrmResult<Self> {
        if tokens.is_empty() {
            return Err(OrmError::binding("no fields supplied"));
        }
        let mut bound = Vec::with_capacity(tokens.len());
        for token in tokens {
            let index = match token {
                FieldToken::Name(name) => meta.resolve(name),
                FieldToken::Index(index) if *index < meta.fields.len() => Some(*index),
                FieldToken::Index(_) => None,
            }
            .ok_or_else(|| {
                OrmError::binding(format!(
                    "field `{}` does not belong to `{}`",
                    token, meta.name
                ))
            })?;
            if bound.contains(&index) {
                return Err(OrmError::binding(format!(
                    "field `{}` bound more than once",
                    token
                )));
            }
            bound.push(index);
        }
        Ok(Self {
            record,
            meta,
            pools,
            scanner,
            bound,
        })
    }

    /// Number of bound fields.
    pub fn len(&self) -> usize {
        self.bound.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bound.is_empty()
    }

    /// Scan one row into the bound fields.
    ///
    /// Every acquired scratch cell is returned to its pool before this
    /// method returns, on the error paths included.
    pub fn scan(&mut self, row: &dyn RowSource) -> OrmResult<()> {
        if let Some(scanner) = self.scanner.clone() {
            return (scanner.as_ref())(self.record, row);
        }

        let columns = row.columns()?;
        tracing::trace!(entity = self.meta.name, columns = columns.len(), "scanning row");

        let mut slots: Vec<Scratch> = Vec::with_capacity(columns.len());
        let mut slot_fields: Vec<Option<usize>> = Vec::with_capacity(columns.len());
        for column in &columns {
            let field = self
                .meta
                .field_by_column(column)
                .map(|f| f.index)
                .filter(|index| self.bound.contains(index));
            match field {
                Some(index) => {
                    slots.push(self.pools.acquire(self.meta.fields[index].kind));
                    slot_fields.push(Some(index));
                }
                None => {
                    slots.push(self.pools.acquire_discard());
                    slot_fields.push(None);
                }
            }
        }

        let mut result = row.scan(&mut slots);

        if result.is_ok() {
            for (slot, field) in slots.iter_mut().zip(slot_fields.iter()) {
                if let Some(index) = *field {
                    let value = slot.take();
                    if let Err(source) = self.meta.apply(index, self.record, value) {
                        result = Err(OrmError::Conversion {
                            column: self.meta.fields[index].column.clone(),
                            source,
                        });
                        break;
                    }
                }
            }
        }

        for slot in slots {
            self.pools.release(slot);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Value;
    use crate::meta::{EntityBuilder, SnakeCaseNaming};
    use crate::row::ValueRow;

    #[derive(Debug, Default, PartialEq)]
    struct User {
        id: i64,
        first_name: String,
        age: u64,
    }

    impl Entity for User {
        fn entity_name() -> &'static str {
            "User"
        }

        fn describe(schema: &mut EntityBuilder<Self>) {
            schema
                .table("users")
                .field::<i64>("id", "primary", |r, v| r.id = v)
                .field::<String>("firstName", "not null", |r, v| r.first_name = v)
                .field::<u64>("age", "", |r, v| r.age = v);
        }
    }

    fn meta() -> Arc<EntityMeta<User>> {
        Arc::new(EntityMeta::build(&SnakeCaseNaming, &ScannerRegistry::new()).unwrap())
    }

    fn bind<'m, 'r>(
        record: &'r mut User,
        pools: &'m ScratchPools,
        tokens: &[FieldToken<'_>],
    ) -> OrmResult<RowBinder<'m, 'r, User>> {
        RowBinder::new(record, meta(), pools, None, tokens)
    }

    #[test]
    fn test_round_trip_binding() {
        let pools = ScratchPools::new();
        let mut user = User::default();
        let mut binder = bind(
            &mut user,
            &pools,
            &[FieldToken::Name("id"), FieldToken::Name("first_name")],
        )
        .unwrap();

        let row = ValueRow::new(
            ["id", "first_name"],
            vec![Value::Int(123), Value::Text("Ada".into())],
        );
        binder.scan(&row).unwrap();
        drop(binder);

        assert_eq!(user.id, 123);
        assert_eq!(user.first_name, "Ada");
        assert_eq!(pools.outstanding(), 0);
    }

    #[test]
    fn test_rescan_fully_overwrites() {
        let pools = ScratchPools::new();
        let mut user = User::default();
        let mut binder = bind(
            &mut user,
            &pools,
            &[FieldToken::Name("id"), FieldToken::Name("first_name")],
        )
        .unwrap();

        let first = ValueRow::new(
            ["id", "first_name"],
            vec![Value::Int(1), Value::Text("Ada".into())],
        );
        let second = ValueRow::new(
            ["id", "first_name"],
            vec![Value::Int(2), Value::Text("Grace".into())],
        );
        binder.scan(&first).unwrap();
        binder.scan(&second).unwrap();
        drop(binder);

        assert_eq!(user.id, 2);
        assert_eq!(user.first_name, "Grace");
    }

    #[test]
    fn test_unbound_columns_are_discarded() {
        let pools = ScratchPools::new();
        let mut user = User::default();
        let mut binder = bind(&mut user, &pools, &[FieldToken::Name("id")]).unwrap();

        // first_name arrives but was not bound; its value must not land.
        let row = ValueRow::new(
            ["id", "first_name"],
            vec![Value::Int(5), Value::Text("ignored".into())],
        );
        binder.scan(&row).unwrap();
        drop(binder);

        assert_eq!(user.id, 5);
        assert_eq!(user.first_name, "");
        assert_eq!(pools.outstanding(), 0);
    }

    #[test]
    fn test_unknown_token_rejected() {
        let pools = ScratchPools::new();
        let mut user = User::default();
        let err = bind(&mut user, &pools, &[FieldToken::Name("no_such_field")]).unwrap_err();
        assert!(err.to_string().contains("does not belong"));

        let err = bind(&mut user, &pools, &[FieldToken::Index(99)]).unwrap_err();
        assert!(err.to_string().contains("does not belong"));
    }

    #[test]
    fn test_double_binding_rejected() {
        let pools = ScratchPools::new();
        let mut user = User::default();
        // `id` under field name and column name is still the same field.
        let err = bind(
            &mut user,
            &pools,
            &[FieldToken::Name("id"), FieldToken::Index(0)],
        )
        .unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn test_conversion_error_releases_all_cells() {
        let pools = ScratchPools::new();
        let mut user = User::default();
        let mut binder = bind(
            &mut user,
            &pools,
            &[FieldToken::Name("id"), FieldToken::Name("age")],
        )
        .unwrap();

        // -5 cannot land in the unsigned age field; the scan must fail and
        // still return every scratch cell.
        let row = ValueRow::new(["id", "age"], vec![Value::Int(1), Value::Int(-5)]);
        let err = binder.scan(&row).unwrap_err();
        drop(binder);

        assert!(matches!(err, OrmError::Conversion { .. }));
        assert_eq!(pools.outstanding(), 0);
    }

    #[test]
    fn test_row_error_releases_all_cells() {
        let pools = ScratchPools::new();
        let mut user = User::default();
        let mut binder = bind(&mut user, &pools, &[FieldToken::Name("id")]).unwrap();

        // Column list and value list disagree: the row source fails.
        let row = ValueRow::new(["id", "extra"], vec![Value::Int(1)]);
        let err = binder.scan(&row).unwrap_err();
        drop(binder);

        assert!(matches!(err, OrmError::Row(_)));
        assert_eq!(pools.outstanding(), 0);
    }

    #[test]
    fn test_custom_scanner_overrides_pipeline() {
        let pools = ScratchPools::new();
        let registry = ScannerRegistry::new();
        registry.register::<User>(|record, _row| {
            record.id = 777;
            Ok(())
        });
        let scanner = registry.get::<User>();

        let mut user = User::default();
        let mut binder = RowBinder::new(
            &mut user,
            meta(),
            &pools,
            scanner,
            &[FieldToken::Name("id")],
        )
        .unwrap();
        let row = ValueRow::new(["id"], vec![Value::Int(1)]);
        binder.scan(&row).unwrap();
        drop(binder);

        assert_eq!(user.id, 777);
    }
}
