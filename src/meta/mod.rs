//! Schema introspection: one declarative description per record type,
//! compiled into immutable [`EntityMeta`] and cached for the process.

pub mod cache;
pub mod naming;
pub mod tag;

pub use self::cache::MetaCache;
pub use self::naming::{NamingStrategy, SnakeCaseNaming};
pub use self::tag::{ForeignKey, TagSpec, parse_tag};

use std::collections::HashMap;

use crate::ast::{ColumnSpec, CreateTableStmt, Value, ValueKind};
use crate::compiler::SqlGenerator;
use crate::convert::FromValue;
use crate::error::{ConvertError, OrmError, OrmResult};
use crate::scan::registry::{ScanFn, ScannerRegistry};

/// A compiled per-field writer: converts the scanned value and stores it
/// through the typed apply function, no reflection on the hot path.
pub type Setter<R> = Box<dyn Fn(&mut R, Value) -> Result<(), ConvertError> + Send + Sync>;

/// Immutable metadata for one record field.
#[derive(Debug, Clone)]
pub struct FieldMeta {
    /// Field name as declared on the record
    pub name: &'static str,
    /// Database column name
    pub column: String,
    /// Destination kind, used for scratch-pool tiering and DDL types
    pub kind: ValueKind,
    /// Position within the entity's field list
    pub index: usize,
    pub nullable: bool,
    pub primary: bool,
    pub unique: bool,
    pub unique_name: Option<String>,
    pub indexed: bool,
    pub index_name: Option<String>,
    pub default: Option<String>,
    pub db_type: Option<String>,
    /// ID-generator name; implementations resolve via the generator registry
    pub generator: Option<String>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub enum_values: Vec<String>,
    pub foreign_key: Option<ForeignKey>,
    pub auto_create_time: bool,
    pub auto_update_time: bool,
}

/// A record type that can describe its schema.
///
/// `describe` runs once per type per process; the result is cached and
/// shared read-only.
pub trait Entity: Sized + 'static {
    /// The entity name, used for table-name fallback and error messages.
    fn entity_name() -> &'static str;

    /// Declare table name and fields on the builder.
    fn describe(schema: &mut EntityBuilder<Self>);
}

struct PendingField<R> {
    name: &'static str,
    tag: &'static str,
    kind: ValueKind,
    setter: Setter<R>,
}

/// Collects a type's declarative schema description.
pub struct EntityBuilder<R> {
    table: Option<String>,
    fields: Vec<PendingField<R>>,
}

impl<R: Entity> EntityBuilder<R> {
    pub(crate) fn new() -> Self {
        Self {
            table: None,
            fields: Vec::new(),
        }
    }

    /// Pin the table name; otherwise the naming strategy derives it.
    pub fn table(&mut self, name: impl Into<String>) -> &mut Self {
        self.table = Some(name.into());
        self
    }

    /// Declare one field: record name, `db:"…"` tag and typed apply fn.
    pub fn field<V: FromValue>(
        &mut self,
        name: &'static str,
        tag: &'static str,
        apply: fn(&mut R, V),
    ) -> &mut Self {
        let setter: Setter<R> = Box::new(move |record, value| {
            let typed = V::from_value(value)?;
            apply(record, typed);
            Ok(())
        });
        self.fields.push(PendingField {
            name,
            tag,
            kind: V::KIND,
            setter,
        });
        self
    }

    pub(crate) fn finish(self, naming: &dyn NamingStrategy) -> OrmResult<EntityMeta<R>> {
        let entity = R::entity_name();
        let table = self
            .table
            .unwrap_or_else(|| naming.table_name(entity));

        let mut fields = Vec::new();
        let mut setters = Vec::new();
        let mut by_name = HashMap::new();
        let mut by_column = HashMap::new();
        let mut aliases = HashMap::new();

        for pending in self.fields {
            let spec = parse_tag(pending.tag)
                .map_err(|message| OrmError::tag(pending.name, message))?;
            if spec.skip {
                continue;
            }

            if (spec.auto_create_time || spec.auto_update_time)
                && pending.kind != ValueKind::Timestamp
            {
                return Err(OrmError::construction(
                    entity,
                    format!("field `{}` uses auto timestamps on a non-temporal kind", pending.name),
                ));
            }

            let column = spec
                .column
                .unwrap_or_else(|| naming.column_name(pending.name));
            let index = fields.len();

            if by_column.contains_key(&column) {
                return Err(OrmError::construction(
                    entity,
                    format!("duplicate column mapping `{}`", column),
                ));
            }
            if by_name.contains_key(pending.name) {
                return Err(OrmError::construction(
                    entity,
                    format!("duplicate field `{}`", pending.name),
                ));
            }

            by_name.insert(pending.name, index);
            by_column.insert(column.clone(), index);
            aliases.insert(pending.name.to_string(), index);
            aliases.insert(column.clone(), index);

            fields.push(FieldMeta {
                name: pending.name,
                column,
                kind: pending.kind,
                index,
                nullable: !spec.not_null,
                primary: spec.primary,
                unique: spec.unique,
                unique_name: spec.unique_name,
                indexed: spec.indexed,
                index_name: spec.index_name,
                default: spec.default,
                db_type: spec.db_type,
                generator: spec.generator,
                min_length: spec.min_length,
                max_length: spec.max_length,
                enum_values: spec.enum_values,
                foreign_key: spec.foreign_key,
                auto_create_time: spec.auto_create_time,
                auto_update_time: spec.auto_update_time,
            });
            setters.push(pending.setter);
        }

        if fields.is_empty() {
            return Err(OrmError::construction(entity, "no mapped fields"));
        }

        Ok(EntityMeta {
            name: entity,
            table,
            fields,
            setters,
            by_name,
            by_column,
            aliases,
            scanner: None,
        })
    }
}

/// Immutable per-type metadata, built once and shared read-only.
pub struct EntityMeta<R> {
    pub name: &'static str,
    pub table: String,
    pub fields: Vec<FieldMeta>,
    setters: Vec<Setter<R>>,
    by_name: HashMap<&'static str, usize>,
    by_column: HashMap<String, usize>,
    aliases: HashMap<String, usize>,
    scanner: Option<ScanFn<R>>,
}

impl<R> std::fmt::Debug for EntityMeta<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityMeta")
            .field("name", &self.name)
            .field("table", &self.table)
            .field("fields", &self.fields)
            .field("by_name", &self.by_name)
            .field("by_column", &self.by_column)
            .field("aliases", &self.aliases)
            .field("has_scanner", &self.scanner.is_some())
            .finish()
    }
}

impl<R: Entity> EntityMeta<R> {
    /// Run the type's description and compile its metadata.
    pub(crate) fn build(
        naming: &dyn NamingStrategy,
        scanners: &ScannerRegistry,
    ) -> OrmResult<Self> {
        let mut builder = EntityBuilder::new();
        R::describe(&mut builder);
        let mut meta = builder.finish(naming)?;
        meta.scanner = scanners.get::<R>();
        tracing::debug!(entity = meta.name, table = %meta.table, fields = meta.fields.len(), "built entity metadata");
        Ok(meta)
    }

    /// Look up a field by record field name.
    pub fn field(&self, name: &str) -> Option<&FieldMeta> {
        self.by_name.get(name).map(|&i| &self.fields[i])
    }

    /// Look up a field by database column name.
    pub fn field_by_column(&self, column: &str) -> Option<&FieldMeta> {
        self.by_column.get(column).map(|&i| &self.fields[i])
    }

    /// Resolve a token registered under either field or column name.
    pub fn resolve(&self, token: &str) -> Option<usize> {
        self.aliases.get(token).copied()
    }

    /// The custom scanner captured at introspection time, if any.
    pub(crate) fn scanner(&self) -> Option<&ScanFn<R>> {
        self.scanner.as_ref()
    }

    /// Write a value into the record through the field's compiled setter.
    pub(crate) fn apply(
        &self,
        index: usize,
        record: &mut R,
        value: Value,
    ) -> Result<(), ConvertError> {
        (self.setters[index])(record, value)
    }

    /// Derive a CREATE TABLE statement from this metadata. Tag-pinned
    /// `type:` names win over the dialect's defaults.
    pub fn to_create_table(&self, g: &dyn SqlGenerator) -> CreateTableStmt {
        let mut stmt = CreateTableStmt::new(self.table.clone()).if_not_exists();
        for field in &self.fields {
            let db_type = field
                .db_type
                .clone()
                .unwrap_or_else(|| g.type_name(field.kind).to_string());
            let mut spec = ColumnSpec::new(field.column.clone(), db_type);
            spec.not_null = !field.nullable;
            spec.primary = field.primary;
            spec.unique = field.unique;
            spec.default = field.default.clone();
            spec.enum_values = field.enum_values.clone();
            stmt = stmt.column(spec);
        }
        stmt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct User {
        id: i64,
        email: String,
        first_name: String,
    }

    impl Entity for User {
        fn entity_name() -> &'static str {
            "User"
        }

        fn describe(schema: &mut EntityBuilder<Self>) {
            schema
                .table("users")
                .field::<i64>("id", "primary", |r, v| r.id = v)
                .field::<String>("email", "column:email;unique;not null", |r, v| r.email = v)
                .field::<String>("firstName", "not null", |r, v| r.first_name = v);
        }
    }

    struct BadEntity {
        a: i64,
        b: i64,
    }

    impl Entity for BadEntity {
        fn entity_name() -> &'static str {
            "BadEntity"
        }

        fn describe(schema: &mut EntityBuilder<Self>) {
            schema
                .field::<i64>("a", "column:same", |r, v| r.a = v)
                .field::<i64>("b", "column:same", |r, v| r.b = v);
        }
    }

    fn build<R: Entity>() -> OrmResult<EntityMeta<R>> {
        EntityMeta::build(&SnakeCaseNaming, &ScannerRegistry::new())
    }

    #[test]
    fn test_introspect_builds_meta() {
        let meta = build::<User>().unwrap();
        assert_eq!(meta.table, "users");
        assert_eq!(meta.fields.len(), 3);

        let id = meta.field("id").unwrap();
        assert!(id.primary);
        assert!(!id.nullable);
        assert_eq!(id.kind, ValueKind::Int);

        // Naming fallback: firstName → first_name.
        let first = meta.field("firstName").unwrap();
        assert_eq!(first.column, "first_name");
        assert_eq!(meta.field_by_column("first_name").unwrap().name, "firstName");
    }

    #[test]
    fn test_registered_under_both_names() {
        let meta = build::<User>().unwrap();
        assert_eq!(meta.resolve("firstName"), meta.resolve("first_name"));
        assert!(meta.resolve("nope").is_none());
    }

    #[test]
    fn test_duplicate_column_rejected() {
        let err = build::<BadEntity>().unwrap_err();
        assert!(err.to_string().contains("duplicate column"));
    }

    #[test]
    fn test_setter_applies_value() {
        let meta = build::<User>().unwrap();
        let mut user = User::default();
        let idx = meta.resolve("email").unwrap();
        meta.apply(idx, &mut user, Value::Text("a@b.c".into())).unwrap();
        assert_eq!(user.email, "a@b.c");
    }

    #[test]
    fn test_create_table_derivation() {
        let meta = build::<User>().unwrap();
        let g = crate::compiler::Dialect::Postgres.generator();
        let stmt = meta.to_create_table(g.as_ref());
        assert_eq!(stmt.table, "users");
        assert_eq!(stmt.columns.len(), 3);
        assert_eq!(stmt.columns[0].db_type, "BIGINT");
        assert!(stmt.columns[0].primary);
    }
}
