//! The caller-owned mapper context.
//!
//! All caches, pools and registries hang off an explicit [`Mapper`] passed
//! to the entry points; [`global()`] is a thin process-wide default for
//! callers that do not need their own.

use std::sync::{Arc, OnceLock};

use crate::ast::{CreateTableStmt, Stmt};
use crate::cache::{CacheStats, QueryCache};
use crate::compiler::args::collect_stmt_args;
use crate::compiler::{Compiled, CompilerPool, Dialect};
use crate::error::OrmResult;
use crate::fingerprint::Fingerprint;
use crate::generator::{GeneratorRegistry, IdGenerator};
use crate::meta::{Entity, EntityMeta, MetaCache, NamingStrategy, SnakeCaseNaming};
use crate::row::RowSource;
use crate::scan::{FieldToken, RowBinder, ScannerRegistry, ScratchPools};

/// Configures a [`Mapper`].
pub struct MapperBuilder {
    dialect: Dialect,
    naming: Arc<dyn NamingStrategy>,
    meta_capacity: usize,
}

impl MapperBuilder {
    pub fn dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    pub fn naming(mut self, naming: Arc<dyn NamingStrategy>) -> Self {
        self.naming = naming;
        self
    }

    /// Capacity of the bounded metadata cache (the warm set is unbounded).
    pub fn meta_capacity(mut self, capacity: usize) -> Self {
        self.meta_capacity = capacity;
        self
    }

    pub fn build(self) -> Mapper {
        Mapper {
            dialect: self.dialect,
            naming: self.naming,
            queries: QueryCache::new(),
            metas: MetaCache::with_capacity(self.meta_capacity),
            compilers: CompilerPool::new(),
            scratch: ScratchPools::new(),
            scanners: ScannerRegistry::new(),
            generators: GeneratorRegistry::new(),
        }
    }
}

impl Default for MapperBuilder {
    fn default() -> Self {
        Self {
            dialect: Dialect::default(),
            naming: Arc::new(SnakeCaseNaming),
            meta_capacity: 256,
        }
    }
}

/// The compilation-and-materialization context.
pub struct Mapper {
    dialect: Dialect,
    naming: Arc<dyn NamingStrategy>,
    queries: QueryCache,
    metas: MetaCache,
    compilers: CompilerPool,
    scratch: ScratchPools,
    scanners: ScannerRegistry,
    generators: GeneratorRegistry,
}

impl Default for Mapper {
    fn default() -> Self {
        MapperBuilder::default().build()
    }
}

impl Mapper {
    /// A mapper with default naming and caches for the given dialect.
    pub fn new(dialect: Dialect) -> Self {
        MapperBuilder::default().dialect(dialect).build()
    }

    pub fn builder() -> MapperBuilder {
        MapperBuilder::default()
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Compile a statement to dialect SQL plus arguments.
    ///
    /// The fingerprint decides: a cache hit reuses the stored SQL and only
    /// re-collects the current tree's literal values; a miss performs the
    /// single emit traversal and publishes the result. Nothing partial is
    /// ever cached.
    pub fn compile(&self, stmt: &Stmt) -> OrmResult<Compiled> {
        let fingerprint = stmt.fingerprint();

        if let Some(hit) = self.queries.get(fingerprint) {
            let mut args = Vec::with_capacity(hit.arg_count);
            collect_stmt_args(stmt, &mut args);
            // An argument-count mismatch means the fingerprint collided
            // with a differently shaped tree; recompile rather than serve
            // someone else's SQL.
            if args.len() == hit.arg_count {
                return Ok(Compiled { sql: hit.sql, args });
            }
            tracing::debug!(fingerprint, "fingerprint collision, recompiling");
        }

        let mut compiler = self.compilers.acquire();
        self.compilers.note_traversal();
        let generator = self.dialect.generator();
        match compiler.emit(stmt, generator.as_ref()) {
            Ok(()) => {
                let sql: Arc<str> = Arc::from(compiler.buf.as_str());
                let args = std::mem::take(&mut compiler.args);
                self.compilers.release(compiler);
                self.queries.insert(fingerprint, sql.clone(), args.len());
                Ok(Compiled { sql, args })
            }
            Err(err) => {
                self.compilers.release(compiler);
                Err(err)
            }
        }
    }

    /// Look up or build the metadata for `R`.
    pub fn introspect<R: Entity>(&self) -> OrmResult<Arc<EntityMeta<R>>> {
        self.metas
            .introspect::<R>(self.naming.as_ref(), &self.scanners)
    }

    /// Build `R`'s metadata now and pin it permanently. Must run before the
    /// first introspection freezes the warm set.
    pub fn prewarm<R: Entity>(&self) -> OrmResult<()> {
        self.metas.prewarm::<R>(self.naming.as_ref(), &self.scanners)
    }

    /// Register a custom whole-row scanner for `R`.
    ///
    /// Takes effect for metadata built afterwards; register before
    /// introspecting the type.
    pub fn register_scanner<R: Entity>(
        &self,
        scan: impl Fn(&mut R, &dyn RowSource) -> OrmResult<()> + Send + Sync + 'static,
    ) {
        self.scanners.register::<R>(scan);
    }

    /// Register an ID generator under the name tags reference.
    pub fn register_generator(&self, name: impl Into<String>, generator: Arc<dyn IdGenerator>) {
        self.generators.register(name, generator);
    }

    /// Look up an ID generator by name.
    pub fn generator(&self, name: &str) -> Option<Arc<dyn IdGenerator>> {
        self.generators.get(name)
    }

    /// Bind the given fields of `record` for scanning.
    pub fn bind<'m, 'r, R: Entity>(
        &'m self,
        record: &'r mut R,
        tokens: &[FieldToken<'_>],
    ) -> OrmResult<RowBinder<'m, 'r, R>> {
        let meta = self.introspect::<R>()?;
        let scanner = meta.scanner().cloned();
        RowBinder::new(record, meta, &self.scratch, scanner, tokens)
    }

    /// Bind every mapped field of `record`.
    pub fn bind_all<'m, 'r, R: Entity>(
        &'m self,
        record: &'r mut R,
    ) -> OrmResult<RowBinder<'m, 'r, R>> {
        let meta = self.introspect::<R>()?;
        let scanner = meta.scanner().cloned();
        let tokens: Vec<FieldToken<'_>> =
            (0..meta.fields.len()).map(FieldToken::Index).collect();
        RowBinder::new(record, meta, &self.scratch, scanner, &tokens)
    }

    /// Derive a CREATE TABLE statement from `R`'s metadata.
    pub fn create_table_stmt<R: Entity>(&self) -> OrmResult<CreateTableStmt> {
        let meta = self.introspect::<R>()?;
        let generator = self.dialect.generator();
        Ok(meta.to_create_table(generator.as_ref()))
    }

    /// Query-cache counters.
    pub fn cache_stats(&self) -> CacheStats {
        self.queries.stats()
    }

    /// Emit traversals performed since construction.
    pub fn traversals(&self) -> u64 {
        self.compilers.traversals()
    }

    /// Scratch cells currently checked out; zero between scans.
    pub fn scratch_outstanding(&self) -> usize {
        self.scratch.outstanding()
    }
}

static GLOBAL: OnceLock<Mapper> = OnceLock::new();

/// The process-wide default mapper (Postgres dialect, default naming).
pub fn global() -> &'static Mapper {
    GLOBAL.get_or_init(Mapper::default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{SelectStmt, UpdateStmt, Value};
    use crate::meta::EntityBuilder;
    use crate::row::ValueRow;
    use pretty_assertions::assert_eq;

    #[derive(Debug, Default, PartialEq)]
    struct User {
        id: i64,
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
                .field::<String>("firstName", "not null", |r, v| r.first_name = v);
        }
    }

    fn users_query(id: i64) -> Stmt {
        SelectStmt::new("users")
            .columns(["id", "first_name"])
            .where_eq("id", id)
            .limit(1)
            .into_stmt()
    }

    #[test]
    fn test_select_scenario_with_cache() {
        let mapper = Mapper::new(Dialect::Postgres);

        let first = mapper.compile(&users_query(123)).unwrap();
        assert_eq!(
            &*first.sql,
            "SELECT \"id\", \"first_name\" FROM \"users\" WHERE \"id\" = $1 LIMIT 1"
        );
        assert_eq!(first.args, vec![Value::Int(123)]);
        assert_eq!(mapper.traversals(), 1);

        // Same shape, different parameter: identical SQL, fresh args, and
        // no second emit traversal.
        let second = mapper.compile(&users_query(456)).unwrap();
        assert_eq!(second.sql, first.sql);
        assert!(Arc::ptr_eq(&second.sql, &first.sql));
        assert_eq!(second.args, vec![Value::Int(456)]);
        assert_eq!(mapper.traversals(), 1);

        let stats = mapper.cache_stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.entries, 1);
    }

    #[test]
    fn test_failed_compile_not_cached() {
        let mapper = Mapper::new(Dialect::Postgres);
        let bad = UpdateStmt::new("users").where_eq("id", 1i64).into_stmt();

        assert!(mapper.compile(&bad).is_err());
        assert!(mapper.compile(&bad).is_err());
        // Both attempts re-traversed: nothing partial was published.
        assert_eq!(mapper.traversals(), 2);
        assert_eq!(mapper.cache_stats().entries, 0);
    }

    #[test]
    fn test_bind_and_scan_pipeline() {
        let mapper = Mapper::new(Dialect::Postgres);
        let mut user = User::default();

        let mut binder = mapper
            .bind(&mut user, &[FieldToken::Name("id"), FieldToken::Name("first_name")])
            .unwrap();
        let row = ValueRow::new(
            ["id", "first_name"],
            vec![Value::Int(123), Value::Text("Ada".into())],
        );
        binder.scan(&row).unwrap();
        drop(binder);

        assert_eq!(
            user,
            User {
                id: 123,
                first_name: "Ada".into()
            }
        );
        assert_eq!(mapper.scratch_outstanding(), 0);
    }

    #[test]
    fn test_bind_all() {
        let mapper = Mapper::new(Dialect::Postgres);
        let mut user = User::default();
        let binder = mapper.bind_all(&mut user).unwrap();
        assert_eq!(binder.len(), 2);
    }

    #[test]
    fn test_prewarm_pins_metadata() {
        let mapper = Mapper::new(Dialect::Postgres);
        mapper.prewarm::<User>().unwrap();
        let meta = mapper.introspect::<User>().unwrap();
        assert_eq!(meta.table, "users");
    }

    #[test]
    fn test_create_table_stmt_compiles() {
        let mapper = Mapper::new(Dialect::Postgres);
        let stmt = mapper.create_table_stmt::<User>().unwrap().into_stmt();
        let compiled = mapper.compile(&stmt).unwrap();
        assert!(compiled.sql.starts_with("CREATE TABLE IF NOT EXISTS \"users\""));
        assert!(compiled.args.is_empty());
    }

    #[test]
    fn test_global_default() {
        let mapper = global();
        assert_eq!(mapper.dialect(), Dialect::Postgres);
    }
}
