//! Metadata cache: a permanent warm set for types registered at startup,
//! backed by a bounded eviction cache for everything else.

use std::any::{Any, TypeId};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, OnceLock, RwLock};

use crate::error::{OrmError, OrmResult};
use crate::meta::naming::NamingStrategy;
use crate::meta::{Entity, EntityMeta};
use crate::scan::registry::ScannerRegistry;

type AnyMeta = Arc<dyn Any + Send + Sync>;

const DEFAULT_CAPACITY: usize = 256;

#[derive(Default)]
struct Bounded {
    map: HashMap<TypeId, AnyMeta>,
    order: VecDeque<TypeId>,
}

/// Per-process metadata cache.
///
/// Lookup order: the frozen warm set (lock-free reads), then the bounded
/// cache, then a full build. Duplicate concurrent first builds are safe:
/// last write wins and both results are equivalent.
pub struct MetaCache {
    staging: Mutex<HashMap<TypeId, AnyMeta>>,
    warm: OnceLock<HashMap<TypeId, AnyMeta>>,
    cache: RwLock<Bounded>,
    capacity: usize,
}

impl Default for MetaCache {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl MetaCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            staging: Mutex::new(HashMap::new()),
            warm: OnceLock::new(),
            cache: RwLock::new(Bounded::default()),
            capacity: capacity.max(1),
        }
    }

    /// Build `R`'s metadata now and pin it permanently.
    ///
    /// Must happen before the first introspection freezes the warm set.
    pub fn prewarm<R: Entity>(
        &self,
        naming: &dyn NamingStrategy,
        scanners: &ScannerRegistry,
    ) -> OrmResult<()> {
        if self.warm.get().is_some() {
            return Err(OrmError::construction(
                R::entity_name(),
                "warm set is already frozen; prewarm before the first introspection",
            ));
        }
        let meta: Arc<EntityMeta<R>> = Arc::new(EntityMeta::build(naming, scanners)?);
        if let Ok(mut staging) = self.staging.lock() {
            staging.insert(TypeId::of::<R>(), Arc::new(meta));
        }
        Ok(())
    }

    /// Look up or build `R`'s metadata.
    pub fn introspect<R: Entity>(
        &self,
        naming: &dyn NamingStrategy,
        scanners: &ScannerRegistry,
    ) -> OrmResult<Arc<EntityMeta<R>>> {
        let id = TypeId::of::<R>();

        // First introspection freezes the warm set.
        let warm = self.warm.get_or_init(|| {
            self.staging
                .lock()
                .map(|mut staging| std::mem::take(&mut *staging))
                .unwrap_or_default()
        });
        if let Some(found) = warm.get(&id) {
            return downcast::<R>(found);
        }

        if let Ok(cache) = self.cache.read() {
            if let Some(found) = cache.map.get(&id) {
                return downcast::<R>(found);
            }
        }

        let meta: Arc<EntityMeta<R>> = Arc::new(EntityMeta::build(naming, scanners)?);
        if let Ok(mut cache) = self.cache.write() {
            if !cache.map.contains_key(&id) {
                while cache.map.len() >= self.capacity {
                    match cache.order.pop_front() {
                        Some(evicted) => {
                            cache.map.remove(&evicted);
                        }
                        None => break,
                    }
                }
                cache.order.push_back(id);
            }
            cache.map.insert(id, Arc::new(meta.clone()));
        }
        Ok(meta)
    }

    /// Number of entries in the bounded cache (warm set excluded).
    pub fn cached_len(&self) -> usize {
        self.cache.read().map(|c| c.map.len()).unwrap_or(0)
    }

    /// Number of permanently pinned entries.
    pub fn warm_len(&self) -> usize {
        self.warm.get().map(|w| w.len()).unwrap_or(0)
    }
}

fn downcast<R: Entity>(found: &AnyMeta) -> OrmResult<Arc<EntityMeta<R>>> {
    found
        .downcast_ref::<Arc<EntityMeta<R>>>()
        .cloned()
        .ok_or_else(|| {
            OrmError::construction(R::entity_name(), "metadata cache entry has a foreign type")
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::{EntityBuilder, SnakeCaseNaming};

    macro_rules! test_entity {
        ($name:ident, $table:literal) => {
            #[derive(Default)]
            struct $name {
                id: i64,
            }

            impl Entity for $name {
                fn entity_name() -> &'static str {
                    stringify!($name)
                }

                fn describe(schema: &mut EntityBuilder<Self>) {
                    schema
                        .table($table)
                        .field::<i64>("id", "primary", |r, v| r.id = v);
                }
            }
        };
    }

    test_entity!(Alpha, "alphas");
    test_entity!(Beta, "betas");
    test_entity!(Gamma, "gammas");

    #[test]
    fn test_prewarm_then_introspect() {
        let cache = MetaCache::new();
        let naming = SnakeCaseNaming;
        let scanners = ScannerRegistry::new();

        cache.prewarm::<Alpha>(&naming, &scanners).unwrap();
        let meta = cache.introspect::<Alpha>(&naming, &scanners).unwrap();
        assert_eq!(meta.table, "alphas");
        assert_eq!(cache.warm_len(), 1);
        assert_eq!(cache.cached_len(), 0);

        // Frozen now: late prewarm is a construction error.
        assert!(cache.prewarm::<Beta>(&naming, &scanners).is_err());
    }

    #[test]
    fn test_cached_meta_is_shared() {
        let cache = MetaCache::new();
        let naming = SnakeCaseNaming;
        let scanners = ScannerRegistry::new();

        let a = cache.introspect::<Alpha>(&naming, &scanners).unwrap();
        let b = cache.introspect::<Alpha>(&naming, &scanners).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.cached_len(), 1);
    }

    #[test]
    fn test_bounded_eviction() {
        let cache = MetaCache::with_capacity(2);
        let naming = SnakeCaseNaming;
        let scanners = ScannerRegistry::new();

        cache.introspect::<Alpha>(&naming, &scanners).unwrap();
        cache.introspect::<Beta>(&naming, &scanners).unwrap();
        cache.introspect::<Gamma>(&naming, &scanners).unwrap();
        assert_eq!(cache.cached_len(), 2);
    }
}
