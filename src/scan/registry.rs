//! Custom scanner registry.
//!
//! A registered scanner replaces the default bind/scan pipeline for its
//! record type; the zero-argument type parameter plays the role of the
//! registration key.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::error::OrmResult;
use crate::row::RowSource;

/// A custom whole-row scanner for one record type.
pub type ScanFn<R> = Arc<dyn Fn(&mut R, &dyn RowSource) -> OrmResult<()> + Send + Sync>;

/// Type-keyed registry of custom scanners.
#[derive(Default)]
pub struct ScannerRegistry {
    map: RwLock<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>,
}

impl ScannerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a scanner for `R`, replacing any previous one.
    pub fn register<R: 'static>(
        &self,
        scan: impl Fn(&mut R, &dyn RowSource) -> OrmResult<()> + Send + Sync + 'static,
    ) {
        let boxed: ScanFn<R> = Arc::new(scan);
        if let Ok(mut map) = self.map.write() {
            map.insert(TypeId::of::<R>(), Arc::new(boxed));
        }
    }

    /// Look up the scanner registered for `R`, if any.
    pub fn get<R: 'static>(&self) -> Option<ScanFn<R>> {
        self.map
            .read()
            .ok()
            .and_then(|map| map.get(&TypeId::of::<R>()).cloned())
            .and_then(|any| any.downcast_ref::<ScanFn<R>>().cloned())
    }

    pub fn len(&self) -> usize {
        self.map.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
