//! Compiled-query cache keyed by structural fingerprint.

use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// A compiled statement: SQL text plus the number of placeholder arguments
/// the canonical depth-first walk produces for this shape.
#[derive(Debug, Clone)]
pub struct CachedQuery {
    pub sql: Arc<str>,
    pub arg_count: usize,
}

/// Hit/miss counters, observable in tests and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

/// Concurrent fingerprint → compiled-SQL cache.
#[derive(Debug, Default)]
pub struct QueryCache {
    entries: RwLock<HashMap<u64, CachedQuery>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a fingerprint, counting the hit or miss.
    pub fn get(&self, fingerprint: u64) -> Option<CachedQuery> {
        let entry = self
            .entries
            .read()
            .ok()
            .and_then(|map| map.get(&fingerprint).cloned());
        match &entry {
            Some(_) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(fingerprint, "query cache miss");
            }
        }
        entry
    }

    /// Publish a compiled statement. Concurrent duplicate compiles are
    /// benign: last write wins and both results are equivalent.
    pub fn insert(&self, fingerprint: u64, sql: Arc<str>, arg_count: usize) {
        if let Ok(mut map) = self.entries.write() {
            map.insert(fingerprint, CachedQuery { sql, arg_count });
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        if let Ok(mut map) = self.entries.write() {
            map.clear();
        }
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.len(),
        }
    }
}
