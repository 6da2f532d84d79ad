//! ID-generator seam.
//!
//! Tags select a generator by name (`generator:uuid`); the implementations
//! (UUID, ULID, Snowflake, …) live outside this crate and register here.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::ast::Value;

/// Produces one new identifier value per call.
pub trait IdGenerator: Send + Sync {
    fn generate(&self) -> Value;
}

/// Name → generator registry.
#[derive(Default)]
pub struct GeneratorRegistry {
    map: RwLock<HashMap<String, Arc<dyn IdGenerator>>>,
}

impl GeneratorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a generator under a name, replacing any previous one.
    pub fn register(&self, name: impl Into<String>, generator: Arc<dyn IdGenerator>) {
        if let Ok(mut map) = self.map.write() {
            map.insert(name.into(), generator);
        }
    }

    /// Look up a generator by the name a tag references.
    pub fn get(&self, name: &str) -> Option<Arc<dyn IdGenerator>> {
        self.map.read().ok().and_then(|map| map.get(name).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed;

    impl IdGenerator for Fixed {
        fn generate(&self) -> Value {
            Value::Int(41)
        }
    }

    #[test]
    fn test_register_and_generate() {
        let registry = GeneratorRegistry::new();
        registry.register("fixed", Arc::new(Fixed));
        let generator = registry.get("fixed").unwrap();
        assert_eq!(generator.generate(), Value::Int(41));
        assert!(registry.get("uuid").is_none());
    }
}
