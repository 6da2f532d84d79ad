//! Tiered scratch destinations for row scanning.
//!
//! Each bound column receives one pooled scratch cell for the duration of a
//! scan; unbound columns receive pooled discard cells that drop every write.
//! A checked-out cell is single-owner until returned, and every scan path —
//! success or error — returns all of its cells.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::ast::{Value, ValueKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tier {
    Int,
    UInt,
    Float,
    Bool,
    Temporal,
    /// Text and byte destinations share one buffer pool.
    Buffer,
    Dynamic(ValueKind),
    Discard,
}

fn tier_for(kind: ValueKind) -> Tier {
    match kind {
        ValueKind::Int => Tier::Int,
        ValueKind::UInt => Tier::UInt,
        ValueKind::Float => Tier::Float,
        ValueKind::Bool => Tier::Bool,
        ValueKind::Timestamp => Tier::Temporal,
        ValueKind::Text | ValueKind::Bytes => Tier::Buffer,
        other => Tier::Dynamic(other),
    }
}

/// One reusable scan destination.
#[derive(Debug)]
pub struct Scratch {
    value: Value,
    tier: Tier,
}

impl Scratch {
    fn fresh(tier: Tier) -> Self {
        Self {
            value: Value::Null,
            tier,
        }
    }

    /// Store a scanned column value. Discard cells drop the write.
    pub fn put(&mut self, value: Value) {
        if self.tier != Tier::Discard {
            self.value = value;
        }
    }

    /// Whether this cell belongs to an unbound column.
    pub fn is_discard(&self) -> bool {
        self.tier == Tier::Discard
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Move the scanned value out, leaving the cell reusable.
    pub(crate) fn take(&mut self) -> Value {
        std::mem::replace(&mut self.value, Value::Null)
    }

    /// Clear for reuse, keeping text/byte allocations alive.
    fn recycle(&mut self) {
        match &mut self.value {
            Value::Text(s) => s.clear(),
            Value::Bytes(b) => b.clear(),
            other => *other = Value::Null,
        }
    }
}

const TIER_CAP: usize = 64;

/// The tiered scratch pools.
#[derive(Debug, Default)]
pub struct ScratchPools {
    ints: Mutex<Vec<Scratch>>,
    uints: Mutex<Vec<Scratch>>,
    floats: Mutex<Vec<Scratch>>,
    bools: Mutex<Vec<Scratch>>,
    temporals: Mutex<Vec<Scratch>>,
    buffers: Mutex<Vec<Scratch>>,
    dynamic: Mutex<HashMap<ValueKind, Vec<Scratch>>>,
    discards: Mutex<Vec<Scratch>>,
    outstanding: AtomicUsize,
}

impl ScratchPools {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check out a destination cell for the given field kind.
    pub fn acquire(&self, kind: ValueKind) -> Scratch {
        let tier = tier_for(kind);
        self.outstanding.fetch_add(1, Ordering::Relaxed);
        let pooled = match tier {
            Tier::Int => self.ints.lock().ok().and_then(|mut v| v.pop()),
            Tier::UInt => self.uints.lock().ok().and_then(|mut v| v.pop()),
            Tier::Float => self.floats.lock().ok().and_then(|mut v| v.pop()),
            Tier::Bool => self.bools.lock().ok().and_then(|mut v| v.pop()),
            Tier::Temporal => self.temporals.lock().ok().and_then(|mut v| v.pop()),
            Tier::Buffer => self.buffers.lock().ok().and_then(|mut v| v.pop()),
            Tier::Dynamic(k) => self
                .dynamic
                .lock()
                .ok()
                .and_then(|mut m| m.get_mut(&k).and_then(|v| v.pop())),
            Tier::Discard => None,
        };
        pooled.unwrap_or_else(|| Scratch::fresh(tier))
    }

    /// Check out a discard cell for an unbound column.
    pub fn acquire_discard(&self) -> Scratch {
        self.outstanding.fetch_add(1, Ordering::Relaxed);
        self.discards
            .lock()
            .ok()
            .and_then(|mut v| v.pop())
            .unwrap_or_else(|| Scratch::fresh(Tier::Discard))
    }

    /// Return a cell to its pool.
    pub fn release(&self, mut scratch: Scratch) {
        scratch.recycle();
        self.outstanding.fetch_sub(1, Ordering::Relaxed);
        match scratch.tier {
            Tier::Int => push_capped(&self.ints, scratch),
            Tier::UInt => push_capped(&self.uints, scratch),
            Tier::Float => push_capped(&self.floats, scratch),
            Tier::Bool => push_capped(&self.bools, scratch),
            Tier::Temporal => push_capped(&self.temporals, scratch),
            Tier::Buffer => push_capped(&self.buffers, scratch),
            Tier::Discard => push_capped(&self.discards, scratch),
            Tier::Dynamic(k) => {
                if let Ok(mut m) = self.dynamic.lock() {
                    let pool = m.entry(k).or_default();
                    if pool.len() < TIER_CAP {
                        pool.push(scratch);
                    }
                }
            }
        }
    }

    /// Cells currently checked out. Zero after any balanced scan,
    /// including error paths.
    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::Relaxed)
    }
}

fn push_capped(pool: &Mutex<Vec<Scratch>>, scratch: Scratch) {
    if let Ok(mut v) = pool.lock() {
        if v.len() < TIER_CAP {
            v.push(scratch);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_release_balances() {
        let pools = ScratchPools::new();
        let a = pools.acquire(ValueKind::Int);
        let b = pools.acquire(ValueKind::Text);
        let c = pools.acquire_discard();
        assert_eq!(pools.outstanding(), 3);
        pools.release(a);
        pools.release(b);
        pools.release(c);
        assert_eq!(pools.outstanding(), 0);
    }

    #[test]
    fn test_discard_drops_writes() {
        let pools = ScratchPools::new();
        let mut cell = pools.acquire_discard();
        cell.put(Value::Int(9));
        assert!(cell.value().is_null());
        pools.release(cell);
    }

    #[test]
    fn test_recycled_cell_is_clean() {
        let pools = ScratchPools::new();
        let mut cell = pools.acquire(ValueKind::Int);
        cell.put(Value::Int(7));
        pools.release(cell);

        let cell = pools.acquire(ValueKind::Int);
        assert!(cell.value().is_null());
        pools.release(cell);
    }

    #[test]
    fn test_dynamic_tier_round_trip() {
        let pools = ScratchPools::new();
        let mut cell = pools.acquire(ValueKind::Json);
        cell.put(Value::Json(serde_json::json!({"k": 1})));
        pools.release(cell);
        assert_eq!(pools.outstanding(), 0);
    }
}
