// src/cache/mod.rs

use crate::load::InputIdentity;
use serde::Serialize;
use std::{
    collections::{HashMap, VecDeque},
    sync::{
        atomic::{AtomicU64, Ordering},
        PoisonError, RwLock,
    },
};
use tracing::debug;

/// Bounded cache keyed by input content identity.
///
/// A value is computed at most once per identity while it stays cached; a new
/// identity always recomputes. When full, the oldest insertion is evicted.
pub struct ContentCache<V> {
    capacity: usize,
    state: RwLock<CacheState<V>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

struct CacheState<V> {
    entries: HashMap<InputIdentity, V>,
    order: VecDeque<InputIdentity>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

impl<V: Clone> ContentCache<V> {
    /// `capacity` is clamped to at least one entry.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            state: RwLock::new(CacheState {
                entries: HashMap::new(),
                order: VecDeque::new(),
            }),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn get(&self, id: &InputIdentity) -> Option<V> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.entries.get(id).cloned()
    }

    /// Return the cached value for `id`, or run `compute` and cache its `Ok`.
    /// Errors are returned and not cached.
    pub fn get_or_try_insert_with<E>(
        &self,
        id: &InputIdentity,
        compute: impl FnOnce() -> Result<V, E>,
    ) -> Result<V, E> {
        // 1) Fast path under the read lock
        if let Some(hit) = self.get(id) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!(id = id.short(), "cache hit");
            return Ok(hit);
        }

        // 2) Compute outside any lock
        self.misses.fetch_add(1, Ordering::Relaxed);
        debug!(id = id.short(), "cache miss");
        let value = compute()?;

        // 3) Insert; if another caller got there first keep theirs
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = state.entries.get(id) {
            return Ok(existing.clone());
        }
        while state.entries.len() >= self.capacity {
            match state.order.pop_front() {
                Some(oldest) => {
                    state.entries.remove(&oldest);
                    debug!(id = oldest.short(), "cache evict");
                }
                None => break,
            }
        }
        state.entries.insert(id.clone(), value.clone());
        state.order.push_back(id.clone());
        Ok(value)
    }

    pub fn get_or_insert_with(&self, id: &InputIdentity, compute: impl FnOnce() -> V) -> V {
        match self.get_or_try_insert_with(id, || Ok::<V, std::convert::Infallible>(compute())) {
            Ok(v) => v,
            Err(never) => match never {},
        }
    }

    /// Drop the entry for `id`; true if there was one.
    pub fn invalidate(&self, id: &InputIdentity) -> bool {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.order.retain(|k| k != id);
        state.entries.remove(id).is_some()
    }

    pub fn clear(&self) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.entries.clear();
        state.order.clear();
    }

    pub fn len(&self) -> usize {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}
