//! Read-side cache of rendered views, keyed by view path.
//!
//! A view key (e.g. `/dashboard/invoices`) can hold several rendered
//! variants (one per query string). Invalidating the key drops all of them
//! and bumps its generation, so a render that started before the
//! invalidation cannot be stored afterwards.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Side-effecting "mark this view stale" command.
pub trait ViewCache: Send + Sync {
    fn invalidate(&self, view_key: &str);
}

impl<C> ViewCache for Arc<C>
where
    C: ViewCache + ?Sized,
{
    fn invalidate(&self, view_key: &str) {
        (**self).invalidate(view_key)
    }
}

/// Proof of which generation a render was computed against.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CacheTicket {
    generation: u64,
}

#[derive(Debug)]
struct Entry<V> {
    generation: u64,
    variants: HashMap<String, V>,
}

impl<V> Default for Entry<V> {
    fn default() -> Self {
        Self {
            generation: 0,
            variants: HashMap::new(),
        }
    }
}

/// In-memory view cache.
#[derive(Debug)]
pub struct InMemoryViewCache<V> {
    inner: RwLock<HashMap<String, Entry<V>>>,
}

impl<V> InMemoryViewCache<V> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }
}

impl<V> Default for InMemoryViewCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone> InMemoryViewCache<V> {
    pub fn get(&self, view_key: &str, variant: &str) -> Option<V> {
        let map = self.inner.read().ok()?;
        map.get(view_key)?.variants.get(variant).cloned()
    }

    /// Take a ticket before reading the data a view is rendered from.
    pub fn ticket(&self, view_key: &str) -> CacheTicket {
        CacheTicket {
            generation: self.generation(view_key),
        }
    }

    /// Store a rendered variant unless the view was invalidated since
    /// `ticket` was taken. Returns whether the value was stored.
    pub fn store(&self, view_key: &str, variant: &str, ticket: CacheTicket, value: V) -> bool {
        let Ok(mut map) = self.inner.write() else {
            return false;
        };
        let entry = map.entry(view_key.to_string()).or_default();
        if entry.generation != ticket.generation {
            return false;
        }
        entry.variants.insert(variant.to_string(), value);
        true
    }

    /// Number of invalidations seen for `view_key`.
    pub fn generation(&self, view_key: &str) -> u64 {
        match self.inner.read() {
            Ok(map) => map.get(view_key).map(|e| e.generation).unwrap_or(0),
            Err(_) => 0,
        }
    }
}

impl<V: Send + Sync> ViewCache for InMemoryViewCache<V> {
    fn invalidate(&self, view_key: &str) {
        if let Ok(mut map) = self.inner.write() {
            let entry = map.entry(view_key.to_string()).or_default();
            entry.generation += 1;
            entry.variants.clear();
            tracing::debug!(view_key, generation = entry.generation, "view invalidated");
        }
    }
}
