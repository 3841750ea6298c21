//! Host-lifetime memo for expensive derived data.
//!
//! Brushes, matrix kernels and tile sets depend only on their parameters
//! and the image size, so a host that filters the same entity every frame
//! rebuilds them needlessly. The [`Workstore`] keeps them keyed by a
//! descriptive string and drops entries nobody has asked for within the
//! TTL. Purging happens at the start of each chain.
//!
//! Nothing in the store affects results: a miss rebuilds the same value.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, trace};

use crate::convolve::Kernel;
use crate::tiles::TileSet;

/// Default time-to-live for unused entries.
pub const DEFAULT_TTL: Duration = Duration::from_millis(3000);

/// A memoized value.
#[derive(Debug, Clone)]
enum StoreValue {
    Kernel(Arc<Kernel>),
    Tiles(Arc<TileSet>),
}

#[derive(Debug)]
struct StoreEntry {
    value: StoreValue,
    last_access: Instant,
}

/// TTL cache of kernels and tile sets.
#[derive(Debug)]
pub struct Workstore {
    entries: HashMap<String, StoreEntry>,
    ttl: Duration,
    hits: u64,
    misses: u64,
}

impl Default for Workstore {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl Workstore {
    /// Creates an empty store.
    pub fn new(ttl: Duration) -> Self {
        Self { entries: HashMap::new(), ttl, hits: 0, misses: 0 }
    }

    /// Entry time-to-live.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `(hits, misses)` since creation.
    pub fn stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }

    /// True if `key` is present.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Returns the kernel stored under `key`, building it on a miss.
    pub fn kernel<F>(&mut self, key: &str, build: F) -> Arc<Kernel>
    where
        F: FnOnce() -> Kernel,
    {
        if let Some(StoreValue::Kernel(k)) = self.touch(key) {
            return k;
        }
        let k = Arc::new(build());
        self.put(key, StoreValue::Kernel(Arc::clone(&k)));
        k
    }

    /// Returns the tile set stored under `key`, building it on a miss.
    pub fn tiles<F>(&mut self, key: &str, build: F) -> Arc<TileSet>
    where
        F: FnOnce() -> TileSet,
    {
        if let Some(StoreValue::Tiles(t)) = self.touch(key) {
            return t;
        }
        let t = Arc::new(build());
        self.put(key, StoreValue::Tiles(Arc::clone(&t)));
        t
    }

    /// Drops entries not accessed within the TTL. Returns how many went.
    pub fn purge(&mut self) -> usize {
        self.purge_at(Instant::now())
    }

    /// [`purge`](Self::purge) against an explicit clock reading.
    pub fn purge_at(&mut self, now: Instant) -> usize {
        let ttl = self.ttl;
        let before = self.entries.len();
        self.entries
            .retain(|_, e| now.saturating_duration_since(e.last_access) <= ttl);
        let removed = before - self.entries.len();
        if removed > 0 {
            debug!(removed, remaining = self.entries.len(), "workstore purge");
        }
        removed
    }

    /// Removes everything.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    fn touch(&mut self, key: &str) -> Option<StoreValue> {
        match self.entries.get_mut(key) {
            Some(e) => {
                e.last_access = Instant::now();
                self.hits += 1;
                trace!(key, "workstore hit");
                Some(e.value.clone())
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    fn put(&mut self, key: &str, value: StoreValue) {
        trace!(key, "workstore insert");
        self.entries
            .insert(key.to_string(), StoreEntry { value, last_access: Instant::now() });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kernel_built_once() {
        let mut store = Workstore::default();
        let mut builds = 0;
        for _ in 0..3 {
            store.kernel("k", || {
                builds += 1;
                Kernel::identity()
            });
        }
        assert_eq!(builds, 1);
        assert_eq!(store.stats(), (2, 1));
    }

    #[test]
    fn test_purge_drops_stale_entries() {
        let mut store = Workstore::new(Duration::from_millis(100));
        store.tiles("t", || vec![vec![0]]);
        assert_eq!(store.purge_at(Instant::now()), 0);
        assert_eq!(store.purge_at(Instant::now() + Duration::from_secs(1)), 1);
        assert!(store.is_empty());
    }

    #[test]
    fn test_kind_mismatch_rebuilds() {
        let mut store = Workstore::default();
        store.tiles("x", Vec::new);
        let k = store.kernel("x", Kernel::identity);
        assert_eq!(k.len(), 1);
        assert!(store.contains("x"));
    }
}
