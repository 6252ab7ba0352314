//! Freshness-bounded report cache.
//!
//! One entry per key, overwritten on recompute. The lock is held only to
//! read or write an entry, never across the computation, so concurrent misses
//! on the same key may both compute; the last writer's timestamp wins.
//! Failed computations are not stored.

use super::filter::FilterSet;
use crate::domain::BreadthReport;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

struct Entry<V> {
    stored_at: Instant,
    value: Arc<V>,
}

pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: Mutex<HashMap<K, Entry<V>>>,
}

/// Reports keyed by filter combination; at most nine entries.
pub type ReportCache = TtlCache<FilterSet, BreadthReport>;

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone + std::fmt::Display,
{
    /// A zero `ttl` disables caching: every call computes.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// The cached value for `key` if younger than the TTL.
    pub fn get(&self, key: &K) -> Option<Arc<V>> {
        let entries = self.entries.lock();
        entries
            .get(key)
            .filter(|e| e.stored_at.elapsed() < self.ttl)
            .map(|e| Arc::clone(&e.value))
    }

    /// Return the fresh entry for `key`, or run `compute` and store its result.
    pub fn get_or_compute<E, F>(&self, key: &K, compute: F) -> Result<Arc<V>, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        if let Some(hit) = self.get(key) {
            debug!(%key, "cache hit");
            return Ok(hit);
        }

        debug!(%key, "cache miss, recomputing");
        let value = Arc::new(compute()?);
        if !self.ttl.is_zero() {
            self.entries.lock().insert(
                key.clone(),
                Entry {
                    stored_at: Instant::now(),
                    value: Arc::clone(&value),
                },
            );
        }
        Ok(value)
    }

    /// Drop every entry; the next call for any key recomputes.
    pub fn invalidate(&self) {
        self.entries.lock().clear();
    }

    /// Stored entries, stale ones included.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn cache(ttl_ms: u64) -> TtlCache<String, u32> {
        TtlCache::new(Duration::from_millis(ttl_ms))
    }

    #[test]
    fn hit_within_ttl_returns_same_arc() {
        let c = cache(60_000);
        let calls = Cell::new(0);
        let compute = || -> Result<u32, ()> {
            calls.set(calls.get() + 1);
            Ok(7)
        };
        let a = c.get_or_compute(&"k".to_string(), compute).unwrap();
        let b = c.get_or_compute(&"k".to_string(), compute).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn expired_entry_recomputes() {
        let c = cache(20);
        let a = c.get_or_compute(&"k".to_string(), || Ok::<_, ()>(1)).unwrap();
        std::thread::sleep(Duration::from_millis(40));
        let b = c.get_or_compute(&"k".to_string(), || Ok::<_, ()>(2)).unwrap();
        assert_eq!((*a, *b), (1, 2));
        assert_eq!(c.len(), 1);
    }

    #[test]
    fn keys_are_independent() {
        let c = cache(60_000);
        c.get_or_compute(&"a".to_string(), || Ok::<_, ()>(1)).unwrap();
        let b = c.get_or_compute(&"b".to_string(), || Ok::<_, ()>(2)).unwrap();
        assert_eq!(*b, 2);
        assert_eq!(c.len(), 2);
    }

    #[test]
    fn errors_are_not_cached() {
        let c = cache(60_000);
        let err = c.get_or_compute(&"k".to_string(), || Err::<u32, _>("down"));
        assert_eq!(err.unwrap_err(), "down");
        assert!(c.is_empty());
        let ok = c.get_or_compute(&"k".to_string(), || Ok::<_, &str>(3)).unwrap();
        assert_eq!(*ok, 3);
    }

    #[test]
    fn zero_ttl_never_stores() {
        let c = cache(0);
        let a = c.get_or_compute(&"k".to_string(), || Ok::<_, ()>(1)).unwrap();
        let b = c.get_or_compute(&"k".to_string(), || Ok::<_, ()>(1)).unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert!(c.is_empty());
    }

    #[test]
    fn invalidate_forces_recompute() {
        let c = cache(60_000);
        c.get_or_compute(&"k".to_string(), || Ok::<_, ()>(1)).unwrap();
        c.invalidate();
        assert!(c.get(&"k".to_string()).is_none());
    }

    #[test]
    fn report_cache_is_bounded_by_filter_space() {
        let c = ReportCache::new(Duration::from_secs(60));
        for _ in 0..3 {
            for filters in FilterSet::all() {
                c.get_or_compute(&filters, || Ok::<_, ()>(BreadthReport::default()))
                    .unwrap();
            }
        }
        assert_eq!(c.len(), 9);
    }
}
