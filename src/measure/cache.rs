//! Bounded LRU caches for rendered markup and measured dimensions

use super::{Dimensions, RenderedBox};
use crate::document::NodeId;
use lru::LruCache;
use rustc_hash::FxHasher;
use std::borrow::Borrow;
use std::hash::{BuildHasherDefault, Hash};
use std::num::NonZeroUsize;
use std::rc::Rc;

type CacheHasher = BuildHasherDefault<FxHasher>;

/// Default number of entries kept per table
pub const DEFAULT_CACHE_CAPACITY: usize = 100;

/// Hit and miss counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// An `lru::LruCache` that counts its hits, misses and evictions
#[derive(Debug)]
pub struct CountingLru<K: Hash + Eq, V> {
    inner: LruCache<K, V, CacheHasher>,
    stats: CacheStats,
}

impl<K, V> CountingLru<K, V>
where
    K: Hash + Eq,
{
    /// Create a cache holding at most `capacity` entries (at least one)
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: LruCache::with_hasher(capacity, CacheHasher::default()),
            stats: CacheStats::default(),
        }
    }

    /// Look up `key`, marking it most recently used
    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let found = self.inner.get(key);
        if found.is_some() {
            self.stats.hits += 1;
        } else {
            self.stats.misses += 1;
        }
        found
    }

    /// Whether `key` is cached, without touching recency or statistics
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.contains(key)
    }

    /// Insert or replace an entry, evicting the least recently used one when full
    pub fn insert(&mut self, key: K, value: V) {
        let replacing = self.inner.contains(&key);
        if self.inner.push(key, value).is_some() && !replacing {
            self.stats.evictions += 1;
        }
    }

    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.pop(key)
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.inner.cap().get()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}

/// The three measurement tables owned by an engine instance
#[derive(Debug)]
pub struct MeasurementCache {
    /// Canonical subtree JSON to rendered markup
    pub(crate) markup: CountingLru<String, Rc<str>>,
    /// Markup to natural dimensions
    pub(crate) dimensions: CountingLru<Rc<str>, Dimensions>,
    /// Markup plus element id to the element's box
    pub(crate) elements: CountingLru<(Rc<str>, NodeId), RenderedBox>,
}

impl MeasurementCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            markup: CountingLru::new(capacity),
            dimensions: CountingLru::new(capacity),
            elements: CountingLru::new(capacity),
        }
    }

    pub fn clear(&mut self) {
        self.markup.clear();
        self.dimensions.clear();
        self.elements.clear();
    }

    pub fn markup_stats(&self) -> CacheStats {
        self.markup.stats()
    }

    pub fn dimension_stats(&self) -> CacheStats {
        self.dimensions.stats()
    }

    pub fn element_stats(&self) -> CacheStats {
        self.elements.stats()
    }

    /// Largest entry count across the tables
    pub fn max_len(&self) -> usize {
        self.markup
            .len()
            .max(self.dimensions.len())
            .max(self.elements.len())
    }

    pub fn capacity(&self) -> usize {
        self.markup.capacity()
    }
}

impl Default for MeasurementCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}
