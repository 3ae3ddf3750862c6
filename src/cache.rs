//! Result and regex caches.
//!
//! Two independent LRU caches: a result cache bounded per distinct source
//! collection and a global regex-compilation cache. Caching is strictly
//! opt-in; `clear()` is the only invalidation mechanism. The engine has no
//! notion of source-data mutation events, so staleness after a caller
//! mutates its collection is the caller's responsibility.
//!
//! Locks are taken only around get/insert and never held across evaluation
//! or user callbacks, so reentrant filter calls cannot deadlock.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use lru::LruCache;
use parking_lot::Mutex;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;

use crate::value::safe_regex;

/// Default result-cache entries per distinct source collection
pub const DEFAULT_RESULT_CAPACITY: usize = 100;

/// Default global regex-cache entries
pub const DEFAULT_REGEX_CAPACITY: usize = 500;

/// Cache hit/miss/eviction counters snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

#[derive(Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl Counters {
    fn snapshot(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }
}

fn bounded(capacity: usize) -> NonZeroUsize {
    NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN)
}

/// Key for one result-cache entry within a source collection: hashes of the
/// canonical expression JSON and the canonical option signature (which
/// includes `order_by` and `limit`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct ResultKey {
    pub expr: u64,
    pub options: u64,
}

/// LRU cache of filter results, bounded per distinct source collection.
pub struct ResultCache {
    inner: Mutex<HashMap<u64, LruCache<ResultKey, Arc<Vec<Value>>>>>,
    per_source_capacity: usize,
    counters: Counters,
}

impl ResultCache {
    pub fn new(per_source_capacity: usize) -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
            per_source_capacity,
            counters: Counters::default(),
        }
    }

    pub(crate) fn get(&self, source: u64, key: &ResultKey) -> Option<Arc<Vec<Value>>> {
        let mut inner = self.inner.lock();
        match inner.get_mut(&source).and_then(|lru| lru.get(key)) {
            Some(hit) => {
                self.counters.hits.fetch_add(1, Ordering::Relaxed);
                Some(Arc::clone(hit))
            }
            None => {
                self.counters.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    pub(crate) fn insert(&self, source: u64, key: ResultKey, value: Arc<Vec<Value>>) {
        let mut inner = self.inner.lock();
        let lru = inner
            .entry(source)
            .or_insert_with(|| LruCache::new(bounded(self.per_source_capacity)));
        if lru.push(key, value).is_some_and(|(evicted, _)| evicted != key) {
            self.counters.evictions.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Drop every cached result for every source collection
    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    /// Total cached entries across all sources
    pub fn len(&self) -> usize {
        self.inner.lock().values().map(|lru| lru.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        self.counters.snapshot()
    }
}

/// Global LRU cache of compiled regexes, keyed by (pattern, case flag).
pub struct RegexCache {
    inner: Mutex<LruCache<(String, bool), Arc<Regex>>>,
    counters: Counters,
}

impl RegexCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(LruCache::new(bounded(capacity))),
            counters: Counters::default(),
        }
    }

    /// Fetch a compiled regex, compiling and caching on miss. Invalid or
    /// oversized patterns return `None`; matchers treat that as non-match.
    pub fn get_or_compile(&self, pattern: &str, case_insensitive: bool) -> Option<Arc<Regex>> {
        let key = (pattern.to_string(), case_insensitive);
        if let Some(re) = self.inner.lock().get(&key) {
            self.counters.hits.fetch_add(1, Ordering::Relaxed);
            return Some(Arc::clone(re));
        }
        self.counters.misses.fetch_add(1, Ordering::Relaxed);

        // Compile outside the lock
        let re = Arc::new(safe_regex(pattern, case_insensitive).ok()?);
        let mut inner = self.inner.lock();
        if inner
            .push(key.clone(), Arc::clone(&re))
            .is_some_and(|(evicted, _)| evicted != key)
        {
            self.counters.evictions.fetch_add(1, Ordering::Relaxed);
        }
        Some(re)
    }

    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        self.counters.snapshot()
    }
}

/// Structural 64-bit hash of a JSON value. `serde_json` objects iterate in
/// sorted key order, so the hash is deterministic for equal values.
pub(crate) fn hash_value(value: &Value, hasher: &mut DefaultHasher) {
    match value {
        Value::Null => 0u8.hash(hasher),
        Value::Bool(b) => {
            1u8.hash(hasher);
            b.hash(hasher);
        }
        Value::Number(n) => {
            2u8.hash(hasher);
            n.as_f64().unwrap_or(0.0).to_bits().hash(hasher);
        }
        Value::String(s) => {
            3u8.hash(hasher);
            s.hash(hasher);
        }
        Value::Array(arr) => {
            4u8.hash(hasher);
            arr.len().hash(hasher);
            for v in arr {
                hash_value(v, hasher);
            }
        }
        Value::Object(map) => {
            5u8.hash(hasher);
            map.len().hash(hasher);
            for (k, v) in map {
                k.hash(hasher);
                hash_value(v, hasher);
            }
        }
    }
}

/// Fingerprint of a source collection: length plus the structural hash of
/// every record. Linear in the collection size, paid only on cached calls.
pub(crate) fn fingerprint_source(data: &[Value]) -> u64 {
    let mut hasher = DefaultHasher::new();
    data.len().hash(&mut hasher);
    for record in data {
        hash_value(record, &mut hasher);
    }
    hasher.finish()
}

pub(crate) fn hash_json(value: &Value) -> u64 {
    let mut hasher = DefaultHasher::new();
    hash_value(value, &mut hasher);
    hasher.finish()
}

pub(crate) fn hash_str(s: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    s.hash(&mut hasher);
    hasher.finish()
}
