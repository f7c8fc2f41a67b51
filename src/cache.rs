//! Bounded least-recently-used cache for ranked results.
//!
//! [`LruCache`] keeps its entries in a slab of nodes threaded on an
//! index-linked list (head = most recent, tail = least recent) plus a hash
//! map from key to slot, so lookup, promotion and eviction are all O(1).
//! Slots are never freed individually: once the cache is full, the evicted
//! tail slot is reused for the incoming entry.
//!
//! [`ResultCache`] wraps one behind a mutex for shared use by concurrent
//! searches.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Mutex;

use serde::Serialize;
use tracing::debug;

const NIL: usize = usize::MAX;

struct Node<K, V> {
    key: K,
    value: V,
    prev: usize,
    next: usize,
}

/// Hit/miss counters and occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// `hits / (hits + misses)`, 0.0 before any lookup.
    pub hit_rate: f64,
    pub size: usize,
    pub capacity: usize,
}

impl CacheStats {
    pub fn total(&self) -> u64 {
        self.hits + self.misses
    }
}

impl std::fmt::Display for CacheStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "requests: {}, hits: {}, misses: {}, hit rate: {:.2}%, size: {}/{}",
            self.total(),
            self.hits,
            self.misses,
            self.hit_rate * 100.0,
            self.size,
            self.capacity
        )
    }
}

// ─── LruCache ───────────────────────────────────────────────────────

/// Fixed-capacity cache evicting the least recently used entry. Both `get`
/// hits and `put` count as use.
pub struct LruCache<K, V> {
    map: HashMap<K, usize>,
    nodes: Vec<Node<K, V>>,
    head: usize,
    tail: usize,
    capacity: usize,
    hits: u64,
    misses: u64,
}

impl<K: Hash + Eq + Clone, V> LruCache<K, V> {
    pub fn new(capacity: usize) -> Self {
        Self {
            map: HashMap::with_capacity(capacity),
            nodes: Vec::with_capacity(capacity),
            head: NIL,
            tail: NIL,
            capacity,
            hits: 0,
            misses: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Look up `key`. A hit promotes the entry and counts a hit; a miss
    /// counts a miss and leaves the order alone.
    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        match self.map.get(key).copied() {
            Some(idx) => {
                self.hits += 1;
                self.promote(idx);
                Some(&self.nodes[idx].value)
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Presence check that neither counts nor promotes.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.map.contains_key(key)
    }

    /// Insert or overwrite `key` as the most recent entry. Returns the key
    /// evicted to make room, if any.
    pub fn put(&mut self, key: K, value: V) -> Option<K> {
        if self.capacity == 0 {
            return None;
        }
        if let Some(&idx) = self.map.get(&key) {
            self.nodes[idx].value = value;
            self.promote(idx);
            return None;
        }

        if self.map.len() < self.capacity {
            let idx = self.nodes.len();
            self.nodes.push(Node { key: key.clone(), value, prev: NIL, next: NIL });
            self.push_front(idx);
            self.map.insert(key, idx);
            return None;
        }

        // Full: recycle the tail slot.
        let idx = self.tail;
        self.unlink(idx);
        let node = &mut self.nodes[idx];
        let evicted = std::mem::replace(&mut node.key, key.clone());
        node.value = value;
        self.map.remove(&evicted);
        self.map.insert(key, idx);
        self.push_front(idx);
        Some(evicted)
    }

    /// Keys from most to least recently used.
    pub fn keys_by_recency(&self) -> Vec<K> {
        let mut keys = Vec::with_capacity(self.len());
        let mut cur = self.head;
        while cur != NIL {
            keys.push(self.nodes[cur].key.clone());
            cur = self.nodes[cur].next;
        }
        keys
    }

    pub fn stats(&self) -> CacheStats {
        let total = self.hits + self.misses;
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            hit_rate: if total == 0 { 0.0 } else { self.hits as f64 / total as f64 },
            size: self.len(),
            capacity: self.capacity,
        }
    }

    /// Zero the counters; entries stay.
    pub fn reset_stats(&mut self) {
        self.hits = 0;
        self.misses = 0;
    }

    pub fn clear(&mut self) {
        self.map.clear();
        self.nodes.clear();
        self.head = NIL;
        self.tail = NIL;
    }

    // ─── list plumbing ───

    fn promote(&mut self, idx: usize) {
        if self.head != idx {
            self.unlink(idx);
            self.push_front(idx);
        }
    }

    fn unlink(&mut self, idx: usize) {
        let (prev, next) = (self.nodes[idx].prev, self.nodes[idx].next);
        if prev == NIL {
            self.head = next;
        } else {
            self.nodes[prev].next = next;
        }
        if next == NIL {
            self.tail = prev;
        } else {
            self.nodes[next].prev = prev;
        }
        self.nodes[idx].prev = NIL;
        self.nodes[idx].next = NIL;
    }

    fn push_front(&mut self, idx: usize) {
        self.nodes[idx].prev = NIL;
        self.nodes[idx].next = self.head;
        if self.head != NIL {
            self.nodes[self.head].prev = idx;
        }
        self.head = idx;
        if self.tail == NIL {
            self.tail = idx;
        }
    }
}

// ─── ResultCache ────────────────────────────────────────────────────

/// Thread-safe question → ranked paths cache. Every operation takes the one
/// internal lock.
pub struct ResultCache {
    inner: Mutex<LruCache<String, Vec<String>>>,
}

impl ResultCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Cache key for a question: surrounding whitespace is ignored.
    pub fn normalize(question: &str) -> &str {
        question.trim()
    }

    pub fn get(&self, question: &str) -> Option<Vec<String>> {
        let mut cache = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        cache.get(Self::normalize(question)).cloned()
    }

    pub fn put(&self, question: &str, results: Vec<String>) {
        let mut cache = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(evicted) = cache.put(Self::normalize(question).to_string(), results) {
            debug!(evicted = %evicted, "Result cache full, evicted least recently used query");
        }
    }

    pub fn stats(&self) -> CacheStats {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).stats()
    }

    pub fn reset_stats(&self) {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).reset_stats();
    }

    pub fn clear(&self) {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod tests;
