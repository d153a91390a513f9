//! Document Cache Module
//!
//! Main cache engine: a key to document map bounded by entry count and total
//! bytes, with LRU eviction and TTL expiry.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tracing::{debug, info};

use crate::cache::lru::least_recently_used;
use crate::cache::stats::format_size;
use crate::cache::{CacheEntry, CacheStats, Clock, EntryInfo, SystemClock};

// == Cache Config ==
/// Bounds applied by a `DocumentCache`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Upper bound on the sum of cached document sizes
    pub max_bytes: u64,
    /// Upper bound on the number of cached documents
    pub max_entries: usize,
    /// Maximum age of an entry, measured from insertion
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_bytes: 100 * 1024 * 1024,
            max_entries: 50,
            ttl: Duration::from_secs(30 * 60),
        }
    }
}

// == Document Cache ==
/// In-memory document cache with LRU eviction and TTL support.
///
/// No operation fails: absent and expired reads are reported as `None`.
#[derive(Debug)]
pub struct DocumentCache {
    /// Key to document storage
    entries: HashMap<String, CacheEntry>,
    /// Occupancy and performance counters
    stats: CacheStats,
    max_bytes: u64,
    max_entries: usize,
    ttl_ms: u64,
    /// Last access sequence handed out; bumped on every insert and hit
    access_seq: u64,
    clock: Arc<dyn Clock>,
}

impl DocumentCache {
    // == Constructor ==
    /// Creates a cache bounded by `config`, reading wall-clock time.
    pub fn new(config: CacheConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Creates a cache bounded by `config` that reads time from `clock`.
    pub fn with_clock(config: CacheConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: HashMap::new(),
            stats: CacheStats::new(),
            max_bytes: config.max_bytes,
            max_entries: config.max_entries,
            ttl_ms: config.ttl.as_millis() as u64,
            access_seq: 0,
            clock,
        }
    }

    // == Get ==
    /// Retrieves a document by key.
    ///
    /// A hit bumps the entry's access count and recency. Expired entries are
    /// removed and counted as misses.
    pub fn get(&mut self, key: &str) -> Option<Bytes> {
        let now = self.clock.now_ms();

        let expired = match self.entries.get(key) {
            None => {
                self.stats.record_miss();
                debug!(key, "Cache miss");
                return None;
            }
            Some(entry) => entry.is_expired(now, self.ttl_ms),
        };

        if expired {
            self.remove_entry(key);
            self.stats.record_miss();
            debug!(key, "Cache entry expired on read");
            return None;
        }

        let seq = self.next_access_seq();
        let entry = self.entries.get_mut(key)?;
        entry.touch(now, seq);
        self.stats.record_hit();
        debug!(key, access_count = entry.access_count, "Cache hit");
        Some(entry.data.clone())
    }

    // == Set ==
    /// Stores a document, replacing any previous document under `key`.
    ///
    /// Least recently used entries are evicted one at a time, rechecking the
    /// bounds after each eviction, until the new document fits. A cache that
    /// cannot hold the document at all (zero entries allowed, or a document
    /// larger than `max_bytes`) evicts it again immediately.
    pub fn set(&mut self, key: impl Into<String>, data: Bytes) {
        let key = key.into();
        let now = self.clock.now_ms();
        let size = data.len() as u64;

        // Replacing is not an eviction; drop the old contribution first. An
        // overwrite at capacity therefore never evicts another document.
        self.remove_entry(&key);

        while !self.entries.is_empty()
            && (self.entries.len() >= self.max_entries
                || self.stats.total_bytes + size > self.max_bytes)
        {
            self.evict_lru();
        }

        let seq = self.next_access_seq();
        self.entries.insert(key.clone(), CacheEntry::new(data, now, seq));
        self.stats.record_insert(size);

        while !self.entries.is_empty()
            && (self.entries.len() > self.max_entries || self.stats.total_bytes > self.max_bytes)
        {
            self.evict_lru();
        }

        debug!(
            key = %key,
            size = %format_size(size),
            entries = self.stats.entry_count,
            total = %format_size(self.stats.total_bytes),
            hit_rate = self.stats.hit_rate(),
            "Cached document"
        );
    }

    // == Has ==
    /// Returns true if `key` is present and not expired.
    ///
    /// Does not touch stats or recency.
    pub fn has(&self, key: &str) -> bool {
        let now = self.clock.now_ms();
        self.entries
            .get(key)
            .is_some_and(|entry| !entry.is_expired(now, self.ttl_ms))
    }

    // == Delete ==
    /// Removes a document by key. Returns whether anything was removed.
    pub fn delete(&mut self, key: &str) -> bool {
        let removed = self.remove_entry(key);
        if removed {
            debug!(key, "Removed from cache");
        }
        removed
    }

    // == Clear ==
    /// Empties the cache, counting every removed entry as an eviction.
    ///
    /// Returns the number of entries removed.
    pub fn clear(&mut self) -> usize {
        let removed = self.entries.len();
        self.entries.clear();
        self.stats.record_clear(removed);
        info!("Cache cleared ({} entries removed)", removed);
        removed
    }

    // == Stats ==
    /// Returns a snapshot of the cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.stats.clone()
    }

    // == Purge Expired ==
    /// Removes every entry older than the TTL.
    ///
    /// Each removal counts as an eviction. Returns the number of entries removed.
    pub fn purge_expired(&mut self) -> usize {
        let now = self.clock.now_ms();
        let ttl_ms = self.ttl_ms;
        let expired_keys: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(now, ttl_ms))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired_keys {
            if self.remove_entry(key) {
                self.stats.record_eviction();
            }
        }

        expired_keys.len()
    }

    /// Metadata for a cached document, without counting as a read.
    pub fn entry_info(&self, key: &str) -> Option<EntryInfo> {
        self.entries.get(key).map(CacheEntry::info)
    }

    /// Cached keys in sorted order, expired or not.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Configured upper bound on total cached bytes.
    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    // == Length ==
    /// Returns the current number of entries in the cache.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn next_access_seq(&mut self) -> u64 {
        self.access_seq += 1;
        self.access_seq
    }

    fn remove_entry(&mut self, key: &str) -> bool {
        match self.entries.remove(key) {
            Some(entry) => {
                self.stats.record_removal(entry.size_bytes);
                true
            }
            None => false,
        }
    }

    fn evict_lru(&mut self) {
        let Some(victim) = least_recently_used(&self.entries).map(str::to_owned) else {
            return;
        };
        if self.remove_entry(&victim) {
            self.stats.record_eviction();
            debug!(key = %victim, "Evicted LRU document");
        }
    }

    /// Recomputes occupancy from the stored entries.
    #[cfg(test)]
    pub(crate) fn recomputed_occupancy(&self) -> (usize, u64) {
        let bytes = self.entries.values().map(|entry| entry.size_bytes).sum();
        (self.entries.len(), bytes)
    }
}

impl Default for DocumentCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}
