//! LRU Selection Module
//!
//! Picks the eviction victim from the store by access recency.

use std::collections::HashMap;

use crate::cache::CacheEntry;

// == Least Recently Used ==
/// Returns the key with the smallest `access_seq`.
///
/// The store stamps every insert and every hit with a fresh sequence number, so
/// the order is strict even when several accesses share a clock millisecond.
/// Returns None if the store is empty.
pub fn least_recently_used(entries: &HashMap<String, CacheEntry>) -> Option<&str> {
    entries
        .iter()
        .min_by_key(|(_, entry)| entry.access_seq)
        .map(|(key, _)| key.as_str())
}
