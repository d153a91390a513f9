//! Cache Entry Module
//!
//! Defines a single cached document together with its access bookkeeping.

use bytes::Bytes;
use serde::Serialize;

// == Cache Entry ==
/// A cached document and its metadata.
///
/// Entries are owned by the store and replaced wholesale when a key is set again.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The cached document bytes
    pub data: Bytes,
    /// Creation timestamp (Unix milliseconds)
    pub created_at: u64,
    /// Last successful read (Unix milliseconds)
    pub last_accessed_at: u64,
    /// Store-wide access sequence of the insert or latest read, used for LRU order
    pub access_seq: u64,
    /// Number of reads, starting at 1 for the insert itself
    pub access_count: u64,
    /// Size of `data` in bytes
    pub size_bytes: u64,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a fresh entry stamped with `now` and access sequence `seq`.
    pub fn new(data: Bytes, now: u64, seq: u64) -> Self {
        let size_bytes = data.len() as u64;
        Self {
            data,
            created_at: now,
            last_accessed_at: now,
            access_seq: seq,
            access_count: 1,
            size_bytes,
        }
    }

    // == Is Expired ==
    /// Checks whether the entry has outlived `ttl_ms`.
    ///
    /// An entry is expired once its age is strictly greater than the TTL, so an
    /// entry read at exactly `created_at + ttl_ms` is still served.
    pub fn is_expired(&self, now: u64, ttl_ms: u64) -> bool {
        now.saturating_sub(self.created_at) > ttl_ms
    }

    // == Touch ==
    /// Records a read at `now` with access sequence `seq`.
    pub fn touch(&mut self, now: u64, seq: u64) {
        self.access_count += 1;
        self.last_accessed_at = now;
        self.access_seq = seq;
    }

    /// Age of the entry in milliseconds.
    pub fn age_ms(&self, now: u64) -> u64 {
        now.saturating_sub(self.created_at)
    }

    /// Metadata view without the payload.
    pub fn info(&self) -> EntryInfo {
        EntryInfo {
            size_bytes: self.size_bytes,
            access_count: self.access_count,
            created_at: self.created_at,
            last_accessed_at: self.last_accessed_at,
        }
    }
}

/// Entry metadata returned by `DocumentCache::entry_info`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EntryInfo {
    pub size_bytes: u64,
    pub access_count: u64,
    pub created_at: u64,
    pub last_accessed_at: u64,
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_creation() {
        let entry = CacheEntry::new(Bytes::from_static(b"hello"), 1_000, 1);

        assert_eq!(entry.data, Bytes::from_static(b"hello"));
        assert_eq!(entry.size_bytes, 5);
        assert_eq!(entry.access_count, 1);
        assert_eq!(entry.created_at, 1_000);
        assert_eq!(entry.last_accessed_at, 1_000);
    }

    #[test]
    fn test_entry_touch_updates_recency() {
        let mut entry = CacheEntry::new(Bytes::from_static(b"x"), 1_000, 1);
        entry.touch(1_500, 2);

        assert_eq!(entry.access_count, 2);
        assert_eq!(entry.last_accessed_at, 1_500);
        assert_eq!(entry.access_seq, 2);
        // Creation time is untouched so TTL is measured from insert
        assert_eq!(entry.created_at, 1_000);
    }

    #[test]
    fn test_expiration_boundary_condition() {
        let entry = CacheEntry::new(Bytes::from_static(b"x"), 1_000, 1);

        assert!(!entry.is_expired(1_000, 0));
        assert!(!entry.is_expired(1_060, 60));
        assert!(entry.is_expired(1_061, 60));
    }

    #[test]
    fn test_clock_behind_creation_is_not_expired() {
        let entry = CacheEntry::new(Bytes::from_static(b"x"), 5_000, 1);
        assert!(!entry.is_expired(4_000, 10));
        assert_eq!(entry.age_ms(4_000), 0);
    }

    #[test]
    fn test_entry_info() {
        let mut entry = CacheEntry::new(Bytes::from(vec![0u8; 64]), 10, 1);
        entry.touch(20, 2);

        let info = entry.info();
        assert_eq!(info.size_bytes, 64);
        assert_eq!(info.access_count, 2);
        assert_eq!(info.last_accessed_at, 20);
    }
}
