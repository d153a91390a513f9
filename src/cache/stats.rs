//! Cache Statistics Module
//!
//! Tracks occupancy and hit, miss and eviction counters for the document cache.

use serde::Serialize;

// == Cache Stats ==
/// Cache occupancy and performance counters.
///
/// `entry_count` and `total_bytes` are maintained alongside every store
/// mutation and always equal a recomputation over the stored entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Current number of entries in the cache
    pub entry_count: usize,
    /// Sum of the sizes of all cached documents
    pub total_bytes: u64,
    /// Number of successful reads
    pub hits: u64,
    /// Number of failed reads (key absent or expired)
    pub misses: u64,
    /// Number of entries removed by LRU eviction, expiry sweeps or `clear`
    pub evictions: u64,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Hit rate as a percentage, `100 * hits / (hits + misses)`.
    ///
    /// Returns 0.0 if no reads have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64 * 100.0
        }
    }

    // == Average Entry Size ==
    /// Mean document size in bytes, or 0.0 when the cache is empty.
    pub fn avg_entry_size(&self) -> f64 {
        if self.entry_count == 0 {
            0.0
        } else {
            self.total_bytes as f64 / self.entry_count as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    // == Occupancy ==
    /// Accounts for an inserted entry of `size` bytes.
    pub fn record_insert(&mut self, size: u64) {
        self.entry_count += 1;
        self.total_bytes += size;
    }

    /// Accounts for a removed entry of `size` bytes.
    pub fn record_removal(&mut self, size: u64) {
        self.entry_count = self.entry_count.saturating_sub(1);
        self.total_bytes = self.total_bytes.saturating_sub(size);
    }

    /// Drops occupancy to zero after `removed` entries were cleared.
    ///
    /// Hit and miss counters survive a clear.
    pub fn record_clear(&mut self, removed: usize) {
        self.entry_count = 0;
        self.total_bytes = 0;
        self.evictions += removed as u64;
    }
}

// == Size Formatting ==
/// Formats a byte count for log lines, e.g. `1.5MB`.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit = 0;

    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }

    let rounded = (size * 100.0).round() / 100.0;
    format!("{}{}", rounded, UNITS[unit])
}
