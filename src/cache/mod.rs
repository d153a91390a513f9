//! Cache Module
//!
//! Provides a bounded in-memory document cache with TTL expiration and LRU eviction.

mod clock;
mod entry;
mod lru;
mod stats;
mod store;


// Re-export public types
pub use clock::{current_timestamp_ms, Clock, ManualClock, SystemClock};
pub use entry::{CacheEntry, EntryInfo};
pub use lru::least_recently_used;
pub use stats::{format_size, CacheStats};
pub use store::{CacheConfig, DocumentCache};

/// A cache shared between request handlers and the expiry sweep.
pub type SharedDocumentCache = std::sync::Arc<tokio::sync::RwLock<DocumentCache>>;
