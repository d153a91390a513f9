//! Flowcache - client-side plumbing for workflow front-ends
//!
//! Provides a bounded document cache with TTL expiration and LRU eviction,
//! and a registry of named, cancellable streaming connections.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod stream;
pub mod tasks;

pub use api::AppState;
pub use cache::{CacheConfig, DocumentCache};
pub use config::Config;
pub use stream::{StreamCallbacks, StreamConnectionManager};
pub use tasks::spawn_sweep_task;
