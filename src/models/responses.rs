//! Response DTOs for the inspection API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::CacheStats;
use crate::stream::{ConnectionInfo, ConnectionState};

/// Response body for `PUT /cache/documents/*key`
#[derive(Debug, Clone, Serialize)]
pub struct SetResponse {
    /// Success message
    pub message: String,
    /// The key that was set
    pub key: String,
    /// Size of the stored document
    pub size_bytes: u64,
}

impl SetResponse {
    /// Creates a new SetResponse
    pub fn new(key: impl Into<String>, size_bytes: u64) -> Self {
        let key = key.into();
        Self {
            message: format!("Document '{}' cached", key),
            key,
            size_bytes,
        }
    }
}

/// Response body for `DELETE /cache/documents/*key`
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    /// Success message
    pub message: String,
    /// The key that was deleted
    pub key: String,
}

impl DeleteResponse {
    /// Creates a new DeleteResponse
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Document '{}' removed", key),
            key,
        }
    }
}

/// Response body for `DELETE /cache`
#[derive(Debug, Clone, Serialize)]
pub struct ClearResponse {
    /// Number of documents removed
    pub removed: usize,
}

/// Response body for `GET /cache/stats`
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub entry_count: usize,
    pub total_bytes: u64,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    /// Percentage of reads that hit
    pub hit_rate: f64,
    /// Mean document size in bytes
    pub avg_entry_size: f64,
}

impl From<CacheStats> for StatsResponse {
    fn from(stats: CacheStats) -> Self {
        Self {
            hit_rate: stats.hit_rate(),
            avg_entry_size: stats.avg_entry_size(),
            entry_count: stats.entry_count,
            total_bytes: stats.total_bytes,
            hits: stats.hits,
            misses: stats.misses,
            evictions: stats.evictions,
        }
    }
}

/// Response body for `GET /connections`
#[derive(Debug, Clone, Serialize)]
pub struct ConnectionsResponse {
    /// Number of registered connections
    pub count: usize,
    pub connections: Vec<ConnectionInfo>,
}

impl ConnectionsResponse {
    pub fn new(connections: Vec<ConnectionInfo>) -> Self {
        Self {
            count: connections.len(),
            connections,
        }
    }
}

/// Response body for `GET /connections/:name`
#[derive(Debug, Clone, Serialize)]
pub struct ConnectionStateResponse {
    pub name: String,
    pub state: ConnectionState,
    pub connected: bool,
}

impl ConnectionStateResponse {
    pub fn new(name: impl Into<String>, state: ConnectionState) -> Self {
        Self {
            name: name.into(),
            connected: state == ConnectionState::Connected,
            state,
        }
    }
}

/// Response body for the connection close endpoints
#[derive(Debug, Clone, Serialize)]
pub struct CloseResponse {
    /// Number of connections closed
    pub closed: usize,
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    /// Creates a new ErrorResponse
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
