//! API Handlers
//!
//! HTTP request handlers for the inspection endpoints.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    Json,
};
use tokio::sync::RwLock;

use crate::cache::{DocumentCache, SharedDocumentCache};
use crate::config::Config;
use crate::error::{ApiError, Result};
use crate::models::{
    ClearResponse, CloseResponse, ConnectionStateResponse, ConnectionsResponse, DeleteResponse,
    DocumentPath, HealthResponse, SetResponse, StatsResponse,
};
use crate::stream::StreamConnectionManager;

/// Application state shared across all handlers.
///
/// Holds the process-wide document cache and connection registry. Both are
/// constructed explicitly and handed to whoever needs them.
#[derive(Clone)]
pub struct AppState {
    /// Thread-safe document cache
    pub cache: SharedDocumentCache,
    /// Registry of named streaming connections
    pub connections: StreamConnectionManager,
    /// Largest request body accepted when storing a document
    pub max_body_bytes: usize,
}

impl AppState {
    /// Creates a new AppState around the given cache and a fresh registry.
    pub fn new(cache: DocumentCache) -> Self {
        // A document larger than the byte bound could never be retained anyway
        let max_body_bytes = usize::try_from(cache.max_bytes()).unwrap_or(usize::MAX);
        Self {
            max_body_bytes,
            cache: Arc::new(RwLock::new(cache)),
            connections: StreamConnectionManager::new(),
        }
    }

    /// Creates a new AppState from configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(DocumentCache::new(config.cache_config()))
    }
}

fn validated(path: DocumentPath) -> Result<String> {
    match path.validate() {
        Some(error_msg) => Err(ApiError::InvalidRequest(error_msg)),
        None => Ok(path.key),
    }
}

/// Handler for PUT /cache/documents/*key
///
/// Caches the raw request body under the key.
pub async fn put_document_handler(
    State(state): State<AppState>,
    Path(path): Path<DocumentPath>,
    body: Bytes,
) -> Result<Json<SetResponse>> {
    let key = validated(path)?;
    let size = body.len() as u64;

    let mut cache = state.cache.write().await;
    cache.set(key.clone(), body);

    Ok(Json(SetResponse::new(key, size)))
}

/// Handler for GET /cache/documents/*key
///
/// Returns the cached bytes verbatim.
pub async fn get_document_handler(
    State(state): State<AppState>,
    Path(path): Path<DocumentPath>,
) -> Result<impl IntoResponse> {
    let key = validated(path)?;

    // Write lock: a hit updates recency and stats
    let mut cache = state.cache.write().await;
    let data = cache.get(&key).ok_or(ApiError::DocumentNotFound(key))?;

    Ok(([(header::CONTENT_TYPE, "application/octet-stream")], data))
}

/// Handler for DELETE /cache/documents/*key
pub async fn delete_document_handler(
    State(state): State<AppState>,
    Path(path): Path<DocumentPath>,
) -> Result<Json<DeleteResponse>> {
    let key = validated(path)?;

    let mut cache = state.cache.write().await;
    if !cache.delete(&key) {
        return Err(ApiError::DocumentNotFound(key));
    }

    Ok(Json(DeleteResponse::new(key)))
}

/// Handler for DELETE /cache
pub async fn clear_cache_handler(State(state): State<AppState>) -> Json<ClearResponse> {
    let removed = state.cache.write().await.clear();
    Json(ClearResponse { removed })
}

/// Handler for GET /cache/stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let cache = state.cache.read().await;
    Json(StatsResponse::from(cache.stats()))
}

/// Handler for GET /connections
pub async fn list_connections_handler(State(state): State<AppState>) -> Json<ConnectionsResponse> {
    Json(ConnectionsResponse::new(state.connections.connections()))
}

/// Handler for GET /connections/:name
///
/// Unknown names report `disconnected`.
pub async fn connection_state_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Json<ConnectionStateResponse> {
    let connection_state = state.connections.connection_state(&name);
    Json(ConnectionStateResponse::new(name, connection_state))
}

/// Handler for DELETE /connections/:name
pub async fn close_connection_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<CloseResponse>> {
    if !state.connections.close_connection(&name) {
        return Err(ApiError::ConnectionNotFound(name));
    }
    Ok(Json(CloseResponse { closed: 1 }))
}

/// Handler for DELETE /connections
pub async fn close_all_connections_handler(State(state): State<AppState>) -> Json<CloseResponse> {
    let closed = state.connections.close_all_connections();
    Json(CloseResponse { closed })
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
