//! API Routes
//!
//! Configures the Axum router with all inspection endpoints.

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    clear_cache_handler, close_all_connections_handler, close_connection_handler,
    connection_state_handler, delete_document_handler, get_document_handler, health_handler,
    list_connections_handler, put_document_handler, stats_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /health` - Health check
/// - `GET /cache/stats` - Cache statistics
/// - `DELETE /cache` - Clear the cache
/// - `PUT|GET|DELETE /cache/documents/*key` - Store, read or drop a document
/// - `GET /connections` - Registered streaming connections
/// - `DELETE /connections` - Close every connection
/// - `GET|DELETE /connections/:name` - Inspect or close one connection
///
/// # Middleware
/// - Body limit: Sized from the cache byte bound instead of axum's 2 MiB default
/// - CORS: Allows any origin
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/cache", delete(clear_cache_handler))
        .route("/cache/stats", get(stats_handler))
        .route(
            "/cache/documents/*key",
            get(get_document_handler)
                .put(put_document_handler)
                .delete(delete_document_handler),
        )
        .route(
            "/connections",
            get(list_connections_handler).delete(close_all_connections_handler),
        )
        .route(
            "/connections/:name",
            get(connection_state_handler).delete(close_connection_handler),
        )
        .layer(DefaultBodyLimit::max(state.max_body_bytes))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
