//! API Module
//!
//! HTTP inspection surface over the shared document cache and connection
//! registry, used by developer tooling and status indicators.

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
