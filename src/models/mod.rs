//! Request and Response models for the inspection API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing/deserializing HTTP request and response bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{DocumentPath, MAX_KEY_LENGTH};
pub use responses::{
    ClearResponse, CloseResponse, ConnectionStateResponse, ConnectionsResponse, DeleteResponse,
    ErrorResponse, HealthResponse, SetResponse, StatsResponse,
};
