//! Error types
//!
//! Errors surfaced by the inspection API and by stream consumers. Cache and
//! registry operations themselves never fail.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == API Error Enum ==
/// Error type for the inspection API.
#[derive(Error, Debug)]
pub enum ApiError {
    /// No cached document under this key (absent or expired)
    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    /// No live connection under this name
    #[error("Connection not found: {0}")]
    ConnectionNotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::DocumentNotFound(_) | ApiError::ConnectionNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

/// Convenience Result type for API handlers.
pub type Result<T> = std::result::Result<T, ApiError>;

// == Stream Error Enum ==
/// Failures reported to `StreamCallbacks::on_error`.
#[derive(Error, Debug)]
pub enum StreamError {
    /// The request could not be sent or the response could not be read
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The server answered with a non-success status
    #[error("HTTP {status}: {detail}")]
    Status { status: u16, detail: String },

    /// Reading the body failed midway
    #[error("Stream read failed: {0}")]
    Transport(String),

    /// The server sent an `error` frame
    #[error("Stream error: {0}")]
    Backend(String),
}
