//! Proxy error types.

use advisory_common::Category;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

pub type ProxyResult<T> = Result<T, ProxyError>;

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("Upstream request for {category} failed: {source}")]
    Upstream {
        category: Category,
        #[source]
        source: reqwest::Error,
    },

    #[error("Upstream returned {status} for {category}")]
    UpstreamStatus { category: Category, status: u16 },

    #[error("Upstream payload for {category} is not a FeatureCollection: {message}")]
    InvalidPayload { category: Category, message: String },

    #[error("No advisory category is served at {0}")]
    UnknownEndpoint(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub message: String,
}

impl ProxyError {
    /// Category the failed request was for, if any.
    pub fn category(&self) -> Option<Category> {
        match self {
            ProxyError::Upstream { category, .. }
            | ProxyError::UpstreamStatus { category, .. }
            | ProxyError::InvalidPayload { category, .. } => Some(*category),
            ProxyError::UnknownEndpoint(_) | ProxyError::Internal(_) => None,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ProxyError::UnknownEndpoint(_) => (StatusCode::NOT_FOUND, "Not found".to_string()),
            ProxyError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
            other => {
                let label = other.category().map(|c| c.spec().label).unwrap_or("advisory");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Error fetching {} data", label),
                )
            }
        };

        (status, Json(ErrorResponse { message })).into_response()
    }
}
