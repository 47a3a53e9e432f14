//! Map core error types.

use advisory_common::AdvisoryError;
use thiserror::Error;

/// Result type alias using MapError.
pub type MapResult<T> = Result<T, MapError>;

/// Errors reported by the map engine or the core around it.
#[derive(Debug, Error)]
pub enum MapError {
    #[error("Source not found: {0}")]
    UnknownSource(String),

    #[error("Layer not found: {0}")]
    UnknownLayer(String),

    #[error("Source already exists: {0}")]
    DuplicateSource(String),

    #[error("Layer already exists: {0}")]
    DuplicateLayer(String),

    #[error("Map engine has been removed")]
    EngineRemoved,

    #[error("Invalid filter expression: {0}")]
    InvalidExpression(String),

    #[error("MAPTILER_API_KEY is not set")]
    MissingApiKey,

    #[error(transparent)]
    Advisory(#[from] AdvisoryError),
}
