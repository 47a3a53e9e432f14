//! Error types for advisory data handling.

use thiserror::Error;

/// Result type alias using AdvisoryError.
pub type AdvisoryResult<T> = Result<T, AdvisoryError>;

/// Primary error type for advisory data operations.
#[derive(Debug, Error)]
pub enum AdvisoryError {
    #[error("Invalid altitude range {min}..{max}: {message}")]
    InvalidAltitudeRange { min: u32, max: u32, message: String },

    #[error("Unknown advisory category: {0}")]
    UnknownCategory(String),

    #[error("Invalid GeoJSON: {0}")]
    InvalidGeoJson(String),
}

impl From<serde_json::Error> for AdvisoryError {
    fn from(err: serde_json::Error) -> Self {
        AdvisoryError::InvalidGeoJson(err.to_string())
    }
}
