//! Client error types.

use advisory_common::{AdvisoryError, Category};
use thiserror::Error;

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Proxy returned {status} for {category}")]
    Status { category: Category, status: u16 },

    #[error("Invalid advisory payload: {0}")]
    Decode(#[from] AdvisoryError),
}
