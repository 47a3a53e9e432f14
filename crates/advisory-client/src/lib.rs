//! Dataset-fetch client for the advisory proxy.
//!
//! [`AdvisoryClient::fetch`] never fails: any transport, status or decoding
//! problem is logged and turned into an empty feature collection, so the map
//! treats it as "nothing to show". [`AdvisoryClient::try_fetch`] exposes the
//! underlying error for callers that want it.

pub mod client;
pub mod error;

pub use client::{AdvisoryClient, ClientConfig, DEFAULT_PROXY_URL};
pub use error::{ClientError, ClientResult};
