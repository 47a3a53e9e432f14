//! Advisory data endpoints.

use std::sync::Arc;

use advisory_common::Category;
use axum::{
    extract::Extension,
    http::{header, HeaderValue, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use tracing::{info, warn};

use crate::error::{ProxyError, ProxyResult};
use crate::metrics;
use crate::state::AppState;

/// Header reporting whether the payload came from the cache.
pub const CACHE_STATUS_HEADER: &str = "x-cache";

/// GET /isigmet, GET /airsigmet
///
/// Serves the cached payload for the request path while it is fresh,
/// otherwise fetches upstream and caches the result. Failures are not cached.
pub async fn advisory_handler(
    Extension(state): Extension<Arc<AppState>>,
    uri: Uri,
) -> ProxyResult<Response> {
    let key = uri.path();
    let category =
        Category::from_endpoint(key).ok_or_else(|| ProxyError::UnknownEndpoint(key.to_string()))?;
    metrics::record_request(category);

    if let Some(payload) = state.cache.get(key).await {
        info!(key = key, "[Cache] HIT");
        metrics::record_cache_hit(category);
        return Ok(json_response(payload, "HIT"));
    }

    info!(key = key, "[Cache] MISS");
    metrics::record_cache_miss(category);

    let payload = match state.upstream.fetch(category).await {
        Ok(payload) => payload,
        Err(e) => {
            warn!(category = %category, error = %e, "Error fetching {} data", category.spec().label);
            metrics::record_upstream_failure(category);
            return Err(e);
        }
    };

    state.cache.insert(key, payload.clone()).await;
    Ok(json_response(payload, "MISS"))
}

fn json_response(payload: Bytes, cache_status: &'static str) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("application/json")),
            (
                header::HeaderName::from_static(CACHE_STATUS_HEADER),
                HeaderValue::from_static(cache_status),
            ),
        ],
        payload,
    )
        .into_response()
}
