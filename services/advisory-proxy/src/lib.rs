//! Advisory proxy service library.
//!
//! Serves `GET /isigmet` and `GET /airsigmet` from the aviation weather API,
//! memoizing each response per request path for a fixed TTL.

pub mod cache;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod state;
pub mod upstream;

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;

/// Build the service router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Advisory data
        .route("/isigmet", get(handlers::advisory::advisory_handler))
        .route("/airsigmet", get(handlers::advisory::advisory_handler))
        // Health and metrics
        .route("/health", get(handlers::health::health_handler))
        .route("/metrics", get(handlers::health::metrics_handler))
        // Middleware
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
}
