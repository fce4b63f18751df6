//! Health and statistics endpoints.
//!
//! # Endpoints
//!
//! - `GET /health` - Liveness check
//! - `GET /stats` - Catalog counts, store size and uptime
//!
//! Both sit outside `/api/v1`: they are never rate limited or cached.

use axum::Json;
use axum::extract::State;
use chrono::Utc;
use tracing::instrument;

use crate::error::AppResult;
use crate::models::{HealthResponse, StatsResponse};
use crate::state::AppState;

/// Health check endpoint.
///
/// Always returns 200 OK while the process serves requests.
///
/// # Response Body
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "timestamp": "2025-06-15T10:30:00Z"
/// }
/// ```
#[instrument]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
    })
}

/// Statistics endpoint.
///
/// # Response Body
///
/// ```json
/// {
///   "categories": 4,
///   "products": 4,
///   "workshops": 2,
///   "faqs": 4,
///   "about_us": 3,
///   "cache_entries": 17,
///   "uptime_seconds": 3600
/// }
/// ```
///
/// `cache_entries` counts every store entry, rate-limit counters included,
/// until the purge task drops expired ones.
#[instrument(skip(state))]
pub async fn stats(State(state): State<AppState>) -> AppResult<Json<StatsResponse>> {
    let data = state.catalog.read().await;

    Ok(Json(StatsResponse {
        categories: data.categories.len(),
        products: data.products.len(),
        workshops: data.workshops.len(),
        faqs: data.faqs.len(),
        about_us: data.about_us.len(),
        cache_entries: state.store.len(),
        uptime_seconds: state.uptime_seconds(),
    }))
}
