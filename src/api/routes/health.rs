//! Health Routes
//!
//! Health check endpoints for monitoring and Kubernetes probes.
//!
//! - GET /health/live - Liveness probe (process is alive)
//! - GET /health/ready - Readiness probe (ready to serve traffic)
//! - GET /health - Full health status

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::api::dto::HealthResponse;
use crate::api::state::AppState;

/// GET /health/live
///
/// Kubernetes liveness probe.
/// Returns 200 if the process is alive, no dependency checks.
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// GET /health/ready
///
/// Kubernetes readiness probe. The dataset is loaded before the listener
/// binds, so a running server is always ready.
pub async fn readiness(State(_state): State<Arc<AppState>>) -> StatusCode {
    StatusCode::OK
}

/// GET /health
///
/// Full health status with loaded row counts.
pub async fn full_health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let timeseries_rows = state.dataset.timeseries().len();

    // An empty time series still serves the map and the empty state
    let status = if timeseries_rows > 0 { "healthy" } else { "degraded" };

    Json(HealthResponse {
        status: status.to_string(),
        timeseries_rows,
        locations: state.dataset.locations().len(),
        uptime_seconds: state.uptime_seconds(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
