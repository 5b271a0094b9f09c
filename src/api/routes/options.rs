//! Option Routes
//!
//! - GET /api/v1/options - Values offered by the dashboard selectors

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::api::dto::OptionsResponse;
use crate::api::state::AppState;
use crate::dashboard::Controls;

/// GET /api/v1/options
pub async fn list_options(State(state): State<Arc<AppState>>) -> Json<OptionsResponse> {
    let controls = Controls::from_dataset(&state.dataset);

    Json(OptionsResponse {
        syndromes: controls.syndromes,
        ed_types: controls.ed_types,
        date_bounds: controls.date_bounds,
        granularities: controls.granularities,
    })
}
