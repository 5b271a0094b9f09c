//! Dashboard Routes
//!
//! - GET / - Dashboard page
//! - GET /api/v1/dashboard - Same view as JSON
//!
//! Both take the selector query parameters `syndrome`, `ed_type`, `start`,
//! `end` and `granularity`; omitted ones fall back to their defaults.

use axum::{
    extract::{Query, State},
    response::Html,
    Json,
};
use std::sync::Arc;

use crate::api::error::ApiResult;
use crate::api::state::AppState;
use crate::dashboard::{render_dashboard, render_page, DashboardView, SelectorQuery};

/// GET /
pub async fn dashboard_page(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SelectorQuery>,
) -> ApiResult<Html<String>> {
    let view = render_dashboard(&state.dataset, &query)?;
    Ok(Html(render_page(&view)))
}

/// GET /api/v1/dashboard
pub async fn dashboard_json(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SelectorQuery>,
) -> ApiResult<Json<DashboardView>> {
    let view = render_dashboard(&state.dataset, &query)?;
    Ok(Json(view))
}
