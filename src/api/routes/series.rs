//! Series Routes
//!
//! - GET /api/v1/series - Filtered and aggregated rows as JSON or CSV

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use std::time::Instant;

use crate::api::dto::{SeriesFormat, SeriesMeta, SeriesParams, SeriesResponse};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::dashboard::run_pipeline;

/// GET /api/v1/series
pub async fn get_series(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SeriesParams>,
) -> ApiResult<Response> {
    let format = params.format().map_err(ApiError::Validation)?;

    let start = Instant::now();
    let (resolved, series) = run_pipeline(&state.dataset, &params.selector)?;
    let execution_time_ms = start.elapsed().as_millis() as u64;

    tracing::debug!(
        granularity = %resolved.granularity,
        rows = series.len(),
        execution_time_ms,
        "Computed series"
    );

    if format == SeriesFormat::Csv {
        let filename = match &resolved.selection {
            Some(s) => format!(
                "{}_{}_{}.csv",
                sanitize(&s.syndrome),
                sanitize(&s.ed_type),
                resolved.granularity
            ),
            None => format!("series_{}.csv", resolved.granularity),
        };
        let body = series
            .to_csv()
            .map_err(|e| ApiError::Internal(e.to_string()))?;
        return Ok((
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", filename),
                ),
            ],
            body,
        )
            .into_response());
    }

    let mut columns = vec![
        "date".to_string(),
        "age_group".to_string(),
        "relative_cases".to_string(),
    ];
    columns.extend(series.measure_columns().into_iter().map(String::from));

    let age_groups = series.age_groups().into_iter().map(String::from).collect();
    let row_count = series.len();

    Ok(Json(SeriesResponse {
        selection: resolved.selection,
        granularity: resolved.granularity,
        columns,
        rows: series.rows,
        meta: SeriesMeta {
            row_count,
            age_groups,
            execution_time_ms,
        },
    })
    .into_response())
}

/// Keep filename-safe characters
fn sanitize(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize("ARI"), "ARI");
        assert_eq!(sanitize("SARI (ICD)"), "SARI__ICD_");
        assert_eq!(sanitize("a\"b"), "a_b");
    }
}
