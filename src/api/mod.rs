//! Dashboard HTTP server
//!
//! Serves the dashboard page and its data, built with Axum.
//!
//! # Endpoints
//!
//! ## Dashboard
//! - `GET /` - HTML dashboard page
//! - `GET /api/v1/dashboard` - Resolved selection, headers and both figures
//!
//! ## Data
//! - `GET /api/v1/options` - Selector options
//! - `GET /api/v1/series` - Aggregated series (`format=json|csv`)
//!
//! ## Health
//! - `GET /health/live` - Liveness probe
//! - `GET /health/ready` - Readiness probe
//! - `GET /health` - Full health status
//!
//! # Example
//!
//! ```rust,ignore
//! use edsurv::api::{serve, AppState};
//! use edsurv::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let (config, _) = Config::load_default()?;
//!     let dataset = config.data.load_dataset()?;
//!
//!     let state = AppState::new(dataset, config.api.clone());
//!     serve(state, &config.api).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod dto;
pub mod error;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::AppState;

use axum::{http::HeaderValue, http::Method, routing::get, Router};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::ApiConfig;

/// Build the router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_origins);

    let api_routes = Router::new()
        .route("/options", get(routes::options::list_options))
        .route("/dashboard", get(routes::dashboard::dashboard_json))
        .route("/series", get(routes::series::get_series));

    let health_routes = Router::new()
        .route("/live", get(routes::health::liveness))
        .route("/ready", get(routes::health::readiness))
        .route("/", get(routes::health::full_health));

    // Create shared state
    let shared_state = Arc::new(state);

    Router::new()
        .route("/", get(routes::dashboard::dashboard_page))
        .nest("/api/v1", api_routes)
        .nest("/health", health_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(shared_state)
}

/// Permissive without configured origins, else restricted to them
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods([Method::GET])
}

/// Start the dashboard server
pub async fn serve(state: AppState, config: &ApiConfig) -> Result<(), ApiError> {
    let router = build_router(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Dashboard listening on http://{}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ApiError::Internal(format!("Server error: {}", e)))?;

    tracing::info!("Dashboard shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::dto::HealthResponse;
    use crate::data::{Dataset, LocationRow, TimeSeriesRow, TimeSeriesTable};
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
        response::Response,
    };
    use chrono::NaiveDate;
    use tower::util::ServiceExt;

    fn test_dataset() -> Dataset {
        let d = |day| NaiveDate::from_ymd_opt(2023, 1, day).unwrap();
        let rows = vec![
            TimeSeriesRow::new(d(1), "ARI", "all", "00+", 2.0),
            TimeSeriesRow::new(d(2), "ARI", "all", "00+", 4.0),
            TimeSeriesRow::new(d(1), "ARI", "all", "15-34", 1.0),
            TimeSeriesRow::new(d(1), "GI", "all", "00+", 5.0),
        ];
        let locations = vec![LocationRow {
            ed_name: "Klinikum A".to_string(),
            latitude: 52.5,
            longitude: 13.4,
            ed_type: "all".to_string(),
        }];
        Dataset::new(TimeSeriesTable::from_rows(rows), locations)
    }

    fn create_test_app() -> Router {
        build_router(AppState::new(test_dataset(), ApiConfig::default()))
    }

    async fn get(app: Router, uri: &str) -> Response {
        app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_health_live() {
        let response = get(create_test_app(), "/health/live").await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health_ready() {
        let response = get(create_test_app(), "/health/ready").await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health_full() {
        let response = get(create_test_app(), "/health").await;
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let health: HealthResponse = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(health.status, "healthy");
        assert_eq!(health.timeseries_rows, 4);
        assert_eq!(health.locations, 1);
    }

    #[tokio::test]
    async fn test_options() {
        let response = get(create_test_app(), "/api/v1/options").await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["syndromes"], serde_json::json!(["ARI", "GI"]));
        assert_eq!(body["ed_types"], serde_json::json!(["all"]));
        assert_eq!(body["date_bounds"]["min"], "2023-01-01");
        assert_eq!(body["date_bounds"]["max"], "2023-01-02");
        assert_eq!(body["granularities"][1]["value"], "weekly");
        assert_eq!(body["granularities"][1]["label"], "Wöchentlich");
    }

    #[tokio::test]
    async fn test_dashboard_page() {
        let response = get(create_test_app(), "/?syndrome=GI&granularity=monthly").await;
        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap();
        assert!(content_type.starts_with("text/html"));

        let html = body_text(response).await;
        assert!(html.contains("Notaufnahmesurveillance Dashboard"));
        assert!(html.contains("Relative Fallzahlen im Zeitverlauf (Monatlich)"));
        assert!(html.contains("<option value=\"GI\" selected>GI</option>"));
    }

    #[tokio::test]
    async fn test_dashboard_json() {
        let response = get(create_test_app(), "/api/v1/dashboard?granularity=weekly").await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["selection"]["syndrome"], "ARI");
        assert_eq!(body["granularity"], "weekly");
        let traces = body["line_chart"]["data"].as_array().unwrap();
        assert_eq!(traces.len(), 2);
        let all_ages = traces.iter().find(|t| t["name"] == "Alle").unwrap();
        assert_eq!(all_ages["x"][0], "2023-01-07");
        assert_eq!(all_ages["y"][0], 3.0);
        assert_eq!(body["map"]["data"][0]["type"], "scattermapbox");
    }

    #[tokio::test]
    async fn test_unknown_syndrome_rejected() {
        let response = get(create_test_app(), "/api/v1/dashboard?syndrome=Fever").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "UNKNOWN_OPTION");
        assert!(body["request_id"].as_str().is_some());
    }

    #[tokio::test]
    async fn test_reversed_dates_rejected() {
        let response = get(
            create_test_app(),
            "/api/v1/series?start=2023-01-02&end=2023-01-01",
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_series_json() {
        let response = get(create_test_app(), "/api/v1/series?end=2023-01-01").await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["meta"]["row_count"], 2);
        assert_eq!(body["columns"][2], "relative_cases");
        assert_eq!(body["rows"][0]["age_group"], "Alle");
    }

    #[tokio::test]
    async fn test_series_csv() {
        let response = get(create_test_app(), "/api/v1/series?format=csv&granularity=weekly").await;
        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap();
        assert!(content_type.starts_with("text/csv"));

        let csv = body_text(response).await;
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("date,age_group,relative_cases"));
        assert!(csv.contains("2023-01-07,Alle,3"));
    }

    #[tokio::test]
    async fn test_series_unknown_format() {
        let response = get(create_test_app(), "/api/v1/series?format=xml").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_empty_dataset_serves_empty_state() {
        let dataset = Dataset::new(TimeSeriesTable::default(), Vec::new());
        let app = build_router(AppState::new(dataset, ApiConfig::default()));

        let response = get(app.clone(), "/").await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = get(app, "/health").await;
        let body = body_json(response).await;
        assert_eq!(body["status"], "degraded");
    }
}
