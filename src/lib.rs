//! # edsurv
//!
//! Emergency-department syndrome surveillance dashboard. Loads the published
//! time series of relative case counts per syndrome, emergency department
//! type and age group, filters and resamples it, and renders a line chart and
//! a facility map in a small web dashboard.
//!
//! ## Modules
//!
//! - [`data`]: TSV loading and the immutable [`Dataset`]
//! - [`query`]: Filtering by selection and daily/weekly/monthly aggregation
//! - [`chart`]: Plotly figure documents for the line chart and the map
//! - [`dashboard`]: Selector resolution and page rendering
//! - [`api`]: HTTP server with Axum
//! - [`config`]: TOML configuration with environment overrides
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edsurv::dashboard::{render_dashboard, SelectorQuery};
//! use edsurv::data::TsvLoader;
//! use std::path::Path;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let dataset = TsvLoader::new().load_dataset(
//!         Path::new("Notaufnahmesurveillance_Zeitreihen_Syndrome.tsv"),
//!         Path::new("Notaufnahmesurveillance_Standorte.tsv"),
//!     )?;
//!
//!     let query = SelectorQuery {
//!         granularity: Some("weekly".to_string()),
//!         ..Default::default()
//!     };
//!     let view = render_dashboard(&dataset, &query)?;
//!
//!     println!("{}: {} rows plotted", view.timeseries_header, view.series_rows);
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod chart;
pub mod config;
pub mod dashboard;
pub mod data;
pub mod logging;
pub mod query;

// Re-export top-level types for convenience
pub use data::{DataError, DataResult, Dataset, LocationRow, TimeSeriesRow, TsvLoader};

pub use query::{aggregate, filter_rows, AggregatedSeries, DateRange, Granularity, QueryError, Selection};

pub use chart::{facility_map, line_chart, Figure};

pub use dashboard::{render_dashboard, render_page, DashboardView, SelectionError, SelectorQuery};

pub use api::{build_router, serve, ApiError, AppState};

pub use config::{ApiConfig, Config, ConfigError, ConfigSource, DataConfig, LoggingConfig};
