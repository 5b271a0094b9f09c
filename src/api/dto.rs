//! Data Transfer Objects
//!
//! Request and response types for the API endpoints.
//! These types are serialized/deserialized to/from JSON.

use serde::{Deserialize, Serialize};

use crate::dashboard::{GranularityOption, SelectorQuery};
use crate::data::DateBounds;
use crate::query::{Granularity, Selection, SeriesPoint};

// ============================================
// OPTIONS DTOs
// ============================================

/// Selector options derived from the loaded data
#[derive(Debug, Serialize)]
pub struct OptionsResponse {
    /// Distinct syndromes in first-appearance order
    pub syndromes: Vec<String>,
    /// Distinct ed_types in first-appearance order
    pub ed_types: Vec<String>,
    /// Earliest and latest date, absent when the time series is empty
    pub date_bounds: Option<DateBounds>,
    pub granularities: Vec<GranularityOption>,
}

// ============================================
// SERIES DTOs
// ============================================

/// Output format for the aggregated series
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum SeriesFormat {
    #[default]
    Json,
    Csv,
}

/// Series query parameters
#[derive(Debug, Deserialize)]
pub struct SeriesParams {
    #[serde(flatten)]
    pub selector: SelectorQuery,
    /// Output format: json (default) or csv
    #[serde(default)]
    pub format: Option<String>,
}

impl SeriesParams {
    /// Parse the requested format, blank meaning JSON
    pub fn format(&self) -> Result<SeriesFormat, String> {
        match self.format.as_deref().map(str::trim) {
            None | Some("") => Ok(SeriesFormat::Json),
            Some(f) if f.eq_ignore_ascii_case("json") => Ok(SeriesFormat::Json),
            Some(f) if f.eq_ignore_ascii_case("csv") => Ok(SeriesFormat::Csv),
            Some(other) => Err(format!("Unknown format: {}. Use json or csv", other)),
        }
    }
}

/// Aggregated series response
#[derive(Debug, Serialize)]
pub struct SeriesResponse {
    /// Resolved selection, absent in the empty state
    pub selection: Option<Selection>,
    pub granularity: Granularity,
    /// Column names in row order
    pub columns: Vec<String>,
    pub rows: Vec<SeriesPoint>,
    pub meta: SeriesMeta,
}

/// Series execution metadata
#[derive(Debug, Serialize)]
pub struct SeriesMeta {
    pub row_count: usize,
    pub age_groups: Vec<String>,
    pub execution_time_ms: u64,
}

// ============================================
// HEALTH DTOs
// ============================================

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Overall status: healthy or degraded (empty time series)
    pub status: String,
    /// Loaded time series rows
    pub timeseries_rows: usize,
    /// Loaded facility locations
    pub locations: usize,
    /// Server uptime in seconds
    pub uptime_seconds: u64,
    /// Application version
    pub version: String,
}
