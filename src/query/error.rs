//! Query error types
//!
//! Errors raised while building a selection or choosing an aggregation.

use chrono::NaiveDate;
use thiserror::Error;

/// Errors that can occur while preparing a filter/aggregate pipeline
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueryError {
    /// Date range with start after end
    #[error("Invalid date range: start {start} is after end {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    /// Unrecognised granularity name
    #[error("Unknown granularity: {0}. Use daily, weekly or monthly")]
    UnknownGranularity(String),

    /// Series could not be written as CSV
    #[error("CSV export failed: {0}")]
    Export(String),
}

/// Result type for query operations
pub type QueryResult<T> = Result<T, QueryError>;
