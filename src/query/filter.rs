//! Filter Engine
//!
//! Restricts the time series to one syndrome, one emergency-department type
//! and an inclusive date range.

use crate::data::TimeSeriesRow;
use crate::query::error::{QueryError, QueryResult};
use chrono::NaiveDate;
use serde::Serialize;

/// Inclusive calendar-date range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    /// First date (inclusive)
    pub start: NaiveDate,
    /// Last date (inclusive)
    pub end: NaiveDate,
}

impl DateRange {
    /// Create a range; `start` may equal `end` but not exceed it
    pub fn new(start: NaiveDate, end: NaiveDate) -> QueryResult<Self> {
        if start > end {
            return Err(QueryError::InvalidDateRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Check if a date falls within this range (both ends inclusive)
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Number of calendar days covered
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

/// The parameters of one filter pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Selection {
    /// Syndrome to keep
    pub syndrome: String,
    /// Emergency-department type to keep
    pub ed_type: String,
    /// Dates to keep
    pub date_range: DateRange,
}

impl Selection {
    pub fn new(syndrome: impl Into<String>, ed_type: impl Into<String>, date_range: DateRange) -> Self {
        Self {
            syndrome: syndrome.into(),
            ed_type: ed_type.into(),
            date_range,
        }
    }

    /// Check if a row satisfies every condition of the selection
    pub fn matches(&self, row: &TimeSeriesRow) -> bool {
        row.syndrome == self.syndrome
            && row.ed_type == self.ed_type
            && self.date_range.contains(row.date)
    }
}

/// Return the rows matching `selection`, in source order
///
/// No match yields an empty vector.
pub fn filter_rows(rows: &[TimeSeriesRow], selection: &Selection) -> Vec<TimeSeriesRow> {
    let filtered: Vec<TimeSeriesRow> = rows
        .iter()
        .filter(|row| selection.matches(row))
        .cloned()
        .collect();

    tracing::debug!(
        syndrome = %selection.syndrome,
        ed_type = %selection.ed_type,
        start = %selection.date_range.start,
        end = %selection.date_range.end,
        scanned = rows.len(),
        matched = filtered.len(),
        "Filtered time series"
    );

    filtered
}
