//! Aggregator
//!
//! Resamples filtered rows into weekly or monthly buckets per age group.
//!
//! # Bucket conventions
//!
//! - **Weekly**: weeks run Sunday through Saturday; a bucket is labelled with
//!   its closing Saturday.
//! - **Monthly**: calendar months; a bucket is labelled with the month's last
//!   day.
//!
//! Every numeric column is averaged over its non-missing values. Non-numeric
//! columns are dropped; the bucket date and age group remain.

use crate::data::TimeSeriesRow;
use crate::query::error::{QueryError, QueryResult};
use chrono::{Datelike, Days, Months, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Last day of a weekly bucket
pub const WEEK_END: Weekday = Weekday::Sat;

/// Time-axis resolution for the line chart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    /// Rows as loaded
    #[default]
    Daily,
    /// Mean per week
    Weekly,
    /// Mean per calendar month
    Monthly,
}

impl Granularity {
    /// All granularities, in selector order
    pub const ALL: [Granularity; 3] = [Self::Daily, Self::Weekly, Self::Monthly];

    /// Localised label shown in the dashboard
    pub fn label(&self) -> &'static str {
        match self {
            Self::Daily => "Täglich",
            Self::Weekly => "Wöchentlich",
            Self::Monthly => "Monatlich",
        }
    }

    /// Map a date to the label date of its bucket
    pub fn bucket(&self, date: NaiveDate) -> NaiveDate {
        match self {
            Self::Daily => date,
            Self::Weekly => {
                let days_to_end = (7 + WEEK_END.num_days_from_sunday()
                    - date.weekday().num_days_from_sunday())
                    % 7;
                date.checked_add_days(Days::new(days_to_end as u64))
                    .unwrap_or(date)
            }
            Self::Monthly => date
                .with_day(1)
                .and_then(|d| d.checked_add_months(Months::new(1)))
                .and_then(|d| d.pred_opt())
                .unwrap_or(date),
        }
    }
}

impl std::fmt::Display for Granularity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Daily => write!(f, "daily"),
            Self::Weekly => write!(f, "weekly"),
            Self::Monthly => write!(f, "monthly"),
        }
    }
}

impl std::str::FromStr for Granularity {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "daily" | "day" | "d" | "täglich" => Ok(Self::Daily),
            "weekly" | "week" | "w" | "wöchentlich" => Ok(Self::Weekly),
            "monthly" | "month" | "m" | "monatlich" => Ok(Self::Monthly),
            _ => Err(QueryError::UnknownGranularity(s.to_string())),
        }
    }
}

/// One row of aggregator output
///
/// For daily output every field of the source row is carried over. For
/// weekly and monthly output `syndrome`, `ed_type` and `labels` are dropped.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    /// Row date, or bucket label date
    pub date: NaiveDate,
    pub age_group: String,
    pub relative_cases: Option<f64>,
    pub measures: BTreeMap<String, Option<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub syndrome: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ed_type: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
}

impl From<TimeSeriesRow> for SeriesPoint {
    fn from(row: TimeSeriesRow) -> Self {
        Self {
            date: row.date,
            age_group: row.age_group,
            relative_cases: row.relative_cases,
            measures: row.measures,
            syndrome: Some(row.syndrome),
            ed_type: Some(row.ed_type),
            labels: row.labels,
        }
    }
}

/// Aggregator output
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedSeries {
    pub granularity: Granularity,
    pub rows: Vec<SeriesPoint>,
}

impl AggregatedSeries {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Distinct age groups in order of first appearance
    pub fn age_groups(&self) -> Vec<&str> {
        let mut groups: Vec<&str> = Vec::new();
        for row in &self.rows {
            if !groups.contains(&row.age_group.as_str()) {
                groups.push(&row.age_group);
            }
        }
        groups
    }

    /// Measure column names present in any row
    pub fn measure_columns(&self) -> Vec<&str> {
        let mut columns: Vec<&str> = Vec::new();
        for row in &self.rows {
            for name in row.measures.keys() {
                if !columns.contains(&name.as_str()) {
                    columns.push(name);
                }
            }
        }
        columns
    }

    /// Render as CSV with a `date,age_group,relative_cases,<measures...>` header
    pub fn to_csv(&self) -> QueryResult<String> {
        let export_err = |e: csv::Error| QueryError::Export(e.to_string());
        let measures = self.measure_columns();
        let mut writer = csv::Writer::from_writer(Vec::new());

        let mut header = vec!["date", "age_group", "relative_cases"];
        header.extend(measures.iter().copied());
        writer.write_record(&header).map_err(export_err)?;

        for row in &self.rows {
            let mut record = vec![
                row.date.format("%Y-%m-%d").to_string(),
                row.age_group.clone(),
                format_cell(row.relative_cases),
            ];
            for name in &measures {
                record.push(format_cell(row.measures.get(*name).copied().flatten()));
            }
            writer.write_record(&record).map_err(export_err)?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| QueryError::Export(e.error().to_string()))?;
        String::from_utf8(bytes).map_err(|e| QueryError::Export(e.to_string()))
    }
}

/// Empty cell for a missing value
fn format_cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Resample filtered rows at the given granularity
///
/// Daily returns the rows unchanged. Weekly and monthly produce one row per
/// non-empty (bucket, age group), ordered by bucket date then age group.
pub fn aggregate(rows: Vec<TimeSeriesRow>, granularity: Granularity) -> AggregatedSeries {
    if granularity == Granularity::Daily {
        return AggregatedSeries {
            granularity,
            rows: rows.into_iter().map(SeriesPoint::from).collect(),
        };
    }

    let input_len = rows.len();

    // Union of measure names, so every output row has the same columns
    let mut measure_names: Vec<String> = Vec::new();
    for row in &rows {
        for name in row.measures.keys() {
            if !measure_names.contains(name) {
                measure_names.push(name.clone());
            }
        }
    }

    let mut groups: BTreeMap<(NaiveDate, String), Vec<TimeSeriesRow>> = BTreeMap::new();
    for row in rows {
        let key = (granularity.bucket(row.date), row.age_group.clone());
        groups.entry(key).or_default().push(row);
    }

    let output: Vec<SeriesPoint> = groups
        .into_iter()
        .map(|((date, age_group), members)| {
            let relative_cases = mean(members.iter().filter_map(|r| r.relative_cases));
            let measures = measure_names
                .iter()
                .map(|name| {
                    let value = mean(
                        members
                            .iter()
                            .filter_map(|r| r.measures.get(name).copied().flatten()),
                    );
                    (name.clone(), value)
                })
                .collect();

            SeriesPoint {
                date,
                age_group,
                relative_cases,
                measures,
                syndrome: None,
                ed_type: None,
                labels: BTreeMap::new(),
            }
        })
        .collect();

    tracing::debug!(
        granularity = %granularity,
        input_rows = input_len,
        buckets = output.len(),
        "Aggregated time series"
    );

    AggregatedSeries {
        granularity,
        rows: output,
    }
}

/// Arithmetic mean, `None` for no values
fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}
