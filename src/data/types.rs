//! Core data types for the surveillance tables
//!
//! Both tables are immutable once loaded. Everything downstream derives new
//! values from them.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Raw age-group label for the all-ages band, as shipped in the source data
pub const RAW_ALL_AGES: &str = "00+";

/// Display label for the all-ages band
pub const ALL_AGES_LABEL: &str = "Alle";

/// Map a raw age-group label to the label shown to users
pub fn display_age_group(raw: &str) -> String {
    if raw == RAW_ALL_AGES {
        ALL_AGES_LABEL.to_string()
    } else {
        raw.to_string()
    }
}

/// One row of the syndrome time series
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeriesRow {
    /// Calendar date (timezone-naive)
    pub date: NaiveDate,
    /// Syndrome category, e.g. "ARI"
    pub syndrome: String,
    /// Emergency-department type
    pub ed_type: String,
    /// Age group, already mapped through [`display_age_group`]
    pub age_group: String,
    /// Cases normalised by attendance; `None` where the source is missing
    pub relative_cases: Option<f64>,
    /// Remaining numeric columns keyed by header
    pub measures: BTreeMap<String, Option<f64>>,
    /// Remaining non-numeric columns keyed by header
    pub labels: BTreeMap<String, String>,
}

impl TimeSeriesRow {
    /// Create a row with no extra columns
    pub fn new(
        date: NaiveDate,
        syndrome: impl Into<String>,
        ed_type: impl Into<String>,
        age_group: &str,
        relative_cases: f64,
    ) -> Self {
        Self {
            date,
            syndrome: syndrome.into(),
            ed_type: ed_type.into(),
            age_group: display_age_group(age_group),
            relative_cases: Some(relative_cases),
            measures: BTreeMap::new(),
            labels: BTreeMap::new(),
        }
    }

    /// Attach an extra numeric measure
    pub fn measure(mut self, name: impl Into<String>, value: Option<f64>) -> Self {
        self.measures.insert(name.into(), value);
        self
    }
}

/// A participating emergency department
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationRow {
    /// Facility name
    pub ed_name: String,
    /// WGS84 latitude
    pub latitude: f64,
    /// WGS84 longitude
    pub longitude: f64,
    /// Emergency-department type
    pub ed_type: String,
}

/// The loaded time series together with its column layout
#[derive(Debug, Clone, Default)]
pub struct TimeSeriesTable {
    /// Rows in source order
    pub rows: Vec<TimeSeriesRow>,
    /// Extra numeric columns, in header order
    pub measure_columns: Vec<String>,
    /// Extra non-numeric columns, in header order
    pub label_columns: Vec<String>,
}

impl TimeSeriesTable {
    /// Build a table from rows, deriving the extra columns from the rows themselves
    pub fn from_rows(rows: Vec<TimeSeriesRow>) -> Self {
        let mut measure_columns = Vec::new();
        let mut label_columns = Vec::new();
        for row in &rows {
            for name in row.measures.keys() {
                if !measure_columns.contains(name) {
                    measure_columns.push(name.clone());
                }
            }
            for name in row.labels.keys() {
                if !label_columns.contains(name) {
                    label_columns.push(name.clone());
                }
            }
        }
        Self {
            rows,
            measure_columns,
            label_columns,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Inclusive bounds of the dates present in the time series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateBounds {
    pub min: NaiveDate,
    pub max: NaiveDate,
}

impl DateBounds {
    /// Clamp a date into the bounds
    pub fn clamp(&self, date: NaiveDate) -> NaiveDate {
        date.clamp(self.min, self.max)
    }
}

/// Both loaded tables plus the selector data derived from them
#[derive(Debug, Clone)]
pub struct Dataset {
    timeseries: TimeSeriesTable,
    locations: Vec<LocationRow>,
    bounds: Option<DateBounds>,
    syndromes: Vec<String>,
    ed_types: Vec<String>,
}

impl Dataset {
    /// Assemble a dataset, computing date bounds and distinct selector values
    pub fn new(timeseries: TimeSeriesTable, locations: Vec<LocationRow>) -> Self {
        let bounds = timeseries
            .rows
            .iter()
            .map(|r| r.date)
            .fold(None, |acc: Option<DateBounds>, date| match acc {
                None => Some(DateBounds {
                    min: date,
                    max: date,
                }),
                Some(b) => Some(DateBounds {
                    min: b.min.min(date),
                    max: b.max.max(date),
                }),
            });

        let syndromes = distinct_in_order(timeseries.rows.iter().map(|r| r.syndrome.as_str()));
        let ed_types = distinct_in_order(timeseries.rows.iter().map(|r| r.ed_type.as_str()));

        Self {
            timeseries,
            locations,
            bounds,
            syndromes,
            ed_types,
        }
    }

    pub fn timeseries(&self) -> &TimeSeriesTable {
        &self.timeseries
    }

    pub fn locations(&self) -> &[LocationRow] {
        &self.locations
    }

    /// Date bounds, `None` when the time series is empty
    pub fn date_bounds(&self) -> Option<DateBounds> {
        self.bounds
    }

    /// Distinct syndromes in order of first appearance
    pub fn syndromes(&self) -> &[String] {
        &self.syndromes
    }

    /// Distinct emergency-department types in order of first appearance
    pub fn ed_types(&self) -> &[String] {
        &self.ed_types
    }
}

/// Distinct values preserving first-appearance order
fn distinct_in_order<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for value in values {
        if seen.insert(value) {
            out.push(value.to_string());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_display_age_group() {
        assert_eq!(display_age_group("00+"), "Alle");
        assert_eq!(display_age_group("15-34"), "15-34");
    }

    #[test]
    fn test_row_constructor_renames_all_ages() {
        let row = TimeSeriesRow::new(date(2023, 1, 1), "ARI", "all", "00+", 1.5);
        assert_eq!(row.age_group, "Alle");
    }

    #[test]
    fn test_dataset_bounds_and_distinct_values() {
        let rows = vec![
            TimeSeriesRow::new(date(2023, 3, 5), "ARI", "all", "00+", 1.0),
            TimeSeriesRow::new(date(2023, 1, 2), "GI", "all", "00+", 1.0),
            TimeSeriesRow::new(date(2023, 2, 9), "ARI", "pediatric", "00+", 1.0),
        ];
        let dataset = Dataset::new(TimeSeriesTable::from_rows(rows), Vec::new());

        assert_eq!(
            dataset.date_bounds(),
            Some(DateBounds {
                min: date(2023, 1, 2),
                max: date(2023, 3, 5),
            })
        );
        assert_eq!(dataset.syndromes(), ["ARI", "GI"]);
        assert_eq!(dataset.ed_types(), ["all", "pediatric"]);
    }

    #[test]
    fn test_empty_dataset_has_no_bounds() {
        let dataset = Dataset::new(TimeSeriesTable::default(), Vec::new());
        assert!(dataset.date_bounds().is_none());
        assert!(dataset.syndromes().is_empty());
    }

    #[test]
    fn test_table_collects_extra_columns() {
        let rows = vec![TimeSeriesRow::new(date(2023, 1, 1), "ARI", "all", "00+", 1.0)
            .measure("expected_value", Some(0.9))];
        let table = TimeSeriesTable::from_rows(rows);
        assert_eq!(table.measure_columns, vec!["expected_value"]);
        assert!(table.label_columns.is_empty());
    }

    #[test]
    fn test_bounds_clamp() {
        let bounds = DateBounds {
            min: date(2023, 1, 1),
            max: date(2023, 12, 31),
        };
        assert_eq!(bounds.clamp(date(2022, 6, 1)), date(2023, 1, 1));
        assert_eq!(bounds.clamp(date(2024, 6, 1)), date(2023, 12, 31));
        assert_eq!(bounds.clamp(date(2023, 6, 1)), date(2023, 6, 1));
    }
}
