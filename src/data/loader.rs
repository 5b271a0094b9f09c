//! TSV Loader
//!
//! Reads the time-series and location tables from tab-separated files with a
//! header row. Loading is all-or-nothing: the first malformed cell aborts with
//! an error naming the file, line and value.

use super::error::{DataError, DataResult};
use super::types::{display_age_group, Dataset, LocationRow, TimeSeriesRow, TimeSeriesTable};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::collections::{BTreeMap, HashSet};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Instant;

/// Columns every time-series file must carry
pub const TIMESERIES_COLUMNS: [&str; 5] = ["date", "syndrome", "ed_type", "age_group", "relative_cases"];

/// Columns every location file must carry
pub const LOCATION_COLUMNS: [&str; 4] = ["ed_name", "latitude", "longitude", "ed_type"];

/// Cell values treated as missing in numeric columns, matching the markers
/// pandas recognises by default
pub const MISSING_MARKERS: [&str; 19] = [
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Loader for the surveillance TSV files
#[derive(Debug, Clone)]
pub struct TsvLoader {
    /// Date formats, tried in order
    date_formats: Vec<String>,
}

impl Default for TsvLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl TsvLoader {
    /// Create a loader for tab-separated files with the default date formats
    pub fn new() -> Self {
        Self {
            date_formats: vec![
                "%Y-%m-%d".to_string(),
                "%Y/%m/%d".to_string(),
                "%d.%m.%Y".to_string(),
                "%Y-%m-%dT%H:%M:%S".to_string(),
                "%Y-%m-%d %H:%M:%S".to_string(),
            ],
        }
    }

    /// Try this date format before the defaults
    pub fn with_date_format(mut self, format: &str) -> Self {
        self.date_formats.insert(0, format.to_string());
        self
    }

    /// Load both tables and derive the selector data
    pub fn load_dataset(&self, timeseries_path: &Path, locations_path: &Path) -> DataResult<Dataset> {
        let timeseries = self.load_timeseries(timeseries_path)?;
        let locations = self.load_locations(locations_path)?;
        let dataset = Dataset::new(timeseries, locations);

        match dataset.date_bounds() {
            Some(bounds) => tracing::info!(
                min_date = %bounds.min,
                max_date = %bounds.max,
                syndromes = dataset.syndromes().len(),
                ed_types = dataset.ed_types().len(),
                "Dataset ready"
            ),
            None => tracing::warn!("Time series is empty, dashboard will show an empty state"),
        }

        Ok(dataset)
    }

    /// Load the time-series table from a file
    pub fn load_timeseries(&self, path: &Path) -> DataResult<TimeSeriesTable> {
        let start = Instant::now();
        let file = open(path)?;
        let table = self.read_timeseries(file, path)?;

        tracing::info!(
            path = ?path,
            rows = table.len(),
            measures = ?table.measure_columns,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Loaded time series"
        );
        Ok(table)
    }

    /// Load the location table from a file
    pub fn load_locations(&self, path: &Path) -> DataResult<Vec<LocationRow>> {
        let start = Instant::now();
        let file = open(path)?;
        let locations = self.read_locations(file, path)?;

        tracing::info!(
            path = ?path,
            rows = locations.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Loaded locations"
        );
        Ok(locations)
    }

    /// Read the time-series table from any reader; `source` names it in errors
    pub fn read_timeseries<R: Read>(&self, reader: R, source: &Path) -> DataResult<TimeSeriesTable> {
        let csv_err = |e: csv::Error| DataError::Csv {
            path: source.to_path_buf(),
            source: e,
        };

        let mut reader = self.reader_builder().from_reader(reader);
        let headers = reader.headers().map_err(csv_err)?.clone();

        let required = TIMESERIES_COLUMNS
            .iter()
            .map(|name| column_index(&headers, name, source))
            .collect::<DataResult<Vec<usize>>>()?;
        let (date_idx, syndrome_idx, ed_type_idx, age_idx, cases_idx) =
            (required[0], required[1], required[2], required[3], required[4]);

        let extra: Vec<(usize, String)> = headers
            .iter()
            .enumerate()
            .filter(|(idx, _)| !required.contains(idx))
            .map(|(idx, name)| (idx, name.trim().to_string()))
            .collect();

        // Extra columns are classified over the whole file, so records are buffered first
        let mut records = Vec::new();
        for (idx, result) in reader.records().enumerate() {
            let record = result.map_err(csv_err)?;
            let line = record
                .position()
                .map(|p| p.line())
                .unwrap_or(idx as u64 + 2);
            records.push((line, record));
        }

        let numeric: Vec<bool> = extra
            .iter()
            .map(|(col, _)| {
                records.iter().all(|(_, record)| {
                    let cell = record.get(*col).unwrap_or("");
                    is_missing(cell) || cell.parse::<f64>().is_ok()
                })
            })
            .collect();

        let mut seen = HashSet::new();
        let mut rows = Vec::with_capacity(records.len());

        for (line, record) in &records {
            let line = *line;
            let cell = |idx: usize| record.get(idx).unwrap_or("");

            let date = self.parse_date(cell(date_idx)).ok_or_else(|| DataError::InvalidDate {
                path: source.to_path_buf(),
                line,
                value: cell(date_idx).to_string(),
            })?;

            let relative_cases = parse_optional_f64(cell(cases_idx)).ok_or_else(|| {
                DataError::InvalidNumber {
                    path: source.to_path_buf(),
                    line,
                    column: "relative_cases".to_string(),
                    value: cell(cases_idx).to_string(),
                }
            })?;

            let mut measures = BTreeMap::new();
            let mut labels = BTreeMap::new();
            for ((col, name), is_numeric) in extra.iter().zip(&numeric) {
                if *is_numeric {
                    // Classification guarantees the parse succeeds
                    measures.insert(name.clone(), parse_optional_f64(cell(*col)).flatten());
                } else {
                    labels.insert(name.clone(), cell(*col).to_string());
                }
            }

            let row = TimeSeriesRow {
                date,
                syndrome: cell(syndrome_idx).to_string(),
                ed_type: cell(ed_type_idx).to_string(),
                age_group: display_age_group(cell(age_idx)),
                relative_cases,
                measures,
                labels,
            };

            let key = (
                row.date,
                row.syndrome.clone(),
                row.ed_type.clone(),
                row.age_group.clone(),
            );
            if !seen.insert(key) {
                return Err(DataError::DuplicateRow {
                    path: source.to_path_buf(),
                    line,
                    date: row.date,
                    syndrome: row.syndrome,
                    ed_type: row.ed_type,
                    age_group: row.age_group,
                });
            }

            rows.push(row);
        }

        let measure_columns = extra
            .iter()
            .zip(&numeric)
            .filter(|(_, n)| **n)
            .map(|((_, name), _)| name.clone())
            .collect();
        let label_columns = extra
            .iter()
            .zip(&numeric)
            .filter(|(_, n)| !**n)
            .map(|((_, name), _)| name.clone())
            .collect();

        Ok(TimeSeriesTable {
            rows,
            measure_columns,
            label_columns,
        })
    }

    /// Read the location table from any reader; `source` names it in errors
    pub fn read_locations<R: Read>(&self, reader: R, source: &Path) -> DataResult<Vec<LocationRow>> {
        let csv_err = |e: csv::Error| DataError::Csv {
            path: source.to_path_buf(),
            source: e,
        };

        let mut reader = self.reader_builder().from_reader(reader);
        let headers = reader.headers().map_err(csv_err)?.clone();
        for name in LOCATION_COLUMNS {
            column_index(&headers, name, source)?;
        }

        reader
            .deserialize::<LocationRow>()
            .map(|result| result.map_err(csv_err))
            .collect()
    }

    /// Parse a date cell using the configured formats
    pub fn parse_date(&self, value: &str) -> Option<NaiveDate> {
        let value = value.trim();

        for fmt in &self.date_formats {
            if let Ok(date) = NaiveDate::parse_from_str(value, fmt) {
                return Some(date);
            }
            if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
                return Some(dt.date());
            }
        }

        DateTime::parse_from_rfc3339(value)
            .ok()
            .map(|dt| dt.date_naive())
    }

    fn reader_builder(&self) -> csv::ReaderBuilder {
        let mut builder = csv::ReaderBuilder::new();
        builder
            .delimiter(b'\t')
            .has_headers(true)
            .trim(csv::Trim::All);
        builder
    }
}

fn open(path: &Path) -> DataResult<File> {
    File::open(path).map_err(|e| DataError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}

fn column_index(headers: &csv::StringRecord, name: &str, source: &Path) -> DataResult<usize> {
    headers
        .iter()
        .position(|h| h.trim() == name)
        .ok_or_else(|| DataError::MissingColumn {
            path: source.to_path_buf(),
            column: name.to_string(),
        })
}

fn is_missing(cell: &str) -> bool {
    MISSING_MARKERS.contains(&cell.trim())
}

/// `Some(None)` for a missing cell, `Some(Some(v))` for a number, `None` if malformed
fn parse_optional_f64(cell: &str) -> Option<Option<f64>> {
    if is_missing(cell) {
        return Some(None);
    }
    cell.trim().parse::<f64>().ok().map(Some)
}
