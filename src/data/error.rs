//! Data loading error types
//!
//! Every error here is fatal at startup: there is no partial-load mode.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading the surveillance tables
#[derive(Error, Debug)]
pub enum DataError {
    /// Input file could not be opened or read
    #[error("Failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Delimited-text decoding failed
    #[error("Malformed TSV in {path:?}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// A required header is absent
    #[error("{path:?} is missing required column '{column}'")]
    MissingColumn { path: PathBuf, column: String },

    /// Date cell does not match any accepted format
    #[error("{path:?} line {line}: cannot parse date '{value}'")]
    InvalidDate {
        path: PathBuf,
        line: u64,
        value: String,
    },

    /// Numeric cell does not parse as a float
    #[error("{path:?} line {line}: column '{column}' has non-numeric value '{value}'")]
    InvalidNumber {
        path: PathBuf,
        line: u64,
        column: String,
        value: String,
    },

    /// Two rows share (date, syndrome, ed_type, age_group)
    #[error(
        "{path:?} line {line}: duplicate row for date={date}, syndrome={syndrome}, ed_type={ed_type}, age_group={age_group}"
    )]
    DuplicateRow {
        path: PathBuf,
        line: u64,
        date: chrono::NaiveDate,
        syndrome: String,
        ed_type: String,
        age_group: String,
    },
}

/// Result type alias for data loading
pub type DataResult<T> = Result<T, DataError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DataError::MissingColumn {
            path: PathBuf::from("zeitreihen.tsv"),
            column: "date".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "\"zeitreihen.tsv\" is missing required column 'date'"
        );

        let err = DataError::InvalidDate {
            path: PathBuf::from("zeitreihen.tsv"),
            line: 7,
            value: "2023-13-45".to_string(),
        };
        assert!(err.to_string().contains("line 7"));
        assert!(err.to_string().contains("2023-13-45"));
    }
}
