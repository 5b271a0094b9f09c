//! Surveillance data tables
//!
//! Loads the two tab-separated inputs:
//!
//! - **Time series**: one row per (date, syndrome, ed_type, age_group) with
//!   `relative_cases` and any further numeric measures
//! - **Locations**: one row per participating emergency department
//!
//! The loaded [`Dataset`] is immutable and also carries the selector data
//! (date bounds, distinct syndromes and ed_types).

mod error;
mod loader;
mod types;

pub use error::{DataError, DataResult};
pub use loader::{TsvLoader, LOCATION_COLUMNS, TIMESERIES_COLUMNS};
pub use types::{
    display_age_group, DateBounds, Dataset, LocationRow, TimeSeriesRow, TimeSeriesTable,
    ALL_AGES_LABEL, RAW_ALL_AGES,
};
