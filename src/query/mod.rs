//! Filter and aggregation pipeline
//!
//! - **Filter**: keep rows of one syndrome and ed_type within an inclusive
//!   date range
//! - **Aggregate**: daily pass-through, or weekly/monthly means per age group
//!
//! # Example
//!
//! ```rust,ignore
//! use edsurv::query::{aggregate, filter_rows, DateRange, Granularity, Selection};
//!
//! let range = DateRange::new(start, end)?;
//! let selection = Selection::new("ARI", "all", range);
//! let filtered = filter_rows(&dataset.timeseries().rows, &selection);
//! let weekly = aggregate(filtered, Granularity::Weekly);
//! ```

mod aggregate;
mod error;
mod filter;

pub use aggregate::{aggregate, AggregatedSeries, Granularity, SeriesPoint, WEEK_END};
pub use error::{QueryError, QueryResult};
pub use filter::{filter_rows, DateRange, Selection};
