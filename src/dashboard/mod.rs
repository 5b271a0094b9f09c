//! Interactive Shell
//!
//! Turns raw selector input into a resolved selection, runs the
//! filter → aggregate → render pipeline and returns everything the page
//! needs. [`render_dashboard`] is a pure function of the loaded [`Dataset`]
//! and the current [`SelectorQuery`]; each interaction recomputes it from
//! scratch.
//!
//! # Selector rules
//!
//! - An omitted selector falls back to its first option (first syndrome,
//!   first ed_type, full date range, daily)
//! - A supplied syndrome or ed_type that is not an option is rejected
//! - Dates outside the loaded bounds are clamped; `start > end` is rejected
//! - An empty time series yields no selection and an empty line chart

mod page;

pub use page::{render_page, PLOTLY_JS_URL};

use crate::chart::{facility_map, line_chart, Figure};
use crate::data::{DateBounds, Dataset};
use crate::query::{
    aggregate, filter_rows, AggregatedSeries, DateRange, Granularity, QueryError, Selection,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Page title
pub const TITLE: &str = "Notaufnahmesurveillance Dashboard";

/// Header above the facility map
pub const MAP_HEADER: &str = "Geografische Verteilung der teilnehmenden Notaufnahmen";

/// Shown instead of the selectors when nothing is selectable
pub const EMPTY_STATE_MESSAGE: &str =
    "Keine Daten verfügbar: Die Zeitreihe enthält keine auswählbaren Werte.";

/// Shown above the line chart when the selection matches no rows
pub const NO_MATCH_MESSAGE: &str = "Für die aktuelle Auswahl liegen keine Daten vor.";

/// Upstream data sources linked from the description
pub const SOURCE_LINKS: [(&str, &str); 2] = [
    (
        "Original Tableau Dashboard",
        "https://public.data.rki.de/t/public/views/Notaufnahmesurveillance/DashboardSyndrome",
    ),
    (
        "GitHub-Repository des RKI",
        "https://github.com/robert-koch-institut/Daten_der_Notaufnahmesurveillance",
    ),
];

/// Header above the line chart for the chosen granularity
pub fn timeseries_header(granularity: Granularity) -> String {
    format!("Relative Fallzahlen im Zeitverlauf ({})", granularity.label())
}

/// Errors from resolving selector input
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SelectionError {
    #[error("Unknown syndrome: {0}")]
    UnknownSyndrome(String),

    #[error("Unknown ed_type: {0}")]
    UnknownEdType(String),

    #[error("Cannot parse date '{0}', expected YYYY-MM-DD or DD.MM.YYYY")]
    InvalidDate(String),

    #[error(transparent)]
    Query(#[from] QueryError),
}

/// Raw selector values as submitted by the page or an API client
///
/// Everything is optional text so that cleared form fields fall back to
/// defaults instead of failing extraction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SelectorQuery {
    #[serde(default)]
    pub syndrome: Option<String>,
    #[serde(default)]
    pub ed_type: Option<String>,
    /// Start date, `YYYY-MM-DD` or `DD.MM.YYYY`
    #[serde(default)]
    pub start: Option<String>,
    /// End date, `YYYY-MM-DD` or `DD.MM.YYYY`
    #[serde(default)]
    pub end: Option<String>,
    /// daily, weekly or monthly (German labels accepted)
    #[serde(default)]
    pub granularity: Option<String>,
}

/// A granularity as offered by the selector
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GranularityOption {
    pub value: Granularity,
    pub label: &'static str,
}

/// Options for every selector, derived from the dataset
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Controls {
    pub syndromes: Vec<String>,
    pub ed_types: Vec<String>,
    pub date_bounds: Option<DateBounds>,
    pub granularities: Vec<GranularityOption>,
}

impl Controls {
    pub fn from_dataset(dataset: &Dataset) -> Self {
        Self {
            syndromes: dataset.syndromes().to_vec(),
            ed_types: dataset.ed_types().to_vec(),
            date_bounds: dataset.date_bounds(),
            granularities: Granularity::ALL
                .iter()
                .map(|g| GranularityOption {
                    value: *g,
                    label: g.label(),
                })
                .collect(),
        }
    }

    /// True when there is nothing to select
    pub fn is_empty(&self) -> bool {
        self.syndromes.is_empty() || self.ed_types.is_empty() || self.date_bounds.is_none()
    }
}

/// Selector input after defaults, validation and clamping
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedSelection {
    /// `None` in the empty state
    pub selection: Option<Selection>,
    pub granularity: Granularity,
}

/// Resolve raw selector input against the dataset's options
pub fn resolve_selection(
    controls: &Controls,
    query: &SelectorQuery,
) -> Result<ResolvedSelection, SelectionError> {
    let granularity = match non_empty(&query.granularity) {
        Some(g) => g.parse::<Granularity>()?,
        None => Granularity::default(),
    };

    let bounds = match controls.date_bounds {
        Some(bounds) if !controls.is_empty() => bounds,
        _ => {
            return Ok(ResolvedSelection {
                selection: None,
                granularity,
            })
        }
    };

    let syndrome = pick_option(&controls.syndromes, non_empty(&query.syndrome))
        .ok_or_else(|| SelectionError::UnknownSyndrome(query.syndrome.clone().unwrap_or_default()))?;
    let ed_type = pick_option(&controls.ed_types, non_empty(&query.ed_type))
        .ok_or_else(|| SelectionError::UnknownEdType(query.ed_type.clone().unwrap_or_default()))?;

    let start = match non_empty(&query.start) {
        Some(s) => bounds.clamp(parse_date(s)?),
        None => bounds.min,
    };
    let end = match non_empty(&query.end) {
        Some(s) => bounds.clamp(parse_date(s)?),
        None => bounds.max,
    };

    Ok(ResolvedSelection {
        selection: Some(Selection::new(syndrome, ed_type, DateRange::new(start, end)?)),
        granularity,
    })
}

/// Run filter and aggregation for resolved selector input
pub fn run_pipeline(
    dataset: &Dataset,
    query: &SelectorQuery,
) -> Result<(ResolvedSelection, AggregatedSeries), SelectionError> {
    let controls = Controls::from_dataset(dataset);
    let resolved = resolve_selection(&controls, query)?;
    let series = pipeline(dataset, &resolved);
    Ok((resolved, series))
}

fn pipeline(dataset: &Dataset, resolved: &ResolvedSelection) -> AggregatedSeries {
    let filtered = match &resolved.selection {
        Some(selection) => filter_rows(&dataset.timeseries().rows, selection),
        None => Vec::new(),
    };
    aggregate(filtered, resolved.granularity)
}

/// Everything one page render shows
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub title: String,
    pub controls: Controls,
    pub selection: Option<Selection>,
    pub granularity: Granularity,
    pub timeseries_header: String,
    pub map_header: String,
    /// Rows plotted in the line chart
    pub series_rows: usize,
    pub line_chart: Figure,
    pub map: Figure,
}

impl DashboardView {
    /// No selectable values at all
    pub fn is_empty_state(&self) -> bool {
        self.selection.is_none()
    }
}

/// Full recomputation for one interaction
pub fn render_dashboard(
    dataset: &Dataset,
    query: &SelectorQuery,
) -> Result<DashboardView, SelectionError> {
    let controls = Controls::from_dataset(dataset);
    let resolved = resolve_selection(&controls, query)?;
    let series = pipeline(dataset, &resolved);

    tracing::debug!(
        selection = ?resolved.selection,
        granularity = %resolved.granularity,
        rows = series.len(),
        "Rendered dashboard"
    );

    Ok(DashboardView {
        title: TITLE.to_string(),
        controls,
        selection: resolved.selection,
        granularity: resolved.granularity,
        timeseries_header: timeseries_header(resolved.granularity),
        map_header: MAP_HEADER.to_string(),
        series_rows: series.len(),
        line_chart: line_chart(&series),
        map: facility_map(dataset.locations()),
    })
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// The requested option if it exists, else the first option when nothing was requested
fn pick_option(options: &[String], requested: Option<&str>) -> Option<String> {
    match requested {
        Some(r) => options.iter().find(|o| o.as_str() == r).cloned(),
        None => options.first().cloned(),
    }
}

fn parse_date(s: &str) -> Result<NaiveDate, SelectionError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(s, "%d.%m.%Y"))
        .map_err(|_| SelectionError::InvalidDate(s.to_string()))
}
