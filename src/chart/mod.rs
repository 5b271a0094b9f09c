//! Chart Renderer
//!
//! Builds Plotly figure documents (`{"data": [...], "layout": {...}}`) that
//! the dashboard page hands to plotly.js. Rendering is stateless and never
//! fails: empty input produces a figure with zero traces.
//!
//! - [`line_chart`]: relative cases over time, one line per age group
//! - [`facility_map`]: participating emergency departments on a street map

mod line;
mod map;

pub use line::{line_chart, LABEL_AGE_GROUP, LABEL_CASES, LABEL_DATE, SERIES_COLORS};
pub use map::{
    facility_map, DEFAULT_CENTER, LABEL_ED_TYPE, MAP_STYLE, MAP_ZOOM, MARKER_COLOR, MARKER_SIZE,
};

use serde::Serialize;

/// A complete Plotly figure
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Figure {
    pub data: Vec<Trace>,
    pub layout: Layout,
}

impl Figure {
    /// Number of data series
    pub fn trace_count(&self) -> usize {
        self.data.len()
    }

    /// Number of plotted points across all series
    pub fn point_count(&self) -> usize {
        self.data.iter().map(Trace::len).sum()
    }

    /// Serialize for embedding in a page
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// A single Plotly trace
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Trace {
    Scatter(ScatterTrace),
    Scattermapbox(MapTrace),
}

impl Trace {
    /// Number of points in this trace
    pub fn len(&self) -> usize {
        match self {
            Self::Scatter(t) => t.x.len(),
            Self::Scattermapbox(t) => t.lat.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Line trace on cartesian axes
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterTrace {
    pub name: String,
    pub legendgroup: String,
    pub mode: String,
    /// Dates as `YYYY-MM-DD`
    pub x: Vec<String>,
    /// Missing values serialize as `null` and draw as gaps
    pub y: Vec<Option<f64>>,
    pub line: LineStyle,
    pub hovertemplate: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineStyle {
    pub color: String,
}

/// Point trace on a tile map
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapTrace {
    pub name: String,
    pub mode: String,
    pub lat: Vec<f64>,
    pub lon: Vec<f64>,
    pub hovertext: Vec<String>,
    pub customdata: Vec<Vec<String>>,
    pub hovertemplate: String,
    pub marker: Marker,
    pub showlegend: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub color: String,
    pub size: u32,
}

/// Figure layout
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Layout {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xaxis: Option<Axis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yaxis: Option<Axis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legend: Option<Legend>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mapbox: Option<Mapbox>,
    pub margin: Margin,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Title {
    pub text: String,
}

impl Title {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Axis {
    pub title: Title,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Legend {
    pub title: Title,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Mapbox {
    pub style: String,
    pub center: LatLon,
    pub zoom: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Margin {
    pub t: u32,
    pub r: u32,
    pub b: u32,
    pub l: u32,
}

impl Default for Margin {
    fn default() -> Self {
        Self {
            t: 20,
            r: 10,
            b: 40,
            l: 60,
        }
    }
}
