//! Facility location map

use super::{Figure, LatLon, Layout, MapTrace, Mapbox, Margin, Marker, Trace};
use crate::data::LocationRow;

/// Fixed marker color
pub const MARKER_COLOR: &str = "red";

/// Fixed marker size in pixels
pub const MARKER_SIZE: u32 = 7;

/// Tile layer
pub const MAP_STYLE: &str = "open-street-map";

/// Zoom level that fits Germany
pub const MAP_ZOOM: f64 = 4.8;

/// Centre of Germany, used when there are no facilities
pub const DEFAULT_CENTER: LatLon = LatLon {
    lat: 51.1657,
    lon: 10.4515,
};

/// Hover label for the facility type
pub const LABEL_ED_TYPE: &str = "Notaufnahmetyp";

/// Scatter map of facilities, hover label = facility name
pub fn facility_map(locations: &[LocationRow]) -> Figure {
    let data = if locations.is_empty() {
        Vec::new()
    } else {
        vec![Trace::Scattermapbox(MapTrace {
            name: String::new(),
            mode: "markers".to_string(),
            lat: locations.iter().map(|l| l.latitude).collect(),
            lon: locations.iter().map(|l| l.longitude).collect(),
            hovertext: locations.iter().map(|l| l.ed_name.clone()).collect(),
            customdata: locations.iter().map(|l| vec![l.ed_type.clone()]).collect(),
            hovertemplate: format!(
                "<b>%{{hovertext}}</b><br>{}=%{{customdata[0]}}<br>latitude=%{{lat}}<br>longitude=%{{lon}}<extra></extra>",
                LABEL_ED_TYPE
            ),
            marker: Marker {
                color: MARKER_COLOR.to_string(),
                size: MARKER_SIZE,
            },
            showlegend: false,
        })]
    };

    Figure {
        data,
        layout: Layout {
            mapbox: Some(Mapbox {
                style: MAP_STYLE.to_string(),
                center: center_of(locations),
                zoom: MAP_ZOOM,
            }),
            margin: Margin {
                t: 0,
                r: 0,
                b: 0,
                l: 0,
            },
            ..Default::default()
        },
    }
}

/// Mean facility position
fn center_of(locations: &[LocationRow]) -> LatLon {
    if locations.is_empty() {
        return DEFAULT_CENTER;
    }
    let n = locations.len() as f64;
    LatLon {
        lat: locations.iter().map(|l| l.latitude).sum::<f64>() / n,
        lon: locations.iter().map(|l| l.longitude).sum::<f64>() / n,
    }
}
