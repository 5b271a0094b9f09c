//! Time-series line chart

use super::{Axis, Figure, Layout, Legend, LineStyle, ScatterTrace, Title, Trace};
use crate::query::AggregatedSeries;

/// X-axis title
pub const LABEL_DATE: &str = "Datum";

/// Y-axis title
pub const LABEL_CASES: &str = "Relative Fallzahlen";

/// Legend title
pub const LABEL_AGE_GROUP: &str = "Altersgruppe";

/// Series colors, assigned to age groups in order of first appearance
pub const SERIES_COLORS: [&str; 10] = [
    "#636EFA", "#EF553B", "#00CC96", "#AB63FA", "#FFA15A", "#19D3F3", "#FF6692", "#B6E880",
    "#FF97FF", "#FECB52",
];

/// Line chart of relative cases over time, one trace per age group
pub fn line_chart(series: &AggregatedSeries) -> Figure {
    let data = series
        .age_groups()
        .into_iter()
        .enumerate()
        .map(|(idx, age_group)| {
            let mut points: Vec<_> = series
                .rows
                .iter()
                .filter(|r| r.age_group == age_group)
                .collect();
            points.sort_by_key(|p| p.date);

            Trace::Scatter(ScatterTrace {
                name: age_group.to_string(),
                legendgroup: age_group.to_string(),
                mode: "lines".to_string(),
                x: points
                    .iter()
                    .map(|p| p.date.format("%Y-%m-%d").to_string())
                    .collect(),
                y: points.iter().map(|p| p.relative_cases).collect(),
                line: LineStyle {
                    color: SERIES_COLORS[idx % SERIES_COLORS.len()].to_string(),
                },
                hovertemplate: format!(
                    "{}={}<br>{}=%{{x}}<br>{}=%{{y}}<extra></extra>",
                    LABEL_AGE_GROUP, age_group, LABEL_DATE, LABEL_CASES
                ),
            })
        })
        .collect();

    Figure {
        data,
        layout: Layout {
            xaxis: Some(Axis {
                title: Title::new(LABEL_DATE),
            }),
            yaxis: Some(Axis {
                title: Title::new(LABEL_CASES),
            }),
            legend: Some(Legend {
                title: Title::new(LABEL_AGE_GROUP),
            }),
            ..Default::default()
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::TimeSeriesRow;
    use crate::query::{aggregate, Granularity};
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_empty_series_has_no_traces() {
        let series = aggregate(Vec::new(), Granularity::Daily);
        let fig = line_chart(&series);

        assert_eq!(fig.trace_count(), 0);
        assert_eq!(fig.point_count(), 0);
        assert_eq!(fig.layout.xaxis.as_ref().unwrap().title.text, "Datum");
        assert_eq!(fig.layout.yaxis.as_ref().unwrap().title.text, "Relative Fallzahlen");
        assert_eq!(fig.layout.legend.as_ref().unwrap().title.text, "Altersgruppe");
        assert!(fig.to_json().is_ok());
    }

    #[test]
    fn test_one_trace_per_age_group() {
        let rows = vec![
            TimeSeriesRow::new(date(2023, 1, 2), "ARI", "all", "00+", 2.0),
            TimeSeriesRow::new(date(2023, 1, 1), "ARI", "all", "00+", 1.0),
            TimeSeriesRow::new(date(2023, 1, 1), "ARI", "all", "15-34", 3.0),
        ];
        let fig = line_chart(&aggregate(rows, Granularity::Daily));

        assert_eq!(fig.trace_count(), 2);
        assert_eq!(fig.point_count(), 3);

        let Trace::Scatter(first) = &fig.data[0] else {
            panic!("expected a scatter trace");
        };
        assert_eq!(first.name, "Alle");
        assert_eq!(first.x, vec!["2023-01-01", "2023-01-02"]);
        assert_eq!(first.y, vec![Some(1.0), Some(2.0)]);
        assert_eq!(first.line.color, SERIES_COLORS[0]);

        let Trace::Scatter(second) = &fig.data[1] else {
            panic!("expected a scatter trace");
        };
        assert_eq!(second.name, "15-34");
        assert_eq!(second.line.color, SERIES_COLORS[1]);
    }

    #[test]
    fn test_json_shape() {
        let rows = vec![TimeSeriesRow::new(date(2023, 1, 1), "ARI", "all", "00+", 1.0)];
        let json = line_chart(&aggregate(rows, Granularity::Daily)).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["data"][0]["type"], "scatter");
        assert_eq!(value["data"][0]["mode"], "lines");
        assert_eq!(value["layout"]["xaxis"]["title"]["text"], "Datum");
        assert!(!json.contains("00+"));
    }

    #[test]
    fn test_missing_value_serializes_as_null() {
        let mut row = TimeSeriesRow::new(date(2023, 1, 1), "ARI", "all", "00+", 0.0);
        row.relative_cases = None;
        let json = line_chart(&aggregate(vec![row], Granularity::Daily)).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(value["data"][0]["y"][0].is_null());
    }
}
