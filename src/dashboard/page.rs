//! Server-rendered dashboard page
//!
//! A single HTML document: a sidebar form whose fields resubmit on change,
//! and two plot containers filled by plotly.js from embedded figure JSON.

use super::{DashboardView, EMPTY_STATE_MESSAGE, NO_MATCH_MESSAGE, SOURCE_LINKS};
use crate::chart::Figure;
use crate::query::Granularity;
use std::fmt::Write;

/// Linked from the description as the data basis
const AKTIN_REGISTER_URL: &str =
    "https://public.data.rki.de/t/public/views/Notaufnahmesurveillance/DashboardSyndrome";

/// plotly.js bundle loaded by the page
pub const PLOTLY_JS_URL: &str = "https://cdn.plot.ly/plotly-2.27.0.min.js";

const STYLE: &str = "\
body{margin:0;font-family:sans-serif;display:flex;min-height:100vh}\
aside{width:18rem;padding:1rem;background:#f0f2f6;box-sizing:border-box}\
aside label{display:block;margin:.8rem 0 .2rem;font-size:.9rem}\
aside select,aside input{width:100%;box-sizing:border-box}\
main{flex:1;padding:1rem 2rem;min-width:0}\
.range{font-size:.8rem;color:#555}\
.notice{padding:.6rem;background:#fff3cd;border-radius:4px}\
.plot{width:100%;height:480px}";

/// Render the complete page for a view
pub fn render_page(view: &DashboardView) -> String {
    let mut html = String::with_capacity(16 * 1024);
    html.push_str("<!DOCTYPE html>\n<html lang=\"de\">\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    let _ = writeln!(html, "<title>{}</title>", escape(&view.title));
    let _ = writeln!(html, "<script src=\"{}\"></script>", PLOTLY_JS_URL);
    let _ = writeln!(html, "<style>{}</style>", STYLE);
    html.push_str("</head>\n<body>\n");

    render_sidebar(&mut html, view);

    html.push_str("<main>\n");
    let _ = writeln!(html, "<h1>{}</h1>", escape(&view.title));
    render_description(&mut html);

    let _ = writeln!(html, "<h2>{}</h2>", escape(&view.timeseries_header));
    if !view.is_empty_state() && view.series_rows == 0 {
        let _ = writeln!(html, "<p class=\"notice\">{}</p>", escape(NO_MATCH_MESSAGE));
    }
    html.push_str("<div id=\"line-chart\" class=\"plot\"></div>\n");

    let _ = writeln!(html, "<h2>{}</h2>", escape(&view.map_header));
    html.push_str("<div id=\"map-chart\" class=\"plot\"></div>\n");
    html.push_str("</main>\n");

    html.push_str("<script>\n");
    render_plot(&mut html, "line-chart", &view.line_chart);
    render_plot(&mut html, "map-chart", &view.map);
    html.push_str("</script>\n</body>\n</html>\n");
    html
}

fn render_sidebar(html: &mut String, view: &DashboardView) {
    let controls = &view.controls;
    html.push_str("<aside>\n<form method=\"get\" action=\"/\">\n");

    html.push_str("<h2>Filter</h2>\n");
    if view.is_empty_state() {
        let _ = writeln!(html, "<p class=\"notice\">{}</p>", escape(EMPTY_STATE_MESSAGE));
    }
    let selection = view.selection.as_ref();

    render_select(
        html,
        "syndrome",
        "Wähle Syndrom",
        controls.syndromes.iter().map(|s| (s.as_str(), s.as_str())),
        selection.map(|s| s.syndrome.as_str()),
    );
    render_select(
        html,
        "ed_type",
        "Wähle Notaufnahmetyp",
        controls.ed_types.iter().map(|s| (s.as_str(), s.as_str())),
        selection.map(|s| s.ed_type.as_str()),
    );

    html.push_str("<label>Zeitraum wählen</label>\n");
    match (controls.date_bounds, selection) {
        (Some(bounds), Some(selection)) => {
            let min = bounds.min.format("%Y-%m-%d");
            let max = bounds.max.format("%Y-%m-%d");
            for (name, value) in [
                ("start", selection.date_range.start),
                ("end", selection.date_range.end),
            ] {
                let _ = writeln!(
                    html,
                    "<input type=\"date\" name=\"{}\" min=\"{}\" max=\"{}\" value=\"{}\" onchange=\"this.form.submit()\">",
                    name,
                    min,
                    max,
                    value.format("%Y-%m-%d")
                );
            }
            let _ = writeln!(
                html,
                "<p class=\"range\">{} – {}</p>",
                selection.date_range.start.format("%d.%m.%Y"),
                selection.date_range.end.format("%d.%m.%Y")
            );
        }
        _ => {
            html.push_str("<input type=\"date\" name=\"start\" disabled>\n");
            html.push_str("<input type=\"date\" name=\"end\" disabled>\n");
        }
    }

    html.push_str("<h2>Anzeigeoptionen</h2>\n");
    render_select(
        html,
        "granularity",
        "Wähle Aggregation für Zeitverlauf",
        Granularity::ALL.iter().map(|g| (g.to_string(), g.label().to_string())),
        Some(view.granularity.to_string().as_str()),
    );

    html.push_str("<noscript><button type=\"submit\">Anwenden</button></noscript>\n");
    html.push_str("</form>\n</aside>\n");
}

/// `<select>` that submits its form on change, disabled without options
fn render_select<S: AsRef<str>>(
    html: &mut String,
    name: &str,
    label: &str,
    options: impl Iterator<Item = (S, S)>,
    selected: Option<&str>,
) {
    let _ = writeln!(html, "<label for=\"{name}\">{}</label>", escape(label));
    let mut body = String::new();
    for (value, text) in options {
        let (value, text) = (value.as_ref(), text.as_ref());
        let marker = if Some(value) == selected { " selected" } else { "" };
        let _ = writeln!(
            body,
            "<option value=\"{}\"{}>{}</option>",
            escape(value),
            marker,
            escape(text)
        );
    }
    let disabled = if body.is_empty() { " disabled" } else { "" };
    let _ = writeln!(
        html,
        "<select id=\"{name}\" name=\"{name}\" onchange=\"this.form.submit()\"{disabled}>"
    );
    html.push_str(&body);
    html.push_str("</select>\n");
}

fn render_description(html: &mut String) {
    let _ = writeln!(
        html,
        "<p>Dieses Dashboard zeigt die Ergebnisse der Notaufnahmesurveillance am Robert Koch-Institut (RKI) \
         wie Trends und geografische Verteilungen zu verschiedenen Syndromen in Notaufnahmen Deutschlands. \
         Die Daten basieren auf dem \
         <a href=\"{}\" target=\"_blank\" rel=\"noopener\">AKTIN-Notaufnahmeregister</a>.</p>",
        escape(AKTIN_REGISTER_URL)
    );
    html.push_str("<ul>\n");
    for (text, url) in SOURCE_LINKS {
        let _ = writeln!(
            html,
            "<li><a href=\"{}\" target=\"_blank\" rel=\"noopener\">{}</a></li>",
            escape(url),
            escape(text)
        );
    }
    html.push_str("</ul>\n");
}

fn render_plot(html: &mut String, target: &str, figure: &Figure) {
    let json = match figure.to_json() {
        Ok(json) => script_safe(&json),
        Err(e) => {
            tracing::error!(target_id = target, error = %e, "Failed to serialize figure");
            "{\"data\":[],\"layout\":{}}".to_string()
        }
    };
    let _ = writeln!(
        html,
        "(function(){{var f={json};Plotly.newPlot('{target}',f.data,f.layout,{{responsive:true}});}})();"
    );
}

/// JSON is valid JS; only a closing tag sequence can break out of the script element
fn script_safe(json: &str) -> String {
    json.replace("</", "<\\/")
}

/// Escape text for HTML content and attribute values
pub(crate) fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::{render_dashboard, SelectorQuery};
    use crate::data::{Dataset, LocationRow, TimeSeriesRow, TimeSeriesTable};
    use chrono::NaiveDate;

    fn dataset() -> Dataset {
        let d = |day| NaiveDate::from_ymd_opt(2023, 1, day).unwrap();
        let rows = vec![
            TimeSeriesRow::new(d(1), "ARI", "all", "00+", 2.0),
            TimeSeriesRow::new(d(2), "ARI", "all", "00+", 4.0),
            TimeSeriesRow::new(d(1), "<b>GI</b>", "all", "00+", 1.0),
        ];
        let locations = vec![LocationRow {
            ed_name: "Klinikum </script> A".to_string(),
            latitude: 52.5,
            longitude: 13.4,
            ed_type: "all".to_string(),
        }];
        Dataset::new(TimeSeriesTable::from_rows(rows), locations)
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("a<b>&\"c'"), "a&lt;b&gt;&amp;&quot;c&#x27;");
        assert_eq!(escape("Wöchentlich"), "Wöchentlich");
    }

    #[test]
    fn test_page_contains_labels() {
        let view = render_dashboard(&dataset(), &SelectorQuery::default()).unwrap();
        let html = render_page(&view);

        assert!(html.contains("<h1>Notaufnahmesurveillance Dashboard</h1>"));
        assert!(html.contains("<h2>Filter</h2>"));
        assert!(html.contains("<h2>Anzeigeoptionen</h2>"));
        assert!(html.contains("Wähle Syndrom"));
        assert!(html.contains("Wähle Notaufnahmetyp"));
        assert!(html.contains("Zeitraum wählen"));
        assert!(html.contains("Wähle Aggregation für Zeitverlauf"));
        assert!(html.contains("Relative Fallzahlen im Zeitverlauf (Täglich)"));
        assert!(html.contains("Geografische Verteilung der teilnehmenden Notaufnahmen"));
        assert!(html.contains("01.01.2023 – 02.01.2023"));
        assert!(html.contains(PLOTLY_JS_URL));
        for (_, url) in SOURCE_LINKS {
            assert!(html.contains(url));
        }
    }

    #[test]
    fn test_description_text() {
        let view = render_dashboard(&dataset(), &SelectorQuery::default()).unwrap();
        let html = render_page(&view);

        assert!(html.contains(
            "Dieses Dashboard zeigt die Ergebnisse der Notaufnahmesurveillance am Robert Koch-Institut (RKI) \
             wie Trends und geografische Verteilungen zu verschiedenen Syndromen in Notaufnahmen Deutschlands."
        ));
        assert!(html.contains(">AKTIN-Notaufnahmeregister</a>"));
        assert!(html.contains(">Original Tableau Dashboard</a>"));
        assert!(html.contains(">GitHub-Repository des RKI</a>"));
    }

    #[test]
    fn test_selected_options_marked() {
        let query = SelectorQuery {
            granularity: Some("weekly".to_string()),
            ..Default::default()
        };
        let view = render_dashboard(&dataset(), &query).unwrap();
        let html = render_page(&view);

        assert!(html.contains("<option value=\"ARI\" selected>ARI</option>"));
        assert!(html.contains("<option value=\"weekly\" selected>Wöchentlich</option>"));
        assert!(html.contains("<option value=\"daily\">Täglich</option>"));
    }

    #[test]
    fn test_untrusted_text_escaped() {
        let view = render_dashboard(&dataset(), &SelectorQuery::default()).unwrap();
        let html = render_page(&view);

        assert!(html.contains("&lt;b&gt;GI&lt;/b&gt;"));
        assert!(!html.contains("<b>GI</b>"));
        // Only the page's own closing script tags remain
        assert_eq!(html.matches("</script>").count(), 2);
    }

    #[test]
    fn test_empty_state_page() {
        let dataset = Dataset::new(TimeSeriesTable::default(), Vec::new());
        let view = render_dashboard(&dataset, &SelectorQuery::default()).unwrap();
        let html = render_page(&view);

        assert!(html.contains(EMPTY_STATE_MESSAGE));
        assert!(html.contains("<select id=\"syndrome\" name=\"syndrome\" onchange=\"this.form.submit()\" disabled>"));
        assert!(html.contains("id=\"map-chart\""));
    }
}
