use serde::Serialize;
use serde_json::{json, Value};

use crate::chart::reshape::ChartPoint;
use crate::section::{Period, SectionTable};

const CHART_WIDTH: u32 = 800;
const CHART_HEIGHT: u32 = 400;

/// Presentation hints passed along with the chart points
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartHints {
    pub is_percent: bool,
    pub title: String,
    pub x_title: String,
    pub y_title: String,
    /// Fixed category order of the x axis
    pub month_order: Vec<String>,
    /// Series order as produced by the reshaper
    pub site_order: Vec<String>,
}

impl ChartHints {
    pub fn for_points(table: &SectionTable, points: &[ChartPoint]) -> Self {
        let is_percent = table.is_percent();

        let mut site_order: Vec<String> = Vec::new();
        for point in points {
            if !site_order.contains(&point.site) {
                site_order.push(point.site.clone());
            }
        }

        let mut month_order: Vec<String> = Period::canonical_labels()
            .into_iter()
            .map(String::from)
            .collect();
        // Unrecognized keys (legacy extraction) go after the canonical ones
        for point in points {
            let label = point.month.label();
            if !month_order.iter().any(|m| m == label) {
                month_order.push(label.to_string());
            }
        }

        Self {
            is_percent,
            title: format!("Monatliche Werte: {}", table.label),
            x_title: "Monat".to_string(),
            y_title: if is_percent { "%" } else { "kWh" }.to_string(),
            month_order,
            site_order,
        }
    }
}

/// Chart points plus hints, ready for a rendering collaborator
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartData {
    pub points: Vec<ChartPoint>,
    pub hints: ChartHints,
}

impl ChartData {
    /// Vega-Lite v5 line chart: x = month, y = value, one series per site
    pub fn vega_lite(&self) -> Value {
        let values: Vec<Value> = self
            .points
            .iter()
            .map(|p| {
                json!({
                    "Monat": p.month.label(),
                    "Standort": p.site,
                    "Wert": p.value,
                })
            })
            .collect();

        let mut y_axis = json!({ "title": self.hints.y_title });
        let mut value_tooltip = json!({ "field": "Wert", "type": "quantitative", "title": self.hints.y_title });
        if self.hints.is_percent {
            y_axis["labelExpr"] = json!("datum.label + ' %'");
            value_tooltip["format"] = json!(".2f");
        } else {
            value_tooltip["format"] = json!(",.0f");
        }

        json!({
            "$schema": "https://vega.github.io/schema/vega-lite/v5.json",
            "title": self.hints.title,
            "width": CHART_WIDTH,
            "height": CHART_HEIGHT,
            "data": { "values": values },
            "mark": { "type": "line", "point": true },
            "encoding": {
                "x": {
                    "field": "Monat",
                    "type": "ordinal",
                    "title": self.hints.x_title,
                    "sort": self.hints.month_order,
                },
                "y": {
                    "field": "Wert",
                    "type": "quantitative",
                    "axis": y_axis,
                },
                "color": {
                    "field": "Standort",
                    "type": "nominal",
                    "sort": self.hints.site_order,
                },
                "tooltip": [
                    { "field": "Standort", "type": "nominal" },
                    { "field": "Monat", "type": "ordinal" },
                    value_tooltip,
                ],
            },
        })
    }
}

/// Standalone HTML page rendering the chart with vega-embed
pub fn render_html(chart: &ChartData) -> String {
    // No raw '<' inside the inline script, so labels cannot close the tag
    let spec = chart.vega_lite().to_string().replace('<', "\\u003c");
    let title = escape_html(&chart.hints.title);

    format!(
        r##"<!DOCTYPE html>
<html lang="de">
<head>
  <meta charset="utf-8">
  <title>{title}</title>
  <script src="https://cdn.jsdelivr.net/npm/vega@5"></script>
  <script src="https://cdn.jsdelivr.net/npm/vega-lite@5"></script>
  <script src="https://cdn.jsdelivr.net/npm/vega-embed@6"></script>
</head>
<body>
  <div id="chart"></div>
  <script>
    vegaEmbed("#chart", {spec}, {{ actions: false }});
  </script>
</body>
</html>
"##
    )
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
