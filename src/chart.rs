// Chart preparation
//
// Reshapes a section table into long-format (month, site, value) points and
// hands them to the rendering collaborator (a Vega-Lite spec).

pub mod reshape;
pub mod vega;

pub use reshape::{
    build_chart, filter_and_reshape, ChartPoint, ReshapeOptions, Selection, SelectionError,
};
pub use vega::{render_html, ChartData, ChartHints};

/// Sections whose label contains "%" hold percentages
pub fn is_percent(label: &str) -> bool {
    label.contains('%')
}
