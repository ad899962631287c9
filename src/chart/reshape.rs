use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use thiserror::Error;
use tracing::{debug, warn};

use crate::chart::{ChartData, ChartHints};
use crate::section::{Period, RowKey, SectionTable};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SelectionError {
    #[error("Bitte mindestens einen Standort auswählen.")]
    EmptySelection,

    #[error("Keine Daten im Zeitraum {from} bis {to}.")]
    EmptyRange { from: Period, to: Period },
}

/// Everything the user picked for one chart render
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    pub section: String,
    #[serde(default)]
    pub sites: Vec<String>,
    /// Inclusive `(from, to)` range; `None` keeps every period
    #[serde(default)]
    pub month_range: Option<(Period, Period)>,
    #[serde(default)]
    pub drop_annual_sum: bool,
    #[serde(default)]
    pub sort_sites_by_mean: bool,
}

impl Selection {
    pub fn new(section: impl Into<String>) -> Self {
        Self {
            section: section.into(),
            sites: Vec::new(),
            month_range: None,
            drop_annual_sum: false,
            sort_sites_by_mean: false,
        }
    }

    pub fn with_sites<I, S>(mut self, sites: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sites = sites.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_month_range(mut self, from: Period, to: Period) -> Self {
        self.month_range = Some((from, to));
        self
    }

    pub fn dropping_annual_sum(mut self, drop: bool) -> Self {
        self.drop_annual_sum = drop;
        self
    }

    pub fn sorted_by_mean(mut self, sort: bool) -> Self {
        self.sort_sites_by_mean = sort;
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReshapeOptions {
    /// Order sites by descending mean over the filtered range
    pub sort_sites_by_mean: bool,
}

/// One `(month, site, value)` triple of the long-format chart data
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub month: RowKey,
    pub site: String,
    pub value: Option<f64>,
}

/// Restrict `table` to `sites` and `month_range` and flatten it into one
/// point per (month, site)
///
/// An empty site list, a range endpoint missing from the table or a
/// reversed range all produce an empty result.
pub fn filter_and_reshape(
    table: &SectionTable,
    sites: &[String],
    month_range: Option<(Period, Period)>,
    options: &ReshapeOptions,
) -> Vec<ChartPoint> {
    let columns = selected_columns(table, sites);
    if columns.is_empty() {
        debug!("No known site selected for section '{}'", table.label);
        return Vec::new();
    }

    let rows: Vec<_> = match month_range {
        None => table.rows.iter().collect(),
        Some((from, to)) => {
            let available = table.available_periods();
            if !available.contains(&from) || !available.contains(&to) {
                warn!(
                    "Month range {}..{} not available in section '{}'",
                    from, to, table.label
                );
                return Vec::new();
            }
            table
                .rows
                .iter()
                .filter(|row| {
                    row.key
                        .period()
                        .is_some_and(|p| (from.position()..=to.position()).contains(&p.position()))
                })
                .collect()
        }
    };

    let columns = if options.sort_sites_by_mean {
        sort_by_mean(columns, &rows)
    } else {
        columns
    };

    let mut points = Vec::with_capacity(rows.len() * columns.len());
    for row in rows {
        for (site, col) in &columns {
            points.push(ChartPoint {
                month: row.key.clone(),
                site: site.clone(),
                value: row.values.get(*col).copied().flatten(),
            });
        }
    }
    points
}

/// Run the full selection against a section table and attach chart hints
pub fn build_chart(table: &SectionTable, selection: &Selection) -> Result<ChartData, SelectionError> {
    let options = ReshapeOptions {
        sort_sites_by_mean: selection.sort_sites_by_mean,
    };

    if selected_columns(table, &selection.sites).is_empty() {
        return Err(SelectionError::EmptySelection);
    }

    let mut points = filter_and_reshape(table, &selection.sites, selection.month_range, &options);
    if selection.drop_annual_sum {
        points.retain(|p| p.month != RowKey::Period(Period::AnnualSum));
    }

    if points.is_empty() {
        let available = table.available_periods();
        let (from, to) = selection.month_range.unwrap_or((
            available.first().copied().unwrap_or(Period::January),
            available.last().copied().unwrap_or(Period::AnnualSum),
        ));
        return Err(SelectionError::EmptyRange { from, to });
    }

    let hints = ChartHints::for_points(table, &points);
    Ok(ChartData { points, hints })
}

/// Selected sites that exist in the table, with their column index, in
/// selection order
fn selected_columns(table: &SectionTable, sites: &[String]) -> Vec<(String, usize)> {
    let mut columns: Vec<(String, usize)> = Vec::with_capacity(sites.len());
    for site in sites {
        match table.site_index(site) {
            Some(col) if !columns.iter().any(|(_, c)| *c == col) => {
                columns.push((site.clone(), col));
            }
            Some(_) => {}
            None => warn!("Site '{}' is not part of section '{}'", site, table.label),
        }
    }
    columns
}

fn sort_by_mean(
    columns: Vec<(String, usize)>,
    rows: &[&crate::section::SectionRow],
) -> Vec<(String, usize)> {
    let mut ranked: Vec<((String, usize), Option<f64>)> = columns
        .into_iter()
        .map(|(site, col)| {
            // Monthly rows only; Jahressumme would outweigh them
            let values: Vec<f64> = rows
                .iter()
                .filter(|r| r.key.period().is_some_and(Period::is_month))
                .filter_map(|r| r.values.get(col).copied().flatten())
                .collect();
            let mean = (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64);
            ((site, col), mean)
        })
        .collect();

    // Stable: ties keep selection order, sites without values go last
    ranked.sort_by(|(_, a), (_, b)| match (a, b) {
        (Some(a), Some(b)) => b.partial_cmp(a).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });

    ranked.into_iter().map(|(column, _)| column).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::section::SectionRow;

    fn table() -> SectionTable {
        SectionTable {
            label: "Ist in kWh".to_string(),
            row_key_name: "Ist in kWh".to_string(),
            sites: vec!["Nord".into(), "Süd".into(), "Ost".into()],
            rows: vec![
                SectionRow {
                    key: RowKey::Period(Period::January),
                    values: vec![Some(1.0), Some(10.0), None],
                },
                SectionRow {
                    key: RowKey::Period(Period::February),
                    values: vec![Some(3.0), Some(20.0), None],
                },
                SectionRow {
                    key: RowKey::Period(Period::AnnualSum),
                    values: vec![Some(4.0), Some(30.0), None],
                },
            ],
        }
    }

    fn sites(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_unknown_sites_are_ignored() {
        let points = filter_and_reshape(
            &table(),
            &sites(&["West", "Nord"]),
            None,
            &ReshapeOptions::default(),
        );
        assert_eq!(points.len(), 3);
        assert!(points.iter().all(|p| p.site == "Nord"));
    }

    #[test]
    fn test_missing_values_stay_missing() {
        let points = filter_and_reshape(&table(), &sites(&["Ost"]), None, &ReshapeOptions::default());
        assert_eq!(points.len(), 3);
        assert!(points.iter().all(|p| p.value.is_none()));
    }

    #[test]
    fn test_sort_by_mean_puts_sites_without_values_last() {
        let options = ReshapeOptions {
            sort_sites_by_mean: true,
        };
        let points = filter_and_reshape(
            &table(),
            &sites(&["Ost", "Nord", "Süd"]),
            Some((Period::January, Period::February)),
            &options,
        );
        let order: Vec<&str> = points.iter().take(3).map(|p| p.site.as_str()).collect();
        assert_eq!(order, vec!["Süd", "Nord", "Ost"]);
    }

    #[test]
    fn test_reversed_range_is_empty() {
        let points = filter_and_reshape(
            &table(),
            &sites(&["Nord"]),
            Some((Period::February, Period::January)),
            &ReshapeOptions::default(),
        );
        assert!(points.is_empty());
    }

    #[test]
    fn test_range_endpoint_must_be_available() {
        let points = filter_and_reshape(
            &table(),
            &sites(&["Nord"]),
            Some((Period::January, Period::March)),
            &ReshapeOptions::default(),
        );
        assert!(points.is_empty());
    }

    #[test]
    fn test_build_chart_reports_empty_selection() {
        let selection = Selection::new("Ist in kWh").with_sites(["West"]);
        assert_eq!(
            build_chart(&table(), &selection).unwrap_err(),
            SelectionError::EmptySelection
        );
    }

    #[test]
    fn test_build_chart_reports_empty_range() {
        let selection = Selection::new("Ist in kWh")
            .with_sites(["Nord"])
            .with_month_range(Period::March, Period::May);
        assert!(matches!(
            build_chart(&table(), &selection),
            Err(SelectionError::EmptyRange {
                from: Period::March,
                to: Period::May
            })
        ));
    }

    #[test]
    fn test_build_chart_can_drop_annual_sum_late() {
        let selection = Selection::new("Ist in kWh")
            .with_sites(["Nord"])
            .dropping_annual_sum(true);
        let chart = build_chart(&table(), &selection).unwrap();
        assert_eq!(chart.points.len(), 2);
        assert!(!chart.hints.is_percent);
    }

    #[test]
    fn test_selection_deserializes_with_defaults() {
        let selection: Selection = serde_json::from_str(
            r#"{"section": "Ist in kWh", "sites": ["Nord"], "month_range": ["März", "Mai"]}"#,
        )
        .unwrap();
        assert_eq!(selection.month_range, Some((Period::March, Period::May)));
        assert!(!selection.drop_annual_sum);
        assert!(!selection.sort_sites_by_mean);
    }

    #[test]
    fn test_sort_by_mean_ignores_annual_sum() {
        let mut rows: Vec<SectionRow> = Period::CANONICAL
            .into_iter()
            .filter(|p| p.is_month())
            .map(|p| SectionRow {
                key: RowKey::Period(p),
                values: vec![(p == Period::January).then_some(60.0), Some(50.0)],
            })
            .collect();
        rows.push(SectionRow {
            key: RowKey::Period(Period::AnnualSum),
            values: vec![Some(60.0), Some(600.0)],
        });
        let table = SectionTable {
            label: "Ist in kWh".to_string(),
            row_key_name: "Ist in kWh".to_string(),
            sites: vec!["X".into(), "Y".into()],
            rows,
        };

        let points = filter_and_reshape(
            &table,
            &sites(&["Y", "X"]),
            None,
            &ReshapeOptions {
                sort_sites_by_mean: true,
            },
        );
        assert_eq!(points[0].site, "X");
        assert_eq!(points[1].site, "Y");
    }
}
