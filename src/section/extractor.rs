//! Section extraction
//!
//! Turns a located block of the grid into a [`SectionTable`]: the label row
//! provides the site names, the first column provides the row keys.
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, info, warn};

use crate::section::period::{Period, RowKey};
use crate::section::SectionError;
use crate::workbook::Grid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExtractOptions {
    /// Remove the "Jahressumme" row
    pub drop_annual_sum: bool,
    /// Reindex rows into canonical month order, dropping unrecognized keys
    pub reorder_months: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            drop_annual_sum: false,
            reorder_months: true,
        }
    }
}

/// One row of a section: its key and one value per site column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionRow {
    pub key: RowKey,
    pub values: Vec<Option<f64>>,
}

/// Canonical month-indexed view of one section
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionTable {
    pub label: String,
    /// Name of the row key column (the label row's first cell)
    pub row_key_name: String,
    pub sites: Vec<String>,
    pub rows: Vec<SectionRow>,
}

impl SectionTable {
    pub fn is_percent(&self) -> bool {
        crate::chart::is_percent(&self.label)
    }

    pub fn site_index(&self, site: &str) -> Option<usize> {
        self.sites.iter().position(|s| s == site)
    }

    pub fn row(&self, period: Period) -> Option<&SectionRow> {
        self.rows.iter().find(|r| r.key == RowKey::Period(period))
    }

    pub fn value(&self, period: Period, site: &str) -> Option<f64> {
        let col = self.site_index(site)?;
        self.row(period)?.values.get(col).copied().flatten()
    }

    /// Periods present in the table, in canonical order
    pub fn available_periods(&self) -> Vec<Period> {
        let present: HashSet<Period> = self.rows.iter().filter_map(|r| r.key.period()).collect();
        Period::CANONICAL
            .into_iter()
            .filter(|p| present.contains(p))
            .collect()
    }
}

/// Extract the section whose label row is `start_row`; data rows are
/// `start_row + 1 .. end_row`
pub fn extract(
    grid: &Grid,
    start_row: usize,
    end_row: usize,
    options: &ExtractOptions,
) -> Result<SectionTable, SectionError> {
    let label = grid.cell(start_row, 0).to_string().trim().to_string();
    let data_rows = (start_row + 1)..end_row.max(start_row + 1);
    debug!(
        "Extracting section '{}' from rows {}..{} ({:?})",
        label, data_rows.start, data_rows.end, options
    );

    let width = data_rows
        .clone()
        .map(|r| grid.row(r).len())
        .chain(std::iter::once(grid.row(start_row).len()))
        .max()
        .unwrap_or(0);

    // Site columns with at least one value across the data rows
    let site_columns: Vec<usize> = (1..width)
        .filter(|&col| data_rows.clone().any(|r| !grid.cell(r, col).is_empty()))
        .collect();

    if site_columns.is_empty() {
        return Err(SectionError::MalformedSection {
            label,
            reason: "no site column holds any value".to_string(),
        });
    }

    if data_rows.clone().all(|r| grid.cell(r, 0).is_empty()) {
        return Err(SectionError::MalformedSection {
            label,
            reason: "row key column is empty".to_string(),
        });
    }

    let sites = site_names(grid, start_row, &site_columns);

    let mut rows = Vec::with_capacity(data_rows.len());
    for r in data_rows {
        let key_cell = grid.cell(r, 0);
        if key_cell.is_empty() {
            debug!("Row {} has no key, skipping", r);
            continue;
        }
        let key = RowKey::from_label(&key_cell.to_string());
        let values = site_columns
            .iter()
            .map(|&col| grid.cell(r, col).as_number())
            .collect();
        rows.push(SectionRow { key, values });
    }

    if options.drop_annual_sum {
        rows.retain(|row| row.key != RowKey::Period(Period::AnnualSum));
    }

    if options.reorder_months {
        rows = reorder(rows, &label);
    }

    info!(
        "Extracted section '{}': {} rows x {} sites",
        label,
        rows.len(),
        sites.len()
    );

    Ok(SectionTable {
        row_key_name: label.clone(),
        label,
        sites,
        rows,
    })
}

/// Site names from the label row; blank headers get a positional name and
/// repeated names a numeric suffix
fn site_names(grid: &Grid, header_row: usize, columns: &[usize]) -> Vec<String> {
    let mut seen: Vec<String> = Vec::with_capacity(columns.len());

    for &col in columns {
        let header = grid.cell(header_row, col).to_string().trim().to_string();
        let base = if header.is_empty() {
            format!("Spalte {}", col + 1)
        } else {
            header
        };

        let mut name = base.clone();
        let mut n = 2;
        while seen.contains(&name) {
            name = format!("{base} ({n})");
            n += 1;
        }
        seen.push(name);
    }

    seen
}

/// Reindex rows into canonical order; unrecognized and repeated keys are dropped
fn reorder(rows: Vec<SectionRow>, label: &str) -> Vec<SectionRow> {
    let mut slots: Vec<Option<SectionRow>> = vec![None; Period::CANONICAL.len()];

    for row in rows {
        match row.key.period() {
            Some(period) => {
                let slot = &mut slots[period.position()];
                if slot.is_some() {
                    warn!(
                        "Section '{}' repeats row '{}', keeping the first one",
                        label, period
                    );
                } else {
                    *slot = Some(row);
                }
            }
            None => warn!(
                "Section '{}' has unrecognized row key '{}', dropping it",
                label, row.key
            ),
        }
    }

    slots.into_iter().flatten().collect()
}
