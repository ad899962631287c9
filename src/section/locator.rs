use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

use crate::section::SectionError;
use crate::workbook::Grid;

/// Label rows of the known "Performance PARK 25" template (0-based grid rows)
pub const FIXED_SECTION_STARTS: [usize; 10] = [1, 18, 35, 52, 69, 86, 103, 120, 137, 154];

/// Data rows following each fixed label row: 12 months + Jahressumme
pub const FIXED_SECTION_DATA_ROWS: usize = 13;

/// Substring marking a section label row for the scan strategy
pub const DEFAULT_SECTION_MARKER: &str = "in kWh";

/// How section boundaries are found in the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionStrategy {
    /// Pre-declared label rows, each followed by exactly 13 data rows
    #[default]
    FixedOffset,
    /// Any row whose first cell contains the marker starts a section that
    /// runs until the next marker row (legacy behavior)
    Scan,
}

impl fmt::Display for SectionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SectionStrategy::FixedOffset => f.write_str("fixed"),
            SectionStrategy::Scan => f.write_str("scan"),
        }
    }
}

impl FromStr for SectionStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fixed" | "fixed_offset" | "fixed-offset" => Ok(SectionStrategy::FixedOffset),
            "scan" => Ok(SectionStrategy::Scan),
            other => Err(format!(
                "unknown section strategy '{other}', expected 'fixed' or 'scan'"
            )),
        }
    }
}

/// A located section: label row plus exclusive end row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionRef {
    pub label: String,
    pub start_row: usize,
    pub end_row: usize,
}

impl SectionRef {
    /// Percentage sections are rendered with a "%" axis
    pub fn is_percent(&self) -> bool {
        crate::chart::is_percent(&self.label)
    }
}

/// Finds section label rows in a grid
#[derive(Debug, Clone)]
pub struct SectionLocator {
    strategy: SectionStrategy,
    marker: String,
}

impl Default for SectionLocator {
    fn default() -> Self {
        Self::new(SectionStrategy::default())
    }
}

impl SectionLocator {
    pub fn new(strategy: SectionStrategy) -> Self {
        Self {
            strategy,
            marker: DEFAULT_SECTION_MARKER.to_string(),
        }
    }

    /// Override the marker used by [`SectionStrategy::Scan`]
    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.marker = marker.into();
        self
    }

    pub fn strategy(&self) -> SectionStrategy {
        self.strategy
    }

    /// All sections of the grid, in sheet order
    pub fn discover(&self, grid: &Grid) -> Vec<SectionRef> {
        let sections = match self.strategy {
            SectionStrategy::FixedOffset => Self::discover_fixed(grid),
            SectionStrategy::Scan => self.discover_scan(grid),
        };
        debug!(
            "Discovered {} sections using {} strategy",
            sections.len(),
            self.strategy
        );
        sections
    }

    /// Row bounds `(start_row, end_row)` of the section labelled `choice`
    ///
    /// If a label occurs more than once the first occurrence wins.
    pub fn locate(&self, grid: &Grid, choice: &str) -> Result<(usize, usize), SectionError> {
        self.discover(grid)
            .into_iter()
            .find(|s| s.label == choice)
            .map(|s| (s.start_row, s.end_row))
            .ok_or_else(|| SectionError::UnknownSection(choice.to_string()))
    }

    fn discover_fixed(grid: &Grid) -> Vec<SectionRef> {
        let mut sections = Vec::with_capacity(FIXED_SECTION_STARTS.len());

        for start_row in FIXED_SECTION_STARTS {
            if start_row >= grid.height() {
                warn!(
                    "Section start row {} is beyond the sheet ({} rows), skipping",
                    start_row,
                    grid.height()
                );
                continue;
            }

            let label = grid.cell(start_row, 0).to_string().trim().to_string();
            if label.is_empty() {
                warn!("No section label at row {}, skipping", start_row);
                continue;
            }

            sections.push(SectionRef {
                label,
                start_row,
                end_row: start_row + 1 + FIXED_SECTION_DATA_ROWS,
            });
        }

        sections
    }

    fn discover_scan(&self, grid: &Grid) -> Vec<SectionRef> {
        let marker_rows: Vec<(usize, String)> = grid
            .rows()
            .enumerate()
            .filter_map(|(idx, row)| {
                let text = row.first()?.as_text()?;
                text.contains(self.marker.as_str())
                    .then(|| (idx, text.trim().to_string()))
            })
            .collect();

        marker_rows
            .iter()
            .enumerate()
            .map(|(i, (start_row, label))| SectionRef {
                label: label.clone(),
                start_row: *start_row,
                end_row: marker_rows
                    .get(i + 1)
                    .map(|(next, _)| *next)
                    .unwrap_or_else(|| grid.height()),
            })
            .collect()
    }
}
