use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::chart::{build_chart, ChartData, Selection};
use crate::config::Config;
use crate::error::PerformanceError;
use crate::section::{extract, ExtractOptions, SectionLocator, SectionRef, SectionTable};
use crate::services::workbook_cache::{LoadedWorkbook, WorkbookCache};
use crate::workbook::{WorkbookId, WorkbookLoader};

#[derive(Debug, Clone, Serialize)]
pub struct SectionSummary {
    pub label: String,
    pub start_row: usize,
    pub end_row: usize,
    pub is_percent: bool,
}

impl From<&SectionRef> for SectionSummary {
    fn from(section: &SectionRef) -> Self {
        Self {
            label: section.label.clone(),
            start_row: section.start_row,
            end_row: section.end_row,
            is_percent: section.is_percent(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkbookSummary {
    pub workbook_id: WorkbookId,
    pub sheet_name: String,
    pub loaded_at: DateTime<Utc>,
    pub sections: Vec<SectionSummary>,
}

impl From<&LoadedWorkbook> for WorkbookSummary {
    fn from(workbook: &LoadedWorkbook) -> Self {
        Self {
            workbook_id: workbook.id,
            sheet_name: workbook.sheet_name.clone(),
            loaded_at: workbook.loaded_at,
            sections: workbook.sections.iter().map(SectionSummary::from).collect(),
        }
    }
}

/// Load → locate → extract → reshape, with memoized workbooks and tables
#[derive(Clone)]
pub struct PerformanceService {
    loader: WorkbookLoader,
    locator: SectionLocator,
    cache: WorkbookCache,
}

impl PerformanceService {
    pub fn new(loader: WorkbookLoader, locator: SectionLocator, cache: WorkbookCache) -> Self {
        Self {
            loader,
            locator,
            cache,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            WorkbookLoader::new(config.sheet_name.clone()),
            SectionLocator::new(config.section_strategy).with_marker(config.section_marker.clone()),
            WorkbookCache::new(config.workbook_cache_capacity),
        )
    }

    /// Parse an uploaded workbook, or reuse the cached parse of identical bytes
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub fn load_workbook(&self, bytes: &[u8]) -> Result<WorkbookSummary, PerformanceError> {
        let id = WorkbookId::from_bytes(bytes);
        if let Some(workbook) = self.cache.get(id) {
            debug!("Workbook {} served from cache", id);
            return Ok(WorkbookSummary::from(workbook.as_ref()));
        }

        let grid = self.loader.load_from_bytes(bytes)?;
        let sections = self.locator.discover(&grid);
        info!("Workbook {} has {} sections", id, sections.len());

        let workbook = self.cache.insert(LoadedWorkbook {
            id,
            sheet_name: self.loader.sheet_name().to_string(),
            grid,
            sections,
            loaded_at: Utc::now(),
        });
        Ok(WorkbookSummary::from(workbook.as_ref()))
    }

    pub fn workbook(&self, id: &str) -> Result<Arc<LoadedWorkbook>, PerformanceError> {
        WorkbookId::parse(id)
            .and_then(|id| self.cache.get(id))
            .ok_or_else(|| PerformanceError::WorkbookNotFound(id.to_string()))
    }

    pub fn sections(&self, id: &str) -> Result<Vec<SectionSummary>, PerformanceError> {
        let workbook = self.workbook(id)?;
        Ok(workbook.sections.iter().map(SectionSummary::from).collect())
    }

    /// Canonical table of one section of a loaded workbook
    #[instrument(skip(self))]
    pub fn section_table(
        &self,
        id: &str,
        section: &str,
        options: ExtractOptions,
    ) -> Result<Arc<SectionTable>, PerformanceError> {
        let workbook = self.workbook(id)?;
        let (start_row, end_row) = self.locator.locate(&workbook.grid, section)?;

        if let Some(table) = self.cache.table(workbook.id, start_row, end_row, options) {
            debug!("Section '{}' served from cache", section);
            return Ok(table);
        }

        let table = extract(&workbook.grid, start_row, end_row, &options)?;
        Ok(self
            .cache
            .insert_table(workbook.id, start_row, end_row, options, table))
    }

    /// Chart data for one selection; empty selections and ranges come back
    /// as [`PerformanceError::Selection`]
    #[instrument(skip(self, selection), fields(section = %selection.section))]
    pub fn chart(&self, id: &str, selection: &Selection) -> Result<ChartData, PerformanceError> {
        let options = ExtractOptions {
            drop_annual_sum: selection.drop_annual_sum,
            reorder_months: true,
        };
        let table = self.section_table(id, &selection.section, options)?;
        let chart = build_chart(&table, selection)?;
        info!(
            "Built chart for '{}' with {} points",
            selection.section,
            chart.points.len()
        );
        Ok(chart)
    }
}
