pub mod performance_service;
pub mod workbook_cache;

pub use performance_service::{PerformanceService, SectionSummary, WorkbookSummary};
pub use workbook_cache::{LoadedWorkbook, WorkbookCache};
