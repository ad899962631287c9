use crate::chart::SelectionError;
use crate::section::SectionError;
use crate::workbook::LoadError;

#[derive(Debug, thiserror::Error)]
pub enum PerformanceError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Section(#[from] SectionError),

    #[error(transparent)]
    Selection(#[from] SelectionError),

    #[error("Workbook not loaded: {0}")]
    WorkbookNotFound(String),
}

impl PerformanceError {
    /// Short machine-readable kind, used in API error bodies
    pub fn kind(&self) -> &'static str {
        match self {
            PerformanceError::Load(LoadError::WorkbookOpen(_)) => "load_error",
            PerformanceError::Load(LoadError::SheetNotFound(_)) => "sheet_not_found",
            PerformanceError::Section(SectionError::UnknownSection(_)) => "unknown_section",
            PerformanceError::Section(SectionError::MalformedSection { .. }) => "malformed_section",
            PerformanceError::Selection(SelectionError::EmptySelection) => "nothing_selected",
            PerformanceError::Selection(SelectionError::EmptyRange { .. }) => "empty_range",
            PerformanceError::WorkbookNotFound(_) => "workbook_not_found",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {msg}")]
    InvalidValue { name: &'static str, msg: String },
}
