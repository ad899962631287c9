// Workbook access
//
// Turns an uploaded xlsx stream into a raw, header-less cell grid. All
// section lookups work on absolute grid coordinates (row 0 = sheet row 1).

pub mod grid;
pub mod loader;

pub use grid::{Cell, Grid};
pub use loader::{LoadError, WorkbookId, WorkbookLoader, DEFAULT_SHEET_NAME};
