use calamine::{open_workbook_from_rs, Reader, Xlsx};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::io::Cursor;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

use crate::workbook::grid::Grid;

/// Sheet holding the monthly performance figures
pub const DEFAULT_SHEET_NAME: &str = "Performance PARK 25";

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to open workbook: {0}")]
    WorkbookOpen(String),

    #[error("Sheet not found: {0}")]
    SheetNotFound(String),
}

/// Content fingerprint of an uploaded workbook, used as cache key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WorkbookId(u64);

impl WorkbookId {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut hasher = DefaultHasher::new();
        bytes.len().hash(&mut hasher);
        bytes.hash(&mut hasher);
        Self(hasher.finish())
    }

    pub fn parse(value: &str) -> Option<Self> {
        if value.len() != 16 {
            return None;
        }
        u64::from_str_radix(value, 16).ok().map(Self)
    }
}

impl fmt::Display for WorkbookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

impl Serialize for WorkbookId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for WorkbookId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).ok_or_else(|| serde::de::Error::custom(format!("invalid workbook id: {s}")))
    }
}

/// Reads one worksheet of an xlsx workbook into a raw [`Grid`]
///
/// No header inference takes place: every cell lands in the grid at its
/// absolute sheet position. Parsing is synchronous, async callers should
/// use `spawn_blocking`.
#[derive(Debug, Clone)]
pub struct WorkbookLoader {
    sheet_name: String,
}

impl Default for WorkbookLoader {
    fn default() -> Self {
        Self::new(DEFAULT_SHEET_NAME)
    }
}

impl WorkbookLoader {
    pub fn new(sheet_name: impl Into<String>) -> Self {
        Self {
            sheet_name: sheet_name.into(),
        }
    }

    pub fn sheet_name(&self) -> &str {
        &self.sheet_name
    }

    /// Parse the configured sheet out of an in-memory xlsx stream
    pub fn load_from_bytes(&self, bytes: &[u8]) -> Result<Grid, LoadError> {
        debug!("Opening workbook from {} bytes", bytes.len());

        let mut workbook = open_workbook_from_rs::<Xlsx<_>, _>(Cursor::new(bytes))
            .map_err(|e| LoadError::WorkbookOpen(e.to_string()))?;

        if !workbook.sheet_names().iter().any(|n| n == &self.sheet_name) {
            return Err(LoadError::SheetNotFound(self.sheet_name.clone()));
        }

        let range = workbook
            .worksheet_range(&self.sheet_name)
            .map_err(|e| LoadError::WorkbookOpen(e.to_string()))?;

        let grid = Grid::from_range(&range);
        info!(
            "Loaded sheet '{}': {} rows x {} columns",
            self.sheet_name,
            grid.height(),
            grid.width()
        );
        Ok(grid)
    }

    /// Read a workbook file from disk and parse the configured sheet
    pub fn load_from_path(&self, path: impl AsRef<Path>) -> Result<(WorkbookId, Grid), LoadError> {
        let path = path.as_ref();
        info!("Reading workbook file: {}", path.display());

        let bytes = std::fs::read(path)
            .map_err(|e| LoadError::WorkbookOpen(format!("{}: {e}", path.display())))?;
        let grid = self.load_from_bytes(&bytes)?;
        Ok((WorkbookId::from_bytes(&bytes), grid))
    }
}
