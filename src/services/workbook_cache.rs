use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

use crate::section::{ExtractOptions, SectionRef, SectionTable};
use crate::workbook::{Grid, WorkbookId};

/// A parsed workbook together with its discovered sections
#[derive(Debug)]
pub struct LoadedWorkbook {
    pub id: WorkbookId,
    pub sheet_name: String,
    pub grid: Grid,
    pub sections: Vec<SectionRef>,
    pub loaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct TableKey {
    workbook: WorkbookId,
    start_row: usize,
    end_row: usize,
    options: ExtractOptions,
}

#[derive(Default)]
struct CacheState {
    workbooks: HashMap<WorkbookId, Arc<LoadedWorkbook>>,
    tables: HashMap<TableKey, Arc<SectionTable>>,
}

/// Memoizes parsed workbooks (by content) and extracted section tables
///
/// Purely an optimization: every entry can be recomputed from the upload.
/// Holds at most `capacity` workbooks; the oldest one is evicted first,
/// together with its tables.
#[derive(Clone)]
pub struct WorkbookCache {
    state: Arc<RwLock<CacheState>>,
    capacity: usize,
}

impl WorkbookCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Arc::new(RwLock::new(CacheState::default())),
            capacity: capacity.max(1),
        }
    }

    pub fn get(&self, id: WorkbookId) -> Option<Arc<LoadedWorkbook>> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.workbooks.get(&id).cloned()
    }

    pub fn insert(&self, workbook: LoadedWorkbook) -> Arc<LoadedWorkbook> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);

        while state.workbooks.len() >= self.capacity && !state.workbooks.contains_key(&workbook.id) {
            let Some(oldest) = state
                .workbooks
                .values()
                .min_by_key(|w| w.loaded_at)
                .map(|w| w.id)
            else {
                break;
            };
            debug!("Evicting workbook {} from cache", oldest);
            state.workbooks.remove(&oldest);
            state.tables.retain(|key, _| key.workbook != oldest);
        }

        let workbook = Arc::new(workbook);
        state.workbooks.insert(workbook.id, Arc::clone(&workbook));
        workbook
    }

    pub fn table(
        &self,
        workbook: WorkbookId,
        start_row: usize,
        end_row: usize,
        options: ExtractOptions,
    ) -> Option<Arc<SectionTable>> {
        let key = TableKey {
            workbook,
            start_row,
            end_row,
            options,
        };
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.tables.get(&key).cloned()
    }

    pub fn insert_table(
        &self,
        workbook: WorkbookId,
        start_row: usize,
        end_row: usize,
        options: ExtractOptions,
        table: SectionTable,
    ) -> Arc<SectionTable> {
        let key = TableKey {
            workbook,
            start_row,
            end_row,
            options,
        };
        let table = Arc::new(table);
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        // Skip tables of workbooks evicted in the meantime
        if state.workbooks.contains_key(&workbook) {
            state.tables.insert(key, Arc::clone(&table));
        }
        table
    }

    pub fn len(&self) -> usize {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.workbooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
