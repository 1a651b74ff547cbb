//! Table interpretation.
//!
//! A table is read once: the first row with enough recognized header cells
//! becomes the header, and every later row is addressed through a
//! [`RowReader`] by [`ColumnRole`] rather than by position.

mod column;
mod reader;

#[cfg(test)]
mod tests;

pub use column::ColumnRole;
pub use reader::{
    ExtraColumn, MIN_RECOGNIZED_COLUMNS, RowReader, TableError, TableInfo, TableReader, parse_id,
};

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::doc::{ElementPath, Table};

/// Result of a cache lookup.
pub struct CachedTable<'a> {
    pub info: Result<Arc<TableInfo<'a>>, TableError>,
    /// True when this lookup did the reading; errors are reported only then.
    pub first_read: bool,
}

/// Per-document memo of table reads, keyed by the table's position in the
/// document tree.
#[derive(Default)]
pub struct TableCache<'a> {
    entries: FxHashMap<ElementPath, Result<Arc<TableInfo<'a>>, TableError>>,
    reads: usize,
}

impl<'a> TableCache<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&mut self, path: &ElementPath, table: &'a Table) -> CachedTable<'a> {
        let mut first_read = false;
        let entry = self.entries.entry(path.clone()).or_insert_with(|| {
            first_read = true;
            TableReader::read(table).map(Arc::new)
        });
        if first_read {
            self.reads += 1;
        }
        CachedTable {
            info: entry.clone(),
            first_read,
        }
    }

    /// Number of tables actually read.
    pub fn reads(&self) -> usize {
        self.reads
    }
}
