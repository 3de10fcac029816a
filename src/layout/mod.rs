//! Positional table detection over raw cell grids.

use thiserror::Error;

mod header;
mod item_column;

pub use header::{YearColumn, find_label_header_row, find_year_header_row, year_columns};
pub use item_column::{is_label_like, select_item_column};

/// Raw 2-D cell grid as produced by a spreadsheet or CSV reader.
pub type Grid = Vec<Vec<String>>;

pub const HEADER_SCAN_ROWS: usize = 40;
pub const ITEM_SAMPLE_ROWS: usize = 80;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("no header row with year columns in the first {0} rows")]
    NoHeaderRow(usize),
    #[error("no candidate item column")]
    NoItemColumn,
}

pub(crate) fn cell(row: &[String], index: usize) -> &str {
    row.get(index).map(|value| value.trim()).unwrap_or("")
}
