//! Raw extractors: PDF text (text layer, OCR, pre-extracted JSON pages),
//! spreadsheet grids and HTML tables.

pub mod grid;
pub mod html;
pub mod pdf;
