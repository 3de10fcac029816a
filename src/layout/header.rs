use super::{Grid, HEADER_SCAN_ROWS, LayoutError, cell};
use crate::normalize::parse_year_cell;

/// A year column in a statement header, with its optional percent-change
/// neighbour.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearColumn {
    pub index: usize,
    pub year: i32,
    pub pct_index: Option<usize>,
}

/// Picks the row with the most year-like cells among the first
/// `HEADER_SCAN_ROWS` rows. Earlier rows win ties.
pub fn find_year_header_row(grid: &Grid) -> Result<usize, LayoutError> {
    let mut best: Option<(usize, usize)> = None;

    for (index, row) in grid.iter().take(HEADER_SCAN_ROWS).enumerate() {
        let score = row
            .iter()
            .filter(|value| parse_year_cell(value).is_some())
            .count();
        if score == 0 {
            continue;
        }
        if best.is_none_or(|(_, best_score)| score > best_score) {
            best = Some((index, score));
        }
    }

    best.map(|(index, _)| index)
        .ok_or(LayoutError::NoHeaderRow(HEADER_SCAN_ROWS))
}

/// Finds the header row of a label-driven table (invoice, PO) by counting
/// cells whose canonical form is one of `expected`.
///
/// Falls back to the first non-empty row when no row reaches `min_hits`.
pub fn find_label_header_row<F>(
    grid: &Grid,
    expected: &[&str],
    min_hits: usize,
    canonicalize: F,
) -> Option<usize>
where
    F: Fn(&str) -> Option<&'static str>,
{
    let mut best: Option<(usize, usize)> = None;

    for (index, row) in grid.iter().take(HEADER_SCAN_ROWS).enumerate() {
        let hits = row
            .iter()
            .filter_map(|value| canonicalize(value))
            .filter(|label| expected.contains(label))
            .count();
        if hits >= min_hits && best.is_none_or(|(_, best_hits)| hits > best_hits) {
            best = Some((index, hits));
        }
    }

    best.map(|(index, _)| index).or_else(|| {
        grid.iter()
            .position(|row| row.iter().any(|value| !value.trim().is_empty()))
    })
}

/// Lists year columns of the header row and pairs each with the column right
/// after it when that column is a percent-change column.
pub fn year_columns(header: &[String]) -> Vec<YearColumn> {
    let mut columns = Vec::new();

    for (index, value) in header.iter().enumerate() {
        let Some(year) = parse_year_cell(value) else {
            continue;
        };
        let next = index + 1;
        let pct_index = (next < header.len()
            && parse_year_cell(&header[next]).is_none()
            && is_pct_header(cell(header, next)))
        .then_some(next);
        columns.push(YearColumn {
            index,
            year,
            pct_index,
        });
    }

    columns
}

fn is_pct_header(value: &str) -> bool {
    value.is_empty()
        || value.eq_ignore_ascii_case("nan")
        || value.contains('%')
        || value.contains("เปลี่ยน")
}
