//! Record assembly: order-preserving deduplication, trailing-total trimming
//! and header-keyed sheet records.

use std::collections::HashSet;
use std::hash::Hash;
use std::sync::OnceLock;

use regex::Regex;
use serde_json::{Map, Value};

use crate::layout::{Grid, cell};
use crate::normalize::{collapse_spaces, excel_serial_date, parse_sheet_date};


/// Identity of a remittance transaction: date, branch, document type,
/// document number, reference number and the amount's bit pattern.
pub type DedupKey = (String, String, String, String, String, u64);

const THAI_TOTAL_MARKERS: [&str; 3] = ["รวมทั้งสิ้น", "ยอดรวม", "รวม"];

fn plain_number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^-?(?:0|[1-9]\d*)(?:\.\d+)?$").expect("invalid plain number regex")
    })
}

fn total_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(?:total|grand\s*total|sub\s*total)\b").expect("invalid total regex")
    })
}

/// Text cells of an assembled row, used to spot blank and summary rows.
pub trait RowCells {
    fn cell_texts(&self) -> Vec<&str>;

    fn is_blank(&self) -> bool {
        self.cell_texts().iter().all(|text| text.trim().is_empty())
    }
}

impl RowCells for Vec<String> {
    fn cell_texts(&self) -> Vec<&str> {
        self.iter().map(String::as_str).collect()
    }
}

impl RowCells for Map<String, Value> {
    fn cell_texts(&self) -> Vec<&str> {
        self.values()
            .filter_map(|value| match value {
                Value::String(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    fn is_blank(&self) -> bool {
        self.values().all(|value| match value {
            Value::Null => true,
            Value::String(text) => text.trim().is_empty(),
            _ => false,
        })
    }
}

pub fn is_total_row<R: RowCells + ?Sized>(row: &R) -> bool {
    row.cell_texts().iter().any(|text| is_total_text(text))
}

pub fn is_total_text(text: &str) -> bool {
    let lowered = text.trim().to_lowercase();
    total_re().is_match(&lowered)
        || THAI_TOTAL_MARKERS
            .iter()
            .any(|marker| lowered.contains(marker))
}

/// Drops trailing rows that are blank or summary totals, stopping at the
/// first ordinary row from the end.
pub fn trim_trailing_totals<R: RowCells>(rows: &mut Vec<R>) -> usize {
    let mut removed = 0;
    while let Some(last) = rows.last() {
        if last.is_blank() || is_total_row(last) {
            rows.pop();
            removed += 1;
            continue;
        }
        break;
    }
    removed
}

/// Keeps the first occurrence of every key, preserving input order.
pub fn dedup_by_key<T, K, F>(items: Vec<T>, key: F) -> Vec<T>
where
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(key(item)))
        .collect()
}

/// Whitespace-normalized header names, with `col` for empty cells and a
/// `_<n>` suffix on repeats.
pub fn unique_headers(header: &[String]) -> Vec<String> {
    let mut seen: Vec<(String, usize)> = Vec::new();
    header
        .iter()
        .map(|value| {
            let name = collapse_spaces(value);
            let key = if name.is_empty() { "col".to_string() } else { name };
            match seen.iter_mut().find(|(seen_key, _)| *seen_key == key) {
                Some((_, count)) => {
                    *count += 1;
                    format!("{key}_{count}")
                }
                None => {
                    seen.push((key.clone(), 1));
                    key
                }
            }
        })
        .collect()
}

/// Typed JSON for a sheet cell: empty is null, a plain number (no grouping,
/// no leading zeros) is a number, anything else stays text.
pub fn json_cell(text: &str) -> Value {
    let text = text.trim();
    if text.is_empty() {
        return Value::Null;
    }
    if plain_number_re().is_match(text) {
        if let Ok(whole) = text.parse::<i64>() {
            return Value::from(whole);
        }
        if let Ok(value) = text.parse::<f64>() {
            return Value::from(value);
        }
    }
    Value::String(text.to_string())
}

/// Turns a sheet into records keyed by its first non-blank row. Blank rows
/// are skipped and cells past the header are ignored.
pub fn sheet_records(grid: &Grid) -> Vec<Map<String, Value>> {
    let mut rows = grid.iter().skip_while(|row| row.is_blank());
    let Some(header) = rows.next() else {
        return Vec::new();
    };
    let columns = unique_headers(header);

    rows.filter(|row| !row.is_blank())
        .map(|row| {
            columns
                .iter()
                .enumerate()
                .map(|(index, column)| (column.clone(), json_cell(cell(row, index))))
                .collect()
        })
        .collect()
}

/// ISO date for a typed sheet cell: text goes through the date parser and
/// numbers are read as Excel day serials.
pub fn cell_date(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => parse_sheet_date(text),
        Value::Number(number) => number.as_f64().and_then(excel_serial_date),
        _ => None,
    }
}
