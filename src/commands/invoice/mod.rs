//! Invoice and purchase-order tables produced by an external table
//! extractor, normalized into header-keyed records.

use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result, anyhow, bail};
use regex::Regex;
use serde_json::{Map, Value, json};
use tracing::{debug, info};

use crate::assemble::{RowCells, trim_trailing_totals};
use crate::cli::{InvoiceArgs, InvoiceKind};
use crate::extract::grid::read_grid;
use crate::layout::{Grid, find_label_header_row};
use crate::normalize::{
    DateOrder, collapse_spaces, parse_amount_opt, parse_date_with_order, parse_datetime,
    repair_numeric_tail,
};
use crate::util::{discover_inputs, file_stem_string, has_extension, run_batch, write_json_pretty};
use crate::vocab::{INVOICE_HEADERS, PO_HEADERS, canonical_header};

#[cfg(test)]
mod tests;

pub type Record = Map<String, Value>;

const DEFAULT_OUT_ROOT: &str = "processed_data";
const TABLE_EXTENSIONS: [&str; 5] = ["csv", "xlsx", "xlsm", "xls", "json"];
const HEADER_MIN_HITS: usize = 3;

const INVOICE_LABELS: [&str; 9] = [
    "No",
    "Invoice No.",
    "Supplier Code",
    "Supplier Name",
    "Invoice Date",
    "Invoice Received Date",
    "Related Document",
    "Amount",
    "Status",
];
const PO_LABELS: [&str; 9] = [
    "No",
    "PO No.",
    "Supplier Code",
    "Supplier Name",
    "Order Date",
    "Send Date",
    "Delivery Date",
    "Amount Include VAT",
    "Status",
];

const RELATED_DOCUMENT: &str = "Related Document";
const SUPPLIER_CODE: &str = "Supplier Code";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldFormat {
    Date,
    Datetime,
}

const INVOICE_FORMATS: [(&str, FieldFormat); 2] = [
    ("Invoice Date", FieldFormat::Date),
    ("Invoice Received Date", FieldFormat::Datetime),
];
const PO_FORMATS: [(&str, FieldFormat); 3] = [
    ("Order Date", FieldFormat::Date),
    ("Send Date", FieldFormat::Datetime),
    ("Delivery Date", FieldFormat::Date),
];

fn related_document_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d{8,14})\b").expect("invalid related document regex"))
}

fn strict_number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z]+\d+$").expect("invalid document number regex"))
}

impl InvoiceKind {
    fn header_map(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Self::Invoice => INVOICE_HEADERS,
            Self::Po => PO_HEADERS,
        }
    }

    fn labels(self) -> &'static [&'static str] {
        match self {
            Self::Invoice => &INVOICE_LABELS,
            Self::Po => &PO_LABELS,
        }
    }

    fn number_field(self) -> &'static str {
        match self {
            Self::Invoice => "Invoice No.",
            Self::Po => "PO No.",
        }
    }

    fn amount_field(self) -> &'static str {
        match self {
            Self::Invoice => "Amount",
            Self::Po => "Amount Include VAT",
        }
    }

    fn field_formats(self) -> &'static [(&'static str, FieldFormat)] {
        match self {
            Self::Invoice => &INVOICE_FORMATS,
            Self::Po => &PO_FORMATS,
        }
    }

    pub fn canonical_key(self, key: &str) -> String {
        canonical_header(self.header_map(), key)
            .map(str::to_string)
            .unwrap_or_else(|| collapse_spaces(key))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizeOptions {
    pub strict: bool,
    pub fix_lookalikes: bool,
    pub sort_by: Option<String>,
    pub sort_desc: bool,
}

impl From<&InvoiceArgs> for NormalizeOptions {
    fn from(args: &InvoiceArgs) -> Self {
        Self {
            strict: args.strict,
            fix_lookalikes: args.fix_lookalikes,
            sort_by: args.sort_by.clone(),
            sort_desc: args.sort_desc,
        }
    }
}

pub fn run(args: InvoiceArgs) -> Result<()> {
    let pattern = args.pattern.clone().unwrap_or_else(|| "*".to_string());
    let mut inputs = discover_inputs(&args.input, &pattern)?;
    inputs.retain(|path| is_table_input(path));

    let out_dir = args
        .out_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUT_ROOT).join(args.kind.as_str()));
    let options = NormalizeOptions::from(&args);

    run_batch(args.kind.as_str(), &inputs, |path| {
        convert_file(path, &args, &options, &out_dir)
    })?;
    Ok(())
}

fn is_table_input(path: &Path) -> bool {
    TABLE_EXTENSIONS
        .iter()
        .any(|extension| has_extension(path, extension))
}

fn convert_file(
    path: &Path,
    args: &InvoiceArgs,
    options: &NormalizeOptions,
    out_dir: &Path,
) -> Result<()> {
    let (mode, rows) = if has_extension(path, "json") {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read table json: {}", path.display()))?;
        let value: Value = serde_json::from_str(&data)
            .with_context(|| format!("failed to parse table json: {}", path.display()))?;
        ("records", records_from_json(value)?)
    } else {
        let grid = read_grid(path, args.sheet.as_deref())?;
        ("grid", records_from_grid(&grid, args.kind)?)
    };

    let records = normalize_records(rows, args.kind, options);
    if records.is_empty() {
        bail!(
            "no {} records found in {}",
            args.kind.as_str(),
            path.display()
        );
    }

    let out_path = out_dir.join(format!("{}.json", file_stem_string(path)));
    let count = records.len();
    if args.records_only {
        write_json_pretty(&out_path, &records)?;
    } else {
        write_json_pretty(&out_path, &json!({ "mode": mode, "records": records }))?;
    }

    info!(
        path = %out_path.display(),
        kind = args.kind.as_str(),
        mode,
        records = count,
        "wrote table json"
    );
    Ok(())
}

/// Builds raw records from a grid, keyed by the best label-scored header
/// row. Empty header cells become `col_<n>`.
pub fn records_from_grid(grid: &Grid, kind: InvoiceKind) -> Result<Vec<Record>> {
    let header_index = find_label_header_row(grid, kind.labels(), HEADER_MIN_HITS, |value| {
        canonical_header(kind.header_map(), value)
    })
    .ok_or_else(|| anyhow!("table has no non-empty rows"))?;
    debug!(header_row = header_index, "table header");

    let header: Vec<String> = grid[header_index]
        .iter()
        .enumerate()
        .map(|(index, name)| {
            let name = collapse_spaces(name);
            if name.is_empty() {
                format!("col_{}", index + 1)
            } else {
                name
            }
        })
        .collect();

    Ok(grid
        .iter()
        .skip(header_index + 1)
        .map(|row| {
            header
                .iter()
                .enumerate()
                .map(|(index, key)| {
                    let text = row.get(index).cloned().unwrap_or_default();
                    (key.clone(), Value::String(text))
                })
                .collect()
        })
        .collect())
}

/// Accepts a JSON array of row objects. When every key is a column index,
/// the first object supplies the header labels.
pub fn records_from_json(value: Value) -> Result<Vec<Record>> {
    let Value::Array(items) = value else {
        bail!("expected a json array of row objects");
    };
    let rows: Vec<Record> = items
        .into_iter()
        .filter_map(|item| match item {
            Value::Object(map) => Some(map),
            _ => None,
        })
        .collect();

    let positional = !rows.is_empty()
        && rows.iter().all(|row| {
            row.keys()
                .all(|key| !key.is_empty() && key.chars().all(|ch| ch.is_ascii_digit()))
        });
    if !positional {
        return Ok(rows);
    }

    let mut rows = rows.into_iter();
    let Some(header_row) = rows.next() else {
        return Ok(Vec::new());
    };
    let header: Vec<(String, String)> = header_row
        .iter()
        .map(|(key, label)| {
            let label = collapse_spaces(&value_text(label));
            let label = if label.is_empty() {
                format!("col_{key}")
            } else {
                label
            };
            (key.clone(), label)
        })
        .collect();

    Ok(rows
        .map(|row| {
            header
                .iter()
                .map(|(key, label)| (label.clone(), row.get(key).cloned().unwrap_or(Value::Null)))
                .collect()
        })
        .collect())
}

/// Canonicalizes, filters, transforms, trims and optionally sorts raw rows.
pub fn normalize_records(
    rows: Vec<Record>,
    kind: InvoiceKind,
    options: &NormalizeOptions,
) -> Vec<Record> {
    let mut records: Vec<Record> = rows
        .into_iter()
        .map(|row| canonicalize_keys(row, kind))
        .filter(|row| !row.is_blank() && !is_header_like(row, kind))
        .map(|row| transform_record(row, kind, options))
        .collect();

    if options.strict {
        records.retain(|record| passes_strict(record, kind));
    }
    let trimmed = trim_trailing_totals(&mut records);
    if trimmed > 0 {
        debug!(trimmed, "dropped trailing total rows");
    }

    if let Some(column) = &options.sort_by {
        sort_records(&mut records, column, options.sort_desc);
    }
    records
}

fn canonicalize_keys(row: Record, kind: InvoiceKind) -> Record {
    let mut out = Record::new();
    for (key, value) in row {
        let value = match value {
            Value::String(text) => Value::String(collapse_spaces(&text)),
            other => other,
        };
        out.insert(kind.canonical_key(&key), value);
    }
    out
}

/// A repeated header row inside the body.
fn is_header_like(record: &Record, kind: InvoiceKind) -> bool {
    let hits = record
        .values()
        .filter_map(Value::as_str)
        .filter_map(|text| canonical_header(kind.header_map(), text))
        .filter(|label| kind.labels().contains(label))
        .count();
    hits >= HEADER_MIN_HITS
        || record
            .get("No")
            .and_then(Value::as_str)
            .is_some_and(|text| text.eq_ignore_ascii_case("no"))
}

fn transform_record(mut record: Record, kind: InvoiceKind, options: &NormalizeOptions) -> Record {
    if options.fix_lookalikes
        && let Some(Value::String(number)) = record.get_mut(kind.number_field())
        && !number.is_empty()
    {
        *number = fix_document_number(number);
    }

    if let Some(Value::String(related)) = record.get_mut(RELATED_DOCUMENT)
        && let Some(extracted) = related_document(related)
    {
        *related = extracted;
    }

    for (field, format) in kind.field_formats() {
        if let Some(Value::String(text)) = record.get_mut(*field)
            && let Some(parsed) = format_field(text, *format)
        {
            *text = parsed;
        }
    }

    if let Some(value) = record.get_mut(kind.amount_field())
        && let Some(amount) = value.as_str().and_then(parse_amount_opt)
    {
        *value = Value::from(amount);
    }

    record
}

fn format_field(text: &str, format: FieldFormat) -> Option<String> {
    if text.is_empty() {
        return None;
    }
    match format {
        FieldFormat::Date => parse_date_with_order(text, DateOrder::DayFirst)
            .or_else(|_| parse_date_with_order(text, DateOrder::MonthFirst))
            .ok(),
        FieldFormat::Datetime => parse_datetime(text, DateOrder::DayFirst)
            .or_else(|_| parse_datetime(text, DateOrder::MonthFirst))
            .ok(),
    }
}

/// Uppercases the letter prefix and repairs look-alikes in the numeric tail.
pub fn fix_document_number(raw: &str) -> String {
    let compact: String = raw.chars().filter(|ch| !ch.is_whitespace()).collect();
    let repaired = repair_numeric_tail(&compact);
    let split = repaired
        .find(|ch: char| !ch.is_ascii_alphabetic())
        .unwrap_or(repaired.len());
    format!(
        "{}{}",
        repaired[..split].to_ascii_uppercase(),
        &repaired[split..]
    )
}

/// The 8 to 14 digit document number inside a related-document cell.
pub fn related_document(raw: &str) -> Option<String> {
    let compact: String = raw.chars().filter(|ch| !ch.is_whitespace()).collect();
    related_document_re()
        .captures(&compact)
        .map(|caps| caps[1].to_string())
}

fn passes_strict(record: &Record, kind: InvoiceKind) -> bool {
    let number_ok = record
        .get(kind.number_field())
        .and_then(Value::as_str)
        .is_some_and(|text| strict_number_re().is_match(text));
    let supplier_ok = record
        .get(SUPPLIER_CODE)
        .map(value_text)
        .is_some_and(|text| !text.is_empty() && text.chars().all(|ch| ch.is_ascii_digit()));
    number_ok && supplier_ok
}

/// Stable sort on one column. Numbers compare numerically and sort before
/// text; missing cells sort as empty text.
pub fn sort_records(records: &mut [Record], column: &str, descending: bool) {
    records.sort_by(|left, right| {
        let ordering = compare_cells(left.get(column), right.get(column));
        if descending {
            ordering.reverse()
        } else {
            ordering
        }
    });
}

fn compare_cells(left: Option<&Value>, right: Option<&Value>) -> Ordering {
    match (left.and_then(Value::as_f64), right.and_then(Value::as_f64)) {
        (Some(left), Some(right)) => left.total_cmp(&right),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => {
            let left = left.map(value_text).unwrap_or_default();
            let right = right.map(value_text).unwrap_or_default();
            left.cmp(&right)
        }
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
