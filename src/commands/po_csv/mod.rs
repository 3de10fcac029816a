//! PO detail CSV reports: fixed report layout with a buyer cell and report
//! dates above the table.

use std::path::Path;
use std::sync::OnceLock;

use anyhow::{Result, bail};
use regex::Regex;
use tracing::{debug, info};

use crate::assemble::{RowCells, trim_trailing_totals, unique_headers};
use crate::cli::PoCsvArgs;
use crate::extract::grid::read_grid;
use crate::layout::{Grid, cell};
use crate::model::PurchaseOrderRecord;
use crate::normalize::{
    DateOrder, collapse_spaces, find_date, parse_amount_opt, parse_date, parse_datetime,
};
use crate::util::{discover_inputs, file_stem_string, run_batch, write_json_pretty};

#[cfg(test)]
mod tests;

const HEADER_ROW: usize = 4;
const RELABEL_MIN_HITS: usize = 3;

const BUYER_CELL: (usize, usize) = (2, 1);
const RECEIVED_FROM_CELL: (usize, usize) = (3, 3);
const RECEIVED_TO_CELL: (usize, usize) = (3, 5);

const EXPECTED_LABELS: [&str; 8] = [
    "PO No.",
    "Supplier Code",
    "Supplier Name",
    "Order Date",
    "Send Date",
    "Delivery Date",
    "Amount (PO Include VAT)",
    "Status",
];

fn buyer_code_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d{10,20})").expect("invalid buyer code regex"))
}

fn empty_parens_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s*\(\s*\)\s*").expect("invalid empty parens regex"))
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Buyer {
    pub code: Option<String>,
    pub name: Option<String>,
}

/// Data rows under uniquely named columns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl PoTable {
    fn value(&self, row: &[String], label: &str) -> Option<String> {
        let index = self.columns.iter().position(|column| column == label)?;
        let text = cell(row, index);
        (!text.is_empty()).then(|| text.to_string())
    }
}

pub fn run(args: PoCsvArgs) -> Result<()> {
    let inputs = discover_inputs(&args.input, &args.pattern)?;
    run_batch("po-csv", &inputs, |path| convert_file(path, &args.out_dir))?;
    Ok(())
}

fn convert_file(path: &Path, out_dir: &Path) -> Result<()> {
    let grid = read_grid(path, None)?;
    if grid.len() <= HEADER_ROW {
        bail!(
            "po report has no header row at line {}: {}",
            HEADER_ROW + 1,
            path.display()
        );
    }

    let records = po_records(&grid);
    let out_path = out_dir.join(format!("{}.json", file_stem_string(path)));
    write_json_pretty(&out_path, &records)?;

    info!(
        path = %out_path.display(),
        records = records.len(),
        "wrote po json"
    );
    Ok(())
}

pub fn po_records(grid: &Grid) -> Vec<PurchaseOrderRecord> {
    let buyer = extract_buyer(grid_cell(grid, BUYER_CELL));
    let received_from = report_date(grid_cell(grid, RECEIVED_FROM_CELL));
    let received_to = report_date(grid_cell(grid, RECEIVED_TO_CELL));
    debug!(
        buyer_code = buyer.code.as_deref().unwrap_or(""),
        received_from = received_from.as_deref().unwrap_or(""),
        received_to = received_to.as_deref().unwrap_or(""),
        "po report header"
    );

    let table = build_table(grid);
    table
        .rows
        .iter()
        .map(|row| PurchaseOrderRecord {
            po_no: table.value(row, "PO No."),
            buyer_code: buyer.code.clone(),
            buyer_name: buyer.name.clone(),
            supplier_code: table.value(row, "Supplier Code"),
            supplier_name: table.value(row, "Supplier Name"),
            order_date: table
                .value(row, "Order Date")
                .and_then(|text| parse_date(&text).ok()),
            send_date: table.value(row, "Send Date").and_then(|text| {
                parse_datetime(&text, DateOrder::MonthFirst)
                    .or_else(|_| parse_datetime(&text, DateOrder::DayFirst))
                    .ok()
            }),
            delivery_date: table
                .value(row, "Delivery Date")
                .and_then(|text| parse_date(&text).ok()),
            received_from_date: received_from.clone(),
            received_to_date: received_to.clone(),
            amount: table
                .value(row, "Amount (PO Include VAT)")
                .and_then(|text| parse_amount_opt(&text)),
            status: table.value(row, "Status"),
        })
        .collect()
}

fn grid_cell(grid: &Grid, (row, column): (usize, usize)) -> &str {
    grid.get(row).map_or("", |row| cell(row, column))
}

/// Splits the buyer cell into its 10 to 20 digit code and the name after
/// the colon.
pub fn extract_buyer(text: &str) -> Buyer {
    let text = text.trim();
    if text.is_empty() || text.eq_ignore_ascii_case("nan") {
        return Buyer::default();
    }

    let compact = text.replace(' ', "");
    let code = buyer_code_re()
        .captures(&compact)
        .map(|caps| caps[1].to_string());

    let mut name = text.to_string();
    if let Some(code) = &code
        && let Ok(re) = Regex::new(&format!(r"\(?{}\)?", regex::escape(code)))
    {
        name = re.replace_all(&name, "").into_owned();
    }
    if let Some((_, rest)) = name.split_once(':') {
        name = rest.to_string();
    }
    let name = empty_parens_re().replace_all(&name, "").trim().to_string();

    Buyer {
        code,
        name: (!name.is_empty()).then_some(name),
    }
}

/// Report dates are written month first, sometimes with surrounding text.
pub fn report_date(text: &str) -> Option<String> {
    if text.is_empty() || text.eq_ignore_ascii_case("nan") {
        return None;
    }
    find_date(text, DateOrder::MonthFirst)
}

/// Names the columns from the fixed header row, relabels them from the
/// first data row when that row repeats the expected labels, and drops
/// blank rows and the trailing totals.
pub fn build_table(grid: &Grid) -> PoTable {
    let Some(header) = grid.get(HEADER_ROW) else {
        return PoTable::default();
    };
    let mut columns = unique_headers(header);

    let mut rows: Vec<Vec<String>> = grid
        .iter()
        .skip(HEADER_ROW + 1)
        .map(|row| row.iter().map(|value| value.trim().to_string()).collect())
        .filter(|row: &Vec<String>| !row.is_blank())
        .collect();

    if let Some(first) = rows.first() {
        let labels: Vec<String> = first.iter().map(|value| collapse_spaces(value)).collect();
        let hits = EXPECTED_LABELS
            .iter()
            .filter(|label| labels.iter().any(|value| value == *label))
            .count();
        if hits >= RELABEL_MIN_HITS {
            for label in EXPECTED_LABELS {
                if let Some(index) = labels.iter().position(|value| value == label)
                    && index < columns.len()
                {
                    columns[index] = label.to_string();
                }
            }
            rows.remove(0);
        }
    }

    let trimmed = trim_trailing_totals(&mut rows);
    if trimmed > 0 {
        debug!(trimmed, "dropped trailing po rows");
    }

    PoTable { columns, rows }
}
