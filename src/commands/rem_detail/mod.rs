//! Remittance detail workbooks exported per supplier: every sheet becomes
//! header-keyed rows, known date columns are normalized day first.

use std::path::Path;

use anyhow::Result;
use serde_json::Value;
use tracing::{debug, info};

use crate::assemble::{cell_date, sheet_records};
use crate::cli::RemDetailArgs;
use crate::extract::grid::read_sheets;
use crate::layout::Grid;
use crate::model::{RemittanceDetailDocument, RemittanceDetailSheet};
use crate::util::{
    discover_inputs, file_name_string, file_stem_string, run_batch, write_json_pretty,
};

#[cfg(test)]
mod tests;

const DATE_COLUMNS: [&str; 8] = [
    "วันที่",
    "วันที่จ่ายเงิน",
    "remittance_date",
    "sent_date",
    "sent_time",
    "pay_date",
    "doc_date",
    "payment_date",
];

pub fn run(args: RemDetailArgs) -> Result<()> {
    let inputs = discover_inputs(&args.input, &args.pattern)?;
    run_batch("rem-detail", &inputs, |path| convert_file(path, &args.out_dir))?;
    Ok(())
}

fn convert_file(path: &Path, out_dir: &Path) -> Result<()> {
    let sheets = read_sheets(path)?;
    let document = detail_document(&file_name_string(path), &file_stem_string(path), &sheets);

    let out_path = out_dir.join(format!("{}.json", document.supplier_code));
    write_json_pretty(&out_path, &document)?;

    info!(
        path = %out_path.display(),
        sheets = document.sheets.len(),
        rows = document.sheets.iter().map(|sheet| sheet.rows.len()).sum::<usize>(),
        "wrote remittance detail json"
    );
    Ok(())
}

/// The supplier code is the file stem; every row carries it.
pub fn detail_document(
    file_name: &str,
    supplier_code: &str,
    sheets: &[(String, Grid)],
) -> RemittanceDetailDocument {
    let sheets = sheets
        .iter()
        .map(|(sheet_name, grid)| {
            let rows: Vec<_> = sheet_records(grid)
                .into_iter()
                .map(|mut row| {
                    for (column, value) in row.iter_mut() {
                        if is_date_column(column) {
                            normalize_date_cell(value);
                        }
                    }
                    row.insert(
                        "supplier_code".to_string(),
                        Value::String(supplier_code.to_string()),
                    );
                    row
                })
                .collect();
            debug!(sheet = %sheet_name, rows = rows.len(), "read detail sheet");
            RemittanceDetailSheet {
                sheet_name: sheet_name.clone(),
                rows,
            }
        })
        .collect();

    RemittanceDetailDocument {
        file_name: file_name.to_string(),
        supplier_code: supplier_code.to_string(),
        sheets,
    }
}

pub fn is_date_column(column: &str) -> bool {
    let column = column.trim().to_lowercase();
    DATE_COLUMNS.iter().any(|name| *name == column)
}

/// Unparseable text is kept as written.
fn normalize_date_cell(value: &mut Value) {
    if let Some(date) = cell_date(value) {
        *value = Value::String(date);
    }
}
