//! Supplier master workbooks: rows from every non-empty sheet with the Thai
//! and English headers renamed to snake_case keys.

use std::path::Path;

use anyhow::Result;
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::assemble::{cell_date, sheet_records};
use crate::cli::SupplierArgs;
use crate::extract::grid::read_sheets;
use crate::layout::Grid;
use crate::util::{discover_inputs, file_stem_string, run_batch, write_json_pretty};

#[cfg(test)]
mod tests;

pub type SupplierRecord = Map<String, Value>;

const SOURCE_SHEET: &str = "source_sheet";
const REGISTRATION_ID: &str = "registration_id";
const DATE_FIELDS: [&str; 2] = ["start_effective_date", "registration_date"];

const COLUMN_MAP: &[(&str, &str)] = &[
    ("ทะเบียนนิติบุคคล", "registration_id"),
    ("Supplier ID", "supplier_id"),
    ("IsSupplier", "is_supplier"),
    ("Start Effective Date", "start_effective_date"),
    ("Size", "size"),
    ("Supplier Name", "supplier_name"),
    ("วันที่จดทะเบียน", "registration_date"),
    ("ทุนจดทะเบียน", "registered_capital"),
    ("ลูกหนี้การค้าสุทธิ", "trade_receivables_net"),
    ("สินค้าคงเหลือ", "inventory"),
    ("สินทรัพย์หมุนเวียน", "current_assets"),
    ("ที่ดิน อาคารและอุปกรณ์", "property_plant_equipment"),
    ("สินทรัพย์ไม่หมุนเวียน", "non_current_assets"),
    ("สินทรัพย์รวม", "total_assets"),
    ("หนี้สินหมุนเวียน", "current_liabilities"),
    ("หนี้สินไม่หมุนเวียน", "non_current_liabilities"),
    ("หนี้สินรวม", "total_liabilities"),
    ("ส่วนของผู้ถือหุ้น", "shareholders_equity"),
    ("หนี้สินรวมและส่วนของผู้ถือหุ้น", "liabilities_and_equity"),
    ("Group", "group"),
    ("รายได้หลัก", "main_revenue"),
    ("รายได้รวมตามงบการเงิน", "total_revenue_fs"),
    ("ต้นทุนขาย", "cost_of_goods_sold"),
    ("กำไร(ขาดทุน) ขั้นต้น", "gross_profit"),
    ("ค่าใช้จ่ายในการขายและบริการ", "selling_and_admin_expenses"),
    ("รายจ่ายรวม", "total_expenses"),
    ("ดอกเบี้ยจ่าย", "interest_expense"),
    ("กำไร(ขาดทุน) ก่อนภาษี", "profit_before_tax"),
    ("ภาษีเงินได้", "income_tax"),
    ("กำไร(ขาดทุน)สุทธิ", "net_profit"),
    ("No of Buyer", "no_of_buyer"),
    ("อัตราผลตอบแทนจากสินทรัพย์รวม(ROA)(%)", "roa_percent"),
    ("อัตราผลตอบแทนจากส่วนของผู้ถือหุ้น(ROE)(%)", "roe_percent"),
    ("ผลตอบแทนจากกำไรขั้นต้นต่อรายได้รวม(%)", "gross_profit_margin_percent"),
    ("ผลตอบแทนจากการดำเนินงานต่อรายได้รวม(%)", "operating_margin_percent"),
    ("ผลตอบแทนจากกำไรสุทธิต่อรายได้รวม(%)", "net_margin_percent"),
    ("อัตราหมุนเวียนของสินทรัพย์รวม(เท่า)", "asset_turnover_ratio"),
    ("อัตราหมุนเวียนของลูกหนี้(เท่า)", "receivables_turnover_ratio"),
    ("อัตราหมุนเวียนของสินค้าคงเหลือ(เท่า)", "inventory_turnover_ratio"),
    ("อัตราค่าใช้จ่ายดำเนินงานต่อรายได้รวม (%)", "operating_expense_ratio"),
    ("อัตราส่วนทุนหมุนเวียน(เท่า)", "current_ratio"),
    ("อัตราส่วนหนี้สินรวมต่อสินทรัพย์รวม(เท่า)", "debt_to_asset_ratio"),
    ("อัตราส่วนสินทรัพย์รวมต่อส่วนของผู้ถือหุ้น(เท่า)", "asset_to_equity_ratio"),
    ("อัตราส่วนหนี้สินรวมต่อส่วนของผู้ถือหุ้น(เท่า)", "debt_to_equity_ratio"),
];

pub fn run(args: SupplierArgs) -> Result<()> {
    let inputs = discover_inputs(&args.input, &args.pattern)?;
    run_batch("supplier", &inputs, |path| convert_file(path, &args.out_dir))?;
    Ok(())
}

fn convert_file(path: &Path, out_dir: &Path) -> Result<()> {
    let sheets = read_sheets(path)?;
    let records = supplier_records(&sheets);

    let out_path = out_dir.join(format!("{}.json", file_stem_string(path)));
    write_json_pretty(&out_path, &records)?;

    info!(
        path = %out_path.display(),
        records = records.len(),
        "wrote supplier json"
    );
    Ok(())
}

/// Collects the rows of every sheet in order, tagging each with its sheet.
/// Sheets without data rows are skipped.
pub fn supplier_records(sheets: &[(String, Grid)]) -> Vec<SupplierRecord> {
    let mut records = Vec::new();
    for (sheet_name, grid) in sheets {
        let rows = sheet_records(grid);
        if rows.is_empty() {
            debug!(sheet = %sheet_name, "skipped empty supplier sheet");
            continue;
        }
        records.extend(rows.into_iter().map(|row| {
            let mut record = rename_columns(row);
            record.insert(SOURCE_SHEET.to_string(), Value::String(sheet_name.clone()));
            normalize_fields(&mut record);
            record
        }));
    }
    records
}

pub fn canonical_column(column: &str) -> &str {
    COLUMN_MAP
        .iter()
        .find(|(label, _)| *label == column)
        .map_or(column, |(_, key)| *key)
}

fn rename_columns(row: SupplierRecord) -> SupplierRecord {
    row.into_iter()
        .map(|(column, value)| (canonical_column(&column).to_string(), value))
        .collect()
}

/// Registration ids stay text; the two date fields become ISO dates or null.
fn normalize_fields(record: &mut SupplierRecord) {
    if let Some(value) = record.get_mut(REGISTRATION_ID)
        && value.is_number()
    {
        *value = Value::String(value.to_string());
    }
    for field in DATE_FIELDS {
        if let Some(value) = record.get_mut(field) {
            *value = cell_date(value).map_or(Value::Null, Value::String);
        }
    }
}
