use std::fs;

use serde_json::json;

use super::*;
use crate::extract::grid::parse_csv;

const DETAIL_CSV: &str = "\
Remittance No,วันที่,Pay_Date,Amount,Note
0000123456,30/10/2568,45292,1500.50,first
0000123457,2025-11-02,not yet,200,
";

#[test]
fn date_columns_match_case_insensitively() {
    assert!(is_date_column("วันที่"));
    assert!(is_date_column(" Pay_Date "));
    assert!(is_date_column("payment_date"));
    assert!(!is_date_column("วันที่เอกสาร"));
    assert!(!is_date_column("Amount"));
}

#[test]
fn detail_rows_normalize_dates_and_carry_supplier_code() {
    let grid = parse_csv(DETAIL_CSV.as_bytes()).expect("csv");
    let document = detail_document(
        "72195.xlsx",
        "72195",
        &[("Sheet1".to_string(), grid), ("Empty".to_string(), Grid::new())],
    );

    assert_eq!(document.file_name, "72195.xlsx");
    assert_eq!(document.sheets.len(), 2);
    assert!(document.sheets[1].rows.is_empty());

    let rows = &document.sheets[0].rows;
    assert_eq!(rows.len(), 2);
    assert_eq!(
        Value::Object(rows[0].clone()),
        json!({
            "Remittance No": "0000123456",
            "วันที่": "2025-10-30",
            "Pay_Date": "2024-01-01",
            "Amount": 1500.5,
            "Note": "first",
            "supplier_code": "72195",
        })
    );
    assert_eq!(rows[1]["วันที่"], "2025-11-02");
    assert_eq!(rows[1]["Pay_Date"], "not yet");
    assert_eq!(rows[1]["Note"], Value::Null);
}

#[test]
fn run_writes_one_document_per_workbook() {
    let dir = std::env::temp_dir().join(format!("credit_prep_rem_detail_{}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).expect("temp dir");
    fs::write(dir.join("72195.csv"), DETAIL_CSV).expect("write detail");

    run(RemDetailArgs {
        input: dir.clone(),
        pattern: "*.csv".to_string(),
        out_dir: dir.join("out"),
    })
    .expect("rem-detail run");

    let written = fs::read_to_string(dir.join("out").join("72195.json")).expect("output");
    let value: Value = serde_json::from_str(&written).expect("json");
    assert_eq!(value["supplier_code"], "72195");
    assert_eq!(value["sheets"][0]["sheet_name"], "72195");
    assert_eq!(value["sheets"][0]["rows"][1]["supplier_code"], "72195");

    let _ = fs::remove_dir_all(&dir);
}
