use std::fs;

use serde_json::json;

use super::*;
use crate::extract::grid::parse_csv;

fn grid(text: &str) -> Grid {
    parse_csv(text.as_bytes()).expect("csv")
}

#[test]
fn thai_headers_are_renamed() {
    assert_eq!(canonical_column("ทะเบียนนิติบุคคล"), "registration_id");
    assert_eq!(canonical_column("กำไร(ขาดทุน)สุทธิ"), "net_profit");
    assert_eq!(canonical_column("No of Buyer"), "no_of_buyer");
    assert_eq!(canonical_column("Remark"), "Remark");
}

#[test]
fn records_span_sheets_and_normalize_dates() {
    let sheets = vec![
        (
            "Active".to_string(),
            grid(
                "ทะเบียนนิติบุคคล,Supplier Name,Start Effective Date,วันที่จดทะเบียน,สินทรัพย์รวม\n\
                 105551234567,บริษัท เอ จำกัด,01/03/2566,45292,1500000\n\
                 0105551234568,ACME,someday,,\n",
            ),
        ),
        ("Blank".to_string(), Grid::new()),
        (
            "Archived".to_string(),
            grid("Supplier ID,Size\n2040334,S\n"),
        ),
    ];

    let records = supplier_records(&sheets);
    assert_eq!(records.len(), 3);

    assert_eq!(
        Value::Object(records[0].clone()),
        json!({
            "registration_id": "105551234567",
            "supplier_name": "บริษัท เอ จำกัด",
            "start_effective_date": "2023-03-01",
            "registration_date": "2024-01-01",
            "total_assets": 1500000,
            "source_sheet": "Active",
        })
    );

    assert_eq!(records[1]["registration_id"], "0105551234568");
    assert_eq!(records[1]["start_effective_date"], Value::Null);
    assert_eq!(records[1]["registration_date"], Value::Null);

    assert_eq!(records[2]["supplier_id"], 2040334);
    assert_eq!(records[2]["source_sheet"], "Archived");
}

#[test]
fn run_writes_records_per_workbook() {
    let dir = std::env::temp_dir().join(format!("credit_prep_supplier_{}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).expect("temp dir");
    let input = dir.join("suppliers.csv");
    fs::write(&input, "Supplier ID,Group\n2040334,A\n").expect("write suppliers");

    run(SupplierArgs {
        input,
        pattern: "*.xls*".to_string(),
        out_dir: dir.join("out"),
    })
    .expect("supplier run");

    let written = fs::read_to_string(dir.join("out").join("suppliers.json")).expect("output");
    let value: Value = serde_json::from_str(&written).expect("json");
    assert_eq!(value, json!([{"supplier_id": 2040334, "group": "A", "source_sheet": "suppliers"}]));

    let _ = fs::remove_dir_all(&dir);
}
