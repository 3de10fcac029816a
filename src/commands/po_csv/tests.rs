use std::fs;

use super::*;
use crate::extract::grid::parse_csv;

const PO_CSV: &str = "\
PO Detail Report,,,,,,,
,,,,,,,
Buyer,Buyer : บริษัท ซีพี แอ็กซ์ตร้า จำกัด (0105551234567),,,,,,
,,Received Date From,7/1/2024,To,7/31/2024,,
PO No.,Supplier Code,Supplier Name,Order Date,Send Date,Delivery Date,Amount (PO Include VAT),Status
PO1001,2040334,ACME   Trading,05/07/2024,7/5/2024 2:44:07 PM,10/07/2567,\"12,500.50\",Open
PO1002,2040334,ACME Trading,06/07/2024,7/6/2024 14:44:07 PM,,-x-,Closed
,,,,,,,
,Grand Total,,,,,\"12,500.50\",
";

#[test]
fn po_csv_rows_carry_buyer_and_report_dates() {
    let grid = parse_csv(PO_CSV.as_bytes()).expect("csv");
    let records = po_records(&grid);

    assert_eq!(records.len(), 2);
    let first = &records[0];
    assert_eq!(first.po_no.as_deref(), Some("PO1001"));
    assert_eq!(first.buyer_code.as_deref(), Some("0105551234567"));
    assert_eq!(
        first.buyer_name.as_deref(),
        Some("บริษัท ซีพี แอ็กซ์ตร้า จำกัด")
    );
    assert_eq!(first.supplier_name.as_deref(), Some("ACME   Trading"));
    assert_eq!(first.order_date.as_deref(), Some("2024-07-05"));
    assert_eq!(first.send_date.as_deref(), Some("2024-07-05 14:44:07"));
    assert_eq!(first.delivery_date.as_deref(), Some("2024-07-10"));
    assert_eq!(first.received_from_date.as_deref(), Some("2024-07-01"));
    assert_eq!(first.received_to_date.as_deref(), Some("2024-07-31"));
    assert_eq!(first.amount, Some(12500.5));

    let second = &records[1];
    assert_eq!(second.send_date.as_deref(), Some("2024-07-06 14:44:07"));
    assert_eq!(second.delivery_date, None);
    assert_eq!(second.amount, None);
    assert_eq!(second.status.as_deref(), Some("Closed"));
}

#[test]
fn missing_cells_serialize_as_null() {
    let record = PurchaseOrderRecord {
        po_no: Some("PO1".to_string()),
        ..PurchaseOrderRecord::default()
    };
    let value = serde_json::to_value(&record).expect("json");
    assert_eq!(value["PO No."], "PO1");
    assert!(value["Amount (PO Include VAT)"].is_null());
    assert_eq!(value.as_object().map(|map| map.len()), Some(12));
}

#[test]
fn first_data_row_relabels_generic_columns() {
    let grid: Grid = [
        vec![""; 4],
        vec![""; 4],
        vec![""; 4],
        vec![""; 4],
        vec!["A", "B", "B", ""],
        vec!["PO No.", "Supplier Code", "Status", "x"],
        vec!["PO9", "123", "Open", "y"],
    ]
    .into_iter()
    .map(|row| row.into_iter().map(str::to_string).collect())
    .collect();

    let table = build_table(&grid);
    assert_eq!(table.columns, vec!["PO No.", "Supplier Code", "Status", "col"]);
    assert_eq!(table.rows.len(), 1);
    assert_eq!(
        table.value(&table.rows[0], "Supplier Code").as_deref(),
        Some("123")
    );
}

#[test]
fn buyer_cell_and_report_date_helpers() {
    let buyer = extract_buyer("Buyer: (0105551234567) ()");
    assert_eq!(buyer.code.as_deref(), Some("0105551234567"));
    assert_eq!(buyer.name, None);

    assert_eq!(extract_buyer("nan"), Buyer::default());
    assert_eq!(
        report_date("Report Date 12/31/2024").as_deref(),
        Some("2024-12-31")
    );
    assert_eq!(report_date(""), None);
}

#[test]
fn run_writes_records_array() {
    let dir = std::env::temp_dir().join(format!("credit_prep_po_csv_{}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).expect("temp dir");
    fs::write(dir.join("po_detail_report.csv"), PO_CSV).expect("write csv");

    let args = PoCsvArgs {
        input: dir.join("po_detail_report.csv"),
        pattern: "*.csv".to_string(),
        out_dir: dir.join("out"),
    };
    run(args).expect("po-csv run");

    let written =
        fs::read_to_string(dir.join("out").join("po_detail_report.json")).expect("output");
    let value: serde_json::Value = serde_json::from_str(&written).expect("json");
    assert_eq!(value.as_array().map(Vec::len), Some(2));
    assert_eq!(value[0]["Buyer Code"], "0105551234567");

    let _ = fs::remove_dir_all(&dir);
}
