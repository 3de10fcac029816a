use std::fs;

use super::*;

fn grid(rows: &[&[&str]]) -> Grid {
    rows.iter()
        .map(|row| row.iter().map(|value| value.to_string()).collect())
        .collect()
}

fn invoice_grid() -> Grid {
    grid(&[
        &["Invoice Report", "", "", "", "", "", "", "", ""],
        &[
            "No.",
            "Invoice No",
            "Supplier Code",
            "Supplier Name",
            "Invoice Date",
            "Invoice Received Date",
            "Related Document",
            "Amount (Include VAT)",
            "Status",
        ],
        &[
            "1",
            "iv 0OO1775",
            "2040334",
            "ACME  Trading",
            "05/07/2024",
            "7/15/2024 2:30:00 PM",
            "PO: 1013090869",
            "1,171.37",
            "Paid",
        ],
        &[
            "No",
            "Invoice No.",
            "Supplier Code",
            "Supplier Name",
            "",
            "",
            "",
            "",
            "",
        ],
        &[
            "2",
            "IV0001776",
            "2040334",
            "ACME Trading",
            "31/07/2567",
            "",
            "-",
            "abc",
            "Open",
        ],
        &["", "", "", "", "", "", "", "", ""],
        &["", "Total", "", "", "", "", "", "1,171.37", ""],
    ])
}

#[test]
fn invoice_grid_is_canonicalized_and_transformed() {
    let rows = records_from_grid(&invoice_grid(), InvoiceKind::Invoice).expect("rows");
    let options = NormalizeOptions {
        fix_lookalikes: true,
        ..NormalizeOptions::default()
    };
    let records = normalize_records(rows, InvoiceKind::Invoice, &options);

    assert_eq!(records.len(), 2);
    let first = &records[0];
    assert_eq!(
        first.keys().collect::<Vec<_>>(),
        vec![
            "No",
            "Invoice No.",
            "Supplier Code",
            "Supplier Name",
            "Invoice Date",
            "Invoice Received Date",
            "Related Document",
            "Amount",
            "Status",
        ]
    );
    assert_eq!(first["Invoice No."], "IV0001775");
    assert_eq!(first["Supplier Name"], "ACME Trading");
    assert_eq!(first["Invoice Date"], "2024-07-05");
    assert_eq!(first["Invoice Received Date"], "2024-07-15 14:30:00");
    assert_eq!(first["Related Document"], "1013090869");
    assert_eq!(first["Amount"], json!(1171.37));

    let second = &records[1];
    assert_eq!(second["Invoice Date"], "2024-07-31");
    assert_eq!(second["Invoice Received Date"], "");
    assert_eq!(second["Related Document"], "-");
    assert_eq!(second["Amount"], "abc");
}

#[test]
fn strict_mode_keeps_clean_numbers_only() {
    let rows: Vec<Record> = [
        json!({"Invoice No.": "IV123", "Supplier Code": "2040334"}),
        json!({"Invoice No.": "IV-12", "Supplier Code": "2040334"}),
        json!({"Invoice No.": "IV124", "Supplier Code": "A12"}),
        json!({"Invoice No.": "CN9", "Supplier Code": 2040334}),
    ]
    .into_iter()
    .filter_map(|value| value.as_object().cloned())
    .collect();

    let options = NormalizeOptions {
        strict: true,
        ..NormalizeOptions::default()
    };
    let records = normalize_records(rows, InvoiceKind::Invoice, &options);
    let numbers: Vec<&str> = records
        .iter()
        .filter_map(|record| record["Invoice No."].as_str())
        .collect();
    assert_eq!(numbers, vec!["IV123", "CN9"]);
}

#[test]
fn positional_json_uses_first_row_as_header() {
    let value = json!([
        {"0": "PO No.", "1": "Order Date", "2": "Send Date", "3": "Amount"},
        {"0": "PO123", "1": "05/07/2567", "2": "07/05/2024 13:05:00 PM", "3": "abc"},
        {"0": "PO124", "1": "06/07/2024", "2": "", "3": "2,000.50"}
    ]);
    let rows = records_from_json(value).expect("rows");
    let records = normalize_records(rows, InvoiceKind::Po, &NormalizeOptions::default());

    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["PO No."], "PO123");
    assert_eq!(records[0]["Order Date"], "2024-07-05");
    assert_eq!(records[0]["Send Date"], "2024-05-07 13:05:00");
    assert_eq!(records[0]["Amount Include VAT"], "abc");
    assert_eq!(records[1]["Amount Include VAT"], json!(2000.5));
}

#[test]
fn non_array_json_is_rejected() {
    assert!(records_from_json(json!({"records": []})).is_err());
}

#[test]
fn sort_compares_numbers_and_text() {
    let mut records: Vec<Record> = [
        json!({"Amount": 20.0, "Invoice No.": "B"}),
        json!({"Amount": 3.5, "Invoice No.": "A"}),
        json!({"Invoice No.": "C"}),
    ]
    .into_iter()
    .filter_map(|value| value.as_object().cloned())
    .collect();

    sort_records(&mut records, "Amount", true);
    let order: Vec<&str> = records
        .iter()
        .filter_map(|record| record["Invoice No."].as_str())
        .collect();
    assert_eq!(order, vec!["C", "B", "A"]);

    sort_records(&mut records, "Invoice No.", false);
    assert_eq!(records[0]["Invoice No."], "A");
}

#[test]
fn document_number_and_related_document_helpers() {
    assert_eq!(fix_document_number("iv 0OO1775"), "IV0001775");
    assert_eq!(fix_document_number("Pending"), "PENDING");
    assert_eq!(related_document("PO 1013 090869").as_deref(), Some("1013090869"));
    assert_eq!(related_document("1234567"), None);
    assert_eq!(
        InvoiceKind::Invoice.canonical_key("Tax Invoice No."),
        "Invoice No."
    );
    assert_eq!(InvoiceKind::Po.canonical_key("Remark  1"), "Remark 1");
}

#[test]
fn run_writes_mode_and_records() {
    let dir = std::env::temp_dir().join(format!("credit_prep_invoice_{}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).expect("temp dir");
    fs::write(
        dir.join("inv_2024.csv"),
        "No.,Invoice No,Supplier Code,Amount\n1,IV1001,2040334,\"1,000.00\"\n,Total,,\"1,000.00\"\n",
    )
    .expect("write csv");
    fs::write(dir.join("notes.md"), "ignored").expect("write notes");

    let args = InvoiceArgs {
        input: dir.clone(),
        kind: InvoiceKind::Invoice,
        sheet: None,
        pattern: None,
        strict: false,
        fix_lookalikes: false,
        records_only: false,
        sort_by: None,
        sort_desc: false,
        out_dir: Some(dir.join("out")),
    };
    run(args).expect("invoice run");

    let written = fs::read_to_string(dir.join("out").join("inv_2024.json")).expect("output");
    let value: Value = serde_json::from_str(&written).expect("json");
    assert_eq!(value["mode"], "grid");
    assert_eq!(value["records"].as_array().map(Vec::len), Some(1));
    assert_eq!(value["records"][0]["Amount"], json!(1000.0));

    let _ = fs::remove_dir_all(&dir);
}
