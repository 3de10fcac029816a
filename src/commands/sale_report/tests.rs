use std::fs;

use super::*;

const REPORT_HTML: &str = r#"<html><body>
<p>รายงานการขายสินค้า - แยกตามผู้ขาย</p>
<p>รอบวันที่ 1 - 31 ธค. 2567</p>
<p>#Vendor 2040334 / บริษัท เอ จำกัด (2040334)</p>
<table>
<tr><th>ลำดับที่</th><th>วันที่_ขาย</th><th>จำนวนที่ขาย</th><th>จำนวนเงิน</th><th>หมายเหตุ</th></tr>
<tr><td>1</td><td>05.12.2567</td><td>1,357.25</td><td>1,234.567</td><td>ok</td></tr>
<tr><td></td><td>06.12.2567</td><td>1</td><td>2</td></tr>
<tr><td>2</td><td>07.12.2567</td><td>3 4</td><td>99.999</td></tr>
<tr><td colspan="2">Grand Total</td><td>5</td><td>1,334.57</td></tr>
</table>
</body></html>"#;

#[test]
fn metadata_comes_from_text_outside_tables() {
    let metadata = parse_metadata(REPORT_HTML);
    assert_eq!(
        metadata,
        SaleReportMetadata {
            topic: Some("รายงานการขายสินค้า - แยกตามผู้ขาย".to_string()),
            start_round_date: Some("2024-12-01".to_string()),
            end_round_date: Some("2024-12-31".to_string()),
            supplier_name: Some("บริษัท เอ จำกัด".to_string()),
            supplier_num: Some("2040334".to_string()),
        }
    );
}

#[test]
fn table_rows_are_cleaned_typed_and_enriched() {
    let rows = parse_sale_rows(REPORT_HTML);
    assert_eq!(rows.len(), 2);

    let rows = enrich_rows(rows, &parse_metadata(REPORT_HTML));
    let first = &rows[0];
    assert_eq!(
        first.keys().collect::<Vec<_>>(),
        vec![
            "ลำดับที่",
            "วันที่.ขาย",
            "จำนวนที่ขาย",
            "จำนวนเงิน",
            "หมายเหตุ",
            "topic",
            "start_round_date",
            "end_round_date",
            "supplier_name",
            "supplier_num",
        ]
    );
    assert_eq!(first["วันที่.ขาย"], "2024-12-05");
    assert_eq!(first["จำนวนที่ขาย"], json_number(1357.25));
    assert_eq!(first["จำนวนเงิน"], json_number(1234.57));
    assert_eq!(first["supplier_num"], "2040334");

    let second = &rows[1];
    assert_eq!(second["ลำดับที่"], "2");
    assert_eq!(second["จำนวนที่ขาย"], json_number(3.0));
    assert_eq!(second["จำนวนเงิน"], json_number(100.0));
    assert_eq!(second["หมายเหตุ"], "");
}

fn json_number(value: f64) -> Value {
    Value::from(value)
}

#[test]
fn missing_metadata_is_written_as_empty_text() {
    let rows = enrich_rows(
        vec![vec![("ภาษี".to_string(), "n/a".to_string())]],
        &SaleReportMetadata::default(),
    );
    assert_eq!(rows[0]["ภาษี"], json_number(0.0));
    assert_eq!(rows[0]["topic"], "");
    assert_eq!(rows[0]["end_round_date"], "");
}

#[test]
fn ocr_response_pages_are_joined() {
    let raw = r#"{"results": [
        {"success": true, "message": {"choices": [{"message": {"content": "{\"html\": \"<p>x</p>\"}"}}]}},
        {"success": false, "error": "boom"},
        {"success": true, "message": {"choices": [{"message": {"content": "plain text"}}]}}
    ]}"#;
    assert_eq!(
        html_from_ocr_response(raw).expect("response"),
        "<p>x</p>\nplain text"
    );
    assert!(html_from_ocr_response("\"just text\"").is_err());
}

#[test]
fn cell_cleaning_and_date_helpers() {
    assert_eq!(clean_cell("Total 1,234.50 baht"), "1234.50");
    assert_eq!(clean_cell("TOTAL"), "");
    assert_eq!(clean_cell("12.5 13.0"), "12.5");
    assert_eq!(clean_cell("สินค้า A"), "สินค้า A");

    assert_eq!(convert_dotted_date("05.12.2567"), "2024-12-05");
    assert_eq!(convert_dotted_date("2024-12-05"), "2024-12-05");
    assert_eq!(convert_dotted_date("1.5"), "1.5");
}

#[test]
fn dotted_date_outside_the_calendar_is_left_as_is() {
    assert_eq!(convert_dotted_date("31.02.2567"), "31.02.2567");
    assert_eq!(convert_dotted_date("29.02.2567"), "2024-02-29");
    assert_eq!(convert_dotted_date("01.13.2024"), "01.13.2024");
}

#[test]
fn topic_names_its_kind() {
    assert_eq!(
        SaleReportKind::from_topic("รายงานการขายสินค้า - แยกตาม Invoice"),
        Some(SaleReportKind::Invoice)
    );
    assert_eq!(
        SaleReportKind::from_topic("รายงานการขายสินค้า - แยกตามผู้จำหน่าย"),
        Some(SaleReportKind::Supplier)
    );
    assert_eq!(SaleReportKind::from_topic("อื่น ๆ"), None);
}

#[test]
fn run_writes_rows_for_html_input() {
    let dir = std::env::temp_dir().join(format!("credit_prep_sale_{}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).expect("temp dir");
    fs::write(dir.join("sale_dec.html"), REPORT_HTML).expect("write html");
    fs::write(dir.join("empty.html"), "<p>no tables</p>").expect("write html");

    let args = SaleReportArgs {
        input: dir.clone(),
        kind: SaleReportKind::Supplier,
        pattern: None,
        out_dir: Some(dir.join("out")),
    };
    run(args).expect("sale-report run");

    let written = fs::read_to_string(dir.join("out").join("sale_dec.json")).expect("output");
    let value: Value = serde_json::from_str(&written).expect("json");
    assert_eq!(value.as_array().map(Vec::len), Some(2));
    assert!(!dir.join("out").join("empty.json").exists());

    let _ = fs::remove_dir_all(&dir);
}
