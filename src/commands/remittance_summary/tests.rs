use super::*;
use crate::cli::RemittanceSummaryArgs;

const REPORT_TEXT: &str = "\
Remittance Summary Report
Remittance No Supplier Branch Remittance Date Sent Date Amount Status
0000123456บริษัท เอ จำกัด 00000 12/05/2024 13/05/2024 04:18:12 PM 1,234.56 Open 1 2040334 20/05/2024
0000123457 Banana Society
FC01 14/05/2024 15/05/2024 09:00:00 AM 99.00 CLOSED 2 2040335 21/05/2024
0000123458 broken line without the rest 12/05/2024
Page 1 of 1
";

fn parser() -> SummaryParser {
    SummaryParser::new().expect("summary parser")
}

#[test]
fn single_line_record_splits_glued_code() {
    let records = parser().parse(REPORT_TEXT, "rm_summary.pdf");
    assert_eq!(records.len(), 2);

    assert_eq!(
        records[0],
        RemittanceSummaryRecord {
            supplier_code: "2040334".to_string(),
            remittance_no: "0000123456".to_string(),
            supplier_name: "บริษัท เอ จำกัด".to_string(),
            branch: "00000".to_string(),
            sent_date: Some("2024-05-13 16:18:12".to_string()),
            remittance_date: Some("2024-05-12".to_string()),
            amount: Some(1234.56),
            status: "Open".to_string(),
            sequence: 1,
            pay_date: Some("2024-05-20".to_string()),
            source_pdf: "rm_summary.pdf".to_string(),
        }
    );
}

#[test]
fn record_without_date_joins_next_line() {
    let records = parser().parse(REPORT_TEXT, "rm_summary.pdf");
    let second = &records[1];
    assert_eq!(second.remittance_no, "0000123457");
    assert_eq!(second.supplier_name, "Banana Society");
    assert_eq!(second.branch, "FC01");
    assert_eq!(second.status, "CLOSED");
    assert_eq!(second.amount, Some(99.0));
    assert_eq!(second.sequence, 2);
}

#[test]
fn sent_time_is_converted_to_24_hours() {
    let records = parser().parse(REPORT_TEXT, "rm_summary.pdf");
    assert_eq!(records[1].sent_date.as_deref(), Some("2024-05-15 09:00:00"));

    let record = parser()
        .parse_record(
            "0000000002 ACME 00000 01/10/2568 02/10/2568 04:18:12 PM 5.00 New 4 77 03/10/2568",
            "b.pdf",
        )
        .expect("buddhist era record");
    assert_eq!(record.sent_date.as_deref(), Some("2025-10-02 16:18:12"));
    assert_eq!(record.remittance_date.as_deref(), Some("2025-10-01"));

    let midnight = parser()
        .parse_record(
            "0000000003 ACME 00000 01/01/2024 02/01/2024 12:05:00 AM 5.00 New 5 77 03/01/2024",
            "c.pdf",
        )
        .expect("midnight record");
    assert_eq!(midnight.sent_date.as_deref(), Some("2024-01-02 00:05:00"));
}

#[test]
fn single_word_name_has_empty_branch() {
    let record = parser()
        .parse_record(
            "0000000001 ACME 01/01/2024 02/01/2024 10:00:00 AM 5.00 New 3 77 03/01/2024",
            "a.pdf",
        )
        .expect("record");
    assert_eq!(record.supplier_name, "ACME");
    assert_eq!(record.branch, "");
}

#[test]
fn normalize_line_pads_tokens() {
    assert_eq!(
        parser().normalize_line("0000000001X 01/01/2024100.00"),
        "0000000001 X 01/01/2024 100.00"
    );
}

#[test]
fn run_reads_text_report() {
    let dir = std::env::temp_dir().join(format!(
        "credit_prep_rm_summary_{}",
        std::process::id()
    ));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).expect("temp dir");
    let input = dir.join("rm_summary.txt");
    fs::write(&input, REPORT_TEXT).expect("write report");

    run(RemittanceSummaryArgs {
        input,
        out_dir: dir.join("out"),
    })
    .expect("remittance summary run");

    let written = fs::read_to_string(dir.join("out").join("rm_summary.json")).expect("output");
    let value: serde_json::Value = serde_json::from_str(&written).expect("json");
    assert_eq!(value.as_array().map(Vec::len), Some(2));
    assert_eq!(value[1]["source_pdf"], "rm_summary.txt");

    let _ = fs::remove_dir_all(&dir);
}
