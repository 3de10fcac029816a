use super::cascade::{Classification, PageContext, RemittanceCascade, TierKind};
use super::tokens::{extract_best_token, fold_crossdock, normalize_branch, repair_ref_if_needed};
use super::*;

fn context() -> PageContext {
    PageContext {
        page_number: 3,
        pay_date: Some("2024-07-15".to_string()),
        doc_date: None,
        vendor_code: Some("2040334".to_string()),
    }
}

fn matched(classification: Classification) -> (TransactionRecord, TierKind) {
    match classification {
        Classification::Matched { record, tier } => (record, tier),
        other => panic!("expected a match, got {other:?}"),
    }
}

#[test]
fn strict_tier_wins_when_every_field_is_clean() {
    let cascade = RemittanceCascade::new().expect("cascade");
    let (record, tier) = matched(cascade.classify(
        "01/07/2567 FC15 IV IV0001775 IV0001775 1,171.37",
        &context(),
    ));

    assert_eq!(tier, TierKind::Strict);
    assert_eq!(record.date, "2024-07-01");
    assert_eq!(record.branch_code, "FC15");
    assert_eq!(record.doc_type, "IV");
    assert_eq!(record.doc_no, "IV0001775");
    assert_eq!(record.ref_no, "IV0001775");
    assert_eq!(record.amount, Some(1171.37));
    assert_eq!(record.page, 3);
    assert_eq!(record.pay_date.as_deref(), Some("2024-07-15"));
    assert_eq!(record.vendor_code.as_deref(), Some("2040334"));
}

#[test]
fn noisy_doc_column_falls_back_to_best_token() {
    let cascade = RemittanceCascade::new().expect("cascade");
    let (record, tier) = matched(cascade.classify(
        "02/07/2567 W9O1 cn เน?NV68071 NV68071 (5,463.04)",
        &context(),
    ));

    assert_eq!(tier, TierKind::FallbackAny);
    assert_eq!(record.branch_code, "W901");
    assert_eq!(record.doc_type, "CN");
    assert_eq!(record.doc_no, "NV68071");
    assert_eq!(record.ref_no, "NV68071");
    assert_eq!(record.amount, Some(-5463.04));
}

#[test]
fn missing_branch_defaults_to_zeros() {
    let cascade = RemittanceCascade::new().expect("cascade");
    let (record, tier) = matched(cascade.classify(
        "05/07/2567 CN CN123456 IV0001775 -250.00",
        &context(),
    ));

    assert_eq!(tier, TierKind::NoBranch);
    assert_eq!(record.branch_code, "0000");
    assert_eq!(record.doc_no, "CN123456");
    assert_eq!(record.ref_no, "IV0001775");
    assert_eq!(record.amount, Some(-250.0));
}

#[test]
fn unmatched_requires_date_and_amount_shapes() {
    let cascade = RemittanceCascade::new().expect("cascade");

    assert_eq!(
        cascade.classify("10/07/2567 something weird 1,000.00", &context()),
        Classification::Unmatched("10/07/2567 something weird 1,000.00".to_string())
    );
    assert_eq!(
        cascade.classify("รายงานการจ่ายเงิน", &context()),
        Classification::Ignored
    );
    assert_eq!(
        cascade.tiers().collect::<Vec<_>>(),
        vec![TierKind::Strict, TierKind::FallbackAny, TierKind::NoBranch]
    );
}

#[test]
fn cross_dock_lines_fold_to_canonical_pair() {
    let cascade = RemittanceCascade::new().expect("cascade");
    let (record, _) = matched(cascade.classify(
        "03/07/2567 0000 IV CROSS DOCK 1,000.00",
        &context(),
    ));
    assert_eq!(record.doc_no, "CROSS DOCK");
    assert_eq!(record.ref_no, "Crossdock");

    let folded = ("CROSS DOCK".to_string(), "Crossdock".to_string());
    assert_eq!(fold_crossdock("CROSS-DOCK", "IV1"), folded);
    assert_eq!(fold_crossdock("dock", "cross"), folded);
    assert_eq!(fold_crossdock("CROSS", ""), folded);
    assert_eq!(
        fold_crossdock(" IV1 ", "IV2"),
        ("IV1".to_string(), "IV2".to_string())
    );
}

#[test]
fn normalize_branch_applies_code_rules() {
    assert_eq!(normalize_branch("FC1"), "FC01");
    assert_eq!(normalize_branch("FC15"), "FC15");
    assert_eq!(normalize_branch("F C 12"), "FC12");
    assert_eq!(normalize_branch("W9O1"), "W901");
    assert_eq!(normalize_branch("OOOO"), "0000");
    assert_eq!(normalize_branch("x00001"), "0000");
    assert_eq!(normalize_branch("b12"), "B12");
}

#[test]
fn best_token_prefers_longest_then_first() {
    assert_eq!(extract_best_token("เน?NV68071").as_deref(), Some("NV68071"));
    assert_eq!(extract_best_token("AB12 CD34").as_deref(), Some("AB12"));
    assert_eq!(extract_best_token("1V0001775").as_deref(), Some("IV0001775"));
    assert_eq!(extract_best_token("A-B-C-D-E").as_deref(), Some("A-B-C-D-E"));
    assert_eq!(extract_best_token("ก ข"), None);
}

#[test]
fn truncated_reference_is_restored_from_doc() {
    assert_eq!(repair_ref_if_needed("IV0001775", "IV000177"), "IV0001775");
    assert_eq!(repair_ref_if_needed("IV0001775", "NV1"), "NV1");
    assert_eq!(repair_ref_if_needed("IV0001775", ""), "IV0001775");
    assert_eq!(repair_ref_if_needed("", "NV1"), "NV1");
}

#[test]
fn document_collects_header_fields_totals_and_dedups_across_pages() {
    let parser = RemittanceParser::new().expect("parser");
    let text = "วันที่จ่ายเงิน: 15/07/2567\nวันที่เอกสาร 10/07/2567\nรหัสผู้ขาย: 2O4O334\n\
                01/07/2567 FC15 IV IV0001775 IV0001775 1,171.37\n\
                10/07/2567 something weird 1,000.00\n\
                GRAND TOTAL Amount 1,171.37";
    let pages = vec![
        RawPage::new(1, text.to_string()),
        RawPage::new(2, text.to_string()),
    ];

    let context = parser.page_context(&pages[0]);
    assert_eq!(context.pay_date.as_deref(), Some("2024-07-15"));
    assert_eq!(context.doc_date.as_deref(), Some("2024-07-10"));
    assert_eq!(context.vendor_code.as_deref(), Some("2040334"));

    let document = parser.parse_document("rm.pdf", &pages, true);
    assert_eq!(document.file, "rm.pdf");
    assert_eq!(document.transactions.len(), 1);
    assert_eq!(document.transactions[0].page, 1);
    assert_eq!(document.transactions[0].doc_date.as_deref(), Some("2024-07-10"));
    assert_eq!(
        document.grand_totals,
        vec![
            GrandTotal {
                grand_total_amount: 1171.37,
                page: 1
            },
            GrandTotal {
                grand_total_amount: 1171.37,
                page: 2
            },
        ]
    );
    assert_eq!(
        document.unmatched,
        Some(vec![
            "[page 1] 10/07/2567 something weird 1,000.00".to_string(),
            "[page 2] 10/07/2567 something weird 1,000.00".to_string(),
        ])
    );

    let quiet = parser.parse_document("rm.pdf", &pages, false);
    assert!(quiet.unmatched.is_none());
}

#[test]
fn slow_ocr_runs_more_passes_than_fast() {
    let slow = ocr_settings(OcrMode::Slow);
    let fast = ocr_settings(OcrMode::Fast);
    assert!(slow.passes.len() > fast.passes.len());
    assert!(slow.dpi > fast.dpi);
    assert_eq!(fast.lang, "tha+eng");
}
