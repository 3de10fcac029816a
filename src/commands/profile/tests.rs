use std::fs;

use super::parse::{
    SectionKey, director_candidate, key_at, norm_line, parse_sections, to_directors,
};
use super::*;
use crate::cli::ProfileArgs;
use crate::model::{BusinessSection, Director};

const PROFILE_TEXT: &str = "\
ข้อมูล
บริษัท ตัวอย่าง จำกัด
เลขทะเบียนนิติบุคคล : 0105551234567
ประเภทนิติบุคคล : บริษัทจำกัด
วันที่จดทะเบียนจัดตั้ง : 15/03/2551
สถานะนิติบุคคล : ยังดำเนินกิจการอยู่
ทุนจดทะเบียน (บาท) : 5,000,000.00
หมวดธุรกิจตอนจดทะเบียน :
46900 : การขายส่งสินค้าทั่วไป
วัตถุประสงค์ตอนจดทะเบียน :
ประกอบกิจการค้าส่ง
หมวดธุรกิจ
(มาจากงบการเงินปีล่าสุด) :
วัตถุประสงค์
(มาจากงบการเงินปีล่าสุด) :
47190 : การขายปลีกสินค้าอื่น
46900 : ขายส่ง
ปีที่ส่งงบการเงิน :
2563 2564 2565
ที่ตั้ง :
99/1 ถนนพระราม 9 แขวงห้วยขวาง
เขตห้วยขวาง กรุงเทพมหานคร 10310
กรรมการ :
1. นายสมชาย ใจดี /
2. นางสาวสมหญิง ใจงาม
คณะกรรมการลงชื่อผูกพัน :
นายสมชาย ใจดี ลงลายมือชื่อ
คนใดคนหนึ
ข้อควรทราบ : โปรดตรวจสอบ
วันที่สั่งพิมพ์ : 20/10/2568 เวลา : 14:59:39
URL : https://datawarehouse.dbd.go.th/company/profile/5/0105551234567
";

fn lines_of(text: &str) -> Vec<String> {
    text.lines()
        .map(norm_line)
        .filter(|line| !line.is_empty())
        .collect()
}

fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("credit_prep_{name}_{}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).expect("temp dir");
    dir
}

#[test]
fn clean_text_rejoins_marks_and_collapses_space() {
    assert_eq!(clean_text("ก\n่า  \t ข"), "ก่า ข");
    assert_eq!(clean_text("x\r\n\n\n\ny"), "x\n\ny");
    assert_eq!(clean_text("  a  "), "a");
}

#[test]
fn keys_are_found_on_one_or_two_lines() {
    let lines = lines_of("ที่ตั้ง :\nหมวดธุรกิจ\n(มาจากงบการเงินปีล่าสุด) :\nหมวดธุรกิจ\nอื่น");
    assert_eq!(key_at(&lines, 0), Some(SectionKey::Address));
    assert_eq!(key_at(&lines, 1), Some(SectionKey::BusinessLatest));
    assert_eq!(SectionKey::BusinessLatest.span(), 2);
    assert_eq!(key_at(&lines, 3), None);
    assert_eq!(key_at(&lines, 4), None);
}

#[test]
fn director_lines_are_numbered_names() {
    assert_eq!(
        director_candidate("3) นายก ข /").as_deref(),
        Some("นายก ข")
    );
    assert_eq!(director_candidate("4. ข้อมูล ณ วันที่"), None);
    assert_eq!(director_candidate("นายก ข"), None);

    let directors = to_directors(vec![
        "นายก".to_string(),
        " ".to_string(),
        "นายข /".to_string(),
        "นายก".to_string(),
    ]);
    assert_eq!(
        directors,
        vec![
            Director {
                no: 1,
                name: "นายก".to_string()
            },
            Director {
                no: 2,
                name: "นายข".to_string()
            },
        ]
    );
}

#[test]
fn sections_receive_following_lines_in_order() {
    let sections = parse_sections(&lines_of(PROFILE_TEXT));

    assert_eq!(
        sections.business_section_at_registration,
        Some(BusinessSection {
            code: Some("46900".to_string()),
            description: "การขายส่งสินค้าทั่วไป".to_string(),
        })
    );
    assert_eq!(
        sections.objective_at_registration.as_deref(),
        Some("ประกอบกิจการค้าส่ง")
    );
    assert_eq!(
        sections
            .business_section_latest
            .as_ref()
            .and_then(|section| section.code.as_deref()),
        Some("47190")
    );
    assert_eq!(sections.objective_latest.as_deref(), Some("ขายส่ง"));
    assert_eq!(
        sections.financial_years,
        Some(vec![
            "2563".to_string(),
            "2564".to_string(),
            "2565".to_string()
        ])
    );
    assert_eq!(
        sections.address.as_deref(),
        Some("99/1 ถนนพระราม 9 แขวงห้วยขวาง เขตห้วยขวาง กรุงเทพมหานคร")
    );
    assert_eq!(sections.directors.as_ref().map(Vec::len), Some(2));
    assert_eq!(
        sections.binding_rule.as_deref(),
        Some("นายสมชาย ใจดี ลงลายมือชื่อ คนใดคนหนึ่ง")
    );
}

#[test]
fn stray_and_numbered_lines_are_not_section_content() {
    let lines = lines_of("ข้อความนำ\nที่ตั้ง :\n1. ไม่ใช่ที่อยู่\n12 ถนนสาทร");
    let sections = parse_sections(&lines);
    assert_eq!(sections.address.as_deref(), Some("12 ถนนสาทร"));
    assert_eq!(sections.directors, None);
    assert_eq!(sections.binding_rule, None);
}

#[test]
fn parser_fills_single_value_fields() {
    let parser = ProfileParser::new().expect("parser");
    let pages = vec![RawPage::new(1, clean_text(PROFILE_TEXT))];
    let profile = parser.parse(&pages);

    assert_eq!(profile.company_name.as_deref(), Some("บริษัท ตัวอย่าง จำกัด"));
    assert_eq!(profile.registration_number.as_deref(), Some("0105551234567"));
    assert_eq!(profile.entity_type.as_deref(), Some("บริษัทจำกัด"));
    assert_eq!(profile.incorporation_date_th.as_deref(), Some("2008-03-15"));
    assert_eq!(profile.status.as_deref(), Some("ยังดำเนินกิจการอยู่"));
    assert_eq!(profile.registered_capital_baht, Some(5_000_000.0));
    assert_eq!(profile.financial_filing_years_th.len(), 3);
    assert_eq!(profile.directors[1].name, "นางสาวสมหญิง ใจงาม");
    assert_eq!(
        profile.source_url.as_deref(),
        Some("https://datawarehouse.dbd.go.th/company/profile/5/0105551234567")
    );

    let printed = profile.printed_at.expect("printed at");
    assert_eq!(printed.date.as_deref(), Some("20/10/2568"));
    assert_eq!(printed.time.as_deref(), Some("14:59:39"));
}

#[test]
fn parser_leaves_missing_fields_out() {
    let parser = ProfileParser::new().expect("parser");
    let profile = parser.parse(&[RawPage::new(1, "nothing useful".to_string())]);
    assert_eq!(profile.company_name, None);
    assert_eq!(profile.printed_at, None);
    assert!(profile.directors.is_empty());

    let value = serde_json::to_value(&profile).expect("json");
    assert_eq!(value.as_object().map(|map| map.len()), Some(0));
}

#[test]
fn title_card_fills_registered_date_and_empty_address() {
    let dir = temp_dir("profile_card");
    fs::write(
        dir.join("0105551234567_company_title.json"),
        r#"{"registered_date": "2008-03-15", "head_office_address": "HQ", "rank": 1}"#,
    )
    .expect("write card");

    let mut profile = CompanyProfile {
        registration_number: Some("0105551234567".to_string()),
        ..CompanyProfile::default()
    };
    merge_title_card(&mut profile, &dir, "ignored");
    assert_eq!(profile.registered_date.as_deref(), Some("2008-03-15"));
    assert_eq!(profile.address.as_deref(), Some("HQ"));
    assert_eq!(
        profile.title_card.as_ref().map(|card| card["rank"].clone()),
        Some(Value::from(1))
    );

    let mut other = CompanyProfile::default();
    merge_title_card(&mut other, &dir, "0999_company_info");
    assert_eq!(other.title_card, None);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn run_writes_dump_and_structured_profile_for_text_input() {
    let dir = temp_dir("profile_run");
    let input = dir.join("0105551234567_company_info.txt");
    fs::write(&input, PROFILE_TEXT).expect("write text");

    let args = ProfileArgs {
        input: input.clone(),
        pattern: None,
        lang: "tha+eng".to_string(),
        dpi: 300,
        force_ocr: false,
        structured_only: false,
        text_only: false,
        out_dir: None,
    };
    run(args).expect("profile run");

    let dump: Value = serde_json::from_str(
        &fs::read_to_string(dir.join("0105551234567_company_info.json")).expect("dump"),
    )
    .expect("dump json");
    assert_eq!(dump["engine"], "text");
    assert_eq!(dump["num_pages"], 1);

    let structured: Value = serde_json::from_str(
        &fs::read_to_string(dir.join("0105551234567_company_info_structured.json"))
            .expect("structured"),
    )
    .expect("structured json");
    assert_eq!(structured["registration_number"], "0105551234567");
    assert_eq!(structured["directors"][0]["no"], 1);

    let _ = fs::remove_dir_all(&dir);
}
