//! Sale reports from saved OCR output: HTML tables become rows, the text
//! around them supplies the report metadata.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use regex::Regex;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::cli::{SaleReportArgs, SaleReportKind};
use crate::extract::html::{parse_tables, text_outside_tables};
use crate::layout::Grid;
use crate::model::SaleReportMetadata;
use crate::normalize::{gregorian_year, parse_amount, round_to};
use crate::util::{discover_inputs, file_stem_string, has_extension, run_batch, write_json_pretty};
use crate::vocab::thai_month_number;

#[cfg(test)]
mod tests;

pub type SaleRow = Map<String, Value>;

const DEFAULT_OUT_ROOT: &str = "processed_data";
const INPUT_EXTENSIONS: [&str; 3] = ["html", "htm", "json"];
const SEQUENCE_COLUMN: &str = "ลำดับที่";

const TWO_DECIMAL_COLUMNS: [&str; 6] = [
    "ราคาทุน/หน่วย",
    "จำนวนเงิน",
    "ภาษี",
    "จำนวนเงินสุทธิ",
    "ยอดสุทธิ",
    "ยอดรวม",
];
const THREE_DECIMAL_COLUMNS: [&str; 1] = ["จำนวนที่ขาย"];

fn total_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(?:\btotal\b|grand\s*total|รวมยอดทั้งหมด)").expect("invalid total line regex")
    })
}

fn total_word_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)total").expect("invalid total word regex"))
}

fn number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+(?:\.\d+)?").expect("invalid number regex"))
}

fn glued_numbers_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\d+(?:\.\d+)?\s+\d+(?:\.\d+)?").expect("invalid glued numbers regex")
    })
}

fn topic_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(รายงานการขายสินค้า\s*-\s*แยกตาม\s*(?:ผู้ขาย|ผู้จำหน่าย|Supplier|ซัพพลายเออร์|Invoice))",
        )
        .expect("invalid topic regex")
    })
}

fn period_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"รอบวันที่\s*(\d{1,2})\s*-\s*(\d{1,2})\s*([ก-๙.]+)\s*(\d{4})")
            .expect("invalid period regex")
    })
}

fn vendor_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)#?\s*Vendor\s*(\d+)\s*/\s*([^(]+)\s*\(?(\d+)?\)?")
            .expect("invalid vendor regex")
    })
}

impl SaleReportKind {
    fn default_out_dir(self) -> PathBuf {
        PathBuf::from(DEFAULT_OUT_ROOT).join(match self {
            Self::Invoice => "sale_invoice",
            Self::Supplier => "sale_supplier",
        })
    }

    /// The kind a report topic names, if any.
    pub fn from_topic(topic: &str) -> Option<Self> {
        if !topic_re().is_match(topic) {
            return None;
        }
        Some(if topic.trim_end().ends_with("Invoice") {
            Self::Invoice
        } else {
            Self::Supplier
        })
    }
}

#[derive(Debug, Deserialize)]
struct OcrResponse {
    #[serde(default)]
    results: Vec<OcrPageResult>,
}

#[derive(Debug, Deserialize)]
struct OcrPageResult {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    message: Option<OcrMessage>,
    #[serde(default)]
    error: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct OcrMessage {
    #[serde(default)]
    choices: Vec<OcrChoice>,
}

#[derive(Debug, Deserialize)]
struct OcrChoice {
    message: OcrChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct OcrChoiceMessage {
    #[serde(default)]
    content: String,
}

pub fn run(args: SaleReportArgs) -> Result<()> {
    let pattern = args.pattern.clone().unwrap_or_else(|| "*".to_string());
    let mut inputs = discover_inputs(&args.input, &pattern)?;
    inputs.retain(|path| {
        INPUT_EXTENSIONS
            .iter()
            .any(|extension| has_extension(path, extension))
    });

    let out_dir = args
        .out_dir
        .clone()
        .unwrap_or_else(|| args.kind.default_out_dir());

    run_batch(args.kind.as_str(), &inputs, |path| {
        convert_file(path, args.kind, &out_dir)
    })?;
    Ok(())
}

fn convert_file(path: &Path, kind: SaleReportKind, out_dir: &Path) -> Result<()> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read ocr output: {}", path.display()))?;
    let html = if has_extension(path, "json") {
        html_from_ocr_response(&raw)
            .with_context(|| format!("failed to parse ocr response: {}", path.display()))?
    } else {
        raw
    };

    let metadata = parse_metadata(&html);
    if let Some(topic) = &metadata.topic
        && let Some(named) = SaleReportKind::from_topic(topic)
        && named != kind
    {
        warn!(
            path = %path.display(),
            topic = %topic,
            expected = kind.as_str(),
            "report topic names a different sale report kind"
        );
    }

    let rows = parse_sale_rows(&html);
    if rows.is_empty() {
        bail!("no table rows in {}", path.display());
    }
    let rows = enrich_rows(rows, &metadata);

    let out_path = out_dir.join(format!("{}.json", file_stem_string(path)));
    write_json_pretty(&out_path, &rows)?;

    info!(
        path = %out_path.display(),
        kind = kind.as_str(),
        rows = rows.len(),
        "wrote sale report json"
    );
    Ok(())
}

/// Joins the page contents of an OCR API response. Each content string is
/// JSON carrying `html` or `natural_text`, or the text itself.
pub fn html_from_ocr_response(raw: &str) -> Result<String> {
    let response: OcrResponse =
        serde_json::from_str(raw).context("ocr response has an unexpected shape")?;

    let mut pages = Vec::new();
    for (index, page) in response.results.into_iter().enumerate() {
        let content = match page.message {
            Some(message) if page.success => message
                .choices
                .into_iter()
                .next()
                .map(|choice| choice.message.content),
            _ => None,
        };
        let Some(content) = content else {
            warn!(
                page = index + 1,
                error = %page.error.unwrap_or(serde_json::Value::Null),
                "ocr page failed"
            );
            continue;
        };

        let text = match serde_json::from_str::<Value>(&content) {
            Ok(Value::Object(parsed)) => parsed
                .get("html")
                .or_else(|| parsed.get("natural_text"))
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or(content),
            _ => content,
        };
        pages.push(text);
    }

    Ok(pages.join("\n"))
}

/// Reads topic, round period and vendor from the text outside tables.
pub fn parse_metadata(html: &str) -> SaleReportMetadata {
    let text = text_outside_tables(html).join(" ");
    if text.is_empty() {
        return SaleReportMetadata::default();
    }

    let topic = topic_re()
        .captures(&text)
        .map(|caps| caps[1].trim().to_string());

    let (start_round_date, end_round_date) = period_re()
        .captures(&text)
        .map(|caps| {
            let month = thai_month_number(&caps[3]);
            let year = caps[4].parse::<i32>().ok().map(gregorian_year);
            let day = |value: &str| {
                let day = value.parse::<u32>().ok()?;
                NaiveDate::from_ymd_opt(year?, month?, day)
                    .map(|date| date.format("%Y-%m-%d").to_string())
            };
            (day(&caps[1]), day(&caps[2]))
        })
        .unwrap_or_default();

    let (supplier_num, supplier_name) = vendor_re()
        .captures(&text)
        .map(|caps| {
            (
                Some(caps[1].to_string()),
                Some(caps[2].trim().to_string()).filter(|name| !name.is_empty()),
            )
        })
        .unwrap_or_default();

    SaleReportMetadata {
        topic,
        start_round_date,
        end_round_date,
        supplier_name,
        supplier_num,
    }
}

pub fn is_total_line(cells: &[String]) -> bool {
    total_line_re().is_match(&cells.join(" "))
}

/// Keeps the first number of a "total …" cell or of two numbers OCR glued
/// together; other cells pass through.
pub fn clean_cell(value: &str) -> String {
    let without_commas = value.replace(',', "");
    let first_number = || {
        number_re()
            .find(&without_commas)
            .map(|found| found.as_str().to_string())
    };

    if total_word_re().is_match(value) {
        return first_number().unwrap_or_default();
    }
    if glued_numbers_re().is_match(value) {
        return first_number().unwrap_or_else(|| value.to_string());
    }
    value.to_string()
}

/// Rows of every table, keyed by that table's first-row header.
pub fn parse_sale_rows(html: &str) -> Vec<Vec<(String, String)>> {
    let mut rows = Vec::new();
    for (index, table) in parse_tables(html).into_iter().enumerate() {
        let table_rows = table_rows(&table);
        debug!(table = index + 1, rows = table_rows.len(), "sale report table");
        rows.extend(table_rows);
    }
    rows
}

fn table_rows(table: &Grid) -> Vec<Vec<(String, String)>> {
    let Some((header, body)) = table.split_first() else {
        return Vec::new();
    };

    let body: Vec<&Vec<String>> = body
        .iter()
        .filter(|row| row.iter().any(|value| !value.is_empty()) && !is_total_line(row))
        .collect();
    if body.is_empty() {
        return Vec::new();
    }

    let width = body
        .iter()
        .map(|row| row.len())
        .max()
        .unwrap_or(0)
        .max(header.len());
    let columns: Vec<String> = (0..width)
        .map(|index| match header.get(index).map(|name| name.trim()) {
            Some(name) if !name.is_empty() => name.replace('_', "."),
            _ => format!("col_{}", index + 1),
        })
        .collect();

    body.into_iter()
        .map(|row| {
            columns
                .iter()
                .enumerate()
                .map(|(index, column)| {
                    let value = row.get(index).map(String::as_str).unwrap_or("");
                    (column.clone(), clean_cell(value))
                })
                .collect::<Vec<_>>()
        })
        .filter(|row| {
            let values: Vec<String> = row.iter().map(|(_, value)| value.clone()).collect();
            !is_total_line(&values)
        })
        .filter(|row| {
            row.iter()
                .find(|(column, _)| column == SEQUENCE_COLUMN)
                .is_none_or(|(_, value)| !value.trim().is_empty())
        })
        .collect()
}

/// Converts `DD.MM.YYYY` to ISO with Buddhist-era correction; other text,
/// and dots that do not name a calendar day, are returned unchanged.
pub fn convert_dotted_date(value: &str) -> String {
    let text = value.trim();
    let parts: Vec<&str> = text.split('.').collect();
    if let [day, month, year] = parts.as_slice()
        && let (Ok(day), Ok(month), Ok(year)) = (
            day.trim().parse::<u32>(),
            month.trim().parse::<u32>(),
            year.trim().parse::<i32>(),
        )
        && let Some(date) = NaiveDate::from_ymd_opt(gregorian_year(year), month, day)
    {
        return date.format("%Y-%m-%d").to_string();
    }
    value.to_string()
}

fn is_date_column(column: &str) -> bool {
    column.contains("วันที่") || column.to_lowercase().contains("date")
}

/// Types the row values and appends the report metadata to every row.
pub fn enrich_rows(rows: Vec<Vec<(String, String)>>, metadata: &SaleReportMetadata) -> Vec<SaleRow> {
    let text = |value: &Option<String>| Value::String(value.clone().unwrap_or_default());

    rows.into_iter()
        .map(|row| {
            let mut out = SaleRow::new();
            for (column, value) in row {
                let value = value.trim();
                let typed = if TWO_DECIMAL_COLUMNS.contains(&column.as_str()) {
                    Value::from(round_to(parse_amount(value).unwrap_or(0.0), 2))
                } else if THREE_DECIMAL_COLUMNS.contains(&column.as_str()) {
                    Value::from(round_to(parse_amount(value).unwrap_or(0.0), 3))
                } else if is_date_column(&column) {
                    Value::String(convert_dotted_date(value))
                } else {
                    Value::String(value.to_string())
                };
                out.insert(column, typed);
            }
            out.insert("topic".to_string(), text(&metadata.topic));
            out.insert(
                "start_round_date".to_string(),
                text(&metadata.start_round_date),
            );
            out.insert("end_round_date".to_string(), text(&metadata.end_round_date));
            out.insert("supplier_name".to_string(), text(&metadata.supplier_name));
            out.insert("supplier_num".to_string(), text(&metadata.supplier_num));
            out
        })
        .collect()
}
