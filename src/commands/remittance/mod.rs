//! Remittance advice extraction: OCR or pre-extracted page text in,
//! transactions and per-page grand totals out.

use anyhow::{Context, Result, bail};
use regex::Regex;
use tracing::{debug, info};

use crate::assemble::{DedupKey, dedup_by_key};
use crate::cli::{OcrMode, RemittanceArgs};
use crate::extract::pdf::{OcrPass, OcrSettings, RawPage, load_json_pages, ocr_pages};
use crate::model::{GrandTotal, RemittanceDocument, TransactionRecord};
use crate::normalize::{fix_o0_i1, format_amount, parse_amount_opt, parse_date};
use crate::util::{file_name_string, file_stem_string, has_extension, write_json_pretty};

pub mod cascade;
pub mod tokens;

#[cfg(test)]
mod tests;

use cascade::{Classification, PageContext, RemittanceCascade};

const OCR_LANG: &str = "tha+eng";

pub fn run(args: RemittanceArgs, debug_output: bool) -> Result<()> {
    let input = &args.input;
    if !input.is_file() {
        bail!("input does not exist: {}", input.display());
    }

    let pages = if has_extension(input, "pdf") {
        info!(path = %input.display(), mode = args.ocr_mode.as_str(), "ocr remittance pdf");
        let texts = ocr_pages(input, &ocr_settings(args.ocr_mode))?;
        texts
            .into_iter()
            .enumerate()
            .map(|(index, text)| RawPage::new(index + 1, text))
            .collect()
    } else {
        info!(path = %input.display(), "loading remittance pages json");
        load_json_pages(input)?
    };
    info!(pages = pages.len(), "extracting remittance transactions");

    let parser = RemittanceParser::new()?;
    let document = parser.parse_document(&file_name_string(input), &pages, debug_output);

    let out_path = args
        .out_dir
        .join(format!("{}.json", file_stem_string(input)));
    write_json_pretty(&out_path, &document)?;

    info!(
        path = %out_path.display(),
        transactions = document.transactions.len(),
        grand_totals = document.grand_totals.len(),
        unmatched = document.unmatched.as_ref().map_or(0, Vec::len),
        "wrote remittance json"
    );

    Ok(())
}

pub fn ocr_settings(mode: OcrMode) -> OcrSettings {
    let gray = |psm| OcrPass {
        psm,
        monochrome: false,
    };
    match mode {
        OcrMode::Slow => OcrSettings {
            lang: OCR_LANG.to_string(),
            dpi: 350,
            passes: vec![
                gray(6),
                OcrPass {
                    psm: 6,
                    monochrome: true,
                },
                gray(4),
            ],
        },
        OcrMode::Fast => OcrSettings {
            lang: OCR_LANG.to_string(),
            dpi: 250,
            passes: vec![gray(6)],
        },
    }
}

#[derive(Debug, Default)]
pub struct PageParse {
    pub transactions: Vec<TransactionRecord>,
    pub grand_totals: Vec<GrandTotal>,
    pub unmatched: Vec<String>,
}

pub struct RemittanceParser {
    cascade: RemittanceCascade,
    pay_date: Regex,
    doc_date: Regex,
    vendor_code: Regex,
    grand_total: Regex,
}

impl RemittanceParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            cascade: RemittanceCascade::new()?,
            pay_date: Regex::new(r"วันที่จ่ายเงิน[:\s]*?(\d{2}/\d{2}/\d{4})")
                .context("failed to compile pay date regex")?,
            doc_date: Regex::new(r"วันที่เอกสาร[:\s]*?(\d{2}/\d{2}/\d{4})")
                .context("failed to compile document date regex")?,
            vendor_code: Regex::new(r"รหัสผู้ขาย[:\s]*?([0-9A-Za-z\-]+)")
                .context("failed to compile vendor code regex")?,
            grand_total: Regex::new(
                r"(?i)(?:GRAND\s*TOTAL\s*Amount|จำนวนเงินรวมทั้งสิ้น)\D*?(\(?\s*[−-]?[\d\s,]+\.\d{2}\s*\)?)",
            )
            .context("failed to compile grand total regex")?,
        })
    }

    pub fn page_context(&self, page: &RawPage) -> PageContext {
        let date_in = |re: &Regex| {
            re.captures(&page.text)
                .and_then(|caps| parse_date(&caps[1]).ok())
        };

        PageContext {
            page_number: page.page_number,
            pay_date: date_in(&self.pay_date),
            doc_date: date_in(&self.doc_date),
            vendor_code: self
                .vendor_code
                .captures(&page.text)
                .map(|caps| fix_o0_i1(&caps[1])),
        }
    }

    pub fn parse_page(&self, page: &RawPage) -> PageParse {
        let context = self.page_context(page);
        let mut parsed = PageParse::default();

        for caps in self.grand_total.captures_iter(&page.text) {
            if let Some(amount) = parse_amount_opt(&caps[1]) {
                debug!(page = page.page_number, amount = %format_amount(amount), "grand total");
                parsed.grand_totals.push(GrandTotal {
                    grand_total_amount: amount,
                    page: page.page_number,
                });
            }
        }

        for line in &page.lines {
            match self.cascade.classify(line, &context) {
                Classification::Matched { record, tier } => {
                    debug!(
                        page = page.page_number,
                        tier = tier.as_str(),
                        doc_no = %record.doc_no,
                        ref_no = %record.ref_no,
                        "matched transaction line"
                    );
                    parsed.transactions.push(record);
                }
                Classification::Unmatched(text) => {
                    parsed
                        .unmatched
                        .push(format!("[page {}] {}", page.page_number, text));
                }
                Classification::Ignored => {}
            }
        }

        parsed
    }

    /// Parses every page, deduplicates transactions across pages and keeps
    /// the unmatched diagnostics only when `include_unmatched` is set.
    pub fn parse_document(
        &self,
        file: &str,
        pages: &[RawPage],
        include_unmatched: bool,
    ) -> RemittanceDocument {
        let mut transactions = Vec::new();
        let mut grand_totals = Vec::new();
        let mut unmatched = Vec::new();

        for page in pages {
            let parsed = self.parse_page(page);
            transactions.extend(parsed.transactions);
            grand_totals.extend(parsed.grand_totals);
            unmatched.extend(parsed.unmatched);
        }

        RemittanceDocument {
            file: file.to_string(),
            grand_totals,
            transactions: dedup_by_key(transactions, transaction_key),
            unmatched: include_unmatched.then(|| dedup_by_key(unmatched, Clone::clone)),
        }
    }
}

pub fn transaction_key(record: &TransactionRecord) -> DedupKey {
    (
        record.date.clone(),
        record.branch_code.clone(),
        record.doc_type.clone(),
        record.doc_no.clone(),
        record.ref_no.clone(),
        record.amount.unwrap_or(0.0).to_bits(),
    )
}
