use anyhow::{Context, Result};
use regex::{Captures, Regex};

use super::tokens::{extract_best_token, fold_crossdock, normalize_branch, repair_ref_if_needed};
use crate::model::TransactionRecord;
use crate::normalize::{normalize_docref_token, parse_amount_opt, parse_date};

const DATE: &str = r"(?P<date>\d{2}/\d{2}/\d{4})";
const BRANCH: &str = r"(?P<branch>[A-Za-z0-9]{1,8}|0{4})";
const DOC_TYPE: &str = r"(?P<type>IV|CN)";
const DOC: &str = r"(?P<doc>[A-Za-z0-9\-]+|CROSS(?:\s*-?\s*DOCK)?|CROSSDOCK)";
const REFERENCE: &str = r"(?P<ref>[A-Za-z0-9\-]+|Crossdock|CROSS(?:\s*-?\s*DOCK)?|CROSSDOCK)";
const AMOUNT: &str = r"(?P<amt>\(?\s*[−-]?[\d\s,]+\.\d{2}\s*\)?)";

pub const DEFAULT_BRANCH: &str = "0000";

/// Page-level header values attached to every transaction on the page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageContext {
    pub page_number: usize,
    pub pay_date: Option<String>,
    pub doc_date: Option<String>,
    pub vendor_code: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TierKind {
    Strict,
    FallbackAny,
    NoBranch,
}

impl TierKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::FallbackAny => "fallback-any",
            Self::NoBranch => "no-branch",
        }
    }
}

type Extractor = fn(&Captures<'_>, &PageContext) -> TransactionRecord;

pub struct CascadeTier {
    pub kind: TierKind,
    regex: Regex,
    extract: Extractor,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    Matched {
        record: TransactionRecord,
        tier: TierKind,
    },
    Unmatched(String),
    Ignored,
}

pub struct RemittanceCascade {
    tiers: Vec<CascadeTier>,
    date_shape: Regex,
    amount_shape: Regex,
}

impl RemittanceCascade {
    pub fn new() -> Result<Self> {
        let tiers = vec![
            CascadeTier {
                kind: TierKind::Strict,
                regex: Regex::new(&format!(
                    r"(?i){DATE}\s+{BRANCH}\s+{DOC_TYPE}\s+{DOC}\s+{REFERENCE}\s+{AMOUNT}"
                ))
                .context("failed to compile strict remittance regex")?,
                extract: extract_strict,
            },
            CascadeTier {
                kind: TierKind::FallbackAny,
                regex: Regex::new(&format!(
                    r"(?i){DATE}\s+{BRANCH}\s+{DOC_TYPE}\s+(?P<docraw>.+?)\s+(?P<refraw>.+?)\s+{AMOUNT}"
                ))
                .context("failed to compile fallback remittance regex")?,
                extract: extract_fallback_any,
            },
            CascadeTier {
                kind: TierKind::NoBranch,
                regex: Regex::new(&format!(
                    r"(?i){DATE}\s+{DOC_TYPE}\s+(?P<docraw>.+?)\s+(?P<refraw>.+?)\s+{AMOUNT}"
                ))
                .context("failed to compile no-branch remittance regex")?,
                extract: extract_no_branch,
            },
        ];

        Ok(Self {
            tiers,
            date_shape: Regex::new(r"\d{2}/\d{2}/\d{4}")
                .context("failed to compile date shape regex")?,
            amount_shape: Regex::new(r"[−-]?[\d\s,]+\.\d{2}")
                .context("failed to compile amount shape regex")?,
        })
    }

    pub fn tiers(&self) -> impl Iterator<Item = TierKind> + '_ {
        self.tiers.iter().map(|tier| tier.kind)
    }

    /// Runs the line through the tiers in order and commits to the first
    /// match.
    pub fn classify(&self, line: &str, context: &PageContext) -> Classification {
        for tier in &self.tiers {
            if let Some(caps) = tier.regex.captures(line) {
                return Classification::Matched {
                    record: (tier.extract)(&caps, context),
                    tier: tier.kind,
                };
            }
        }

        if self.date_shape.is_match(line) && self.amount_shape.is_match(line) {
            Classification::Unmatched(line.to_string())
        } else {
            Classification::Ignored
        }
    }
}

fn build_record(
    caps: &Captures<'_>,
    context: &PageContext,
    branch_code: String,
    doc: &str,
    reference: &str,
) -> TransactionRecord {
    let raw_date = &caps["date"];
    let (doc_no, ref_no) = fold_crossdock(doc, reference);

    TransactionRecord {
        date: parse_date(raw_date).unwrap_or_else(|_| raw_date.to_string()),
        doc_date: context.doc_date.clone(),
        pay_date: context.pay_date.clone(),
        vendor_code: context.vendor_code.clone(),
        branch_code,
        doc_type: caps["type"].to_uppercase(),
        doc_no,
        ref_no,
        amount: parse_amount_opt(&caps["amt"]),
        page: context.page_number,
    }
}

fn extract_strict(caps: &Captures<'_>, context: &PageContext) -> TransactionRecord {
    let doc = normalize_docref_token(&caps["doc"]);
    let reference = normalize_docref_token(&caps["ref"]);
    build_record(
        caps,
        context,
        normalize_branch(&caps["branch"]),
        &doc,
        &reference,
    )
}

fn free_text_tokens(caps: &Captures<'_>) -> (String, String) {
    let doc = extract_best_token(&caps["docraw"]).unwrap_or_default();
    let reference = extract_best_token(&caps["refraw"]).unwrap_or_default();
    let reference = repair_ref_if_needed(&doc, &reference);
    (doc, reference)
}

fn extract_fallback_any(caps: &Captures<'_>, context: &PageContext) -> TransactionRecord {
    let (doc, reference) = free_text_tokens(caps);
    build_record(
        caps,
        context,
        normalize_branch(&caps["branch"]),
        &doc,
        &reference,
    )
}

fn extract_no_branch(caps: &Captures<'_>, context: &PageContext) -> TransactionRecord {
    let (doc, reference) = free_text_tokens(caps);
    build_record(caps, context, DEFAULT_BRANCH.to_string(), &doc, &reference)
}
